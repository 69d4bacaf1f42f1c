mod approval_log;
mod nomination;
mod page;
mod training_course;
mod user;
mod validation;

pub use approval_log::*;
pub use nomination::*;
pub use page::*;
pub use training_course::*;
pub use user::*;
