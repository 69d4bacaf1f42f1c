pub mod approval_logs;
pub mod courses;
pub mod dashboard;
pub mod extractors;
pub mod i18n;
pub mod nominations;
pub mod users;
pub mod views;
