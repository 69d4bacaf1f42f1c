use serde::{Deserialize, Serialize};

use crate::db::UserRole;

/// Authenticated identity performing an operation, as handed over by the
/// session layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: i64,
    pub role: UserRole,
}

impl Actor {
    pub fn new(user_id: i64, role: UserRole) -> Self {
        Self { user_id, role }
    }

    pub fn is_approver(&self) -> bool {
        self.role.is_approver()
    }
}
