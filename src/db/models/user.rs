use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use validator::Validate;

use super::validation::not_blank;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Hr,
    Manager,
    Entry,
    Employee,
}

impl UserRole {
    pub fn all() -> &'static [UserRole] {
        &[
            UserRole::Admin,
            UserRole::Hr,
            UserRole::Manager,
            UserRole::Entry,
            UserRole::Employee,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Hr => "hr",
            UserRole::Manager => "manager",
            UserRole::Entry => "entry",
            UserRole::Employee => "employee",
        }
    }

    /// Roles that take part in the approval chain.
    pub fn is_approver(&self) -> bool {
        !matches!(self, UserRole::Employee)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "hr" => Ok(UserRole::Hr),
            "manager" => Ok(UserRole::Manager),
            "entry" => Ok(UserRole::Entry),
            "employee" => Ok(UserRole::Employee),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub full_name: String,
    pub national_id: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub job_number: Option<String>,
    pub qualification: Option<String>,
    pub specialization: Option<String>,
    pub role: UserRole,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub full_name: String,
    #[validate(length(min = 1, max = 20), custom(function = "not_blank"))]
    pub national_id: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 20))]
    pub phone_number: Option<String>,
    #[validate(length(min = 1, max = 50), custom(function = "not_blank"))]
    pub job_number: Option<String>,
    #[validate(length(max = 100))]
    pub qualification: Option<String>,
    #[validate(length(max = 100))]
    pub specialization: Option<String>,
    /// Only honoured when an admin provisions the account.
    #[serde(default)]
    pub role: Option<UserRole>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUserProfile {
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub full_name: Option<String>,
    #[validate(length(max = 20))]
    pub phone_number: Option<String>,
}
