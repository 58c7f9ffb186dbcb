use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::password::validate_password_strength;

/// Row of the `users` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: &str, password_hash: String) -> Self {
        User {
            id: Uuid::new_v4(),
            email: email.trim().to_lowercase(),
            password_hash,
            created_at: Utc::now(),
        }
    }
}

/// Row of the `user_roles` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRole {
    pub user_id: Uuid,
    pub role: String,
}

pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Deserialize, Validate)]
pub struct LoginUser {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,
}

/// Credentials of the account created on startup.
#[derive(Debug, Deserialize, Validate)]
pub struct AdminAccount {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(custom(function = "validate_password_strength"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub is_admin: bool,
}
