use serde::{Deserialize, Serialize};

use crate::entities::user::PublicUser;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub jti: String,
    pub exp: usize,
    pub iat: usize,
}

/// Answer to a successful sign-in.
#[derive(Debug, Serialize)]
pub struct Session {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: usize,
    pub user: PublicUser,
}

impl Session {
    pub fn new(access_token: String, expires_at: usize, user: PublicUser) -> Self {
        Session {
            access_token,
            token_type: "Bearer".to_string(),
            expires_at,
            user,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SignOutResponse {
    pub message: String,
    pub redirect: String,
}

impl Default for SignOutResponse {
    fn default() -> Self {
        SignOutResponse {
            message: "Signed out".to_string(),
            redirect: "/".to_string(),
        }
    }
}
