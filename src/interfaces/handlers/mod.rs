pub mod admin;
pub mod auth;
pub mod contact;
pub mod content;
pub mod json_error;
pub mod navigation;
pub mod system;
