pub mod auth;
pub mod cache;
pub mod db;
pub mod http;
pub mod limiter;
pub mod realtime;
pub mod utils;
