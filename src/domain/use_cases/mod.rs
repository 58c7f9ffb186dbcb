pub mod auth;
pub mod coding_stats;
pub mod contact;
pub mod content;
pub mod extractors;
pub mod manager;
pub mod navigation;
