use std::time::Duration;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Sign-in attempts allowed per client address inside `LOGIN_WINDOW`.
pub const LOGIN_ATTEMPTS: usize = 10;
pub const LOGIN_WINDOW: Duration = Duration::from_secs(15 * 60);

pub const PURGE_INTERVAL: Duration = Duration::from_secs(10 * 60);
