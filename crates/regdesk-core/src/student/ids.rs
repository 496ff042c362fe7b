//! Identifier generation.
//!
//! Neither format is guaranteed unique on its own; callers retry when the
//! store reports a collision.

use chrono::{DateTime, Datelike, Utc};
use rand::Rng;

/// How many times a colliding identifier is regenerated before giving up.
pub const MAX_ID_ATTEMPTS: usize = 5;

/// `{year}{six random digits}`, e.g. `2025483920`.
#[must_use]
pub fn student_id(now: DateTime<Utc>) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
    format!("{}{suffix}", now.year())
}

/// `APP{epoch millis}{0..999}`, e.g. `APP1718000000000417`.
#[must_use]
pub fn application_number(now_millis: u64) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1000);
    format!("APP{now_millis}{suffix}")
}
