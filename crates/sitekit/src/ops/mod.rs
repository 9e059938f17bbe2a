//! Lifecycle orchestrators.
//!
//! Each one resolves the site once, drives the mutators in a fixed order and
//! stops at the first failed step.

pub mod backup;
pub mod delete;
pub mod php_version;
pub mod provision;

use chrono::{Local, NaiveDateTime, Timelike};

/// Local wall-clock time, to the second.
pub(crate) fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}
