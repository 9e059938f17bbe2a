//! Syntax checks for operator-supplied names.
//!
//! These run before anything touches the host. Every value checked here ends
//! up in a filesystem path, a shell argument or an SQL statement.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{Error, Result};

/// Longest username `useradd` accepts on the hosts we target.
pub const MAX_USERNAME_LEN: usize = 32;

static DOMAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9.-]+$").expect("static regex"));
static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]+$").expect("static regex"));
static PASSWORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9.-]+$").expect("static regex"));
static DATABASE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("static regex"));

/// Letters, digits, hyphen and dot; no leading dot/hyphen, no `..`.
pub fn domain(value: &str) -> Result<()> {
    if !DOMAIN_RE.is_match(value) {
        return Err(Error::validation(
            "domain",
            value,
            "only letters, digits, '-' and '.' are allowed",
        ));
    }
    if value.starts_with(['.', '-']) || value.contains("..") {
        return Err(Error::validation(
            "domain",
            value,
            "must not start with '.' or '-' or contain '..'",
        ));
    }
    Ok(())
}

/// ASCII alphanumeric, at most [`MAX_USERNAME_LEN`] characters.
pub fn username(value: &str) -> Result<()> {
    if value.len() > MAX_USERNAME_LEN {
        return Err(Error::validation(
            "username",
            value,
            format!("must be at most {MAX_USERNAME_LEN} characters"),
        ));
    }
    if !USERNAME_RE.is_match(value) {
        return Err(Error::validation(
            "username",
            value,
            "only letters and digits are allowed",
        ));
    }
    Ok(())
}

/// Letters, digits, hyphen and dot.
pub fn password(value: &str) -> Result<()> {
    if !PASSWORD_RE.is_match(value) {
        // never echo the password back
        return Err(Error::validation(
            "password",
            "********",
            "only letters, digits, '-' and '.' are allowed",
        ));
    }
    Ok(())
}

/// MySQL identifier used unquoted-safe inside backticks and quotes.
pub fn database_name(value: &str) -> Result<()> {
    if !DATABASE_RE.is_match(value) {
        return Err(Error::validation(
            "database name",
            value,
            "only letters, digits and '_' are allowed",
        ));
    }
    Ok(())
}
