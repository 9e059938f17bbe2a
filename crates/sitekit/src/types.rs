//! Core types: the site fact sheet and the small enums around it.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Error, Result};

// ============================================================================
// PHP version
// ============================================================================

/// A PHP `major.minor` version such as `8.2`.
///
/// Ordering is numeric, so `8.10` sorts after `8.9`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhpVersion {
    major: u32,
    minor: u32,
}

impl PhpVersion {
    /// Create a version from its parts.
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Name of the PHP-FPM systemd unit for this version (`php8.2-fpm`).
    pub fn fpm_service(&self) -> String {
        format!("php{self}-fpm")
    }
}

impl FromStr for PhpVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::validation("PHP version", s, "expected MAJOR.MINOR, e.g. 8.2");
        let (major, minor) = s.split_once('.').ok_or_else(invalid)?;
        let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !digits(major) || !digits(minor) {
            return Err(invalid());
        }
        Ok(Self {
            major: major.parse().map_err(|_| invalid())?,
            minor: minor.parse().map_err(|_| invalid())?,
        })
    }
}

impl TryFrom<String> for PhpVersion {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PhpVersion> for String {
    fn from(value: PhpVersion) -> Self {
        value.to_string()
    }
}

impl fmt::Display for PhpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl Ord for PhpVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor).cmp(&(other.major, other.minor))
    }
}

impl PartialOrd for PhpVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ============================================================================
// App type
// ============================================================================

/// Which vhost template and document-root layout a site uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppType {
    /// WordPress / plain PHP: document root is `html/`
    #[default]
    Wp,
    /// Laravel: document root is `html/public/`
    Laravel,
}

impl AppType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wp => "wp",
            Self::Laravel => "laravel",
        }
    }

    /// Lenient parse: anything that is not `laravel` is `wp`.
    pub fn from_lenient(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("laravel") {
            Self::Laravel
        } else {
            Self::Wp
        }
    }
}

impl fmt::Display for AppType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Web server
// ============================================================================

/// The web server fronting PHP-FPM on this host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebServer {
    Nginx,
    Apache,
}

impl WebServer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nginx => "nginx",
            Self::Apache => "apache",
        }
    }

    /// systemd unit / process name.
    pub fn service_name(&self) -> &'static str {
        match self {
            Self::Nginx => "nginx",
            Self::Apache => "apache2",
        }
    }

    /// The other supported server.
    pub fn other(&self) -> Self {
        match self {
            Self::Nginx => Self::Apache,
            Self::Apache => Self::Nginx,
        }
    }
}

impl FromStr for WebServer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "nginx" => Ok(Self::Nginx),
            "apache" | "apache2" => Ok(Self::Apache),
            other => Err(Error::validation(
                "web server",
                other,
                "expected nginx or apache",
            )),
        }
    }
}

impl fmt::Display for WebServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SiteInfo
// ============================================================================

/// Where a [`SiteInfo`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteSource {
    /// The persisted site record
    Record,
    /// Reconstructed from home-directory ownership and pool files
    Inferred,
}

/// Canonical facts about one site, built fresh for each operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteInfo {
    pub domain: String,
    pub username: String,
    pub home_dir: PathBuf,
    pub document_root: PathBuf,
    pub database_name: String,
    pub php_version: PhpVersion,
    pub app_type: AppType,
    pub created_at: Option<NaiveDateTime>,
    pub php_version_updated_at: Option<NaiveDateTime>,
    pub source: SiteSource,
}

impl SiteInfo {
    /// Database (and database user) name derived from a username.
    pub fn default_database_name(username: &str) -> String {
        format!("{username}_db")
    }
}
