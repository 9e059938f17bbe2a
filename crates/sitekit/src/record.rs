//! Site record store.
//!
//! One pretty-printed JSON file per domain. The record is the source of truth
//! for a site whenever it is present and complete. Keys this crate does not
//! know about are carried through updates untouched.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::SiteInfo;

/// Timestamp format used in records (`2024-05-01 13:45:00`).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Persisted metadata for one site.
///
/// Every field is optional on disk; [`SiteRecord::is_complete`] decides
/// whether the record can stand in for the live host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servername: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serveralias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentroot: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dbname: Option<String>,
    #[serde(
        default,
        with = "timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub creation_date: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub php_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_type: Option<String>,
    #[serde(
        default,
        with = "timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub php_version_updated: Option<NaiveDateTime>,

    /// Keys written by other tools
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SiteRecord {
    /// Build a fresh record from resolved site facts.
    pub fn from_site(site: &SiteInfo) -> Self {
        Self {
            servername: Some(site.domain.clone()),
            serveralias: Some(format!("www.{}", site.domain)),
            documentroot: Some(site.document_root.clone()),
            username: Some(site.username.clone()),
            dbname: Some(site.database_name.clone()),
            creation_date: site.created_at,
            php_version: Some(site.php_version.to_string()),
            app_type: Some(site.app_type.to_string()),
            php_version_updated: site.php_version_updated_at,
            extra: serde_json::Map::new(),
        }
    }

    /// A record needs at least a username and a PHP version to be trusted.
    pub fn is_complete(&self) -> bool {
        self.username.as_deref().is_some_and(|u| !u.is_empty())
            && self.php_version.as_deref().is_some_and(|v| !v.is_empty())
    }
}

/// Lenient `Option<NaiveDateTime>` (de)serialisation: unparseable values read
/// back as `None` rather than poisoning the whole record.
mod timestamp {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_str(&ts.format(TIMESTAMP_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.and_then(|s| NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT).ok()))
    }
}

/// Directory of site records.
#[derive(Debug, Clone)]
pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record for `domain`.
    pub fn path(&self, domain: &str) -> PathBuf {
        self.dir.join(domain)
    }

    pub fn exists(&self, domain: &str) -> bool {
        self.path(domain).is_file()
    }

    /// Load the record for `domain`.
    ///
    /// `Ok(None)` when there is no record; an error when the file exists but
    /// cannot be read or parsed.
    pub fn load(&self, domain: &str) -> Result<Option<SiteRecord>> {
        let path = self.path(domain);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record = serde_json::from_str(&content)?;
        log::debug!("Loaded site record {}", path.display());
        Ok(Some(record))
    }

    /// Write the record for `domain`, replacing any previous one.
    ///
    /// The file is written next to its final location and renamed over it.
    pub fn save(&self, domain: &str, record: &SiteRecord) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(domain);
        let tmp = self.dir.join(format!(".{domain}.tmp"));
        let content = serde_json::to_string_pretty(record)?;
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &path)?;
        log::info!("Saved site record {}", path.display());
        Ok(path)
    }

    /// Load, modify and save a record. A missing or unreadable record starts
    /// from `fallback`.
    pub fn update<F>(&self, domain: &str, fallback: SiteRecord, f: F) -> Result<SiteRecord>
    where
        F: FnOnce(&mut SiteRecord),
    {
        let mut record = match self.load(domain) {
            Ok(Some(record)) => record,
            Ok(None) => fallback,
            Err(e) => {
                log::warn!("Replacing unreadable site record for {domain}: {e}");
                fallback
            }
        };
        f(&mut record);
        self.save(domain, &record)?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, RecordStore) {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::new(dir.path().join("sitedata"));
        (dir, store)
    }

    #[test]
    fn test_load_missing_is_none() {
        let (_dir, store) = store();
        assert!(store.load("nope.com").unwrap().is_none());
        assert!(!store.exists("nope.com"));
    }

    #[test]
    fn test_load_legacy_record() {
        let (_dir, store) = store();
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(
            store.path("foo.com"),
            r#"{
    "servername": "foo.com",
    "serveralias": "www.foo.com",
    "documentroot": "/home/foo.com/html/",
    "username": "foo",
    "dbname": "foo_db",
    "creation_date": "2024-03-01 10:20:30",
    "php_version": "8.1",
    "app_type": "wp"
}"#,
        )
        .unwrap();

        let record = store.load("foo.com").unwrap().unwrap();
        assert!(record.is_complete());
        assert_eq!(record.username.as_deref(), Some("foo"));
        assert_eq!(record.php_version.as_deref(), Some("8.1"));
        assert_eq!(
            record.creation_date.unwrap().format(TIMESTAMP_FORMAT).to_string(),
            "2024-03-01 10:20:30"
        );
        assert!(record.extra.is_empty());
    }

    #[test]
    fn test_bad_timestamp_reads_as_none() {
        let (_dir, store) = store();
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(
            store.path("foo.com"),
            r#"{"username": "foo", "php_version": "8.1", "creation_date": "yesterday"}"#,
        )
        .unwrap();
        let record = store.load("foo.com").unwrap().unwrap();
        assert!(record.creation_date.is_none());
        assert!(record.is_complete());
    }

    #[test]
    fn test_incomplete_record() {
        let record: SiteRecord = serde_json::from_str(r#"{"username": "foo"}"#).unwrap();
        assert!(!record.is_complete());
        let record: SiteRecord =
            serde_json::from_str(r#"{"username": "", "php_version": "8.1"}"#).unwrap();
        assert!(!record.is_complete());
    }

    #[test]
    fn test_corrupt_record_is_error() {
        let (_dir, store) = store();
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(store.path("foo.com"), "{not json").unwrap();
        assert!(store.load("foo.com").is_err());
    }

    #[test]
    fn test_update_preserves_unknown_keys() {
        let (_dir, store) = store();
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(
            store.path("foo.com"),
            r#"{"username": "foo", "php_version": "8.1", "owner_email": "ops@example.com"}"#,
        )
        .unwrap();

        store
            .update("foo.com", SiteRecord::default(), |r| {
                r.php_version = Some("8.3".into());
            })
            .unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path("foo.com")).unwrap()).unwrap();
        assert_eq!(raw["php_version"], "8.3");
        assert_eq!(raw["owner_email"], "ops@example.com");
        assert!(!store.dir().join(".foo.com.tmp").exists());
    }

    #[test]
    fn test_update_missing_uses_fallback() {
        let (_dir, store) = store();
        let fallback = SiteRecord {
            username: Some("bar".into()),
            ..Default::default()
        };
        let record = store
            .update("bar.com", fallback, |r| r.php_version = Some("8.2".into()))
            .unwrap();
        assert!(record.is_complete());
        assert!(store.exists("bar.com"));
    }
}
