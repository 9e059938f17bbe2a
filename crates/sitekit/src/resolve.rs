//! Site resolution: persisted record first, live host state second.

use crate::error::{Error, Result};
use crate::host::Host;
use crate::inspect;
use crate::layout::HostLayout;
use crate::record::SiteRecord;
use crate::types::{AppType, PhpVersion, SiteInfo, SiteSource};
use crate::validate;

/// Build the canonical [`SiteInfo`] for `domain`.
///
/// A complete record wins outright. A missing, unreadable or incomplete
/// record falls through to inference, which never writes a record.
pub fn resolve(host: &Host<'_>, domain: &str) -> Result<SiteInfo> {
    validate::domain(domain)?;

    match host.records().load(domain) {
        Ok(Some(record)) => {
            if let Some(site) = from_record(&host.layout, domain, &record) {
                log::debug!("Resolved {domain} from site record");
                return Ok(site);
            }
        }
        Ok(None) => log::debug!("No site record for {domain}"),
        Err(e) => log::warn!("Ignoring unreadable site record for {domain}: {e}"),
    }

    let site = infer(host, domain)?;
    log::info!(
        "Inferred {domain} from host state: user {}, PHP {}",
        site.username,
        site.php_version
    );
    Ok(site)
}

/// [`SiteInfo`] from a record, filling derived defaults.
///
/// `None` (with a warning) when the record lacks a username or a valid PHP
/// version.
pub fn from_record(layout: &HostLayout, domain: &str, record: &SiteRecord) -> Option<SiteInfo> {
    let Some(username) = record.username.as_deref().filter(|u| !u.is_empty()) else {
        log::warn!("Site record for {domain} has no username, inferring from host state");
        return None;
    };
    let php_version: PhpVersion = match record.php_version.as_deref().map(str::parse) {
        Some(Ok(v)) => v,
        Some(Err(e)) => {
            log::warn!("Site record for {domain} has a bad PHP version ({e}), inferring from host state");
            return None;
        }
        None => {
            log::warn!("Site record for {domain} has no PHP version, inferring from host state");
            return None;
        }
    };

    let app_type = record
        .app_type
        .as_deref()
        .map(AppType::from_lenient)
        .unwrap_or_default();
    let document_root = record
        .documentroot
        .clone()
        .filter(|p| p.is_absolute())
        .unwrap_or_else(|| layout.document_root(domain, app_type));
    let database_name = record
        .dbname
        .clone()
        .filter(|d| validate::database_name(d).is_ok())
        .unwrap_or_else(|| SiteInfo::default_database_name(username));

    Some(SiteInfo {
        domain: domain.to_string(),
        username: username.to_string(),
        home_dir: layout.home_dir(domain),
        document_root,
        database_name,
        php_version,
        app_type,
        created_at: record.creation_date,
        php_version_updated_at: record.php_version_updated,
        source: SiteSource::Record,
    })
}

/// Reconstruct a site from home-directory ownership and pool files.
pub fn infer(host: &Host<'_>, domain: &str) -> Result<SiteInfo> {
    let layout = &host.layout;
    let home_dir = layout.home_dir(domain);
    if !home_dir.is_dir() {
        return Err(Error::not_found(
            domain,
            format!("no site record and no home directory {}", home_dir.display()),
        ));
    }

    let username = host.accounts.owner_name(&home_dir).ok_or_else(|| {
        Error::not_found(
            domain,
            format!("owner of {} is not a known user", home_dir.display()),
        )
    })?;

    let php_version = inspect::find_pool_version(layout, &username).ok_or_else(|| {
        Error::not_found(domain, format!("no PHP-FPM pool file for user {username}"))
    })?;

    let app_type = AppType::default();
    Ok(SiteInfo {
        domain: domain.to_string(),
        document_root: layout.document_root(domain, app_type),
        database_name: SiteInfo::default_database_name(&username),
        home_dir,
        username,
        php_version,
        app_type,
        created_at: None,
        php_version_updated_at: None,
        source: SiteSource::Inferred,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::Fixture;
    use crate::types::WebServer;
    use std::path::PathBuf;

    #[test]
    fn test_record_wins_without_inference() {
        let fx = Fixture::new();
        // host state disagrees with the record
        fx.add_home("foo.com", "other");
        fx.add_pool("7.4", "other");
        fx.write_record(
            "foo.com",
            r#"{"username": "foo", "php_version": "8.1", "app_type": "laravel", "creation_date": "2024-01-02 03:04:05"}"#,
        );
        let host = fx.host(WebServer::Nginx);

        let site = resolve(&host, "foo.com").unwrap();
        assert_eq!(site.username, "foo");
        assert_eq!(site.php_version, PhpVersion::new(8, 1));
        assert_eq!(site.source, SiteSource::Record);
        assert_eq!(site.app_type, AppType::Laravel);
        assert_eq!(site.database_name, "foo_db");
        assert_eq!(site.document_root, fx.layout.document_root("foo.com", AppType::Laravel));
        assert!(site.created_at.is_some());
    }

    #[test]
    fn test_record_values_are_kept() {
        let fx = Fixture::new();
        fx.write_record(
            "foo.com",
            r#"{"username": "foo", "php_version": "8.1", "dbname": "legacy_db", "documentroot": "/srv/www/foo"}"#,
        );
        let host = fx.host(WebServer::Nginx);
        let site = resolve(&host, "foo.com").unwrap();
        assert_eq!(site.database_name, "legacy_db");
        assert_eq!(site.document_root, PathBuf::from("/srv/www/foo"));
        assert_eq!(site.home_dir, fx.layout.home_dir("foo.com"));
    }

    #[test]
    fn test_inference_without_record() {
        let fx = Fixture::new();
        fx.add_home("example.com", "exampl");
        fx.add_pool("8.2", "exampl");
        let host = fx.host(WebServer::Nginx);

        let site = resolve(&host, "example.com").unwrap();
        assert_eq!(site.username, "exampl");
        assert_eq!(site.php_version, PhpVersion::new(8, 2));
        assert_eq!(site.document_root, fx.layout.home_dir("example.com").join("html"));
        assert_eq!(site.database_name, "exampl_db");
        assert_eq!(site.source, SiteSource::Inferred);
        assert!(!fx.layout.record_file("example.com").exists());
    }

    #[test]
    fn test_incomplete_record_falls_through() {
        let fx = Fixture::new();
        fx.add_home("foo.com", "foo");
        fx.add_pool("8.3", "foo");
        fx.write_record("foo.com", r#"{"username": "foo", "php_version": "eight"}"#);
        let host = fx.host(WebServer::Nginx);

        let site = resolve(&host, "foo.com").unwrap();
        assert_eq!(site.source, SiteSource::Inferred);
        assert_eq!(site.php_version, PhpVersion::new(8, 3));
    }

    #[test]
    fn test_corrupt_record_falls_through() {
        let fx = Fixture::new();
        fx.add_home("foo.com", "foo");
        fx.add_pool("8.2", "foo");
        fx.write_record("foo.com", "{{{");
        let host = fx.host(WebServer::Nginx);
        assert_eq!(resolve(&host, "foo.com").unwrap().source, SiteSource::Inferred);
    }

    #[test]
    fn test_not_found_cases() {
        let fx = Fixture::new();
        let host = fx.host(WebServer::Nginx);

        let err = resolve(&host, "missing.com").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        // home exists but owner is not a known user
        std::fs::create_dir_all(fx.layout.home_dir("orphan.com")).unwrap();
        assert_eq!(resolve(&host, "orphan.com").unwrap_err().kind(), ErrorKind::NotFound);

        // owner known, no pool file anywhere
        fx.add_home("nopool.com", "nopool");
        fx.install_php("8.2");
        assert_eq!(resolve(&host, "nopool.com").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_invalid_domain() {
        let fx = Fixture::new();
        let host = fx.host(WebServer::Nginx);
        let err = resolve(&host, "../etc").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
