//! Back up everything that belongs to a site into one archive.
//!
//! Sub-steps are independent: one failing does not stop the others. Each
//! reports whether it captured something, found nothing to capture, or
//! failed. The staging directory is removed whatever happens.

use chrono::NaiveDateTime;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Result, StepExt};
use crate::host::Host;
use crate::mutate::database;
use crate::resolve::resolve;
use crate::types::{SiteInfo, WebServer};

const STAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

// ============================================================================
// Report
// ============================================================================

/// Result of one backup sub-step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The resource was copied into the backup
    Captured,
    /// The resource does not exist; nothing to lose
    Absent,
    /// The resource exists but could not be captured
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub name: &'static str,
    pub outcome: StepOutcome,
}

/// What a backup run produced.
#[derive(Debug, Clone)]
pub struct BackupReport {
    pub site: SiteInfo,
    /// Final archive; `None` when it could not be written
    pub archive: Option<PathBuf>,
    pub steps: Vec<StepReport>,
}

impl BackupReport {
    /// Final archive written and no sub-step failed.
    pub fn is_complete(&self) -> bool {
        self.archive.is_some() && self.failures().next().is_none()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.steps.iter().filter_map(|s| match &s.outcome {
            StepOutcome::Failed(reason) => Some((s.name, reason.as_str())),
            _ => None,
        })
    }

    pub fn captured(&self) -> impl Iterator<Item = &'static str> {
        self.steps
            .iter()
            .filter(|s| s.outcome == StepOutcome::Captured)
            .map(|s| s.name)
    }
}

// ============================================================================
// Staging
// ============================================================================

/// A staging directory removed on drop.
struct StagingDir {
    path: PathBuf,
}

impl StagingDir {
    fn create(path: PathBuf) -> io::Result<Self> {
        fs::create_dir(&path)?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn subdir(&self, name: &str) -> io::Result<PathBuf> {
        let dir = self.path.join(name);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.path) {
            log::warn!(
                "Failed to remove staging directory {}: {e}",
                self.path.display()
            );
        }
    }
}

/// `{domain}-{stamp}`, with `-N` appended while a staging directory or
/// archive of that name exists.
fn unique_stem(root: &Path, domain: &str, now: NaiveDateTime) -> String {
    let base = format!("{domain}-{}", now.format(STAMP_FORMAT));
    let taken = |stem: &str| root.join(stem).exists() || root.join(format!("{stem}.tar.gz")).exists();
    if !taken(&base) {
        return base;
    }
    (1u32..)
        .map(|n| format!("{base}-{n}"))
        .find(|stem| !taken(stem))
        .unwrap_or(base)
}

// ============================================================================
// Backup
// ============================================================================

/// Back up `domain` into `{backup_root}/{domain}-{stamp}.tar.gz`.
///
/// Errors only when the site cannot be resolved or staging cannot be set up.
pub fn backup(host: &Host<'_>, domain: &str) -> Result<BackupReport> {
    let site = resolve(host, domain)?;
    let root = &host.layout.backup_root;
    fs::create_dir_all(root).step("create backup directory")?;

    let stem = unique_stem(root, &site.domain, super::now());
    let staging = StagingDir::create(root.join(&stem)).step("create staging directory")?;
    log::info!("Backing up {} into {}", site.domain, staging.path().display());
    host.progress.step(&format!("Backing up {}", site.domain));

    let mut steps = Vec::new();
    let mut run = |name: &'static str, result: io::Result<bool>| {
        let outcome = match result {
            Ok(true) => StepOutcome::Captured,
            Ok(false) => StepOutcome::Absent,
            Err(e) => StepOutcome::Failed(e.to_string()),
        };
        match &outcome {
            StepOutcome::Captured => log::info!("Backup {name}: captured"),
            StepOutcome::Absent => log::info!("Backup {name}: nothing to back up"),
            StepOutcome::Failed(reason) => {
                log::error!("Backup {name} failed: {reason}");
                host.progress.warn(&format!("Backup of {name} failed: {reason}"));
            }
        }
        steps.push(StepReport { name, outcome });
    };

    run("home directory", archive_home(&site, &staging));
    run("database", dump_database(host, &site, &staging));
    run("web server config", copy_vhosts(host, &site, &staging));
    run("PHP-FPM pool", copy_pool(host, &site, &staging));
    run("site record", copy_record(host, &site, &staging));
    run("TLS certificate", copy_tls(host, &site, &staging));

    let archive_path = root.join(format!("{stem}.tar.gz"));
    let archive = match write_archive(staging.path(), &stem, &archive_path) {
        Ok(()) => {
            log::info!("Backup archive written to {}", archive_path.display());
            Some(archive_path)
        }
        Err(e) => {
            let _ = fs::remove_file(&archive_path);
            log::error!("Failed to write backup archive {}: {e}", archive_path.display());
            host.progress.warn(&format!("Could not write backup archive: {e}"));
            None
        }
    };
    drop(staging);

    let report = BackupReport {
        site,
        archive,
        steps,
    };
    if report.is_complete() {
        host.progress
            .success(&format!("Backup of {} complete", report.site.domain));
    }
    Ok(report)
}

fn archive_home(site: &SiteInfo, staging: &StagingDir) -> io::Result<bool> {
    if !site.home_dir.is_dir() {
        return Ok(false);
    }
    let dest = staging.path().join(format!("files_{}.tar.gz", site.username));
    write_archive(&site.home_dir, &site.domain, &dest)?;
    Ok(true)
}

fn dump_database(host: &Host<'_>, site: &SiteInfo, staging: &StagingDir) -> io::Result<bool> {
    let name = &site.database_name;
    if !database::exists(host, name).map_err(io::Error::other)? {
        return Ok(false);
    }
    let dest = staging.path().join(format!("database_{name}.sql.gz"));
    database::dump(host, name, &dest).map_err(io::Error::other)?;
    Ok(true)
}

fn copy_vhosts(host: &Host<'_>, site: &SiteInfo, staging: &StagingDir) -> io::Result<bool> {
    let mut captured = false;
    for server in [WebServer::Nginx, WebServer::Apache] {
        let src = host.layout.vhost_file(server, &site.domain);
        if src.is_file() {
            let dir = staging.subdir("config/webserver")?;
            fs::copy(&src, dir.join(format!("{server}_{}.conf", site.domain)))?;
            captured = true;
        }
    }
    Ok(captured)
}

fn copy_pool(host: &Host<'_>, site: &SiteInfo, staging: &StagingDir) -> io::Result<bool> {
    let src = host.layout.pool_file(&site.php_version, &site.username);
    if !src.is_file() {
        return Ok(false);
    }
    let dir = staging.subdir("config/php-fpm")?;
    fs::copy(&src, dir.join(format!("{}.conf", site.username)))?;
    Ok(true)
}

fn copy_record(host: &Host<'_>, site: &SiteInfo, staging: &StagingDir) -> io::Result<bool> {
    let src = host.layout.record_file(&site.domain);
    if !src.is_file() {
        return Ok(false);
    }
    let dir = staging.subdir("config/sitedata")?;
    fs::copy(&src, dir.join(&site.domain))?;
    Ok(true)
}

fn copy_tls(host: &Host<'_>, site: &SiteInfo, staging: &StagingDir) -> io::Result<bool> {
    let mut captured = false;
    for src in [host.layout.tls_key(&site.domain), host.layout.tls_cert(&site.domain)] {
        if let Some(name) = src.file_name().filter(|_| src.is_file()) {
            let dir = staging.subdir("config/ssl")?;
            fs::copy(&src, dir.join(name))?;
            captured = true;
        }
    }
    Ok(captured)
}

/// Gzipped tar of `src`, stored under the top-level name `name`.
///
/// Modes and ownership are kept; symlinks are stored as links.
fn write_archive(src: &Path, name: &str, dest: &Path) -> io::Result<()> {
    let encoder = GzEncoder::new(File::create(dest)?, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);
    builder.append_dir_all(name, src)?;
    builder.into_inner()?.finish()?.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::Fixture;
    use flate2::read::GzDecoder;
    use std::collections::BTreeSet;

    fn entries(archive: &Path) -> BTreeSet<String> {
        let mut tar = tar::Archive::new(GzDecoder::new(File::open(archive).unwrap()));
        tar.entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().display().to_string())
            .map(|p| p.trim_end_matches('/').to_string())
            .collect()
    }

    fn full_site(fx: &Fixture) {
        fx.install_php("8.2");
        fx.add_home("foo.com", "foo");
        fx.add_pool("8.2", "foo");
        fx.add_vhost(WebServer::Nginx, "foo.com");
        fx.add_tls("foo.com");
        fx.add_database("foo_db");
        fx.write_record("foo.com", r#"{"username": "foo", "php_version": "8.2"}"#);
    }

    #[test]
    fn test_full_backup() {
        let fx = Fixture::new();
        full_site(&fx);
        let host = fx.host(WebServer::Nginx);

        let report = backup(&host, "foo.com").unwrap();
        assert!(report.is_complete(), "{:?}", report.steps);
        assert_eq!(report.captured().count(), 6);

        let archive = report.archive.unwrap();
        let stem = archive.file_name().unwrap().to_str().unwrap().trim_end_matches(".tar.gz").to_string();
        assert!(stem.starts_with("foo.com-"));
        let names = entries(&archive);
        for expected in [
            "files_foo.tar.gz",
            "database_foo_db.sql.gz",
            "config/webserver/nginx_foo.com.conf",
            "config/php-fpm/foo.conf",
            "config/sitedata/foo.com",
            "config/ssl/foo.com.key",
            "config/ssl/foo.com.crt",
        ] {
            assert!(names.contains(&format!("{stem}/{expected}")), "missing {expected} in {names:?}");
        }

        // staging removed, only the archive is left
        let left: Vec<_> = fs::read_dir(&fx.layout.backup_root).unwrap().flatten().collect();
        assert_eq!(left.len(), 1);
    }

    #[test]
    fn test_home_archive_keeps_symlinks() {
        let fx = Fixture::new();
        full_site(&fx);
        let home = fx.layout.home_dir("foo.com");
        std::os::unix::fs::symlink("/etc/passwd", home.join("html/passwd-link")).unwrap();
        let staging_root = fx.dir.path().join("out");
        fs::create_dir_all(&staging_root).unwrap();
        let dest = staging_root.join("files.tar.gz");

        write_archive(&home, "foo.com", &dest).unwrap();

        let mut tar = tar::Archive::new(GzDecoder::new(File::open(&dest).unwrap()));
        let link = tar
            .entries()
            .unwrap()
            .map(|entry| entry.unwrap())
            .find(|e| e.path().unwrap().ends_with("passwd-link"))
            .unwrap();
        assert!(link.header().entry_type().is_symlink());
    }

    #[test]
    fn test_absent_resources_are_not_failures() {
        let fx = Fixture::new();
        fx.write_record("gone.com", r#"{"username": "gone", "php_version": "8.1"}"#);
        let host = fx.host(WebServer::Nginx);

        let report = backup(&host, "gone.com").unwrap();
        assert!(report.is_complete());
        assert_eq!(report.captured().collect::<Vec<_>>(), ["site record"]);
        assert!(report
            .steps
            .iter()
            .filter(|s| s.name != "site record")
            .all(|s| s.outcome == StepOutcome::Absent));
    }

    #[test]
    fn test_failed_dump_is_reported_not_fatal() {
        let fx = Fixture::new();
        full_site(&fx);
        fx.runner.fail_when("mysqldump", "foo_db", 2, "Access denied");
        let host = fx.host(WebServer::Nginx);

        let report = backup(&host, "foo.com").unwrap();
        assert!(!report.is_complete());
        assert!(report.archive.is_some());
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "database");
        assert!(failures[0].1.contains("Access denied"));
    }

    #[test]
    fn test_unique_stem_on_collision() {
        let fx = Fixture::new();
        let root = &fx.layout.backup_root;
        fs::create_dir_all(root).unwrap();
        let now = NaiveDateTime::parse_from_str("2024-05-01 10:00:00", "%Y-%m-%d %H:%M:%S").unwrap();

        let first = unique_stem(root, "foo.com", now);
        assert_eq!(first, "foo.com-2024-05-01_10-00-00");
        fs::write(root.join(format!("{first}.tar.gz")), "").unwrap();
        let second = unique_stem(root, "foo.com", now);
        assert_eq!(second, "foo.com-2024-05-01_10-00-00-1");
        fs::create_dir(root.join(&second)).unwrap();
        assert_eq!(unique_stem(root, "foo.com", now), "foo.com-2024-05-01_10-00-00-2");
    }

    #[test]
    fn test_unknown_site_is_error() {
        let fx = Fixture::new();
        let host = fx.host(WebServer::Nginx);
        let err = backup(&host, "nobody.com").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(!fx.layout.backup_root.exists());
    }
}
