//! Tear a site down, after backing it up.

use crate::error::{Error, ErrorKind, Result, StepExt};
use crate::host::Host;
use crate::mutate::{account, database, pool, service, vhost};
use crate::record::SiteRecord;
use crate::types::{SiteInfo, SiteSource};
use crate::validate;

use super::backup::{BackupReport, backup};

#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteOptions {
    /// Proceed even when some backup sub-steps failed
    pub allow_partial_backup: bool,
}

/// What a delete run did.
#[derive(Debug, Clone)]
pub struct DeleteReport {
    pub site: SiteInfo,
    pub backup: BackupReport,
    /// Human-readable list of removed resources
    pub removed: Vec<String>,
    pub warnings: Vec<String>,
}

/// Back up and delete `domain`.
///
/// Nothing is removed unless the backup is complete (or
/// `allow_partial_backup` is set). Every removal tolerates an already missing
/// resource, so a failed run can simply be repeated. The site record is kept.
pub fn delete(host: &Host<'_>, domain: &str, options: DeleteOptions) -> Result<DeleteReport> {
    validate::domain(domain)?;
    let web_server = host.require_web_server()?;
    let progress = host.progress;

    let backup = backup(host, domain).map_err(|e| match e.kind() {
        ErrorKind::Validation | ErrorKind::NotFound => e,
        _ => Error::Precondition(format!("backup failed, nothing was deleted: {e}")),
    })?;

    let mut warnings = Vec::new();
    if !backup.is_complete() {
        let mut problems: Vec<String> = backup
            .failures()
            .map(|(name, reason)| format!("{name}: {reason}"))
            .collect();
        if backup.archive.is_none() {
            problems.push("final archive was not written".to_string());
        }
        let summary = problems.join("; ");
        if !options.allow_partial_backup {
            return Err(Error::Precondition(format!(
                "backup incomplete ({summary}), nothing was deleted; \
                 re-run with --allow-partial-backup to delete anyway"
            )));
        }
        let warning = format!("Deleting with an incomplete backup: {summary}");
        progress.warn(&warning);
        warnings.push(warning);
    }

    let site = backup.site.clone();
    let mut removed = Vec::new();
    log::info!("Deleting {} (user {})", site.domain, site.username);

    // Inference needs the pool file removed below; a re-run resolves from this.
    if site.source == SiteSource::Inferred {
        let path = host
            .records()
            .save(&site.domain, &SiteRecord::from_site(&site))
            .step("save site record")?;
        log::info!("Saved inferred site record to {}", path.display());
    }

    // web server
    progress.step(&format!("Removing {web_server} vhost"));
    if vhost::remove(host, web_server, &site.domain).step("remove vhost")? {
        removed.push(format!("{web_server} vhost"));
        service::restart_web_server(host, web_server).step("restart web server")?;
    }
    let other = web_server.other();
    if vhost::remove(host, other, &site.domain).step("remove vhost")? {
        let warning = format!(
            "Removed a {other} vhost for {} although this host is configured for {web_server}; \
             the web server choice may be stale",
            site.domain
        );
        progress.warn(&warning);
        warnings.push(warning);
        removed.push(format!("{other} vhost"));
    }

    // PHP-FPM
    progress.step(&format!("Removing PHP {} pool", site.php_version));
    if pool::remove(host, &site.php_version, &site.username).step("remove PHP-FPM pool")? {
        removed.push(format!("PHP {} pool", site.php_version));
        service::restart_php(host, &site.php_version).step("restart PHP-FPM")?;
    }

    // MySQL
    progress.step(&format!("Dropping database {}", site.database_name));
    database::remove(host, &site.database_name).step("drop database")?;
    removed.push(format!("database {}", site.database_name));

    // account and files
    progress.step(&format!("Deleting Linux user {}", site.username));
    if account::remove(host, &site.username).step("delete Linux user")? {
        removed.push(format!("user {}", site.username));
    }
    if account::remove_home(&site.home_dir).step("remove home directory")? {
        removed.push(site.home_dir.display().to_string());
    }

    // TLS
    if vhost::remove_tls(host, &site.domain).step("remove TLS certificate")? > 0 {
        removed.push("TLS certificate".to_string());
    }

    progress.success(&format!("Site {} deleted", site.domain));
    Ok(DeleteReport {
        site,
        backup,
        removed,
        warnings,
    })
}
