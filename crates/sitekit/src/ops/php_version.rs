//! Move a site to another PHP version.

use std::path::PathBuf;

use crate::error::{Error, Result, StepExt};
use crate::host::Host;
use crate::inspect;
use crate::mutate::{pool, service};
use crate::record::SiteRecord;
use crate::resolve::resolve;
use crate::types::{PhpVersion, SiteInfo};

/// Outcome of a PHP version change.
#[derive(Debug, Clone)]
pub enum PhpChange {
    /// Already on the requested version; nothing was touched
    Unchanged(SiteInfo),
    /// Pool moved and services restarted
    Changed {
        site: SiteInfo,
        from: PhpVersion,
        /// Where the pool file now lives
        pool_file: PathBuf,
        /// `false` when there was no old pool file and a fresh one was rendered
        pool_moved: bool,
        /// `false` when the old version's socket was gone
        old_restarted: bool,
    },
}

impl PhpChange {
    pub fn site(&self) -> &SiteInfo {
        match self {
            Self::Unchanged(site) | Self::Changed { site, .. } => site,
        }
    }
}

/// Switch `domain` to PHP `target`.
pub fn change_php_version(host: &Host<'_>, domain: &str, target: &str) -> Result<PhpChange> {
    let target: PhpVersion = target.trim().parse()?;
    if !inspect::php_socket_live(&host.layout, &target) {
        return Err(Error::Precondition(format!(
            "PHP {target} is not running: {} not found",
            host.layout.php_socket(&target).display()
        )));
    }

    let mut site = resolve(host, domain)?;
    let progress = host.progress;
    if site.php_version == target {
        progress.success(&format!("{domain} already uses PHP {target}"));
        return Ok(PhpChange::Unchanged(site));
    }

    let from = site.php_version.clone();
    progress.step(&format!("Moving {domain} from PHP {from} to PHP {target}"));

    let (pool_file, pool_moved) =
        match pool::relocate(host, &from, &target, &site.username).step("move PHP-FPM pool")? {
            Some(path) => (path, true),
            None => {
                progress.warn(&format!(
                    "No pool file for {} under PHP {from}, creating a new one",
                    site.username
                ));
                let path = pool::write(host, &target, &site.username).step("write PHP-FPM pool")?;
                (path, false)
            }
        };

    let old_restarted = if inspect::php_socket_live(&host.layout, &from) {
        service::restart_php(host, &from).step("restart old PHP-FPM")?;
        true
    } else {
        log::info!("PHP {from} is not running, skipping its restart");
        false
    };
    service::restart_php(host, &target).step("restart PHP-FPM")?;

    site.php_version = target.clone();
    site.php_version_updated_at = Some(super::now());
    let updated_at = site.php_version_updated_at;
    host.records()
        .update(domain, SiteRecord::from_site(&site), |record| {
            record.php_version = Some(target.to_string());
            record.php_version_updated = updated_at;
        })
        .step("update site record")?;

    progress.success(&format!("{domain} now uses PHP {target}"));
    Ok(PhpChange::Changed {
        site,
        from,
        pool_file,
        pool_moved,
        old_restarted,
    })
}
