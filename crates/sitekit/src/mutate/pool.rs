//! PHP-FPM pool files.

use std::fs;
use std::path::PathBuf;

use crate::error::Result;
use crate::host::Host;
use crate::types::PhpVersion;

/// Render the pool template for `username` under `version`.
pub fn write(host: &Host<'_>, version: &PhpVersion, username: &str) -> Result<PathBuf> {
    let path = host.layout.pool_file(version, username);
    fs::create_dir_all(host.layout.pool_dir(version))?;
    fs::write(&path, host.templates.pool(username)?)?;
    log::info!("Wrote PHP-FPM pool {}", path.display());
    Ok(path)
}

/// Move the pool file between versions by copy then delete.
///
/// Returns `Ok(None)` when there is no pool file under `from`.
pub fn relocate(
    host: &Host<'_>,
    from: &PhpVersion,
    to: &PhpVersion,
    username: &str,
) -> Result<Option<PathBuf>> {
    let src = host.layout.pool_file(from, username);
    if !src.is_file() {
        return Ok(None);
    }
    let dst = host.layout.pool_file(to, username);
    fs::create_dir_all(host.layout.pool_dir(to))?;
    fs::copy(&src, &dst)?;
    fs::remove_file(&src)?;
    log::info!("Moved PHP-FPM pool {} -> {}", src.display(), dst.display());
    Ok(Some(dst))
}

/// Remove the pool file. Returns whether it existed.
pub fn remove(host: &Host<'_>, version: &PhpVersion, username: &str) -> Result<bool> {
    let path = host.layout.pool_file(version, username);
    let removed = super::remove_file_if_exists(&path)?;
    if removed {
        log::info!("Removed PHP-FPM pool {}", path.display());
    }
    Ok(removed)
}
