//! Linux account and home directory.

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::host::Host;
use crate::types::SiteInfo;

/// `useradd` with a home directory and a bash login shell.
pub fn create(host: &Host<'_>, username: &str, home: &Path) -> Result<()> {
    let home = home.display().to_string();
    host.runner
        .run_checked("useradd", &["-m", "-s", "/bin/bash", "-d", &home, username])?;
    log::info!("Created Linux user {username} with home {home}");
    Ok(())
}

/// Set the account password. The password travels on stdin only.
pub fn set_password(host: &Host<'_>, username: &str, password: &str) -> Result<()> {
    let line = format!("{username}:{password}\n");
    host.runner
        .run_checked_with_stdin("chpasswd", &[], line.as_bytes())?;
    log::info!("Set password for {username}");
    Ok(())
}

/// Add `member` to `group`.
pub fn add_to_group(host: &Host<'_>, member: &str, group: &str) -> Result<()> {
    host.runner.run_checked("usermod", &["-aG", group, member])?;
    log::info!("Added {member} to group {group}");
    Ok(())
}

/// Create the document root, hand `html/` to the site user and lock the
/// home directory down to `750`.
pub fn prepare_home(host: &Host<'_>, site: &SiteInfo) -> Result<()> {
    fs::create_dir_all(&site.document_root)?;
    let html = site.home_dir.join("html").display().to_string();
    let owner = format!("{0}:{0}", site.username);
    host.runner.run_checked("chown", &["-R", &owner, &html])?;
    let home = site.home_dir.display().to_string();
    host.runner.run_checked("chmod", &["-R", "750", &home])?;
    log::info!("Prepared document root {}", site.document_root.display());
    Ok(())
}

/// `userdel -r` when the account exists. Returns whether it did.
pub fn remove(host: &Host<'_>, username: &str) -> Result<bool> {
    if !host.accounts.user_exists(username) {
        log::info!("Linux user {username} does not exist, skipping");
        return Ok(false);
    }
    host.runner.run_checked("userdel", &["-r", username])?;
    log::info!("Deleted Linux user {username}");
    Ok(true)
}

/// Remove whatever `userdel -r` left of the home directory.
pub fn remove_home(home: &Path) -> Result<bool> {
    let removed = super::remove_dir_if_exists(home)?;
    if removed {
        log::info!("Removed leftover home directory {}", home.display());
    }
    Ok(removed)
}
