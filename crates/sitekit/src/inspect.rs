//! Read-only inspection of live host state.
//!
//! Account lookups go through the [`Accounts`] trait so tests can describe
//! users and ownership without touching `/etc/passwd`. PHP versions and pool
//! files are discovered straight from the filesystem under a [`HostLayout`].

use regex::Regex;
use std::ffi::{CStr, CString};
use std::fs;
use std::mem::MaybeUninit;
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use std::ptr;
use std::sync::LazyLock;

use crate::layout::HostLayout;
use crate::types::PhpVersion;

static SOCKET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^php(\d+\.\d+)-fpm\.sock$").expect("static regex"));
static VERSION_DIR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+$").expect("static regex"));

// ============================================================================
// Accounts
// ============================================================================

/// Access to the OS account database.
pub trait Accounts: Send + Sync {
    /// Whether a Linux account with this name exists.
    fn user_exists(&self, name: &str) -> bool;

    /// Name of the user owning `path`, if both the path and the user exist.
    fn owner_name(&self, path: &Path) -> Option<String>;
}

/// [`Accounts`] backed by `getpwnam_r`/`getpwuid_r`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAccounts;

impl Accounts for SystemAccounts {
    fn user_exists(&self, name: &str) -> bool {
        let Ok(c_name) = CString::new(name) else {
            return false;
        };
        passwd_name(|pwd, buf, len, result| {
            // SAFETY: c_name is a valid NUL-terminated string and the other
            // pointers come from passwd_name, valid for the whole call.
            unsafe { libc::getpwnam_r(c_name.as_ptr(), pwd, buf, len, result) }
        })
        .is_some()
    }

    fn owner_name(&self, path: &Path) -> Option<String> {
        let uid = fs::metadata(path).ok()?.uid();
        passwd_name(|pwd, buf, len, result| {
            // SAFETY: pointers come from passwd_name, valid for the whole call.
            unsafe { libc::getpwuid_r(uid, pwd, buf, len, result) }
        })
    }
}

/// Run a reentrant passwd lookup, growing the scratch buffer on `ERANGE`,
/// and return the entry's user name.
fn passwd_name<F>(mut lookup: F) -> Option<String>
where
    F: FnMut(*mut libc::passwd, *mut libc::c_char, usize, *mut *mut libc::passwd) -> libc::c_int,
{
    let mut buf: Vec<libc::c_char> = vec![0; 1024];
    loop {
        let mut pwd = MaybeUninit::<libc::passwd>::uninit();
        let mut result: *mut libc::passwd = ptr::null_mut();
        let rc = lookup(pwd.as_mut_ptr(), buf.as_mut_ptr(), buf.len(), &raw mut result);
        if rc == libc::ERANGE && buf.len() < 1 << 20 {
            buf.resize(buf.len() * 2, 0);
            continue;
        }
        if rc != 0 || result.is_null() {
            return None;
        }
        // SAFETY: a non-null result means pwd was filled in and pw_name
        // points into buf, which is still alive here.
        let name = unsafe { CStr::from_ptr((*result).pw_name) };
        return Some(name.to_string_lossy().into_owned());
    }
}

// ============================================================================
// PHP-FPM
// ============================================================================

/// PHP versions with an FPM socket under `php_run`, ascending.
pub fn installed_php_versions(layout: &HostLayout) -> Vec<PhpVersion> {
    let mut versions: Vec<PhpVersion> = dir_names(&layout.php_run)
        .iter()
        .filter_map(|name| SOCKET_RE.captures(name))
        .filter_map(|caps| caps[1].parse().ok())
        .collect();
    versions.sort();
    versions.dedup();
    versions
}

/// Highest installed PHP version, if any.
pub fn latest_php_version(layout: &HostLayout) -> Option<PhpVersion> {
    installed_php_versions(layout).pop()
}

/// Whether the FPM socket for `version` exists.
pub fn php_socket_live(layout: &HostLayout, version: &PhpVersion) -> bool {
    layout.php_socket(version).exists()
}

/// Version directories under `php_etc` (`8.1`, `8.2`, ...), ascending.
pub fn configured_php_versions(layout: &HostLayout) -> Vec<PhpVersion> {
    let mut versions: Vec<PhpVersion> = dir_names(&layout.php_etc)
        .iter()
        .filter(|name| VERSION_DIR_RE.is_match(name))
        .filter(|name| layout.php_etc.join(name).is_dir())
        .filter_map(|name| name.parse().ok())
        .collect();
    versions.sort();
    versions
}

/// Every configured version that carries a pool file for `username`.
pub fn pool_versions(layout: &HostLayout, username: &str) -> Vec<PhpVersion> {
    configured_php_versions(layout)
        .into_iter()
        .filter(|v| layout.pool_file(v, username).is_file())
        .collect()
}

/// Lowest version carrying a pool file for `username`.
///
/// More than one hit means a half-finished version change; the first is
/// still used but a warning is logged.
pub fn find_pool_version(layout: &HostLayout, username: &str) -> Option<PhpVersion> {
    let hits = pool_versions(layout, username);
    if hits.len() > 1 {
        let listed: Vec<String> = hits.iter().map(ToString::to_string).collect();
        log::warn!(
            "Pool file for {username} found under several PHP versions ({}), using {}",
            listed.join(", "),
            hits[0]
        );
    }
    hits.into_iter().next()
}

fn dir_names(dir: &Path) -> Vec<String> {
    match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(std::result::Result::ok)
            .filter_map(|e| e.file_name().into_string().ok())
            .collect(),
        Err(e) => {
            log::debug!("Cannot list {}: {e}", dir.display());
            Vec::new()
        }
    }
}
