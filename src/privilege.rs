//! Root privilege check.

use anyhow::{Result, bail};

/// Whether the process runs with effective uid 0.
pub fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail
    unsafe { libc::geteuid() == 0 }
}

/// Fail unless running as root.
pub fn require_root() -> Result<()> {
    if !is_root() {
        bail!("okpanel must be run as root (try sudo)");
    }
    Ok(())
}
