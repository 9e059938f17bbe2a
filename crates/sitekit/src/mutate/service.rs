//! systemd service restarts.

use crate::error::Result;
use crate::host::Host;
use crate::types::{PhpVersion, WebServer};

/// `systemctl restart {unit}`.
pub fn restart(host: &Host<'_>, unit: &str) -> Result<()> {
    host.runner.run_checked("systemctl", &["restart", unit])?;
    log::info!("Restarted {unit}");
    Ok(())
}

pub fn restart_php(host: &Host<'_>, version: &PhpVersion) -> Result<()> {
    restart(host, &version.fpm_service())
}

pub fn restart_web_server(host: &Host<'_>, server: WebServer) -> Result<()> {
    restart(host, server.service_name())
}
