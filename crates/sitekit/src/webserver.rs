//! Which web server this host runs.
//!
//! The choice is cached in a one-line file. When the file is missing or holds
//! garbage, the server is detected from the port-80 listener and the result
//! written back.

use std::fs;
use std::path::Path;

use crate::backend::CommandRunner;
use crate::error::{Error, Result};
use crate::types::WebServer;

const PORT_80_LISTENERS: [&str; 3] = ["*:80 ", "0.0.0.0:80 ", "[::]:80 "];

/// Detect the web server from `ss -nltp`.
pub fn detect(runner: &dyn CommandRunner) -> Result<WebServer> {
    let output = runner.run_checked("ss", &["-nltp"])?;
    parse_listeners(&output.stdout_str()).ok_or_else(|| {
        Error::Precondition(
            "could not detect a web server: no apache2 or nginx listening on port 80".to_string(),
        )
    })
}

/// Find the server owning a wildcard port-80 listener in `ss -nltp` output.
pub fn parse_listeners(ss_output: &str) -> Option<WebServer> {
    ss_output
        .lines()
        .map(str::to_lowercase)
        .filter(|line| {
            let padded = format!("{line} ");
            PORT_80_LISTENERS.iter().any(|l| padded.contains(l))
        })
        .find_map(|line| {
            if line.contains("apache2") {
                Some(WebServer::Apache)
            } else if line.contains("nginx") {
                Some(WebServer::Nginx)
            } else {
                None
            }
        })
}

/// Read the cached choice, detecting and caching it when needed.
pub fn load_or_detect(choice_file: &Path, runner: &dyn CommandRunner) -> Result<WebServer> {
    match fs::read_to_string(choice_file) {
        Ok(content) => match content.parse::<WebServer>() {
            Ok(server) => return Ok(server),
            Err(_) => log::warn!(
                "Ignoring invalid web server choice in {}: '{}'",
                choice_file.display(),
                content.trim()
            ),
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Cannot read {}: {e}", choice_file.display()),
    }

    let server = detect(runner)?;
    log::info!("Detected web server: {server}");
    save(choice_file, server)?;
    Ok(server)
}

/// Write the choice file, creating parent directories.
pub fn save(choice_file: &Path, server: WebServer) -> Result<()> {
    if let Some(parent) = choice_file.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(choice_file, format!("{server}\n"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CommandOutput;
    use crate::error::ErrorKind;
    use crate::testing::FakeRunner;
    use tempfile::TempDir;

    const SS_NGINX: &str = "\
State  Recv-Q Send-Q Local Address:Port Peer Address:Port Process
LISTEN 0      511          0.0.0.0:80        0.0.0.0:*     users:((\"nginx\",pid=812,fd=6))
LISTEN 0      80         127.0.0.1:3306      0.0.0.0:*     users:((\"mysqld\",pid=700,fd=21))
";

    const SS_APACHE: &str = "\
State  Recv-Q Send-Q Local Address:Port Peer Address:Port Process
LISTEN 0      511                *:80              *:*     users:((\"apache2\",pid=901,fd=4))
";

    #[test]
    fn test_parse_listeners() {
        assert_eq!(parse_listeners(SS_NGINX), Some(WebServer::Nginx));
        assert_eq!(parse_listeners(SS_APACHE), Some(WebServer::Apache));
        assert_eq!(parse_listeners("LISTEN 0 511 [::]:80 [::]:* users:((\"nginx\"))"), Some(WebServer::Nginx));
    }

    #[test]
    fn test_parse_ignores_other_ports() {
        let out = "LISTEN 0 511 0.0.0.0:8080 0.0.0.0:* users:((\"nginx\",pid=1,fd=6))\n\
                   LISTEN 0 511 127.0.0.1:80 0.0.0.0:* users:((\"apache2\",pid=2,fd=4))\n";
        assert_eq!(parse_listeners(out), None);
    }

    #[test]
    fn test_choice_file_wins() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("webserver");
        fs::write(&file, "apache\n").unwrap();
        let runner = FakeRunner::new();
        assert_eq!(load_or_detect(&file, &runner).unwrap(), WebServer::Apache);
        assert_eq!(runner.count("ss"), 0);
    }

    #[test]
    fn test_detect_and_cache() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("okpanel/config/webserver");
        let runner = FakeRunner::new();
        runner.respond("ss", "-nltp", CommandOutput::ok(SS_NGINX));

        assert_eq!(load_or_detect(&file, &runner).unwrap(), WebServer::Nginx);
        assert_eq!(fs::read_to_string(&file).unwrap(), "nginx\n");
    }

    #[test]
    fn test_invalid_choice_falls_back_to_detection() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("webserver");
        fs::write(&file, "caddy\n").unwrap();
        let runner = FakeRunner::new();
        runner.respond("ss", "-nltp", CommandOutput::ok(SS_APACHE));

        assert_eq!(load_or_detect(&file, &runner).unwrap(), WebServer::Apache);
        assert_eq!(fs::read_to_string(&file).unwrap(), "apache\n");
    }

    #[test]
    fn test_nothing_listening() {
        let dir = TempDir::new().unwrap();
        let runner = FakeRunner::new();
        let err = load_or_detect(&dir.path().join("webserver"), &runner).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
    }
}
