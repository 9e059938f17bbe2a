//! Web-server vhost files and the site's self-signed TLS certificate.

use std::fs;
use std::path::PathBuf;

use crate::error::Result;
use crate::host::Host;
use crate::types::{SiteInfo, WebServer};

/// Key size for generated certificates.
pub const TLS_KEY_BITS: &str = "2048";
/// Validity of generated certificates, in days.
pub const TLS_DAYS: &str = "3650";

/// Render and write the vhost for `site` on `server`.
pub fn write(host: &Host<'_>, server: WebServer, site: &SiteInfo) -> Result<PathBuf> {
    let path = host.layout.vhost_file(server, &site.domain);
    let content = host
        .templates
        .vhost(server, site.app_type, &site.domain, &site.username)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, content)?;
    log::info!("Wrote {server} vhost {}", path.display());
    Ok(path)
}

/// Remove the vhost for `domain` on `server`. Returns whether it existed.
pub fn remove(host: &Host<'_>, server: WebServer, domain: &str) -> Result<bool> {
    let path = host.layout.vhost_file(server, domain);
    let removed = super::remove_file_if_exists(&path)?;
    if removed {
        log::info!("Removed {server} vhost {}", path.display());
    }
    Ok(removed)
}

/// Generate an RSA key and a self-signed certificate with `CN = domain`.
pub fn create_tls(host: &Host<'_>, domain: &str) -> Result<()> {
    fs::create_dir_all(&host.layout.ssl_dir)?;
    let key = host.layout.tls_key(domain).display().to_string();
    let cert = host.layout.tls_cert(domain).display().to_string();
    let subject = format!("/CN={domain}");

    host.runner
        .run_checked("openssl", &["genrsa", "-out", &key, TLS_KEY_BITS])?;
    host.runner.run_checked(
        "openssl",
        &[
            "req", "-new", "-x509", "-key", &key, "-out", &cert, "-days", TLS_DAYS, "-subj",
            &subject,
        ],
    )?;
    log::info!("Generated self-signed certificate {cert}");
    Ok(())
}

/// Remove the TLS key and certificate. Returns how many files existed.
pub fn remove_tls(host: &Host<'_>, domain: &str) -> Result<usize> {
    let mut removed = 0;
    for path in [host.layout.tls_key(domain), host.layout.tls_cert(domain)] {
        if super::remove_file_if_exists(&path)? {
            log::info!("Removed {}", path.display());
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;
    use crate::types::{AppType, PhpVersion, SiteSource};

    fn site(fx: &Fixture) -> SiteInfo {
        SiteInfo {
            domain: "foo.com".into(),
            username: "foo".into(),
            home_dir: fx.layout.home_dir("foo.com"),
            document_root: fx.layout.document_root("foo.com", AppType::Wp),
            database_name: "foo_db".into(),
            php_version: PhpVersion::new(8, 2),
            app_type: AppType::Wp,
            created_at: None,
            php_version_updated_at: None,
            source: SiteSource::Record,
        }
    }

    #[test]
    fn test_write_per_server() {
        let fx = Fixture::new();
        let host = fx.host(WebServer::Apache);
        let site = site(&fx);

        let apache = write(&host, WebServer::Apache, &site).unwrap();
        assert!(apache.starts_with(&fx.layout.apache_sites));
        assert!(fs::read_to_string(&apache).unwrap().contains("ServerName foo.com"));

        let nginx = write(&host, WebServer::Nginx, &site).unwrap();
        assert!(nginx.starts_with(&fx.layout.nginx_sites));
    }

    #[test]
    fn test_remove_vhost() {
        let fx = Fixture::new();
        fx.add_vhost(WebServer::Nginx, "foo.com");
        let host = fx.host(WebServer::Nginx);
        assert!(remove(&host, WebServer::Nginx, "foo.com").unwrap());
        assert!(!remove(&host, WebServer::Nginx, "foo.com").unwrap());
        assert!(!remove(&host, WebServer::Apache, "foo.com").unwrap());
    }

    #[test]
    fn test_create_tls_commands() {
        let fx = Fixture::new();
        let host = fx.host(WebServer::Nginx);
        create_tls(&host, "foo.com").unwrap();

        let calls = fx.runner.calls_to("openssl");
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].args[0], "genrsa");
        assert!(calls[0].args.contains(&"2048".to_string()));
        assert!(calls[1].args.contains(&"/CN=foo.com".to_string()));
        assert!(calls[1].args.contains(&"3650".to_string()));
    }

    #[test]
    fn test_remove_tls() {
        let fx = Fixture::new();
        fx.add_tls("foo.com");
        let host = fx.host(WebServer::Nginx);
        assert_eq!(remove_tls(&host, "foo.com").unwrap(), 2);
        assert_eq!(remove_tls(&host, "foo.com").unwrap(), 0);
    }
}
