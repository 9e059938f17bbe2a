//! Filesystem layout of a managed host.
//!
//! Every path the tool reads or writes is derived from one of these roots,
//! so the whole layout can be relocated under a scratch directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::types::{AppType, PhpVersion, WebServer};

/// Root directories of the managed host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostLayout {
    /// Parent of every site home directory (`/home`)
    pub home_root: PathBuf,
    /// PHP configuration root, one directory per version (`/etc/php`)
    pub php_etc: PathBuf,
    /// PHP-FPM runtime directory holding the per-version sockets (`/var/run/php`)
    pub php_run: PathBuf,
    /// Enabled Nginx vhosts
    pub nginx_sites: PathBuf,
    /// Enabled Apache vhosts
    pub apache_sites: PathBuf,
    /// TLS key and certificate directory
    pub ssl_dir: PathBuf,
    /// Site records, one file per domain
    pub sitedata_dir: PathBuf,
    /// Backup archives and staging directories
    pub backup_root: PathBuf,
}

impl Default for HostLayout {
    fn default() -> Self {
        Self {
            home_root: PathBuf::from("/home"),
            php_etc: PathBuf::from("/etc/php"),
            php_run: PathBuf::from("/var/run/php"),
            nginx_sites: PathBuf::from("/etc/nginx/sites-enabled"),
            apache_sites: PathBuf::from("/etc/apache2/sites-enabled"),
            ssl_dir: PathBuf::from("/etc/ssl"),
            sitedata_dir: PathBuf::from("/usr/serverok/sitedata"),
            backup_root: PathBuf::from("/usr/serverok/backup"),
        }
    }
}

impl HostLayout {
    /// The standard layout re-rooted under `root`.
    pub fn rooted(root: &Path) -> Self {
        let base = Self::default();
        let reroot = |p: &Path| root.join(p.strip_prefix("/").unwrap_or(p));
        Self {
            home_root: reroot(&base.home_root),
            php_etc: reroot(&base.php_etc),
            php_run: reroot(&base.php_run),
            nginx_sites: reroot(&base.nginx_sites),
            apache_sites: reroot(&base.apache_sites),
            ssl_dir: reroot(&base.ssl_dir),
            sitedata_dir: reroot(&base.sitedata_dir),
            backup_root: reroot(&base.backup_root),
        }
    }

    /// All roots with their config key, for display and validation.
    pub fn entries(&self) -> [(&'static str, &Path); 8] {
        [
            ("home_root", &self.home_root),
            ("php_etc", &self.php_etc),
            ("php_run", &self.php_run),
            ("nginx_sites", &self.nginx_sites),
            ("apache_sites", &self.apache_sites),
            ("ssl_dir", &self.ssl_dir),
            ("sitedata_dir", &self.sitedata_dir),
            ("backup_root", &self.backup_root),
        ]
    }

    // ========================================================================
    // Site paths
    // ========================================================================

    pub fn home_dir(&self, domain: &str) -> PathBuf {
        self.home_root.join(domain)
    }

    /// `html/` under the home directory, `html/public/` for Laravel.
    pub fn document_root(&self, domain: &str, app_type: AppType) -> PathBuf {
        let html = self.home_dir(domain).join("html");
        match app_type {
            AppType::Wp => html,
            AppType::Laravel => html.join("public"),
        }
    }

    pub fn record_file(&self, domain: &str) -> PathBuf {
        self.sitedata_dir.join(domain)
    }

    // ========================================================================
    // PHP-FPM
    // ========================================================================

    pub fn php_version_dir(&self, version: &PhpVersion) -> PathBuf {
        self.php_etc.join(version.to_string())
    }

    pub fn pool_dir(&self, version: &PhpVersion) -> PathBuf {
        self.php_version_dir(version).join("fpm").join("pool.d")
    }

    pub fn pool_file(&self, version: &PhpVersion, username: &str) -> PathBuf {
        self.pool_dir(version).join(format!("{username}.conf"))
    }

    pub fn php_socket(&self, version: &PhpVersion) -> PathBuf {
        self.php_run.join(format!("php{version}-fpm.sock"))
    }

    // ========================================================================
    // Web server and TLS
    // ========================================================================

    pub fn vhost_file(&self, server: WebServer, domain: &str) -> PathBuf {
        let dir = match server {
            WebServer::Nginx => &self.nginx_sites,
            WebServer::Apache => &self.apache_sites,
        };
        dir.join(format!("{domain}.conf"))
    }

    pub fn tls_key(&self, domain: &str) -> PathBuf {
        self.ssl_dir.join(format!("{domain}.key"))
    }

    pub fn tls_cert(&self, domain: &str) -> PathBuf {
        self.ssl_dir.join(format!("{domain}.crt"))
    }
}
