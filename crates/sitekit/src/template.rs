//! Config-file templates.
//!
//! Templates are compiled into the binary. A file with the same name in the
//! override directory replaces the built-in text. Placeholders are bare words
//! (`POOL_NAME`, `FPM_USER`, `FQDN`) replaced literally.

use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::{AppType, WebServer};

/// Placeholder for the pool name (the site username).
pub const POOL_NAME: &str = "POOL_NAME";
/// Placeholder for the user the pool runs as.
pub const FPM_USER: &str = "FPM_USER";
/// Placeholder for the site domain.
pub const FQDN: &str = "FQDN";

/// The built-in templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    PhpFpmPool,
    NginxVhost,
    NginxLaravelVhost,
    ApacheVhost,
    ApacheLaravelVhost,
}

impl Template {
    /// All templates, for listing.
    pub const ALL: [Self; 5] = [
        Self::PhpFpmPool,
        Self::NginxVhost,
        Self::NginxLaravelVhost,
        Self::ApacheVhost,
        Self::ApacheLaravelVhost,
    ];

    /// Vhost template for a server and app type.
    pub fn vhost(server: WebServer, app_type: AppType) -> Self {
        match (server, app_type) {
            (WebServer::Nginx, AppType::Wp) => Self::NginxVhost,
            (WebServer::Nginx, AppType::Laravel) => Self::NginxLaravelVhost,
            (WebServer::Apache, AppType::Wp) => Self::ApacheVhost,
            (WebServer::Apache, AppType::Laravel) => Self::ApacheLaravelVhost,
        }
    }

    /// File name, both built-in and in the override directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::PhpFpmPool => "php-fpm-pool.conf",
            Self::NginxVhost => "nginx-vhost-ssl.conf",
            Self::NginxLaravelVhost => "nginx-laravel-vhost-ssl.conf",
            Self::ApacheVhost => "apache-vhost.conf",
            Self::ApacheLaravelVhost => "apache-vhost-laravel.conf",
        }
    }

    fn builtin(&self) -> &'static str {
        match self {
            Self::PhpFpmPool => include_str!("../templates/php-fpm-pool.conf"),
            Self::NginxVhost => include_str!("../templates/nginx-vhost-ssl.conf"),
            Self::NginxLaravelVhost => include_str!("../templates/nginx-laravel-vhost-ssl.conf"),
            Self::ApacheVhost => include_str!("../templates/apache-vhost.conf"),
            Self::ApacheLaravelVhost => include_str!("../templates/apache-vhost-laravel.conf"),
        }
    }
}

/// Template source: built-ins plus an optional override directory.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    dir: Option<PathBuf>,
}

impl TemplateSet {
    /// Built-in templates only.
    pub fn builtin() -> Self {
        Self { dir: None }
    }

    /// Built-ins, overridden by files in `dir`.
    pub fn with_overrides(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    pub fn override_dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// The override file that will be used for `template`, if there is one.
    pub fn override_file(&self, template: Template) -> Option<PathBuf> {
        self.override_dir()
            .map(|dir| dir.join(template.file_name()))
            .filter(|path| path.is_file())
    }

    /// Raw template text.
    pub fn load(&self, template: Template) -> Result<String> {
        if let Some(dir) = &self.dir {
            let path = dir.join(template.file_name());
            match fs::read_to_string(&path) {
                Ok(text) => {
                    log::debug!("Using template override {}", path.display());
                    return Ok(text);
                }
                Err(e) if e.kind() == IoErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(template.builtin().to_string())
    }

    /// Rendered PHP-FPM pool for `username`.
    pub fn pool(&self, username: &str) -> Result<String> {
        let text = self.load(Template::PhpFpmPool)?;
        Ok(render(&text, &[(POOL_NAME, username), (FPM_USER, username)]))
    }

    /// Rendered vhost for a site.
    pub fn vhost(
        &self,
        server: WebServer,
        app_type: AppType,
        domain: &str,
        username: &str,
    ) -> Result<String> {
        let text = self.load(Template::vhost(server, app_type))?;
        Ok(render(&text, &[(POOL_NAME, username), (FQDN, domain)]))
    }
}

/// Replace every placeholder occurrence with its value.
///
/// Substitution is a single left-to-right pass: inserted values are never
/// scanned again, so a value containing a placeholder name stays as is.
pub fn render(text: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(ch) = rest.chars().next() {
        match vars
            .iter()
            .find(|(key, _)| !key.is_empty() && rest.starts_with(key))
        {
            Some((key, value)) => {
                out.push_str(value);
                rest = &rest[key.len()..];
            }
            None => {
                out.push(ch);
                rest = &rest[ch.len_utf8()..];
            }
        }
    }
    out
}
