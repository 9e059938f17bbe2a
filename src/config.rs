use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use sitekit::{DEFAULT_IP_LOOKUP_URL, HostLayout, SiteSettings, TemplateSet};

/// Effective okpanel configuration.
///
/// Every key is optional; a missing file means all defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log file, appended to
    pub log_file: PathBuf,
    /// Cached web server choice (`nginx` or `apache`)
    pub webserver_file: PathBuf,
    /// Directory whose files override the built-in templates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates_dir: Option<PathBuf>,
    /// Plain-text endpoint returning this host's public IP
    pub ip_lookup_url: String,
    /// Port phpMyAdmin listens on, for the handover summary
    pub phpmyadmin_port: u16,
    pub site: SiteSettings,
    pub paths: HostLayout,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("/var/log/server-manager.log"),
            webserver_file: PathBuf::from("/usr/serverok/okpanel/config/webserver"),
            templates_dir: None,
            ip_lookup_url: DEFAULT_IP_LOOKUP_URL.to_string(),
            phpmyadmin_port: 7777,
            site: SiteSettings::default(),
            paths: HostLayout::default(),
        }
    }
}

impl Config {
    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Could not read {}", path.display()));
            }
        };
        let config = Self::parse(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject relative paths and unusable values.
    pub fn validate(&self) -> Result<()> {
        let mut paths: Vec<(&str, &Path)> = vec![
            ("log_file", &self.log_file),
            ("webserver_file", &self.webserver_file),
        ];
        if let Some(dir) = &self.templates_dir {
            paths.push(("templates_dir", dir));
        }
        let layout = self.paths.entries();
        paths.extend(layout.iter().map(|(key, path)| (*key, *path)));

        for (key, path) in paths {
            if !path.is_absolute() {
                bail!("{key} must be an absolute path, got '{}'", path.display());
            }
        }

        if !self.ip_lookup_url.starts_with("http://") && !self.ip_lookup_url.starts_with("https://")
        {
            bail!("ip_lookup_url must be an http(s) URL, got '{}'", self.ip_lookup_url);
        }
        if self.site.web_user.trim().is_empty() {
            bail!("site.web_user must not be empty");
        }
        Ok(())
    }

    /// Built-in templates, overridden from `templates_dir` when set.
    pub fn templates(&self) -> TemplateSet {
        match &self.templates_dir {
            Some(dir) => TemplateSet::with_overrides(dir),
            None => TemplateSet::builtin(),
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Could not serialize config")
    }
}

// ============================================================================
// Tests
// ============================================================================
