//! The managed host: layout, settings and the backends every operation uses.

use serde::{Deserialize, Serialize};

use crate::backend::{CommandRunner, PublicIp};
use crate::error::{Error, Result};
use crate::inspect::Accounts;
use crate::layout::HostLayout;
use crate::progress::{NoProgress, ProgressCallback};
use crate::record::RecordStore;
use crate::template::TemplateSet;
use crate::types::WebServer;

/// Site-wide settings that end up in generated files and output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    /// Web server system account added to each site's group
    pub web_user: String,
    /// Contact address passed to certbot
    pub admin_email: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            web_user: "www-data".to_string(),
            admin_email: "admin@serverok.in".to_string(),
        }
    }
}

/// Everything an operation needs to inspect and mutate the host.
///
/// The web server is loaded once by the caller and threaded in here; the
/// library never detects it on its own.
pub struct Host<'a> {
    pub layout: HostLayout,
    pub settings: SiteSettings,
    pub web_server: Option<WebServer>,
    pub templates: TemplateSet,
    pub runner: &'a dyn CommandRunner,
    pub accounts: &'a dyn Accounts,
    pub public_ip: &'a dyn PublicIp,
    pub progress: &'a dyn ProgressCallback,
}

impl<'a> Host<'a> {
    /// A host with default settings, built-in templates and no progress output.
    pub fn new(
        layout: HostLayout,
        runner: &'a dyn CommandRunner,
        accounts: &'a dyn Accounts,
        public_ip: &'a dyn PublicIp,
    ) -> Self {
        Self {
            layout,
            settings: SiteSettings::default(),
            web_server: None,
            templates: TemplateSet::builtin(),
            runner,
            accounts,
            public_ip,
            progress: &NoProgress,
        }
    }

    #[must_use]
    pub fn with_web_server(mut self, server: WebServer) -> Self {
        self.web_server = Some(server);
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: SiteSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn with_templates(mut self, templates: TemplateSet) -> Self {
        self.templates = templates;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: &'a dyn ProgressCallback) -> Self {
        self.progress = progress;
        self
    }

    /// Site record store under `sitedata_dir`.
    pub fn records(&self) -> RecordStore {
        RecordStore::new(&self.layout.sitedata_dir)
    }

    /// The configured web server, required by provision and delete.
    pub fn require_web_server(&self) -> Result<WebServer> {
        self.web_server.ok_or_else(|| {
            Error::Precondition("no web server configured for this host".to_string())
        })
    }
}
