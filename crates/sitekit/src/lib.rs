//! Site lifecycle management for a single LAMP/LEMP host.
//!
//! `sitekit` provisions, reconfigures, backs up and deletes PHP websites on a
//! Linux host running Nginx or Apache, PHP-FPM and MySQL. Every operation
//! works in two phases:
//!
//! 1. **Resolve**: build a [`SiteInfo`] from the persisted site record, or
//!    infer it from home-directory ownership and PHP-FPM pool files.
//! 2. **Orchestrate**: check preconditions, then drive the resource mutators
//!    (account, pool, vhost, database) in a fixed order, stopping at the first
//!    failed step.
//!
//! # Example
//!
//! ```no_run
//! use sitekit::{Host, HostLayout, SystemAccounts, SystemRunner, HttpPublicIp, WebServer};
//!
//! let runner = SystemRunner;
//! let accounts = SystemAccounts;
//! let ip = HttpPublicIp::default();
//! let host = Host::new(HostLayout::default(), &runner, &accounts, &ip)
//!     .with_web_server(WebServer::Nginx);
//!
//! let report = sitekit::backup(&host, "example.com")?;
//! println!("archive: {:?}", report.archive);
//! # Ok::<(), sitekit::Error>(())
//! ```
//!
//! External programs run behind [`CommandRunner`] and account lookups behind
//! [`Accounts`], so everything above them can be exercised against a scratch
//! directory.

pub mod backend;
pub mod error;
pub mod host;
pub mod inspect;
pub mod layout;
pub mod mutate;
pub mod ops;
pub mod password;
pub mod progress;
pub mod record;
pub mod resolve;
pub mod template;
pub mod types;
pub mod validate;
pub mod webserver;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use backend::system::{DEFAULT_IP_LOOKUP_URL, HttpPublicIp, SystemRunner};
pub use backend::{CommandOutput, CommandRunner, PublicIp};
pub use error::{Error, ErrorKind, Result};
pub use host::{Host, SiteSettings};
pub use inspect::{Accounts, SystemAccounts};
pub use layout::HostLayout;
pub use ops::backup::{BackupReport, StepOutcome, StepReport, backup};
pub use ops::delete::{DeleteOptions, DeleteReport, delete};
pub use ops::php_version::{PhpChange, change_php_version};
pub use ops::provision::{DatabaseCredentials, ProvisionReport, ProvisionRequest, provision};
pub use progress::{NoProgress, ProgressCallback};
pub use record::{RecordStore, SiteRecord};
pub use resolve::resolve;
pub use template::TemplateSet;
pub use types::{AppType, PhpVersion, SiteInfo, SiteSource, WebServer};
