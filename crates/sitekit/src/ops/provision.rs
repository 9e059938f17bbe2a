//! Create a new site end to end.
//!
//! Every check runs before the first mutation. After that, steps run in a
//! fixed order and the first failure stops the sequence; completed steps are
//! left in place.

use std::net::IpAddr;
use std::path::PathBuf;

use crate::error::{Error, Result, StepExt};
use crate::host::Host;
use crate::inspect;
use crate::mutate::{account, database, pool, service, vhost};
use crate::password;
use crate::record::SiteRecord;
use crate::types::{AppType, PhpVersion, SiteInfo, SiteSource, WebServer};
use crate::validate;

/// Port printed for SFTP/SSH access.
pub const SSH_PORT: u16 = 22;

/// What to create.
#[derive(Debug, Clone, Default)]
pub struct ProvisionRequest {
    pub domain: String,
    pub username: String,
    /// Account password; generated when `None`
    pub password: Option<String>,
    /// `MAJOR.MINOR`; the newest installed version when `None`
    pub php_version: Option<String>,
    pub app_type: AppType,
}

/// Database credentials handed to the site owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseCredentials {
    pub name: String,
    pub user: String,
    pub password: String,
}

/// Everything the operator needs to hand the new site over.
#[derive(Debug, Clone)]
pub struct ProvisionReport {
    pub site: SiteInfo,
    pub web_server: WebServer,
    pub ip: IpAddr,
    pub account_password: String,
    pub database: DatabaseCredentials,
    pub record_path: PathBuf,
}

impl ProvisionReport {
    /// Ready-to-run certbot command for a real certificate.
    pub fn certbot_command(&self, admin_email: &str) -> String {
        let installer = match self.web_server {
            WebServer::Nginx => "nginx",
            WebServer::Apache => "apache",
        };
        format!(
            "certbot --authenticator webroot --webroot-path '{}' --installer {installer} \
             -m {admin_email} --agree-tos --no-eff-email -d {domain} -d www.{domain}",
            self.site.document_root.display(),
            domain = self.site.domain,
        )
    }

    pub fn phpmyadmin_url(&self, port: u16) -> String {
        match self.ip {
            IpAddr::V4(ip) => format!("http://{ip}:{port}"),
            IpAddr::V6(ip) => format!("http://[{ip}]:{port}"),
        }
    }
}

/// Provision a site.
pub fn provision(host: &Host<'_>, request: ProvisionRequest) -> Result<ProvisionReport> {
    let web_server = host.require_web_server()?;
    let layout = &host.layout;

    // ------------------------------------------------------------------------
    // Preconditions
    // ------------------------------------------------------------------------

    let php_version = match request.php_version.as_deref() {
        Some(raw) => raw.trim().parse::<PhpVersion>()?,
        None => {
            let latest = inspect::latest_php_version(layout).ok_or_else(|| {
                Error::Precondition(
                    "no installed PHP-FPM version found; specify one with --php".to_string(),
                )
            })?;
            host.progress
                .step(&format!("PHP version not specified, using latest installed: {latest}"));
            latest
        }
    };
    if !inspect::php_socket_live(layout, &php_version) {
        return Err(Error::Precondition(format!(
            "PHP {php_version} is not running: {} not found",
            layout.php_socket(&php_version).display()
        )));
    }

    let username = request.username.trim().to_string();
    let domain = request.domain.trim().to_string();
    validate::username(&username)?;
    validate::domain(&domain)?;

    let account_password = match request.password {
        Some(pw) => {
            validate::password(&pw)?;
            pw
        }
        None => password::generate(),
    };

    if host.accounts.user_exists(&username) {
        return Err(Error::Precondition(format!(
            "Linux user {username} already exists"
        )));
    }
    let home_dir = layout.home_dir(&domain);
    if home_dir.exists() {
        return Err(Error::Precondition(format!(
            "home directory {} already exists",
            home_dir.display()
        )));
    }

    let site = SiteInfo {
        document_root: layout.document_root(&domain, request.app_type),
        database_name: SiteInfo::default_database_name(&username),
        home_dir,
        php_version,
        app_type: request.app_type,
        created_at: Some(super::now()),
        php_version_updated_at: None,
        source: SiteSource::Record,
        domain,
        username,
    };
    log::info!(
        "Provisioning {} for user {} on PHP {} ({}, {web_server})",
        site.domain,
        site.username,
        site.php_version,
        site.app_type
    );

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    let progress = host.progress;
    let db = DatabaseCredentials {
        name: site.database_name.clone(),
        user: site.database_name.clone(),
        password: password::generate(),
    };

    progress.step(&format!("Creating database {}", db.name));
    database::create(host, &db.name, &db.password).step("create database")?;

    progress.step("Looking up public IP");
    let ip = host.public_ip.lookup().step("look up public IP")?;

    progress.step(&format!("Creating Linux user {}", site.username));
    account::create(host, &site.username, &site.home_dir).step("create Linux user")?;
    account::set_password(host, &site.username, &account_password).step("set account password")?;

    progress.step(&format!("Writing PHP {} pool", site.php_version));
    pool::write(host, &site.php_version, &site.username).step("write PHP-FPM pool")?;

    progress.step(&format!("Writing {web_server} vhost"));
    vhost::write(host, web_server, &site).step("write vhost")?;

    account::prepare_home(host, &site).step("prepare document root")?;
    account::add_to_group(host, &host.settings.web_user, &site.username)
        .step("add web server user to site group")?;

    progress.step("Generating self-signed TLS certificate");
    vhost::create_tls(host, &site.domain).step("generate TLS certificate")?;

    progress.step("Restarting services");
    service::restart_php(host, &site.php_version).step("restart PHP-FPM")?;
    service::restart_web_server(host, web_server).step("restart web server")?;

    let record_path = host
        .records()
        .save(&site.domain, &SiteRecord::from_site(&site))
        .step("save site record")?;

    progress.success(&format!("Site {} created", site.domain));
    Ok(ProvisionReport {
        site,
        web_server,
        ip,
        account_password,
        database: db,
        record_path,
    })
}
