pub mod add;
pub mod backup;
pub mod config;
pub mod delete;
pub mod info;
pub mod php;

use sitekit::SiteInfo;

use crate::ui;

/// Print the facts every site command shows.
pub(crate) fn print_site(site: &SiteInfo) {
    ui::kv("Domain", &site.domain);
    ui::kv("User", &site.username);
    ui::kv("PHP", &site.php_version.to_string());
    ui::kv("Document root", &site.document_root.display().to_string());
    ui::kv("Database", &site.database_name);
}
