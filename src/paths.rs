//! Config file location for okpanel
//!
//! # Path Resolution Priority
//!
//! 1. `--config` flag
//! 2. `OKPANEL_CONFIG` environment variable
//! 3. `/etc/okpanel/config.toml`
//!
//! Flag and variable values get tilde and `$VAR` expansion.

use std::path::{Path, PathBuf};

/// Environment variable for config file override
pub const ENV_CONFIG: &str = "OKPANEL_CONFIG";

/// System-wide default config file
pub const DEFAULT_CONFIG_FILE: &str = "/etc/okpanel/config.toml";

/// Resolve the config file path.
pub fn config_file(flag: Option<&Path>) -> PathBuf {
    if let Some(path) = flag {
        let path = expand_path(&path.to_string_lossy());
        log::debug!("Using config file from --config: {}", path.display());
        return path;
    }

    if let Ok(value) = std::env::var(ENV_CONFIG) {
        let path = expand_path(&value);
        log::debug!("Using config file from {}: {}", ENV_CONFIG, path.display());
        return path;
    }

    PathBuf::from(DEFAULT_CONFIG_FILE)
}

/// Expand `~` and environment variables; unknown variables are left as is.
pub fn expand_path(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(e) => {
            log::debug!("Could not expand {path}: {e}");
            PathBuf::from(shellexpand::tilde(path).as_ref())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_wins() {
        let path = config_file(Some(Path::new("/srv/okpanel.toml")));
        assert_eq!(path, PathBuf::from("/srv/okpanel.toml"));
    }

    #[test]
    fn test_env_override_and_default() {
        // SAFETY: this is the only test touching OKPANEL_CONFIG
        unsafe { std::env::set_var(ENV_CONFIG, "/opt/okpanel/config.toml") };
        assert_eq!(config_file(None), PathBuf::from("/opt/okpanel/config.toml"));

        // SAFETY: see above
        unsafe { std::env::remove_var(ENV_CONFIG) };
        assert_eq!(config_file(None), PathBuf::from(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn test_expand_env_var() {
        // SAFETY: variable name is unique to this test
        unsafe { std::env::set_var("OKPANEL_TEST_ROOT", "/srv/panel") };
        assert_eq!(
            expand_path("$OKPANEL_TEST_ROOT/config.toml"),
            PathBuf::from("/srv/panel/config.toml")
        );
    }

    #[test]
    fn test_expand_unknown_var_kept() {
        assert_eq!(
            expand_path("$OKPANEL_SURELY_UNSET/x"),
            PathBuf::from("$OKPANEL_SURELY_UNSET/x")
        );
    }

    #[test]
    fn test_expand_tilde() {
        if let Ok(home) = std::env::var("HOME") {
            assert_eq!(expand_path("~/okpanel.toml"), Path::new(&home).join("okpanel.toml"));
        }
    }
}
