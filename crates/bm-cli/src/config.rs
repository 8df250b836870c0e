//! Configuration loading and management.

use std::path::{Path, PathBuf};

use bm_influx::InfluxConfig;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Metrics backend settings.
    pub influx: InfluxConfig,
    /// Values for host metadata that cannot be detected.
    pub host: HostOverrides,
}

/// Host metadata supplied by the user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HostOverrides {
    /// Project name; defaults to the current directory name.
    pub project_name: Option<String>,
    pub gpu_model: Option<String>,
    /// Version of the host application.
    pub host_version: Option<String>,
    /// Username; defaults to `$USER`.
    pub username: Option<String>,
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (BM_INFLUX__URL, ...)
        figment = figment.merge(Env::prefixed("BM_").split("__"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for bm.
///
/// On Linux: `~/.config/bm`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("bm"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use bm_influx::BackendVersion;

    use super::*;

    #[test]
    fn test_dirs_config_path_ends_with_bm() {
        if let Some(path) = dirs_config_path() {
            assert_eq!(path.file_name().unwrap(), "bm");
        }
    }

    #[test]
    fn test_default_config_disables_logging() {
        let config = Config::default();
        assert!(!config.influx.enable_logging);
        assert!(!config.influx.log_user);
        assert_eq!(config.influx.version, BackendVersion::V1);
        assert!(config.host.project_name.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[influx]
enable_logging = true
version = "v2"
url = "http://localhost:8086"
token = "secret"
organisation = "studio"
bucket = "editor"

[host]
project_name = "Shooter Game"
"#
        )
        .unwrap();
        file.flush().unwrap();

        let config = Config::load_from(Some(file.path())).unwrap();
        assert!(config.influx.enable_logging);
        assert_eq!(config.influx.version, BackendVersion::V2);
        assert_eq!(config.influx.bucket, "editor");
        assert_eq!(config.host.project_name.as_deref(), Some("Shooter Game"));
        assert!(config.influx.endpoint().is_ok());
    }

    #[test]
    fn test_load_rejects_unknown_version() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[influx]\nversion = \"v3\"").unwrap();
        file.flush().unwrap();

        assert!(Config::load_from(Some(file.path())).is_err());
    }
}
