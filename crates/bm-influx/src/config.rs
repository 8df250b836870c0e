//! Backend configuration and endpoint construction.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const REDACTED: &str = "[REDACTED]";

/// InfluxDB API generation to write to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendVersion {
    /// InfluxDB 1.8 `/write` API with database credentials.
    #[default]
    #[serde(alias = "v1.8")]
    V1,
    /// InfluxDB 2.x `/api/v2/write` API with token authorization.
    #[serde(alias = "v2.0")]
    V2,
}

impl BackendVersion {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
        }
    }
}

impl fmt::Display for BackendVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A field required by the selected backend version is empty.
    #[error("incomplete {version} configuration: {field} is required")]
    Missing {
        version: BackendVersion,
        field: &'static str,
    },
}

/// Settings for the metrics backend.
///
/// Read-only to the publisher. Credentials for the version that is not
/// selected are ignored.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfluxConfig {
    /// Master switch; when off nothing is sent and nothing is logged.
    pub enable_logging: bool,
    /// Include the OS username in every point.
    pub log_user: bool,
    pub version: BackendVersion,
    /// Base URL of the server, e.g. `http://localhost:8086`.
    pub url: String,

    // v1
    pub database: String,
    pub user: String,
    pub password: String,

    // v2
    pub token: String,
    pub organisation: String,
    pub bucket: String,
}

impl fmt::Debug for InfluxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfluxConfig")
            .field("enable_logging", &self.enable_logging)
            .field("log_user", &self.log_user)
            .field("version", &self.version)
            .field("url", &self.url)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &REDACTED)
            .field("token", &REDACTED)
            .field("organisation", &self.organisation)
            .field("bucket", &self.bucket)
            .finish()
    }
}

impl InfluxConfig {
    /// Validates the fields for the selected version and builds the write
    /// endpoint.
    pub fn endpoint(&self) -> Result<Endpoint, ConfigError> {
        match self.version {
            BackendVersion::V1 => {
                self.require(&[
                    ("url", &self.url),
                    ("database", &self.database),
                    ("user", &self.user),
                    ("password", &self.password),
                ])?;
                Ok(Endpoint {
                    url: self.v1_url(&self.password),
                    redacted_url: self.v1_url(REDACTED),
                    authorization: None,
                })
            }
            BackendVersion::V2 => {
                self.require(&[
                    ("url", &self.url),
                    ("token", &self.token),
                    ("organisation", &self.organisation),
                    ("bucket", &self.bucket),
                ])?;
                let url = format!(
                    "{}/api/v2/write?bucket={}&org={}&precision=s",
                    self.url, self.bucket, self.organisation
                );
                Ok(Endpoint {
                    redacted_url: url.clone(),
                    url,
                    authorization: Some(self.token.clone()),
                })
            }
        }
    }

    fn require(&self, fields: &[(&'static str, &String)]) -> Result<(), ConfigError> {
        match fields.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(ConfigError::Missing {
                version: self.version,
                field: *field,
            }),
            None => Ok(()),
        }
    }

    fn v1_url(&self, password: &str) -> String {
        format!(
            "{}/write?db={}&u={}&p={password}&precision=s",
            self.url, self.database, self.user
        )
    }
}

/// A validated write endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: String,
    redacted_url: String,
    authorization: Option<String>,
}

impl Endpoint {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The URL with any password replaced, safe for logs.
    pub fn redacted_url(&self) -> &str {
        &self.redacted_url
    }

    /// Value for the `Authorization` header (v2 only).
    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("url", &self.redacted_url)
            .field("authorization", &self.authorization.as_ref().map(|_| REDACTED))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v1() -> InfluxConfig {
        InfluxConfig {
            enable_logging: true,
            version: BackendVersion::V1,
            url: "http://influx:8086".to_string(),
            database: "metrics".to_string(),
            user: "editor".to_string(),
            password: "hunter2".to_string(),
            ..InfluxConfig::default()
        }
    }

    fn v2() -> InfluxConfig {
        InfluxConfig {
            enable_logging: true,
            version: BackendVersion::V2,
            url: "https://influx.example.com".to_string(),
            token: "Token abc123".to_string(),
            organisation: "studio".to_string(),
            bucket: "editor".to_string(),
            ..InfluxConfig::default()
        }
    }

    #[test]
    fn v1_endpoint_carries_credentials_in_query() {
        let endpoint = v1().endpoint().unwrap();
        assert_eq!(
            endpoint.url(),
            "http://influx:8086/write?db=metrics&u=editor&p=hunter2&precision=s"
        );
        assert_eq!(endpoint.authorization(), None);
    }

    #[test]
    fn v1_redacted_url_hides_password() {
        let endpoint = v1().endpoint().unwrap();
        assert_eq!(
            endpoint.redacted_url(),
            "http://influx:8086/write?db=metrics&u=editor&p=[REDACTED]&precision=s"
        );
        assert!(!format!("{endpoint:?}").contains("hunter2"));
    }

    #[test]
    fn v2_endpoint_uses_token_header() {
        let endpoint = v2().endpoint().unwrap();
        assert_eq!(
            endpoint.url(),
            "https://influx.example.com/api/v2/write?bucket=editor&org=studio&precision=s"
        );
        assert_eq!(endpoint.authorization(), Some("Token abc123"));
        assert!(!format!("{endpoint:?}").contains("abc123"));
    }

    #[test]
    fn v1_reports_first_missing_field() {
        let config = InfluxConfig {
            password: String::new(),
            ..v1()
        };
        assert_eq!(
            config.endpoint().unwrap_err(),
            ConfigError::Missing {
                version: BackendVersion::V1,
                field: "password"
            }
        );
    }

    #[test]
    fn v2_ignores_v1_fields() {
        let config = InfluxConfig {
            bucket: "  ".to_string(),
            database: "metrics".to_string(),
            user: "editor".to_string(),
            password: "hunter2".to_string(),
            ..v2()
        };
        let err = config.endpoint().unwrap_err();
        assert_eq!(err.to_string(), "incomplete v2 configuration: bucket is required");
    }

    #[test]
    fn missing_url_is_reported_for_both_versions() {
        for config in [v1(), v2()] {
            let config = InfluxConfig {
                url: String::new(),
                ..config
            };
            assert!(matches!(
                config.endpoint(),
                Err(ConfigError::Missing { field: "url", .. })
            ));
        }
    }

    #[test]
    fn debug_redacts_secrets() {
        let debug = format!("{:?}", InfluxConfig { token: "secret-token".to_string(), ..v1() });
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains(REDACTED));
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: InfluxConfig =
            serde_json::from_str(r#"{"enable_logging":true,"version":"v2","bucket":"b"}"#).unwrap();
        assert!(config.enable_logging);
        assert!(!config.log_user);
        assert_eq!(config.version, BackendVersion::V2);
        assert_eq!(config.bucket, "b");
        assert!(config.url.is_empty());
    }

    #[test]
    fn version_accepts_display_aliases() {
        let version: BackendVersion = serde_json::from_str(r#""v1.8""#).unwrap();
        assert_eq!(version, BackendVersion::V1);
        let version: BackendVersion = serde_json::from_str(r#""v2.0""#).unwrap();
        assert_eq!(version, BackendVersion::V2);
    }
}
