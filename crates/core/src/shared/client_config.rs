use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::DEFAULT_REGION;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("missing provider credentials: set {0}")]
    MissingCredentials(&'static str),
}

/// Access key pair used to sign provider requests.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Construction-time settings for the collection client.
///
/// All fields are optional in the JSON file; environment variables fill the
/// gaps via [`ClientConfig::merge_env`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_region")]
    pub region: String,
    /// Overrides the regional endpoint, e.g. for a local stand-in service.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    #[serde(default)]
    pub session_token: Option<String>,
    /// Logs every raw provider response when set.
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            debug: false,
            timeout_secs: None,
        }
    }
}

impl ClientConfig {
    /// `<config_dir>/FaceCollection/config.json`, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("FaceCollection").join("config.json"))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Loads `path`, or the default location when `None`. A missing default
    /// file yields the default config; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => match Self::default_path() {
                Some(p) if p.exists() => Self::from_file(&p),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Overlays the standard AWS environment variables on this config.
    /// Set, non-empty variables win over values read from a file.
    pub fn merge_env(self) -> Self {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`merge_env`](Self::merge_env) with an explicit variable lookup.
    pub fn merge_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| var(key).filter(|v| !v.is_empty());

        if let Some(key) = non_empty("AWS_ACCESS_KEY_ID") {
            self.access_key_id = Some(key);
        }
        if let Some(secret) = non_empty("AWS_SECRET_ACCESS_KEY") {
            self.secret_access_key = Some(secret);
        }
        if let Some(token) = non_empty("AWS_SESSION_TOKEN") {
            self.session_token = Some(token);
        }
        if let Some(region) = non_empty("AWS_REGION").or_else(|| non_empty("AWS_DEFAULT_REGION")) {
            self.region = region;
        }
        self
    }

    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let access_key_id = self
            .access_key_id
            .clone()
            .ok_or(ConfigError::MissingCredentials("AWS_ACCESS_KEY_ID"))?;
        let secret_access_key = self
            .secret_access_key
            .clone()
            .ok_or(ConfigError::MissingCredentials("AWS_SECRET_ACCESS_KEY"))?;
        Ok(Credentials {
            access_key_id,
            secret_access_key,
            session_token: self.session_token.clone(),
        })
    }

    /// Provider endpoint: the override if present, else the regional host.
    pub fn endpoint_url(&self) -> String {
        match &self.endpoint {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://rekognition.{}.amazonaws.com", self.region),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_region_and_endpoint() {
        let config = ClientConfig::default();
        assert_eq!(config.region, "ap-northeast-1");
        assert_eq!(
            config.endpoint_url(),
            "https://rekognition.ap-northeast-1.amazonaws.com"
        );
        assert!(!config.debug);
        assert!(config.timeout().is_none());
    }

    #[test]
    fn test_endpoint_override_strips_trailing_slash() {
        let config = ClientConfig {
            endpoint: Some("http://localhost:4566/".to_string()),
            ..ClientConfig::default()
        };
        assert_eq!(config.endpoint_url(), "http://localhost:4566");
    }

    #[test]
    fn test_from_file_fills_missing_fields_with_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, r#"{"debug": true, "timeout_secs": 15}"#).unwrap();

        let config = ClientConfig::from_file(&path).unwrap();

        assert!(config.debug);
        assert_eq!(config.region, DEFAULT_REGION);
        assert_eq!(config.timeout(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_from_file_reports_parse_error_with_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, "{not json").unwrap();

        let err = ClientConfig::from_file(&path).unwrap_err();

        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.json"));
    }

    #[test]
    fn test_load_explicit_missing_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let err = ClientConfig::load(Some(&tmp.path().join("absent.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_merge_env_overrides_file_values() {
        let config = ClientConfig {
            access_key_id: Some("from-file".to_string()),
            session_token: Some("file-token".to_string()),
            region: "us-east-1".to_string(),
            ..ClientConfig::default()
        }
        .merge_vars(env(&[
            ("AWS_ACCESS_KEY_ID", "from-env"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
            ("AWS_DEFAULT_REGION", "eu-west-1"),
        ]));

        assert_eq!(config.access_key_id.as_deref(), Some("from-env"));
        assert_eq!(config.secret_access_key.as_deref(), Some("secret"));
        assert_eq!(config.session_token.as_deref(), Some("file-token"));
        assert_eq!(config.region, "eu-west-1");
    }

    #[test]
    fn test_merge_env_ignores_empty_variables() {
        let config = ClientConfig {
            access_key_id: Some("from-file".to_string()),
            region: "us-east-1".to_string(),
            ..ClientConfig::default()
        }
        .merge_vars(env(&[("AWS_ACCESS_KEY_ID", ""), ("AWS_REGION", "")]));

        assert_eq!(config.access_key_id.as_deref(), Some("from-file"));
        assert_eq!(config.region, "us-east-1");
    }

    #[test]
    fn test_merge_env_prefers_aws_region_over_default_region() {
        let config = ClientConfig::default().merge_vars(env(&[
            ("AWS_REGION", "us-west-2"),
            ("AWS_DEFAULT_REGION", "eu-west-1"),
        ]));
        assert_eq!(config.region, "us-west-2");
    }

    #[test]
    fn test_credentials_requires_both_keys() {
        let config = ClientConfig {
            access_key_id: Some("AKID".to_string()),
            ..ClientConfig::default()
        };
        let err = config.credentials().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingCredentials("AWS_SECRET_ACCESS_KEY")
        ));
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let creds = Credentials {
            access_key_id: "AKID".to_string(),
            secret_access_key: "very-secret".to_string(),
            session_token: Some("token".to_string()),
        };
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("AKID"));
        assert!(!rendered.contains("very-secret"));
        assert!(!rendered.contains("\"token\""));
    }
}
