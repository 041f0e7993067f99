//! Client configuration.

use std::path::{Path, PathBuf};

use push_dispatch_executor::ExecutorConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::ErrorPolicy;

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV: &str = "PUSH_DISPATCH_CONFIG";

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Push client configuration. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// What a failing handler does to the client loop.
    pub error_policy: ErrorPolicy,
    /// Heading shown above user notifications.
    pub notify_title: String,
    /// Remote execution settings.
    pub executor: ExecutorConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            error_policy: ErrorPolicy::default(),
            notify_title: "Message from server".to_string(),
            executor: ExecutorConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a JSON file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from the file named by `PUSH_DISPATCH_CONFIG`, or use defaults.
    ///
    /// # Errors
    /// Returns error if the variable is set and the file is unusable.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => {
                let path = PathBuf::from(path);
                tracing::debug!(path = %path.display(), "Loading client config");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use push_dispatch_executor::TrustMode;

    use super::*;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{name}-{}.json", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_partial_config() {
        let path = write_temp(
            "push-config",
            r#"{"error_policy":"abort","executor":{"trust":"disabled"}}"#,
        );
        let config = ClientConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.error_policy, ErrorPolicy::Abort);
        assert_eq!(config.executor.trust, TrustMode::Disabled);
        assert_eq!(config.notify_title, "Message from server");
    }

    #[test]
    fn test_load_reports_parse_error() {
        let path = write_temp("push-config-bad", "{ not json");
        let err = ClientConfig::load(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ClientConfig::load(Path::new("/nonexistent/push-dispatch.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
