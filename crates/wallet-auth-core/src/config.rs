/*
[INPUT]:  YAML configuration file and WALLET_AUTH_* environment variables
[OUTPUT]: Validated bridge configuration and session timings
[POS]:    Configuration layer - boot-time settings
[UPDATE]: When adding new configuration options
*/

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};
use crate::origin::OriginPolicy;
use crate::types::Deployment;

/// Prefix of environment variables read by [`BridgeConfig::load`]
pub const ENV_PREFIX: &str = "WALLET_AUTH";

/// Top-level configuration for the auth page
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BridgeConfig {
    /// Display name embedded in the challenge message
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// Comma-separated origins, or `*`
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: String,
    #[serde(default)]
    pub deployment: Deployment,
    /// Host part appended when `callback` names a bare URL scheme
    #[serde(default = "default_app_scheme")]
    pub app_scheme: String,
    /// Injected-provider poll period
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Injected-provider poll bound
    #[serde(default = "default_poll_max_attempts")]
    pub poll_max_attempts: u32,
    /// Pause between reaching success and delivering the result
    #[serde(default = "default_success_delay_ms")]
    pub success_delay_ms: u64,
    /// localStorage key for the cached return URL
    #[serde(default = "default_return_url_storage_key")]
    pub return_url_storage_key: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            allowed_origins: default_allowed_origins(),
            deployment: Deployment::default(),
            app_scheme: default_app_scheme(),
            poll_interval_ms: default_poll_interval_ms(),
            poll_max_attempts: default_poll_max_attempts(),
            success_delay_ms: default_success_delay_ms(),
            return_url_storage_key: default_return_url_storage_key(),
        }
    }
}

fn default_app_name() -> String {
    "Wallet Auth Service".to_string()
}

fn default_allowed_origins() -> String {
    "*".to_string()
}

fn default_app_scheme() -> String {
    "wallet-auth".to_string()
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_poll_max_attempts() -> u32 {
    10
}

fn default_success_delay_ms() -> u64 {
    1500
}

fn default_return_url_storage_key() -> String {
    "wallet_auth_return_url".to_string()
}

impl BridgeConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| BridgeError::Config(format!("read {}: {e}", path.as_ref().display())))?;
        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| BridgeError::Config(format!("parse {}: {e}", path.as_ref().display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, overlaid by an optional YAML file, overlaid by `WALLET_AUTH_*` variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Yaml)
                    .required(true),
            );
        }
        let config: Self = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .and_then(|raw| raw.try_deserialize())
            .map_err(|e| BridgeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.app_name.trim().is_empty() {
            return Err(BridgeError::Config("app_name cannot be empty".to_string()));
        }
        if self.app_scheme.trim().is_empty() || self.app_scheme.contains(['/', '?', '#']) {
            return Err(BridgeError::Config(format!(
                "app_scheme must be a bare host name, got {:?}",
                self.app_scheme
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(BridgeError::Config("poll_interval_ms must be positive".to_string()));
        }
        if self.poll_max_attempts == 0 {
            return Err(BridgeError::Config("poll_max_attempts must be positive".to_string()));
        }
        if self.return_url_storage_key.trim().is_empty() {
            return Err(BridgeError::Config(
                "return_url_storage_key cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn origin_policy(&self) -> OriginPolicy {
        OriginPolicy::parse(&self.allowed_origins)
    }

    pub fn timings(&self) -> SessionTimings {
        SessionTimings {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            poll_max_attempts: self.poll_max_attempts,
            success_delay: Duration::from_millis(self.success_delay_ms),
        }
    }
}

/// Timer settings owned by the session machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimings {
    pub poll_interval: Duration,
    pub poll_max_attempts: u32,
    pub success_delay: Duration,
}

impl Default for SessionTimings {
    fn default() -> Self {
        BridgeConfig::default().timings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use uuid::Uuid;

    fn temp_file(content: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("wallet-auth-test-{}.yaml", Uuid::new_v4()));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.app_name, "Wallet Auth Service");
        assert!(config.origin_policy().is_wildcard());
        let timings = config.timings();
        assert_eq!(timings.poll_interval, Duration::from_millis(500));
        assert_eq!(timings.poll_max_attempts, 10);
        assert_eq!(timings.success_delay, Duration::from_millis(1500));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_partial() {
        let path = temp_file(
            "app_name: Demo\nallowed_origins: \"https://a.example, https://b.example\"\ndeployment: production\n",
        );
        let config = BridgeConfig::from_file(&path).unwrap();
        assert_eq!(config.app_name, "Demo");
        assert_eq!(config.deployment, Deployment::Production);
        assert_eq!(config.origin_policy().target_origin(), "https://a.example");
        assert_eq!(config.poll_max_attempts, 10);
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_load_yaml_via_config_crate() {
        let path = temp_file("app_name: Layered\npoll_interval_ms: 250\n");
        let config = BridgeConfig::load(Some(&path)).unwrap();
        assert_eq!(config.app_name, "Layered");
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.success_delay_ms, 1500);
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_load_env_overrides_yaml() {
        let path = temp_file("poll_max_attempts: 7\nreturn_url_storage_key: from_yaml\n");
        // keys no other test asserts on; tests share the process environment
        unsafe {
            std::env::set_var("WALLET_AUTH_POLL_MAX_ATTEMPTS", "3");
            std::env::set_var("WALLET_AUTH_RETURN_URL_STORAGE_KEY", "from_env");
        }
        let loaded = BridgeConfig::load(Some(&path));
        unsafe {
            std::env::remove_var("WALLET_AUTH_POLL_MAX_ATTEMPTS");
            std::env::remove_var("WALLET_AUTH_RETURN_URL_STORAGE_KEY");
        }
        fs::remove_file(path).unwrap();

        let config = loaded.unwrap();
        assert_eq!(config.poll_max_attempts, 3);
        assert_eq!(config.return_url_storage_key, "from_env");
        assert_eq!(config.timings().poll_max_attempts, 3);
    }

    #[test]
    fn test_validate_rejects_zero_poll() {
        let config = BridgeConfig {
            poll_max_attempts: 0,
            ..BridgeConfig::default()
        };
        assert!(matches!(config.validate(), Err(BridgeError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_app_scheme_with_path() {
        let config = BridgeConfig {
            app_scheme: "wallet-auth/done".to_string(),
            ..BridgeConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_missing() {
        let err = BridgeConfig::from_file("/nonexistent/wallet-auth.yaml").unwrap_err();
        assert!(matches!(err, BridgeError::Config(_)));
    }
}
