//! Server configuration.
//!
//! Sources, highest precedence first:
//! 1. `QBRIDGE_*` environment variables (a `.env` file is loaded first)
//! 2. YAML configuration file
//! 3. Defaults

use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use qbridge_core::{DEFAULT_BACKEND, DEFAULT_MAX_WIRES, DEFAULT_REMOTE_TIMEOUT};

/// Complete server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    /// Manifest served by `GET /schema`.
    pub schema_path: PathBuf,
    pub logging: LoggingConfig,
    pub execution: ExecutionConfig,
    pub backends: BackendsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_address")]
    pub address: String,

    /// Allowed CORS origins. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// "trace", "debug", "info", "warn" or "error". `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// "console" or "json".
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_remote_timeout")]
    pub remote_timeout_secs: u64,

    /// Backend used when a call names none.
    #[serde(default = "default_backend")]
    pub default_backend: String,

    /// Cap on declared qubits, and separately on classical bits, per circuit.
    #[serde(default = "default_max_wires")]
    pub max_wires: u32,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct BackendsConfig {
    #[serde(default = "default_true")]
    pub simulator_enabled: bool,

    #[serde(default = "default_max_qubits")]
    pub simulator_max_qubits: u32,

    #[serde(default = "default_true")]
    pub ibm_enabled: bool,

    #[serde(default = "default_ibm_endpoint")]
    pub ibm_endpoint: String,

    /// Account file; `~/.qiskit/config.json` when unset.
    #[serde(default)]
    pub credentials_path: Option<PathBuf>,

    /// Token used when no token environment variable is set.
    #[serde(default)]
    pub ibm_token: Option<String>,
}

impl fmt::Debug for BackendsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendsConfig")
            .field("simulator_enabled", &self.simulator_enabled)
            .field("simulator_max_qubits", &self.simulator_max_qubits)
            .field("ibm_enabled", &self.ibm_enabled)
            .field("ibm_endpoint", &self.ibm_endpoint)
            .field("credentials_path", &self.credentials_path)
            .field("ibm_token", &self.ibm_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

fn default_http_address() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_schema_path() -> PathBuf {
    PathBuf::from("schema/mcp_definition.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "console".to_string()
}

fn default_remote_timeout() -> u64 {
    DEFAULT_REMOTE_TIMEOUT.as_secs()
}

fn default_backend() -> String {
    DEFAULT_BACKEND.to_string()
}

fn default_max_wires() -> u32 {
    DEFAULT_MAX_WIRES
}

fn default_true() -> bool {
    true
}

fn default_max_qubits() -> u32 {
    24
}

fn default_ibm_endpoint() -> String {
    qbridge_adapter_ibm::DEFAULT_ENDPOINT.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            schema_path: default_schema_path(),
            logging: LoggingConfig::default(),
            execution: ExecutionConfig::default(),
            backends: BackendsConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: default_http_address(),
            cors_origins: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            remote_timeout_secs: default_remote_timeout(),
            default_backend: default_backend(),
            max_wires: default_max_wires(),
        }
    }
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            simulator_enabled: true,
            simulator_max_qubits: default_max_qubits(),
            ibm_enabled: true,
            ibm_endpoint: default_ibm_endpoint(),
            credentials_path: None,
            ibm_token: None,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file, without environment overrides.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {e}", path.display())))?;
        serde_yaml_ng::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load `.env`, then the optional file, then apply environment overrides.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.merge_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup`. Only keys that are present change
    /// anything.
    pub fn merge_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("QBRIDGE_HTTP_ADDRESS") {
            self.http.address = v;
        }
        if let Some(v) = lookup("QBRIDGE_CORS_ORIGINS") {
            self.http.cors_origins = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(v) = lookup("QBRIDGE_SCHEMA_PATH") {
            self.schema_path = PathBuf::from(v);
        }

        if let Some(v) = lookup("QBRIDGE_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = lookup("QBRIDGE_LOG_FORMAT") {
            self.logging.format = v;
        }

        if let Some(v) = lookup("QBRIDGE_REMOTE_TIMEOUT") {
            self.execution.remote_timeout_secs = parse_var("QBRIDGE_REMOTE_TIMEOUT", &v)?;
        }
        if let Some(v) = lookup("QBRIDGE_DEFAULT_BACKEND") {
            self.execution.default_backend = v;
        }
        if let Some(v) = lookup("QBRIDGE_MAX_WIRES") {
            self.execution.max_wires = parse_var("QBRIDGE_MAX_WIRES", &v)?;
        }

        if let Some(v) = lookup("QBRIDGE_SIMULATOR_ENABLED") {
            self.backends.simulator_enabled = parse_var("QBRIDGE_SIMULATOR_ENABLED", &v)?;
        }
        if let Some(v) = lookup("QBRIDGE_SIMULATOR_MAX_QUBITS") {
            self.backends.simulator_max_qubits = parse_var("QBRIDGE_SIMULATOR_MAX_QUBITS", &v)?;
        }
        if let Some(v) = lookup("QBRIDGE_IBM_ENABLED") {
            self.backends.ibm_enabled = parse_var("QBRIDGE_IBM_ENABLED", &v)?;
        }
        if let Some(v) = lookup("QBRIDGE_IBM_ENDPOINT") {
            self.backends.ibm_endpoint = v;
        }
        if let Some(v) = lookup("QBRIDGE_CREDENTIALS_PATH") {
            self.backends.credentials_path = Some(PathBuf::from(v));
        }

        Ok(self)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.http_address()?;

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level: {other}"
                )));
            }
        }

        match self.logging.format.as_str() {
            "console" | "json" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format: {other}"
                )));
            }
        }

        if self.execution.remote_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "remote_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.execution.max_wires == 0 {
            return Err(ConfigError::ValidationError(
                "max_wires must be greater than 0".to_string(),
            ));
        }
        if self.execution.default_backend.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "default_backend must not be empty".to_string(),
            ));
        }
        if !(1..=30).contains(&self.backends.simulator_max_qubits) {
            return Err(ConfigError::ValidationError(format!(
                "simulator_max_qubits must be between 1 and 30, got {}",
                self.backends.simulator_max_qubits
            )));
        }

        Ok(())
    }

    /// Get the parsed HTTP bind address.
    pub fn http_address(&self) -> Result<SocketAddr, ConfigError> {
        self.http.address.parse().map_err(|_| {
            ConfigError::ValidationError(format!("Invalid HTTP address: {}", self.http.address))
        })
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::ValidationError(format!("Invalid value for {key}: {value}")))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.http.address, "127.0.0.1:8000");
        assert_eq!(config.execution.default_backend, "aer_simulator");
        assert_eq!(config.execution.remote_timeout_secs, 300);
        assert!(config.backends.simulator_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_fills_missing_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qbridge.yaml");
        std::fs::write(
            &path,
            "http:\n  address: 0.0.0.0:9000\nbackends:\n  ibm_enabled: false\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.http.address, "0.0.0.0:9000");
        assert!(!config.backends.ibm_enabled);
        assert!(config.backends.simulator_enabled);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.schema_path, PathBuf::from("schema/mcp_definition.json"));
    }

    #[test]
    fn test_env_overrides_file_values() {
        let config = Config::default()
            .merge_env(lookup(&[
                ("QBRIDGE_HTTP_ADDRESS", "0.0.0.0:8080"),
                ("QBRIDGE_CORS_ORIGINS", "http://a.test, http://b.test"),
                ("QBRIDGE_REMOTE_TIMEOUT", "30"),
                ("QBRIDGE_IBM_ENABLED", "false"),
                ("QBRIDGE_MAX_WIRES", "64"),
            ]))
            .unwrap();
        assert_eq!(config.http.address, "0.0.0.0:8080");
        assert_eq!(config.http.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.execution.remote_timeout_secs, 30);
        assert_eq!(config.execution.max_wires, 64);
        assert!(!config.backends.ibm_enabled);
    }

    #[test]
    fn test_bad_env_value_is_an_error() {
        let err = Config::default()
            .merge_env(lookup(&[("QBRIDGE_SIMULATOR_ENABLED", "sometimes")]))
            .unwrap_err();
        assert!(err.to_string().contains("QBRIDGE_SIMULATOR_ENABLED"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.logging.level = "loud".into();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.http.address = "not an address".into();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.execution.remote_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.execution.max_wires = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let mut config = Config::default();
        config.backends.ibm_token = Some("very-secret-token".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("very-secret-token"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
