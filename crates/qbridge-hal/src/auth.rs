//! Credential discovery for the remote provider.
//!
//! Tokens are looked up in this order, on every call:
//!
//! 1. environment variables (`QBRIDGE_IBM_TOKEN`, then `IBM_QUANTUM_TOKEN`)
//! 2. the account file `~/.qiskit/config.json`, key `ibm_token`
//!
//! Nothing is cached, so an account file saved while the process runs is
//! picked up by the next lookup.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HalError, HalResult};

/// Environment variables consulted for a token, in priority order.
pub const TOKEN_ENV_VARS: &[&str] = &["QBRIDGE_IBM_TOKEN", "IBM_QUANTUM_TOKEN"];

/// Location of the account file under the home directory.
pub fn default_account_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".qiskit").join("config.json"))
}

/// Mask a token for display: first and last five characters, or `***`.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() > 10 {
        let head: String = chars[..5].iter().collect();
        let tail: String = chars[chars.len() - 5..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "***".to_string()
    }
}

/// Where a token came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    Environment(String),
    /// Set explicitly, e.g. from the server configuration.
    Configured,
    AccountFile(PathBuf),
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenSource::Environment(var) => write!(f, "environment variable {var}"),
            TokenSource::Configured => f.write_str("server configuration"),
            TokenSource::AccountFile(path) => write!(f, "config file {}", path.display()),
        }
    }
}

/// A resolved API token.
#[derive(Clone)]
pub struct Credentials {
    token: String,
    source: TokenSource,
}

impl Credentials {
    pub fn new(token: impl Into<String>, source: TokenSource) -> Self {
        Self {
            token: token.into(),
            source,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn source(&self) -> &TokenSource {
        &self.source
    }

    pub fn masked(&self) -> String {
        mask_token(&self.token)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"[REDACTED]")
            .field("source", &self.source)
            .finish()
    }
}

#[derive(Deserialize)]
struct AccountFile {
    #[serde(default)]
    ibm_token: Option<String>,
}

/// Outcome of a token check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenState {
    Success,
    Warning,
    Error,
}

/// Token check result: `{ "status": ..., "message": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStatus {
    pub status: TokenState,
    pub message: String,
}

impl TokenStatus {
    fn new(status: TokenState, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TokenState::Success
    }
}

/// Resolves credentials from the environment, an explicit token and the
/// account file, in that order.
#[derive(Clone)]
pub struct CredentialStore {
    account_path: Option<PathBuf>,
    env_vars: Vec<String>,
    configured: Option<String>,
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("account_path", &self.account_path)
            .field("env_vars", &self.env_vars)
            .field("configured", &self.configured.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new(default_account_path())
    }
}

impl CredentialStore {
    /// Store reading the given account file and the default variables.
    pub fn new(account_path: Option<PathBuf>) -> Self {
        Self {
            account_path,
            env_vars: TOKEN_ENV_VARS.iter().map(|v| (*v).to_string()).collect(),
            configured: None,
        }
    }

    /// Use `token` when no environment variable is set.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.configured = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Replace the environment variables consulted.
    pub fn with_env_vars<I, S>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.env_vars = vars.into_iter().map(Into::into).collect();
        self
    }

    pub fn account_path(&self) -> Option<&Path> {
        self.account_path.as_deref()
    }

    /// Look up a token. `Ok(None)` means no token is configured anywhere.
    pub fn resolve(&self) -> HalResult<Option<Credentials>> {
        for var in &self.env_vars {
            if let Ok(value) = std::env::var(var) {
                let value = value.trim();
                if !value.is_empty() {
                    tracing::debug!(source = %var, "token found in environment");
                    return Ok(Some(Credentials::new(
                        value,
                        TokenSource::Environment(var.clone()),
                    )));
                }
            }
        }

        if let Some(token) = &self.configured {
            return Ok(Some(Credentials::new(token.trim(), TokenSource::Configured)));
        }

        let Some(path) = self.account_path.as_deref() else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| HalError::Configuration(format!("{}: {e}", path.display())))?;
        let file: AccountFile = serde_json::from_str(&contents)?;

        Ok(file
            .ibm_token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .map(|t| Credentials::new(t, TokenSource::AccountFile(path.to_path_buf()))))
    }

    /// Like [`resolve`](Self::resolve), but a missing token is an error.
    pub fn require(&self) -> HalResult<Credentials> {
        self.resolve()?.ok_or_else(|| {
            HalError::AuthenticationFailed(format!(
                "No IBM Quantum token found. Set {} or create {}",
                self.env_vars.join(" / "),
                self.display_path()
            ))
        })
    }

    /// Check the configured token and describe the result.
    pub fn load_token(&self) -> TokenStatus {
        match self.resolve() {
            Ok(Some(creds)) => TokenStatus::new(
                TokenState::Success,
                format!(
                    "IBM Quantum token loaded from {} ({}).",
                    creds.source(),
                    creds.masked()
                ),
            ),
            Ok(None) if self.account_path.as_deref().is_some_and(Path::exists) => {
                TokenStatus::new(
                    TokenState::Warning,
                    "Config file exists but doesn't contain ibm_token.",
                )
            }
            Ok(None) => TokenStatus::new(
                TokenState::Warning,
                format!(
                    "No IBM Quantum token found. Please create a config file at {}",
                    self.display_path()
                ),
            ),
            Err(e) => TokenStatus::new(
                TokenState::Error,
                format!("Error loading token from config file: {e}"),
            ),
        }
    }

    fn display_path(&self) -> String {
        self.account_path
            .as_deref()
            .map_or_else(|| "~/.qiskit/config.json".to_string(), |p| p.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_for(path: PathBuf) -> CredentialStore {
        CredentialStore::new(Some(path)).with_env_vars(Vec::<String>::new())
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("abcdefghijklmnop"), "abcde...lmnop");
        assert_eq!(mask_token("short"), "***");
        assert_eq!(mask_token("exactly10!"), "***");
    }

    #[test]
    fn test_token_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"ibm_token": "0123456789abcdef"}"#).unwrap();

        let store = store_for(path.clone());
        let creds = store.resolve().unwrap().unwrap();
        assert_eq!(creds.token(), "0123456789abcdef");
        assert_eq!(creds.source(), &TokenSource::AccountFile(path));

        let status = store.load_token();
        assert_eq!(status.status, TokenState::Success);
        assert!(status.message.contains("01234...bcdef"));
        assert!(!status.message.contains("0123456789abcdef"));
    }

    #[test]
    fn test_file_without_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"other": 1}"#).unwrap();

        let status = store_for(path).load_token();
        assert_eq!(status.status, TokenState::Warning);
        assert_eq!(status.message, "Config file exists but doesn't contain ibm_token.");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");

        let store = store_for(path.clone());
        assert!(store.resolve().unwrap().is_none());
        let status = store.load_token();
        assert_eq!(status.status, TokenState::Warning);
        assert!(status.message.ends_with(&path.display().to_string()));
        assert!(store.require().is_err());
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();

        let status = store_for(path).load_token();
        assert_eq!(status.status, TokenState::Error);
        assert!(status.message.starts_with("Error loading token from config file:"));
    }

    #[test]
    fn test_env_takes_priority() {
        let var = "QBRIDGE_HAL_TEST_TOKEN_PRIORITY";
        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::set_var(var, "envtoken-0123456789") };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"ibm_token": "filetoken-0123456789"}"#).unwrap();

        let store = CredentialStore::new(Some(path)).with_env_vars([var]);
        let creds = store.resolve().unwrap().unwrap();
        assert_eq!(creds.token(), "envtoken-0123456789");
        assert_eq!(creds.source(), &TokenSource::Environment(var.to_string()));

        unsafe { std::env::remove_var(var) };
    }

    #[test]
    fn test_configured_token_beats_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"ibm_token": "filetoken-0123456789"}"#).unwrap();

        let store = store_for(path).with_token(Some("configured-0123456789".into()));
        let creds = store.resolve().unwrap().unwrap();
        assert_eq!(creds.token(), "configured-0123456789");
        assert_eq!(creds.source(), &TokenSource::Configured);
        assert!(!format!("{store:?}").contains("configured-0123456789"));

        let blank = store_for(dir.path().join("absent.json")).with_token(Some("  ".into()));
        assert!(blank.resolve().unwrap().is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let creds = Credentials::new("supersecret-token", TokenSource::Environment("X".into()));
        let debug = format!("{creds:?}");
        assert!(!debug.contains("supersecret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let status = TokenStatus::new(TokenState::Warning, "m");
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["status"], "warning");
    }
}
