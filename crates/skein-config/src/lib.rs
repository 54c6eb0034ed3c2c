//! Configuration management for skein.
//!
//! Parses `skein.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `fedi.instance`
//! - `fedi.acct`
//! - `fedi.token`
//! - `hn.search_endpoint`
//! - `hn.item_endpoint`

mod expand;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the federated instance to browse.
    pub instance: Option<String>,
    /// Override the per-request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "skein.toml";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fetch adapter configuration.
    pub fetch: FetchConfig,
    /// Federated instance configuration.
    /// When present, `instance` is required.
    pub fedi: Option<FediConfig>,
    /// Hacker News endpoint overrides.
    pub hn: HnConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Fetch adapter configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

/// Federated instance configuration.
///
/// `acct` and `token` are optional as a pair: with both set, requests to
/// the home instance are authenticated; with neither, browsing is
/// anonymous.
#[derive(Clone, Deserialize)]
pub struct FediConfig {
    /// Home instance, as a bare hostname (no scheme).
    pub instance: String,
    /// Account name on the home instance, without a leading `@`.
    #[serde(default)]
    pub acct: Option<String>,
    /// Bearer token for the home instance.
    #[serde(default)]
    pub token: Option<String>,
}

impl FediConfig {
    /// Validate that all set fields are properly formed.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if `instance` is empty or not a
    /// bare hostname, or if only one of `acct`/`token` is set.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.instance, "fedi.instance")?;
        require_bare_host(&self.instance, "fedi.instance")?;
        match (&self.acct, &self.token) {
            (Some(acct), Some(token)) => {
                require_non_empty(acct, "fedi.acct")?;
                require_non_empty(token, "fedi.token")?;
            }
            (None, None) => {}
            _ => {
                return Err(ConfigError::Validation(
                    "fedi.acct and fedi.token must be set together".to_owned(),
                ));
            }
        }
        Ok(())
    }

    /// True when both `acct` and `token` are configured.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.acct.is_some() && self.token.is_some()
    }
}

// The token never appears in logs or error output.
impl fmt::Debug for FediConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FediConfig")
            .field("instance", &self.instance)
            .field("acct", &self.acct)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Hacker News endpoint overrides.
///
/// Unset fields fall back to the public endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HnConfig {
    /// Search index base URL.
    pub search_endpoint: Option<String>,
    /// Official item API base URL.
    pub item_endpoint: Option<String>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`fedi.token`").
        field: String,
        /// Error message (e.g., "${`SKEIN_FEDI_TOKEN`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

/// Require a host field to be a bare hostname, without scheme or path.
fn require_bare_host(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.contains("://") || value.contains('/') {
        return Err(ConfigError::Validation(format!(
            "{field} must be a bare hostname such as mastodon.social"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `skein.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading, allowing CLI arguments to
    /// take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(instance) = &settings.instance {
            match &mut self.fedi {
                Some(fedi) => fedi.instance.clone_from(instance),
                // An instance given on the command line alone means
                // anonymous browsing of that host.
                None => {
                    self.fedi = Some(FediConfig {
                        instance: instance.clone(),
                        acct: None,
                        token: None,
                    });
                }
            }
        }
        if let Some(timeout_secs) = settings.timeout_secs {
            self.fetch.timeout_secs = timeout_secs;
        }
    }

    /// Get validated federated instance configuration.
    ///
    /// Returns the fedi config if the `[fedi]` section is present and
    /// valid. Use this instead of accessing the `fedi` field directly
    /// when the command requires a home instance.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the section is missing or invalid.
    pub fn require_fedi(&self) -> Result<&FediConfig, ConfigError> {
        let fedi = self.fedi.as_ref().ok_or_else(|| {
            ConfigError::Validation(
                "[fedi] section required in config (or pass --instance)".into(),
            )
        })?;
        fedi.validate()?;
        Ok(fedi)
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;
        config.config_path = Some(path.to_path_buf());

        // Validate configuration after loading and expansion
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Checks that all set fields contain valid values. Called
    /// automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "fetch.timeout_secs cannot be 0".to_owned(),
            ));
        }
        if let Some(fedi) = &self.fedi {
            fedi.validate()?;
        }
        self.validate_hn()?;
        Ok(())
    }

    /// Validate Hacker News endpoint overrides.
    fn validate_hn(&self) -> Result<(), ConfigError> {
        if let Some(ref url) = self.hn.search_endpoint {
            require_non_empty(url, "hn.search_endpoint")?;
            require_http_url(url, "hn.search_endpoint")?;
        }
        if let Some(ref url) = self.hn.item_endpoint {
            require_non_empty(url, "hn.item_endpoint")?;
            require_http_url(url, "hn.item_endpoint")?;
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref mut fedi) = self.fedi {
            fedi.instance = expand::expand_env(&fedi.instance, "fedi.instance")?;
            if let Some(ref acct) = fedi.acct {
                fedi.acct = Some(expand::expand_env(acct, "fedi.acct")?);
            }
            if let Some(ref token) = fedi.token {
                fedi.token = Some(expand::expand_env(token, "fedi.token")?);
            }
        }
        if let Some(ref url) = self.hn.search_endpoint {
            self.hn.search_endpoint = Some(expand::expand_env(url, "hn.search_endpoint")?);
        }
        if let Some(ref url) = self.hn.item_endpoint {
            self.hn.item_endpoint = Some(expand::expand_env(url, "hn.item_endpoint")?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.fetch.timeout_secs, 30);
        assert!(config.fedi.is_none());
        assert!(config.hn.search_endpoint.is_none());
        assert!(config.hn.item_endpoint.is_none());
        assert!(config.config_path.is_none());
    }

    #[test]
    fn test_parse_minimal_config() {
        let toml = "";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.fetch.timeout_secs, 30);
        assert!(config.fedi.is_none());
    }

    #[test]
    fn test_parse_fetch_config() {
        let toml = r#"
[fetch]
timeout_secs = 10
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.fetch.timeout_secs, 10);
    }

    #[test]
    fn test_parse_fedi_config() {
        let toml = r#"
[fedi]
instance = "fosstodon.org"
acct = "ada"
token = "token123"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let fedi = config.fedi.unwrap();
        assert_eq!(fedi.instance, "fosstodon.org");
        assert_eq!(fedi.acct.as_deref(), Some("ada"));
        assert_eq!(fedi.token.as_deref(), Some("token123"));
        assert!(fedi.has_credentials());
    }

    #[test]
    fn test_parse_fedi_config_anonymous() {
        let toml = r#"
[fedi]
instance = "fosstodon.org"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let fedi = config.fedi.unwrap();
        fedi.validate().unwrap();
        assert!(!fedi.has_credentials());
    }

    #[test]
    fn test_parse_hn_config() {
        let toml = r#"
[hn]
search_endpoint = "http://localhost:8080/api/v1"
item_endpoint = "http://localhost:8081/v0"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        config.validate().unwrap();
        assert_eq!(
            config.hn.search_endpoint.as_deref(),
            Some("http://localhost:8080/api/v1")
        );
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let toml = r#"
[fetch]
timeout_secs = 0
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_validate_rejects_instance_with_scheme() {
        let toml = r#"
[fedi]
instance = "https://fosstodon.org"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("bare hostname"));
    }

    #[test]
    fn test_validate_rejects_token_without_acct() {
        let toml = r#"
[fedi]
instance = "fosstodon.org"
token = "token123"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("set together"));
    }

    #[test]
    fn test_validate_rejects_non_http_endpoint() {
        let toml = r#"
[hn]
search_endpoint = "localhost:8080"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("hn.search_endpoint"));
    }

    #[test]
    fn test_require_fedi_without_section() {
        let config = Config::default();
        let err = config.require_fedi().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("[fedi]"));
    }

    #[test]
    fn test_apply_cli_settings_overrides_instance() {
        let toml = r#"
[fedi]
instance = "fosstodon.org"
acct = "ada"
token = "token123"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        let overrides = CliSettings {
            instance: Some("hachyderm.io".to_owned()),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        let fedi = config.fedi.unwrap();
        assert_eq!(fedi.instance, "hachyderm.io");
        assert_eq!(fedi.acct.as_deref(), Some("ada")); // Unchanged
    }

    #[test]
    fn test_apply_cli_settings_creates_anonymous_section() {
        let mut config = Config::default();
        let overrides = CliSettings {
            instance: Some("hachyderm.io".to_owned()),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        let fedi = config.fedi.unwrap();
        assert_eq!(fedi.instance, "hachyderm.io");
        assert!(!fedi.has_credentials());
    }

    #[test]
    fn test_apply_cli_settings_timeout() {
        let mut config = Config::default();
        let overrides = CliSettings {
            timeout_secs: Some(5),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.fetch.timeout_secs, 5);
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default();

        config.apply_cli_settings(&CliSettings::default());

        assert_eq!(config.fetch.timeout_secs, 30);
        assert!(config.fedi.is_none());
    }

    #[test]
    fn test_expand_env_vars_token() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("TEST_SKEIN_TOKEN", "from-env");
        }

        let toml = r#"
[fedi]
instance = "fosstodon.org"
acct = "ada"
token = "${TEST_SKEIN_TOKEN}"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.expand_env_vars().unwrap();

        assert_eq!(config.fedi.unwrap().token.as_deref(), Some("from-env"));

        unsafe {
            std::env::remove_var("TEST_SKEIN_TOKEN");
        }
    }

    #[test]
    fn test_expand_env_vars_missing_required_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("MISSING_SKEIN_VAR_TEST");
        }

        let toml = r#"
[fedi]
instance = "fosstodon.org"
acct = "ada"
token = "${MISSING_SKEIN_VAR_TEST}"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        let result = config.expand_env_vars();

        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("MISSING_SKEIN_VAR_TEST"));
        assert!(err.to_string().contains("fedi.token"));
    }

    #[test]
    fn test_debug_redacts_token() {
        let fedi = FediConfig {
            instance: "fosstodon.org".to_owned(),
            acct: Some("ada".to_owned()),
            token: Some("super-secret".to_owned()),
        };

        let rendered = format!("{fedi:?}");

        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
