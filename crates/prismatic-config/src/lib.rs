//! Configuration management for Prismatic.
//!
//! Parses `prismatic.toml` with serde and discovers it in the current
//! directory or any parent. CLI settings are applied on top via
//! [`CliSettings`], and the result is validated as a whole.
//!
//! ```toml
//! [highlight]
//! default_theme = "github-dark"
//! aliases = { tf = "hcl", jsonc = "json" }
//!
//! [diagrams]
//! enabled = true
//! kroki_url = "${KROKI_URL:-https://kroki.io}"
//! timeout_secs = 30
//! theme = "auto"
//!
//! [observer]
//! debounce_ms = 100
//! ```
//!
//! ## Environment Variable Expansion
//!
//! `${VAR}` errors when VAR is unset; `${VAR:-default}` falls back to the
//! default. Expanded fields:
//! - `highlight.default_theme`
//! - `diagrams.kroki_url`

mod expand;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// Configuration filename to search for.
pub const CONFIG_FILENAME: &str = "prismatic.toml";

/// Upper bound for `observer.debounce_ms`.
const MAX_DEBOUNCE_MS: u64 = 10_000;

/// CLI settings that override configuration file values.
///
/// Only `Some` fields override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override Kroki URL.
    pub kroki_url: Option<String>,
    /// Override diagram theme selection.
    pub theme: Option<DiagramTheme>,
    /// Override whether diagrams are processed at all.
    pub diagrams_enabled: Option<bool>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Code block normalization.
    pub highlight: HighlightConfig,
    /// Diagram rendering.
    pub diagrams: DiagramsConfig,
    /// Page change observation.
    pub observer: ObserverConfig,
    /// Path to the config file, if one was loaded.
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// `[highlight]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Theme class added to Prismatic code blocks without one.
    pub default_theme: String,
    /// Extra language aliases. Entries override the built-in table.
    pub aliases: BTreeMap<String, String>,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            default_theme: "github-dark".to_owned(),
            aliases: BTreeMap::new(),
        }
    }
}

/// `[diagrams]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DiagramsConfig {
    /// Whether diagram blocks are turned into toggles.
    pub enabled: bool,
    /// Kroki server used as the diagram engine.
    pub kroki_url: String,
    /// HTTP timeout for engine requests, in seconds.
    pub timeout_secs: u64,
    /// How the diagram color scheme is chosen.
    pub theme: DiagramTheme,
}

impl Default for DiagramsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            kroki_url: "https://kroki.io".to_owned(),
            timeout_secs: 30,
            theme: DiagramTheme::Auto,
        }
    }
}

impl DiagramsConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Diagram theme selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramTheme {
    /// Follow the page's `dark` class.
    #[default]
    Auto,
    Dark,
    Light,
}

impl FromStr for DiagramTheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "dark" => Ok(Self::Dark),
            "light" => Ok(Self::Light),
            _ => Err(format!("invalid theme '{s}' (expected auto, dark or light)")),
        }
    }
}

impl fmt::Display for DiagramTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Dark => "dark",
            Self::Light => "light",
        })
    }
}

/// `[observer]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    /// Quiet period before a batch of page changes is processed.
    pub debounce_ms: u64,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self { debounce_ms: 100 }
    }
}

impl ObserverConfig {
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
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
        /// Config field path (e.g., "`diagrams.kroki_url`").
        field: String,
        /// Error message (e.g., "${`KROKI_URL`} not set").
        message: String,
    },
}

impl Config {
    /// Load configuration and apply CLI settings.
    ///
    /// An explicit `config_path` must exist. Without one, `prismatic.toml`
    /// is searched for from the current directory upwards, and defaults are
    /// used when none is found.
    ///
    /// # Errors
    ///
    /// Returns error if the explicit file is missing, reading or parsing
    /// fails, expansion references an unset variable, or the final
    /// configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let found = match config_path {
            Some(path) if !path.exists() => {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Some(path) => Some(path.to_path_buf()),
            None => std::env::current_dir()
                .ok()
                .and_then(|cwd| discover_from(&cwd)),
        };

        let mut config = match found {
            Some(path) => Self::load_from_file(&path)?,
            None => {
                tracing::debug!("No {CONFIG_FILENAME} found, using defaults");
                Self::default()
            }
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }
        config.validate()?;

        Ok(config)
    }

    /// Parse and expand a configuration file. Not validated.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.expand_env_vars()?;
        config.config_path = Some(path.to_path_buf());
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(kroki_url) = &settings.kroki_url {
            self.diagrams.kroki_url.clone_from(kroki_url);
        }
        if let Some(theme) = settings.theme {
            self.diagrams.theme = theme;
        }
        if let Some(enabled) = settings.diagrams_enabled {
            self.diagrams.enabled = enabled;
        }
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.highlight.default_theme =
            expand::expand_env(&self.highlight.default_theme, "highlight.default_theme")?;
        self.diagrams.kroki_url =
            expand::expand_env(&self.diagrams.kroki_url, "diagrams.kroki_url")?;
        Ok(())
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` naming the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.highlight.default_theme, "highlight.default_theme")?;
        for (alias, language) in &self.highlight.aliases {
            if alias.trim().is_empty() || language.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "highlight.aliases entry '{alias}' = '{language}' cannot be empty"
                )));
            }
        }

        // Disabled diagrams never touch the engine settings.
        if self.diagrams.enabled {
            require_non_empty(&self.diagrams.kroki_url, "diagrams.kroki_url")?;
            require_http_url(&self.diagrams.kroki_url, "diagrams.kroki_url")?;
            if self.diagrams.timeout_secs == 0 {
                return Err(ConfigError::Validation(
                    "diagrams.timeout_secs must be greater than 0".to_owned(),
                ));
            }
        }

        if self.observer.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(ConfigError::Validation(format!(
                "observer.debounce_ms cannot exceed {MAX_DEBOUNCE_MS}"
            )));
        }

        Ok(())
    }
}

/// Find `prismatic.toml` in `start` or its nearest ancestor.
#[must_use]
pub fn discover_from(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILENAME))
        .find(|candidate| candidate.is_file())
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join(CONFIG_FILENAME);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.highlight.default_theme, "github-dark");
        assert!(config.highlight.aliases.is_empty());
        assert!(config.diagrams.enabled);
        assert_eq!(config.diagrams.kroki_url, "https://kroki.io");
        assert_eq!(config.diagrams.timeout(), Duration::from_secs(30));
        assert_eq!(config.diagrams.theme, DiagramTheme::Auto);
        assert_eq!(config.observer.debounce(), Duration::from_millis(100));
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_empty_file() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.diagrams.kroki_url, "https://kroki.io");
        assert_eq!(config.observer.debounce_ms, 100);
    }

    #[test]
    fn test_parse_all_sections() {
        let toml = r#"
[highlight]
default_theme = "nord"
aliases = { tf = "hcl", JSONC = "json" }

[diagrams]
enabled = false
kroki_url = "http://localhost:8000"
timeout_secs = 5
theme = "dark"

[observer]
debounce_ms = 250
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.highlight.default_theme, "nord");
        assert_eq!(
            config.highlight.aliases.get("tf").map(String::as_str),
            Some("hcl")
        );
        assert_eq!(config.highlight.aliases.len(), 2);
        assert!(!config.diagrams.enabled);
        assert_eq!(config.diagrams.kroki_url, "http://localhost:8000");
        assert_eq!(config.diagrams.timeout_secs, 5);
        assert_eq!(config.diagrams.theme, DiagramTheme::Dark);
        assert_eq!(config.observer.debounce_ms, 250);
    }

    #[test]
    fn test_parse_unknown_theme_fails() {
        let result: Result<Config, _> = toml::from_str("[diagrams]\ntheme = \"sepia\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_theme_from_str() {
        assert_eq!("Dark".parse::<DiagramTheme>(), Ok(DiagramTheme::Dark));
        assert_eq!("auto".parse::<DiagramTheme>(), Ok(DiagramTheme::Auto));
        assert!("sepia".parse::<DiagramTheme>().is_err());
        assert_eq!(DiagramTheme::Light.to_string(), "light");
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default();
        config.apply_cli_settings(&CliSettings {
            kroki_url: Some("http://kroki.local".to_owned()),
            theme: Some(DiagramTheme::Light),
            ..Default::default()
        });
        assert_eq!(config.diagrams.kroki_url, "http://kroki.local");
        assert_eq!(config.diagrams.theme, DiagramTheme::Light);
        assert!(config.diagrams.enabled);
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default();
        config.apply_cli_settings(&CliSettings::default());
        assert_eq!(config.diagrams.kroki_url, "https://kroki.io");
        assert_eq!(config.diagrams.theme, DiagramTheme::Auto);
    }

    #[test]
    fn test_validate_rejects_non_http_url() {
        let mut config = Config::default();
        config.diagrams.kroki_url = "ftp://kroki".to_owned();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("diagrams.kroki_url"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.diagrams.timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_validate_skips_engine_settings_when_disabled() {
        let mut config = Config::default();
        config.diagrams.enabled = false;
        config.diagrams.kroki_url = String::new();
        config.diagrams.timeout_secs = 0;
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_debounce_bound() {
        let mut config = Config::default();
        config.observer.debounce_ms = MAX_DEBOUNCE_MS;
        config.validate().unwrap();

        config.observer.debounce_ms = MAX_DEBOUNCE_MS + 1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("observer.debounce_ms"));
    }

    #[test]
    fn test_validate_rejects_empty_alias() {
        let mut config = Config::default();
        config
            .highlight
            .aliases
            .insert("tf".to_owned(), " ".to_owned());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "[diagrams]\nkroki_url = \"http://localhost:8000\"\ntheme = \"light\"\n",
        );

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.diagrams.kroki_url, "http://localhost:8000");
        assert_eq!(config.diagrams.theme, DiagramTheme::Light);
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(p) if p == path));
    }

    #[test]
    fn test_load_cli_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "[diagrams]\ntheme = \"dark\"\n");
        let settings = CliSettings {
            theme: Some(DiagramTheme::Light),
            diagrams_enabled: Some(false),
            ..Default::default()
        };

        let config = Config::load(Some(&path), Some(&settings)).unwrap();
        assert_eq!(config.diagrams.theme, DiagramTheme::Light);
        assert!(!config.diagrams.enabled);
    }

    #[test]
    fn test_load_validates_cli_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "");
        let settings = CliSettings {
            kroki_url: Some("kroki.io".to_owned()),
            ..Default::default()
        };

        let err = Config::load(Some(&path), Some(&settings)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "[diagrams\n");
        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_expands_default_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "[diagrams]\nkroki_url = \"${PRISMATIC_TEST_UNSET_KROKI:-http://fallback:8000}\"\n",
        );
        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.diagrams.kroki_url, "http://fallback:8000");
    }

    #[test]
    fn test_load_unset_variable_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "[highlight]\ndefault_theme = \"${PRISMATIC_TEST_UNSET_THEME}\"\n",
        );
        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::EnvVar { ref field, .. } if field == "highlight.default_theme"
        ));
    }

    #[test]
    fn test_discover_in_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let expected = write_config(dir.path(), "");
        let nested = dir.path().join("site").join("public");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(discover_from(&nested), Some(expected));
    }

    #[test]
    fn test_discover_prefers_nearest() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), "");
        let nested = dir.path().join("site");
        fs::create_dir_all(&nested).unwrap();
        let expected = write_config(&nested, "");

        assert_eq!(discover_from(&nested), Some(expected));
    }

    #[test]
    fn test_discover_ignores_directory_named_like_config() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a");
        fs::create_dir_all(nested.join(CONFIG_FILENAME)).unwrap();
        let found = discover_from(&nested);
        assert_ne!(found, Some(nested.join(CONFIG_FILENAME)));
    }
}
