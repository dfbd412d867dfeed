//! Configuration management for the techblog tools.
//!
//! Parses `techblog.toml` with serde and discovers it in the current
//! directory or its parents. CLI settings are applied on top via
//! [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `api.base_url`
//! - `api.token`
//! - `diagrams.kroki_url`

mod expand;

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration filename to search for.
pub const CONFIG_FILENAME: &str = "techblog.toml";

/// Maximum accepted diagram DPI.
const MAX_DPI: u32 = 1000;

/// CLI settings that override configuration file values.
///
/// Only `Some` values override the loaded config.
#[derive(Debug, Clone, Default)]
pub struct CliSettings {
    /// Override the blog API base URL.
    pub api_url: Option<String>,
    /// Override the Kroki URL.
    pub kroki_url: Option<String>,
    /// Override the cache enabled flag.
    pub cache_enabled: Option<bool>,
}

impl CliSettings {
    /// Whether no override is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.api_url.is_none() && self.kroki_url.is_none() && self.cache_enabled.is_none()
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Blog API settings.
    pub api: ApiConfig,
    /// Diagram rendering settings.
    pub diagrams: DiagramsConfig,
    /// Post body rendering settings.
    pub render: RenderConfig,
    /// Cache settings as written in TOML (relative dir).
    cache: CacheConfigRaw,

    /// Resolved cache settings (set after loading).
    #[serde(skip)]
    pub cache_resolved: CacheConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Blog API settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API root, e.g. `https://blog.example.com/api`.
    pub base_url: Option<String>,
    /// Bearer token sent with requests.
    pub token: Option<String>,
    /// HTTP timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            token: None,
            timeout_secs: 30,
        }
    }
}

/// Diagram output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Inline SVG.
    #[default]
    Svg,
    /// PNG data URI.
    Png,
}

/// Diagram rendering settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiagramsConfig {
    /// Kroki server URL. Diagrams stay as source text when unset.
    pub kroki_url: Option<String>,
    /// Rendering DPI.
    pub dpi: u32,
    /// Output format.
    pub format: OutputFormat,
    /// HTTP timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for DiagramsConfig {
    fn default() -> Self {
        Self {
            kroki_url: None,
            dpi: 192,
            format: OutputFormat::Svg,
            timeout_secs: 30,
        }
    }
}

/// Post body rendering settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Minimum image placeholder height in CSS pixels.
    pub image_min_height: u32,
    /// Excerpt length in characters.
    pub excerpt_length: usize,
    /// Wrap rendered bodies in a standalone HTML page.
    pub wrap: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            image_min_height: 200,
            excerpt_length: 100,
            wrap: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct CacheConfigRaw {
    enabled: Option<bool>,
    dir: Option<String>,
}

/// Resolved cache settings.
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    /// Whether the diagram cache is used.
    pub enabled: bool,
    /// Absolute cache directory.
    pub dir: PathBuf,
}

impl CacheConfig {
    /// Directory holding rendered diagrams.
    #[must_use]
    pub fn diagrams_dir(&self) -> PathBuf {
        self.dir.join("diagrams")
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
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
        /// Config field path (e.g., "`api.token`").
        field: String,
        /// Error message (e.g., "${`BLOG_TOKEN`} not set").
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

/// Require a timeout to be positive.
fn require_positive(value: u64, field: &str) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation(format!(
            "{field} must be greater than 0"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// for `techblog.toml` in the current directory and parents, falling back
    /// to defaults.
    ///
    /// CLI settings are applied after loading and validated with the rest.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit `config_path` doesn't exist, parsing or
    /// expansion fails, or a value is invalid.
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
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Blog API base URL, required by commands that fetch posts.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if no URL is configured.
    pub fn require_api_url(&self) -> Result<&str, ConfigError> {
        self.api.base_url.as_deref().ok_or_else(|| {
            ConfigError::Validation(
                "api.base_url is required (set it in techblog.toml or pass --api-url)".to_owned(),
            )
        })
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_api()?;
        self.validate_diagrams()?;
        Ok(())
    }

    fn validate_api(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.api.base_url {
            require_non_empty(url, "api.base_url")?;
            require_http_url(url, "api.base_url")?;
        }
        require_positive(self.api.timeout_secs, "api.timeout_secs")
    }

    fn validate_diagrams(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.diagrams.kroki_url {
            require_non_empty(url, "diagrams.kroki_url")?;
            require_http_url(url, "diagrams.kroki_url")?;
        }

        let dpi = self.diagrams.dpi;
        if dpi == 0 {
            return Err(ConfigError::Validation(
                "diagrams.dpi must be greater than 0".to_owned(),
            ));
        }
        if dpi > MAX_DPI {
            return Err(ConfigError::Validation(format!(
                "diagrams.dpi cannot exceed {MAX_DPI}"
            )));
        }
        require_positive(self.diagrams.timeout_secs, "diagrams.timeout_secs")
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(api_url) = &settings.api_url {
            self.api.base_url = Some(api_url.clone());
        }
        if let Some(kroki_url) = &settings.kroki_url {
            self.diagrams.kroki_url = Some(kroki_url.clone());
        }
        if let Some(enabled) = settings.cache_enabled {
            self.cache_resolved.enabled = enabled;
        }
    }

    /// Search for the config file in the current directory and parents.
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

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    fn default_with_base(base: &Path) -> Self {
        let mut config = Self::default();
        config.resolve_paths(base);
        config
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;
        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;
        Ok(config)
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.api.base_url = expand::expand_opt(self.api.base_url.as_ref(), "api.base_url")?;
        self.api.token = expand::expand_opt(self.api.token.as_ref(), "api.token")?;
        self.diagrams.kroki_url =
            expand::expand_opt(self.diagrams.kroki_url.as_ref(), "diagrams.kroki_url")?;
        Ok(())
    }

    /// Resolve the cache directory relative to the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let dir = self.cache.dir.as_deref().unwrap_or(".techblog/cache");
        self.cache_resolved = CacheConfig {
            enabled: self.cache.enabled.unwrap_or(true),
            dir: config_dir.join(dir),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/blog"));
        assert!(config.api.base_url.is_none());
        assert_eq!(config.api.timeout_secs, 30);
        assert!(config.diagrams.kroki_url.is_none());
        assert_eq!(config.diagrams.dpi, 192);
        assert_eq!(config.diagrams.format, OutputFormat::Svg);
        assert_eq!(config.render.image_min_height, 200);
        assert_eq!(config.render.excerpt_length, 100);
        assert!(config.cache_resolved.enabled);
        assert_eq!(
            config.cache_resolved.diagrams_dir(),
            PathBuf::from("/blog/.techblog/cache/diagrams")
        );
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[api]
base_url = "https://blog.example.com/api"
token = "secret"
timeout_secs = 10

[diagrams]
kroki_url = "https://kroki.io"
dpi = 96
format = "png"

[render]
image_min_height = 120
wrap = true

[cache]
enabled = false
dir = "tmp/cache"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/blog"));

        assert_eq!(
            config.api.base_url.as_deref(),
            Some("https://blog.example.com/api")
        );
        assert_eq!(config.api.token.as_deref(), Some("secret"));
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.diagrams.dpi, 96);
        assert_eq!(config.diagrams.format, OutputFormat::Png);
        assert_eq!(config.diagrams.timeout_secs, 30);
        assert_eq!(config.render.image_min_height, 120);
        assert_eq!(config.render.excerpt_length, 100);
        assert!(config.render.wrap);
        assert!(!config.cache_resolved.enabled);
        assert_eq!(config.cache_resolved.dir, PathBuf::from("/blog/tmp/cache"));
        config.validate().unwrap();
    }

    #[test]
    fn test_unknown_format_rejected() {
        let result: Result<Config, _> = toml::from_str("[diagrams]\nformat = \"gif\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file_resolves_relative_to_config() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[api]\nbase_url = \"http://localhost:8080\"\n");

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.config_path.as_deref(), Some(path.as_path()));
        assert_eq!(config.cache_resolved.dir, dir.path().join(".techblog/cache"));
        assert_eq!(config.require_api_url().unwrap(), "http://localhost:8080");
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let err = Config::load(Some(Path::new("/nonexistent/techblog.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_expands_env_vars() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("TB_CONFIG_TEST_TOKEN", "from-env");
        }
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "[api]\ntoken = \"${TB_CONFIG_TEST_TOKEN}\"\n\n[diagrams]\nkroki_url = \"${TB_CONFIG_TEST_KROKI:-https://kroki.io}\"\n",
        );

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.api.token.as_deref(), Some("from-env"));
        assert_eq!(config.diagrams.kroki_url.as_deref(), Some("https://kroki.io"));
        unsafe {
            std::env::remove_var("TB_CONFIG_TEST_TOKEN");
        }
    }

    #[test]
    fn test_invalid_url_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[diagrams]\nkroki_url = \"kroki.io\"\n");
        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(err.to_string().contains("diagrams.kroki_url"));
    }

    #[test]
    fn test_dpi_bounds() {
        let mut config = Config::default_with_base(Path::new("/blog"));
        config.diagrams.dpi = 0;
        assert!(config.validate().is_err());
        config.diagrams.dpi = 1001;
        assert!(config.validate().unwrap_err().to_string().contains("1000"));
        config.diagrams.dpi = 1000;
        config.validate().unwrap();
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default_with_base(Path::new("/blog"));
        config.api.timeout_secs = 0;
        assert!(config.validate().unwrap_err().to_string().contains("api.timeout_secs"));
    }

    #[test]
    fn test_cli_settings_override() {
        let mut config = Config::default_with_base(Path::new("/blog"));
        let settings = CliSettings {
            api_url: Some("https://api.example.com".to_owned()),
            kroki_url: Some("http://localhost:8000".to_owned()),
            cache_enabled: Some(false),
        };
        assert!(!settings.is_empty());
        config.apply_cli_settings(&settings);

        assert_eq!(config.require_api_url().unwrap(), "https://api.example.com");
        assert_eq!(
            config.diagrams.kroki_url.as_deref(),
            Some("http://localhost:8000")
        );
        assert!(!config.cache_resolved.enabled);
    }

    #[test]
    fn test_require_api_url_missing() {
        let config = Config::default_with_base(Path::new("/blog"));
        let err = config.require_api_url().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(CliSettings::default().is_empty());
    }
}
