//! TOML Configuration File Support
//!
//! Configuration for the folio page, loaded from
//! `~/.config/folio/folio.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments ([`ConfigOverrides`])
//! 2. Environment variables (`FOLIO_*`)
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [intro]
//! base_speed_ms = 20
//! deleting_speed_ms = 10
//! pause_duration_ms = 250
//! pause_words = [",", ".", "!", "?", "coffee"]
//!
//! [blackboard]
//! base_speed_ms = 30
//! pause_duration_ms = 200
//!
//! [visibility]
//! threshold = 0.3
//! root_margin = 50.0
//!
//! [content]
//! path = "/home/me/folio/content.toml"
//!
//! [display]
//! fps = 30
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::choreography::VisibilityPolicy;
use crate::content::{ContentError, ContentStore};
use crate::typewriter::TypewriterConfig;

/// Default frame rate of the terminal host
pub const DEFAULT_FPS: u32 = 30;

/// Highest accepted frame rate
pub const MAX_FPS: u32 = 240;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Typewriter section (`[intro]` or `[blackboard]`)
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TypewriterToml {
    /// Delay between characters in milliseconds
    pub base_speed_ms: Option<u64>,

    /// Delay between deletions in milliseconds
    pub deleting_speed_ms: Option<u64>,

    /// Words that pause typing when followed by a space
    pub pause_words: Option<Vec<String>>,

    /// Extra pause after a pause word in milliseconds
    pub pause_duration_ms: Option<u64>,
}

/// Visibility section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityToml {
    /// Visible fraction at which a section enters
    pub threshold: Option<f32>,

    /// Viewport inset in CSS pixels (hosts scale it to their own units)
    pub root_margin: Option<f32>,
}

/// Content section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentToml {
    /// TOML or JSON file replacing the built-in content
    pub path: Option<PathBuf>,
}

/// Display section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayToml {
    /// Frames per second
    pub fps: Option<u32>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioToml {
    /// Intro typewriter section
    pub intro: TypewriterToml,

    /// Blackboard typewriter section
    pub blackboard: TypewriterToml,

    /// Visibility section
    pub visibility: VisibilityToml,

    /// Content section
    pub content: ContentToml,

    /// Display section
    pub display: DisplayToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved folio configuration
///
/// Use [`load_config`] to load configuration with proper priority handling.
#[derive(Clone, Debug)]
pub struct FolioConfig {
    /// Intro typewriter settings
    pub intro: TypewriterConfig,

    /// Blackboard typewriter settings
    pub blackboard: TypewriterConfig,

    /// When a section counts as visible
    pub visibility: VisibilityPolicy,

    /// Content file (built-in content when `None`)
    pub content_path: Option<PathBuf>,

    /// Frames per second of the terminal host
    pub fps: u32,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            intro: TypewriterConfig::intro(),
            blackboard: TypewriterConfig::blackboard(),
            visibility: VisibilityPolicy::default(),
            content_path: None,
            fps: DEFAULT_FPS,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl FolioConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.visibility.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::ValidationError(format!(
                "visibility.threshold must be between 0 and 1, got {threshold}"
            )));
        }
        if self.visibility.root_margin < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "visibility.root_margin must not be negative, got {}",
                self.visibility.root_margin
            )));
        }
        if self.fps == 0 || self.fps > MAX_FPS {
            return Err(ConfigError::ValidationError(format!(
                "display.fps must be between 1 and {MAX_FPS}, got {}",
                self.fps
            )));
        }
        Ok(())
    }

    /// Load the configured content, or the built-in content
    ///
    /// # Errors
    ///
    /// Returns an error if the content file cannot be read, parsed or
    /// validated.
    pub fn load_content(&self) -> Result<ContentStore, ContentError> {
        match &self.content_path {
            Some(path) => ContentStore::load(path),
            None => Ok(ContentStore::builtin()),
        }
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/folio/folio.toml` or
/// `~/.config/folio/folio.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("folio").join("folio.toml"))
}

/// Load configuration from all sources with proper priority
///
/// CLI overrides are not handled here; apply [`ConfigOverrides`] after.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed.
/// A missing config file is not an error (defaults are used).
pub fn load_config() -> Result<FolioConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path and the process environment
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or holds out-of-range values.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<FolioConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration with an explicit environment lookup
///
/// # Errors
///
/// Same as [`load_config_from_path`].
pub fn load_config_with_env(
    path: Option<PathBuf>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<FolioConfig, ConfigError> {
    let mut config = FolioConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: FolioToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env);
    config.validate()?;

    Ok(config)
}

fn apply_typewriter_toml(config: &mut TypewriterConfig, toml: &TypewriterToml) {
    if let Some(speed) = toml.base_speed_ms {
        config.base_speed_ms = speed;
    }
    if let Some(speed) = toml.deleting_speed_ms {
        config.deleting_speed_ms = speed;
    }
    if let Some(ref words) = toml.pause_words {
        config.pause_words = words.clone();
    }
    if let Some(pause) = toml.pause_duration_ms {
        config.pause_duration_ms = pause;
    }
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut FolioConfig, toml: &FolioToml) {
    apply_typewriter_toml(&mut config.intro, &toml.intro);
    apply_typewriter_toml(&mut config.blackboard, &toml.blackboard);

    if let Some(threshold) = toml.visibility.threshold {
        config.visibility.threshold = threshold;
    }
    if let Some(margin) = toml.visibility.root_margin {
        config.visibility.root_margin = margin;
    }

    if toml.content.path.is_some() {
        config.content_path = toml.content.path.clone();
    }

    if let Some(fps) = toml.display.fps {
        config.fps = fps;
    }
}

/// Apply environment variable overrides to the config
fn apply_env_config(config: &mut FolioConfig, env: impl Fn(&str) -> Option<String>) {
    if let Some(ms) = env("FOLIO_INTRO_SPEED").and_then(|v| v.parse::<u64>().ok()) {
        config.intro.base_speed_ms = ms;
        config.source = ConfigSource::Env;
    }
    if let Some(ms) = env("FOLIO_BOARD_SPEED").and_then(|v| v.parse::<u64>().ok()) {
        config.blackboard.base_speed_ms = ms;
        config.source = ConfigSource::Env;
    }
    if let Some(threshold) = env("FOLIO_VISIBILITY_THRESHOLD").and_then(|v| v.parse::<f32>().ok()) {
        config.visibility.threshold = threshold;
        config.source = ConfigSource::Env;
    }
    if let Some(margin) = env("FOLIO_ROOT_MARGIN").and_then(|v| v.parse::<f32>().ok()) {
        config.visibility.root_margin = margin;
        config.source = ConfigSource::Env;
    }
    if let Some(path) = env("FOLIO_CONTENT") {
        config.content_path = Some(PathBuf::from(path));
        config.source = ConfigSource::Env;
    }
    if let Some(fps) = env("FOLIO_FPS").and_then(|v| v.parse::<u32>().ok()) {
        config.fps = fps;
        config.source = ConfigSource::Env;
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Content file override
    pub content_path: Option<PathBuf>,

    /// Intro base speed override (milliseconds)
    pub intro_speed_ms: Option<u64>,

    /// Blackboard base speed override (milliseconds)
    pub board_speed_ms: Option<u64>,

    /// Frame rate override
    pub fps: Option<u32>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set content file override
    #[must_use]
    pub fn with_content_path(mut self, path: PathBuf) -> Self {
        self.content_path = Some(path);
        self
    }

    /// Set intro speed override
    #[must_use]
    pub fn with_intro_speed_ms(mut self, ms: u64) -> Self {
        self.intro_speed_ms = Some(ms);
        self
    }

    /// Set blackboard speed override
    #[must_use]
    pub fn with_board_speed_ms(mut self, ms: u64) -> Self {
        self.board_speed_ms = Some(ms);
        self
    }

    /// Set frame rate override
    #[must_use]
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = Some(fps);
        self
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut FolioConfig) {
        if self.content_path.is_some()
            || self.intro_speed_ms.is_some()
            || self.board_speed_ms.is_some()
            || self.fps.is_some()
        {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref path) = self.content_path {
            config.content_path = Some(path.clone());
        }
        if let Some(ms) = self.intro_speed_ms {
            config.intro.base_speed_ms = ms;
        }
        if let Some(ms) = self.board_speed_ms {
            config.blackboard.base_speed_ms = ms;
        }
        if let Some(fps) = self.fps {
            config.fps = fps;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn toml_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    // =========================================================================
    // Default Configuration Tests
    // =========================================================================

    #[test]
    fn test_default_config() {
        let config = FolioConfig::default();

        assert_eq!(config.intro.base_speed_ms, 20);
        assert!(config.intro.pause_words.iter().any(|w| w == "cute things"));
        assert_eq!(config.blackboard.base_speed_ms, 30);
        assert_eq!(config.blackboard.pause_duration_ms, 200);
        assert!((config.visibility.threshold - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.fps, DEFAULT_FPS);
        assert_eq!(config.content_path, None);
        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_path() {
        if let Some(p) = default_config_path() {
            assert!(p.to_string_lossy().contains("folio"));
            assert!(p.to_string_lossy().ends_with("folio.toml"));
        }
    }

    // =========================================================================
    // TOML Parsing Tests
    // =========================================================================

    #[test]
    fn test_parse_valid_toml() {
        let file = toml_file(
            r#"
[intro]
base_speed_ms = 15
pause_words = ["!", "tea"]

[blackboard]
pause_duration_ms = 120

[visibility]
threshold = 0.5
root_margin = 2.0

[content]
path = "/tmp/content.json"

[display]
fps = 60
"#,
        );

        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();

        assert_eq!(config.intro.base_speed_ms, 15);
        assert_eq!(config.intro.pause_words, vec!["!".to_string(), "tea".to_string()]);
        assert_eq!(config.intro.deleting_speed_ms, 10);
        assert_eq!(config.blackboard.pause_duration_ms, 120);
        assert_eq!(config.blackboard.base_speed_ms, 30);
        assert!((config.visibility.threshold - 0.5).abs() < f32::EPSILON);
        assert!((config.visibility.root_margin - 2.0).abs() < f32::EPSILON);
        assert_eq!(config.content_path, Some(PathBuf::from("/tmp/content.json")));
        assert_eq!(config.fps, 60);
        assert_eq!(config.source(), ConfigSource::File);
        assert_eq!(config.config_file_path, Some(file.path().to_path_buf()));
    }

    #[test]
    fn test_parse_empty_toml() {
        let file = toml_file("");
        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();
        assert_eq!(config.intro, TypewriterConfig::intro());
        assert_eq!(config.source(), ConfigSource::File);
    }

    #[test]
    fn test_missing_file_graceful() {
        let config =
            load_config_with_env(Some(PathBuf::from("/nonexistent/folio.toml")), no_env).unwrap();
        assert_eq!(config.source(), ConfigSource::Default);
        assert_eq!(config.config_file_path, None);
    }

    #[test]
    fn test_malformed_toml_error() {
        let file = toml_file("[display\nfps = ");
        let err = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let file = toml_file("[visibility]\nthreshold = 1.5\n");
        let err = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));

        let err = load_config_with_env(None, env_of(&[("FOLIO_FPS", "0")])).unwrap_err();
        assert!(err.to_string().contains("display.fps"));
    }

    // =========================================================================
    // Priority Tests
    // =========================================================================

    #[test]
    fn test_env_overrides_file() {
        let file = toml_file("[intro]\nbase_speed_ms = 15\n[display]\nfps = 60\n");
        let env = env_of(&[("FOLIO_INTRO_SPEED", "5"), ("FOLIO_CONTENT", "/srv/content.toml")]);

        let config = load_config_with_env(Some(file.path().to_path_buf()), env).unwrap();
        assert_eq!(config.intro.base_speed_ms, 5);
        assert_eq!(config.fps, 60);
        assert_eq!(config.content_path, Some(PathBuf::from("/srv/content.toml")));
        assert_eq!(config.source(), ConfigSource::Env);
    }

    #[test]
    fn test_unparseable_env_is_ignored() {
        let config = load_config_with_env(None, env_of(&[("FOLIO_BOARD_SPEED", "fast")])).unwrap();
        assert_eq!(config.blackboard.base_speed_ms, 30);
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_cli_overrides_env() {
        let mut config = load_config_with_env(None, env_of(&[("FOLIO_FPS", "24")])).unwrap();
        ConfigOverrides::new().with_fps(50).with_board_speed_ms(12).apply(&mut config);

        assert_eq!(config.fps, 50);
        assert_eq!(config.blackboard.base_speed_ms, 12);
        assert_eq!(config.source(), ConfigSource::Cli);
    }

    #[test]
    fn test_config_overrides_empty_no_change() {
        let mut config = FolioConfig::default();
        ConfigOverrides::new().apply(&mut config);
        assert_eq!(config.source(), ConfigSource::Default);
        assert_eq!(config.fps, DEFAULT_FPS);
    }

    #[test]
    fn test_config_source_display() {
        assert_eq!(ConfigSource::Cli.to_string(), "CLI");
        assert_eq!(ConfigSource::Env.to_string(), "environment");
        assert_eq!(ConfigSource::File.to_string(), "config file");
        assert_eq!(ConfigSource::Default.to_string(), "default");
    }

    #[test]
    fn test_builtin_content_without_path() {
        let config = FolioConfig::default();
        let content = config.load_content().unwrap();
        assert_eq!(content.questions().len(), 4);
    }
}
