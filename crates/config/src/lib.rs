//! Configuration loading, validation, and management for SoulTurn.
//!
//! Loads configuration from `~/.soulturn/config.toml` (or an explicit path)
//! with environment variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.soulturn/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Who the soul is
    #[serde(default)]
    pub soul: SoulConfig,

    /// Model selection per quality tier
    #[serde(default)]
    pub models: ModelsConfig,

    /// Turn-taking policy knobs
    #[serde(default)]
    pub turn: TurnConfig,

    /// Welcome message facts
    #[serde(default)]
    pub welcome: WelcomeConfig,

    /// Durable slot storage
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Knowledge documents used for retrieval
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoulConfig {
    #[serde(default = "default_soul_name")]
    pub name: String,
}

fn default_soul_name() -> String {
    "Julio".into()
}

impl Default for SoulConfig {
    fn default() -> Self {
        Self {
            name: default_soul_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Model used for the default tier
    #[serde(default = "default_fast_model")]
    pub fast: String,

    /// Model used for the quality tier
    #[serde(default = "default_quality_model")]
    pub quality: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_fast_model() -> String {
    "gpt-4o-mini".into()
}
fn default_quality_model() -> String {
    "gpt-4o".into()
}
fn default_temperature() -> f32 {
    0.8
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            fast: default_fast_model(),
            quality: default_quality_model(),
            temperature: default_temperature(),
        }
    }
}

/// Turn-taking policy. Defaults suit a busy Discord community.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnConfig {
    /// More pending perceptions than this and the turn does nothing
    #[serde(default = "default_max_pending")]
    pub max_pending_perceptions: usize,

    #[serde(default = "default_max_parts")]
    pub max_message_parts: usize,

    #[serde(default = "default_avg_words")]
    pub avg_words_per_message: usize,

    /// Per-part word ceiling varies in `[-jitter, jitter - 1]` around the average
    #[serde(default = "default_word_jitter")]
    pub word_jitter: usize,

    #[serde(default = "default_speech_ratio")]
    pub thought_to_speech_ratio: f64,

    /// Chance of joining in when the addressee is unclear
    #[serde(default = "default_half")]
    pub chime_in_probability: f64,

    /// Chance of reacting with an emoji on a conversational turn
    #[serde(default = "default_half")]
    pub reaction_probability: f64,

    /// Content that simulates a join outside the live platform
    #[serde(default = "default_welcome_sentinel")]
    pub welcome_sentinel: String,

    /// Topics that need retrieved context to answer
    #[serde(default = "default_rag_topics")]
    pub rag_topics: String,

    /// Emotion assumed until the emotional-state slot is written
    #[serde(default = "default_emotion")]
    pub default_emotion: String,

    /// Fixed seed for reproducible runs; random when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_max_pending() -> usize {
    10
}
fn default_max_parts() -> usize {
    3
}
fn default_avg_words() -> usize {
    40
}
fn default_word_jitter() -> usize {
    20
}
fn default_speech_ratio() -> f64 {
    1.2
}
fn default_half() -> f64 {
    0.5
}
fn default_welcome_sentinel() -> String {
    "JOINED".into()
}
fn default_rag_topics() -> String {
    "Julio, Super Julio World, Julio's Discord Server, or Bitcoin Ordinals".into()
}
fn default_emotion() -> String {
    "happy".into()
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            max_pending_perceptions: default_max_pending(),
            max_message_parts: default_max_parts(),
            avg_words_per_message: default_avg_words(),
            word_jitter: default_word_jitter(),
            thought_to_speech_ratio: default_speech_ratio(),
            chime_in_probability: default_half(),
            reaction_probability: default_half(),
            welcome_sentinel: default_welcome_sentinel(),
            rag_topics: default_rag_topics(),
            default_emotion: default_emotion(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeConfig {
    /// Every area of the server, in order
    #[serde(default = "default_areas")]
    pub areas: Vec<String>,

    /// Where newcomers land
    #[serde(default = "default_current_area")]
    pub current_area: String,

    /// Where newcomers should go next
    #[serde(default = "default_recommended_area")]
    pub recommended_area: String,

    /// Area unlocked by verifying as a holder
    #[serde(default = "default_holder_area")]
    pub holder_area: String,

    /// Channel where holders verify
    #[serde(default = "default_holder_verify_channel")]
    pub holder_verify_channel: String,
}

fn default_areas() -> Vec<String> {
    vec![
        "welcome area".into(),
        "satoshi street".into(),
        "collector's corner".into(),
    ]
}
fn default_current_area() -> String {
    "welcome area".into()
}
fn default_recommended_area() -> String {
    "satoshi street".into()
}
fn default_holder_area() -> String {
    "collector's corner".into()
}
fn default_holder_verify_channel() -> String {
    "#holder-verify".into()
}

impl Default for WelcomeConfig {
    fn default() -> Self {
        Self {
            areas: default_areas(),
            current_area: default_current_area(),
            recommended_area: default_recommended_area(),
            holder_area: default_holder_area(),
            holder_verify_channel: default_holder_verify_channel(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// "in_memory", "file", or "none"
    #[serde(default = "default_memory_backend")]
    pub backend: String,

    /// Slot file for the "file" backend; defaults to `~/.soulturn/slots.json`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

fn default_memory_backend() -> String {
    "in_memory".into()
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            backend: default_memory_backend(),
            path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// TOML file of `[[documents]]`; retrieval finds nothing when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Maximum documents appended per retrieval
    #[serde(default = "default_knowledge_limit")]
    pub limit: usize,
}

fn default_knowledge_limit() -> usize {
    3
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            path: None,
            limit: default_knowledge_limit(),
        }
    }
}

const MEMORY_BACKENDS: &[&str] = &["in_memory", "file", "none"];

impl AppConfig {
    /// Load configuration from the default path (~/.soulturn/config.toml).
    ///
    /// Environment variables override the file:
    /// - `SOULTURN_SOUL_NAME`
    /// - `SOULTURN_HOLDER_VERIFY_CHANNEL`
    /// - `SOULTURN_FAST_MODEL`
    /// - `SOULTURN_QUALITY_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_env(&config_path)
    }

    /// Load from `path`, then apply environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the environment, in production).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(name) = lookup("SOULTURN_SOUL_NAME") {
            self.soul.name = name;
        }
        if let Some(channel) = lookup("SOULTURN_HOLDER_VERIFY_CHANNEL") {
            self.welcome.holder_verify_channel = channel;
        }
        if let Some(model) = lookup("SOULTURN_FAST_MODEL") {
            self.models.fast = model;
        }
        if let Some(model) = lookup("SOULTURN_QUALITY_MODEL") {
            self.models.quality = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".soulturn")
    }

    /// Where the file slot backend writes when no path is configured.
    pub fn slots_path(&self) -> PathBuf {
        self.memory
            .path
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("slots.json"))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.soul.name.trim().is_empty() {
            return Err(ConfigError::ValidationError("soul.name must not be empty".into()));
        }

        let turn = &self.turn;
        for (name, p) in [
            ("turn.chime_in_probability", turn.chime_in_probability),
            ("turn.reaction_probability", turn.reaction_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be between 0.0 and 1.0"
                )));
            }
        }

        if turn.max_message_parts == 0 {
            return Err(ConfigError::ValidationError(
                "turn.max_message_parts must be at least 1".into(),
            ));
        }

        if turn.avg_words_per_message == 0 {
            return Err(ConfigError::ValidationError(
                "turn.avg_words_per_message must be at least 1".into(),
            ));
        }

        if turn.word_jitter >= turn.avg_words_per_message {
            return Err(ConfigError::ValidationError(
                "turn.word_jitter must be smaller than turn.avg_words_per_message".into(),
            ));
        }

        if turn.thought_to_speech_ratio <= 0.0 {
            return Err(ConfigError::ValidationError(
                "turn.thought_to_speech_ratio must be > 0".into(),
            ));
        }

        if !MEMORY_BACKENDS.contains(&self.memory.backend.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "memory.backend must be one of {MEMORY_BACKENDS:?}, got {:?}",
                self.memory.backend
            )));
        }

        if !self
            .welcome
            .areas
            .iter()
            .any(|area| area == &self.welcome.current_area)
        {
            return Err(ConfigError::ValidationError(
                "welcome.current_area must be listed in welcome.areas".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `config --default`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.soul.name, "Julio");
        assert_eq!(config.turn.max_pending_perceptions, 10);
        assert_eq!(config.turn.max_message_parts, 3);
        assert_eq!(config.turn.avg_words_per_message, 40);
        assert!((config.turn.thought_to_speech_ratio - 1.2).abs() < f64::EPSILON);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.soul.name, config.soul.name);
        assert_eq!(parsed.welcome.areas, config.welcome.areas);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let toml_str = r##"
[soul]
name = "Cranky"

[welcome]
holder_verify_channel = "#verify-here"
"##;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.soul.name, "Cranky");
        assert_eq!(config.welcome.holder_verify_channel, "#verify-here");
        assert_eq!(config.welcome.current_area, "welcome area");
        assert_eq!(config.turn.max_pending_perceptions, 10);
    }

    #[test]
    fn invalid_probability_rejected() {
        let mut config = AppConfig::default();
        config.turn.chime_in_probability = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn jitter_must_stay_below_average() {
        let mut config = AppConfig::default();
        config.turn.word_jitter = 40;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_memory_backend_rejected() {
        let mut config = AppConfig::default();
        config.memory.backend = "redis".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("memory.backend"));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().soul.name, "Julio");
    }

    #[test]
    fn unparsable_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[turn\nmax_pending_perceptions = ").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn overrides_win_over_file() {
        let vars: HashMap<&str, &str> = [
            ("SOULTURN_SOUL_NAME", "Samantha"),
            ("SOULTURN_HOLDER_VERIFY_CHANNEL", "#holders"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.soul.name, "Samantha");
        assert_eq!(config.welcome.holder_verify_channel, "#holders");
        assert_eq!(config.models.fast, "gpt-4o-mini");
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("Julio"));
        assert!(toml_str.contains("max_pending_perceptions = 10"));
    }
}
