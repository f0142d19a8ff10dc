use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::error::{LingoError, Result};
use crate::memory::MEMORY_FILE;
use crate::offline::OFFLINE_FILE;

fn default_priority() -> Vec<String> {
    vec!["deepl".to_string(), "microsoft".to_string(), "libre".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".lingo")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Master switch for every network provider
    #[serde(default = "default_true")]
    pub providers_enabled: bool,
    /// Provider names, most preferred first
    #[serde(default = "default_priority")]
    pub priority: Vec<String>,
    /// Maximum number of results kept in the in-process cache
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// Language assumed when a request says "auto"
    #[serde(default = "default_source_language")]
    pub default_source_language: String,
    /// Timeout for a single provider call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            providers_enabled: true,
            priority: default_priority(),
            cache_capacity: default_cache_capacity(),
            default_source_language: default_source_language(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the translation memory, offline state and logs
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl StorageConfig {
    pub fn memory_path(&self) -> PathBuf {
        self.data_dir.join(MEMORY_FILE)
    }

    pub fn offline_path(&self) -> PathBuf {
        self.data_dir.join(OFFLINE_FILE)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("log")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub deepl: DeepLConfig,
    #[serde(default)]
    pub microsoft: MicrosoftConfig,
    #[serde(default)]
    pub libre: LibreConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeepLConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
}

impl Default for DeepLConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: "https://api-free.deepl.com/v2/translate".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MicrosoftConfig {
    pub api_key: Option<String>,
    /// Azure resource region, required for regional resources
    pub region: Option<String>,
    pub endpoint: String,
}

impl Default for MicrosoftConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            region: None,
            endpoint: "https://api.cognitive.microsofttranslator.com/translate".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibreConfig {
    /// Base URL of the LibreTranslate instance
    pub url: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Extra phrase/dictionary tables merged over the built-in ones
    pub tables_path: Option<PathBuf>,
}

fn non_empty(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl DeepLConfig {
    pub fn has_credentials(&self) -> bool {
        non_empty(&self.api_key)
    }
}

impl MicrosoftConfig {
    pub fn has_credentials(&self) -> bool {
        non_empty(&self.api_key)
    }
}

impl LibreConfig {
    pub fn has_credentials(&self) -> bool {
        non_empty(&self.url)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LingoError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| LingoError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| LingoError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| LingoError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Load `path` if given (or `lingo.toml` if present), then apply
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new("lingo.toml").exists() => Self::from_file("lingo.toml")?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Apply overrides from a variable lookup (normally the process environment).
    pub fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = var("DEEPL_API_KEY") {
            self.providers.deepl.api_key = Some(key);
        }
        if let Some(key) = var("MICROSOFT_TRANSLATOR_KEY") {
            self.providers.microsoft.api_key = Some(key);
        }
        if let Some(region) = var("MICROSOFT_TRANSLATOR_REGION") {
            self.providers.microsoft.region = Some(region);
        }
        if let Some(url) = var("LIBRETRANSLATE_URL") {
            self.providers.libre.url = Some(url);
        }
        if let Some(key) = var("LIBRETRANSLATE_API_KEY") {
            self.providers.libre.api_key = Some(key);
        }
        if let Some(priority) = var("TRANSLATION_PROVIDER_PRIORITY") {
            self.engine.priority = priority
                .split(',')
                .map(|name| name.trim().to_lowercase())
                .filter(|name| !name.is_empty())
                .collect();
        }
        if let Some(enabled) = var("TRANSLATION_PROVIDERS_ENABLED") {
            match parse_bool(&enabled) {
                Some(enabled) => self.engine.providers_enabled = enabled,
                None => warn!("Ignoring TRANSLATION_PROVIDERS_ENABLED={:?}", enabled),
            }
        }
        if let Some(capacity) = var("TRANSLATION_CACHE_CAPACITY") {
            match capacity.trim().parse() {
                Ok(capacity) => self.engine.cache_capacity = capacity,
                Err(_) => warn!("Ignoring TRANSLATION_CACHE_CAPACITY={:?}", capacity),
            }
        }
        if let Some(dir) = var("LINGO_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.engine.providers_enabled);
        assert_eq!(config.engine.priority, vec!["deepl", "microsoft", "libre"]);
        assert_eq!(config.engine.cache_capacity, 200);
        assert_eq!(config.engine.default_source_language, "en");
        assert!(!config.providers.deepl.has_credentials());
        assert!(!config.providers.libre.has_credentials());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
[engine]
cache_capacity = 50

[providers.libre]
url = "http://localhost:5000"
"#,
        )
        .unwrap();

        assert_eq!(config.engine.cache_capacity, 50);
        assert_eq!(config.engine.priority.len(), 3);
        assert!(config.providers.libre.has_credentials());
        assert_eq!(config.providers.deepl.endpoint, DeepLConfig::default().endpoint);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lingo.toml");

        let mut config = Config::default();
        config.providers.deepl.api_key = Some("secret".to_string());
        config.engine.priority = vec!["libre".to_string()];
        config.save_to_file(&path).unwrap();

        assert_eq!(Config::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env(env(&[
            ("DEEPL_API_KEY", "dk"),
            ("LIBRETRANSLATE_URL", "http://libre"),
            ("TRANSLATION_PROVIDER_PRIORITY", "libre, DeepL"),
            ("TRANSLATION_PROVIDERS_ENABLED", "0"),
            ("TRANSLATION_CACHE_CAPACITY", "32"),
        ]));

        assert!(config.providers.deepl.has_credentials());
        assert!(config.providers.libre.has_credentials());
        assert_eq!(config.engine.priority, vec!["libre", "deepl"]);
        assert!(!config.engine.providers_enabled);
        assert_eq!(config.engine.cache_capacity, 32);
    }

    #[test]
    fn test_invalid_env_values_are_ignored() {
        let mut config = Config::default();
        config.apply_env(env(&[
            ("TRANSLATION_PROVIDERS_ENABLED", "maybe"),
            ("TRANSLATION_CACHE_CAPACITY", "lots"),
        ]));
        assert!(config.engine.providers_enabled);
        assert_eq!(config.engine.cache_capacity, 200);
    }

    #[test]
    fn test_blank_key_is_not_a_credential() {
        let mut config = Config::default();
        config.providers.microsoft.api_key = Some("  ".to_string());
        assert!(!config.providers.microsoft.has_credentials());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = Config::from_file("/nonexistent/lingo.toml");
        assert!(matches!(result, Err(LingoError::Config(_))));
    }
}
