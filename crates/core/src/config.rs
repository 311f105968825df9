//! Configuration management for the Mizan engine.
//!
//! Configuration is merged from three sources, lowest precedence first:
//! - Built-in defaults
//! - An optional YAML config file (`mizan.yaml`)
//! - Environment variables (`MIZAN_*`)
//!
//! CLI flags are applied on top via [`EngineConfig::with_overrides`]. The
//! resulting config is read-only at request time.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{EngineError, EngineResult};

/// Providers the gateway knows how to construct.
pub const KNOWN_PROVIDERS: [&str; 2] = ["groq", "openai"];

/// Conversation memory settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MemorySettings {
    /// Whether the memory window is consulted at all
    pub enabled: bool,

    /// Number of question/answer pairs to retain. 0 disables the window.
    pub window_size: usize,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            window_size: 5,
        }
    }
}

/// Main engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// LLM provider ("groq" or "openai")
    pub provider: String,

    /// Primary model identifier; the provider's default model when unset
    pub model: Option<String>,

    /// Same-provider fallback model, tried once on rate-limit or
    /// unavailability. Unset means the provider's default fallback; an
    /// empty string disables fallback entirely.
    pub fallback_model: Option<String>,

    /// API key for the provider (resolved from env if not set)
    pub api_key: Option<String>,

    /// Optional custom provider endpoint
    pub endpoint: Option<String>,

    /// Sampling temperature (0.0 - 2.0)
    pub temperature: f32,

    /// Client-side completion timeout in seconds
    pub timeout_secs: u64,

    /// Number of chunks requested from the chunk store
    pub top_k: usize,

    /// Maximum chunks kept after ranking and deduplication
    pub max_sources: usize,

    /// Minimum similarity score for a chunk to be used as context
    pub min_score: f32,

    /// Character budget for the composed prompt
    pub prompt_budget: usize,

    /// Conversation memory settings
    pub memory: MemorySettings,

    /// Base URL of the chunk store search service
    pub chunk_store_url: String,

    /// Optional SQLite conversation history database
    pub history_db: Option<PathBuf>,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Disable colored output
    pub no_color: bool,
}

/// Config file structure (`mizan.yaml`).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSection>,
    retrieval: Option<RetrievalSection>,
    memory: Option<MemorySection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LlmSection {
    provider: Option<String>,
    model: Option<String>,
    #[serde(rename = "fallbackModel")]
    fallback_model: Option<String>,
    endpoint: Option<String>,
    temperature: Option<f32>,
    #[serde(rename = "timeoutSecs")]
    timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RetrievalSection {
    #[serde(rename = "topK")]
    top_k: Option<usize>,
    #[serde(rename = "maxSources")]
    max_sources: Option<usize>,
    #[serde(rename = "minScore")]
    min_score: Option<f32>,
    #[serde(rename = "storeUrl")]
    store_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MemorySection {
    enabled: Option<bool>,
    #[serde(rename = "windowSize")]
    window_size: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            provider: "groq".to_string(),
            model: None,
            fallback_model: None,
            api_key: None,
            endpoint: None,
            temperature: 0.3,
            timeout_secs: 30,
            top_k: 10,
            max_sources: 5,
            min_score: 0.2,
            prompt_budget: 24_000,
            memory: MemorySettings::default(),
            chunk_store_url: "http://localhost:8000".to_string(),
            history_db: None,
            config_file: None,
            log_level: None,
            no_color: false,
        }
    }
}

impl EngineConfig {
    /// Load configuration from the config file and environment variables.
    ///
    /// Environment variables:
    /// - `MIZAN_CONFIG`: path to config file (default: `./mizan.yaml`)
    /// - `MIZAN_PROVIDER`, `MIZAN_MODEL`, `MIZAN_FALLBACK_MODEL`
    /// - `MIZAN_API_KEY`, `MIZAN_ENDPOINT`
    /// - `MIZAN_TEMPERATURE`, `MIZAN_TIMEOUT_SECS`
    /// - `MIZAN_TOP_K`, `MIZAN_MAX_SOURCES`, `MIZAN_MIN_SCORE`
    /// - `MIZAN_MEMORY_WINDOW`, `MIZAN_MEMORY_ENABLED`
    /// - `MIZAN_CHUNK_STORE_URL`, `MIZAN_HISTORY_DB`
    /// - `RUST_LOG`, `NO_COLOR`
    pub fn load() -> EngineResult<Self> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("MIZAN_CONFIG") {
            config.config_file = Some(PathBuf::from(path));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| PathBuf::from("mizan.yaml"));
        if config_path.exists() {
            config.merge_yaml(&config_path)?;
        }

        // Environment variables override the YAML file
        if let Ok(provider) = std::env::var("MIZAN_PROVIDER") {
            config.provider = provider;
        }
        if let Ok(model) = std::env::var("MIZAN_MODEL") {
            config.model = Some(model);
        }
        if let Ok(fallback) = std::env::var("MIZAN_FALLBACK_MODEL") {
            config.fallback_model = Some(fallback);
        }
        if let Ok(endpoint) = std::env::var("MIZAN_ENDPOINT") {
            config.endpoint = Some(endpoint);
        }
        if let Ok(url) = std::env::var("MIZAN_CHUNK_STORE_URL") {
            config.chunk_store_url = url;
        }
        if let Ok(db) = std::env::var("MIZAN_HISTORY_DB") {
            config.history_db = Some(PathBuf::from(db));
        }

        config.api_key = std::env::var("MIZAN_API_KEY").ok();
        config.temperature = parse_env("MIZAN_TEMPERATURE", config.temperature)?;
        config.timeout_secs = parse_env("MIZAN_TIMEOUT_SECS", config.timeout_secs)?;
        config.top_k = parse_env("MIZAN_TOP_K", config.top_k)?;
        config.max_sources = parse_env("MIZAN_MAX_SOURCES", config.max_sources)?;
        config.min_score = parse_env("MIZAN_MIN_SCORE", config.min_score)?;
        config.memory.window_size = parse_env("MIZAN_MEMORY_WINDOW", config.memory.window_size)?;
        config.memory.enabled = parse_env("MIZAN_MEMORY_ENABLED", config.memory.enabled)?;

        config.log_level = std::env::var("RUST_LOG").ok().or(config.log_level);
        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &PathBuf) -> EngineResult<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            EngineError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        if let Some(llm) = file.llm {
            if let Some(provider) = llm.provider {
                self.provider = provider;
            }
            if llm.model.is_some() {
                self.model = llm.model;
            }
            if llm.fallback_model.is_some() {
                self.fallback_model = llm.fallback_model;
            }
            if llm.endpoint.is_some() {
                self.endpoint = llm.endpoint;
            }
            if let Some(temperature) = llm.temperature {
                self.temperature = temperature;
            }
            if let Some(timeout) = llm.timeout_secs {
                self.timeout_secs = timeout;
            }
        }

        if let Some(retrieval) = file.retrieval {
            if let Some(top_k) = retrieval.top_k {
                self.top_k = top_k;
            }
            if let Some(max_sources) = retrieval.max_sources {
                self.max_sources = max_sources;
            }
            if let Some(min_score) = retrieval.min_score {
                self.min_score = min_score;
            }
            if let Some(url) = retrieval.store_url {
                self.chunk_store_url = url;
            }
        }

        if let Some(memory) = file.memory {
            if let Some(enabled) = memory.enabled {
                self.memory.enabled = enabled;
            }
            if let Some(window_size) = memory.window_size {
                self.memory.window_size = window_size;
            }
        }

        if let Some(logging) = file.logging {
            if logging.level.is_some() {
                self.log_level = logging.level;
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
        }

        Ok(())
    }

    /// Apply CLI overrides, giving flags precedence over everything else.
    pub fn with_overrides(
        mut self,
        provider: Option<String>,
        model: Option<String>,
        store_url: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(provider) = provider {
            self.provider = provider;
        }
        if model.is_some() {
            self.model = model;
        }
        if let Some(url) = store_url {
            self.chunk_store_url = url;
        }
        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }
        if verbose && self.log_level.is_none() {
            self.log_level = Some("debug".to_string());
        }
        if no_color {
            self.no_color = true;
        }
        self
    }

    /// Resolve the API key for the active provider.
    ///
    /// `MIZAN_API_KEY` (or the explicit config value) wins; otherwise the
    /// provider's conventional variable is consulted (`GROQ_API_KEY`,
    /// `OPENAI_API_KEY`).
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }
        let env_var = match self.provider.as_str() {
            "groq" => "GROQ_API_KEY",
            "openai" => "OPENAI_API_KEY",
            _ => return None,
        };
        std::env::var(env_var).ok()
    }

    /// Validate configuration for the active provider.
    pub fn validate(&self) -> EngineResult<()> {
        if !KNOWN_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(EngineError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(EngineError::Config(format!(
                "Temperature must be within 0.0-2.0, got {}",
                self.temperature
            )));
        }

        if self.top_k == 0 {
            return Err(EngineError::Config(
                "topK must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Parse an environment variable, falling back to a default when unset.
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> EngineResult<T> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| EngineError::Config(format!("Invalid value for {}: {}", name, raw))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.provider, "groq");
        // Unset model choices defer to the provider's defaults
        assert_eq!(config.model, None);
        assert_eq!(config.fallback_model, None);
        assert_eq!(config.memory.window_size, 5);
        assert!(config.memory.enabled);
        assert_eq!(config.top_k, 10);
    }

    #[test]
    fn test_with_overrides() {
        let config = EngineConfig::default().with_overrides(
            Some("openai".to_string()),
            Some("gpt-4o-mini".to_string()),
            None,
            None,
            true,
            true,
        );
        assert_eq!(config.provider, "openai");
        assert_eq!(config.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(config.log_level, Some("debug".to_string()));
        assert!(config.no_color);
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = EngineConfig::default();
        config.provider = "claude".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_temperature_range() {
        let mut config = EngineConfig::default();
        config.temperature = 3.5;
        assert!(config.validate().is_err());
        config.temperature = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_merge_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "llm:\n  provider: openai\n  model: gpt-4o-mini\n  temperature: 0.7\n\
             retrieval:\n  topK: 6\n  storeUrl: http://store:9000\n\
             memory:\n  windowSize: 10\n"
        )
        .unwrap();

        let mut config = EngineConfig::default();
        config.merge_yaml(&file.path().to_path_buf()).unwrap();

        assert_eq!(config.provider, "openai");
        assert_eq!(config.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.top_k, 6);
        assert_eq!(config.chunk_store_url, "http://store:9000");
        assert_eq!(config.memory.window_size, 10);
        // Untouched fields keep their defaults
        assert_eq!(config.max_sources, 5);
    }

    #[test]
    fn test_merge_yaml_bad_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "llm: [not, a, mapping").unwrap();

        let mut config = EngineConfig::default();
        assert!(config.merge_yaml(&file.path().to_path_buf()).is_err());
    }
}
