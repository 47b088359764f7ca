//! Configuration management for the FAQ assistant.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config file (.faqbot/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! Credentials are resolved once, at load time, into the settings structs.
//! Nothing below this layer reads the process environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::logging::LogFormat;

/// Name of the per-workspace state directory.
pub const STATE_DIR: &str = ".faqbot";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .faqbot/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Log line format
    pub log_format: LogFormat,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Generation provider settings
    pub llm: LlmSettings,

    /// Embedding provider settings
    pub embedding: EmbeddingSettings,

    /// Vector store and ingestion settings
    pub store: StoreSettings,

    /// Web fallback search settings
    pub search: SearchSettings,

    /// Orchestrator settings
    pub bot: BotSettings,
}

/// Generation provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Provider name ("ollama", "openai", or its "vllm" alias)
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Custom endpoint (e.g. a vLLM server for "openai")
    pub endpoint: Option<String>,

    /// Environment variable holding the API key
    #[serde(rename = "apiKeyEnv")]
    pub api_key_env: Option<String>,

    /// Resolved API key
    #[serde(skip)]
    pub api_key: Option<String>,

    /// Sampling temperature
    pub temperature: f32,

    /// Request timeout in seconds
    #[serde(rename = "timeoutSecs")]
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "llama3.2".to_string(),
            endpoint: None,
            api_key_env: Some("FAQBOT_LLM_API_KEY".to_string()),
            api_key: None,
            temperature: 0.5,
            timeout_secs: 120,
        }
    }
}

/// Embedding provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Provider name ("mock", "ollama", "openai")
    pub provider: String,

    /// Embedding model identifier
    pub model: String,

    /// Custom endpoint
    pub endpoint: Option<String>,

    /// Embedding vector dimension
    pub dimensions: usize,

    /// Environment variable holding the API key
    #[serde(rename = "apiKeyEnv")]
    pub api_key_env: Option<String>,

    /// Resolved API key
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "nomic-embed-text".to_string(),
            endpoint: None,
            dimensions: 768,
            api_key_env: Some("OPENAI_API_KEY".to_string()),
            api_key: None,
        }
    }
}

/// Vector store and ingestion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Store directory (relative paths resolve against the workspace)
    pub path: PathBuf,

    /// Line-oriented sources file used by ingestion
    #[serde(rename = "sourcesFile")]
    pub sources_file: PathBuf,

    /// Chunk size in characters
    #[serde(rename = "chunkSize")]
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    #[serde(rename = "chunkOverlap")]
    pub chunk_overlap: usize,

    /// Number of chunks retrieved per question
    #[serde(rename = "topK")]
    pub top_k: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from(STATE_DIR).join("store"),
            sources_file: PathBuf::from("sources.txt"),
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 3,
        }
    }
}

/// Web fallback search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Environment variable holding the search API key
    #[serde(rename = "apiKeyEnv")]
    pub api_key_env: String,

    /// Resolved search API key
    #[serde(skip)]
    pub api_key: Option<String>,

    /// Search API endpoint
    pub endpoint: String,

    /// Keyword appended to queries that do not already mention it
    #[serde(rename = "domainKeyword")]
    pub domain_keyword: String,

    /// Allow-list for the domain relevance filter (case-insensitive substrings)
    #[serde(rename = "relevanceKeywords")]
    pub relevance_keywords: Vec<String>,

    /// Country code for geo-targeting
    pub country: String,

    /// Location name for geo-targeting
    pub location: String,

    /// Interface language
    pub language: String,

    /// Number of snippets to collect
    #[serde(rename = "numResults")]
    pub num_results: usize,

    /// Per-page fetch timeout in seconds
    #[serde(rename = "fetchTimeoutSecs")]
    pub fetch_timeout_secs: u64,

    /// Maximum characters kept per fetched page
    #[serde(rename = "maxSnippetChars")]
    pub max_snippet_chars: usize,

    /// Maximum number of page fetches in flight
    #[serde(rename = "fetchConcurrency")]
    pub fetch_concurrency: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            api_key_env: "SERPAPI_API_KEY".to_string(),
            api_key: None,
            endpoint: "https://serpapi.com/search.json".to_string(),
            domain_keyword: "cmu-africa".to_string(),
            relevance_keywords: vec![
                "rwanda".to_string(),
                "kigali".to_string(),
                "rw".to_string(),
                "cmu-africa".to_string(),
            ],
            country: "rw".to_string(),
            location: "Rwanda".to_string(),
            language: "en".to_string(),
            num_results: 3,
            fetch_timeout_secs: 10,
            max_snippet_chars: 2000,
            fetch_concurrency: 4,
        }
    }
}

/// Orchestrator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotSettings {
    /// Prompt template used by the default chain
    pub prompt: String,

    /// Conversation memory policy ("window", "buffer")
    #[serde(rename = "memoryType")]
    pub memory_type: String,

    /// Number of turns retained by the window policy
    #[serde(rename = "memoryWindow")]
    pub memory_window: usize,

    /// Optional deadline for a whole question, in seconds
    #[serde(rename = "askTimeoutSecs")]
    pub ask_timeout_secs: Option<u64>,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            prompt: "strict".to_string(),
            memory_type: "window".to_string(),
            memory_window: 5,
            ask_timeout_secs: None,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    llm: Option<LlmSettings>,
    embedding: Option<EmbeddingSettings>,
    store: Option<StoreSettings>,
    search: Option<SearchSettings>,
    bot: Option<BotSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    format: Option<LogFormat>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            log_format: LogFormat::default(),
            verbose: false,
            no_color: false,
            llm: LlmSettings::default(),
            embedding: EmbeddingSettings::default(),
            store: StoreSettings::default(),
            search: SearchSettings::default(),
            bot: BotSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML config file and environment.
    ///
    /// Environment variables:
    /// - `FAQBOT_WORKSPACE`: Override workspace path
    /// - `FAQBOT_CONFIG`: Path to config file
    /// - `FAQBOT_PROVIDER`: Generation provider
    /// - `FAQBOT_MODEL`: Model identifier
    /// - `FAQBOT_ENDPOINT`: Generation endpoint
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// API keys are read from the variables named by each section's
    /// `apiKeyEnv` entry.
    ///
    /// # Example
    /// ```no_run
    /// use faqbot_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Store: {:?}", config.store_path());
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Load configuration with an explicit workspace and config file.
    ///
    /// Either argument, when given, takes precedence over `FAQBOT_WORKSPACE`
    /// and `FAQBOT_CONFIG` so the config file is read from the right place.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) =
            workspace.or_else(|| std::env::var("FAQBOT_WORKSPACE").ok().map(PathBuf::from))
        {
            config.workspace = workspace;
        }

        if let Some(config_file) =
            config_file.or_else(|| std::env::var("FAQBOT_CONFIG").ok().map(PathBuf::from))
        {
            config.config_file = Some(config_file);
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.state_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("FAQBOT_PROVIDER") {
            config.llm.provider = provider;
        }

        if let Ok(model) = std::env::var("FAQBOT_MODEL") {
            config.llm.model = model;
        }

        if let Ok(endpoint) = std::env::var("FAQBOT_ENDPOINT") {
            config.llm.endpoint = Some(endpoint);
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        config.resolve_secrets(|name| std::env::var(name).ok());

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(ws) = config_file.workspace {
            if let Some(path) = ws.path {
                result.workspace = PathBuf::from(path);
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(format) = logging.format {
                result.log_format = format;
            }
        }

        if let Some(llm) = config_file.llm {
            result.llm = llm;
        }
        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }
        if let Some(store) = config_file.store {
            result.store = store;
        }
        if let Some(search) = config_file.search {
            result.search = search;
        }
        if let Some(bot) = config_file.bot {
            result.bot = bot;
        }

        tracing::debug!("Merged configuration from {:?}", path);

        Ok(result)
    }

    /// Resolve API keys from the variables named in the settings.
    ///
    /// The lookup is injected so tests can resolve without touching the
    /// process environment.
    pub fn resolve_secrets<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ref var) = self.llm.api_key_env {
            self.llm.api_key = lookup(var);
        }
        if let Some(ref var) = self.embedding.api_key_env {
            self.embedding.api_key = lookup(var);
        }
        self.search.api_key = lookup(&self.search.api_key_env);

        if self.search.api_key.is_none() {
            tracing::debug!(
                "No search API key in {}; web fallback will be unavailable",
                self.search.api_key_env
            );
        }
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Flags take precedence over environment variables and the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.llm.provider = provider;
        }

        if let Some(model) = model {
            self.llm.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .faqbot directory.
    pub fn state_dir(&self) -> PathBuf {
        self.workspace.join(STATE_DIR)
    }

    /// Ensure the .faqbot directory exists.
    pub fn ensure_state_dir(&self) -> AppResult<()> {
        let state_dir = self.state_dir();
        if !state_dir.exists() {
            std::fs::create_dir_all(&state_dir).map_err(|e| {
                AppError::Config(format!("Failed to create {} directory: {}", STATE_DIR, e))
            })?;
        }
        Ok(())
    }

    /// Directory holding custom prompt definitions.
    pub fn prompts_dir(&self) -> PathBuf {
        self.state_dir().join("prompts")
    }

    /// Resolved vector store directory.
    pub fn store_path(&self) -> PathBuf {
        self.resolve(&self.store.path)
    }

    /// Resolved sources file path.
    pub fn sources_path(&self) -> PathBuf {
        self.resolve(&self.store.sources_file)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// Validate provider names and bot settings.
    pub fn validate(&self) -> AppResult<()> {
        let known_llm = ["ollama", "openai", "vllm"];
        if !known_llm.contains(&self.llm.provider.to_lowercase().as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.llm.provider,
                known_llm.join(", ")
            )));
        }

        let openai_compatible = matches!(self.llm.provider.to_lowercase().as_str(), "openai" | "vllm");
        if openai_compatible && self.llm.api_key.is_none() {
            return Err(AppError::Config(format!(
                "API key not found in environment variable: {}",
                self.llm.api_key_env.as_deref().unwrap_or("<unset>")
            )));
        }

        let known_embedding = ["mock", "ollama", "openai"];
        if !known_embedding.contains(&self.embedding.provider.to_lowercase().as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                known_embedding.join(", ")
            )));
        }

        let known_memory = ["window", "buffer"];
        if !known_memory.contains(&self.bot.memory_type.to_lowercase().as_str()) {
            return Err(AppError::Config(format!(
                "Unknown memory type: {}. Supported: {}",
                self.bot.memory_type,
                known_memory.join(", ")
            )));
        }

        if self.search.num_results == 0 {
            return Err(AppError::Config(
                "search.numResults must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.llm.provider, "ollama");
        assert_eq!(config.store.top_k, 3);
        assert_eq!(config.search.num_results, 3);
        assert_eq!(config.search.max_snippet_chars, 2000);
        assert_eq!(config.bot.memory_type, "window");
        assert!(!config.verbose);
    }

    #[test]
    fn test_load_from_explicit_workspace() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join(STATE_DIR)).unwrap();
        std::fs::write(
            temp.path().join(STATE_DIR).join("config.yaml"),
            "bot:\n  prompt: concise\n  memoryWindow: 2\n",
        )
        .unwrap();

        let config = AppConfig::load_from(Some(temp.path().to_path_buf()), None).unwrap();
        assert_eq!(config.workspace, temp.path());
        assert_eq!(config.bot.prompt, "concise");
        assert_eq!(config.bot.memory_window, 2);
        assert_eq!(config.bot.memory_type, "window");
    }

    #[test]
    fn test_load_from_missing_workspace_fails() {
        let temp = TempDir::new().unwrap();
        assert!(AppConfig::load_from(Some(temp.path().join("gone")), None).is_err());
    }

    #[test]
    fn test_state_dir() {
        let config = AppConfig::default();
        assert!(config.state_dir().ends_with(".faqbot"));
    }

    #[test]
    fn test_store_path_resolves_against_workspace() {
        let mut config = AppConfig::default();
        config.workspace = PathBuf::from("/srv/faq");
        assert_eq!(config.store_path(), PathBuf::from("/srv/faq/.faqbot/store"));

        config.store.path = PathBuf::from("/var/index");
        assert_eq!(config.store_path(), PathBuf::from("/var/index"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            None,
            Some("openai".to_string()),
            Some("mistral-7b".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.llm.provider, "openai");
        assert_eq!(overridden.llm.model, "mistral-7b");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml_sections() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
logging:
  level: warn
  format: json
llm:
  provider: openai
  model: meta-llama/Llama-3.1-8B-Instruct
  endpoint: http://localhost:8000
search:
  domainKeyword: example-university
  relevanceKeywords: [campus, example]
bot:
  prompt: concise
  memoryWindow: 2
"#,
        )
        .unwrap();

        let merged = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(merged.log_level, Some("warn".to_string()));
        assert_eq!(merged.log_format, LogFormat::Json);
        assert_eq!(merged.llm.provider, "openai");
        assert_eq!(merged.llm.endpoint.as_deref(), Some("http://localhost:8000"));
        // Unspecified fields inside a section keep their defaults
        assert_eq!(merged.llm.temperature, 0.5);
        assert_eq!(merged.search.domain_keyword, "example-university");
        assert_eq!(merged.search.relevance_keywords, vec!["campus", "example"]);
        assert_eq!(merged.search.num_results, 3);
        assert_eq!(merged.bot.prompt, "concise");
        assert_eq!(merged.bot.memory_window, 2);
        assert_eq!(merged.bot.memory_type, "window");
    }

    #[test]
    fn test_merge_yaml_invalid() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "llm: [not, a, map").unwrap();
        assert!(AppConfig::default().merge_yaml(&path).is_err());
    }

    #[test]
    fn test_resolve_secrets() {
        let env: HashMap<&str, &str> = [("SERPAPI_API_KEY", "serp-123")].into_iter().collect();
        let mut config = AppConfig::default();
        config.resolve_secrets(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.search.api_key.as_deref(), Some("serp-123"));
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.llm.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_openai_requires_key() {
        let mut config = AppConfig::default();
        config.llm.provider = "openai".to_string();
        assert!(config.validate().is_err());

        config.llm.api_key = Some("token".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_memory_type() {
        let mut config = AppConfig::default();
        config.bot.memory_type = "summary".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ollama() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }
}
