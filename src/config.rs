use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::errors::DocChatError;

/// Environment prefix for overrides, e.g. `DOCCHAT__LLM__LLM_KEY`.
pub const ENV_PREFIX: &str = "DOCCHAT";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Permissive CORS for browser frontends on another origin
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8888,
            cors: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub backtrace: bool,
    pub dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            backtrace: false,
            dir: PathBuf::from("logs"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_endpoint")]
    pub llm_endpoint: String,
    #[serde(default)]
    pub llm_key: String,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    #[serde(default = "default_chat_temperature")]
    pub temperature: f32,
    /// Optional system message placed ahead of the conversation
    #[serde(default)]
    pub system_prompt: Option<String>,
}

fn default_llm_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-3.5-turbo-0125".to_string()
}

const fn default_chat_temperature() -> f32 {
    0.7
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            llm_endpoint: default_llm_endpoint(),
            llm_key: String::new(),
            llm_model: default_llm_model(),
            temperature: default_chat_temperature(),
            system_prompt: None,
        }
    }
}

/// Parameters for the query-rewrite call of the multi-query retriever.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryGenerationConfig {
    /// Falls back to `llm.llm_model` when unset
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    /// Upper bound on reformulations kept from the model output
    pub max_queries: usize,
    /// Also search with the user's original question
    pub include_original: bool,
    /// Concurrent vector searches during fan-out
    pub concurrency: usize,
}

impl Default for QueryGenerationConfig {
    fn default() -> Self {
        Self {
            model: None,
            temperature: 0.0,
            max_tokens: 800,
            top_p: 0.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            max_queries: 5,
            include_original: false,
            concurrency: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMode {
    /// Return the indexed chunks themselves
    #[default]
    Vector,
    /// Search child chunks, return their parent documents from the docstore
    Parent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub mode: RetrievalMode,
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            mode: RetrievalMode::Vector,
            top_k: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingsConfig {
    /// Falls back to `llm.llm_endpoint` when unset
    pub endpoint: Option<String>,
    /// Falls back to `llm.llm_key` when unset
    pub api_key: Option<String>,
    pub model: String,
    pub batch_size: usize,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            model: "text-embedding-ada-002".to_string(),
            // one text per request
            batch_size: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub persist_dir: PathBuf,
    /// Character budget for chunks indexed in vector mode and for parents in parent mode
    pub chunk_size: usize,
    /// Character budget for the child chunks indexed in parent mode
    pub child_chunk_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            persist_dir: PathBuf::from("./chroma_db"),
            chunk_size: 2000,
            child_chunk_size: 400,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub query_generation: QueryGenerationConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.apply_key_fallbacks(std::env::var("OPENAI_API_KEY").ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default config file path, with environment overrides
    pub fn load() -> crate::Result<Self> {
        // Try config.toml first, then fall back to config.example.toml
        if Path::new("config.toml").exists() {
            Self::load_from(Some(Path::new("config.toml")))
        } else if Path::new("config.example.toml").exists() {
            tracing::warn!(
                "Using config.example.toml. Please create config.toml for production use."
            );
            Self::load_from(Some(Path::new("config.example.toml")))
        } else {
            Self::load_from(None)
        }
    }

    /// Layer an optional TOML file under `DOCCHAT__*` environment variables
    pub fn load_from(path: Option<&Path>) -> crate::Result<Self> {
        Self::load_layered(path, ENV_PREFIX, std::env::var("OPENAI_API_KEY").ok())
    }

    pub(crate) fn load_layered(
        path: Option<&Path>,
        env_prefix: &str,
        openai_key: Option<String>,
    ) -> crate::Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(
                ::config::File::from(path)
                    .format(::config::FileFormat::Toml)
                    .required(true),
            );
        }
        let mut config: Self = builder
            .add_source(
                ::config::Environment::with_prefix(env_prefix)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.apply_key_fallbacks(openai_key);
        config.validate()?;
        Ok(config)
    }

    /// Fill empty API keys from the conventional `OPENAI_API_KEY` variable.
    ///
    /// A blank `embeddings.api_key` counts as unset and falls back too.
    pub fn apply_key_fallbacks(&mut self, openai_key: Option<String>) {
        self.embeddings.api_key = self.embeddings.api_key.take().filter(|k| !k.trim().is_empty());
        if let Some(key) = openai_key.filter(|k| !k.is_empty()) {
            if self.llm.llm_key.is_empty() {
                self.llm.llm_key = key;
            }
        }
    }

    /// Reject endpoints that are not absolute URLs and zero-sized bounds
    pub fn validate(&self) -> crate::Result<()> {
        url::Url::parse(self.llm_endpoint()).map_err(|e| {
            DocChatError::ConfigError(format!("llm.llm_endpoint '{}': {e}", self.llm_endpoint()))
        })?;
        url::Url::parse(self.embedding_endpoint()).map_err(|e| {
            DocChatError::ConfigError(format!(
                "embeddings.endpoint '{}': {e}",
                self.embedding_endpoint()
            ))
        })?;
        if self.query_generation.max_queries == 0 {
            return Err(DocChatError::ConfigError(
                "query_generation.max_queries must be at least 1".to_string(),
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(DocChatError::ConfigError(
                "retrieval.top_k must be at least 1".to_string(),
            ));
        }
        if self.store.chunk_size == 0 || self.store.child_chunk_size == 0 {
            return Err(DocChatError::ConfigError(
                "store chunk sizes must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Get server bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Get LLM endpoint
    pub fn llm_endpoint(&self) -> &str {
        &self.llm.llm_endpoint
    }

    /// Get LLM key
    pub fn llm_key(&self) -> &str {
        &self.llm.llm_key
    }

    /// Get LLM model
    pub fn llm_model(&self) -> &str {
        &self.llm.llm_model
    }

    /// Get the model used for query rewriting
    pub fn query_model(&self) -> &str {
        self.query_generation
            .model
            .as_deref()
            .unwrap_or(&self.llm.llm_model)
    }

    /// Get embedding endpoint
    pub fn embedding_endpoint(&self) -> &str {
        self.embeddings
            .endpoint
            .as_deref()
            .unwrap_or(&self.llm.llm_endpoint)
    }

    /// Get embedding API key
    pub fn embedding_key(&self) -> &str {
        self.embeddings
            .api_key
            .as_deref()
            .unwrap_or(&self.llm.llm_key)
    }

    /// Get embedding model name
    pub fn embedding_model(&self) -> &str {
        &self.embeddings.model
    }

    pub fn persist_dir(&self) -> &Path {
        &self.store.persist_dir
    }
}
