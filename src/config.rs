use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the Ragserve server.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Base URL of the blob storage account holding source documents.
    pub blob_account_url: String,
    /// Name of the blob container to ingest.
    pub blob_container: String,
    /// Optional SAS token granting read/list access to the container.
    pub blob_sas_token: Option<String>,
    /// Base URL of the Qdrant instance that stores embeddings.
    pub qdrant_url: String,
    /// Name of the Qdrant collection used for chunk storage.
    pub qdrant_collection_name: String,
    /// Optional API key required to access Qdrant.
    pub qdrant_api_key: Option<String>,
    /// Base URL of the Ollama runtime serving embeddings and generation.
    pub ollama_url: String,
    /// Embedding model identifier passed to the provider.
    pub embedding_model: String,
    /// Dimensionality of the produced vectors.
    pub embedding_dimension: usize,
    /// Generation model identifier used for answer synthesis.
    pub generation_model: String,
    /// Maximum tokens the generator may produce per answer.
    pub generation_max_tokens: u32,
    /// Sampling temperature for answer generation.
    pub generation_temperature: f32,
    /// Nucleus sampling bound for answer generation.
    pub generation_top_p: f32,
    /// Character window applied when splitting documents into chunks.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks of a document.
    pub chunk_overlap: usize,
    /// Number of chunks retrieved per question.
    pub search_top_k: usize,
    /// Optional minimum similarity score for retrieved chunks.
    pub search_score_threshold: Option<f32>,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

const DEFAULT_CHUNK_SIZE: usize = 1000;
const DEFAULT_CHUNK_OVERLAP: usize = 150;
const DEFAULT_SEARCH_TOP_K: usize = 5;
const DEFAULT_SCORE_THRESHOLD: f32 = 0.5;
const DEFAULT_MAX_TOKENS: u32 = 1000;
const DEFAULT_TEMPERATURE: f32 = 0.3;
const DEFAULT_TOP_P: f32 = 0.9;

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            blob_account_url: load_env("BLOB_ACCOUNT_URL")?,
            blob_container: load_env("BLOB_CONTAINER")?,
            blob_sas_token: load_env_optional("BLOB_SAS_TOKEN"),
            qdrant_url: load_env("QDRANT_URL")?,
            qdrant_collection_name: load_env("QDRANT_COLLECTION_NAME")?,
            qdrant_api_key: load_env_optional("QDRANT_API_KEY"),
            ollama_url: load_env("OLLAMA_URL")?,
            embedding_model: load_env("EMBEDDING_MODEL")?,
            embedding_dimension: load_env("EMBEDDING_DIMENSION")?
                .parse()
                .map_err(|_| ConfigError::InvalidValue("EMBEDDING_DIMENSION".to_string()))?,
            generation_model: load_env("GENERATION_MODEL")?,
            generation_max_tokens: parse_env_or("GENERATION_MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
            generation_temperature: parse_env_or("GENERATION_TEMPERATURE", DEFAULT_TEMPERATURE)?,
            generation_top_p: parse_env_or("GENERATION_TOP_P", DEFAULT_TOP_P)?,
            chunk_size: parse_env_or("CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?,
            chunk_overlap: parse_env_or("CHUNK_OVERLAP", DEFAULT_CHUNK_OVERLAP)?,
            search_top_k: parse_env_or("SEARCH_TOP_K", DEFAULT_SEARCH_TOP_K)?,
            search_score_threshold: load_score_threshold()?,
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match load_env_optional(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// `SEARCH_SCORE_THRESHOLD=none` disables threshold mode entirely.
fn load_score_threshold() -> Result<Option<f32>, ConfigError> {
    match load_env_optional("SEARCH_SCORE_THRESHOLD") {
        None => Ok(Some(DEFAULT_SCORE_THRESHOLD)),
        Some(value) if value.eq_ignore_ascii_case("none") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue("SEARCH_SCORE_THRESHOLD".to_string())),
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        blob_account = %config.blob_account_url,
        container = %config.blob_container,
        qdrant_url = %config.qdrant_url,
        collection = %config.qdrant_collection_name,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
