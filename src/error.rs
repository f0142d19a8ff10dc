use thiserror::Error;

#[derive(Error, Debug)]
pub enum LingoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Transport failure or timeout while talking to a provider
    #[error("{provider} network error: {message}")]
    ProviderNetwork { provider: String, message: String },

    /// Provider answered, but not with a usable translation
    #[error("{provider} response error: {message}")]
    ProviderResponse { provider: String, message: String },

    #[error("All translation providers failed: {}", .0.join("; "))]
    AllProvidersFailed(Vec<String>),

    #[error("No translation providers configured")]
    NoProvidersConfigured,

    #[error("Unknown translation provider: {0}")]
    UnknownProvider(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl LingoError {
    pub fn network(provider: &str, message: impl Into<String>) -> Self {
        Self::ProviderNetwork {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    pub fn response(provider: &str, message: impl Into<String>) -> Self {
        Self::ProviderResponse {
            provider: provider.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LingoError>;
