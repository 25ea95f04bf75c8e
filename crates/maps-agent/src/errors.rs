use thiserror::Error;

/// Why a single submission failed. None of these leave the dispatcher unusable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("{message}")]
    Remote {
        status: u16,
        message: String,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl DispatchError {
    pub fn remote<S: Into<String>>(status: u16, message: S) -> Self {
        DispatchError::Remote {
            status,
            message: message.into(),
        }
    }

    /// Short label for the kind of failure, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::Validation(_) => "validation",
            DispatchError::Auth(_) => "auth",
            DispatchError::Network(_) => "network",
            DispatchError::Remote { .. } => "remote",
            DispatchError::MalformedResponse(_) => "malformed_response",
        }
    }
}

impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DispatchError::Network(format!("request timed out: {}", err))
        } else {
            DispatchError::Network(err.to_string())
        }
    }
}

pub type DispatchResult<T> = Result<T, DispatchError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },

    #[error("Invalid base url {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// Map a settings key such as `base_url` to the variable that sets it.
pub fn to_env_var(field: &str) -> String {
    format!("MAPS_AGENT_{}", field.to_uppercase().replace('.', "__"))
}
