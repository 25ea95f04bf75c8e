use crate::errors::{to_env_var, ConfigError};
use config::{Config, Environment};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

pub const DEFAULT_AGENT_ID: &str = "45df3b25-b49b-464f-b45e-894b994266bb";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Everything needed to form the outbound agent request.
///
/// Only `base_url` is required. It is read from `MAPS_AGENT_BASE_URL`; the other
/// keys follow the same `MAPS_AGENT_` naming if they need overriding.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub base_url: String,
    #[serde(default = "default_agent_id")]
    pub agent_id: String,
    #[serde(default = "default_require_credential")]
    pub require_credential: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    /// Settings with every default applied, for embedding without the environment.
    pub fn with_base_url<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into(),
            agent_id: default_agent_id(),
            require_credential: default_require_credential(),
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn agent_id<S: Into<String>>(mut self, agent_id: S) -> Self {
        self.agent_id = agent_id.into();
        self
    }

    pub fn require_credential(mut self, required: bool) -> Self {
        self.require_credential = required;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// The single fixed endpoint every query is posted to.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/agent/{}/invoke",
            self.base_url.trim_end_matches('/'),
            self.agent_id
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: format!("unsupported scheme {}", scheme),
            }),
        }
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("agent_id", default_agent_id())?
            .set_default("require_credential", default_require_credential())?
            .set_default("timeout_secs", default_timeout_secs())?
            .add_source(
                Environment::with_prefix("MAPS_AGENT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let result: Result<Self, config::ConfigError> = config.try_deserialize();

        let settings = match result {
            Ok(settings) => settings,
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                let error_str = err.to_string();
                if error_str.starts_with("missing field") {
                    let field = error_str
                        .trim_start_matches("missing field `")
                        .trim_end_matches('`');
                    return Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    });
                } else if let config::ConfigError::NotFound(field) = &err {
                    return Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    });
                }
                return Err(ConfigError::Other(err));
            }
        };

        settings.validate()?;
        Ok(settings)
    }
}

fn default_agent_id() -> String {
    DEFAULT_AGENT_ID.to_string()
}

fn default_require_credential() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
