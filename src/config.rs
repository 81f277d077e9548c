use std::env;

use crate::error::ConfigError;
use crate::types::{Credential, TaskSpec, DEFAULT_AGENT};

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const BASE_URL_VAR: &str = "GEMINI_API_BASE_URL";
pub const AGENT_VAR: &str = "DEEP_RESEARCH_AGENT";

/// Settings read once at process start.
#[derive(Debug, Clone)]
pub struct Config {
    pub credential: Credential,
    /// Overrides the public API endpoint when set.
    pub base_url: Option<String>,
    pub agent: String,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// Call `dotenvy::dotenv()` first if a `.env` file should be honoured.
    ///
    /// # Errors
    ///
    /// - `ConfigError::MissingCredential` if `GEMINI_API_KEY` is unset or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let credential = non_empty(API_KEY_VAR)
            .map(Credential::new)
            .ok_or(ConfigError::MissingCredential)?;

        Ok(Self {
            credential,
            base_url: non_empty(BASE_URL_VAR),
            agent: non_empty(AGENT_VAR).unwrap_or_else(|| DEFAULT_AGENT.to_string()),
        })
    }

    /// Builds the task for `query` using the configured agent.
    pub fn task_spec(&self, query: impl Into<String>) -> TaskSpec {
        TaskSpec::new(query).with_agent(self.agent.clone())
    }
}
