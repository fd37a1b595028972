//! Error types for dockwatch-core

use dockwatch_provider::ProviderError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{step} failed: {source}")]
    Operation { step: String, source: ProviderError },

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Config error: {0}")]
    Config(#[from] dockwatch_config::ConfigError),
}

impl CoreError {
    pub(crate) fn operation(step: impl ToString, source: ProviderError) -> Self {
        CoreError::Operation {
            step: step.to_string(),
            source,
        }
    }

    /// Name of the failed step, for operation errors
    pub fn step(&self) -> Option<&str> {
        match self {
            CoreError::Operation { step, .. } => Some(step),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
