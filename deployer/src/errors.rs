//! Error types for the deployment orchestrator

use thiserror::Error;

/// Main error type for the deployment orchestrator
#[derive(Error, Debug)]
pub enum DeployerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Domain error: {0}")]
    DomainError(String),

    #[error("Materialize error: {0}")]
    MaterializeError(String),

    #[error("Proxy config error: {0}")]
    ProxyConfigError(String),

    #[error("Certificate error: {0}")]
    CertError(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Rollback error: {0}")]
    RollbackError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for DeployerError {
    fn from(err: anyhow::Error) -> Self {
        DeployerError::Internal(err.to_string())
    }
}
