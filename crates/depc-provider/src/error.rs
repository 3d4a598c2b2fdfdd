//! Error types for container providers

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Failed to connect to container runtime: {0}")]
    ConnectionError(String),

    #[error("Container not found: {0}")]
    ContainerNotFound(String),

    #[error("Image not found: {0}")]
    ImageNotFound(String),

    #[error("Container create failed: {0}")]
    CreateError(String),

    #[error("Container runtime error: {0}")]
    RuntimeError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Timeout waiting for operation")]
    Timeout,

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl From<bollard::errors::Error> for ProviderError {
    fn from(e: bollard::errors::Error) -> Self {
        match e {
            bollard::errors::Error::DockerResponseServerError {
                status_code: 404,
                message,
            } => ProviderError::ContainerNotFound(message),
            other => ProviderError::RuntimeError(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;
