//! Error types for resource and network controllers

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Failed to connect to container runtime: {0}")]
    ConnectionError(String),

    #[error("Container not found: {0}")]
    ContainerNotFound(String),

    #[error("Image not found: {0}")]
    ImageNotFound(String),

    #[error("Build failed: {0}")]
    BuildError(String),

    #[error("Container runtime error: {0}")]
    RuntimeError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Docker API error: {0}")]
    Docker(#[from] bollard::errors::Error),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl ProviderError {
    /// True when the Docker daemon answered 404 for the requested object
    pub fn is_not_found(&self) -> bool {
        match self {
            ProviderError::ContainerNotFound(_) | ProviderError::ImageNotFound(_) => true,
            ProviderError::Docker(bollard::errors::Error::DockerResponseServerError {
                status_code,
                ..
            }) => *status_code == 404,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_detection() {
        let err = ProviderError::Docker(bollard::errors::Error::DockerResponseServerError {
            status_code: 404,
            message: "No such container".to_string(),
        });
        assert!(err.is_not_found());

        let err = ProviderError::Docker(bollard::errors::Error::DockerResponseServerError {
            status_code: 500,
            message: "boom".to_string(),
        });
        assert!(!err.is_not_found());
        assert!(ProviderError::ContainerNotFound("x".into()).is_not_found());
        assert!(!ProviderError::RuntimeError("x".into()).is_not_found());
    }
}
