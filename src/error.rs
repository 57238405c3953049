use thiserror::Error;

/// Skiff-specific error types
#[derive(Error, Debug)]
pub enum SkiffError {
    #[error("Runtime gateway error: {message}")]
    Gateway { message: String },

    #[error("Container not found: {name}")]
    ContainerNotFound { name: String },

    #[error("Container {name} has no network address")]
    NoAddress { name: String },

    #[error("Number {value} is too large. Only numbers up to 999 are supported")]
    OutOfRange { value: u64 },

    #[error("Name prefix must not be empty")]
    InvalidPrefix,
}

impl SkiffError {
    pub fn gateway(message: impl Into<String>) -> Self {
        SkiffError::Gateway {
            message: message.into(),
        }
    }
}

impl From<bollard::errors::Error> for SkiffError {
    fn from(err: bollard::errors::Error) -> Self {
        SkiffError::gateway(err.to_string())
    }
}

/// Convenience type alias for Skiff results
pub type Result<T, E = SkiffError> = std::result::Result<T, E>;
