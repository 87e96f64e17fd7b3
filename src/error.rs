use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid config `{field}`: {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: String,
    },

    #[error("Config IO Error: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("Config Format Error: {0}")]
    ConfigFormat(#[from] serde_json::Error),

    #[error("Depth map shape mismatch: expected {expected:?}, got {actual:?}")]
    DepthShape {
        expected: (usize, usize),
        actual: (usize, usize),
    },
}

impl Error {
    pub(crate) fn config(field: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}
