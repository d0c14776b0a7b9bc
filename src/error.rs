use thiserror::Error;

#[derive(Debug, Error)]
pub enum StylingError {
    /// A browser global the styling needs is missing (no window, document, head or body).
    #[error("host API unavailable: {0}")]
    HostUnavailable(&'static str),

    /// A DOM call threw.
    #[error("DOM operation failed: {0}")]
    Dom(String),

    /// The host handed over a value of the wrong shape.
    #[error("unexpected value from host: {0}")]
    HostValue(String),

    /// The persisted settings document could not be read.
    #[error("invalid settings data: {0}")]
    Settings(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StylingError>;
