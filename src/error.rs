pub type GlitchResult<T> = Result<T, GlitchError>;

#[derive(thiserror::Error, Debug)]
pub enum GlitchError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("capture error: {0}")]
    Capture(String),

    #[error("export init error: {0}")]
    ExportInit(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GlitchError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }

    pub fn export_init(msg: impl Into<String>) -> Self {
        Self::ExportInit(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// True for the two failure classes an export can surface: the backend
    /// failing to come up at all, or rejecting input mid-encode.
    pub fn is_export_failure(&self) -> bool {
        matches!(self, Self::ExportInit(_) | Self::Encode(_))
    }
}
