use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("pdf parse error: {0}")]
    Pdf(String),

    #[error("pdf rasterization failed: {0}")]
    Rasterize(String),

    #[error("docx parse error: {0}")]
    Docx(String),

    #[error("ocr failed: {0}")]
    Ocr(String),

    #[error("extraction worker failed: {0}")]
    Worker(String),
}

#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("invalid audio payload: {0}")]
    InvalidAudio(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("speech service returned {status}: {details}")]
    Request { status: u16, details: String },

    #[error("transcription worker failed: {0}")]
    Worker(String),
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generation api returned {status}: {details}")]
    Api { status: u16, details: String },

    #[error("malformed generation response: {0}")]
    Malformed(String),

    #[error("generation worker failed: {0}")]
    Worker(String),
}

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("worker pool is closed")]
    Closed,

    #[error("worker task did not complete: {0}")]
    Join(String),
}

impl From<PoolError> for ExtractError {
    fn from(error: PoolError) -> Self {
        ExtractError::Worker(error.to_string())
    }
}

impl From<PoolError> for TranscriptionError {
    fn from(error: PoolError) -> Self {
        TranscriptionError::Worker(error.to_string())
    }
}

impl From<PoolError> for GenerationError {
    fn from(error: PoolError) -> Self {
        GenerationError::Worker(error.to_string())
    }
}

/// Failure kinds surfaced by [`crate::AssistantService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("transcription failed: {0}")]
    Transcription(#[from] TranscriptionError),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),
}

pub type Result<T, E = ServiceError> = std::result::Result<T, E>;
