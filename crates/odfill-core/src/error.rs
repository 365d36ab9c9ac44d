use thiserror::Error;

#[derive(Error, Debug)]
pub enum OdfillError {
    // Data errors
    #[error("DATA_FORMAT: {0}")]
    DataFormat(String),

    // Template structure errors
    #[error("STRUCTURE_MISSING_PART: required part '{0}' not found in template")]
    MissingPart(String),

    #[error("STRUCTURE_MISSING_MIMETYPE: mimetype entry not found in working directory")]
    MissingMimetype,

    // Archive errors
    #[error("PACKAGING_FAILED: {0}")]
    Packaging(String),

    #[error("EXTRACTION_FAILED: {0}")]
    Extraction(String),

    // Network errors
    #[error("NETWORK_FETCH_FAILED: {url}: {reason}")]
    NetworkFetch { url: String, reason: String },

    // Media errors (recovered per occurrence inside the image resolver)
    #[error("MEDIA_FAILED: {0}")]
    Media(String),

    // IO errors
    #[error("IO_ERROR: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for OdfillError {
    fn from(err: serde_json::Error) -> Self {
        OdfillError::DataFormat(format!("JSON error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, OdfillError>;
