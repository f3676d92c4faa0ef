use thiserror::Error;

pub type Result<T> = std::result::Result<T, SavefileError>;

#[derive(Error, Debug)]
pub enum SavefileError {
    #[error("archive io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive too short ({0} bytes, need at least 4 for the length header)")]
    Truncated(usize),

    #[error("failed to decompress archive payload: {0}")]
    Decompress(std::io::Error),

    #[error("length header declares {declared} decompressed bytes, payload inflated to {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("archive payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no entity container found in archive document")]
    NoEntityContainer,
}
