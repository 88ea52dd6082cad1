use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures that abort an aggregation pass.
///
/// Rows without a usable abundance are not errors; they are counted in
/// [`crate::records::PointStats`] and skipped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid detail level: {0} (must be finite and > 0)")]
    InvalidDetailLevel(f64),

    #[error("Malformed row {index}: {reason}")]
    MalformedRow { index: usize, reason: String },
}
