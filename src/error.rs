// src/error.rs

use thiserror::Error;

/// Failures that abort construction of the canonical table.
///
/// Everything else the pipeline meets (unknown series, unresolved continents,
/// bad year labels, unparsable cells) degrades to missing data instead.
#[derive(Debug, Error)]
pub enum ReshapeError {
    /// One or more of the four structural columns is absent from the header row.
    #[error("source is missing structural column(s): {}", missing.join(", "))]
    SourceFormat { missing: Vec<String> },

    #[error("source has no header row")]
    EmptySource,

    #[error("no csv entry found in archive {archive}")]
    NoCsvEntry { archive: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}
