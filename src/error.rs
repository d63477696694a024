//! Error type for loading survey exports.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SurveyError {
    #[error("failed to read survey file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("survey file {} has no header row", path.display())]
    MissingHeader { path: PathBuf },

    #[error("survey file {} has no column {column:?}", path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("unsupported header layout: {0} header rows (expected 1 or 2)")]
    UnsupportedHeaderRows(usize),
}

pub type Result<T> = std::result::Result<T, SurveyError>;
