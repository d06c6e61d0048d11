use std::io;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid OCR input: {0}")]
    InvalidInput(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),
}

/// Reason a column strategy gave up. Never fatal: the detector moves on to
/// the next strategy and finally to a single page-wide column.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum StrategyFailure {
    #[error("anchor keyword '{keyword}' not found")]
    AnchorNotFound { keyword: String },

    #[error("found {found} year header(s) right of the anchor, need at least 2")]
    InsufficientYearCandidates { found: usize },

    #[error("boundary reconciliation produced {found} column(s), expected {expected}")]
    ColumnCountMismatch { found: usize, expected: usize },

    #[error("page has no horizontal extent")]
    EmptyProfile,

    #[error("no projection run is wide enough to be a column")]
    NoProjectionRuns,

    #[error("page is wider than the {limit} unit projection profile limit")]
    ProfileTooWide { limit: usize },
}
