//! Error taxonomy for amalgamation runs.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AmalgamError>;

#[derive(Debug, Error)]
pub enum AmalgamError {
    /// A local document referenced by the entry or by a directive is absent
    /// from the include root.
    #[error("document not found: {document}{}", included_from_suffix(.included_from))]
    DocumentNotFound {
        document: String,
        included_from: Option<String>,
    },

    /// A line starts with the inclusion marker but its target cannot be
    /// extracted.
    #[error("malformed directive in {document}:{line_number}: {reason}: `{line}`")]
    MalformedDirective {
        document: String,
        line_number: usize,
        line: String,
        reason: String,
    },

    /// The entry identifier is absolute or climbs out of the include root.
    #[error("invalid entry document {document}: {reason}")]
    InvalidEntry { document: String, reason: String },

    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },

    #[error("smoke test failed during {stage}: {detail}")]
    SmokeTestFailed { stage: String, detail: String },
}

impl AmalgamError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn included_from_suffix(parent: &Option<String>) -> String {
    match parent {
        Some(parent) => format!(" (included from {parent})"),
        None => String::new(),
    }
}
