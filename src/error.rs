//! Error types for streaming edits.

use std::io;

use thiserror::Error;

use crate::process::ProcessError;

/// Failure value returned by user transform callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by a streaming edit run.
///
/// None of these are retried or recovered internally: the first occurrence
/// aborts the whole stream and the partial output must be treated as
/// unusable.
#[derive(Debug, Error)]
pub enum Error {
    /// Unexpected byte, unterminated quote/comment/CDATA, or premature end
    /// of input inside a tag or capture.
    #[error("malformed markup at byte {offset}: {reason}")]
    Malformed { offset: u64, reason: String },

    /// A registered transform returned an error, or a text transform's
    /// output did not parse back as a JSON object of strings.
    #[error("transform for element <{element}> failed: {source}")]
    Callback { element: String, source: BoxError },

    /// The external process bound to a selector exited or stopped answering.
    #[error("process for element <{element}> failed: {source}")]
    Process {
        element: String,
        source: ProcessError,
    },

    /// Read or write failure on the underlying streams.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn malformed(offset: u64, reason: impl Into<String>) -> Self {
        Error::Malformed {
            offset,
            reason: reason.into(),
        }
    }

    /// Wrap a callback failure, keeping process failures as their own kind.
    pub(crate) fn callback(element: &str, source: BoxError) -> Self {
        match source.downcast::<ProcessError>() {
            Ok(process) => Error::Process {
                element: element.to_string(),
                source: *process,
            },
            Err(source) => Error::Callback {
                element: element.to_string(),
                source,
            },
        }
    }
}
