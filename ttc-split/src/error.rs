//! Errors that occur while splitting a collection

use std::path::PathBuf;

use thiserror::Error;

/// A stable code for each way a run can end.
///
/// The numeric values are part of the public interface: the command line
/// tool uses them as its exit status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorKind {
    #[default]
    NoError = 0,
    InvalidFileFormat = 1,
    InvalidNumFonts = 2,
    NoOutputFile = 3,
    OutputDirectoryNotExist = 4,
    OtherFailure = 5,
    FileDoesNotExist = 6,
}

impl ErrorKind {
    /// The numeric code for this kind.
    pub fn code(self) -> u16 {
        self as u16
    }
}

/// An error that aborts a run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SplitError {
    #[error("File does not exist.")]
    FileDoesNotExist(PathBuf),

    #[error("Invalid file format: ttcTag is not correct.")]
    InvalidFileFormat,

    #[error("Invalid file format: numFonts is 0.")]
    InvalidNumFonts,

    #[error("No output ttf file.")]
    NoOutputFile,

    #[error("Output directory does not exist.")]
    OutputDirectoryNotExist(PathBuf),

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl SplitError {
    /// Returns a closure that wraps an I/O error with a description of what
    /// was being attempted, for use with `map_err`.
    pub(crate) fn io(context: impl Into<String>) -> impl FnOnce(std::io::Error) -> SplitError {
        let context = context.into();
        move |source| SplitError::Io { context, source }
    }

    /// The stable code for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SplitError::FileDoesNotExist(_) => ErrorKind::FileDoesNotExist,
            SplitError::InvalidFileFormat => ErrorKind::InvalidFileFormat,
            SplitError::InvalidNumFonts => ErrorKind::InvalidNumFonts,
            SplitError::NoOutputFile => ErrorKind::NoOutputFile,
            SplitError::OutputDirectoryNotExist(_) => ErrorKind::OutputDirectoryNotExist,
            SplitError::Io { .. } => ErrorKind::OtherFailure,
        }
    }

    /// The message for this error, followed by the message of every nested
    /// cause, one per line.
    pub fn message(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push('\n');
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}
