use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result alias for everything in the data layer.
pub type LoadResult<T> = Result<T, LoadError>;

/// Everything that can go wrong between a path on disk and a [`RawRecording`].
///
/// None of these are recoverable: the loader stops at the first one.
///
/// [`RawRecording`]: super::model::RawRecording
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The archive path does not resolve to a file.
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// The path exists but could not be opened for reading.
    #[error("cannot open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Not an npz container, a required key is missing, or an array does not
    /// have the dtype / nesting the loader expects.
    #[error("format error: {0}")]
    Format(String),

    /// `x` is not a 3-axis (epochs, samples, channels) array.
    #[error("shape error: expected 'x' with 3 axes (epochs, samples, channels), got {ndim}")]
    Shape { ndim: usize },

    /// Channel labels and the channel axis of `x` disagree.
    #[error("validation error: {labels} channel labels but 'x' has {channels} channels")]
    Validation { labels: usize, channels: usize },
}

impl LoadError {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        LoadError::Format(msg.into())
    }

    /// Coarse category of the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoadError::FileNotFound { .. } => ErrorKind::FileNotFound,
            LoadError::Io { .. } => ErrorKind::Io,
            LoadError::Format(_) => ErrorKind::Format,
            LoadError::Shape { .. } => ErrorKind::Shape,
            LoadError::Validation { .. } => ErrorKind::Validation,
        }
    }
}

/// Error categories reported by [`LoadError::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    FileNotFound,
    Io,
    Format,
    Shape,
    Validation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::FileNotFound => "FileNotFoundError",
            ErrorKind::Io => "IoError",
            ErrorKind::Format => "FormatError",
            ErrorKind::Shape => "ShapeError",
            ErrorKind::Validation => "ValidationError",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = LoadError::Validation {
            labels: 5,
            channels: 4,
        };
        let display = format!("{}", error);
        assert!(display.contains("validation error"));
        assert!(display.contains('5'));
        assert!(display.contains('4'));
        assert_eq!(error.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_kind_names() {
        let error = LoadError::FileNotFound {
            path: PathBuf::from("missing.npz"),
        };
        assert_eq!(error.kind().to_string(), "FileNotFoundError");
        assert!(error.to_string().contains("missing.npz"));
        assert_eq!(LoadError::Shape { ndim: 2 }.kind().to_string(), "ShapeError");
    }
}
