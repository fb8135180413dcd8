use std::fmt;
use std::io;
use std::path::PathBuf;

/// Failure of a note read or mutation.
///
/// A missing note is not an error: `NoteStore::read` reports it as `Ok(None)`.
#[derive(Debug)]
pub enum NoteError {
    /// Fewer than three `---` section delimiters.
    MalformedDocument,
    /// The line a task was parsed from no longer carries a checklist marker.
    MalformedTaskLine { line: usize },
    /// Task index outside `[0, count)`.
    IndexOutOfRange { index: usize, count: usize },
    /// Filesystem read/write failure.
    Io { path: PathBuf, source: io::Error },
    /// A string that is not a canonical `DD-Mon-YYYY` date-id.
    InvalidDateId(String),
}

impl NoteError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        NoteError::Io {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for NoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteError::MalformedDocument => {
                write!(f, "malformed note: need at least 3 '---' delimiters")
            }
            NoteError::MalformedTaskLine { line } => {
                write!(f, "line {} does not contain a valid task", line)
            }
            NoteError::IndexOutOfRange { index, count } => {
                write!(f, "invalid task index: {} (total tasks: {})", index, count)
            }
            NoteError::Io { path, source } => write!(f, "I/O error on {:?}: {}", path, source),
            NoteError::InvalidDateId(raw) => write!(f, "invalid date-id: {:?}", raw),
        }
    }
}

impl std::error::Error for NoteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NoteError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
