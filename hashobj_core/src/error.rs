//! Error types for hashobj_core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using hashobj_core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving inputs or indexing objects.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid combination of command-line options.
    #[error("{reason}")]
    Config { reason: String },

    /// A named input could not be opened.
    #[error("Cannot open {} {}", path.display(), open_purpose(*write))]
    Open {
        path: PathBuf,
        write: bool,
        #[source]
        source: std::io::Error,
    },

    /// A batch line started with a quote but was not valid C-style quoting.
    #[error("line is badly quoted")]
    Quote { line: String },

    /// Hashing or writing an input failed.
    #[error("{}", index_message(*write, path))]
    Index {
        path: String,
        write: bool,
        #[source]
        source: Box<Error>,
    },

    /// Write mode was requested outside of any store.
    #[error("Not a hashobj store (or any of the parent directories): {path}")]
    NotAStore { path: PathBuf },

    /// Writing was requested from a database that has no store behind it.
    #[error("cannot write objects without a store")]
    NoStore,

    /// I/O error occurred during file operations.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Object file is corrupted or invalid.
    #[error("Corrupted object at {path}: {reason}")]
    CorruptedObject { path: PathBuf, reason: String },

    /// Invalid hash format or encoding.
    #[error("Invalid hash: {reason}")]
    InvalidHash { reason: String },

    /// Object not found in store.
    #[error("Object not found: {hash}")]
    ObjectNotFound { hash: String },

    /// Store config file is missing a key or has an unsupported value.
    #[error("Invalid store config: {reason}")]
    InvalidConfig { reason: String },

    /// Journal line or object header that does not follow its format.
    #[error("Malformed {what}: {reason}")]
    Malformed { what: &'static str, reason: String },

    /// Store is invalid or not initialized.
    #[error("Invalid store at {path}: {reason}")]
    InvalidStore { path: PathBuf, reason: String },

    /// Unknown object type name or byte.
    #[error("invalid object type \"{name}\"")]
    InvalidObjectType { name: String },

    /// Unsupported algorithm.
    #[error("Unsupported algorithm: {algorithm}")]
    UnsupportedAlgorithm { algorithm: String },
}

fn open_purpose(write: bool) -> &'static str {
    if write {
        "to add to database"
    } else {
        "to hash"
    }
}

fn index_message(write: bool, path: &str) -> String {
    if write {
        format!("Unable to add {} to database", path)
    } else {
        format!("Unable to hash {}", path)
    }
}

impl Error {
    /// Create a Config error.
    pub fn config(reason: impl Into<String>) -> Self {
        Error::Config {
            reason: reason.into(),
        }
    }

    /// Create an Open error.
    pub fn open(path: impl Into<PathBuf>, write: bool, source: std::io::Error) -> Self {
        Error::Open {
            path: path.into(),
            write,
            source,
        }
    }

    /// Create a Quote error.
    pub fn quote(line: impl Into<String>) -> Self {
        Error::Quote { line: line.into() }
    }

    /// Wrap a store failure with the input it happened on.
    pub fn index(path: impl Into<String>, write: bool, source: Error) -> Self {
        Error::Index {
            path: path.into(),
            write,
            source: Box::new(source),
        }
    }

    /// Create a NotAStore error.
    pub fn not_a_store(path: impl Into<PathBuf>) -> Self {
        Error::NotAStore { path: path.into() }
    }

    /// Create a CorruptedObject error.
    pub fn corrupted_object(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::CorruptedObject {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidHash error.
    pub fn invalid_hash(reason: impl Into<String>) -> Self {
        Error::InvalidHash {
            reason: reason.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Error::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create a Malformed error for the named kind of record.
    pub fn malformed(what: &'static str, reason: impl Into<String>) -> Self {
        Error::Malformed {
            what,
            reason: reason.into(),
        }
    }

    /// Create an ObjectNotFound error.
    pub fn object_not_found(hash: impl Into<String>) -> Self {
        Error::ObjectNotFound { hash: hash.into() }
    }

    /// Create an InvalidStore error.
    pub fn invalid_store(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::InvalidStore {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidObjectType error.
    pub fn invalid_object_type(name: impl Into<String>) -> Self {
        Error::InvalidObjectType { name: name.into() }
    }

    /// Create an UnsupportedAlgorithm error.
    pub fn unsupported_algorithm(algorithm: impl Into<String>) -> Self {
        Error::UnsupportedAlgorithm {
            algorithm: algorithm.into(),
        }
    }

    /// Whether this error came from validating options rather than from
    /// processing an input.
    pub fn is_usage(&self) -> bool {
        matches!(self, Error::Config { .. })
    }
}

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::Io { source: err.error }
    }
}
