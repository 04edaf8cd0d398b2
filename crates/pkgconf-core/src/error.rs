//! Error types for pkgconf-core.

use std::path::PathBuf;

/// Result type alias for pkgconf-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing, expanding, resolving or comparing
/// pkg-config metadata.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A `.pc` file failed to parse.
    #[error("{path}:{line}: {message}")]
    ParseError {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// A requested package could not be resolved on the search path.
    #[error("Package '{name}' was not found")]
    NotFound { name: String },

    /// A `.pc` file is missing a required property, or is otherwise
    /// structurally invalid.
    #[error("'{path}' is invalid: {message}")]
    Invalid { path: PathBuf, message: String },

    /// A package was found but its version did not satisfy a constraint.
    #[error("Requested '{name} {comparator} {required}' but version of {name} is {found}")]
    VersionMismatch {
        name: String,
        found: String,
        required: String,
        comparator: String,
    },

    /// An I/O error occurred while reading a `.pc` file.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A malformed command-line argument.
    #[error("{0}")]
    ArgumentError(String),

    /// The dependency graph exceeded its maximum traversal depth.
    #[error("maximum traversal depth ({depth}) exceeded while resolving '{name}'")]
    MaxDepthExceeded { name: String, depth: u32 },
}
