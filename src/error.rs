//! Error and notice types.
//!
//! Hard failures (configuration and file access) are typed errors. Structural
//! problems inside a document never abort processing; they are reported as
//! [`Notice`] values next to the rewritten lines.

use std::{fmt, io, path::PathBuf};

/// Errors raised while resolving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read or written.
    #[error("failed to access config file at {}: {source}", path.display())]
    Io { source: io::Error, path: PathBuf },

    /// The configuration file is not valid YAML for [`crate::config::ConfigFile`].
    #[error("failed to parse config file at {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// A rule keyword or number was not recognised.
    #[error(transparent)]
    Rule(#[from] RuleError),

    /// `--init-config` found an existing file.
    #[error("configuration file already exists at {}", path.display())]
    FileExists { path: PathBuf },
}

/// An unknown rule keyword or number.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("unknown rule keyword: {0}")]
    UnknownKeyword(String),
    #[error("unknown rule number: {0}")]
    UnknownNumber(u8),
}

/// Errors raised while rewriting a file.
#[derive(Debug, thiserror::Error)]
#[error("{}: {source}", path.display())]
pub struct RewriteError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// A recoverable condition met while normalising a document.
///
/// `line` is the zero-based index of the input line the condition was found on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A list item matched only loosely and was left verbatim.
    ParseAmbiguity { line: usize, text: String },
    /// A pipe-delimited block could not be reflowed and was left unchanged.
    StructuralViolation { line: usize, reason: &'static str },
    /// `[text][id]` names an id with no definition.
    UnresolvedReference { line: usize, id: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParseAmbiguity { line, text } => {
                write!(f, "line {}: ambiguous list item kept verbatim: {text}", line + 1)
            }
            Self::StructuralViolation { line, reason } => {
                write!(f, "line {}: table left unchanged: {reason}", line + 1)
            }
            Self::UnresolvedReference { line, id } => {
                write!(f, "line {}: no definition for reference [{id}]", line + 1)
            }
        }
    }
}
