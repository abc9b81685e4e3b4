//! Error types for grammar composition
//!
//! Composition is mostly forgiving: missing or malformed header directives
//! fall back to defaults. The variants below are the cases that abort the
//! transform for one grammar file.

use std::fmt;
use std::path::PathBuf;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, ComposeError>;

/// An error that aborts composition of a grammar file
#[derive(Debug)]
pub enum ComposeError {
    /// An `extends("...")=...` directive carries a pattern that is not a valid regex
    InvalidExtendsPattern {
        /// The full directive text as written in the header
        directive: String,
        /// The regex compilation error
        source: regex::Error,
    },

    /// The grammar has no `::=` separator, so there is no rule to compose
    NoRules {
        /// The grammar file, when known
        path: Option<PathBuf>,
    },

    /// Two rules derive the same indirection name
    AccessorCollision {
        /// The rule that claimed the name first
        first: String,
        /// The rule that collided with it
        second: String,
        /// The shared indirection name
        accessor: String,
    },

    /// A rule name collides with a rule the composer generates
    ReservedRuleName {
        /// The rule name as written
        name: String,
        /// The generated rule it collides with
        generated: String,
    },

    /// Reading or writing a file failed
    Io {
        /// The file or directory involved
        path: PathBuf,
        /// The underlying I/O error
        source: std::io::Error,
    },

    /// The input file cannot be placed relative to the source root
    InvalidLayout {
        /// Why the layout could not be computed
        reason: String,
    },

    /// A configuration file could not be decoded
    Config {
        /// The configuration file
        path: PathBuf,
        /// The decoding error
        source: serde_json::Error,
    },
}

impl ComposeError {
    /// Wrap an I/O error with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ComposeError::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid layout error
    pub fn layout(reason: impl Into<String>) -> Self {
        ComposeError::InvalidLayout {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ComposeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComposeError::InvalidExtendsPattern { directive, source } => {
                write!(f, "Invalid pattern in directive `{}`: {}", directive, source)
            }
            ComposeError::NoRules { path: Some(path) } => {
                write!(f, "Grammar {} declares no rules", path.display())
            }
            ComposeError::NoRules { path: None } => write!(f, "Grammar declares no rules"),
            ComposeError::AccessorCollision {
                first,
                second,
                accessor,
            } => write!(
                f,
                "Rules `{}` and `{}` both map to accessor `{}`",
                first, second, accessor
            ),
            ComposeError::ReservedRuleName { name, generated } => write!(
                f,
                "Rule `{}` collides with the generated rule `{}`",
                name, generated
            ),
            ComposeError::Io { path, source } => {
                write!(f, "I/O error on {}: {}", path.display(), source)
            }
            ComposeError::InvalidLayout { reason } => write!(f, "Invalid layout: {}", reason),
            ComposeError::Config { path, source } => {
                write!(f, "Invalid configuration {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ComposeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ComposeError::InvalidExtendsPattern { source, .. } => Some(source),
            ComposeError::Io { source, .. } => Some(source),
            ComposeError::Config { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_invalid_pattern_names_directive() {
        let source = regex::Regex::new("(").unwrap_err();
        let error = ComposeError::InvalidExtendsPattern {
            directive: "extends(\"(\")=stmt".to_string(),
            source,
        };

        let message = error.to_string();
        assert!(message.contains("extends(\"(\")=stmt"));
        assert!(error.source().is_some());
    }

    #[test]
    fn test_collision_message() {
        let error = ComposeError::AccessorCollision {
            first: "a_b".to_string(),
            second: "aB".to_string(),
            accessor: "aBExt".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Rules `a_b` and `aB` both map to accessor `aBExt`"
        );
        assert!(error.source().is_none());
    }

    #[test]
    fn test_reserved_name_message() {
        let error = ComposeError::ReservedRuleName {
            name: "private root".to_string(),
            generated: "root".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Rule `private root` collides with the generated rule `root`"
        );
    }

    #[test]
    fn test_io_keeps_path() {
        let error = ComposeError::io(
            "/tmp/out.bnf",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(error.to_string().contains("/tmp/out.bnf"));
    }
}
