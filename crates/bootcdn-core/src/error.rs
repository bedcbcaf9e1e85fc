//! Error type shared by the catalog client, cache, session and CLI.

use std::fmt;

/// Main error type for bootcdn operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CdnError {
    /// Transport or HTTP status failures
    Network {
        operation: String,
        url: Option<String>,
        status: Option<u16>,
        source: String,
    },
    /// The catalog API answered, but with something we cannot read
    Catalog {
        operation: String,
        library: Option<String>,
        source: String,
    },
    /// Response cache failures (only surfaced by explicit cache commands)
    Cache {
        operation: String,
        key: Option<String>,
        source: String,
    },
    /// Configuration errors
    Config {
        operation: String,
        field: Option<String>,
        source: String,
    },
    /// Caller contract violation, e.g. an empty library name
    InvalidArgument {
        operation: String,
        reason: String,
    },
    /// Reading an answer from the user failed
    Prompt {
        question: String,
        source: String,
    },
    /// I/O related errors
    Io {
        operation: String,
        path: Option<String>,
        source: String,
    },
}

pub type Result<T> = std::result::Result<T, CdnError>;

impl fmt::Display for CdnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CdnError::Network { operation, url, status, source } => {
                write!(f, "Network error in {}: {}", operation, source)?;
                if let Some(url) = url {
                    write!(f, " (url: {})", url)?;
                }
                if let Some(status) = status {
                    write!(f, " (status: {})", status)?;
                }
                Ok(())
            }
            CdnError::Catalog { operation, library, source } => {
                write!(f, "Catalog error in {}: {}", operation, source)?;
                if let Some(library) = library {
                    write!(f, " (library: {})", library)?;
                }
                Ok(())
            }
            CdnError::Cache { operation, key, source } => {
                write!(f, "Cache error in {}: {}", operation, source)?;
                if let Some(key) = key {
                    write!(f, " (key: {})", key)?;
                }
                Ok(())
            }
            CdnError::Config { operation, field, source } => {
                write!(f, "Configuration error in {}: {}", operation, source)?;
                if let Some(field) = field {
                    write!(f, " (field: {})", field)?;
                }
                Ok(())
            }
            CdnError::InvalidArgument { operation, reason } => {
                write!(f, "Invalid argument to {}: {}", operation, reason)
            }
            CdnError::Prompt { question, source } => {
                write!(f, "Prompt failed ({}): {}", question.trim_end_matches(':'), source)
            }
            CdnError::Io { operation, path, source } => {
                write!(f, "I/O error in {}: {}", operation, source)?;
                if let Some(path) = path {
                    write!(f, " (path: {})", path)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for CdnError {}

impl CdnError {
    pub fn invalid_argument(operation: &str, reason: &str) -> Self {
        CdnError::InvalidArgument {
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn io(operation: &str, path: Option<&std::path::Path>, source: std::io::Error) -> Self {
        CdnError::Io {
            operation: operation.to_string(),
            path: path.map(|p| p.display().to_string()),
            source: source.to_string(),
        }
    }

    /// True for errors caused by the caller rather than the environment.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, CdnError::InvalidArgument { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_display() {
        let error = CdnError::Network {
            operation: "fetch_library".to_string(),
            url: Some("https://api.bootcdn.cn/libraries/jquery.min.json".to_string()),
            status: Some(503),
            source: "HTTP 503".to_string(),
        };
        let display = error.to_string();
        assert!(display.contains("fetch_library"));
        assert!(display.contains("HTTP 503"));
        assert!(display.contains("(status: 503)"));
        assert!(display.contains("libraries/jquery.min.json"));
    }

    #[test]
    fn test_invalid_argument() {
        let error = CdnError::invalid_argument("fetch_library", "No library specified.");
        assert!(error.is_invalid_argument());
        assert_eq!(
            error.to_string(),
            "Invalid argument to fetch_library: No library specified."
        );
    }

    #[test]
    fn test_io_error_keeps_path() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error = CdnError::io("read_cache", Some(std::path::Path::new("/tmp/x.json")), source);
        let display = error.to_string();
        assert!(display.contains("read_cache"));
        assert!(display.contains("/tmp/x.json"));
        assert!(!error.is_invalid_argument());
    }
}
