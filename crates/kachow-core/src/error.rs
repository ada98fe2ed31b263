use std::path::PathBuf;

/// Errors that can occur across the kachow workspace.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary crate converts to `miette` diagnostics at the boundary.
///
/// Per-file problems during a scan (unreadable files, syntax errors, metrics
/// outages) are not errors: they degrade and are reported as scan diagnostics.
///
/// # Examples
///
/// ```
/// use kachow_core::KachowError;
///
/// let err = KachowError::Config("missing project key".into());
/// assert!(err.to_string().contains("missing project key"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum KachowError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Git operation failure.
    #[error("git error: {0}")]
    Git(String),

    /// Source code parsing failure.
    #[error("parse error: {0}")]
    Parse(String),

    /// Metrics provider request or response error.
    #[error("metrics error: {0}")]
    Metrics(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file or directory was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The scan root exists but is not a directory.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: KachowError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn config_error_displays_message() {
        let err = KachowError::Config("bad value".into());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    #[test]
    fn file_not_found_shows_path() {
        let err = KachowError::FileNotFound(PathBuf::from("/tmp/missing-repo"));
        assert!(err.to_string().contains("/tmp/missing-repo"));
    }

    #[test]
    fn metrics_error_displays_message() {
        let err = KachowError::Metrics("API returned 401".into());
        assert_eq!(err.to_string(), "metrics error: API returned 401");
    }
}
