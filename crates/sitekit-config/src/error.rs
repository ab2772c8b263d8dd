//! Error types for the Sitekit configuration engine.

use std::{fmt, path::PathBuf};

use thiserror::Error;

/// Result type alias using `ConfigError`.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration engine errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// One or more fields failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    /// PostCSS config discovery or parsing failed.
    #[error("Failed to load PostCSS config from {path}: {message}")]
    Resolution {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The root location cannot anchor relative paths.
    #[error("Invalid root location: {0}")]
    InvalidRoot(String),

    /// Unknown command name.
    #[error("Unknown command '{0}' (expected dev, build or preview)")]
    InvalidCommand(String),

    /// Raw config file could not be loaded.
    #[error("Failed to load config {path}: {message}")]
    Load {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// File system I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ConfigError {
    /// Create a PostCSS resolution error.
    pub fn resolution(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Resolution {
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a PostCSS resolution error with source.
    pub fn resolution_with_source(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Resolution {
            path: path.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a config loading error.
    pub fn load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a config loading error with source.
    pub fn load_with_source(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Load {
            path: path.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Validation issues, if this is a validation failure.
    pub fn issues(&self) -> &[Issue] {
        match self {
            Self::Validation(failure) => &failure.issues,
            _ => &[],
        }
    }
}

/// A single invalid field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Dotted field path, e.g. `markdown.remarkPlugins[2]`.
    pub path: String,
    /// Description of the accepted shape or values.
    pub expected: String,
    /// Summary of what was found.
    pub received: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {}, received {}",
            self.path, self.expected, self.received
        )
    }
}

/// Every field error found in a configuration object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub issues: Vec<Issue>,
}

impl ValidationFailure {
    pub fn new(issues: Vec<Issue>) -> Self {
        Self { issues }
    }

    /// Find the issue reported for a field path.
    pub fn issue(&self, path: &str) -> Option<&Issue> {
        self.issues.iter().find(|issue| issue.path == path)
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid configuration ({} issue", self.issues.len())?;
        if self.issues.len() != 1 {
            f.write_str("s")?;
        }
        f.write_str(")")?;
        for issue in &self.issues {
            write!(f, "\n  ! {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(path: &str) -> Issue {
        Issue {
            path: path.to_string(),
            expected: "'always' | 'never' | 'ignore'".to_string(),
            received: "'sometimes'".to_string(),
        }
    }

    #[test]
    fn test_validation_failure_lists_issues() {
        let err = ConfigError::from(ValidationFailure::new(vec![
            issue("trailingSlash"),
            issue("output"),
        ]));
        let message = err.to_string();
        assert!(message.contains("2 issues"));
        assert!(message.contains("trailingSlash: expected 'always' | 'never' | 'ignore'"));
        assert!(message.contains("received 'sometimes'"));
        assert_eq!(err.issues().len(), 2);
    }

    #[test]
    fn test_single_issue_wording() {
        let failure = ValidationFailure::new(vec![issue("trailingSlash")]);
        assert!(failure.to_string().starts_with("Invalid configuration (1 issue)"));
        assert!(failure.issue("trailingSlash").is_some());
        assert!(failure.issue("base").is_none());
    }

    #[test]
    fn test_resolution_error() {
        let err = ConfigError::resolution("/site/.postcssrc", "unexpected token");
        assert!(err.to_string().contains("PostCSS config"));
        assert!(err.to_string().contains("/site/.postcssrc"));
        assert!(err.issues().is_empty());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ConfigError = io_err.into();
        assert!(err.to_string().contains("IO error"));
    }
}
