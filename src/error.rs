//! Error handling module for the installer
//!
//! Provides centralized error types using thiserror. Step functions use
//! `anyhow::Result` and convert into these where a typed error matters.

use thiserror::Error;

/// Main error type for the installer
#[derive(Error, Debug)]
pub enum InstallerError {
    /// IO errors (file operations, terminal, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The program could not be started at all
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and reported failure
    #[error("{command} failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    /// Configuration errors (loading, parsing, validation)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors (user input, config values)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Terminal/UI errors
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for installer operations
pub type Result<T> = std::result::Result<T, InstallerError>;

impl InstallerError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a terminal error
    pub fn terminal(msg: impl Into<String>) -> Self {
        Self::Terminal(msg.into())
    }

    /// Create a spawn error for `program`
    pub fn spawn(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = InstallerError::config("target_root must be absolute");
        assert_eq!(
            err.to_string(),
            "Configuration error: target_root must be absolute"
        );

        let err = InstallerError::validation("password too short");
        assert_eq!(err.to_string(), "Validation error: password too short");
    }

    #[test]
    fn test_command_failed_display() {
        let err = InstallerError::CommandFailed {
            command: "mkfs.btrfs -f /dev/sda2".into(),
            status: "exit code 1".into(),
            stderr: "device busy".into(),
        };
        assert_eq!(
            err.to_string(),
            "mkfs.btrfs -f /dev/sda2 failed (exit code 1): device busy"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: InstallerError = io_err.into();
        assert!(matches!(err, InstallerError::Io(_)));
    }

    #[test]
    fn test_spawn_constructor() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "No such file");
        let err = InstallerError::spawn("sgdisk", io_err);
        assert!(err.to_string().starts_with("Failed to start sgdisk"));
    }
}
