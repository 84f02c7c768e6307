//! # Comfydeck Errors
//!
//! Error handling for the comfydeck deployment toolkit.
//!
//! - Uses `thiserror` for structured error definitions
//! - Provides `Display` and `Error` trait implementations
//! - Includes error context for debugging

use thiserror::Error;

/// Configuration resolution errors.
///
/// Anything that would produce an unusable settings object aborts with one
/// of these; callers with a documented default never see `MissingKey`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    MissingFile { path: String },

    #[error("Missing [{section}] section in configuration")]
    MissingSection { section: String },

    #[error("Missing key '{key}' in [{section}] section")]
    MissingKey { section: String, key: String },

    #[error("Malformed value for '{key}' in [{section}]: '{value}' is not a valid {expected}")]
    MalformedValue {
        section: String,
        key: String,
        value: String,
        expected: &'static str,
    },

    #[error("Configuration parse error at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("Secrets file error: {reason}")]
    SecretsFile { reason: String },
}

/// Model-path document generation errors.
///
/// Each pipeline stage short-circuits to one of these; there is no
/// resume or retry between stages.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to serialize model-path document: {reason}")]
    Serialize { reason: String },

    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Generated document failed validation: {reason}")]
    Validation { reason: String },
}

/// Model weight download errors.
///
/// Transfer behavior belongs to the external downloader; these cover only
/// what happens before the spawn and the propagated exit status.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Required secret '{token}' is missing or empty; set it in the secrets file")]
    MissingToken { token: String },

    #[error("Failed to launch downloader: {reason}")]
    Spawn { reason: String },

    #[error("Download of {artifact} failed with exit code {code}")]
    Failed { artifact: String, code: i32 },

    #[error("Failed to prepare {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
