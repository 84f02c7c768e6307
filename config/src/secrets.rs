//! # Secret Resolution
//!
//! Sensitive configuration values are redirected through a secrets file:
//! a value equal to the `.env` sentinel is not a literal but an instruction
//! to substitute an environment variable of the same name.
//!
//! Lookup order for a sentinel under key `K`: exact `K`, then `K` uppercased,
//! then `K` lowercased. No match resolves to "no value" (`None`), never an
//! error; the caller decides whether an unresolved secret is fatal before
//! using it.

use std::env;
use std::path::Path;

use errors::ConfigError;

use crate::document::ConfigDocument;

/// Reserved sentinel marking a value as a secret reference.
pub const SECRET_SENTINEL: &str = ".env";

/// Populate process environment variables from a `KEY=value` secrets file.
///
/// Existing environment variables are not overridden, so values already in
/// the process environment win over the file's.
pub fn load_secrets_file(path: &Path) -> Result<(), ConfigError> {
    if !path.exists() {
        return Err(ConfigError::MissingFile {
            path: path.display().to_string(),
        });
    }
    dotenvy::from_path(path).map_err(|e| ConfigError::SecretsFile {
        reason: e.to_string(),
    })?;
    tracing::debug!(path = %path.display(), "loaded secrets file");
    Ok(())
}

/// Resolve a configuration value, substituting secrets where the sentinel
/// is present.
///
/// - Absent section or key: `None` (callers with a documented default use
///   this; required keys are checked separately).
/// - Literal value: the trimmed literal.
/// - Sentinel (case-insensitive `.env`): the three-step environment lookup;
///   `None` when nothing matches.
pub fn resolve_value(doc: &ConfigDocument, section: &str, key: &str) -> Option<String> {
    let value = doc.get(section, key)?.trim();

    if value.eq_ignore_ascii_case(SECRET_SENTINEL) {
        let resolved = env::var(key)
            .or_else(|_| env::var(key.to_uppercase()))
            .or_else(|_| env::var(key.to_lowercase()))
            .ok();
        if resolved.is_none() {
            tracing::warn!(section, key, "secret reference did not resolve to any environment variable");
        }
        return resolved;
    }

    Some(value.to_string())
}
