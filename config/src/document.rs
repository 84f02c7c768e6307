//! # Configuration Document
//!
//! Ordered INI document model: named sections, each a mapping from string
//! keys to string values, with section order and key order preserved as
//! written.
//!
//! Format rules:
//! - Sections in brackets: `[FILESYSTEM]`
//! - `key = value` (or `key: value`); surrounding whitespace is stripped
//!   from both key and value; key case is preserved exactly
//! - A value continues onto following lines when they are indented deeper
//!   than the key; blank lines between continuation lines are retained as
//!   empty lines in the value
//! - Full-line comments start with `#` or `;`; there is no inline comment
//!   stripping
//! - A later duplicate key overwrites the earlier one

use std::path::Path;

use errors::ConfigError;

/// One named section of the configuration document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniSection {
    pub name: String,
    entries: Vec<(String, String)>,
}

impl IniSection {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: Vec::new(),
        }
    }

    /// Look up a key in this section. Key comparison is exact-case.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Keys in file order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn set(&mut self, key: String, value: String) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    fn append_to_last(&mut self, continuation: &str) {
        if let Some((_, value)) = self.entries.last_mut() {
            value.push('\n');
            value.push_str(continuation);
        }
    }
}

/// An ordered collection of named sections, loaded once and immutable
/// thereafter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDocument {
    sections: Vec<IniSection>,
}

impl ConfigDocument {
    /// Read and parse a configuration file.
    ///
    /// A missing or unreadable file is [`ConfigError::MissingFile`]: a
    /// deployment cannot proceed without its configuration, so there is no
    /// partial state and no retry.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|_e| ConfigError::MissingFile {
                path: path.display().to_string(),
            })?;
        tracing::debug!(path = %path.display(), "loaded configuration file");
        Self::parse(&contents)
    }

    /// Parse configuration text into an ordered document.
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let mut doc = ConfigDocument::default();
        let mut current: Option<usize> = None;
        // Whether the current section's last entry can still accept
        // continuation lines.
        let mut in_value = false;
        // Blank lines seen since the last continuation line; they belong to
        // the value only if another continuation line follows.
        let mut pending_blanks = 0usize;

        for (idx, raw_line) in input.lines().enumerate() {
            let line_no = idx + 1;
            let trimmed = raw_line.trim();

            if trimmed.is_empty() {
                if in_value {
                    pending_blanks += 1;
                }
                continue;
            }

            if trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            let indented = raw_line.starts_with(' ') || raw_line.starts_with('\t');

            if indented && in_value {
                let section = &mut doc.sections[current.ok_or(ConfigError::Parse {
                    line: line_no,
                    reason: "continuation line outside of a section".to_string(),
                })?];
                for _ in 0..pending_blanks {
                    section.append_to_last("");
                }
                pending_blanks = 0;
                section.append_to_last(trimmed);
                continue;
            }

            if trimmed.starts_with('[') {
                let Some(name) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']'))
                else {
                    return Err(ConfigError::Parse {
                        line: line_no,
                        reason: format!("malformed section header: {trimmed}"),
                    });
                };
                current = Some(doc.get_or_create_section(name.trim()));
                in_value = false;
                pending_blanks = 0;
                continue;
            }

            let Some(delim) = trimmed.find(['=', ':']) else {
                return Err(ConfigError::Parse {
                    line: line_no,
                    reason: format!("expected 'key = value', got: {trimmed}"),
                });
            };
            let key = trimmed[..delim].trim();
            let value = trimmed[delim + 1..].trim();
            if key.is_empty() {
                return Err(ConfigError::Parse {
                    line: line_no,
                    reason: "empty key".to_string(),
                });
            }

            let Some(section_idx) = current else {
                return Err(ConfigError::Parse {
                    line: line_no,
                    reason: format!("key '{key}' appears before any section header"),
                });
            };
            doc.sections[section_idx].set(key.to_string(), value.to_string());
            in_value = true;
            pending_blanks = 0;
        }

        Ok(doc)
    }

    fn get_or_create_section(&mut self, name: &str) -> usize {
        if let Some(idx) = self.sections.iter().position(|s| s.name == name) {
            idx
        } else {
            self.sections.push(IniSection::new(name));
            self.sections.len() - 1
        }
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.sections.iter().any(|s| s.name == name)
    }

    pub fn section(&self, name: &str) -> Option<&IniSection> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Look up a value; `None` when the section or key is absent. Callers
    /// with a documented default use this; required keys go through
    /// [`ConfigDocument::require`].
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section)?.get(key)
    }

    /// Look up a required value, distinguishing a missing section from a
    /// missing key so the failure names exactly what is absent.
    pub fn require(&self, section: &str, key: &str) -> Result<&str, ConfigError> {
        let sec = self
            .section(section)
            .ok_or_else(|| ConfigError::MissingSection {
                section: section.to_string(),
            })?;
        sec.get(key).ok_or_else(|| ConfigError::MissingKey {
            section: section.to_string(),
            key: key.to_string(),
        })
    }

    /// Section names in file order.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_sections() {
        let doc = ConfigDocument::parse(
            "[WEB]\nhost = localhost\nport = 8000\n\n[FILESYSTEM]\nvolume_name = my-vol\n",
        )
        .unwrap();
        assert_eq!(doc.get("WEB", "host"), Some("localhost"));
        assert_eq!(doc.get("WEB", "port"), Some("8000"));
        assert_eq!(doc.get("FILESYSTEM", "volume_name"), Some("my-vol"));
    }

    #[test]
    fn test_parse_preserves_key_case() {
        let doc = ConfigDocument::parse("[TOKENS]\nHF_TOKEN = .env\nCivitai_Api_Token = abc\n")
            .unwrap();
        let tokens = doc.section("TOKENS").unwrap();
        let keys: Vec<&str> = tokens.keys().collect();
        assert_eq!(keys, vec!["HF_TOKEN", "Civitai_Api_Token"]);
        assert_eq!(doc.get("TOKENS", "HF_TOKEN"), Some(".env"));
        assert_eq!(doc.get("TOKENS", "hf_token"), None);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let doc = ConfigDocument::parse("[WEB]\n  host   =   0.0.0.0   \n").unwrap();
        assert_eq!(doc.get("WEB", "host"), Some("0.0.0.0"));
    }

    #[test]
    fn test_parse_multiline_continuation() {
        let doc = ConfigDocument::parse(
            "[MODEL_PATHS]\nvae = /app/models/vae\n    /vol/vae\n    /extra/vae\n",
        )
        .unwrap();
        assert_eq!(
            doc.get("MODEL_PATHS", "vae"),
            Some("/app/models/vae\n/vol/vae\n/extra/vae")
        );
    }

    #[test]
    fn test_parse_multiline_keeps_interior_blank_lines() {
        let doc = ConfigDocument::parse(
            "[MODEL_PATHS]\nloras = /app/models/loras\n\n    /vol/loras\n",
        )
        .unwrap();
        assert_eq!(
            doc.get("MODEL_PATHS", "loras"),
            Some("/app/models/loras\n\n/vol/loras")
        );
    }

    #[test]
    fn test_parse_trailing_blank_lines_not_in_value() {
        let doc = ConfigDocument::parse("[MODEL_PATHS]\nvae = /app/models/vae\n\n\n[WEB]\nport = 1\n")
            .unwrap();
        assert_eq!(doc.get("MODEL_PATHS", "vae"), Some("/app/models/vae"));
    }

    #[test]
    fn test_parse_full_line_comments() {
        let doc = ConfigDocument::parse(
            "# leading comment\n[WEB]\n; another comment\nhost = localhost\n",
        )
        .unwrap();
        assert_eq!(doc.get("WEB", "host"), Some("localhost"));
    }

    #[test]
    fn test_parse_no_inline_comment_stripping() {
        let doc = ConfigDocument::parse("[WEB]\nhost = localhost # not a comment\n").unwrap();
        assert_eq!(doc.get("WEB", "host"), Some("localhost # not a comment"));
    }

    #[test]
    fn test_parse_duplicate_key_last_wins() {
        let doc = ConfigDocument::parse("[WEB]\nport = 8000\nport = 9000\n").unwrap();
        assert_eq!(doc.get("WEB", "port"), Some("9000"));
        assert_eq!(doc.section("WEB").unwrap().len(), 1);
    }

    #[test]
    fn test_parse_key_before_section_fails() {
        let result = ConfigDocument::parse("host = localhost\n");
        assert!(matches!(result, Err(ConfigError::Parse { line: 1, .. })));
    }

    #[test]
    fn test_parse_malformed_line_reports_line_number() {
        let result = ConfigDocument::parse("[WEB]\nhost = ok\nnonsense\n");
        assert!(matches!(result, Err(ConfigError::Parse { line: 3, .. })));
    }

    #[test]
    fn test_require_missing_section_vs_key() {
        let doc = ConfigDocument::parse("[WEB]\nhost = localhost\n").unwrap();
        assert!(matches!(
            doc.require("RESOURCES", "gpu_type"),
            Err(ConfigError::MissingSection { .. })
        ));
        assert!(matches!(
            doc.require("WEB", "port"),
            Err(ConfigError::MissingKey { .. })
        ));
        assert_eq!(doc.require("WEB", "host").unwrap(), "localhost");
    }

    #[test]
    fn test_section_order_preserved() {
        let doc =
            ConfigDocument::parse("[B]\nx = 1\n[A]\ny = 2\n[C]\nz = 3\n").unwrap();
        let names: Vec<&str> = doc.section_names().collect();
        assert_eq!(names, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_from_file_missing() {
        let result = ConfigDocument::from_file(Path::new("/nonexistent/config.ini"));
        assert!(matches!(result, Err(ConfigError::MissingFile { .. })));
    }
}
