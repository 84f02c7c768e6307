//! # Resolved Settings
//!
//! The typed, immutable settings record consumed by the deployment
//! launcher. Built once per process invocation from the configuration file
//! and the secrets file, then passed by reference to every consumer; there
//! is no ambient global lookup and nothing is persisted.
//!
//! Fallbacks apply only to absent keys. A present-but-malformed value
//! (for example a non-numeric port) is a fatal configuration error naming
//! the offending section and key.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use errors::ConfigError;

use crate::document::ConfigDocument;
use crate::secrets::{load_secrets_file, resolve_value};

/// Web server settings from the `[WEB]` section.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WebSettings {
    /// Bind host as configured. See the known defect note in
    /// [`WebSettings::resolve`]: the `localhost` wildcard rewrite is
    /// currently discarded.
    pub host: String,
    pub port: u16,
    pub remote: bool,
}

impl WebSettings {
    fn resolve(doc: &ConfigDocument) -> Result<Self, ConfigError> {
        let raw_host = doc
            .get("WEB", "host")
            .unwrap_or("0.0.0.0")
            .trim()
            .to_lowercase();

        // A `localhost` bind is unreachable from outside the container, so
        // the corrected wildcard host is computed here. Known defect: the
        // raw configured value below shadows the correction, so `localhost`
        // stays `localhost`. Pinned by a test; fixing it is a separately
        // reviewed change, not part of this port.
        let _corrected_host = if raw_host == "localhost" {
            "0.0.0.0".to_string()
        } else {
            raw_host
        };

        Ok(Self {
            host: doc
                .get("WEB", "host")
                .unwrap_or("0.0.0.0")
                .trim()
                .to_string(),
            port: get_u16(doc, "WEB", "port", 8000)?,
            remote: get_bool(doc, "WEB", "remote", true)?,
        })
    }
}

/// Filesystem settings from the `[FILESYSTEM]` section.
///
/// The two derived directories are exactly
/// `<volume_mount_location>/<sub_name>` with a single separator; no
/// normalization, existence checking, or traversal resolution happens here.
/// That burden is deferred to whoever consumes the paths.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FilesystemSettings {
    pub volume_name: String,
    pub volume_mount_location: String,
    pub comfyui_dir: String,
    pub custom_nodes_dir_name: String,
    pub custom_output_dir_name: String,
    pub custom_nodes_dir: String,
    pub custom_output_dir: String,
}

impl FilesystemSettings {
    fn resolve(doc: &ConfigDocument) -> Result<Self, ConfigError> {
        let volume_name = doc.require("FILESYSTEM", "volume_name")?.to_string();
        let volume_mount_location = doc
            .require("FILESYSTEM", "volume_mount_location")?
            .to_string();
        let comfyui_dir = doc.require("FILESYSTEM", "comfyui_dir")?.to_string();
        let custom_nodes_dir_name = doc
            .get("FILESYSTEM", "custom_nodes_dir_name")
            .unwrap_or("custom_nodes")
            .to_string();
        let custom_output_dir_name = doc
            .get("FILESYSTEM", "custom_output_dir_name")
            .unwrap_or("output")
            .to_string();

        let custom_nodes_dir = format!("{volume_mount_location}/{custom_nodes_dir_name}");
        let custom_output_dir = format!("{volume_mount_location}/{custom_output_dir_name}");

        Ok(Self {
            volume_name,
            volume_mount_location,
            comfyui_dir,
            custom_nodes_dir_name,
            custom_output_dir_name,
            custom_nodes_dir,
            custom_output_dir,
        })
    }
}

/// Container resource limits from the `[RESOURCES]` section.
///
/// CPU and memory are optional: when absent they are omitted from the
/// outgoing container arguments entirely rather than sent as sentinel
/// values.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResourceSettings {
    pub gpu_type: String,
    pub cpu: Option<String>,
    pub memory: Option<String>,
    pub max_containers: u32,
    pub scaledown_window: u32,
    pub timeout: u32,
    pub max_inputs: u32,
}

impl ResourceSettings {
    fn resolve(doc: &ConfigDocument) -> Result<Self, ConfigError> {
        Ok(Self {
            gpu_type: doc.get("RESOURCES", "gpu_type").unwrap_or("t4").to_string(),
            cpu: doc.get("RESOURCES", "cpu").map(|v| v.trim().to_string()),
            memory: doc.get("RESOURCES", "memory").map(|v| v.trim().to_string()),
            max_containers: get_u32(doc, "RESOURCES", "max_containers", 1)?,
            scaledown_window: get_u32(doc, "RESOURCES", "scaledown_window", 30)?,
            timeout: get_u32(doc, "RESOURCES", "timeout", 3200)?,
            max_inputs: get_u32(doc, "RESOURCES", "max_inputs", 10)?,
        })
    }
}

/// The resolved settings record.
///
/// Token map keys are normalized to lowercase; a `None` value is an
/// unresolved secret reference ("no value"), which callers must handle
/// explicitly before any downstream use.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Settings {
    pub tokens: BTreeMap<String, Option<String>>,
    pub web: WebSettings,
    pub filesystem: FilesystemSettings,
    pub resources: ResourceSettings,
}

impl Settings {
    /// Load and resolve settings from a configuration file and a secrets
    /// file.
    ///
    /// Both files must exist; a missing file is a fatal, non-recoverable
    /// [`ConfigError::MissingFile`] with no partial state returned.
    pub fn load(config_path: &Path, secrets_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::MissingFile {
                path: config_path.display().to_string(),
            });
        }
        if !secrets_path.exists() {
            return Err(ConfigError::MissingFile {
                path: secrets_path.display().to_string(),
            });
        }

        let doc = ConfigDocument::from_file(config_path)?;
        load_secrets_file(secrets_path)?;
        Self::resolve(&doc)
    }

    /// Resolve settings from an already-parsed document. Secret references
    /// are looked up in the current process environment.
    pub fn resolve(doc: &ConfigDocument) -> Result<Self, ConfigError> {
        let tokens_section = doc
            .section("TOKENS")
            .ok_or_else(|| ConfigError::MissingSection {
                section: "TOKENS".to_string(),
            })?;

        let mut tokens = BTreeMap::new();
        for key in tokens_section.keys() {
            tokens.insert(key.to_lowercase(), resolve_value(doc, "TOKENS", key));
        }

        let settings = Self {
            tokens,
            web: WebSettings::resolve(doc)?,
            filesystem: FilesystemSettings::resolve(doc)?,
            resources: ResourceSettings::resolve(doc)?,
        };
        tracing::debug!(
            host = %settings.web.host,
            port = settings.web.port,
            gpu = %settings.resources.gpu_type,
            "resolved settings"
        );
        Ok(settings)
    }

    /// A resolved, non-empty token by its lowercase logical name.
    pub fn token(&self, name: &str) -> Option<&str> {
        self.tokens
            .get(name)
            .and_then(|v| v.as_deref())
            .filter(|v| !v.is_empty())
    }
}

fn get_u32(doc: &ConfigDocument, section: &str, key: &str, default: u32) -> Result<u32, ConfigError> {
    match doc.get(section, key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_e| ConfigError::MalformedValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            expected: "integer",
        }),
    }
}

fn get_u16(doc: &ConfigDocument, section: &str, key: &str, default: u16) -> Result<u16, ConfigError> {
    match doc.get(section, key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_e| ConfigError::MalformedValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            expected: "port number",
        }),
    }
}

fn get_bool(doc: &ConfigDocument, section: &str, key: &str, default: bool) -> Result<bool, ConfigError> {
    match doc.get(section, key) {
        None => Ok(default),
        Some(value) => parse_bool(value).ok_or_else(|| ConfigError::MalformedValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            expected: "boolean (1/yes/true/on or 0/no/false/off)",
        }),
    }
}

/// INI boolean vocabulary, case-insensitive.
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Some(true),
        "0" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use std::io::Write;

    const FULL_CONFIG: &str = "\
[TOKENS]
HF_TOKEN = literal-hf
CIVITAI_API_TOKEN = literal-civitai

[WEB]
host = 0.0.0.0
port = 8188
remote = yes

[FILESYSTEM]
volume_name = my-comfy-models
volume_mount_location = /data
comfyui_dir = /root/comfy/ComfyUI
custom_nodes_dir_name = nodes
custom_output_dir_name = renders

[RESOURCES]
gpu_type = a10g
cpu = 4
memory = 16384
max_containers = 2
scaledown_window = 60
timeout = 1800
max_inputs = 4
";

    fn resolve(input: &str) -> Result<Settings, ConfigError> {
        Settings::resolve(&ConfigDocument::parse(input).unwrap())
    }

    #[test]
    fn test_full_config_resolves() {
        let settings = resolve(FULL_CONFIG).unwrap();
        assert_eq!(settings.web.host, "0.0.0.0");
        assert_eq!(settings.web.port, 8188);
        assert!(settings.web.remote);
        assert_eq!(settings.filesystem.volume_name, "my-comfy-models");
        assert_eq!(settings.filesystem.custom_nodes_dir, "/data/nodes");
        assert_eq!(settings.filesystem.custom_output_dir, "/data/renders");
        assert_eq!(settings.resources.gpu_type, "a10g");
        assert_eq!(settings.resources.cpu.as_deref(), Some("4"));
        assert_eq!(settings.resources.memory.as_deref(), Some("16384"));
        assert_eq!(settings.resources.max_containers, 2);
        assert_eq!(settings.tokens["hf_token"].as_deref(), Some("literal-hf"));
    }

    #[test]
    fn test_defaults_for_absent_optional_keys() {
        let settings = resolve(
            "[TOKENS]\nHF_TOKEN = x\n[WEB]\n[FILESYSTEM]\nvolume_name = v\nvolume_mount_location = /data\ncomfyui_dir = /app\n[RESOURCES]\n",
        )
        .unwrap();
        assert_eq!(settings.web.host, "0.0.0.0");
        assert_eq!(settings.web.port, 8000);
        assert!(settings.web.remote);
        assert_eq!(settings.filesystem.custom_nodes_dir_name, "custom_nodes");
        assert_eq!(settings.filesystem.custom_output_dir_name, "output");
        assert_eq!(settings.filesystem.custom_nodes_dir, "/data/custom_nodes");
        assert_eq!(settings.filesystem.custom_output_dir, "/data/output");
        assert_eq!(settings.resources.gpu_type, "t4");
        assert_eq!(settings.resources.cpu, None);
        assert_eq!(settings.resources.memory, None);
        assert_eq!(settings.resources.max_containers, 1);
        assert_eq!(settings.resources.scaledown_window, 30);
        assert_eq!(settings.resources.timeout, 3200);
        assert_eq!(settings.resources.max_inputs, 10);
    }

    #[test]
    fn test_localhost_override_is_nullified_known_defect() {
        // Documents current behavior: the wildcard correction is computed
        // and then discarded, so `localhost` survives to the final record.
        let settings = resolve(
            "[TOKENS]\nHF_TOKEN = x\n[WEB]\nhost = localhost\n[FILESYSTEM]\nvolume_name = v\nvolume_mount_location = /data\ncomfyui_dir = /app\n",
        )
        .unwrap();
        assert_eq!(settings.web.host, "localhost");
    }

    #[test]
    fn test_malformed_port_is_fatal_and_names_key() {
        let err = resolve(
            "[TOKENS]\nHF_TOKEN = x\n[WEB]\nport = eight\n[FILESYSTEM]\nvolume_name = v\nvolume_mount_location = /data\ncomfyui_dir = /app\n",
        )
        .unwrap_err();
        match err {
            ConfigError::MalformedValue { section, key, value, .. } => {
                assert_eq!(section, "WEB");
                assert_eq!(key, "port");
                assert_eq!(value, "eight");
            }
            other => panic!("expected MalformedValue, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_bool_is_fatal() {
        let err = resolve(
            "[TOKENS]\nHF_TOKEN = x\n[WEB]\nremote = maybe\n[FILESYSTEM]\nvolume_name = v\nvolume_mount_location = /data\ncomfyui_dir = /app\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MalformedValue { .. }));
    }

    #[test]
    fn test_bool_vocabulary() {
        for (raw, expected) in [
            ("1", true),
            ("yes", true),
            ("TRUE", true),
            ("On", true),
            ("0", false),
            ("no", false),
            ("False", false),
            ("OFF", false),
        ] {
            assert_eq!(parse_bool(raw), Some(expected), "input {raw:?}");
        }
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_missing_required_filesystem_key() {
        let err = resolve(
            "[TOKENS]\nHF_TOKEN = x\n[FILESYSTEM]\nvolume_name = v\ncomfyui_dir = /app\n",
        )
        .unwrap_err();
        match err {
            ConfigError::MissingKey { section, key } => {
                assert_eq!(section, "FILESYSTEM");
                assert_eq!(key, "volume_mount_location");
            }
            other => panic!("expected MissingKey, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_tokens_section_is_fatal() {
        let err = resolve(
            "[FILESYSTEM]\nvolume_name = v\nvolume_mount_location = /data\ncomfyui_dir = /app\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingSection { .. }));
    }

    #[test]
    fn test_token_keys_lowercased_and_unresolved_kept() {
        let settings = resolve(
            "[TOKENS]\nHF_TOKEN = literal\nCD_SETTINGS_GHOST = .env\n[FILESYSTEM]\nvolume_name = v\nvolume_mount_location = /data\ncomfyui_dir = /app\n",
        )
        .unwrap();
        assert_eq!(settings.tokens["hf_token"].as_deref(), Some("literal"));
        assert_eq!(settings.tokens["cd_settings_ghost"], None);
        assert_eq!(settings.token("hf_token"), Some("literal"));
        assert_eq!(settings.token("cd_settings_ghost"), None);
    }

    #[test]
    #[serial]
    fn test_sentinel_token_resolved_from_env() {
        unsafe {
            env::set_var("CD_SETTINGS_TOKEN", "from-env");
        }
        let settings = resolve(
            "[TOKENS]\nCD_SETTINGS_TOKEN = .env\n[FILESYSTEM]\nvolume_name = v\nvolume_mount_location = /data\ncomfyui_dir = /app\n",
        )
        .unwrap();
        assert_eq!(
            settings.tokens["cd_settings_token"].as_deref(),
            Some("from-env")
        );
        unsafe {
            env::remove_var("CD_SETTINGS_TOKEN");
        }
    }

    #[test]
    fn test_load_missing_config_file() {
        let secrets = tempfile::NamedTempFile::new().unwrap();
        let result = Settings::load(Path::new("/nonexistent/config.ini"), secrets.path());
        assert!(matches!(result, Err(ConfigError::MissingFile { .. })));
    }

    #[test]
    fn test_load_missing_secrets_file() {
        let mut config = tempfile::NamedTempFile::new().unwrap();
        config.write_all(FULL_CONFIG.as_bytes()).unwrap();
        let result = Settings::load(config.path(), Path::new("/nonexistent/.env"));
        assert!(matches!(result, Err(ConfigError::MissingFile { .. })));
    }

    #[test]
    #[serial]
    fn test_load_end_to_end() {
        let mut config = tempfile::NamedTempFile::new().unwrap();
        config
            .write_all(
                "[TOKENS]\nCD_E2E_TOKEN = .env\n[WEB]\nport = 9000\n[FILESYSTEM]\nvolume_name = v\nvolume_mount_location = /data\ncomfyui_dir = /app\n"
                    .as_bytes(),
            )
            .unwrap();
        let mut secrets = tempfile::NamedTempFile::new().unwrap();
        secrets.write_all(b"CD_E2E_TOKEN=secret-value\n").unwrap();
        unsafe {
            env::remove_var("CD_E2E_TOKEN");
        }

        let settings = Settings::load(config.path(), secrets.path()).unwrap();
        assert_eq!(settings.web.port, 9000);
        assert_eq!(
            settings.tokens["cd_e2e_token"].as_deref(),
            Some("secret-value")
        );

        unsafe {
            env::remove_var("CD_E2E_TOKEN");
        }
    }
}
