//! Generation pipeline for the `extra_model_paths.yaml` document.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

use config::ConfigDocument;
use errors::{ConfigError, GenerateError};

use crate::defaults::default_model_paths;

/// Top-level key of the generated document; ComfyUI looks its search paths
/// up under this name.
pub const APP_KEY: &str = "comfyui";

/// Filesystem settings as the generator consumes them. Unlike the full
/// settings resolver, every key here has a documented default; only an
/// entirely missing `[FILESYSTEM]` section is an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesystemConfig {
    pub comfyui_dir: String,
    pub volume_mount_location: String,
    pub custom_nodes_dir_name: String,
    pub custom_output_dir_name: String,
}

/// What a successful generation produced, for summary output.
#[derive(Debug, Clone)]
pub struct GenerateReport {
    pub output_file: PathBuf,
    pub base_path: String,
    pub volume_mount_location: String,
    pub custom_nodes_dir_name: String,
    pub custom_output_dir_name: String,
    /// Category name and how many search directories its block holds, in
    /// emission order.
    pub categories: Vec<(String, usize)>,
}

/// Generates the model-path document from a configuration file.
///
/// Linear pipeline: `unloaded -> loaded -> generated -> validated`. Every
/// stage short-circuits to a terminal failure; there is no resume between
/// stages.
pub struct ModelPathsGenerator {
    config_file: PathBuf,
    output_file: PathBuf,
    document: Option<ConfigDocument>,
}

impl ModelPathsGenerator {
    pub fn new(config_file: impl Into<PathBuf>, output_file: impl Into<PathBuf>) -> Self {
        Self {
            config_file: config_file.into(),
            output_file: output_file.into(),
            document: None,
        }
    }

    /// Load the configuration file. An absent or unparsable file surfaces
    /// here with the path named, so the caller can abort the pipeline with
    /// a clear message instead of a raw parse error.
    pub fn load_config(&mut self) -> Result<(), GenerateError> {
        let doc = ConfigDocument::from_file(&self.config_file)?;
        tracing::info!(path = %self.config_file.display(), "configuration loaded");
        self.document = Some(doc);
        Ok(())
    }

    fn document(&self) -> Result<&ConfigDocument, GenerateError> {
        self.document
            .as_ref()
            .ok_or_else(|| GenerateError::Validation {
                reason: "configuration not loaded".to_string(),
            })
    }

    /// Extract filesystem configuration, applying documented defaults for
    /// optional keys. An entirely missing `[FILESYSTEM]` section is an
    /// error with a logged cause.
    pub fn filesystem_config(&self) -> Result<FilesystemConfig, GenerateError> {
        let doc = self.document()?;
        if !doc.has_section("FILESYSTEM") {
            tracing::warn!("missing [FILESYSTEM] section in configuration");
            return Err(GenerateError::Config(ConfigError::MissingSection {
                section: "FILESYSTEM".to_string(),
            }));
        }

        Ok(FilesystemConfig {
            comfyui_dir: doc
                .get("FILESYSTEM", "comfyui_dir")
                .unwrap_or("/root/comfy/ComfyUI")
                .to_string(),
            volume_mount_location: doc
                .get("FILESYSTEM", "volume_mount_location")
                .unwrap_or("/root/per_comfy-storage")
                .to_string(),
            custom_nodes_dir_name: doc
                .get("FILESYSTEM", "custom_nodes_dir_name")
                .unwrap_or("custom_nodes")
                .to_string(),
            custom_output_dir_name: doc
                .get("FILESYSTEM", "custom_output_dir_name")
                .unwrap_or("output")
                .to_string(),
        })
    }

    /// Split a multiline configuration value into trimmed, non-empty path
    /// lines, preserving order.
    pub fn parse_multiline(value: &str) -> Vec<String> {
        value
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Category -> newline-joined search block, in configuration order.
    /// Falls back to the built-in default table when the `[MODEL_PATHS]`
    /// section is absent; this is the only graceful-degradation path.
    pub fn model_paths(&self, fs: &FilesystemConfig) -> Result<Vec<(String, String)>, GenerateError> {
        let doc = self.document()?;
        let Some(section) = doc.section("MODEL_PATHS") else {
            tracing::warn!("no [MODEL_PATHS] section found, using default model paths");
            return Ok(default_model_paths(
                &fs.comfyui_dir,
                &fs.volume_mount_location,
            ));
        };

        let mut paths = Vec::with_capacity(section.len());
        for key in section.keys() {
            let value = section.get(key).unwrap_or_default();
            paths.push((key.to_string(), Self::parse_multiline(value).join("\n")));
        }
        tracing::info!(count = paths.len(), "loaded model path configurations");
        Ok(paths)
    }

    /// Run the full pipeline and write the document.
    ///
    /// The document is one top-level mapping under [`APP_KEY`] holding
    /// `base_path`, one entry per category, and `custom_nodes`, emitted in
    /// insertion order as block-style YAML. The file is written to a
    /// temporary sibling and renamed into place so a failed run never
    /// leaves a half-written document.
    pub fn generate(&mut self) -> Result<GenerateReport, GenerateError> {
        if self.document.is_none() {
            self.load_config()?;
        }
        let fs = self.filesystem_config()?;
        let model_paths = self.model_paths(&fs)?;

        let mut app = Mapping::new();
        app.insert(
            Value::from("base_path"),
            Value::from(fs.comfyui_dir.clone()),
        );
        for (category, block) in &model_paths {
            app.insert(Value::from(category.clone()), Value::from(block.clone()));
        }
        app.insert(
            Value::from("custom_nodes"),
            Value::from(format!(
                "{}/{}",
                fs.volume_mount_location, fs.custom_nodes_dir_name
            )),
        );

        let mut root = Mapping::new();
        root.insert(Value::from(APP_KEY), Value::Mapping(app));

        let yaml = serde_yaml::to_string(&Value::Mapping(root)).map_err(|e| {
            GenerateError::Serialize {
                reason: e.to_string(),
            }
        })?;

        self.write_atomic(&yaml)?;
        tracing::info!(path = %self.output_file.display(), "generated model path document");

        Ok(GenerateReport {
            output_file: self.output_file.clone(),
            base_path: fs.comfyui_dir.clone(),
            volume_mount_location: fs.volume_mount_location.clone(),
            custom_nodes_dir_name: fs.custom_nodes_dir_name.clone(),
            custom_output_dir_name: fs.custom_output_dir_name.clone(),
            categories: model_paths
                .iter()
                .map(|(category, block)| (category.clone(), block.lines().count()))
                .collect(),
        })
    }

    fn write_atomic(&self, contents: &str) -> Result<(), GenerateError> {
        let dir = self
            .output_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let io_err = |source: std::io::Error| GenerateError::Io {
            path: self.output_file.display().to_string(),
            source,
        };

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(contents.as_bytes()).map_err(io_err)?;
        tmp.persist(&self.output_file)
            .map_err(|e| io_err(e.error))?;
        Ok(())
    }

    /// Smoke-test the just-written document: it must re-parse as a mapping
    /// holding the application key with a non-empty `base_path` string.
    /// Deliberately shallow; category contents are not validated.
    pub fn validate(&self) -> Result<(), GenerateError> {
        let contents = std::fs::read_to_string(&self.output_file).map_err(|source| {
            GenerateError::Io {
                path: self.output_file.display().to_string(),
                source,
            }
        })?;

        let value: Value =
            serde_yaml::from_str(&contents).map_err(|e| GenerateError::Validation {
                reason: format!("invalid YAML syntax: {e}"),
            })?;

        let root = value.as_mapping().ok_or_else(|| GenerateError::Validation {
            reason: "document root is not a mapping".to_string(),
        })?;
        let app = root
            .get(APP_KEY)
            .and_then(Value::as_mapping)
            .ok_or_else(|| GenerateError::Validation {
                reason: format!("missing '{APP_KEY}' section"),
            })?;
        let base_path = app
            .get("base_path")
            .and_then(Value::as_str)
            .ok_or_else(|| GenerateError::Validation {
                reason: format!("missing 'base_path' in '{APP_KEY}' section"),
            })?;
        if base_path.is_empty() {
            return Err(GenerateError::Validation {
                reason: "'base_path' is empty".to_string(),
            });
        }

        tracing::info!("model path document validated");
        Ok(())
    }
}
