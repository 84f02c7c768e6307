//! Model weight download manifest and aria2c invocation.
//!
//! Transfer behavior (parallel connections, resume, timeouts) belongs to
//! aria2c; this module only builds the argument vector, skips artifacts
//! that already exist on the volume, and propagates the exit status.

use std::path::Path;
use std::process::Command;

use config::Settings;
use errors::DownloadError;

/// One downloadable model weight file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelArtifact {
    pub filename: &'static str,
    pub url: &'static str,
    /// Subdirectory of the volume mount the file lands in.
    pub dir: &'static str,
    pub requires_auth: bool,
    pub approx_size: &'static str,
}

/// The FLUX.2 Klein 9B model set: diffusion model, text encoder, and VAE.
/// The diffusion model is license-gated and needs a Hugging Face token.
pub fn flux_klein_artifacts() -> Vec<ModelArtifact> {
    vec![
        ModelArtifact {
            filename: "flux-2-klein-9b.safetensors",
            url: "https://huggingface.co/black-forest-labs/FLUX.2-klein-9B/resolve/main/flux-2-klein-9b.safetensors",
            dir: "diffusion_models",
            requires_auth: true,
            approx_size: "~18GB",
        },
        ModelArtifact {
            filename: "qwen_3_8b_fp8mixed.safetensors",
            url: "https://huggingface.co/Comfy-Org/vae-text-encorder-for-flux-klein-9b/resolve/main/split_files/text_encoders/qwen_3_8b_fp8mixed.safetensors",
            dir: "text_encoders",
            requires_auth: false,
            approx_size: "~8GB",
        },
        ModelArtifact {
            filename: "flux2-vae.safetensors",
            url: "https://huggingface.co/Comfy-Org/flux2-dev/resolve/main/split_files/vae/flux2-vae.safetensors",
            dir: "vae",
            requires_auth: false,
            approx_size: "~335MB",
        },
    ]
}

/// Build the fixed aria2c argument vector for one artifact: 16 parallel
/// connections, 1M chunks, resume enabled, no preallocation.
pub fn aria2_args(artifact: &ModelArtifact, dest_dir: &str, token: Option<&str>) -> Vec<String> {
    let mut args = vec![
        "-x".to_string(),
        "16".to_string(),
        "-s".to_string(),
        "16".to_string(),
        "-k".to_string(),
        "1M".to_string(),
        "-c".to_string(),
        "--file-allocation=none".to_string(),
        "-d".to_string(),
        dest_dir.to_string(),
        "-o".to_string(),
        artifact.filename.to_string(),
    ];
    if artifact.requires_auth {
        if let Some(token) = token {
            args.push(format!("--header=Authorization: Bearer {token}"));
        }
    }
    args.push(artifact.url.to_string());
    args
}

/// Download every artifact in the manifest to the configured volume.
///
/// A required-but-unresolved HF token fails before any invocation: an
/// unresolved secret is a configuration error here, not something to let
/// the external tool discover mid-transfer. Artifacts already present are
/// skipped. Returns the names of the artifacts actually downloaded.
pub fn download_artifacts(
    settings: &Settings,
    artifacts: &[ModelArtifact],
) -> Result<Vec<String>, DownloadError> {
    let token = if artifacts.iter().any(|a| a.requires_auth) {
        Some(
            settings
                .token("hf_token")
                .ok_or_else(|| DownloadError::MissingToken {
                    token: "hf_token".to_string(),
                })?,
        )
    } else {
        None
    };

    let volume = &settings.filesystem.volume_mount_location;
    let mut downloaded = Vec::new();

    for artifact in artifacts {
        let dest_dir = format!("{volume}/{}", artifact.dir);
        let target = format!("{dest_dir}/{}", artifact.filename);

        if Path::new(&target).exists() {
            tracing::info!(file = artifact.filename, "already present, skipping");
            continue;
        }

        std::fs::create_dir_all(&dest_dir).map_err(|source| DownloadError::Io {
            path: dest_dir.clone(),
            source,
        })?;

        tracing::info!(
            file = artifact.filename,
            size = artifact.approx_size,
            dest = %dest_dir,
            "starting download"
        );

        let status = Command::new("aria2c")
            .args(aria2_args(artifact, &dest_dir, token))
            .status()
            .map_err(|e| DownloadError::Spawn {
                reason: e.to_string(),
            })?;

        if !status.success() {
            return Err(DownloadError::Failed {
                artifact: artifact.filename.to_string(),
                code: status.code().unwrap_or(-1),
            });
        }
        downloaded.push(artifact.filename.to_string());
    }

    Ok(downloaded)
}
