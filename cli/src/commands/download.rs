use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use config::Settings;

use crate::downloads::{download_artifacts, flux_klein_artifacts};
use crate::output;

#[derive(Args)]
pub struct DownloadArgs {
    #[arg(
        short,
        long,
        help = "Path to the configuration file",
        default_value = "config.ini"
    )]
    pub config: PathBuf,

    #[arg(
        short,
        long,
        help = "Path to the secrets file",
        default_value = ".env"
    )]
    pub secrets: PathBuf,

    #[arg(
        long,
        help = "Only download artifacts landing in this volume subdirectory (e.g. vae)"
    )]
    pub model_dir: Option<String>,
}

/// Downloads the FLUX.2 Klein model set onto the persistent volume.
pub fn run(args: DownloadArgs) -> Result<()> {
    output::header("FLUX.2 Klein model download");

    let settings = Settings::load(&args.config, &args.secrets)?;

    let mut artifacts = flux_klein_artifacts();
    if let Some(filter) = &args.model_dir {
        artifacts.retain(|a| a.dir == filter);
        if artifacts.is_empty() {
            output::warn(&format!("no artifacts land in '{filter}'"));
            return Ok(());
        }
    }

    for artifact in &artifacts {
        let gated = if artifact.requires_auth {
            "(requires HF token)"
        } else {
            "(public)"
        };
        output::info(&format!(
            "{} {} {gated}",
            artifact.filename, artifact.approx_size
        ));
    }

    let downloaded = download_artifacts(&settings, &artifacts)?;

    if downloaded.is_empty() {
        output::success("all artifacts already present on the volume");
    } else {
        output::success(&format!(
            "downloaded {} artifact(s) to {}",
            downloaded.len(),
            settings.filesystem.volume_mount_location
        ));
    }
    Ok(())
}
