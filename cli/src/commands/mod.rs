pub mod download;
pub mod generate_paths;
pub mod show_config;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "comfydeck",
    author,
    version,
    about = "Comfydeck - deployment configuration toolkit for ComfyUI sandboxes",
    long_about = "Resolves the deployment configuration (config.ini + secrets), generates the \
                  extra_model_paths.yaml document ComfyUI reads to locate model assets, and \
                  drives bulk model weight downloads onto the persistent volume."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Generate extra_model_paths.yaml from the configuration file")]
    GeneratePaths(generate_paths::GeneratePathsArgs),

    #[command(about = "Resolve and print the deployment settings (tokens masked)")]
    ShowConfig(show_config::ShowConfigArgs),

    #[command(about = "Download model weights to the persistent volume via aria2c")]
    Download(download::DownloadArgs),
}
