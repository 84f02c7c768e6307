use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use config::Settings;

use crate::output;

#[derive(Args)]
pub struct ShowConfigArgs {
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
}

/// Resolves settings and prints every cluster. Token values are always
/// masked; only resolution status is shown.
pub fn run(args: ShowConfigArgs) -> Result<()> {
    let settings = Settings::load(&args.config, &args.secrets)?;

    output::header("Resolved deployment settings");

    println!("\n{}", "[tokens]".bold());
    for (name, value) in &settings.tokens {
        println!("  {name}: {}", output::masked(value.as_deref()));
    }

    println!("\n{}", "[web]".bold());
    println!("  host:   {}", settings.web.host.cyan());
    println!("  port:   {}", settings.web.port.to_string().cyan());
    println!("  remote: {}", settings.web.remote.to_string().cyan());

    println!("\n{}", "[filesystem]".bold());
    println!("  volume_name:           {}", settings.filesystem.volume_name);
    println!(
        "  volume_mount_location: {}",
        settings.filesystem.volume_mount_location
    );
    println!("  comfyui_dir:           {}", settings.filesystem.comfyui_dir);
    println!(
        "  custom_nodes_dir:      {}",
        settings.filesystem.custom_nodes_dir
    );
    println!(
        "  custom_output_dir:     {}",
        settings.filesystem.custom_output_dir
    );

    println!("\n{}", "[resources]".bold());
    println!("  gpu_type:         {}", settings.resources.gpu_type);
    println!(
        "  cpu:              {}",
        settings.resources.cpu.as_deref().unwrap_or("(unset)")
    );
    println!(
        "  memory:           {}",
        settings.resources.memory.as_deref().unwrap_or("(unset)")
    );
    println!("  max_containers:   {}", settings.resources.max_containers);
    println!("  scaledown_window: {}", settings.resources.scaledown_window);
    println!("  timeout:          {}", settings.resources.timeout);
    println!("  max_inputs:       {}", settings.resources.max_inputs);

    Ok(())
}
