use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use model_paths::ModelPathsGenerator;

use crate::output;

#[derive(Args)]
pub struct GeneratePathsArgs {
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
        help = "Path of the YAML document to write",
        default_value = "extra_model_paths.yaml"
    )]
    pub output: PathBuf,
}

/// Runs the full generation pipeline and the validation pass. Any stage
/// failure bubbles up and the process exits non-zero; that exit code is the
/// contract automation relies on.
pub fn run(args: GeneratePathsArgs) -> Result<()> {
    output::header("ComfyUI Model Paths Generator");

    let mut generator = ModelPathsGenerator::new(&args.config, &args.output);
    let report = generator.generate()?;

    println!("\n{}", "Filesystem configuration:".bold());
    println!("  base path (ComfyUI): {}", report.base_path.cyan());
    println!("  volume mount:        {}", report.volume_mount_location.cyan());
    println!(
        "  custom nodes dir:    {}",
        report.custom_nodes_dir_name.cyan()
    );
    println!(
        "  output dir:          {}",
        report.custom_output_dir_name.cyan()
    );

    println!(
        "\n{} {}",
        "Model categories configured:".bold(),
        report.categories.len()
    );
    for (category, path_count) in &report.categories {
        println!("  {category}: {path_count} path(s)");
    }

    generator.validate()?;

    output::success(&format!(
        "Generated and validated {}",
        report.output_file.display()
    ));
    Ok(())
}
