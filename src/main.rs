use anyhow::{Context, Result};
use cli::{Cli, Commands, ConfigArgs, ExportArgs, PreviewArgs};
use config::{Configuration, CONFIG_FILE_NAME};
use diagrams::DiagramCache;
use export::Exporter;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

mod cli;
mod config;
mod diagrams;
mod export;
mod sinks;
mod source;
mod transform;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = try_main() {
        eprintln!("{}: {e:#}", console::style("Error").red());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn try_main() -> Result<()> {
    use clap::Parser;
    let cli = Cli::parse();

    match cli.command {
        Commands::Export(args) => export(args),
        Commands::Preview(args) => preview(args),
        Commands::Config(args) => write_config(args),
    }
}

fn canonical_root(root: &Path) -> Result<PathBuf> {
    root.canonicalize()
        .with_context(|| format!("Failed to resolve project root {}", root.display()))
}

fn diagram_cache(root: &Path, config: &Configuration, offline: bool) -> DiagramCache {
    DiagramCache::from_config(
        &config.diagrams,
        config.assets_dir(root),
        root.to_path_buf(),
        offline,
    )
}

fn export(args: ExportArgs) -> Result<()> {
    let root = canonical_root(&args.root)?;
    let mut config = Configuration::load(&root, args.config.as_deref())?;
    if let Some(output_dir) = args.output_dir {
        config.output_dir = output_dir;
    }
    config.debug_markdown |= args.debug_markdown;

    let diagrams = diagram_cache(&root, &config, args.offline);
    let exporter = Exporter::new(root, config, diagrams);

    let progress = ProgressBar::new(0);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("can parse progress style")
            .progress_chars("#>-"),
    );
    progress.set_message("Exporting chapters...");

    let stats = exporter.run(&progress);
    progress.finish_and_clear();
    let stats = stats.with_context(|| "Failed to export course")?;

    println!();
    println!("  Documents: {}", stats.records.len());
    println!("  Output:    {}", stats.output_dir.display());
    println!(
        "  Mermaid:   {}/{} rendered, {} failed",
        stats.diagrams.rendered, stats.diagrams.found, stats.diagrams.failed
    );
    Ok(())
}

fn preview(args: PreviewArgs) -> Result<()> {
    let root = canonical_root(&args.root)?;
    let config = Configuration::load(&root, None)?;
    let diagrams = diagram_cache(&root, &config, args.offline);
    let markdown = Exporter::new(root, config, diagrams).preview(&args.file)?;
    print!("{markdown}");
    Ok(())
}

fn write_config(args: ConfigArgs) -> Result<()> {
    use dialoguer::theme::ColorfulTheme;
    use dialoguer::Confirm;

    let root = canonical_root(&args.root)?;
    let config = toml::to_string_pretty(&Configuration::default())
        .with_context(|| "Failed to convert configuration to TOML")?;

    let config_path = root.join(CONFIG_FILE_NAME);
    if config_path.exists()
        && !Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "{CONFIG_FILE_NAME} already exists, do you want to override it?"
            ))
            .interact()?
    {
        println!("Configuration:");
        println!("{config}");
    } else {
        std::fs::write(&config_path, config)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        println!("{} written!", config_path.display());
    }

    Ok(())
}
