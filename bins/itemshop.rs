//! Item shop catalog → per-day section files, TSV export and section cards
//!
//! Usage:
//!   itemshop run
//!   itemshop run --mock --data-dir /tmp/shop --no-images
//!   itemshop watch --interval-secs 1800
//!   itemshop normalize --input response.json

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use itemshop::config::Config;
use itemshop::error::PipelineError;
use itemshop::pipeline::{extract_sections, Pipeline};
use itemshop::source::{CatalogSource, HttpCatalog, MockCatalog};

#[derive(Parser)]
#[command(name = "itemshop")]
#[command(about = "Storefront catalog → normalized shop sections")]
struct Cli {
    /// Path to the TOML config; built-in defaults apply when it is missing
    #[arg(long, global = true, default_value = "config/itemshop.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct RunArgs {
    /// Serve the built-in sample catalog instead of calling the API
    #[arg(long)]
    mock: bool,
    #[arg(long)]
    data_dir: Option<String>,
    /// Skip both image downloads and card rendering
    #[arg(long)]
    no_images: bool,
    /// Skip card rendering only
    #[arg(long)]
    no_render: bool,
    #[arg(long)]
    font: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the catalog once and write all outputs
    Run(RunArgs),
    /// Run the pipeline periodically
    Watch {
        #[command(flatten)]
        run: RunArgs,
        #[arg(long)]
        interval_secs: Option<u64>,
    },
    /// Normalize a saved catalog document and print the sections as JSON
    Normalize {
        #[arg(long)]
        input: String,
    },
}

fn apply_overrides(config: &mut Config, args: &RunArgs) {
    if args.mock {
        config.mock.enabled = true;
    }
    if let Some(dir) = &args.data_dir {
        config.output.data_dir = dir.clone();
    }
    if args.no_images {
        config.images.download = false;
        config.images.render = false;
    }
    if args.no_render {
        config.images.render = false;
    }
    if let Some(font) = &args.font {
        config.images.font_path = Some(font.clone());
    }
}

fn get_source(config: &Config) -> Result<Box<dyn CatalogSource>> {
    if config.mock.enabled {
        Ok(Box::new(MockCatalog::new("mock".to_string())))
    } else {
        Ok(Box::new(HttpCatalog::new(
            "mp-item-shop".to_string(),
            &config.source,
        )?))
    }
}

fn build_pipeline(config_path: &str, args: &RunArgs) -> Result<Pipeline> {
    let mut config = Config::load_or_default(config_path)?;
    apply_overrides(&mut config, args);
    let source = get_source(&config)?;
    Ok(Pipeline::new(config, source))
}

fn run_normalize_command(input: &str) -> Result<()> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read catalog document: {}", input))?;
    let document: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse catalog document: {}", input))?;

    let Some(sections) = extract_sections(&document) else {
        return Err(PipelineError::NoSectionsInFile { path: input.into() }.into());
    };

    tracing::info!("Normalized {} sections from {}", sections.len(), input);
    println!("{}", serde_json::to_string_pretty(&sections)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            let pipeline = build_pipeline(&cli.config, &args)?;
            let summary = pipeline.run_once().await?;

            println!("\n=== Item Shop Summary ===");
            println!("Sections: {}", summary.sections);
            println!("Dated sections: {}", summary.dated);
            println!("Day files: {}", summary.day_files.len());
            println!(
                "Images saved/present/failed: {}/{}/{}",
                summary.images.saved, summary.images.skipped, summary.images.failed
            );
            println!(
                "Cards rendered/failed: {}/{}",
                summary.cards_rendered, summary.cards_failed
            );
        }
        Commands::Watch { run, interval_secs } => {
            let pipeline = build_pipeline(&cli.config, &run)?;
            let interval = interval_secs.unwrap_or(pipeline.config().watch.interval_secs);
            pipeline.watch(interval).await?;
        }
        Commands::Normalize { input } => {
            run_normalize_command(&input)?;
        }
    }

    Ok(())
}
