mod harvest;
mod sink;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "detmir-cli")]
#[command(about = "Harvest catalog listings from the Detmir storefront")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Harvest every page of each category and write JSON Lines records
    Harvest {
        /// Category seed URL; repeat for several. Defaults to the categories file.
        #[arg(long = "seed", value_name = "URL")]
        seeds: Vec<String>,

        /// Write records to this file instead of stdout
        #[arg(long, short, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Print the first page request of each category without fetching
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the catalog request URL for one page of a category
    PageUrl {
        /// Category seed URL
        seed: String,

        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = detmir_core::load_app_config().context("failed to load config")?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(env = %config.env, api = %config.api_base_url, "detmir-cli starting");

    match cli.command {
        Some(Commands::Harvest {
            seeds,
            output,
            dry_run,
        }) => {
            let summary =
                harvest::run_harvest(&config, &seeds, output.as_deref(), dry_run).await?;
            if summary.all_failed() {
                anyhow::bail!(
                    "all {} categories failed; no records were harvested",
                    summary.categories
                );
            }
        }
        Some(Commands::PageUrl { seed, offset }) => {
            let category = detmir_scraper::CategoryTarget::from_seed_url(&seed)?;
            let request = harvest::query_builder(&config).build_request(&category, offset);
            println!("{}", request.url());
        }
        None => println!("detmir-cli: run with --help to list commands"),
    }

    Ok(())
}
