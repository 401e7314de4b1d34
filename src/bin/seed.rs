//! Replaces the catalog reference data in the backend.
//!
//! # Usage
//!
//! ```bash
//! # Seed the bundled dataset
//! seed
//!
//! # Seed a custom dataset with at most 4 concurrent deletions
//! seed --data data/seed.json --concurrency 4
//! ```
//!
//! Connection settings are read from the environment (and a `.env` file),
//! see `appwrite_food::config`.

use std::path::PathBuf;
use std::process::ExitCode;

use appwrite_food::seed::backend::HttpImageSource;
use appwrite_food::seed::data::SeedData;
use appwrite_food::seed::{SeedError, Seeder};
use appwrite_food::FoodApp;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "seed")]
#[command(author, version, about = "Wipe and reload the food catalog")]
struct Cli {
    /// JSON dataset to load instead of the bundled one
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Maximum concurrent deletions while wiping
    #[arg(short, long, default_value_t = 8)]
    concurrency: usize,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let app = FoodApp::from_env()?;

    let data = match &cli.data {
        Some(path) => {
            info!(path = %path.display(), "Loading seed data");
            SeedData::from_path(path).await?
        }
        None => SeedData::bundled()?,
    };

    let databases = app.databases();
    let storage = app.storage();
    let images = HttpImageSource::new();

    let seeder = Seeder::new(&databases, &storage, &images, app.config().collections.clone())
        .with_concurrency(cli.concurrency);

    match seeder.run(&data).await {
        Ok(report) => {
            for name in &report.image_fallbacks {
                info!(item = %name, "Stored with source image URL");
            }
            Ok(())
        }
        Err(SeedError::WipeIncomplete(report)) => {
            for failure in &report.failures {
                error!(collection = %failure.target, id = %failure.id, "{}", failure.error);
            }
            Err(format!("{} deletion(s) failed, run again to retry", report.failures.len()).into())
        }
        Err(e) => Err(e.into()),
    }
}
