use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use levy_data::{RateSheetLoader, SlabLoader};
use levy_db_sqlite::SqliteRepository;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Kind {
    /// fiscal_year,lower_bound,upper_bound,rate
    Slabs,
    /// name,code,import_rate,export_rate
    Countries,
    /// name,base_rate
    Categories,
}

/// Load slab tables or trade rate sheets from a CSV file into the database.
///
/// Slab files hold one row per slab with an empty upper_bound for the open
/// top slab. Each fiscal year in the file replaces the slabs stored for it.
/// Rate sheets are upserted by country code or category name.
#[derive(Parser, Debug)]
#[command(name = "levy-data-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV file
    #[arg(short, long)]
    file: PathBuf,

    /// What the CSV file contains
    #[arg(short, long, value_enum, default_value_t = Kind::Slabs)]
    kind: Kind,

    /// SQLite database URL or path (created if missing)
    #[arg(short, long, default_value = "sqlite:levy.db")]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,

    /// Run seed files from the specified directory after migrations
    #[arg(short, long)]
    seeds: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let repo = SqliteRepository::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;

    if args.migrate {
        println!("Running migrations...");
        repo.run_migrations()
            .await
            .context("Failed to run migrations")?;
        println!("Migrations complete.");
    }

    if let Some(seeds_dir) = &args.seeds {
        println!("Running seeds from: {}", seeds_dir.display());
        repo.run_seeds(seeds_dir)
            .await
            .with_context(|| format!("Failed to run seeds from: {}", seeds_dir.display()))?;
        println!("Seeds complete.");
    }

    println!("Loading {:?} from: {}", args.kind, args.file.display());

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open: {}", args.file.display()))?;

    let written = match args.kind {
        Kind::Slabs => {
            let records = SlabLoader::parse(file)
                .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;
            println!("Parsed {} records from CSV", records.len());
            SlabLoader::load(&repo, &records)
                .await
                .context("Failed to load slabs into database")?
        }
        Kind::Countries => {
            let countries = RateSheetLoader::parse_countries(file)
                .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;
            RateSheetLoader::load_countries(&repo, &countries)
                .await
                .context("Failed to load country rates into database")?
        }
        Kind::Categories => {
            let categories = RateSheetLoader::parse_categories(file)
                .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;
            RateSheetLoader::load_categories(&repo, &categories)
                .await
                .context("Failed to load category rates into database")?
        }
    };

    println!("Successfully wrote {} rows into the database.", written);

    Ok(())
}
