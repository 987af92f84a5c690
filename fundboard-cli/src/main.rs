//! FundBoard CLI — intraday fund estimate board.
//!
//! Commands:
//! - `refresh` — fetch estimates for all enabled products and print a board
//! - `products` — list the enabled products parsed from the CSV

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use fundboard_core::{load_products, refresh, HttpTextFetcher, Status};

#[derive(Parser)]
#[command(name = "fundboard", about = "FundBoard CLI — intraday fund estimate board")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch intraday estimates for all enabled products and print them.
    Refresh {
        /// Product list CSV.
        #[arg(long, default_value = "data/products.csv")]
        products: PathBuf,

        /// Emit the result list as JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List the enabled products parsed from the CSV.
    Products {
        /// Product list CSV.
        #[arg(long, default_value = "data/products.csv")]
        products: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Refresh { products, json } => run_refresh(&products, json),
        Commands::Products { products } => run_products(&products),
    }
}

fn run_refresh(path: &Path, json: bool) -> Result<()> {
    let products = load_products(path)?;
    let fetcher = HttpTextFetcher::new();
    let records = refresh(&products, &fetcher);

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    println!(
        "{:<8} {:<20} {:>8}  {:<6} {:<10} {:<26} Error",
        "Code", "Name", "Pct", "Status", "Provider", "As Of"
    );
    println!("{}", "-".repeat(96));
    for record in &records {
        let pct = record
            .intraday_pct
            .map(|v| format!("{v:+.2}%"))
            .unwrap_or_else(|| "-".to_string());
        let status = match record.status {
            Status::Ok => "ok",
            Status::Na => "na",
            Status::Error => "error",
        };
        println!(
            "{:<8} {:<20} {:>8}  {:<6} {:<10} {:<26} {}",
            record.code,
            record.name,
            pct,
            status,
            record.source_provider,
            record.asof_time,
            record.error
        );
    }

    if records.iter().any(|r| r.status == Status::Error) {
        std::process::exit(1);
    }
    Ok(())
}

fn run_products(path: &Path) -> Result<()> {
    let products = load_products(path)?;

    if products.is_empty() {
        println!("No enabled products in {}", path.display());
        return Ok(());
    }

    println!("{:<8} {:<20} {:<8} {:<24} Timeout", "Code", "Name", "Kind", "Providers");
    println!("{}", "-".repeat(72));
    for product in &products {
        println!(
            "{:<8} {:<20} {:<8} {:<24} {}s",
            product.code,
            product.name,
            product.kind,
            product.providers().join(","),
            product.timeout().as_secs()
        );
    }
    println!();
    println!("{} product(s) enabled", products.len());
    Ok(())
}
