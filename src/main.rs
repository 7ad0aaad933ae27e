mod config;
mod loader;
mod models;
mod pipeline;
mod scraper;
mod storage;
mod utils;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::AppConfig;
use crate::loader::{latest_snapshot, load_snapshot};
use crate::models::CompanyRecord;
use crate::pipeline::{scrape_failure, Pipeline, ScrapePlan};
use crate::storage::{output_path, CsvSink};

#[derive(Parser)]
#[command(name = "ranking-scraper", about = "Company ranking table scraper", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Render the ranking page in Chrome and extract the ranking
    Scrape {
        /// Ranking year (selects the year-specific page)
        #[arg(short, long)]
        year: Option<u16>,

        /// Resolve websites for the first N companies
        #[arg(short, long)]
        enrich: Option<usize>,

        /// CSV path (default: <data_dir>/<stem>[_<year>].csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show the browser window
        #[arg(long)]
        headed: bool,

        /// Print the full result as JSON instead of a preview
        #[arg(long)]
        json: bool,

        /// Number of companies to print
        #[arg(long, default_value_t = 10)]
        preview: usize,
    },

    /// Re-run extraction on a saved page snapshot (no browser)
    Extract {
        /// Snapshot file (default: newest in the debug dir)
        #[arg(long)]
        html: Option<PathBuf>,

        /// Year used for the output file name and detail-link base
        #[arg(short, long)]
        year: Option<u16>,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        json: bool,

        #[arg(long, default_value_t = 10)]
        preview: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "ranking_scraper=info,warn",
        1 => "ranking_scraper=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let mut config = AppConfig::load()?;

    match cli.command {
        Command::Scrape { year, enrich, output, headed, json, preview } => {
            let timer = utils::Timer::start("Ranking scrape");
            if headed {
                config.browser.headless = false;
            }
            let plan = ScrapePlan {
                year,
                enrich: enrich.or(config.scraper.enrich_limit),
            };

            let pipeline = Pipeline::new(config);
            let report = match pipeline.run(&plan).await {
                Ok(report) => report,
                Err(e) => {
                    match scrape_failure(&e) {
                        Some(cause) => error!("Scraping failed: {}", cause),
                        None => error!("Scraping failed: {:#}", e),
                    }
                    eprintln!("Scraping failed");
                    return Err(e);
                }
            };

            let path = pipeline.save(&report, year, output.as_deref())?;
            info!("{} scraped in {:.1?}", report.url, timer.elapsed());
            if let Some(snapshot) = &report.snapshot {
                info!("Re-extract offline with: extract --html {}", snapshot.display());
            }
            if report.records.is_empty() {
                warn!("Zero companies found; {:?} holds only the header", path);
            }
            print_records(&report.records, json, preview)?;
        }

        Command::Extract { html, year, output, json, preview } => {
            let _t = utils::Timer::start("Offline extraction");
            let path = match html {
                Some(p) => p,
                None => latest_snapshot(&config.output.debug_dir)?
                    .with_context(|| format!("No snapshots in {:?}", config.output.debug_dir))?,
            };
            info!("Extracting from {:?}", path);

            let page = load_snapshot(&path)?;
            let url = config.scraper.target_url(year);
            let records = crate::scraper::extract_ranking(&page, Some(&url), config.scraper.min_table_rows)?;

            let out = output.unwrap_or_else(|| {
                output_path(&config.output.data_dir, &config.output.file_stem, year)
            });
            CsvSink::write_rows(&out, &records, false)?;
            print_records(&records, json, preview)?;
        }
    }

    Ok(())
}

fn print_records(records: &[CompanyRecord], json: bool, preview: usize) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }

    println!("First {} companies:", preview.min(records.len()));
    for r in records.iter().take(preview) {
        match &r.website {
            Some(site) => println!("{} - {} ({})", r.rank, r.company_name, site),
            None => println!("{} - {}", r.rank, r.company_name),
        }
    }
    Ok(())
}
