use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use product_crawl::config::{AppConfig, ConfigOverrides};
use product_crawl::core::{CrawlReport, Crawler};
use product_crawl::logging::{init_logging, LogContext};
use product_crawl::session::browser::PlaywrightProvider;
use product_crawl::session::SnapshotProvider;
use product_crawl::sites::SiteKind;

#[derive(Parser)]
#[command(name = "crawl")]
#[command(about = "Extract product records from Amazon and Wayfair pages")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, help = "Enable verbose logging")]
    verbose: bool,

    #[arg(short, long, help = "Configuration file path")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape live pages in a browser
    Scrape {
        #[arg(short, long, help = "Page type to scrape", value_enum)]
        site: SiteKind,

        #[arg(long, help = "Scroll to the bottom before scraping")]
        scroll: bool,

        #[arg(required = true, help = "Page URLs, visited in order")]
        urls: Vec<String>,
    },

    /// Scrape saved HTML snapshots of one page
    Replay {
        #[arg(short, long, help = "Page type to scrape", value_enum)]
        site: SiteKind,

        #[arg(long, default_value = "https://snapshot.local/", help = "URL the snapshots were saved from")]
        url: String,

        #[arg(required = true, help = "Snapshot files; each one is the page after one more reload")]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path).await?,
        None => AppConfig::load().await?,
    };
    ConfigOverrides::apply(&mut config);
    apply_cli_flags(&mut config, &cli)?;

    let _guard = init_logging(&config.logging)?;

    let context = LogContext::new("main", "startup").with_string_field("version", env!("CARGO_PKG_VERSION"));
    product_crawl::log_info!(context, "product-crawl starting up");

    let result = match cli.command {
        Commands::Scrape { site, urls, .. } => {
            let provider = PlaywrightProvider::new(&config.browser)?;
            Crawler::new(config).run(&provider, site, &urls).await
        }
        Commands::Replay { site, url, files } => {
            let provider = SnapshotProvider::new(url.clone(), files);
            Crawler::new(config).run(&provider, site, &[url]).await
        }
    };

    match result {
        Ok(report) => {
            print_records(&report)?;
            info!("Done: {} record(s) from {} page(s)", report.record_count(), report.pages.len());
            Ok(())
        }
        Err(e) => {
            error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Fold command-line flags into the configuration, then validate the result
fn apply_cli_flags(config: &mut AppConfig, cli: &Cli) -> Result<()> {
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    if let Commands::Scrape { scroll: true, .. } = cli.command {
        config.scroll.enabled = true;
    }
    config.validate()
}

/// One JSON object per line on stdout
fn print_records(report: &CrawlReport) -> Result<()> {
    for page in &report.pages {
        for record in &page.records {
            println!("{}", serde_json::to_string(record)?);
        }
    }
    Ok(())
}
