mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use mediacrawl::config::Settings;
use mediacrawl::types::{CrawlRequest, MediaRecord};
use mediacrawl::MediaCrawler;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mediacrawl=info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;
    if cli.seed.is_some() {
        settings.seed = cli.seed;
    }
    let crawler = MediaCrawler::from_settings(&settings)?;

    match cli.command {
        Commands::Crawl { content_type, count, keyword } => {
            let mut req = CrawlRequest::new(content_type, count);
            if let Some(k) = keyword { req = req.with_keyword(k); }
            print_json(&crawler.crawl_from_web(&req).await)
        }
        Commands::Multi { content_type, count, keyword, sources } => {
            let mut req = CrawlRequest::new(content_type, count).with_sources(sources);
            if let Some(k) = keyword { req = req.with_keyword(k); }
            print_json(&crawler.crawl_multi_source(&req).await)
        }
        Commands::All { count_per_type } => print_json(&crawler.crawl_all(count_per_type).await),
        Commands::Covers { input } => {
            let text = tokio::fs::read_to_string(&input)
                .await
                .with_context(|| format!("reading records from {}", input.display()))?;
            let records: Vec<MediaRecord> = serde_json::from_str(&text)
                .with_context(|| format!("parsing records from {}", input.display()))?;
            print_json(&crawler.generate_covers_for_items(records).await)
        }
        Commands::Sources { content_type } => print_json(&crawler.default_sources(content_type)),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("serializing output")?);
    Ok(())
}
