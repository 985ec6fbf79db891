use clap::{Parser, Subcommand};
use std::path::PathBuf;

use mediacrawl::sources::SourceKind;
use mediacrawl::types::ContentType;

/// Crawl media catalogs from web search and print structured records
#[derive(Parser)]
#[command(name = "mediacrawl")]
#[command(about = "Crawl novels, anime, TV series and more into structured media records", long_about = None)]
pub struct Cli {
    /// Config file (TOML); defaults to the user config directory
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Seed for reproducible guessed values
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Single web search, with fallback records
    Crawl {
        /// Content type (novel, anime, tv-series, variety-show, short-drama, movie)
        #[arg(short = 't', long = "type")]
        content_type: ContentType,
        #[arg(short, long, default_value_t = 10)]
        count: usize,
        #[arg(short, long)]
        keyword: Option<String>,
    },
    /// Query several sources and merge the results
    Multi {
        #[arg(short = 't', long = "type")]
        content_type: ContentType,
        #[arg(short, long, default_value_t = 10)]
        count: usize,
        #[arg(short, long)]
        keyword: Option<String>,
        /// Source to query; repeatable. Defaults to the type's default sources
        #[arg(short, long = "source")]
        sources: Vec<SourceKind>,
    },
    /// Crawl every core content type
    All {
        #[arg(short, long, default_value_t = 5)]
        count_per_type: usize,
    },
    /// Generate covers for records read from a JSON array
    Covers {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Print the default sources for a content type
    Sources {
        #[arg(short = 't', long = "type")]
        content_type: ContentType,
    },
}
