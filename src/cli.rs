use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Crawl search result pages and write tagged book records as JSON.
    Crawl(CrawlArgs),
    /// Convert a tagged books CSV into a JSON array.
    Convert(ConvertArgs),
}

#[derive(Debug, Args)]
pub struct CrawlArgs {
    /// YAML crawl config (targets, site selectors, delays). Built-in defaults when omitted.
    #[arg(long)]
    pub config: Option<String>,

    /// Output file path for the JSON snapshot.
    #[arg(long)]
    pub out: String,

    /// Overwrite `--out` if it already exists.
    #[arg(long, default_value_t = false)]
    pub force: bool,

    /// Maximum result pages per keyword.
    #[arg(long)]
    pub max_pages: Option<u32>,

    /// Records to collect per keyword (applied to every target).
    #[arg(long)]
    pub quota: Option<usize>,

    /// Delay before each list page request after the first (politeness).
    #[arg(long)]
    pub list_delay_ms: Option<u64>,

    /// Delay after each detail page request (politeness).
    #[arg(long)]
    pub detail_delay_ms: Option<u64>,

    /// Fraction of incomplete records that get a detail page fetch (0.0..=1.0).
    #[arg(long)]
    pub supplement_rate: Option<f64>,

    /// Seed for the supplement sampler (reproducible runs).
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Input CSV path (header row required).
    #[arg(long)]
    pub input: String,

    /// Output file path for the JSON array.
    #[arg(long)]
    pub out: String,

    /// Overwrite `--out` if it already exists.
    #[arg(long, default_value_t = false)]
    pub force: bool,
}
