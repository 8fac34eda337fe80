use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "openstax-scraper",
    about = "Scrape chapters and formulas from the OpenStax University Physics volumes"
)]
pub struct Cli {
    /// Print a summary instead of importing the results
    #[arg(long)]
    pub dry_run: bool,

    /// TOML configuration file (defaults are used when omitted)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write chapters.json and formulas.json into this directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
