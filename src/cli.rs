use crate::harvest::Pass;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Harvests class listings and course details from the class search catalog.
///
/// With neither pass flag, the listing sweep runs first and then every stored
/// listing is hydrated. Both passes are safe to rerun.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// Only sweep search keywords into the listing file
    #[arg(long, conflicts_with = "details_only")]
    pub listings_only: bool,

    /// Only hydrate already-stored listings into the detail file
    #[arg(long)]
    pub details_only: bool,

    /// Path to a TOML config file (defaults to ./harvest.toml when present)
    #[arg(long, short, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = default_tracing_format())]
    pub tracing: TracingFormat,
}

impl Args {
    pub fn passes(&self) -> Vec<Pass> {
        match (self.listings_only, self.details_only) {
            (true, _) => vec![Pass::Listings],
            (_, true) => vec![Pass::Details],
            _ => Pass::all(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TracingFormat {
    Pretty,
    Json,
}

fn default_tracing_format() -> TracingFormat {
    if cfg!(debug_assertions) {
        TracingFormat::Pretty
    } else {
        TracingFormat::Json
    }
}
