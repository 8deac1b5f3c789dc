pub mod analyze;
pub mod convert;
pub mod rules;

use std::path::Path;

use clap::{Parser, Subcommand};

use crate::config::{self, Config};
use crate::error::Result;
use crate::models::Transaction;
use crate::reader::ReaderKind;
use crate::transformer;

/// Load the rules file and the input file, returning the validated config
/// and the date-sorted transactions every subcommand works from.
pub(crate) fn load_pipeline(input: &Path, rules: &Path) -> Result<(Config, Vec<Transaction>)> {
    let config = config::load_config(rules)?;
    let reader = ReaderKind::for_path(input)?;
    let rows = reader.load_rows(input, &config)?;
    let mut txns = transformer::normalize_transactions(&rows)?;
    transformer::sort_transactions(&mut txns);
    Ok((config, txns))
}

#[derive(Parser)]
#[command(
    name = "ledgerize",
    about = "Convert bank CSV/XLSX exports into double-entry ledger postings."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a bank export into ledger postings.
    Convert {
        /// Path to the CSV or XLSX export
        input: String,
        /// Path to the YAML rules file
        rules: String,
        /// Output path (default: rules file `output.path`, else output.txt)
        #[arg(long)]
        output: Option<String>,
        /// Print a rule-analytics summary after converting
        #[arg(long)]
        analytics: bool,
        /// Write the full analytics report as JSON to this path
        #[arg(long = "analytics-json")]
        analytics_json: Option<String>,
    },
    /// Analyze rule usage and match confidence without writing output.
    Analyze {
        /// Path to the CSV or XLSX export
        input: String,
        /// Path to the YAML rules file
        rules: String,
        /// Emit the raw report as JSON instead of tables
        #[arg(long)]
        json: bool,
    },
    /// Manage categorization rules.
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// Validate a rules file and list its normalized rules.
    List {
        /// Path to the YAML rules file
        rules: String,
    },
}
