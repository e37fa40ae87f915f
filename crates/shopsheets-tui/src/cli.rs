use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use shopsheets_core::models::PaymentStatus;

#[derive(Debug, Parser)]
#[command(name = "shop", version, about = "Shop manager: orders, workers and expenses on Google Sheets")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Open the terminal dashboard (default)
    Dashboard,

    /// Store and test the Google Sheets API key
    Setup {
        /// Key to store; prompted for when omitted
        #[arg(long)]
        key: Option<String>,
        /// Remove the stored key
        #[arg(long, conflicts_with = "key")]
        forget: bool,
    },

    /// Submit a form from a JSON draft
    Submit {
        #[arg(value_enum)]
        form: FormKind,
        /// Draft file; the autosaved draft is used when omitted
        file: Option<PathBuf>,
    },

    /// Combined fabric + tailoring order
    #[command(subcommand)]
    Combined(CombinedCommand),

    /// Worker list
    #[command(subcommand)]
    Workers(WorkersCommand),

    /// Payment history with filters
    Payments {
        #[arg(long)]
        worker: Option<String>,
        /// Earliest date, YYYY-MM-DD
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Latest date, YYYY-MM-DD
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Search the notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Offline cache maintenance
    #[command(subcommand)]
    Cache(CacheCommand),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormKind {
    Worker,
    Payment,
    Fabric,
    Tailor,
    FabricExpense,
    OtherExpense,
}

#[derive(Debug, Subcommand)]
pub enum CombinedCommand {
    /// Enter the customer details and start a combined order
    Start { file: PathBuf },
    /// Submit the fabric sub-order; resumes the autosaved draft when no file is given
    Fabric { file: Option<PathBuf> },
    /// Submit the tailoring sub-order; resumes the autosaved draft when no file is given
    Tailor { file: Option<PathBuf> },
    /// Show the combined order in progress
    Status,
    /// Save the combined row linking both sub-orders
    Save {
        #[arg(long, default_value = "unpaid")]
        paid: PaymentStatus,
    },
    /// Drop the combined order in progress
    Abandon,
}

#[derive(Debug, Subcommand)]
pub enum WorkersCommand {
    /// List workers, optionally filtered by name, phone or address
    List { search: Option<String> },
    /// Names only, as offered in the payment form
    Names,
}

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Precache the static assets and the offline page
    Install,
    /// Delete caches left by other versions
    Activate,
}
