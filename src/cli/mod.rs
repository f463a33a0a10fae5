pub mod export;
pub mod history;
pub mod init;
pub mod new;
pub mod preview;
pub mod settings;
pub mod status;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use crate::models::{StorageState, Theme};
use crate::numbering::SystemClock;
use crate::settings::{load_settings, resolve_data_dir, Settings};
use crate::store::JsonStore;

#[derive(Parser)]
#[command(
    name = "resit",
    about = "Official receipts and collection records for school welfare bodies."
)]
pub struct Cli {
    /// Directory holding the receipt record (default from ~/.config/resit/settings.json)
    #[arg(long = "data-dir", env = "RESIT_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Show debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Remember the data directory (--data-dir) and create an empty receipt record.
    Init {
        /// Treasurer name pre-filled on new receipts
        #[arg(long)]
        treasurer: Option<String>,
    },
    /// Show data location, counter and collection totals.
    Status,
    /// View or change organization settings.
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
    /// Print the next receipt number.
    Next,
    /// Fill in a receipt, preview it and record it in history.
    New(NewArgs),
    /// Preview a saved receipt (or a blank draft when no ID is given).
    Preview {
        /// Receipt ID, ID prefix or receipt number
        id: Option<String>,
    },
    /// Browse or delete recorded receipts.
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },
    /// Print the total amount collected.
    Total,
    /// Export receipts and records.
    Export {
        #[command(subcommand)]
        command: ExportCommands,
    },
}

#[derive(clap::Args)]
pub struct NewArgs {
    /// Payer name (Diterima Daripada)
    #[arg(long = "from")]
    pub from: Option<String>,
    /// Amount in RM, e.g. 150 or 20.50
    #[arg(long)]
    pub amount: Option<Decimal>,
    /// Payment description (Untuk Bayaran)
    #[arg(long = "for")]
    pub for_payment: Option<String>,
    /// Payment date: YYYY-MM-DD (default: today)
    #[arg(long)]
    pub date: Option<NaiveDate>,
    /// Treasurer name (default from settings)
    #[arg(long)]
    pub treasurer: Option<String>,
    /// Use this receipt number instead of the next in sequence
    #[arg(long = "receipt-no")]
    pub receipt_no: Option<String>,
    /// Start from sample data
    #[arg(long)]
    pub demo: bool,
    /// Preview only; do not record
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Show organization settings.
    Show,
    /// Update organization settings.
    Set(SettingsArgs),
}

#[derive(clap::Args, Default)]
pub struct SettingsArgs {
    #[arg(long = "school-name")]
    pub school_name: Option<String>,
    #[arg(long = "school-address")]
    pub school_address: Option<String>,
    #[arg(long = "org-name")]
    pub org_name: Option<String>,
    /// Receipt color: blue, red, yellow
    #[arg(long)]
    pub theme: Option<Theme>,
    /// Print the PAID / LUNAS mark: on, off
    #[arg(long = "paid-stamp")]
    pub paid_stamp: Option<Toggle>,
    /// Logo image file (PNG, JPEG, SVG)
    #[arg(long, conflicts_with = "clear_logo")]
    pub logo: Option<PathBuf>,
    #[arg(long = "clear-logo")]
    pub clear_logo: bool,
    /// Official stamp image file
    #[arg(long, conflicts_with = "clear_stamp")]
    pub stamp: Option<PathBuf>,
    #[arg(long = "clear-stamp")]
    pub clear_stamp: bool,
    /// Treasurer signature image file
    #[arg(long, conflicts_with = "clear_signature")]
    pub signature: Option<PathBuf>,
    #[arg(long = "clear-signature")]
    pub clear_signature: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toggle {
    On,
    Off,
}

impl From<Toggle> for bool {
    fn from(t: Toggle) -> bool {
        t == Toggle::On
    }
}

#[derive(Subcommand)]
pub enum HistoryCommands {
    /// List recorded receipts, most recent first.
    List,
    /// Delete a recorded receipt.
    Delete {
        /// Receipt ID, ID prefix or receipt number
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum ExportCommands {
    /// Export the collection record as CSV.
    Csv {
        /// Output file path (default: <data-dir>/exports/REKOD_KUTIPAN_BKGK_<year>.csv)
        #[arg(long)]
        output: Option<String>,
    },
    /// Export one receipt as an A4 PDF.
    #[cfg(feature = "pdf")]
    Pdf {
        /// Receipt ID, ID prefix or receipt number
        id: String,
        #[arg(long)]
        output: Option<String>,
    },
    /// Export the collection summary as PDF.
    #[cfg(feature = "pdf")]
    Summary {
        #[arg(long)]
        output: Option<String>,
    },
}

/// What every command needs: app settings, the store handle and the clock.
pub struct Context {
    pub app: Settings,
    pub data_dir: PathBuf,
    pub store: JsonStore,
    pub clock: SystemClock,
}

impl Context {
    pub fn new(data_dir: Option<PathBuf>) -> Self {
        let app = load_settings();
        let data_dir = resolve_data_dir(&app, data_dir);
        let store = JsonStore::open(&data_dir);
        Self {
            app,
            data_dir,
            store,
            clock: SystemClock,
        }
    }

    /// Current record with its counter moved into this year.
    pub fn state(&self) -> StorageState {
        crate::ledger::open(&self.store, &self.clock)
    }
}
