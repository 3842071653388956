//! These structs provide the CLI interface for the nitron CLI.

use crate::model::{Amount, Periodicity, TransactionType};
use crate::store::ImportFormat;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// nitron: installment tracking for the NitronFlow dashboard.
///
/// Keeps a local copy of your financial transactions, groups installment series ("parcelas") by
/// their parent transaction and reports how much of each series is paid and how much remains.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory, its config file and an empty transaction store.
    ///
    /// Run this once before anything else. The directory is --nitron-home, $HOME/nitronflow by
    /// default.
    Init,
    /// Merge transactions from a JSON or CSV file into the store, matching rows by id.
    Import(ImportArgs),
    /// Report the payment progress of every installment series in the store.
    Installments(InstallmentsArgs),
    /// Create all installments of a new series and add them to the store.
    Expand(ExpandArgs),
    /// Mark one installment as paid (expenses) or received (income).
    Settle(SettleArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where nitron data and configuration is held. Defaults to ~/nitronflow
    #[arg(long, env = "NITRON_HOME", default_value_t = default_nitron_home())]
    nitron_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, nitron_home: PathBuf) -> Self {
        Self {
            log_level,
            nitron_home: nitron_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn nitron_home(&self) -> &DisplayPath {
        &self.nitron_home
    }
}

/// Args for the `nitron import` command.
#[derive(Debug, Parser, Clone)]
pub struct ImportArgs {
    /// The file to import.
    file: PathBuf,

    /// The file format. Guessed from the file extension when omitted.
    #[arg(long, value_enum)]
    format: Option<ImportFormat>,
}

impl ImportArgs {
    pub fn new(file: impl Into<PathBuf>, format: Option<ImportFormat>) -> Self {
        Self {
            file: file.into(),
            format,
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn format(&self) -> Option<ImportFormat> {
        self.format
    }
}

/// Args for the `nitron installments` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct InstallmentsArgs {
    /// Only report series of this type: receita or despesa.
    #[arg(long = "type")]
    transaction_type: Option<TransactionType>,

    /// Only report series that still have pending installments.
    #[arg(long)]
    open: bool,

    /// Write the report to stdout as JSON.
    #[arg(long)]
    json: bool,
}

impl InstallmentsArgs {
    pub fn new(transaction_type: Option<TransactionType>, open: bool, json: bool) -> Self {
        Self {
            transaction_type,
            open,
            json,
        }
    }

    pub fn transaction_type(&self) -> Option<TransactionType> {
        self.transaction_type
    }

    pub fn open(&self) -> bool {
        self.open
    }

    pub fn json(&self) -> bool {
        self.json
    }
}

/// Args for the `nitron expand` command.
#[derive(Debug, Parser, Clone)]
pub struct ExpandArgs {
    /// Description shared by every installment; "(n/total)" is appended to each.
    #[arg(long)]
    description: String,

    /// Value of each installment, e.g. 199.90 or "R$ 199,90".
    #[arg(long)]
    amount: Amount,

    /// receita or despesa.
    #[arg(long = "type", default_value_t = TransactionType::Despesa)]
    transaction_type: TransactionType,

    #[arg(long, default_value = "")]
    category: String,

    /// mensal, bimestral, trimestral, semestral, anual or parcelada.
    #[arg(long, default_value_t = Periodicity::Parcelada)]
    periodicity: Periodicity,

    /// Number of installments.
    #[arg(long)]
    count: u32,

    /// Due date of the first installment, YYYY-MM-DD.
    #[arg(long)]
    first_date: NaiveDate,

    /// How many leading installments are already paid or received.
    #[arg(long, default_value_t = 0)]
    settled: u32,
}

impl ExpandArgs {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        description: impl Into<String>,
        amount: Amount,
        transaction_type: TransactionType,
        category: impl Into<String>,
        periodicity: Periodicity,
        count: u32,
        first_date: NaiveDate,
        settled: u32,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            transaction_type,
            category: category.into(),
            periodicity,
            count,
            first_date,
            settled,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn periodicity(&self) -> Periodicity {
        self.periodicity
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn first_date(&self) -> NaiveDate {
        self.first_date
    }

    pub fn settled(&self) -> u32 {
        self.settled
    }
}

/// Args for the `nitron settle` command.
#[derive(Debug, Parser, Clone)]
pub struct SettleArgs {
    /// The id of the installment to settle.
    id: String,
}

impl SettleArgs {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

fn default_nitron_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("nitronflow"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --nitron-home or NITRON_HOME instead of relying on the default \
                home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("nitronflow")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
