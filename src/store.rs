//! The local transaction store: a JSON array of transactions in the dashboard's shape.

use crate::model::Transaction;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// An in-memory snapshot of every stored transaction, in file order.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionStore {
    transactions: Vec<Transaction>,
}

/// How many rows a merge appended and how many it overwrote.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub added: usize,
    pub replaced: usize,
}

/// The file formats accepted by `nitron import`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    serde::Serialize,
    serde::Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ImportFormat {
    #[default]
    Json,
    /// Comma separated, with the JSON field names as headers.
    Csv,
}

serde_plain::derive_display_from_serialize!(ImportFormat);
serde_plain::derive_fromstr_from_deserialize!(ImportFormat);

impl ImportFormat {
    /// Guesses the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(ImportFormat::Json),
            "csv" => Some(ImportFormat::Csv),
            _ => None,
        }
    }
}

impl TransactionStore {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    /// Loads the store from `path`.
    pub async fn load(path: &Path) -> Result<Self> {
        let store: TransactionStore = utils::deserialize(path)
            .await
            .context("Unable to load the transaction store")?;
        debug!(
            "Loaded {} transactions from {}",
            store.len(),
            path.display()
        );
        Ok(store)
    }

    /// Writes the store to `path`, creating the parent directory if needed.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            utils::make_dir(parent).await?;
        }
        let json = serde_json::to_string_pretty(self)
            .context("Unable to serialize the transaction store")?;
        utils::write(path, json).await
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Transaction> {
        self.transactions.iter_mut().find(|t| t.id() == id)
    }

    /// Merges `incoming` by id: a stored transaction with the same id is replaced in place, any
    /// other transaction is appended. Rows without an id cannot be matched and are rejected.
    pub fn merge(&mut self, incoming: impl IntoIterator<Item = Transaction>) -> Result<MergeReport> {
        let mut index: HashMap<String, usize> = self
            .transactions
            .iter()
            .enumerate()
            .map(|(ix, t)| (t.id().to_string(), ix))
            .collect();
        let mut report = MergeReport::default();

        for transaction in incoming {
            if transaction.id().is_empty() {
                bail!(
                    "Cannot merge a transaction without an id ('{}')",
                    transaction.description()
                );
            }
            match index.get(transaction.id()) {
                Some(&ix) => {
                    self.transactions[ix] = transaction;
                    report.replaced += 1;
                }
                None => {
                    index.insert(transaction.id().to_string(), self.transactions.len());
                    self.transactions.push(transaction);
                    report.added += 1;
                }
            }
        }
        Ok(report)
    }
}

/// Reads transactions to import from `path`.
pub async fn read_import(path: &Path, format: ImportFormat) -> Result<Vec<Transaction>> {
    let content = utils::read(path).await?;
    let transactions = match format {
        ImportFormat::Json => serde_json::from_str::<Vec<Transaction>>(&content)
            .with_context(|| format!("Failed to parse JSON transactions in {}", path.display()))?,
        ImportFormat::Csv => parse_csv(&content)
            .with_context(|| format!("Failed to parse CSV transactions in {}", path.display()))?,
    };
    if transactions.is_empty() {
        warn!("No transactions found in {}", path.display());
    }
    Ok(transactions)
}

fn parse_csv(content: &str) -> Result<Vec<Transaction>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    let mut transactions = Vec::new();
    for (row_ix, record) in reader.deserialize::<Transaction>().enumerate() {
        // +2: one for the header, one for 1-based rows
        let transaction =
            record.with_context(|| format!("Invalid transaction at row {}", row_ix + 2))?;
        transactions.push(transaction);
    }
    Ok(transactions)
}
