//! Configuration file handling for NitronFlow.
//!
//! The configuration file is stored at `$NITRON_HOME/config.json` and says where the transaction
//! store lives and how many backups to keep.

use crate::backup::Backup;
use crate::store::TransactionStore;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_NAME: &str = "nitronflow";
const CONFIG_VERSION: u8 = 1;
const BACKUP_COPIES: u32 = 5;
const BACKUPS: &str = ".backups";
const CONFIG_JSON: &str = "config.json";
const TRANSACTIONS_JSON: &str = "transacoes.json";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$NITRON_HOME` and from there it loads `$NITRON_HOME/config.json`. It provides
/// paths to the other items that are expected in a certain location within the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    backups: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the data directory, its backups subdirectory, an initial `config.json` with
    /// default settings, and an empty transaction store.
    ///
    /// # Errors
    /// - Returns an error if the directory already holds a `config.json`, or if any file
    ///   operation fails.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the nitron home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.exists() {
            bail!(
                "A config file already exists at '{}'",
                config_path.display()
            );
        }

        let backups = root.join(BACKUPS);
        utils::make_dir(&backups).await?;

        let config_file = ConfigFile::default();
        config_file.save(&config_path).await?;

        let config = Self {
            root,
            backups,
            config_path,
            config_file,
        };

        let store_path = config.transactions_path();
        if !store_path.is_file() {
            TransactionStore::default().save(&store_path).await?;
        }
        debug!("Created nitron home at {}", config.root.display());
        Ok(config)
    }

    /// This will
    /// - validate that `nitron_home` exists and that the config file exists
    /// - load the config file
    /// - validate that the backups directory exists
    pub async fn load(nitron_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = nitron_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("Nitron home is missing, run 'nitron init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let config = Self {
            backups: root.join(BACKUPS),
            root,
            config_path,
            config_file,
        };
        if !config.backups.is_dir() {
            bail!(
                "The backups directory is missing '{}'",
                config.backups.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn backups(&self) -> &Path {
        &self.backups
    }

    pub fn backup_copies(&self) -> u32 {
        self.config_file.backup_copies
    }

    /// Returns the configured store path, resolved against the home directory when relative.
    pub fn transactions_path(&self) -> PathBuf {
        let p = self.config_file.transactions_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }

    /// Creates a new `Backup` instance for managing backup files.
    pub fn backup(&self) -> Backup {
        Backup::new(self)
    }

    /// Loads the transaction store.
    pub async fn store(&self) -> Result<TransactionStore> {
        TransactionStore::load(&self.transactions_path()).await
    }

    /// Backs up the current store file, then overwrites it with `store`.
    pub async fn save_store(&self, store: &TransactionStore) -> Result<()> {
        let path = self.transactions_path();
        if path.is_file() {
            let previous = TransactionStore::load(&path).await?;
            let backup_path = self.backup().save_json(&previous).await?;
            debug!("Saved backup to {}", backup_path.display());
        }
        store.save(&path).await
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "nitronflow",
///   "config_version": 1,
///   "backup_copies": 5,
///   "transactions_path": "transacoes.json"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "nitronflow"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Number of backup copies to keep
    #[serde(default = "default_backup_copies")]
    backup_copies: u32,

    /// Path to the transaction store (optional, relative to `$NITRON_HOME` or absolute).
    /// Defaults to $NITRON_HOME/transacoes.json if not specified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    transactions_path: Option<PathBuf>,
}

fn default_backup_copies() -> u32 {
    BACKUP_COPIES
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            backup_copies: BACKUP_COPIES,
            transactions_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or names another app or a newer
    /// config version.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)
            .await
            .with_context(|| format!("Failed to load config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.config_version <= CONFIG_VERSION,
            "Config version {} is unsupported. Is a newer version of nitron available?",
            config.config_version
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    /// Gets the transaction store path. If None, defaults to `transacoes.json`.
    pub fn transactions_path(&self) -> PathBuf {
        self.transactions_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(TRANSACTIONS_JSON))
    }
}
