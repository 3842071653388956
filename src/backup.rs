//! Rotated JSON backups of the transaction store, taken before each write.

use crate::store::TransactionStore;
use crate::{utils, Config, Result};
use anyhow::Context;
use chrono::Local;
use std::path::PathBuf;

/// Prefix for transaction store backup files.
pub const TRANSACTIONS: &str = "transacoes";

const EXTENSION: &str = "json";

/// Manages backup file creation and rotation.
///
/// Create a new instance via `Config::backup()` or `Backup::new()`.
#[derive(Debug, Clone)]
pub struct Backup {
    backups_dir: PathBuf,
    backup_copies: u32,
}

impl Backup {
    pub fn new(config: &Config) -> Self {
        Self {
            backups_dir: config.backups().to_path_buf(),
            backup_copies: config.backup_copies(),
        }
    }

    /// Saves the store as a pretty-printed JSON backup file named
    /// `transacoes.YYYY-MM-DD-NNN.json`, where NNN is a per-day sequence number, then deletes the
    /// oldest backups beyond `backup_copies`.
    ///
    /// Returns the path to the created backup file.
    pub async fn save_json(&self, store: &TransactionStore) -> Result<PathBuf> {
        let date = today();
        let seq = self.next_sequence_number(&date).await?;
        let path = self
            .backups_dir
            .join(format!("{TRANSACTIONS}.{date}-{seq:03}.{EXTENSION}"));

        let json =
            serde_json::to_string_pretty(store).context("Failed to serialize the store to JSON")?;
        utils::write(&path, json).await?;

        self.rotate().await?;
        Ok(path)
    }

    async fn backup_file_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut dir = utils::read_dir(&self.backups_dir).await?;
        while let Some(entry) = dir
            .next_entry()
            .await
            .context("Failed to read directory entry")?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if is_backup_file(&name) {
                names.push(name);
            }
        }
        Ok(names)
    }

    async fn next_sequence_number(&self, date: &str) -> Result<u32> {
        let max_seq = self
            .backup_file_names()
            .await?
            .iter()
            .filter_map(|name| parse_sequence_number(name, date))
            .max()
            .unwrap_or(0);
        Ok(max_seq + 1)
    }

    async fn rotate(&self) -> Result<()> {
        // Oldest first. Past 999 the sequence outgrows its padding, so compare it as a number.
        let mut names = self.backup_file_names().await?;
        names.sort_by_cached_key(|name| backup_sort_key(name));

        let to_delete = names.len().saturating_sub(self.backup_copies as usize);
        for name in names.into_iter().take(to_delete) {
            utils::remove(self.backups_dir.join(name)).await?;
        }
        Ok(())
    }
}

/// Returns today's date in YYYY-MM-DD format.
fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Parses NNN out of `transacoes.{date}-NNN.json`.
fn parse_sequence_number(filename: &str, date: &str) -> Option<u32> {
    filename
        .strip_prefix(&format!("{TRANSACTIONS}.{date}-"))?
        .strip_suffix(&format!(".{EXTENSION}"))?
        .parse()
        .ok()
}

/// `(date, NNN)` for `transacoes.{date}-NNN.json`. Names that do not parse sort first.
fn backup_sort_key(filename: &str) -> Option<(String, u32)> {
    let stem = filename
        .strip_prefix(&format!("{TRANSACTIONS}."))?
        .strip_suffix(&format!(".{EXTENSION}"))?;
    let (date, seq) = stem.rsplit_once('-')?;
    Some((date.to_string(), seq.parse().ok()?))
}

fn is_backup_file(filename: &str) -> bool {
    filename.starts_with(&format!("{TRANSACTIONS}.")) && filename.ends_with(&format!(".{EXTENSION}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[test]
    fn test_parse_sequence_number() {
        assert_eq!(
            parse_sequence_number("transacoes.2025-12-14-001.json", "2025-12-14"),
            Some(1)
        );
        assert_eq!(
            parse_sequence_number("transacoes.2025-12-14-042.json", "2025-12-14"),
            Some(42)
        );
        // Wrong date
        assert_eq!(
            parse_sequence_number("transacoes.2025-12-13-001.json", "2025-12-14"),
            None
        );
        assert_eq!(
            parse_sequence_number("transacoes.2025-12-14-abc.json", "2025-12-14"),
            None
        );
    }

    #[test]
    fn test_backup_sort_key_orders_by_number() {
        let mut names = vec![
            "transacoes.2025-12-14-1000.json",
            "transacoes.2025-12-14-999.json",
            "transacoes.2025-12-15-001.json",
            "transacoes.stray.json",
        ];
        names.sort_by_cached_key(|name| backup_sort_key(name));
        assert_eq!(
            names,
            vec![
                "transacoes.stray.json",
                "transacoes.2025-12-14-999.json",
                "transacoes.2025-12-14-1000.json",
                "transacoes.2025-12-15-001.json",
            ]
        );
    }

    #[test]
    fn test_is_backup_file() {
        assert!(is_backup_file("transacoes.2025-12-14-001.json"));
        assert!(!is_backup_file("config.json"));
        assert!(!is_backup_file("transacoes.2025-12-14-001.csv"));
    }

    #[tokio::test]
    async fn test_save_json_sequences_and_rotates() {
        let env = TestEnv::new().await;
        let backup = env.config().backup();
        let store = TransactionStore::default();

        let first = backup.save_json(&store).await.unwrap();
        let second = backup.save_json(&store).await.unwrap();
        assert!(first.to_string_lossy().ends_with("-001.json"));
        assert!(second.to_string_lossy().ends_with("-002.json"));

        for _ in 0..10 {
            backup.save_json(&store).await.unwrap();
        }
        let names = backup.backup_file_names().await.unwrap();
        assert_eq!(names.len(), env.config().backup_copies() as usize);
        assert!(!first.exists());
    }

    #[tokio::test]
    async fn test_rotate_keeps_sequences_past_999() {
        let env = TestEnv::new().await;
        let config = env.config();
        let backup = config.backup();
        for seq in 995..=1000 {
            let name = format!("{TRANSACTIONS}.2025-12-14-{seq:03}.{EXTENSION}");
            utils::write(config.backups().join(name), "[]").await.unwrap();
        }

        backup.rotate().await.unwrap();

        let backups = config.backups();
        assert!(backups.join("transacoes.2025-12-14-1000.json").is_file());
        assert!(backups.join("transacoes.2025-12-14-996.json").is_file());
        assert!(!backups.join("transacoes.2025-12-14-995.json").exists());
        assert_eq!(
            backup.backup_file_names().await.unwrap().len(),
            config.backup_copies() as usize
        );
    }
}
