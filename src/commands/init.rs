use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory, `config.json` with default settings, the backups directory and an
/// empty transaction store.
///
/// # Errors
/// - Returns an error if the directory is already initialized or any file operation fails.
pub async fn init(nitron_home: &Path) -> Result<Out<()>> {
    let config = Config::create(nitron_home)
        .await
        .context("Unable to create the data directory and configs")?;
    Ok(format!(
        "Successfully created the nitron directory at {}",
        config.root().display()
    )
    .into())
}
