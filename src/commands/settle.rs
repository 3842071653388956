use crate::args::SettleArgs;
use crate::commands::Out;
use crate::model::Transaction;
use crate::{installments, Config, Result};
use anyhow::Context;

/// Marks one stored installment as paid or received.
pub async fn settle(config: Config, args: SettleArgs) -> Result<Out<Transaction>> {
    let mut store = config.store().await?;
    let transaction = store
        .get_mut(args.id())
        .with_context(|| format!("No transaction with id '{}'", args.id()))?;

    let previous = installments::settle(transaction)?;
    let settled = transaction.clone();
    if previous == settled.status() {
        return Ok(Out::new(
            format!("'{}' was already {previous}", settled.description()),
            settled,
        ));
    }

    config.save_store(&store).await?;
    Ok(Out::new(
        format!(
            "'{}' changed from {previous} to {}",
            settled.description(),
            settled.status()
        ),
        settled,
    ))
}
