use crate::args::ExpandArgs;
use crate::commands::Out;
use crate::installments::{expand_series, SeriesPlan};
use crate::model::Transaction;
use crate::{Config, Result};

/// Creates every installment of a new series and appends them to the store.
pub async fn expand(config: Config, args: ExpandArgs) -> Result<Out<Vec<Transaction>>> {
    let plan = SeriesPlan {
        description: args.description().to_string(),
        amount: args.amount(),
        transaction_type: args.transaction_type(),
        category: args.category().to_string(),
        periodicity: args.periodicity(),
        count: args.count(),
        first_date: args.first_date(),
        settled: args.settled(),
        parent_id: None,
    };
    let created = expand_series(&plan)?;

    let mut store = config.store().await?;
    store.merge(created.clone())?;
    config.save_store(&store).await?;

    let parent_id = created.first().map(Transaction::id).unwrap_or_default();
    Ok(Out::new(
        format!(
            "Created {} installments of {} under parent {parent_id}",
            created.len(),
            plan.amount
        ),
        created,
    ))
}
