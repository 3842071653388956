//! Materializes every installment of a new series up front, the way the dashboard does when an
//! installment purchase or receivable is registered.

use super::{settled_status, strip_installment_suffix};
use crate::model::{Amount, Periodicity, Status, Transaction, TransactionType};
use crate::Result;
use anyhow::{bail, ensure, Context};
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Longest series accepted: a century of monthly installments.
pub const MAX_INSTALLMENTS: u32 = 1200;

/// Describes a series to be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPlan {
    pub description: String,
    /// Value of each installment.
    pub amount: Amount,
    pub transaction_type: TransactionType,
    pub category: String,
    pub periodicity: Periodicity,
    pub count: u32,
    pub first_date: NaiveDate,
    /// How many leading installments are already settled.
    #[serde(default)]
    pub settled: u32,
    /// Id for the first installment. A random v4 UUID when absent.
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// Builds the `count` transactions of the series described by `plan`.
///
/// The first installment uses the parent id as its own id; later installments get fresh ids and
/// point back at it. Due dates advance by the periodicity's step in months, clamping to the last
/// day of shorter months.
pub fn expand_series(plan: &SeriesPlan) -> Result<Vec<Transaction>> {
    let step = match plan.periodicity.months() {
        Some(step) => step,
        None => bail!("A one-off ('unica') transaction cannot be split into installments"),
    };
    ensure!(
        plan.count > 1,
        "An installment series needs at least 2 installments, got {}",
        plan.count
    );
    ensure!(
        plan.count <= MAX_INSTALLMENTS,
        "An installment series can have at most {MAX_INSTALLMENTS} installments, got {}",
        plan.count
    );
    ensure!(
        plan.settled <= plan.count,
        "Cannot mark {} installments as settled in a series of {}",
        plan.settled,
        plan.count
    );
    ensure!(
        !plan.amount.is_negative(),
        "The installment amount cannot be negative, got {}",
        plan.amount
    );

    let parent_id = plan
        .parent_id
        .clone()
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let base = strip_installment_suffix(plan.description.trim());
    let done = settled_status(plan.transaction_type);

    let mut transactions = Vec::with_capacity(plan.count as usize);
    for number in 1..=plan.count {
        let offset = Months::new(step * (number - 1));
        let date = plan
            .first_date
            .checked_add_months(offset)
            .with_context(|| {
                format!(
                    "Installment {number} falls outside the supported date range starting from {}",
                    plan.first_date
                )
            })?;
        let id = if number == 1 {
            parent_id.clone()
        } else {
            Uuid::new_v4().to_string()
        };
        let status = if number <= plan.settled {
            done
        } else {
            Status::Pendente
        };

        let mut transaction = Transaction::new(
            id,
            format!("{base} ({number}/{})", plan.count),
            plan.amount,
        )
        .with_type(plan.transaction_type)
        .with_category(plan.category.clone())
        .with_periodicity(plan.periodicity)
        .with_installment(number, plan.count)
        .with_status(status)
        .with_date(date);
        if number > 1 {
            transaction = transaction.with_parent(parent_id.clone());
        }
        transactions.push(transaction);
    }

    debug!(
        "Expanded '{base}' into {} installments under parent {parent_id}",
        transactions.len()
    );
    Ok(transactions)
}
