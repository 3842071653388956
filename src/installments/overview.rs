use super::SeriesSummary;
use crate::model::{Amount, TransactionType};
use serde::Serialize;

/// Totals across all series of one transaction type.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeTotals {
    pub series: usize,
    #[serde(rename = "valorTotal")]
    pub total_value: Amount,
    #[serde(rename = "valorPago")]
    pub paid_value: Amount,
    #[serde(rename = "valorRestante")]
    pub remaining_value: Amount,
}

impl TypeTotals {
    fn add(&mut self, summary: &SeriesSummary) {
        self.series += 1;
        self.total_value = self.total_value.saturating_add(summary.total_value());
        self.paid_value = self.paid_value.saturating_add(summary.paid_value());
        self.remaining_value = self.remaining_value.saturating_add(summary.remaining_value());
    }
}

/// The header cards of the installments page: how much is owed and receivable across all series.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub series: usize,
    /// Series with nothing left to pay.
    pub settled_series: usize,
    #[serde(rename = "receitas")]
    pub income: TypeTotals,
    #[serde(rename = "despesas")]
    pub expenses: TypeTotals,
}

impl Overview {
    pub fn from_summaries<'a>(summaries: impl IntoIterator<Item = &'a SeriesSummary>) -> Self {
        let mut overview = Overview::default();
        for summary in summaries {
            overview.series += 1;
            if !summary.is_open() {
                overview.settled_series += 1;
            }
            match summary.transaction_type() {
                TransactionType::Receita => overview.income.add(summary),
                TransactionType::Despesa => overview.expenses.add(summary),
            }
        }
        overview
    }
}
