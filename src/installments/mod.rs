//! Grouping and reconciliation of installment series ("parcelas").
//!
//! A series is the set of transactions that share a parent: the first installment carries no
//! `transacaoPaiId` and every later installment points back at it. Everything in here is a pure
//! function over a borrowed snapshot of the transaction list, so the functions are safe to call
//! from anywhere without coordination.
//!
//! None of these functions fail. Missing fields resolve to the defaults documented on
//! [`Transaction`], which keeps the reports usable over partially filled user data.

mod expand;
mod overview;
mod settle;

pub use expand::{expand_series, SeriesPlan, MAX_INSTALLMENTS};
pub use overview::{Overview, TypeTotals};
pub use settle::{settle, settled_status};

use crate::model::{Amount, Transaction, TransactionType};
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use tracing::{debug, trace};

/// The transactions of one series, keyed by the parent id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallmentSeries {
    key: String,
    members: Vec<Transaction>,
}

impl InstallmentSeries {
    /// The parent transaction id shared by every member.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Members ordered by installment number, unique by id.
    pub fn members(&self) -> &[Transaction] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Summarizes this series. `None` only for an empty series, which grouping never produces.
    pub fn summary(&self) -> Option<SeriesSummary> {
        compute_series_summary(&self.key, &self.members)
    }
}

/// Payment progress of one series, ready for display.
///
/// Serialized with the dashboard's field names so a front end can consume it directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesSummary {
    key: String,
    #[serde(rename = "descricao")]
    description: String,
    #[serde(rename = "tipo")]
    transaction_type: TransactionType,
    #[serde(rename = "categoria")]
    category: String,
    #[serde(rename = "totalParcelas")]
    total: u32,
    #[serde(rename = "parcelasPagas")]
    paid: u32,
    #[serde(rename = "parcelasPendentes")]
    pending: i64,
    #[serde(rename = "valorParcela")]
    installment_value: Amount,
    #[serde(rename = "valorTotal")]
    total_value: Amount,
    #[serde(rename = "valorPago")]
    paid_value: Amount,
    #[serde(rename = "valorRestante")]
    remaining_value: Amount,
    #[serde(rename = "percentualPago")]
    paid_percent: Decimal,
    #[serde(rename = "todasParcelas")]
    installments: Vec<Transaction>,
}

impl SeriesSummary {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The representative's description without its `(n/m)` marker.
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Nominal number of installments in the series.
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Members whose status is `pago` or `recebido`.
    pub fn paid(&self) -> u32 {
        self.paid
    }

    /// `total - paid`. Counted against the nominal total, so it can exceed the number of
    /// materialized pending members, and goes negative on inconsistent data.
    pub fn pending(&self) -> i64 {
        self.pending
    }

    pub fn installment_value(&self) -> Amount {
        self.installment_value
    }

    pub fn total_value(&self) -> Amount {
        self.total_value
    }

    /// `paid × installment_value`. Assumes every installment of the series has the same value.
    pub fn paid_value(&self) -> Amount {
        self.paid_value
    }

    pub fn remaining_value(&self) -> Amount {
        self.remaining_value
    }

    /// Percentage of the total already paid. Not clamped to 100.
    pub fn paid_percent(&self) -> Decimal {
        self.paid_percent
    }

    /// All members, ascending by installment number.
    pub fn installments(&self) -> &[Transaction] {
        &self.installments
    }

    pub fn is_open(&self) -> bool {
        self.pending > 0
    }
}

/// Keeps the transactions that belong to an installment series: a recurring periodicity and more
/// than one installment. Relative order is preserved.
pub fn select_installment_transactions(transactions: &[Transaction]) -> Vec<Transaction> {
    let selected: Vec<Transaction> = transactions
        .iter()
        .filter(|t| {
            t.periodicity().is_some_and(|p| p.is_recurring())
                && t.installment_count.is_some_and(|count| count > 1)
        })
        .cloned()
        .collect();
    debug!(
        "Selected {} installment transactions out of {}",
        selected.len(),
        transactions.len()
    );
    selected
}

/// Groups transactions by [`Transaction::series_key`].
///
/// Series appear in the order their key was first seen. Members are sorted by installment number
/// (stable, so equal numbers keep input order) and a repeated id is only kept the first time.
pub fn group_by_series(transactions: &[Transaction]) -> Vec<InstallmentSeries> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut series: Vec<InstallmentSeries> = Vec::new();

    for transaction in transactions {
        let key = transaction.series_key();
        if !seen.insert((key, transaction.id())) {
            trace!(
                "Dropping duplicate transaction '{}' in series '{key}'",
                transaction.id()
            );
            continue;
        }
        let ix = *index.entry(key).or_insert_with(|| {
            series.push(InstallmentSeries {
                key: key.to_string(),
                members: Vec::new(),
            });
            series.len() - 1
        });
        series[ix].members.push(transaction.clone());
    }

    for s in series.iter_mut() {
        s.members.sort_by_key(Transaction::installment_number);
    }
    series
}

/// Computes the payment progress of one series. The first member is the representative whose
/// count, value, type and category stand for the whole series.
///
/// Returns `None` for an empty slice.
pub fn compute_series_summary(key: &str, series: &[Transaction]) -> Option<SeriesSummary> {
    let representative = series.first()?;

    let total = representative.installment_count();
    let paid = series.iter().filter(|t| t.is_settled()).count() as u32;
    let pending = i64::from(total) - i64::from(paid);

    // Values past Decimal's range clamp to its bounds.
    let installment_value = representative.amount();
    let total_value = installment_value.saturating_mul(total);
    let paid_value = installment_value.saturating_mul(paid);
    let remaining_value = total_value.saturating_sub(paid_value);
    let paid_percent = if total_value.is_positive() {
        paid_ratio(installment_value, paid, total)
            .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
            .unwrap_or(Decimal::ZERO)
    } else {
        Decimal::ZERO
    };

    let mut installments = series.to_vec();
    installments.sort_by_key(Transaction::installment_number);

    Some(SeriesSummary {
        key: key.to_string(),
        description: strip_installment_suffix(representative.description()).to_string(),
        transaction_type: representative.transaction_type(),
        category: representative.category().to_string(),
        total,
        paid,
        pending,
        installment_value,
        total_value,
        paid_value,
        remaining_value,
        paid_percent,
        installments,
    })
}

/// `paid_value / total_value`. When either value leaves the decimal range the ratio is taken from
/// the counts, which is the same quotient for a uniform installment value.
fn paid_ratio(installment_value: Amount, paid: u32, total: u32) -> Option<Decimal> {
    match (
        installment_value.checked_mul(paid),
        installment_value.checked_mul(total),
    ) {
        (Some(paid_value), Some(total_value)) => paid_value.checked_div(total_value),
        _ => Decimal::from(paid).checked_div(Decimal::from(total)),
    }
}

// ASCII only: `\d` and `\s` would also accept other scripts' digits and spaces.
fn suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?-u:\s)+\([0-9]+/[0-9]+\)$").expect("invalid installment suffix regex")
    })
}

/// Removes a trailing ` (n/m)` installment marker, e.g. `"Aluguel (3/12)"` -> `"Aluguel"`.
/// Any other string comes back unchanged.
pub fn strip_installment_suffix(description: &str) -> &str {
    match suffix_re().find(description) {
        Some(m) => &description[..m.start()],
        None => description,
    }
}

/// Select, group and summarize in one pass, in first-seen series order.
pub fn reconcile(transactions: &[Transaction]) -> Vec<SeriesSummary> {
    let selected = select_installment_transactions(transactions);
    group_by_series(&selected)
        .iter()
        .filter_map(InstallmentSeries::summary)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Periodicity, Status};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn amount(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    fn installment(id: &str, number: u32, count: u32, status: Status) -> Transaction {
        Transaction::new(id, format!("Aluguel ({number}/{count})"), amount("100"))
            .with_periodicity(Periodicity::Mensal)
            .with_installment(number, count)
            .with_status(status)
    }

    #[test]
    fn test_select_filters_one_offs_and_single_installments() {
        let transactions = vec![
            installment("a", 1, 12, Status::Pendente),
            Transaction::new("b", "Café", amount("5")).with_periodicity(Periodicity::Unica),
            installment("c", 1, 1, Status::Pendente),
            Transaction::new("d", "Sem periodicidade", amount("5")).with_installment(1, 3),
            {
                let mut t = installment("e", 1, 3, Status::Pendente);
                t.installment_count = None;
                t
            },
            installment("f", 1, 2, Status::Pago).with_periodicity(Periodicity::Anual),
        ];
        let selected = select_installment_transactions(&transactions);
        let ids: Vec<&str> = selected.iter().map(Transaction::id).collect();
        assert_eq!(ids, vec!["a", "f"]);
        assert!(selected.iter().all(|t| {
            t.periodicity() != Some(Periodicity::Unica) && t.installment_count() > 1
        }));
    }

    #[test]
    fn test_group_keys_and_first_seen_order() {
        let transactions = vec![
            installment("b2", 2, 3, Status::Pendente).with_parent("b"),
            installment("a", 1, 3, Status::Pendente),
            installment("b", 1, 3, Status::Pendente),
            installment("a2", 2, 3, Status::Pendente).with_parent("a"),
            installment("solo", 1, 3, Status::Pendente),
        ];
        let series = group_by_series(&transactions);
        let keys: Vec<&str> = series.iter().map(InstallmentSeries::key).collect();
        assert_eq!(keys, vec!["b", "a", "solo"]);

        let total: usize = series.iter().map(InstallmentSeries::len).sum();
        assert_eq!(total, transactions.len());

        // the parent sorts ahead of the child that arrived first
        let b: Vec<&str> = series[0].members().iter().map(Transaction::id).collect();
        assert_eq!(b, vec!["b", "b2"]);
        assert_eq!(series[2].members()[0].id(), "solo");
    }

    #[test]
    fn test_group_drops_duplicate_ids() {
        let transactions = vec![
            installment("a", 1, 3, Status::Pendente),
            installment("a2", 2, 3, Status::Pago).with_parent("a"),
            installment("a2", 2, 3, Status::Pendente).with_parent("a"),
        ];
        let series = group_by_series(&transactions);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].len(), 2);
        assert_eq!(series[0].members()[1].status(), Status::Pago);
    }

    #[test]
    fn test_group_empty_input() {
        assert!(group_by_series(&[]).is_empty());
        assert!(reconcile(&[]).is_empty());
    }

    #[test]
    fn test_summary_arithmetic() {
        let series: Vec<Transaction> = (1..=5)
            .map(|n| {
                let status = if n <= 3 { Status::Pago } else { Status::Pendente };
                installment(&format!("t{n}"), n, 12, status)
            })
            .collect();
        let summary = compute_series_summary("t1", &series).unwrap();
        assert_eq!(summary.total(), 12);
        assert_eq!(summary.paid(), 3);
        // counted from the nominal total, not from the five materialized members
        assert_eq!(summary.pending(), 9);
        assert_eq!(summary.total_value(), amount("1200"));
        assert_eq!(summary.paid_value(), amount("300"));
        assert_eq!(summary.remaining_value(), amount("900"));
        assert_eq!(summary.paid_percent(), dec("25"));
        assert_eq!(summary.description(), "Aluguel");
    }

    #[test]
    fn test_summary_counts_recebido_but_not_cancelado() {
        let series = vec![
            installment("a", 1, 4, Status::Recebido),
            installment("b", 2, 4, Status::Cancelado),
            installment("c", 3, 4, Status::Pago),
        ];
        let summary = compute_series_summary("a", &series).unwrap();
        assert_eq!(summary.paid(), 2);
    }

    #[test]
    fn test_summary_sorts_installments() {
        let series = vec![
            installment("c", 3, 3, Status::Pendente),
            installment("a", 1, 3, Status::Pendente),
            installment("b", 2, 3, Status::Pendente),
        ];
        let summary = compute_series_summary("a", &series).unwrap();
        let numbers: Vec<u32> = summary
            .installments()
            .iter()
            .map(Transaction::installment_number)
            .collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn test_summary_missing_installment_number_sorts_first() {
        let mut bare = installment("x", 1, 3, Status::Pendente);
        bare.installment_number = None;
        let series = vec![installment("y", 2, 3, Status::Pendente), bare];
        let summary = compute_series_summary("x", &series).unwrap();
        assert_eq!(summary.installments()[0].id(), "x");
    }

    #[test]
    fn test_summary_zero_value_has_zero_percent() {
        let series = vec![Transaction::new("a", "Brinde", Amount::ZERO)
            .with_installment(1, 3)
            .with_status(Status::Pago)];
        let summary = compute_series_summary("a", &series).unwrap();
        assert_eq!(summary.paid_percent(), Decimal::ZERO);
    }

    #[test]
    fn test_summary_not_clamped() {
        let series = vec![
            installment("a", 1, 2, Status::Pago),
            installment("b", 2, 2, Status::Pago),
            installment("c", 3, 2, Status::Pago),
        ];
        let summary = compute_series_summary("a", &series).unwrap();
        assert_eq!(summary.pending(), -1);
        assert_eq!(summary.paid_percent(), dec("150"));
        assert!(summary.remaining_value().is_negative());
    }

    #[test]
    fn test_summary_saturates_huge_installment_value() {
        let json = r#"[{"id":"a","valor":"79228162514264337593543950335","periodicidade":"mensal","quantidadeParcelas":2,"parcelaAtual":1}]"#;
        let transactions: Vec<Transaction> = serde_json::from_str(json).unwrap();
        let summaries = reconcile(&transactions);
        assert_eq!(summaries.len(), 1);
        let summary = &summaries[0];
        assert_eq!(summary.installment_value(), Amount::new(Decimal::MAX));
        assert_eq!(summary.total_value(), Amount::new(Decimal::MAX));
        assert_eq!(summary.paid_value(), Amount::ZERO);
        assert_eq!(summary.remaining_value(), Amount::new(Decimal::MAX));
        assert_eq!(summary.paid_percent(), Decimal::ZERO);
        assert_eq!(summary.pending(), 2);
    }

    #[test]
    fn test_summary_huge_installment_value_fully_paid() {
        let huge = Amount::new(Decimal::MAX);
        let series = vec![
            Transaction::new("a", "Imóvel (1/2)", huge)
                .with_periodicity(Periodicity::Mensal)
                .with_installment(1, 2)
                .with_status(Status::Pago),
            Transaction::new("b", "Imóvel (2/2)", huge)
                .with_periodicity(Periodicity::Mensal)
                .with_installment(2, 2)
                .with_status(Status::Pago)
                .with_parent("a"),
        ];
        let summary = compute_series_summary("a", &series).unwrap();
        assert_eq!(summary.remaining_value(), Amount::ZERO);
        assert_eq!(summary.paid_percent(), dec("100"));
        assert_eq!(summary.pending(), 0);
    }

    #[test]
    fn test_summary_defaults_for_sparse_representative() {
        let series = vec![Transaction::new("a", "Avulsa", amount("80"))];
        let summary = compute_series_summary("a", &series).unwrap();
        assert_eq!(summary.total(), 1);
        assert_eq!(summary.pending(), 1);
        assert_eq!(summary.total_value(), amount("80"));
    }

    #[test]
    fn test_summary_empty_series() {
        assert!(compute_series_summary("a", &[]).is_none());
    }

    #[test]
    fn test_summary_is_idempotent() {
        let series = vec![
            installment("b", 2, 3, Status::Pago),
            installment("a", 1, 3, Status::Pendente),
        ];
        let first = compute_series_summary("a", &series);
        let second = compute_series_summary("a", &series);
        assert_eq!(first, second);
    }

    #[test]
    fn test_strip_installment_suffix() {
        assert_eq!(strip_installment_suffix("Aluguel (3/12)"), "Aluguel");
        assert_eq!(strip_installment_suffix("Aluguel Mensal"), "Aluguel Mensal");
        assert_eq!(strip_installment_suffix("Curso  (10/24)"), "Curso");
        assert_eq!(strip_installment_suffix("Aluguel(3/12)"), "Aluguel(3/12)");
        assert_eq!(strip_installment_suffix("Aluguel (3/12) extra"), "Aluguel (3/12) extra");
        assert_eq!(strip_installment_suffix("Aluguel (a/12)"), "Aluguel (a/12)");
        assert_eq!(strip_installment_suffix(""), "");
    }

    #[test]
    fn test_strip_installment_suffix_is_ascii_only() {
        // Arabic-Indic digits
        assert_eq!(strip_installment_suffix("Aluguel (٣/١٢)"), "Aluguel (٣/١٢)");
        // no-break space and ideographic space before the marker
        assert_eq!(strip_installment_suffix("Aluguel\u{a0}(3/12)"), "Aluguel\u{a0}(3/12)");
        assert_eq!(strip_installment_suffix("Aluguel\u{3000}(3/12)"), "Aluguel\u{3000}(3/12)");
        assert_eq!(strip_installment_suffix("Aluguel\t(3/12)"), "Aluguel");
    }

    #[test]
    fn test_end_to_end() {
        let parent = Transaction::new("a", "Consultoria (1/6)", amount("50"))
            .with_periodicity(Periodicity::Mensal)
            .with_installment(1, 6)
            .with_status(Status::Pago);
        let mut transactions = vec![parent];
        for n in 2..=6 {
            let status = if n == 2 { Status::Pago } else { Status::Pendente };
            transactions.push(
                Transaction::new(format!("a{n}"), format!("Consultoria ({n}/6)"), amount("50"))
                    .with_periodicity(Periodicity::Mensal)
                    .with_installment(n, 6)
                    .with_status(status)
                    .with_parent("a"),
            );
        }
        transactions.push(Transaction::new("z", "Café", amount("7")));

        let summaries = reconcile(&transactions);
        assert_eq!(summaries.len(), 1);
        let summary = &summaries[0];
        assert_eq!(summary.key(), "a");
        assert_eq!(summary.paid(), 2);
        assert_eq!(summary.paid_value(), amount("100"));
        assert_eq!(summary.total_value(), amount("300"));
        assert_eq!(summary.paid_percent().round_dp(2), dec("33.33"));
        assert_eq!(summary.installments().len(), 6);
        assert!(summary.is_open());
    }

    #[test]
    fn test_summary_serializes_dashboard_names() {
        let series = vec![installment("a", 1, 2, Status::Pago)];
        let summary = compute_series_summary("a", &series).unwrap();
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["totalParcelas"], 2);
        assert_eq!(json["parcelasPagas"], 1);
        assert_eq!(json["valorPago"], "100");
        assert!(json["todasParcelas"].is_array());
    }
}
