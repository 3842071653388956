use crate::args::InstallmentsArgs;
use crate::commands::Out;
use crate::installments::{reconcile, Overview, SeriesSummary};
use crate::{Config, Result};
use serde::Serialize;
use std::fmt::Write;

/// Everything the installments page shows: the header totals and one summary per series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallmentReport {
    pub overview: Overview,
    pub series: Vec<SeriesSummary>,
}

/// Reconciles the stored transactions into series summaries, filtered by `args`.
pub async fn installments(config: Config, args: InstallmentsArgs) -> Result<Out<InstallmentReport>> {
    let store = config.store().await?;
    let series: Vec<SeriesSummary> = reconcile(store.transactions())
        .into_iter()
        .filter(|s| {
            args.transaction_type()
                .map_or(true, |wanted| s.transaction_type() == wanted)
        })
        .filter(|s| !args.open() || s.is_open())
        .collect();
    let overview = Overview::from_summaries(&series);
    let report = InstallmentReport { overview, series };
    Ok(Out::new(render(&report), report))
}

fn render(report: &InstallmentReport) -> String {
    if report.series.is_empty() {
        return "No installment series found".to_string();
    }

    let mut s = String::new();
    for summary in &report.series {
        let _ = writeln!(
            s,
            "{} [{}] {}/{} settled, {} of {} ({}%), {} remaining",
            summary.description(),
            summary.transaction_type(),
            summary.paid(),
            summary.total(),
            summary.paid_value(),
            summary.total_value(),
            summary.paid_percent().round_dp(2),
            summary.remaining_value(),
        );
    }
    let o = &report.overview;
    let _ = write!(
        s,
        "{} series ({} settled). To receive: {}. To pay: {}.",
        o.series, o.settled_series, o.income.remaining_value, o.expenses.remaining_value
    );
    s
}
