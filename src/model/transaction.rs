use crate::model::Amount;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single financial transaction ("transação") as stored by the dashboard.
///
/// Field names on the wire are the dashboard's camelCase Portuguese names. Most fields are
/// optional because user data is often partially filled; the accessor methods resolve the
/// documented defaults so callers never probe `Option`s themselves.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub(crate) id: String,
    #[serde(rename = "descricao", default)]
    pub(crate) description: String,
    #[serde(rename = "valor", default)]
    pub(crate) amount: Amount,
    #[serde(rename = "tipo", default)]
    pub(crate) transaction_type: TransactionType,
    #[serde(rename = "categoria", default)]
    pub(crate) category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) status: Option<Status>,
    #[serde(
        rename = "periodicidade",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub(crate) periodicity: Option<Periodicity>,
    #[serde(
        rename = "quantidadeParcelas",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub(crate) installment_count: Option<u32>,
    #[serde(
        rename = "parcelaAtual",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub(crate) installment_number: Option<u32>,
    #[serde(
        rename = "transacaoPaiId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub(crate) parent_id: Option<String>,
    #[serde(rename = "data", default, skip_serializing_if = "Option::is_none")]
    pub(crate) date: Option<NaiveDate>,
}

impl Transaction {
    pub fn new(id: impl Into<String>, description: impl Into<String>, amount: Amount) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            amount,
            ..Default::default()
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// The status, where an absent status means `Pendente`.
    pub fn status(&self) -> Status {
        self.status.unwrap_or_default()
    }

    pub fn periodicity(&self) -> Option<Periodicity> {
        self.periodicity
    }

    /// Total installments in the series, `1` when absent.
    pub fn installment_count(&self) -> u32 {
        self.installment_count.unwrap_or(1)
    }

    /// 1-based position in the series, `1` when absent.
    pub fn installment_number(&self) -> u32 {
        self.installment_number.unwrap_or(1)
    }

    /// The parent id, treating an empty string as absent.
    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    /// The id of the series this transaction belongs to: its parent, or itself when it has none.
    pub fn series_key(&self) -> &str {
        self.parent_id().unwrap_or(&self.id)
    }

    /// True for `Pago` and `Recebido`.
    pub fn is_settled(&self) -> bool {
        self.status().is_settled()
    }

    pub fn with_type(mut self, transaction_type: TransactionType) -> Self {
        self.transaction_type = transaction_type;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_periodicity(mut self, periodicity: Periodicity) -> Self {
        self.periodicity = Some(periodicity);
        self
    }

    pub fn with_installment(mut self, number: u32, count: u32) -> Self {
        self.installment_number = Some(number);
        self.installment_count = Some(count);
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}

/// "tipo": whether money comes in or goes out.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Income.
    Receita,
    /// Expense.
    #[default]
    Despesa,
}

serde_plain::derive_display_from_serialize!(TransactionType);
serde_plain::derive_fromstr_from_deserialize!(TransactionType);

/// Payment status of a transaction.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Pendente,
    Pago,
    Recebido,
    Cancelado,
}

serde_plain::derive_display_from_serialize!(Status);
serde_plain::derive_fromstr_from_deserialize!(Status);

impl Status {
    pub fn is_settled(&self) -> bool {
        matches!(self, Status::Pago | Status::Recebido)
    }
}

/// "periodicidade": the recurrence cadence of a transaction.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Periodicity {
    #[default]
    Unica,
    Mensal,
    Bimestral,
    Trimestral,
    Semestral,
    Anual,
    Parcelada,
}

serde_plain::derive_display_from_serialize!(Periodicity);
serde_plain::derive_fromstr_from_deserialize!(Periodicity);

impl Periodicity {
    pub fn is_recurring(&self) -> bool {
        !matches!(self, Periodicity::Unica)
    }

    /// Months between consecutive installments. `None` for a one-off transaction.
    pub fn months(&self) -> Option<u32> {
        match self {
            Periodicity::Unica => None,
            Periodicity::Mensal | Periodicity::Parcelada => Some(1),
            Periodicity::Bimestral => Some(2),
            Periodicity::Trimestral => Some(3),
            Periodicity::Semestral => Some(6),
            Periodicity::Anual => Some(12),
        }
    }
}
