use crate::model::{Status, Transaction, TransactionType};
use crate::Result;
use anyhow::bail;

/// The status that marks an installment of this type as done: income is received, expenses are
/// paid.
pub fn settled_status(transaction_type: TransactionType) -> Status {
    match transaction_type {
        TransactionType::Receita => Status::Recebido,
        TransactionType::Despesa => Status::Pago,
    }
}

/// Marks `transaction` as settled and returns the status it had before.
///
/// An already settled transaction is left as it is.
pub fn settle(transaction: &mut Transaction) -> Result<Status> {
    let previous = transaction.status();
    match previous {
        Status::Cancelado => bail!(
            "Transaction '{}' is cancelled and cannot be settled",
            transaction.id()
        ),
        Status::Pago | Status::Recebido => Ok(previous),
        Status::Pendente => {
            transaction.status = Some(settled_status(transaction.transaction_type()));
            Ok(previous)
        }
    }
}
