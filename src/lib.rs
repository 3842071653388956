//! NitronFlow installments: grouping, reconciliation and expansion of installment series
//! ("parcelas") over a flat list of financial transactions.
//!
//! The pure logic lives in [`installments`]; everything else supports the `nitron` CLI.

pub mod args;
mod backup;
pub mod commands;
mod config;
mod error;
pub mod installments;
pub mod model;
mod store;
mod utils;


pub use config::Config;
pub use error::Error;
pub use error::Result;
pub use store::{ImportFormat, MergeReport, TransactionStore};
