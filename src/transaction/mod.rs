//! Transaction management for the application.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and database functions for storing and querying them
//! - The create/edit/delete endpoints that keep account balances in step with
//!   the recorded transactions
//! - View handlers for transaction-related web pages, CSV export and receipt
//!   uploads

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;
mod export_endpoint;
mod form;
mod new_transaction_page;
mod query;
mod receipt_endpoint;
mod transactions_page;

pub use core::{
    NewTransaction, Transaction, TransactionKind, count_transactions, create_transaction,
    create_transaction_table, get_transaction, map_transaction_row,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use edit_page::get_edit_transaction_page;
pub use export_endpoint::export_transactions_endpoint;
pub use new_transaction_page::get_create_transaction_page;
pub use query::{
    TransactionFilters, TransactionListItem, expense_totals_by_category, get_transactions,
    month_category_expense_total, month_prefix, month_start, parse_month, total_since,
};
pub use receipt_endpoint::upload_receipt_endpoint;
pub use transactions_page::get_transactions_page;

#[cfg(test)]
pub(crate) use core::test_utils;
