//! Recurring transactions: templates that periodically spawn concrete
//! transactions, and the schedule arithmetic that decides when they fire.

mod core;
mod create_endpoint;
mod edit_endpoint;
mod edit_page;
mod generate_endpoint;
mod recurring_page;
mod schedule;

pub use core::{
    NewRecurringTransaction, RecurringId, RecurringListItem, RecurringTransaction,
    create_recurring_transaction_table, get_active_recurring_transactions,
    get_recurring_transaction, list_recurring_transactions,
};
pub use create_endpoint::create_recurring_endpoint;
pub use edit_endpoint::edit_recurring_endpoint;
pub use edit_page::get_edit_recurring_page;
pub use generate_endpoint::generate_recurring_endpoint;
pub use recurring_page::get_recurring_page;
pub use schedule::{Frequency, next_due_date, should_generate};
