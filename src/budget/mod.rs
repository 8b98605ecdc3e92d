//! Monthly spending limits per category and the over-budget alert.

mod budgets_page;
mod core;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;
mod move_to_savings_endpoint;
mod upsert_endpoint;

pub use budgets_page::get_budgets_page;
pub use core::{
    BUDGET_EXCEEDED_MESSAGE, Budget, BudgetId, BudgetListItem, DEFAULT_ALERT_THRESHOLD,
    check_budget_alert, create_budget_table, is_over_budget, upsert_budget,
};
pub use delete_endpoint::delete_budget_endpoint;
pub use edit_endpoint::edit_budget_endpoint;
pub use edit_page::get_edit_budget_page;
pub use move_to_savings_endpoint::move_to_savings_endpoint;
pub use upsert_endpoint::upsert_budget_endpoint;
