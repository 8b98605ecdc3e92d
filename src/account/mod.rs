//! Accounts and the running balances that transactions are applied to.

mod accounts_page;
mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;

pub use accounts_page::get_accounts_page;
pub use core::{
    Account, AccountId, NewAccount, adjust_account_balance, count_transactions_for_account,
    create_account, create_account_table, get_account, get_accounts_for_user,
    get_selectable_accounts, get_total_account_balance, map_row_to_account,
};
pub use create_endpoint::create_account_endpoint;
pub use delete_endpoint::delete_account_endpoint;
pub use edit_endpoint::edit_account_endpoint;
pub use edit_page::get_edit_account_page;
