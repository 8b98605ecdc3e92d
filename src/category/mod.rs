//! Categories that group transactions and budgets.

mod categories_page;
mod core;
mod create_endpoint;
mod delete_endpoint;

pub use categories_page::get_categories_page;
pub use core::{
    Category, CategoryId, CategoryKind, CategoryName, NewCategory, create_category,
    create_category_table, get_category, get_expense_categories, get_selectable_categories,
    map_category_row,
};
pub use create_endpoint::create_category_endpoint;
pub use delete_endpoint::delete_category_endpoint;
