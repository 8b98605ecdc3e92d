//! Savings goals, their contribution history and progress tracking.

mod contribute_endpoint;
mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;
mod history_page;
mod savings_page;

pub use contribute_endpoint::contribute_endpoint;
pub use core::{
    GoalId, NewSavingsGoal, SavingsContribution, SavingsGoal, add_to_unexpired_goals,
    average_goal_progress, create_goal, create_savings_goal_table, create_savings_history_table,
    get_goal, get_goals_for_user,
};
pub use create_endpoint::create_goal_endpoint;
pub use delete_endpoint::delete_savings_endpoint;
pub use edit_endpoint::edit_savings_endpoint;
pub use edit_page::get_edit_savings_page;
pub use history_page::get_savings_history_page;
pub use savings_page::get_savings_page;
