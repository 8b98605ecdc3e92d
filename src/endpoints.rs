//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/transactions/{transaction_id}/edit',
//! use [format_endpoint].

/// The root route which redirects to the dashboard or log in page.
pub const ROOT: &str = "/";
/// The landing page for logged in users.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page for displaying a user's transactions.
pub const TRANSACTIONS_VIEW: &str = "/transactions";
/// The page for creating a new transaction.
pub const NEW_TRANSACTION_VIEW: &str = "/transactions/new";
/// The page for editing an existing transaction.
pub const EDIT_TRANSACTION_VIEW: &str = "/transactions/{transaction_id}/edit";
/// The page for listing and creating accounts.
pub const ACCOUNTS_VIEW: &str = "/accounts";
/// The page for editing an existing account.
pub const EDIT_ACCOUNT_VIEW: &str = "/accounts/{account_id}/edit";
/// The page for listing and creating categories.
pub const CATEGORIES_VIEW: &str = "/categories";
/// The page for listing and setting monthly budgets.
pub const BUDGETS_VIEW: &str = "/budgets";
/// The page for editing an existing budget.
pub const EDIT_BUDGET_VIEW: &str = "/budgets/{budget_id}/edit";
/// The page for listing and creating recurring transactions.
pub const RECURRING_VIEW: &str = "/recurring";
/// The page for editing an existing recurring transaction.
pub const EDIT_RECURRING_VIEW: &str = "/recurring/{recurring_id}/edit";
/// The side-effecting route that expands due recurring transactions.
pub const GENERATE_RECURRING: &str = "/recurring/generate";
/// The page for listing and creating bill reminders.
///
/// Rendering this page also creates notifications for upcoming bills.
pub const BILLS_VIEW: &str = "/bills";
/// The page for editing an existing bill reminder.
pub const EDIT_BILL_VIEW: &str = "/bills/{bill_id}/edit";
/// The page for listing notifications.
pub const NOTIFICATIONS_VIEW: &str = "/notifications";
/// The page for listing and creating savings goals.
pub const SAVINGS_VIEW: &str = "/savings";
/// The page for editing an existing savings goal.
pub const EDIT_SAVINGS_VIEW: &str = "/savings/{goal_id}/edit";
/// The page showing the contribution history for a savings goal.
pub const SAVINGS_HISTORY_VIEW: &str = "/savings/{goal_id}/history";
/// The page showing the user's profile and usage counts.
pub const PROFILE_VIEW: &str = "/profile";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The route for resetting the user's password with their recovery hint.
pub const FORGOT_PASSWORD_VIEW: &str = "/forgot_password";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";
/// The route for uploaded receipt files.
pub const UPLOADS: &str = "/uploads";

/// The route to request a cup of coffee (experimental).
pub const COFFEE: &str = "/api/coffee";
/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to register a new user.
pub const USERS: &str = "/api/users";
/// The route for resetting a password with a recovery hint.
pub const FORGOT_PASSWORD_API: &str = "/api/forgot_password";
/// The route to create a transaction.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route to update or delete a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to upload a receipt for a transaction.
pub const TRANSACTION_RECEIPT: &str = "/api/transactions/{transaction_id}/receipt";
/// The route to export the user's transactions as CSV.
pub const EXPORT_TRANSACTIONS: &str = "/api/transactions/export";
/// The route to create an account.
pub const ACCOUNTS_API: &str = "/api/accounts";
/// The route to update or delete a single account.
pub const ACCOUNT: &str = "/api/accounts/{account_id}";
/// The route to create a category.
pub const CATEGORIES_API: &str = "/api/categories";
/// The route to delete a category.
pub const CATEGORY: &str = "/api/categories/{category_id}";
/// The route to create or replace a budget for (category, month).
pub const BUDGETS_API: &str = "/api/budgets";
/// The route to update or delete a single budget.
pub const BUDGET: &str = "/api/budgets/{budget_id}";
/// The side-effecting route that moves a month's remaining budget into savings.
pub const MOVE_TO_SAVINGS: &str = "/api/budgets/move_to_savings";
/// The route to create a recurring transaction.
pub const RECURRING_API: &str = "/api/recurring";
/// The route to update a single recurring transaction.
pub const RECURRING: &str = "/api/recurring/{recurring_id}";
/// The route to create a bill reminder.
pub const BILLS_API: &str = "/api/bills";
/// The route to update or delete a single bill reminder.
pub const BILL: &str = "/api/bills/{bill_id}";
/// The route to mark a bill reminder as paid.
pub const MARK_BILL_PAID: &str = "/api/bills/{bill_id}/paid";
/// The route to mark a notification as read.
pub const MARK_NOTIFICATION_READ: &str = "/api/notifications/{notification_id}/read";
/// The route to delete a notification.
pub const NOTIFICATION: &str = "/api/notifications/{notification_id}";
/// The route to create a savings goal.
pub const SAVINGS_API: &str = "/api/savings";
/// The route to update or delete a single savings goal.
pub const SAVINGS_GOAL: &str = "/api/savings/{goal_id}";
/// The route to contribute money towards a savings goal.
pub const CONTRIBUTE: &str = "/api/savings/{goal_id}/contribute";
/// The route to change the logged in user's password.
pub const CHANGE_PASSWORD: &str = "/api/profile/password";
/// The route to change the logged in user's preferred currency.
pub const UPDATE_CURRENCY: &str = "/api/profile/currency";
/// The route to delete the logged in user and everything they own.
pub const DELETE_PROFILE: &str = "/api/profile/delete";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
