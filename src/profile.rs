//! The profile page: account details, usage counts, password and currency
//! changes, and account deletion.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{Form, PrivateCookieJar};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword,
    alert::Alert,
    auth::invalidate_auth_cookie,
    endpoints,
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, base, password_input,
    },
    navigation::NavBar,
    user::{User, UserID, delete_user, get_user_by_id, update_currency, update_password},
};

/// The state needed for the profile page and its endpoints.
#[derive(Debug, Clone)]
pub struct ProfileState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ProfileState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// How much of the app a user has filled in, shown on the profile page.
#[derive(Debug, Default, Clone, PartialEq)]
struct UsageCounts {
    transactions: i64,
    budgets: i64,
    savings_goals: i64,
    accounts: i64,
}

fn count_rows(table: &str, user_id: UserID, connection: &Connection) -> Result<i64, Error> {
    connection
        .prepare(&format!(
            "SELECT COUNT(id) FROM {table} WHERE user_id = :user_id"
        ))?
        .query_one(&[(":user_id", &user_id.as_i64())], |row| row.get(0))
        .map_err(|error| error.into())
}

fn get_usage_counts(user_id: UserID, connection: &Connection) -> Result<UsageCounts, Error> {
    Ok(UsageCounts {
        transactions: count_rows("\"transaction\"", user_id, connection)?,
        budgets: count_rows("budget", user_id, connection)?,
        savings_goals: count_rows("savings_goal", user_id, connection)?,
        accounts: count_rows("account", user_id, connection)?,
    })
}

/// Render the profile page.
pub async fn get_profile_page(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve user: {error}"))?;
    let counts = get_usage_counts(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve usage counts: {error}"))?;

    Ok(profile_view(&user, &counts).into_response())
}

fn profile_view(user: &User, counts: &UsageCounts) -> Markup {
    let nav_bar = NavBar::new(endpoints::PROFILE_VIEW).into_html();

    let stat = |label: &str, value: i64| {
        html!(
            div class="rounded border border-gray-200 bg-white px-4 py-3 text-center
                dark:border-gray-700 dark:bg-gray-800"
            {
                p class="text-2xl font-bold" { (value) }
                p class="text-sm text-gray-500 dark:text-gray-400" { (label) }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-6 w-full lg:max-w-3xl"
            {
                header
                {
                    h1 class="text-xl font-bold" { (user.full_name) }
                    p class="text-sm text-gray-500 dark:text-gray-400"
                    {
                        (user.email) " · member since " (user.created_at)
                    }
                }

                div class="grid grid-cols-2 lg:grid-cols-4 gap-4"
                {
                    (stat("Transactions", counts.transactions))
                    (stat("Budgets", counts.budgets))
                    (stat("Savings goals", counts.savings_goals))
                    (stat("Accounts", counts.accounts))
                }

                section class="max-w-md space-y-4"
                {
                    h2 class="text-lg font-bold" { "Preferred currency" }

                    form
                        hx-post=(endpoints::UPDATE_CURRENCY)
                        hx-target-error="#alert-container"
                        class="flex gap-2 items-end"
                    {
                        div
                        {
                            label for="currency" class=(FORM_LABEL_STYLE) { "Currency code" }
                            input type="text" name="currency" id="currency" maxlength="3"
                                class=(FORM_TEXT_INPUT_STYLE) value=(user.currency) required;
                        }

                        button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save" }
                    }
                }

                section class="max-w-md space-y-4"
                {
                    h2 class="text-lg font-bold" { "Change password" }

                    form
                        hx-post=(endpoints::CHANGE_PASSWORD)
                        hx-target-error="#alert-container"
                        class="space-y-4"
                    {
                        div
                        {
                            label for="current_password" class=(FORM_LABEL_STYLE)
                            {
                                "Current password"
                            }
                            input type="password" name="current_password" id="current_password"
                                class=(FORM_TEXT_INPUT_STYLE) required;
                        }

                        (password_input("", 14, None))

                        div
                        {
                            label for="confirm_password" class=(FORM_LABEL_STYLE)
                            {
                                "Confirm new password"
                            }
                            input type="password" name="confirm_password" id="confirm_password"
                                class=(FORM_TEXT_INPUT_STYLE) required;
                        }

                        button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Change password" }
                    }
                }

                section class="max-w-md space-y-4"
                {
                    h2 class="text-lg font-bold" { "Delete account" }

                    p class="text-sm text-gray-500 dark:text-gray-400"
                    {
                        "This deletes your profile and everything in it: transactions, \
                        accounts, budgets, recurring transactions, bills, notifications \
                        and savings goals."
                    }

                    form
                        hx-post=(endpoints::DELETE_PROFILE)
                        hx-confirm="Delete your profile and all of its data? This cannot be undone."
                        hx-target-error="#alert-container"
                    {
                        button type="submit" class=(BUTTON_DELETE_STYLE)
                        {
                            "Delete my account"
                        }
                    }
                }
            }
        }
    );

    base("Profile", &[], &content)
}

/// The form data for changing the password.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordForm {
    /// The password currently set.
    pub current_password: String,
    /// The replacement password.
    pub password: String,
    /// A repeat of the replacement password to catch typos.
    pub confirm_password: String,
}

/// A route handler that changes the logged in user's password after
/// verifying their current one.
pub async fn change_password_endpoint(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<ChangePasswordForm>,
) -> Response {
    if form.password != form.confirm_password {
        return Alert::ErrorSimple {
            message: "Passwords do not match".to_owned(),
        }
        .into_response_with_status(StatusCode::BAD_REQUEST);
    }

    let validated_password = match ValidatedPassword::new(&form.password) {
        Ok(password) => password,
        Err(error) => {
            return Alert::ErrorSimple {
                message: error.to_string(),
            }
            .into_response_with_status(StatusCode::BAD_REQUEST);
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let user = match get_user_by_id(user_id, &connection) {
        Ok(user) => user,
        Err(error) => {
            tracing::error!("Failed to retrieve user: {error}");
            return error.into_alert_response();
        }
    };

    match user.password_hash.verify(&form.current_password) {
        Ok(true) => {}
        Ok(false) => {
            return Alert::ErrorSimple {
                message: "Incorrect current password".to_owned(),
            }
            .into_response_with_status(StatusCode::BAD_REQUEST);
        }
        Err(error) => {
            tracing::error!("Error verifying password: {error}");
            return Error::HashingError(error.to_string()).into_alert_response();
        }
    }

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(password_hash) => password_hash,
        Err(error) => {
            tracing::error!("Error hashing password: {error}");
            return error.into_alert_response();
        }
    };

    if let Err(error) = update_password(user_id, &password_hash, &connection) {
        tracing::error!("Could not update password: {error}");
        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::PROFILE_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// The form data for changing the preferred currency.
#[derive(Debug, Deserialize)]
pub struct UpdateCurrencyForm {
    /// The new currency code, e.g. "USD".
    pub currency: String,
}

/// A route handler that changes the logged in user's preferred currency.
pub async fn update_currency_endpoint(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<UpdateCurrencyForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = update_currency(user_id, form.currency.trim(), &connection) {
        tracing::error!("Could not update currency: {error}");
        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::PROFILE_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// A route handler that deletes the logged in user and everything they own,
/// invalidates their session and redirects to the registration page.
pub async fn delete_profile_endpoint(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
    jar: PrivateCookieJar,
) -> Response {
    {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_alert_response();
            }
        };

        if let Err(error) = delete_user_cascade(user_id, &connection) {
            tracing::error!("Could not delete user {user_id}: {error}");
            return error.into_alert_response();
        }
    }

    let jar = invalidate_auth_cookie(jar);

    (
        jar,
        HxRedirect(endpoints::REGISTER_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// Delete every row the user owns, then the user, within one database
/// transaction.
///
/// The cascade is spelled out here instead of relying on the storage layer:
/// child tables go first so no foreign key is left dangling mid-way.
fn delete_user_cascade(user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    sql_transaction.execute(
        "DELETE FROM notification WHERE user_id = ?1",
        [user_id.as_i64()],
    )?;
    sql_transaction.execute(
        "DELETE FROM savings_history WHERE goal_id IN
         (SELECT id FROM savings_goal WHERE user_id = ?1)",
        [user_id.as_i64()],
    )?;
    sql_transaction.execute(
        "DELETE FROM savings_goal WHERE user_id = ?1",
        [user_id.as_i64()],
    )?;
    sql_transaction.execute(
        "DELETE FROM recurring_transaction WHERE user_id = ?1",
        [user_id.as_i64()],
    )?;
    sql_transaction.execute(
        "DELETE FROM bill_reminder WHERE user_id = ?1",
        [user_id.as_i64()],
    )?;
    sql_transaction.execute(
        "DELETE FROM \"transaction\" WHERE user_id = ?1",
        [user_id.as_i64()],
    )?;
    sql_transaction.execute("DELETE FROM budget WHERE user_id = ?1", [user_id.as_i64()])?;
    sql_transaction.execute("DELETE FROM category WHERE user_id = ?1", [user_id.as_i64()])?;
    sql_transaction.execute("DELETE FROM account WHERE user_id = ?1", [user_id.as_i64()])?;

    delete_user(user_id, &sql_transaction)?;

    sql_transaction.commit()?;

    Ok(())
}
