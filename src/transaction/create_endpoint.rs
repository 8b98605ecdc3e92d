//! Defines the endpoint for creating a new transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::{CookieJar, Form};
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error,
    account::{AccountId, adjust_account_balance},
    alert::{Alert, set_flash_message},
    budget::check_budget_alert,
    category::{CategoryId, get_category},
    endpoints,
    ledger::creation_adjustment,
    timezone::get_local_offset,
    transaction::{NewTransaction, TransactionKind, core::create_transaction},
    user::UserID,
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The form data for creating a transaction.
#[derive(Debug, Deserialize)]
pub struct TransactionForm {
    /// The value of the transaction in dollars. Always positive.
    pub amount: f64,
    /// Whether the transaction is income or an expense.
    pub kind: TransactionKind,
    /// The date when the transaction ocurred.
    pub date: Date,
    /// Text detailing the transaction.
    #[serde(default)]
    pub description: String,
    /// The category to file the transaction under.
    pub category_id: CategoryId,
    /// The account the transaction applies to.
    #[serde(default)]
    pub account_id: Option<AccountId>,
}

/// A route handler for creating a new transaction, redirects to transactions view on success.
///
/// The new transaction's signed amount is applied to the selected account's
/// balance, and for expenses the category's budget for the month is
/// re-evaluated. When the budget is exceeded the alert message is flashed
/// so the transactions page shows it once.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    jar: CookieJar,
    Form(form): Form<TransactionForm>,
) -> Response {
    let Some(local_timezone) = get_local_offset(&state.local_timezone) else {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        return Error::InvalidTimezoneError(state.local_timezone).into_alert_response();
    };

    let now_local_time = OffsetDateTime::now_utc().to_offset(local_timezone);

    if form.date > now_local_time.date() {
        tracing::error!(
            "Tried to perform an operation with a future date (e.g., create a transaction)"
        );

        return Error::FutureDate(form.date).into_alert_response();
    }

    let Some(account_id) = form.account_id else {
        return Alert::ErrorSimple {
            message: "Please select an account.".to_owned(),
        }
        .into_response_with_status(StatusCode::BAD_REQUEST);
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let budget_alert =
        match record_transaction(user_id, account_id, &form, &connection) {
            Ok(budget_alert) => budget_alert,
            Err(error) => {
                tracing::error!("could not create transaction: {error}");

                return error.into_alert_response();
            }
        };

    let jar = match budget_alert {
        Some(message) => set_flash_message(jar, &message),
        None => jar,
    };

    (
        jar,
        HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// Insert the transaction, apply its balance delta and evaluate the budget,
/// all within one database transaction.
fn record_transaction(
    user_id: UserID,
    account_id: AccountId,
    form: &TransactionForm,
    connection: &Connection,
) -> Result<Option<String>, Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    // Blank descriptions fall back to the category name.
    let description = if form.description.trim().is_empty() {
        get_category(form.category_id, &sql_transaction)
            .map(|category| category.name.to_string())
            .unwrap_or_else(|_| "General".to_owned())
    } else {
        form.description.trim().to_owned()
    };

    let transaction = create_transaction(
        NewTransaction {
            user_id,
            category_id: Some(form.category_id),
            account_id: Some(account_id),
            amount: form.amount,
            kind: form.kind,
            date: form.date,
            description,
            receipt_url: None,
            is_recurring_generated: false,
        },
        &sql_transaction,
    )?;

    if let Some(adjustment) = creation_adjustment(&transaction.ledger_entry()) {
        adjust_account_balance(adjustment.account_id, adjustment.delta, &sql_transaction)?;
    }

    let budget_alert = if form.kind == TransactionKind::Expense {
        check_budget_alert(user_id, form.category_id, form.date, &sql_transaction)?
    } else {
        None
    };

    sql_transaction.commit()?;

    Ok(budget_alert)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        body::Body,
        extract::State,
        http::{Response, header::SET_COOKIE},
        response::IntoResponse,
    };
    use axum_extra::extract::{CookieJar, Form};
    use axum_htmx::HX_REDIRECT;
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        account::{NewAccount, create_account, get_account},
        alert::FLASH_COOKIE,
        budget::upsert_budget,
        category::{CategoryKind, CategoryName, NewCategory, create_category},
        transaction::{
            core::test_utils::get_test_connection,
            create_endpoint::{CreateTransactionState, TransactionForm},
            create_transaction_endpoint, get_transaction,
        },
        user::UserID,
    };

    use super::TransactionKind;

    fn setup() -> (Connection, UserID, i64, i64) {
        let (conn, user_id) = get_test_connection();

        let category = create_category(
            NewCategory {
                user_id: Some(user_id),
                name: CategoryName::new_unchecked("Groceries"),
                kind: CategoryKind::Expense,
            },
            &conn,
        )
        .unwrap();

        let account = create_account(
            NewAccount {
                user_id: Some(user_id),
                name: "Test Account".to_owned(),
                account_type: "Checking".to_owned(),
                balance: 1000.0,
            },
            &conn,
        )
        .unwrap();

        (conn, user_id, category.id, account.id)
    }

    fn make_state(conn: Connection) -> CreateTransactionState {
        CreateTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }

    #[tokio::test]
    async fn income_increases_account_balance() {
        let (conn, user_id, category_id, account_id) = setup();
        let state = make_state(conn);

        let form = TransactionForm {
            amount: 500.0,
            kind: TransactionKind::Income,
            date: date!(2023 - 01 - 01),
            description: "pay day".to_owned(),
            category_id,
            account_id: Some(account_id),
        };

        let response = create_transaction_endpoint(
            State(state.clone()),
            Extension(user_id),
            CookieJar::new(),
            Form(form),
        )
        .await
        .into_response();

        assert_redirects_to_transactions_view(response);

        let connection = state.db_connection.lock().unwrap();
        let transaction = get_transaction(1, user_id, &connection).unwrap();
        assert_eq!(transaction.amount, 500.0);

        let account = get_account(account_id, user_id, &connection).unwrap();
        assert_eq!(account.balance, 1500.0);
    }

    #[tokio::test]
    async fn blank_description_falls_back_to_category_name() {
        let (conn, user_id, category_id, account_id) = setup();
        let state = make_state(conn);

        let form = TransactionForm {
            amount: 12.3,
            kind: TransactionKind::Expense,
            date: date!(2023 - 01 - 01),
            description: "   ".to_owned(),
            category_id,
            account_id: Some(account_id),
        };

        create_transaction_endpoint(
            State(state.clone()),
            Extension(user_id),
            CookieJar::new(),
            Form(form),
        )
        .await;

        let connection = state.db_connection.lock().unwrap();
        let transaction = get_transaction(1, user_id, &connection).unwrap();
        assert_eq!(transaction.description, "Groceries");
    }

    #[tokio::test]
    async fn missing_account_is_rejected() {
        let (conn, user_id, category_id, _) = setup();
        let state = make_state(conn);

        let form = TransactionForm {
            amount: 12.3,
            kind: TransactionKind::Expense,
            date: date!(2023 - 01 - 01),
            description: "no account".to_owned(),
            category_id,
            account_id: None,
        };

        let response = create_transaction_endpoint(
            State(state.clone()),
            Extension(user_id),
            CookieJar::new(),
            Form(form),
        )
        .await;

        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
        let connection = state.db_connection.lock().unwrap();
        assert!(get_transaction(1, user_id, &connection).is_err());
    }

    #[tokio::test]
    async fn exceeding_budget_flashes_alert() {
        let (conn, user_id, category_id, account_id) = setup();
        upsert_budget(user_id, category_id, date!(2023 - 01 - 01), 100.0, 90, &conn).unwrap();
        let state = make_state(conn);

        let form = TransactionForm {
            amount: 100.01,
            kind: TransactionKind::Expense,
            date: date!(2023 - 01 - 15),
            description: "big shop".to_owned(),
            category_id,
            account_id: Some(account_id),
        };

        let response = create_transaction_endpoint(
            State(state.clone()),
            Extension(user_id),
            CookieJar::new(),
            Form(form),
        )
        .await
        .into_response();

        let set_cookie_headers: Vec<_> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect();
        assert!(
            set_cookie_headers
                .iter()
                .any(|header| header.starts_with(FLASH_COOKIE)),
            "expected a flash cookie, got {set_cookie_headers:?}"
        );
    }

    #[tokio::test]
    async fn spending_budget_exactly_does_not_flash() {
        let (conn, user_id, category_id, account_id) = setup();
        upsert_budget(user_id, category_id, date!(2023 - 01 - 01), 100.0, 90, &conn).unwrap();
        let state = make_state(conn);

        let form = TransactionForm {
            amount: 100.0,
            kind: TransactionKind::Expense,
            date: date!(2023 - 01 - 15),
            description: "exact shop".to_owned(),
            category_id,
            account_id: Some(account_id),
        };

        let response = create_transaction_endpoint(
            State(state.clone()),
            Extension(user_id),
            CookieJar::new(),
            Form(form),
        )
        .await
        .into_response();

        let has_flash = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .any(|header| header.starts_with(FLASH_COOKIE));
        assert!(!has_flash, "no flash cookie expected when on budget");
    }

    #[track_caller]
    fn assert_redirects_to_transactions_view(response: Response<Body>) {
        let location = response
            .headers()
            .get(HX_REDIRECT)
            .expect("expected response to have the header hx-redirect");
        assert_eq!(
            location, "/transactions",
            "got redirect to {location:?}, want redirect to /transactions"
        );
    }
}
