use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::html;
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    account::get_selectable_accounts,
    category::get_selectable_categories,
    endpoints,
    html::{FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
    timezone::get_local_offset,
    transaction::form::{TransactionFormValues, transaction_form, transaction_form_head},
    user::UserID,
};

/// The state needed for the new transaction page.
#[derive(Debug, Clone)]
pub struct NewTransactionPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for NewTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Render the page for recording a new transaction.
pub async fn get_create_transaction_page(
    State(state): State<NewTransactionPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let local_offset = get_local_offset(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_selectable_categories(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;
    let accounts = get_selectable_accounts(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve accounts: {error}"))?;

    let nav_bar = NavBar::new(endpoints::NEW_TRANSACTION_VIEW).into_html();
    let form = transaction_form(
        "hx-post",
        endpoints::TRANSACTIONS_API,
        "Record transaction",
        &TransactionFormValues::empty(today),
        &categories,
        &accounts,
    );

    let content = html!(
        (nav_bar)

        main class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold my-4" { "New Transaction" }

            (form)
        }
    );

    Ok(base("New Transaction", &[transaction_form_head()], &content).into_response())
}
