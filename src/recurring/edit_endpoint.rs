//! Defines the endpoint for updating a recurring transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    account::AccountId,
    category::CategoryId,
    endpoints,
    recurring::{
        Frequency, NewRecurringTransaction, RecurringId, core::update_recurring_transaction,
    },
    transaction::TransactionKind,
    user::UserID,
};

/// The state needed to edit a recurring transaction.
#[derive(Debug, Clone)]
pub struct EditRecurringState {
    /// The database connection for managing recurring transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditRecurringState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for editing a recurring transaction.
#[derive(Debug, Deserialize)]
pub struct EditRecurringForm {
    description: String,
    category_id: CategoryId,
    #[serde(default)]
    account_id: Option<AccountId>,
    amount: f64,
    kind: TransactionKind,
    frequency: Frequency,
    start_date: Date,
    #[serde(default)]
    end_date: Option<Date>,
    is_active: bool,
}

/// A route handler for updating a recurring transaction, redirects to the
/// recurring view on success.
///
/// Setting `is_active` to false stops generation permanently; the check
/// that expands templates skips inactive ones.
pub async fn edit_recurring_endpoint(
    State(state): State<EditRecurringState>,
    Extension(user_id): Extension<UserID>,
    Path(recurring_id): Path<RecurringId>,
    Form(form): Form<EditRecurringForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let new_recurring = NewRecurringTransaction {
        user_id,
        category_id: form.category_id,
        account_id: form.account_id,
        amount: form.amount,
        kind: form.kind,
        frequency: form.frequency,
        start_date: form.start_date,
        end_date: form.end_date,
        description: form.description,
    };

    match update_recurring_transaction(
        recurring_id,
        user_id,
        &new_recurring,
        form.is_active,
        &connection,
    ) {
        Ok(0) => {
            tracing::error!(
                "Could not update recurring transaction {recurring_id}: \
                 update returned zero rows affected"
            );
            return Error::UpdateMissingRecurring.into_alert_response();
        }
        Ok(_) => {}
        Err(error) => {
            tracing::error!("Could not update recurring transaction {recurring_id}: {error}");
            return error.into_alert_response();
        }
    }

    (
        HxRedirect(endpoints::RECURRING_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
