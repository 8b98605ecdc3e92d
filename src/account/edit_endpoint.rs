//! Defines the endpoint for updating an account

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::{Connection, params};
use serde::Deserialize;

use crate::{AppState, Error, account::AccountId, endpoints, user::UserID};

/// The state needed to edit an account.
#[derive(Debug, Clone)]
pub struct EditAccountState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for editing an account.
#[derive(Debug, Deserialize)]
pub struct EditAccountForm {
    name: String,
    account_type: String,
    balance: f64,
    currency: String,
    is_active: bool,
}

/// A route handler for updating an account, redirects to the accounts view
/// on success.
pub async fn edit_account_endpoint(
    State(state): State<EditAccountState>,
    Extension(user_id): Extension<UserID>,
    Path(account_id): Path<AccountId>,
    Form(form): Form<EditAccountForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_account(account_id, user_id, &form, &connection) {
        Ok(0) => {
            tracing::error!(
                "Could not update account {account_id}: update returned zero rows affected"
            );
            return Error::UpdateMissingAccount.into_alert_response();
        }
        Ok(_) => {}
        Err(error) => {
            tracing::error!("Could not update account {account_id}: {error}");
            return error.into_alert_response();
        }
    }

    (
        HxRedirect(endpoints::ACCOUNTS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

type RowsAffected = usize;

fn update_account(
    id: AccountId,
    user_id: UserID,
    account: &EditAccountForm,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "UPDATE account
            SET name = ?1, account_type = ?2, balance = ?3, currency = ?4, is_active = ?5
            WHERE id = ?6 AND user_id = ?7",
            params![
                account.name,
                account.account_type,
                account.balance,
                account.currency,
                account.is_active,
                id,
                user_id.as_i64(),
            ],
        )
        .map_err(Error::from)
}
