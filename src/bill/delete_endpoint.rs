//! Defines the endpoint for deleting a bill reminder.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    bill::{BillId, core::delete_bill_reminder},
    user::UserID,
};

/// The state needed to delete a bill reminder.
#[derive(Debug, Clone)]
pub struct DeleteBillState {
    /// The database connection for managing bill reminders.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteBillState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a bill reminder.
pub async fn delete_bill_endpoint(
    State(state): State<DeleteBillState>,
    Extension(user_id): Extension<UserID>,
    Path(bill_id): Path<BillId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_bill_reminder(bill_id, user_id, &connection) {
        Ok(0) => Error::DeleteMissingBill.into_alert_response(),
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(_) => StatusCode::OK.into_response(),
        Err(error) => {
            tracing::error!("Could not delete bill {bill_id}: {error}");
            error.into_alert_response()
        }
    }
}
