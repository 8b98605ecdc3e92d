//! Defines the endpoint for marking a bill as paid.

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
    bill::{BillId, core::mark_bill_paid},
    user::UserID,
};

/// The state needed to mark a bill as paid.
#[derive(Debug, Clone)]
pub struct MarkBillPaidState {
    /// The database connection for managing bill reminders.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for MarkBillPaidState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for marking a bill as paid.
///
/// Paid bills no longer raise reminder notifications, but notifications
/// already raised for them stay.
pub async fn mark_bill_paid_endpoint(
    State(state): State<MarkBillPaidState>,
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

    match mark_bill_paid(bill_id, user_id, &connection) {
        Ok(0) => Error::UpdateMissingBill.into_alert_response(),
        Ok(_) => StatusCode::OK.into_response(),
        Err(error) => {
            tracing::error!("Could not mark bill {bill_id} as paid: {error}");
            error.into_alert_response()
        }
    }
}
