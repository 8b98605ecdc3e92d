//! Defines the endpoint for updating a bill reminder.

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
    bill::{BillId, BillStatus, core::update_bill_reminder},
    endpoints,
    user::UserID,
};

/// The state needed to edit a bill reminder.
#[derive(Debug, Clone)]
pub struct EditBillState {
    /// The database connection for managing bill reminders.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditBillState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for editing a bill reminder.
#[derive(Debug, Deserialize)]
pub struct EditBillForm {
    name: String,
    amount: f64,
    due_date: Date,
    status: BillStatus,
}

/// A route handler for updating a bill reminder, redirects to the bills
/// view on success.
pub async fn edit_bill_endpoint(
    State(state): State<EditBillState>,
    Extension(user_id): Extension<UserID>,
    Path(bill_id): Path<BillId>,
    Form(form): Form<EditBillForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_bill_reminder(
        bill_id,
        user_id,
        &form.name,
        form.amount,
        form.due_date,
        form.status,
        &connection,
    ) {
        Ok(0) => {
            tracing::error!("Could not update bill {bill_id}: update returned zero rows affected");
            return Error::UpdateMissingBill.into_alert_response();
        }
        Ok(_) => {}
        Err(error) => {
            tracing::error!("Could not update bill {bill_id}: {error}");
            return error.into_alert_response();
        }
    }

    (
        HxRedirect(endpoints::BILLS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
