//! Defines the endpoint for creating a bill reminder.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
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
    bill::{NewBillReminder, core::create_bill_reminder},
    endpoints,
    user::UserID,
};

/// The state needed to create a bill reminder.
#[derive(Debug, Clone)]
pub struct CreateBillState {
    /// The database connection for managing bill reminders.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateBillState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating a bill reminder.
#[derive(Debug, Deserialize)]
pub struct BillForm {
    /// What the bill is for.
    pub name: String,
    /// The amount due.
    pub amount: f64,
    /// When the bill is due.
    pub due_date: Date,
}

/// A route handler for creating a new bill reminder, redirects to the bills
/// view on success.
pub async fn create_bill_endpoint(
    State(state): State<CreateBillState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<BillForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let new_bill = NewBillReminder {
        user_id,
        name: form.name,
        amount: form.amount,
        due_date: form.due_date,
    };

    if let Err(error) = create_bill_reminder(new_bill, &connection) {
        tracing::error!("could not create bill reminder: {error}");

        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::BILLS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
