//! Defines the endpoint for exporting a user's transactions as CSV.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::{
        StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    alert::Alert,
    transaction::query::{TransactionFilters, get_transactions},
    user::UserID,
};

/// The state needed to export transactions.
#[derive(Debug, Clone)]
pub struct ExportTransactionsState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExportTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for the export request.
#[derive(Debug, Deserialize)]
pub struct ExportForm {
    /// The requested export format. Only "csv" is supported.
    pub format: String,
}

/// A route handler that responds with all of the user's transactions as a
/// CSV file download.
pub async fn export_transactions_endpoint(
    State(state): State<ExportTransactionsState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<ExportForm>,
) -> Response {
    if form.format != "csv" {
        return Alert::ErrorSimple {
            message: format!("Unsupported export format: {}", form.format),
        }
        .into_response_with_status(StatusCode::BAD_REQUEST);
    }

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let items = match get_transactions(user_id, &TransactionFilters::default(), &connection) {
        Ok(items) => items,
        Err(error) => {
            tracing::error!("Failed to retrieve transactions for export: {error}");
            return error.into_alert_response();
        }
    };

    let mut writer = csv::Writer::from_writer(Vec::new());

    let write_result = writer
        .write_record(["Date", "Type", "Category", "Amount", "Description"])
        .and_then(|_| {
            for item in &items {
                writer.write_record([
                    item.transaction.date.to_string(),
                    item.transaction.kind.to_string(),
                    item.category_name.clone().unwrap_or_default(),
                    format!("{:.2}", item.transaction.amount),
                    item.transaction.description.clone(),
                ])?;
            }

            Ok(())
        });

    if let Err(error) = write_result {
        tracing::error!("Failed to write CSV export: {error}");
        return Alert::ErrorSimple {
            message: "Could not export transactions.".to_owned(),
        }
        .into_response();
    }

    let csv_bytes = match writer.into_inner() {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Failed to finish CSV export: {error}");
            return Alert::ErrorSimple {
                message: "Could not export transactions.".to_owned(),
            }
            .into_response();
        }
    };

    (
        [
            (CONTENT_TYPE, "text/csv"),
            (
                CONTENT_DISPOSITION,
                "attachment; filename=\"transactions.csv\"",
            ),
        ],
        csv_bytes,
    )
        .into_response()
}
