//! Defines the endpoint for attaching an uploaded receipt to a transaction.

use std::{
    path::{Path as FilePath, PathBuf},
    sync::{Arc, Mutex},
};

use axum::{
    Extension,
    extract::{FromRef, Multipart, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error, database_id::TransactionId, endpoints,
    transaction::query::set_receipt_url, user::UserID,
};

/// The file extensions accepted as receipts.
const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "pdf"];

/// The state needed to store a receipt.
#[derive(Debug, Clone)]
pub struct UploadReceiptState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The directory where uploaded receipts are stored.
    pub upload_dir: PathBuf,
}

impl FromRef<AppState> for UploadReceiptState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            upload_dir: state.upload_dir.clone(),
        }
    }
}

/// A route handler that saves an uploaded receipt file and records its path
/// on the transaction.
///
/// Only the resulting path string is stored; serving the file is handled by
/// the static file service mounted at the uploads route.
pub async fn upload_receipt_endpoint(
    State(state): State<UploadReceiptState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
    mut multipart: Multipart,
) -> Response {
    let (file_name, data) = loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => {
                return Error::MultipartError("no file in upload".to_owned())
                    .into_alert_response();
            }
            Err(error) => {
                return Error::MultipartError(error.to_string()).into_alert_response();
            }
        };

        if field.name() != Some("receipt") {
            continue;
        }

        let file_name = match field.file_name() {
            Some(file_name) => sanitize_file_name(file_name),
            None => {
                return Error::MultipartError("file has no name".to_owned())
                    .into_alert_response();
            }
        };

        match field.bytes().await {
            Ok(data) => break (file_name, data),
            Err(error) => {
                return Error::MultipartError(error.to_string()).into_alert_response();
            }
        }
    };

    if !has_allowed_extension(&file_name) {
        return Error::NotReceipt.into_alert_response();
    }

    let file_path = state.upload_dir.join(&file_name);
    if let Err(error) = tokio::fs::write(&file_path, &data).await {
        tracing::error!("Could not save receipt to {file_path:?}: {error}");
        return Error::WriteFileError(error.to_string()).into_alert_response();
    }

    let receipt_url = format!("{}/{}", endpoints::UPLOADS, file_name);

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match set_receipt_url(transaction_id, user_id, &receipt_url, &connection) {
        Ok(0) => Error::UpdateMissingTransaction.into_alert_response(),
        Ok(_) => Redirect::to(&endpoints::format_endpoint(
            endpoints::EDIT_TRANSACTION_VIEW,
            transaction_id,
        ))
        .into_response(),
        Err(error) => {
            tracing::error!("Could not record receipt for transaction {transaction_id}: {error}");
            error.into_alert_response()
        }
    }
}

/// Keep only the final path component of an uploaded file name so uploads
/// cannot escape the upload directory.
fn sanitize_file_name(raw_name: &str) -> String {
    let base_name = FilePath::new(raw_name)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    base_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn has_allowed_extension(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(_, extension)| {
            ALLOWED_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str())
        })
        .unwrap_or(false)
}
