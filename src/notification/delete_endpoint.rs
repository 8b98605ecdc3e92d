//! Defines the endpoint for deleting a notification.

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
    notification::{NotificationId, core::delete_notification},
    user::UserID,
};

/// The state needed to delete a notification.
#[derive(Debug, Clone)]
pub struct DeleteNotificationState {
    /// The database connection for managing notifications.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteNotificationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a notification.
pub async fn delete_notification_endpoint(
    State(state): State<DeleteNotificationState>,
    Extension(user_id): Extension<UserID>,
    Path(notification_id): Path<NotificationId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_notification(notification_id, user_id, &connection) {
        Ok(0) => Error::DeleteMissingNotification.into_alert_response(),
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(_) => StatusCode::OK.into_response(),
        Err(error) => {
            tracing::error!("Could not delete notification {notification_id}: {error}");
            error.into_alert_response()
        }
    }
}
