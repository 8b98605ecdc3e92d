//! Defines the endpoint for marking a notification as read.

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
    notification::{NotificationId, core::mark_notification_read},
    user::UserID,
};

/// The state needed to mark a notification as read.
#[derive(Debug, Clone)]
pub struct MarkNotificationReadState {
    /// The database connection for managing notifications.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for MarkNotificationReadState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for marking a notification as read.
pub async fn mark_notification_read_endpoint(
    State(state): State<MarkNotificationReadState>,
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

    match mark_notification_read(notification_id, user_id, &connection) {
        Ok(0) => Error::UpdateMissingNotification.into_alert_response(),
        Ok(_) => StatusCode::OK.into_response(),
        Err(error) => {
            tracing::error!("Could not mark notification {notification_id} as read: {error}");
            error.into_alert_response()
        }
    }
}
