//! Defines the endpoint for deleting a savings goal.

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
    savings::{GoalId, core::delete_goal},
    user::UserID,
};

/// The state needed to delete a savings goal.
#[derive(Debug, Clone)]
pub struct DeleteGoalState {
    /// The database connection for managing savings goals.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteGoalState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a savings goal along with its contribution
/// history.
pub async fn delete_savings_endpoint(
    State(state): State<DeleteGoalState>,
    Extension(user_id): Extension<UserID>,
    Path(goal_id): Path<GoalId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_goal(goal_id, user_id, &connection) {
        Ok(0) => Error::DeleteMissingGoal.into_alert_response(),
        // The status code has to be 200 OK or HTMX will not delete the card.
        Ok(_) => StatusCode::OK.into_response(),
        Err(error) => {
            tracing::error!("Could not delete goal {goal_id}: {error}");
            error.into_alert_response()
        }
    }
}
