//! Defines the endpoint for updating a savings goal.

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
    endpoints,
    savings::{GoalId, core::update_goal},
    user::UserID,
};

/// The state needed to edit a savings goal.
#[derive(Debug, Clone)]
pub struct EditGoalState {
    /// The database connection for managing savings goals.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditGoalState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for editing a savings goal.
#[derive(Debug, Deserialize)]
pub struct EditGoalForm {
    name: String,
    target_amount: f64,
    target_date: Date,
}

/// A route handler for updating a savings goal's name, target amount and
/// target date, redirects to the savings view on success.
pub async fn edit_savings_endpoint(
    State(state): State<EditGoalState>,
    Extension(user_id): Extension<UserID>,
    Path(goal_id): Path<GoalId>,
    Form(form): Form<EditGoalForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_goal(
        goal_id,
        user_id,
        &form.name,
        form.target_amount,
        form.target_date,
        &connection,
    ) {
        Ok(0) => {
            tracing::error!("Could not update goal {goal_id}: update returned zero rows affected");
            return Error::UpdateMissingGoal.into_alert_response();
        }
        Ok(_) => {}
        Err(error) => {
            tracing::error!("Could not update goal {goal_id}: {error}");
            return error.into_alert_response();
        }
    }

    (
        HxRedirect(endpoints::SAVINGS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
