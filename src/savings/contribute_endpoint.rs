//! Defines the endpoint for contributing money towards a savings goal.

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
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    endpoints,
    savings::{GoalId, core::contribute_to_goal},
    timezone::get_local_offset,
    user::UserID,
};

/// The state needed to record a contribution.
#[derive(Debug, Clone)]
pub struct ContributeState {
    /// The database connection for managing savings goals.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for ContributeState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The form data for a contribution.
#[derive(Debug, Deserialize)]
pub struct ContributionForm {
    /// The amount to add to the goal.
    pub contribution: f64,
}

/// A route handler that adds a contribution to a goal's saved total and
/// appends it to the goal's history, redirecting to the savings view on
/// success.
pub async fn contribute_endpoint(
    State(state): State<ContributeState>,
    Extension(user_id): Extension<UserID>,
    Path(goal_id): Path<GoalId>,
    Form(form): Form<ContributionForm>,
) -> Response {
    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        return Error::InvalidTimezoneError(state.local_timezone).into_alert_response();
    };
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = contribute_to_goal(goal_id, user_id, form.contribution, today, &connection)
    {
        tracing::error!("Could not contribute to goal {goal_id}: {error}");
        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::SAVINGS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
