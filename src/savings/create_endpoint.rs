//! Defines the endpoint for creating a savings goal.

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
    endpoints,
    savings::{NewSavingsGoal, core::create_goal},
    user::UserID,
};

/// The state needed to create a savings goal.
#[derive(Debug, Clone)]
pub struct CreateGoalState {
    /// The database connection for managing savings goals.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateGoalState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating a savings goal.
#[derive(Debug, Deserialize)]
pub struct GoalForm {
    /// What the user is saving for.
    pub name: String,
    /// The amount the user wants to reach.
    pub target_amount: f64,
    /// When the user wants to reach the target.
    pub target_date: Date,
}

/// A route handler for creating a new savings goal, redirects to the
/// savings view on success.
pub async fn create_goal_endpoint(
    State(state): State<CreateGoalState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<GoalForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let new_goal = NewSavingsGoal {
        user_id,
        name: form.name,
        target_amount: form.target_amount,
        target_date: form.target_date,
    };

    if let Err(error) = create_goal(new_goal, &connection) {
        tracing::error!("could not create savings goal: {error}");

        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::SAVINGS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use time::macros::date;

    use crate::{
        savings::{
            core::get_goals_for_user,
            create_endpoint::{CreateGoalState, GoalForm, create_goal_endpoint},
        },
        transaction::test_utils::get_test_connection,
    };

    #[tokio::test]
    async fn can_create_goal() {
        let (conn, user_id) = get_test_connection();
        let state = CreateGoalState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = create_goal_endpoint(
            State(state.clone()),
            Extension(user_id),
            Form(GoalForm {
                name: "Holiday".to_owned(),
                target_amount: 2500.0,
                target_date: date!(2024 - 01 - 01),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let connection = state.db_connection.lock().unwrap();
        let goals = get_goals_for_user(user_id, &connection).unwrap();
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].current_amount, 0.0);
    }
}
