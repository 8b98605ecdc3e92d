//! The page for editing an existing savings goal.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
    },
    navigation::NavBar,
    savings::{GoalId, SavingsGoal, core::get_goal},
    user::UserID,
};

/// The state needed for the edit savings goal page.
#[derive(Debug, Clone)]
pub struct EditGoalPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditGoalPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the page for editing an existing savings goal.
pub async fn get_edit_savings_page(
    State(state): State<EditGoalPageState>,
    Extension(user_id): Extension<UserID>,
    Path(goal_id): Path<GoalId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let goal = get_goal(goal_id, user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve goal {goal_id}: {error}"))?;

    Ok(edit_goal_view(&goal).into_response())
}

fn edit_goal_view(goal: &SavingsGoal) -> Markup {
    let nav_bar = NavBar::new(endpoints::SAVINGS_VIEW).into_html();
    let put_url = endpoints::format_endpoint(endpoints::SAVINGS_GOAL, goal.id);

    let content = html!(
        (nav_bar)

        main class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold my-4" { "Edit Savings Goal" }

            form hx-put=(put_url) hx-target-error="#alert-container" class="space-y-4 w-full"
            {
                div
                {
                    label for="name" class=(FORM_LABEL_STYLE) { "Goal name" }
                    input type="text" name="name" id="name" class=(FORM_TEXT_INPUT_STYLE)
                        value=(goal.name) required;
                }

                div
                {
                    label for="target_amount" class=(FORM_LABEL_STYLE) { "Target amount" }
                    input type="number" name="target_amount" id="target_amount" step="0.01"
                        min="0.01" class=(FORM_TEXT_INPUT_STYLE) value=(goal.target_amount)
                        required;
                }

                div
                {
                    label for="target_date" class=(FORM_LABEL_STYLE) { "Target date" }
                    input type="date" name="target_date" id="target_date"
                        class=(FORM_TEXT_INPUT_STYLE) value=(goal.target_date) required;
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save" }
            }
        }
    );

    base("Edit Savings Goal", &[], &content)
}
