//! The page for editing an existing budget's amount and threshold.

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
    budget::{Budget, BudgetId, core::get_budget},
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base},
    navigation::NavBar,
    transaction::month_prefix,
    user::UserID,
};

/// The state needed for the edit budget page.
#[derive(Debug, Clone)]
pub struct EditBudgetPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditBudgetPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the page for editing an existing budget.
pub async fn get_edit_budget_page(
    State(state): State<EditBudgetPageState>,
    Extension(user_id): Extension<UserID>,
    Path(budget_id): Path<BudgetId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let budget = get_budget(budget_id, user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve budget {budget_id}: {error}"))?;

    Ok(edit_budget_view(&budget).into_response())
}

fn edit_budget_view(budget: &Budget) -> Markup {
    let nav_bar = NavBar::new(endpoints::BUDGETS_VIEW).into_html();
    let put_url = endpoints::format_endpoint(endpoints::BUDGET, budget.id);

    let content = html!(
        (nav_bar)

        main class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold my-4" { "Edit Budget for " (month_prefix(budget.month)) }

            form hx-put=(put_url) hx-target-error="#alert-container" class="space-y-4 w-full"
            {
                div
                {
                    label for="amount" class=(FORM_LABEL_STYLE) { "Budget amount" }
                    input type="number" name="amount" id="amount" step="0.01" min="0"
                        class=(FORM_TEXT_INPUT_STYLE) value=(budget.amount) required;
                }

                div
                {
                    label for="alert_threshold" class=(FORM_LABEL_STYLE)
                    {
                        "Alert threshold (%)"
                    }
                    input type="number" name="alert_threshold" id="alert_threshold"
                        min="1" max="100" class=(FORM_TEXT_INPUT_STYLE)
                        value=(budget.alert_threshold) required;
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save" }
            }
        }
    );

    base("Edit Budget", &[], &content)
}
