//! The contribution history page for a savings goal.

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
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        TABLE_STYLE, base, format_currency,
    },
    navigation::NavBar,
    savings::{
        GoalId, SavingsContribution, SavingsGoal,
        core::{get_goal, get_history_for_goal},
    },
    user::UserID,
};

/// The state needed for the savings history page.
#[derive(Debug, Clone)]
pub struct SavingsHistoryPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SavingsHistoryPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the contribution history for one savings goal.
pub async fn get_savings_history_page(
    State(state): State<SavingsHistoryPageState>,
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
    let history = get_history_for_goal(goal_id, user_id, &connection).inspect_err(|error| {
        tracing::error!("Failed to retrieve history for goal {goal_id}: {error}")
    })?;

    Ok(history_view(&goal, &history).into_response())
}

fn history_view(goal: &SavingsGoal, history: &[SavingsContribution]) -> Markup {
    let nav_bar = NavBar::new(endpoints::SAVINGS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-2xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Contributions to " (goal.name) }

                    a href=(endpoints::SAVINGS_VIEW) class=(LINK_STYLE) { "Back to savings" }
                }

                section class="dark:bg-gray-800"
                {
                    table class=(TABLE_STYLE)
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                            }
                        }

                        tbody
                        {
                            @for contribution in history {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        (contribution.contribution_date)
                                    }
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        (format_currency(contribution.amount))
                                    }
                                }
                            }

                            @if history.is_empty() {
                                tr
                                {
                                    td
                                        colspan="2"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No contributions yet."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Savings History", &[], &content)
}
