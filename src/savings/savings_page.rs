//! The savings goals page: progress for each goal, contribution forms and
//! the goal creation form.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::{flash_banner, take_flash_message},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, base, edit_delete_action_links, format_currency,
    },
    navigation::NavBar,
    savings::{SavingsGoal, core::get_goals_for_user},
    user::UserID,
};

/// The state needed for the savings page.
#[derive(Debug, Clone)]
pub struct SavingsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SavingsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the savings goals page.
pub async fn get_savings_page(
    State(state): State<SavingsPageState>,
    Extension(user_id): Extension<UserID>,
    jar: CookieJar,
) -> Result<Response, Error> {
    let (jar, flash_message) = take_flash_message(jar);

    let goals = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_goals_for_user(user_id, &connection)
            .inspect_err(|error| tracing::error!("Failed to retrieve savings goals: {error}"))?
    };

    Ok((jar, savings_view(&goals, flash_message.as_deref())).into_response())
}

fn savings_view(goals: &[SavingsGoal], flash_message: Option<&str>) -> Markup {
    let nav_bar = NavBar::new(endpoints::SAVINGS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-4xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Savings Goals" }
                }

                @if let Some(message) = flash_message {
                    (flash_banner(message))
                }

                ul class="space-y-4"
                {
                    @for goal in goals {
                        (goal_card(goal))
                    }

                    @if goals.is_empty() {
                        li class="rounded border border-dashed border-gray-300 bg-white px-4 py-6
                            text-center text-sm text-gray-500 dark:border-gray-700
                            dark:bg-gray-800 dark:text-gray-400"
                        {
                            "No savings goals yet. Create your first goal below."
                        }
                    }
                }

                (create_goal_form())
            }
        }
    );

    base("Savings", &[], &content)
}

fn goal_card(goal: &SavingsGoal) -> Markup {
    let percent = if goal.target_amount > 0.0 {
        ((goal.current_amount / goal.target_amount) * 100.0).min(100.0)
    } else {
        0.0
    };
    let contribute_url = endpoints::format_endpoint(endpoints::CONTRIBUTE, goal.id);
    let history_url = endpoints::format_endpoint(endpoints::SAVINGS_HISTORY_VIEW, goal.id);
    let edit_url = endpoints::format_endpoint(endpoints::EDIT_SAVINGS_VIEW, goal.id);
    let delete_url = endpoints::format_endpoint(endpoints::SAVINGS_GOAL, goal.id);
    let confirm_message = format!("Are you sure you want to delete '{}'?", goal.name);

    html!(
        li class="rounded border border-gray-200 bg-white px-4 py-3 shadow-sm
            dark:border-gray-700 dark:bg-gray-800"
        {
            div class="flex items-start justify-between gap-3"
            {
                div
                {
                    h2 class="text-lg font-bold" { (goal.name) }
                    p class="text-sm text-gray-500 dark:text-gray-400"
                    {
                        (format_currency(goal.current_amount))
                        " of "
                        (format_currency(goal.target_amount))
                        " by "
                        (goal.target_date)
                    }
                }

                span class="text-sm tabular-nums" { (format!("{percent:.0}%")) }
            }

            div class="mt-2 w-full bg-gray-200 rounded-full h-2.5 dark:bg-gray-700"
            {
                div
                    class="bg-blue-600 h-2.5 rounded-full"
                    style=(format!("width: {percent:.0}%")) {}
            }

            form
                hx-post=(contribute_url)
                hx-target-error="#alert-container"
                class="mt-3 flex gap-2 items-end"
            {
                div
                {
                    label for=(format!("contribution-{}", goal.id)) class=(FORM_LABEL_STYLE)
                    {
                        "Contribute"
                    }
                    input
                        type="number"
                        name="contribution"
                        id=(format!("contribution-{}", goal.id))
                        step="0.01" min="0.01"
                        class=(FORM_TEXT_INPUT_STYLE)
                        required;
                }

                button type="submit" class=(LINK_STYLE) { "Add" }
            }

            div class="mt-3 flex items-center gap-4 text-sm"
            {
                a href=(history_url) class=(LINK_STYLE) { "History" }

                (edit_delete_action_links(
                    &edit_url,
                    &delete_url,
                    &confirm_message,
                    "closest li",
                    "delete",
                ))
            }
        }
    )
}

fn create_goal_form() -> Markup {
    html!(
        section class="max-w-md space-y-4"
        {
            h2 class="text-lg font-bold" { "Add savings goal" }

            form
                hx-post=(endpoints::SAVINGS_API)
                hx-target-error="#alert-container"
                class="space-y-4"
            {
                div
                {
                    label for="name" class=(FORM_LABEL_STYLE) { "Goal name" }
                    input type="text" name="name" id="name" class=(FORM_TEXT_INPUT_STYLE) required;
                }

                div
                {
                    label for="target_amount" class=(FORM_LABEL_STYLE) { "Target amount" }
                    input type="number" name="target_amount" id="target_amount" step="0.01"
                        min="0.01" class=(FORM_TEXT_INPUT_STYLE) required;
                }

                div
                {
                    label for="target_date" class=(FORM_LABEL_STYLE) { "Target date" }
                    input type="date" name="target_date" id="target_date"
                        class=(FORM_TEXT_INPUT_STYLE) required;
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add goal" }
            }
        }
    )
}
