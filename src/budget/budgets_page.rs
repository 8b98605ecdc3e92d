//! The budgets page: monthly limits per category, how much of each has been
//! spent, and the form for setting new limits.

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
    budget::{BudgetListItem, DEFAULT_ALERT_THRESHOLD, core::list_budgets_with_spent, is_over_budget},
    category::{Category, get_expense_categories},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        TABLE_STYLE, base, edit_delete_action_links, format_currency,
    },
    navigation::NavBar,
    transaction::month_prefix,
    user::UserID,
};

use super::core::available_budget_months;

/// The state needed for the budgets page.
#[derive(Debug, Clone)]
pub struct BudgetsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BudgetsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the budgets page.
pub async fn get_budgets_page(
    State(state): State<BudgetsPageState>,
    Extension(user_id): Extension<UserID>,
    jar: CookieJar,
) -> Result<Response, Error> {
    let (jar, flash_message) = take_flash_message(jar);

    let (budgets, categories, months) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let budgets = list_budgets_with_spent(user_id, &connection)
            .inspect_err(|error| tracing::error!("Failed to retrieve budgets: {error}"))?;
        let categories = get_expense_categories(user_id, &connection)
            .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;
        let months = available_budget_months(user_id, &connection)
            .inspect_err(|error| tracing::error!("Failed to retrieve budget months: {error}"))?;

        (budgets, categories, months)
    };

    Ok((
        jar,
        budgets_view(&budgets, &categories, &months, flash_message.as_deref()),
    )
        .into_response())
}

fn budgets_view(
    budgets: &[BudgetListItem],
    categories: &[Category],
    months: &[String],
    flash_message: Option<&str>,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::BUDGETS_VIEW).into_html();

    let table_row = |item: &BudgetListItem| {
        let budget = &item.budget;
        let edit_url = endpoints::format_endpoint(endpoints::EDIT_BUDGET_VIEW, budget.id);
        let delete_url = endpoints::format_endpoint(endpoints::BUDGET, budget.id);
        let confirm_message = format!(
            "Are you sure you want to delete the {} budget for {}?",
            item.category_name,
            month_prefix(budget.month)
        );
        let over_budget = is_over_budget(item.total_spent, budget.amount);

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE) { (month_prefix(budget.month)) }
                td class=(TABLE_CELL_STYLE) { (item.category_name) }
                td class=(TABLE_CELL_STYLE) { (format_currency(budget.amount)) }
                td class=(TABLE_CELL_STYLE)
                {
                    @if over_budget {
                        span class="text-red-600 dark:text-red-500 font-semibold"
                        {
                            (format_currency(item.total_spent))
                        }
                    } @else {
                        (format_currency(item.total_spent))
                    }
                }
                td class=(TABLE_CELL_STYLE) { (budget.alert_threshold) "%" }
                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        (edit_delete_action_links(
                            &edit_url,
                            &delete_url,
                            &confirm_message,
                            "closest tr",
                            "delete",
                        ))
                    }
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Budgets" }
                }

                @if let Some(message) = flash_message {
                    (flash_banner(message))
                }

                section class="dark:bg-gray-800"
                {
                    table class=(TABLE_STYLE)
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Month" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Budget" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Spent" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Threshold" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for item in budgets {
                                (table_row(item))
                            }

                            @if budgets.is_empty() {
                                tr
                                {
                                    td
                                        colspan="6"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No budgets yet. Set your first budget below."
                                    }
                                }
                            }
                        }
                    }
                }

                div class="flex flex-wrap gap-12"
                {
                    (set_budget_form(categories))
                    (move_to_savings_form(months))
                }
            }
        }
    );

    base("Budgets", &[], &content)
}

fn set_budget_form(categories: &[Category]) -> Markup {
    html!(
        section class="max-w-md space-y-4"
        {
            h2 class="text-lg font-bold" { "Set budget" }

            form
                hx-post=(endpoints::BUDGETS_API)
                hx-target-error="#alert-container"
                class="space-y-4"
            {
                div
                {
                    label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }
                    select name="category_id" id="category_id" class=(FORM_SELECT_STYLE) required
                    {
                        @for category in categories {
                            option value=(category.id) { (category.name) }
                        }
                    }
                }

                div
                {
                    label for="month" class=(FORM_LABEL_STYLE) { "Month" }
                    input type="month" name="month" id="month" class=(FORM_TEXT_INPUT_STYLE)
                        required;
                }

                div
                {
                    label for="amount" class=(FORM_LABEL_STYLE) { "Budget amount" }
                    input type="number" name="amount" id="amount" step="0.01" min="0"
                        class=(FORM_TEXT_INPUT_STYLE) required;
                }

                div
                {
                    label for="alert_threshold" class=(FORM_LABEL_STYLE)
                    {
                        "Alert threshold (%)"
                    }
                    input type="number" name="alert_threshold" id="alert_threshold"
                        min="1" max="100" class=(FORM_TEXT_INPUT_STYLE)
                        value=(DEFAULT_ALERT_THRESHOLD);
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save budget" }
            }
        }
    )
}

fn move_to_savings_form(months: &[String]) -> Markup {
    html!(
        section class="max-w-md space-y-4"
        {
            h2 class="text-lg font-bold" { "Move remaining budget to savings" }

            @if months.is_empty() {
                p class="text-sm text-gray-500 dark:text-gray-400"
                {
                    "Set a budget first to move its remainder into savings."
                }
            } @else {
                form method="get" action=(endpoints::MOVE_TO_SAVINGS) class="space-y-4"
                {
                    div
                    {
                        label for="move-month" class=(FORM_LABEL_STYLE) { "Month" }
                        select name="month" id="move-month" class=(FORM_SELECT_STYLE)
                        {
                            @for month in months {
                                option value=(month) { (month) }
                            }
                        }
                    }

                    button type="submit" class=(LINK_STYLE) { "Move to savings" }
                }
            }
        }
    )
}
