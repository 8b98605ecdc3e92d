//! The recurring transactions page: templates, their schedules and the
//! creation form.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::{Account, get_selectable_accounts},
    category::{Category, get_selectable_categories},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        TABLE_STYLE, base, format_currency,
    },
    navigation::NavBar,
    recurring::{RecurringListItem, core::list_recurring_transactions},
    user::UserID,
};

/// The state needed for the recurring transactions page.
#[derive(Debug, Clone)]
pub struct RecurringPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RecurringPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the recurring transactions page.
pub async fn get_recurring_page(
    State(state): State<RecurringPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let items = list_recurring_transactions(user_id, &connection).inspect_err(|error| {
        tracing::error!("Failed to retrieve recurring transactions: {error}")
    })?;
    let categories = get_selectable_categories(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;
    let accounts = get_selectable_accounts(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve accounts: {error}"))?;

    Ok(recurring_view(&items, &categories, &accounts).into_response())
}

fn recurring_view(
    items: &[RecurringListItem],
    categories: &[Category],
    accounts: &[Account],
) -> Markup {
    let nav_bar = NavBar::new(endpoints::RECURRING_VIEW).into_html();

    let table_row = |item: &RecurringListItem| {
        let recurring = &item.recurring;
        let edit_url = endpoints::format_endpoint(endpoints::EDIT_RECURRING_VIEW, recurring.id);

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE) { (recurring.description) }
                td class=(TABLE_CELL_STYLE)
                {
                    (item.category_name.as_deref().unwrap_or("—"))
                }
                td class=(TABLE_CELL_STYLE)
                {
                    (item.account_name.as_deref().unwrap_or("—"))
                }
                td class=(TABLE_CELL_STYLE) { (format_currency(recurring.amount)) }
                td class=(TABLE_CELL_STYLE) { (recurring.kind) }
                td class=(TABLE_CELL_STYLE) { (recurring.frequency) }
                td class=(TABLE_CELL_STYLE) { (recurring.start_date) }
                td class=(TABLE_CELL_STYLE)
                {
                    @match recurring.end_date {
                        Some(end_date) => { (end_date) }
                        None => { "—" }
                    }
                }
                td class=(TABLE_CELL_STYLE)
                {
                    @match recurring.last_generated_date {
                        Some(last_generated_date) => { (last_generated_date) }
                        None => { "never" }
                    }
                }
                td class=(TABLE_CELL_STYLE)
                {
                    @if recurring.is_active { "Active" } @else { "Inactive" }
                }
                td class=(TABLE_CELL_STYLE)
                {
                    a href=(edit_url) class=(LINK_STYLE) { "Edit" }
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-6xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Recurring Transactions" }

                    a href=(endpoints::GENERATE_RECURRING) class=(LINK_STYLE)
                    {
                        "Generate due transactions"
                    }
                }

                section class="dark:bg-gray-800"
                {
                    table class=(TABLE_STYLE)
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Frequency" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Start" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "End" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Last generated" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for item in items {
                                (table_row(item))
                            }

                            @if items.is_empty() {
                                tr
                                {
                                    td
                                        colspan="11"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No recurring transactions yet. Add one below."
                                    }
                                }
                            }
                        }
                    }
                }

                (create_recurring_form(categories, accounts))
            }
        }
    );

    base("Recurring Transactions", &[], &content)
}

fn create_recurring_form(categories: &[Category], accounts: &[Account]) -> Markup {
    html!(
        section class="max-w-md space-y-4"
        {
            h2 class="text-lg font-bold" { "Add recurring transaction" }

            form
                hx-post=(endpoints::RECURRING_API)
                hx-target-error="#alert-container"
                class="space-y-4"
            {
                div
                {
                    label for="description" class=(FORM_LABEL_STYLE) { "Description" }
                    input type="text" name="description" id="description"
                        class=(FORM_TEXT_INPUT_STYLE) required;
                }

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
                    label for="account_id" class=(FORM_LABEL_STYLE) { "Account" }
                    select name="account_id" id="account_id" class=(FORM_SELECT_STYLE)
                    {
                        option value="" { "No account" }

                        @for account in accounts {
                            option value=(account.id) { (account.name) }
                        }
                    }
                }

                div
                {
                    label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }
                    input type="number" name="amount" id="amount" step="0.01" min="0.01"
                        class=(FORM_TEXT_INPUT_STYLE) required;
                }

                div
                {
                    label for="kind" class=(FORM_LABEL_STYLE) { "Type" }
                    select name="kind" id="kind" class=(FORM_SELECT_STYLE)
                    {
                        option value="expense" { "Expense" }
                        option value="income" { "Income" }
                    }
                }

                div
                {
                    label for="frequency" class=(FORM_LABEL_STYLE) { "Frequency" }
                    select name="frequency" id="frequency" class=(FORM_SELECT_STYLE)
                    {
                        option value="daily" { "Daily" }
                        option value="weekly" { "Weekly" }
                        option value="monthly" { "Monthly" }
                        option value="yearly" { "Yearly" }
                    }
                }

                div
                {
                    label for="start_date" class=(FORM_LABEL_STYLE) { "Start date" }
                    input type="date" name="start_date" id="start_date"
                        class=(FORM_TEXT_INPUT_STYLE) required;
                }

                div
                {
                    label for="end_date" class=(FORM_LABEL_STYLE) { "End date (optional)" }
                    input type="date" name="end_date" id="end_date"
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE)
                {
                    "Add recurring transaction"
                }
            }
        }
    )
}
