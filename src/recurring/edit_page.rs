//! The page for editing an existing recurring transaction.

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
    account::{Account, get_selectable_accounts},
    category::{Category, get_selectable_categories},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE,
        FORM_TEXT_INPUT_STYLE, base,
    },
    navigation::NavBar,
    recurring::{Frequency, RecurringId, RecurringTransaction, core::get_recurring_transaction},
    transaction::TransactionKind,
    user::UserID,
};

/// The state needed for the edit recurring transaction page.
#[derive(Debug, Clone)]
pub struct EditRecurringPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditRecurringPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the page for editing an existing recurring transaction.
pub async fn get_edit_recurring_page(
    State(state): State<EditRecurringPageState>,
    Extension(user_id): Extension<UserID>,
    Path(recurring_id): Path<RecurringId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let recurring = get_recurring_transaction(recurring_id, user_id, &connection).inspect_err(
        |error| {
            tracing::error!("Failed to retrieve recurring transaction {recurring_id}: {error}")
        },
    )?;
    let categories = get_selectable_categories(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;
    let accounts = get_selectable_accounts(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve accounts: {error}"))?;

    Ok(edit_recurring_view(&recurring, &categories, &accounts).into_response())
}

fn edit_recurring_view(
    recurring: &RecurringTransaction,
    categories: &[Category],
    accounts: &[Account],
) -> Markup {
    let nav_bar = NavBar::new(endpoints::RECURRING_VIEW).into_html();
    let put_url = endpoints::format_endpoint(endpoints::RECURRING, recurring.id);
    let end_date_value = recurring
        .end_date
        .map(|date| date.to_string())
        .unwrap_or_default();

    let content = html!(
        (nav_bar)

        main class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold my-4" { "Edit Recurring Transaction" }

            form hx-put=(put_url) hx-target-error="#alert-container" class="space-y-4 w-full"
            {
                div
                {
                    label for="description" class=(FORM_LABEL_STYLE) { "Description" }
                    input type="text" name="description" id="description"
                        class=(FORM_TEXT_INPUT_STYLE) value=(recurring.description) required;
                }

                div
                {
                    label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }
                    select name="category_id" id="category_id" class=(FORM_SELECT_STYLE) required
                    {
                        @for category in categories {
                            option
                                value=(category.id)
                                selected[recurring.category_id == category.id]
                            {
                                (category.name)
                            }
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
                            option
                                value=(account.id)
                                selected[recurring.account_id == Some(account.id)]
                            {
                                (account.name)
                            }
                        }
                    }
                }

                div
                {
                    label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }
                    input type="number" name="amount" id="amount" step="0.01" min="0.01"
                        class=(FORM_TEXT_INPUT_STYLE) value=(recurring.amount) required;
                }

                div
                {
                    label for="kind" class=(FORM_LABEL_STYLE) { "Type" }
                    select name="kind" id="kind" class=(FORM_SELECT_STYLE)
                    {
                        option value="expense" selected[recurring.kind == TransactionKind::Expense]
                        {
                            "Expense"
                        }
                        option value="income" selected[recurring.kind == TransactionKind::Income]
                        {
                            "Income"
                        }
                    }
                }

                div
                {
                    label for="frequency" class=(FORM_LABEL_STYLE) { "Frequency" }
                    select name="frequency" id="frequency" class=(FORM_SELECT_STYLE)
                    {
                        @for frequency in [
                            Frequency::Daily,
                            Frequency::Weekly,
                            Frequency::Monthly,
                            Frequency::Yearly,
                        ] {
                            option
                                value=(frequency)
                                selected[recurring.frequency == frequency]
                            {
                                (frequency)
                            }
                        }
                    }
                }

                div
                {
                    label for="start_date" class=(FORM_LABEL_STYLE) { "Start date" }
                    input type="date" name="start_date" id="start_date"
                        class=(FORM_TEXT_INPUT_STYLE) value=(recurring.start_date) required;
                }

                div
                {
                    label for="end_date" class=(FORM_LABEL_STYLE) { "End date (optional)" }
                    input type="date" name="end_date" id="end_date"
                        class=(FORM_TEXT_INPUT_STYLE) value=(end_date_value);
                }

                div
                {
                    label for="is_active" class=(FORM_LABEL_STYLE) { "Status" }
                    select name="is_active" id="is_active" class=(FORM_SELECT_STYLE)
                    {
                        option value="true" selected[recurring.is_active] { "Active" }
                        option value="false" selected[!recurring.is_active] { "Inactive" }
                    }
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save" }
            }
        }
    );

    base("Edit Recurring Transaction", &[], &content)
}
