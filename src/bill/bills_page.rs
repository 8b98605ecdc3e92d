//! The bills page. Rendering it also raises notifications for bills that
//! are due soon.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    bill::{BillReminder, BillStatus, core::list_bill_reminders, reminder::notify_upcoming_bills},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, TABLE_STYLE,
        base, edit_delete_action_links, format_currency,
    },
    navigation::NavBar,
    timezone::get_local_offset,
    user::UserID,
};

/// The state needed for the bills page.
#[derive(Debug, Clone)]
pub struct BillsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for BillsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Render the bills page.
///
/// Before rendering, reminders are raised for pending bills due within the
/// next three days. This is the only place reminders are checked; there is
/// no background scheduler.
pub async fn get_bills_page(
    State(state): State<BillsPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let local_offset = get_local_offset(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    let bills = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        notify_upcoming_bills(user_id, today, &connection)
            .inspect_err(|error| tracing::error!("Failed to raise bill reminders: {error}"))?;

        list_bill_reminders(user_id, &connection)
            .inspect_err(|error| tracing::error!("Failed to retrieve bills: {error}"))?
    };

    Ok(bills_view(&bills).into_response())
}

fn bills_view(bills: &[BillReminder]) -> Markup {
    let nav_bar = NavBar::new(endpoints::BILLS_VIEW).into_html();

    let table_row = |bill: &BillReminder| {
        let edit_url = endpoints::format_endpoint(endpoints::EDIT_BILL_VIEW, bill.id);
        let delete_url = endpoints::format_endpoint(endpoints::BILL, bill.id);
        let mark_paid_url = endpoints::format_endpoint(endpoints::MARK_BILL_PAID, bill.id);
        let confirm_message = format!("Are you sure you want to delete '{}'?", bill.name);

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE) { (bill.name) }
                td class=(TABLE_CELL_STYLE) { (format_currency(bill.amount)) }
                td class=(TABLE_CELL_STYLE) { (bill.due_date) }
                td class=(TABLE_CELL_STYLE)
                {
                    @if bill.status == BillStatus::Paid {
                        span class="text-green-600 dark:text-green-500" { "Paid" }
                    } @else {
                        span class="text-yellow-600 dark:text-yellow-400" { "Pending" }
                    }
                }
                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        @if bill.status == BillStatus::Pending {
                            button
                                type="button"
                                class=(LINK_STYLE)
                                hx-post=(mark_paid_url)
                                hx-target="closest tr"
                                hx-swap="outerHTML"
                                hx-target-error="#alert-container"
                            {
                                "Mark paid"
                            }
                        }

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
            section class="space-y-4 w-full lg:max-w-4xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Bill Reminders" }
                }

                section class="dark:bg-gray-800"
                {
                    table class=(TABLE_STYLE)
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Bill" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Due" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for bill in bills {
                                (table_row(bill))
                            }

                            @if bills.is_empty() {
                                tr
                                {
                                    td
                                        colspan="5"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No bills yet. Add your first reminder below."
                                    }
                                }
                            }
                        }
                    }
                }

                (create_bill_form())
            }
        }
    );

    base("Bills", &[], &content)
}

fn create_bill_form() -> Markup {
    html!(
        section class="max-w-md space-y-4"
        {
            h2 class="text-lg font-bold" { "Add bill reminder" }

            form
                hx-post=(endpoints::BILLS_API)
                hx-target-error="#alert-container"
                class="space-y-4"
            {
                div
                {
                    label for="name" class=(FORM_LABEL_STYLE) { "Bill name" }
                    input type="text" name="name" id="name" class=(FORM_TEXT_INPUT_STYLE) required;
                }

                div
                {
                    label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }
                    input type="number" name="amount" id="amount" step="0.01" min="0.01"
                        class=(FORM_TEXT_INPUT_STYLE) required;
                }

                div
                {
                    label for="due_date" class=(FORM_LABEL_STYLE) { "Due date" }
                    input type="date" name="due_date" id="due_date"
                        class=(FORM_TEXT_INPUT_STYLE) required;
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add bill" }
            }
        }
    )
}
