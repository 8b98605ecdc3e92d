//! The page for editing an existing bill reminder.

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
    bill::{BillId, BillReminder, BillStatus, core::get_bill_reminder},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE,
        FORM_TEXT_INPUT_STYLE, base,
    },
    navigation::NavBar,
    user::UserID,
};

/// The state needed for the edit bill page.
#[derive(Debug, Clone)]
pub struct EditBillPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditBillPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the page for editing an existing bill reminder.
pub async fn get_edit_bill_page(
    State(state): State<EditBillPageState>,
    Extension(user_id): Extension<UserID>,
    Path(bill_id): Path<BillId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let bill = get_bill_reminder(bill_id, user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve bill {bill_id}: {error}"))?;

    Ok(edit_bill_view(&bill).into_response())
}

fn edit_bill_view(bill: &BillReminder) -> Markup {
    let nav_bar = NavBar::new(endpoints::BILLS_VIEW).into_html();
    let put_url = endpoints::format_endpoint(endpoints::BILL, bill.id);

    let content = html!(
        (nav_bar)

        main class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold my-4" { "Edit Bill" }

            form hx-put=(put_url) hx-target-error="#alert-container" class="space-y-4 w-full"
            {
                div
                {
                    label for="name" class=(FORM_LABEL_STYLE) { "Bill name" }
                    input type="text" name="name" id="name" class=(FORM_TEXT_INPUT_STYLE)
                        value=(bill.name) required;
                }

                div
                {
                    label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }
                    input type="number" name="amount" id="amount" step="0.01" min="0.01"
                        class=(FORM_TEXT_INPUT_STYLE) value=(bill.amount) required;
                }

                div
                {
                    label for="due_date" class=(FORM_LABEL_STYLE) { "Due date" }
                    input type="date" name="due_date" id="due_date"
                        class=(FORM_TEXT_INPUT_STYLE) value=(bill.due_date) required;
                }

                div
                {
                    label for="status" class=(FORM_LABEL_STYLE) { "Status" }
                    select name="status" id="status" class=(FORM_SELECT_STYLE)
                    {
                        option value="pending" selected[bill.status == BillStatus::Pending]
                        {
                            "Pending"
                        }
                        option value="paid" selected[bill.status == BillStatus::Paid]
                        {
                            "Paid"
                        }
                    }
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save" }
            }
        }
    );

    base("Edit Bill", &[], &content)
}
