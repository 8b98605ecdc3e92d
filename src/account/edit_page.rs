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
    account::{Account, AccountId, get_account},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE,
        FORM_TEXT_INPUT_STYLE, base,
    },
    navigation::NavBar,
    user::UserID,
};

/// The state needed for the edit account page.
#[derive(Debug, Clone)]
pub struct EditAccountPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditAccountPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the page for editing an existing account.
pub async fn get_edit_account_page(
    State(state): State<EditAccountPageState>,
    Extension(user_id): Extension<UserID>,
    Path(account_id): Path<AccountId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let account = get_account(account_id, user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve account {account_id}: {error}"))?;

    Ok(edit_account_view(&account).into_response())
}

fn edit_account_view(account: &Account) -> Markup {
    let nav_bar = NavBar::new(endpoints::ACCOUNTS_VIEW).into_html();
    let put_url = endpoints::format_endpoint(endpoints::ACCOUNT, account.id);

    let content = html!(
        (nav_bar)

        main class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold my-4" { "Edit Account" }

            form hx-put=(put_url) hx-target-error="#alert-container" class="space-y-4 w-full"
            {
                div
                {
                    label for="name" class=(FORM_LABEL_STYLE) { "Account name" }
                    input type="text" name="name" id="name" class=(FORM_TEXT_INPUT_STYLE)
                        value=(account.name) required;
                }

                div
                {
                    label for="account_type" class=(FORM_LABEL_STYLE) { "Account type" }
                    input type="text" name="account_type" id="account_type"
                        class=(FORM_TEXT_INPUT_STYLE) value=(account.account_type) required;
                }

                div
                {
                    label for="balance" class=(FORM_LABEL_STYLE) { "Balance" }
                    input type="number" name="balance" id="balance" step="0.01"
                        class=(FORM_TEXT_INPUT_STYLE) value=(account.balance) required;
                }

                div
                {
                    label for="currency" class=(FORM_LABEL_STYLE) { "Currency" }
                    input type="text" name="currency" id="currency"
                        class=(FORM_TEXT_INPUT_STYLE) value=(account.currency) required;
                }

                div
                {
                    label for="is_active" class=(FORM_LABEL_STYLE) { "Status" }
                    select name="is_active" id="is_active" class=(FORM_SELECT_STYLE)
                    {
                        option value="true" selected[account.is_active] { "Active" }
                        option value="false" selected[!account.is_active] { "Inactive" }
                    }
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save" }
            }
        }
    );

    base("Edit Account", &[], &content)
}
