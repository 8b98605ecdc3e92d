//! Displays accounts and their balances.

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
    account::{Account, get_accounts_for_user},
    alert::{flash_banner, take_flash_message},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, TABLE_STYLE, base,
        edit_delete_action_links, format_currency,
    },
    navigation::NavBar,
    user::UserID,
};

/// The state needed for the accounts page.
#[derive(Debug, Clone)]
pub struct AccountsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the accounts page with the user's accounts and a creation form.
pub async fn get_accounts_page(
    State(state): State<AccountsPageState>,
    Extension(user_id): Extension<UserID>,
    jar: CookieJar,
) -> Result<Response, Error> {
    let (jar, flash_message) = take_flash_message(jar);

    let accounts = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_accounts_for_user(user_id, &connection)
            .inspect_err(|error| tracing::error!("Failed to retrieve accounts: {error}"))?
    };

    Ok((jar, accounts_view(&accounts, flash_message.as_deref())).into_response())
}

fn accounts_view(accounts: &[Account], flash_message: Option<&str>) -> Markup {
    let nav_bar = NavBar::new(endpoints::ACCOUNTS_VIEW).into_html();

    let table_row = |account: &Account| {
        let edit_url = endpoints::format_endpoint(endpoints::EDIT_ACCOUNT_VIEW, account.id);
        let delete_url = endpoints::format_endpoint(endpoints::ACCOUNT, account.id);
        let confirm_message = format!(
            "Are you sure you want to delete '{}'? Accounts with linked transactions cannot be deleted.",
            account.name
        );

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE) { (account.name) }
                td class=(TABLE_CELL_STYLE) { (account.account_type) }
                td class=(TABLE_CELL_STYLE) { (format_currency(account.balance)) }
                td class=(TABLE_CELL_STYLE)
                {
                    @if account.is_active { "Active" } @else { "Inactive" }
                }
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
                    h1 class="text-xl font-bold" { "Accounts" }
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
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Balance" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for account in accounts {
                                (table_row(account))
                            }

                            @if accounts.is_empty() {
                                tr
                                {
                                    td
                                        colspan="5"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No accounts yet. Add your first account below."
                                    }
                                }
                            }
                        }
                    }
                }

                (create_account_form())
            }
        }
    );

    base("Accounts", &[], &content)
}

fn create_account_form() -> Markup {
    html!(
        section class="max-w-md space-y-4"
        {
            h2 class="text-lg font-bold" { "Add account" }

            form
                hx-post=(endpoints::ACCOUNTS_API)
                hx-target-error="#alert-container"
                class="space-y-4"
            {
                div
                {
                    label for="name" class=(FORM_LABEL_STYLE) { "Account name" }
                    input type="text" name="name" id="name" class=(FORM_TEXT_INPUT_STYLE) required;
                }

                div
                {
                    label for="account_type" class=(FORM_LABEL_STYLE) { "Account type" }
                    input type="text" name="account_type" id="account_type"
                        class=(FORM_TEXT_INPUT_STYLE) value="General" required;
                }

                div
                {
                    label for="balance" class=(FORM_LABEL_STYLE) { "Opening balance" }
                    input type="number" name="balance" id="balance" step="0.01"
                        class=(FORM_TEXT_INPUT_STYLE) required;
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add account" }
            }
        }
    )
}
