use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::html;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::get_selectable_accounts,
    category::get_selectable_categories,
    database_id::TransactionId,
    endpoints,
    html::{FORM_CONTAINER_STYLE, LINK_STYLE, base},
    navigation::NavBar,
    transaction::{
        core::get_transaction,
        form::{TransactionFormValues, transaction_form, transaction_form_head},
    },
    user::UserID,
};

/// The state needed for the edit transaction page.
#[derive(Debug, Clone)]
pub struct EditTransactionPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the page for editing an existing transaction.
pub async fn get_edit_transaction_page(
    State(state): State<EditTransactionPageState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = get_transaction(transaction_id, user_id, &connection).inspect_err(
        |error| tracing::error!("Failed to retrieve transaction {transaction_id}: {error}"),
    )?;
    let categories = get_selectable_categories(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;
    let accounts = get_selectable_accounts(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve accounts: {error}"))?;

    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();
    let put_url = endpoints::format_endpoint(endpoints::TRANSACTION, transaction.id);
    let receipt_upload_url =
        endpoints::format_endpoint(endpoints::TRANSACTION_RECEIPT, transaction.id);
    let form = transaction_form(
        "hx-put",
        &put_url,
        "Save changes",
        &TransactionFormValues::from_transaction(&transaction),
        &categories,
        &accounts,
    );

    let content = html!(
        (nav_bar)

        main class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold my-4" { "Edit Transaction" }

            (form)

            section class="mt-6 w-full space-y-2"
            {
                h2 class="text-lg font-bold" { "Receipt" }

                @if let Some(receipt_url) = &transaction.receipt_url {
                    p
                    {
                        a href=(receipt_url) class=(LINK_STYLE) { "View current receipt" }
                    }
                }

                form
                    method="post"
                    action=(receipt_upload_url)
                    enctype="multipart/form-data"
                    class="flex gap-2 items-center"
                {
                    input type="file" name="receipt" accept=".png,.jpg,.jpeg,.pdf";
                    button type="submit" class=(LINK_STYLE) { "Upload" }
                }
            }
        }
    );

    Ok(base("Edit Transaction", &[transaction_form_head()], &content).into_response())
}
