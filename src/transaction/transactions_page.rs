//! Defines the route handler for the page that displays transactions as a table.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    AppState, Error,
    alert::{flash_banner, take_flash_message},
    endpoints,
    html::{
        FORM_LABEL_STYLE, FORM_SELECT_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, TABLE_STYLE,
        base, edit_delete_action_links, format_currency,
    },
    navigation::NavBar,
    transaction::{
        TransactionListItem,
        query::{TransactionFilters, get_transactions},
    },
    user::UserID,
};

/// The state needed for the transactions page.
#[derive(Debug, Clone)]
pub struct TransactionsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The raw filter values from the query string.
///
/// Values arrive as strings so that empty form fields do not fail
/// deserialization; [TransactionsQuery::into_filters] drops anything that
/// does not parse.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionsQuery {
    /// Only show transactions of this kind.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// The start of the date range filter.
    #[serde(default)]
    pub from: Option<String>,
    /// The end of the date range filter.
    #[serde(default)]
    pub to: Option<String>,
    /// Only show transactions whose description contains this text.
    #[serde(default)]
    pub keyword: Option<String>,
}

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

impl TransactionsQuery {
    fn into_filters(self) -> TransactionFilters {
        let parse_date = |raw: Option<String>| -> Option<Date> {
            raw.as_deref()
                .filter(|value| !value.is_empty())
                .and_then(|value| Date::parse(value, DATE_FORMAT).ok())
        };

        TransactionFilters {
            kind: self
                .kind
                .as_deref()
                .filter(|value| !value.is_empty())
                .and_then(|value| value.parse().ok()),
            from: parse_date(self.from),
            to: parse_date(self.to),
            keyword: self.keyword.filter(|value| !value.is_empty()),
        }
    }
}

/// Render the transactions page, applying the filters from the query string.
///
/// Any pending flash message (e.g. a budget alert raised while creating a
/// transaction) is displayed once and cleared.
pub async fn get_transactions_page(
    State(state): State<TransactionsPageState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<TransactionsQuery>,
    jar: CookieJar,
) -> Result<Response, Error> {
    let (jar, flash_message) = take_flash_message(jar);
    let filters = query.into_filters();

    let items = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_transactions(user_id, &filters, &connection)
            .inspect_err(|error| tracing::error!("Failed to retrieve transactions: {error}"))?
    };

    Ok((
        jar,
        transactions_view(&items, &filters, flash_message.as_deref()),
    )
        .into_response())
}

fn transactions_view(
    items: &[TransactionListItem],
    filters: &TransactionFilters,
    flash_message: Option<&str>,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-6xl"
            {
                header class="flex justify-between flex-wrap items-end gap-4"
                {
                    h1 class="text-xl font-bold" { "Transactions" }

                    div class="flex gap-4"
                    {
                        a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE)
                        {
                            "New Transaction"
                        }

                        a href=(endpoints::GENERATE_RECURRING) class=(LINK_STYLE)
                        {
                            "Generate Recurring"
                        }
                    }
                }

                @if let Some(message) = flash_message {
                    (flash_banner(message))
                }

                (filter_form(filters))

                (transactions_table(items))

                (export_form())
            }
        }
    );

    base("Transactions", &[], &content)
}

fn filter_form(filters: &TransactionFilters) -> Markup {
    let kind_value = filters.kind.map(|kind| kind.as_str()).unwrap_or("");
    let from_value = filters
        .from
        .map(|date| date.to_string())
        .unwrap_or_default();
    let to_value = filters.to.map(|date| date.to_string()).unwrap_or_default();
    let keyword_value = filters.keyword.clone().unwrap_or_default();

    html!(
        form method="get" action=(endpoints::TRANSACTIONS_VIEW)
            class="flex flex-wrap gap-4 items-end"
        {
            div
            {
                label for="type" class=(FORM_LABEL_STYLE) { "Type" }
                select name="type" id="type" class=(FORM_SELECT_STYLE)
                {
                    option value="" selected[kind_value.is_empty()] { "All" }
                    option value="income" selected[kind_value == "income"] { "Income" }
                    option value="expense" selected[kind_value == "expense"] { "Expense" }
                }
            }

            div
            {
                label for="from" class=(FORM_LABEL_STYLE) { "From" }
                input type="date" name="from" id="from" class=(FORM_TEXT_INPUT_STYLE)
                    value=(from_value);
            }

            div
            {
                label for="to" class=(FORM_LABEL_STYLE) { "To" }
                input type="date" name="to" id="to" class=(FORM_TEXT_INPUT_STYLE)
                    value=(to_value);
            }

            div
            {
                label for="keyword" class=(FORM_LABEL_STYLE) { "Keyword" }
                input type="text" name="keyword" id="keyword" class=(FORM_TEXT_INPUT_STYLE)
                    value=(keyword_value);
            }

            button type="submit"
                class="px-4 py-2 bg-blue-500 dark:bg-blue-600 hover:bg-blue-600
                    hover:dark:bg-blue-700 text-white rounded"
            {
                "Filter"
            }
        }
    )
}

fn transactions_table(items: &[TransactionListItem]) -> Markup {
    let table_row = |item: &TransactionListItem| {
        let transaction = &item.transaction;
        let edit_url =
            endpoints::format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction.id);
        let delete_url = endpoints::format_endpoint(endpoints::TRANSACTION, transaction.id);
        let confirm_message = "Are you sure you want to delete this transaction? \
            Its effect on the account balance will be undone.";

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE) { (transaction.date) }
                td class=(TABLE_CELL_STYLE)
                {
                    (transaction.kind)
                    @if transaction.is_recurring_generated {
                        span class="ml-1 text-xs text-gray-500 dark:text-gray-400" { "(auto)" }
                    }
                }
                td class=(TABLE_CELL_STYLE)
                {
                    (item.category_name.as_deref().unwrap_or("—"))
                }
                td class=(TABLE_CELL_STYLE)
                {
                    (item.account_name.as_deref().unwrap_or("—"))
                }
                td class=(TABLE_CELL_STYLE) { (format_currency(transaction.amount)) }
                td class=(TABLE_CELL_STYLE) { (transaction.description) }
                td class=(TABLE_CELL_STYLE)
                {
                    @if let Some(receipt_url) = &transaction.receipt_url {
                        a href=(receipt_url) class=(LINK_STYLE) { "Receipt" }
                    }
                }
                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        (edit_delete_action_links(
                            &edit_url,
                            &delete_url,
                            confirm_message,
                            "closest tr",
                            "delete",
                        ))
                    }
                }
            }
        )
    };

    html!(
        section class="dark:bg-gray-800"
        {
            table class=(TABLE_STYLE)
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Receipt" }
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
                                colspan="8"
                                class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                            {
                                "No transactions found. "
                                a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE)
                                {
                                    "Record your first transaction"
                                }
                            }
                        }
                    }
                }
            }
        }
    )
}

fn export_form() -> Markup {
    // A plain (non-HTMX) form so the browser downloads the file.
    html!(
        form method="post" action=(endpoints::EXPORT_TRANSACTIONS) class="flex gap-4 items-end"
        {
            input type="hidden" name="format" value="csv";

            button type="submit" class=(LINK_STYLE) { "Export CSV" }
        }
    )
}


#[cfg(test)]
mod page_tests {
    use crate::transaction::query::TransactionFilters;

    use super::transactions_view;

    #[test]
    fn shows_flash_message() {
        let html = transactions_view(
            &[],
            &TransactionFilters::default(),
            Some("Budget exceeded for this category!"),
        )
        .into_string();

        assert!(html.contains("Budget exceeded for this category!"));
    }

    #[test]
    fn empty_list_shows_hint() {
        let html = transactions_view(&[], &TransactionFilters::default(), None).into_string();

        assert!(html.contains("No transactions found."));
    }
}
