//! Categories listing page.

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
    category::{Category, get_selectable_categories},
    endpoints,
    html::{
        BADGE_STYLE, BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE,
        FORM_SELECT_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, TABLE_STYLE, base,
    },
    navigation::NavBar,
    user::UserID,
};

/// The state needed for the categories page.
#[derive(Debug, Clone)]
pub struct CategoriesPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoriesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the categories page with the user's own and the global categories.
pub async fn get_categories_page(
    State(state): State<CategoriesPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_selectable_categories(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;

    Ok(categories_view(&categories).into_response())
}

fn categories_view(categories: &[Category]) -> Markup {
    let nav_bar = NavBar::new(endpoints::CATEGORIES_VIEW).into_html();

    let table_row = |category: &Category| {
        let delete_url = endpoints::format_endpoint(endpoints::CATEGORY, category.id);
        let confirm_message = format!("Are you sure you want to delete '{}'?", category.name);

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE)
                {
                    span class=(BADGE_STYLE) { (category.name) }
                }

                td class=(TABLE_CELL_STYLE) { (category.kind) }

                td class=(TABLE_CELL_STYLE)
                {
                    // Global categories have no owner and cannot be deleted.
                    @if category.user_id.is_some() {
                        button
                            type="button"
                            class=(BUTTON_DELETE_STYLE)
                            hx-delete=(delete_url)
                            hx-confirm=(confirm_message)
                            hx-target="closest tr"
                            hx-swap="delete"
                            hx-target-error="#alert-container"
                        {
                            "Delete"
                        }
                    } @else {
                        span class="text-gray-500 dark:text-gray-400" { "Shared" }
                    }
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-3xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Categories" }
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
                                th scope="col" class=(TABLE_CELL_STYLE) { "Kind" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for category in categories {
                                (table_row(category))
                            }

                            @if categories.is_empty() {
                                tr
                                {
                                    td
                                        colspan="3"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No categories yet. Add your first category below."
                                    }
                                }
                            }
                        }
                    }
                }

                (create_category_form())
            }
        }
    );

    base("Categories", &[], &content)
}

fn create_category_form() -> Markup {
    html!(
        section class="max-w-md space-y-4"
        {
            h2 class="text-lg font-bold" { "Add category" }

            form
                hx-post=(endpoints::CATEGORIES_API)
                hx-target-error="#alert-container"
                class="space-y-4"
            {
                div
                {
                    label for="name" class=(FORM_LABEL_STYLE) { "Name" }
                    input type="text" name="name" id="name" class=(FORM_TEXT_INPUT_STYLE) required;
                }

                div
                {
                    label for="kind" class=(FORM_LABEL_STYLE) { "Kind" }
                    select name="kind" id="kind" class=(FORM_SELECT_STYLE)
                    {
                        option value="expense" { "Expense" }
                        option value="income" { "Income" }
                    }
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add category" }
            }
        }
    )
}
