//! The notification center page.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    endpoints,
    html::{
        BUTTON_DELETE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, TABLE_STYLE, base,
    },
    navigation::NavBar,
    notification::{Notification, core::list_notifications},
    user::UserID,
};

/// The state needed for the notifications page.
#[derive(Debug, Clone)]
pub struct NotificationsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for NotificationsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The optional kind filter from the query string.
#[derive(Debug, Default, Deserialize)]
pub struct NotificationsQuery {
    /// Only show notifications of this kind.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// Render the notifications page, optionally filtered by kind.
pub async fn get_notifications_page(
    State(state): State<NotificationsPageState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<NotificationsQuery>,
) -> Result<Response, Error> {
    let kind = query.kind.as_deref().filter(|kind| !kind.is_empty());

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let notifications = list_notifications(user_id, kind, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve notifications: {error}"))?;

    Ok(notifications_view(&notifications).into_response())
}

fn notifications_view(notifications: &[Notification]) -> Markup {
    let nav_bar = NavBar::new(endpoints::NOTIFICATIONS_VIEW).into_html();

    let table_row = |notification: &Notification| {
        let mark_read_url =
            endpoints::format_endpoint(endpoints::MARK_NOTIFICATION_READ, notification.id);
        let delete_url = endpoints::format_endpoint(endpoints::NOTIFICATION, notification.id);

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE)
                {
                    @if notification.is_read {
                        span class="text-gray-500 dark:text-gray-400"
                        {
                            (notification.message)
                        }
                    } @else {
                        span class="font-semibold" { (notification.message) }
                    }
                }
                td class=(TABLE_CELL_STYLE) { (notification.kind) }
                td class=(TABLE_CELL_STYLE) { (notification.created_at.date()) }
                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        @if !notification.is_read {
                            button
                                type="button"
                                class=(LINK_STYLE)
                                hx-post=(mark_read_url)
                                hx-target="closest tr"
                                hx-swap="outerHTML"
                                hx-target-error="#alert-container"
                            {
                                "Mark read"
                            }
                        }

                        button
                            type="button"
                            class=(BUTTON_DELETE_STYLE)
                            hx-delete=(delete_url)
                            hx-confirm="Delete this notification?"
                            hx-target="closest tr"
                            hx-swap="delete"
                            hx-target-error="#alert-container"
                        {
                            "Delete"
                        }
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
                    h1 class="text-xl font-bold" { "Notifications" }

                    a
                        href={(endpoints::NOTIFICATIONS_VIEW) "?type=bill_reminder"}
                        class=(LINK_STYLE)
                    {
                        "Bill reminders only"
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
                                th scope="col" class=(TABLE_CELL_STYLE) { "Message" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Kind" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for notification in notifications {
                                (table_row(notification))
                            }

                            @if notifications.is_empty() {
                                tr
                                {
                                    td
                                        colspan="4"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "Nothing to see here."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Notifications", &[], &content)
}
