//! Dashboard HTTP handlers and view rendering.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error,
    account::get_total_account_balance,
    bill::{BillReminder, get_upcoming_pending_bills},
    dashboard::{
        aggregation::{budget_usage, top_upcoming_recurring},
        cards::{SummaryFigures, summary_cards},
        charts::{chart_script, chart_view, spending_chart},
    },
    endpoints,
    html::{HeadElement, LINK_STYLE, PAGE_CONTAINER_STYLE, base, format_currency},
    navigation::NavBar,
    notification::{Notification, get_unread_notifications},
    recurring::{RecurringTransaction, get_active_recurring_transactions},
    savings::average_goal_progress,
    timezone::get_local_offset,
    transaction::{TransactionKind, expense_totals_by_category, month_start, total_since},
    user::UserID,
};

/// The state needed for the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Everything shown on the dashboard.
struct DashboardData {
    figures: SummaryFigures,
    category_totals: Vec<(String, f64)>,
    upcoming_bills: Vec<BillReminder>,
    upcoming_recurring: Vec<RecurringTransaction>,
    unread_notifications: Vec<Notification>,
}

/// Render the dashboard page.
pub async fn get_dashboard_page(
    State(state): State<DashboardPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let local_offset = get_local_offset(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    let data = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        gather_dashboard_data(user_id, today, &connection)
            .inspect_err(|error| tracing::error!("Failed to gather dashboard data: {error}"))?
    };

    let chart = spending_chart(&data.category_totals)?;
    let head_elements = [
        HeadElement::ScriptLink("/static/echarts-5.5.0-min.js".to_owned()),
        chart_script(&chart),
    ];

    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();
    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-6 w-full lg:max-w-6xl"
            {
                h1 class="text-xl font-bold" { "Dashboard" }

                (summary_cards(&data.figures))

                (chart_view(&chart))

                div class="grid grid-cols-1 lg:grid-cols-3 gap-6"
                {
                    (upcoming_bills_panel(&data.upcoming_bills))
                    (upcoming_recurring_panel(&data.upcoming_recurring))
                    (notifications_panel(&data.unread_notifications))
                }
            }
        }
    );

    Ok(base("Dashboard", &head_elements, &content).into_response())
}

fn gather_dashboard_data(
    user_id: UserID,
    today: Date,
    connection: &Connection,
) -> Result<DashboardData, Error> {
    let start_of_month = month_start(today);

    let total_balance = get_total_account_balance(user_id, connection)?;
    let total_income = total_since(user_id, TransactionKind::Income, start_of_month, connection)?;
    let total_expenses =
        total_since(user_id, TransactionKind::Expense, start_of_month, connection)?;
    let savings_progress = average_goal_progress(user_id, connection)?;

    let total_budget: f64 = connection
        .prepare(
            "SELECT COALESCE(SUM(amount), 0) FROM budget
             WHERE user_id = ?1 AND month = ?2",
        )?
        .query_one(
            rusqlite::params![user_id.as_i64(), start_of_month],
            |row| row.get(0),
        )?;
    let (budget_used_percent, remaining_budget) = budget_usage(total_budget, total_expenses);

    let category_totals = expense_totals_by_category(user_id, start_of_month, connection)?;
    let upcoming_bills = get_upcoming_pending_bills(user_id, 5, connection)?;
    let upcoming_recurring =
        top_upcoming_recurring(get_active_recurring_transactions(user_id, connection)?, 3);
    let unread_notifications = get_unread_notifications(user_id, 3, connection)?;

    Ok(DashboardData {
        figures: SummaryFigures {
            total_balance,
            total_income,
            total_expenses,
            savings_progress,
            budget_used_percent,
            remaining_budget,
        },
        category_totals,
        upcoming_bills,
        upcoming_recurring,
        unread_notifications,
    })
}

fn panel(title: &str, link_url: &str, link_text: &str, body: Markup) -> Markup {
    html!(
        section class="rounded border border-gray-200 bg-white px-4 py-3
            dark:border-gray-700 dark:bg-gray-800"
        {
            header class="flex justify-between items-end mb-2"
            {
                h2 class="text-lg font-bold" { (title) }
                a href=(link_url) class=(LINK_STYLE) { (link_text) }
            }

            (body)
        }
    )
}

fn upcoming_bills_panel(bills: &[BillReminder]) -> Markup {
    let body = html!(
        ul class="space-y-2 text-sm"
        {
            @for bill in bills {
                li class="flex justify-between"
                {
                    span { (bill.name) " · due " (bill.due_date) }
                    span { (format_currency(bill.amount)) }
                }
            }

            @if bills.is_empty() {
                li class="text-gray-500 dark:text-gray-400" { "No unpaid bills." }
            }
        }
    );

    panel("Upcoming bills", endpoints::BILLS_VIEW, "All bills", body)
}

fn upcoming_recurring_panel(templates: &[RecurringTransaction]) -> Markup {
    let body = html!(
        ul class="space-y-2 text-sm"
        {
            @for template in templates {
                li class="flex justify-between"
                {
                    span { (template.description) " · " (template.frequency) }
                    span { (format_currency(template.amount)) }
                }
            }

            @if templates.is_empty() {
                li class="text-gray-500 dark:text-gray-400" { "No active templates." }
            }
        }
    );

    panel(
        "Recurring",
        endpoints::RECURRING_VIEW,
        "All recurring",
        body,
    )
}

fn notifications_panel(notifications: &[Notification]) -> Markup {
    let body = html!(
        ul class="space-y-2 text-sm"
        {
            @for notification in notifications {
                li { (notification.message) }
            }

            @if notifications.is_empty() {
                li class="text-gray-500 dark:text-gray-400" { "You're all caught up." }
            }
        }
    );

    panel(
        "Notifications",
        endpoints::NOTIFICATIONS_VIEW,
        "All notifications",
        body,
    )
}
