//! Defines the endpoint that moves a month's remaining budget into savings.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use rusqlite::Connection;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    alert::set_flash_message,
    budget::core::budgets_for_month,
    endpoints,
    savings::add_to_unexpired_goals,
    timezone::get_local_offset,
    transaction::parse_month,
    user::UserID,
};

/// The state needed to move budget remainders into savings.
#[derive(Debug, Clone)]
pub struct MoveToSavingsState {
    /// The database connection for managing budgets and savings goals.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for MoveToSavingsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The query parameters selecting the month to sweep.
#[derive(Debug, Deserialize)]
pub struct MoveToSavingsQuery {
    /// The month whose budget remainders should be moved, as "YYYY-MM".
    #[serde(default)]
    pub month: Option<String>,
}

/// A route handler that credits each of the month's positive budget
/// remainders to every savings goal whose target date has not passed, then
/// redirects back to the budgets page with a summary flash message.
pub async fn move_to_savings_endpoint(
    State(state): State<MoveToSavingsState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<MoveToSavingsQuery>,
    jar: CookieJar,
) -> Response {
    let Some(month) = query.month.as_deref().and_then(parse_month) else {
        let jar = set_flash_message(jar, "No month selected.");
        return (jar, Redirect::to(endpoints::BUDGETS_VIEW)).into_response();
    };

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        return Error::InvalidTimezoneError(state.local_timezone).into_response();
    };
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    let total_moved = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_response();
            }
        };

        match sweep_month(user_id, month, today, &connection) {
            Ok(total_moved) => total_moved,
            Err(error) => {
                tracing::error!("Could not move budget remainders to savings: {error}");
                return error.into_response();
            }
        }
    };

    let message = format!(
        "${total_moved:.2} moved to savings for {}.",
        query.month.as_deref().unwrap_or_default()
    );
    let jar = set_flash_message(jar, &message);

    (jar, Redirect::to(endpoints::BUDGETS_VIEW)).into_response()
}

/// Credit each positive budget remainder for `month` to the user's
/// unexpired goals, returning the total amount moved.
fn sweep_month(
    user_id: UserID,
    month: time::Date,
    today: time::Date,
    connection: &Connection,
) -> Result<f64, Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let budgets = budgets_for_month(user_id, month, &sql_transaction)?;

    let mut total_moved = 0.0;

    for item in budgets {
        let remaining = item.budget.amount - item.total_spent;
        if remaining > 0.0 {
            total_moved += remaining;
            add_to_unexpired_goals(user_id, remaining, today, &sql_transaction)?;
        }
    }

    sql_transaction.commit()?;

    Ok(total_moved)
}
