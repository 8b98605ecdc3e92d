//! Defines the endpoint for setting a monthly budget.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    alert::Alert,
    budget::{DEFAULT_ALERT_THRESHOLD, core::upsert_budget},
    category::CategoryId,
    endpoints,
    transaction::parse_month,
    user::UserID,
};

/// The state needed to set a budget.
#[derive(Debug, Clone)]
pub struct UpsertBudgetState {
    /// The database connection for managing budgets.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpsertBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for setting a budget.
#[derive(Debug, Deserialize)]
pub struct BudgetForm {
    /// The category the budget limits.
    pub category_id: CategoryId,
    /// The month the budget applies to, as "YYYY-MM".
    pub month: String,
    /// The spending limit for the month.
    pub amount: f64,
    /// The warning threshold as a percentage of `amount`.
    #[serde(default)]
    pub alert_threshold: Option<i64>,
}

/// A route handler that creates the budget for (category, month), or
/// replaces the amount and threshold of the existing one.
pub async fn upsert_budget_endpoint(
    State(state): State<UpsertBudgetState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<BudgetForm>,
) -> Response {
    let Some(month) = parse_month(&form.month) else {
        return Alert::ErrorSimple {
            message: format!("{} is not a valid month.", form.month),
        }
        .into_response_with_status(StatusCode::BAD_REQUEST);
    };

    let alert_threshold = form.alert_threshold.unwrap_or(DEFAULT_ALERT_THRESHOLD);

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = upsert_budget(
        user_id,
        form.category_id,
        month,
        form.amount,
        alert_threshold,
        &connection,
    ) {
        tracing::error!("could not set budget: {error}");

        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::BUDGETS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use rusqlite::Connection;

    use crate::{
        budget::{
            core::list_budgets_with_spent,
            upsert_endpoint::{BudgetForm, UpsertBudgetState, upsert_budget_endpoint},
        },
        category::{CategoryKind, CategoryName, NewCategory, create_category},
        transaction::test_utils::get_test_connection,
        user::UserID,
    };

    fn setup() -> (Connection, UserID, i64) {
        let (conn, user_id) = get_test_connection();

        let category = create_category(
            NewCategory {
                user_id: Some(user_id),
                name: CategoryName::new_unchecked("Groceries"),
                kind: CategoryKind::Expense,
            },
            &conn,
        )
        .unwrap();

        (conn, user_id, category.id)
    }

    #[tokio::test]
    async fn posting_twice_updates_instead_of_duplicating() {
        let (conn, user_id, category_id) = setup();
        let state = UpsertBudgetState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        for amount in [100.0, 250.0] {
            let response = upsert_budget_endpoint(
                State(state.clone()),
                Extension(user_id),
                Form(BudgetForm {
                    category_id,
                    month: "2023-01".to_owned(),
                    amount,
                    alert_threshold: None,
                }),
            )
            .await;

            assert_eq!(response.status(), StatusCode::SEE_OTHER);
        }

        let connection = state.db_connection.lock().unwrap();
        let budgets = list_budgets_with_spent(user_id, &connection).unwrap();
        assert_eq!(budgets.len(), 1);
        assert_eq!(budgets[0].budget.amount, 250.0);
    }

    #[tokio::test]
    async fn rejects_malformed_month() {
        let (conn, user_id, category_id) = setup();
        let state = UpsertBudgetState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = upsert_budget_endpoint(
            State(state.clone()),
            Extension(user_id),
            Form(BudgetForm {
                category_id,
                month: "January".to_owned(),
                amount: 100.0,
                alert_threshold: None,
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let connection = state.db_connection.lock().unwrap();
        assert!(list_budgets_with_spent(user_id, &connection)
            .unwrap()
            .is_empty());
    }
}
