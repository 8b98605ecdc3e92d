//! Defines the endpoint for deleting a budget.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    budget::{BudgetId, core::delete_budget},
    user::UserID,
};

/// The state needed to delete a budget.
#[derive(Debug, Clone)]
pub struct DeleteBudgetState {
    /// The database connection for managing budgets.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a budget.
pub async fn delete_budget_endpoint(
    State(state): State<DeleteBudgetState>,
    Extension(user_id): Extension<UserID>,
    Path(budget_id): Path<BudgetId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_budget(budget_id, user_id, &connection) {
        Ok(0) => Error::DeleteMissingBudget.into_alert_response(),
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(_) => StatusCode::OK.into_response(),
        Err(error) => {
            tracing::error!("Could not delete budget {budget_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use time::macros::date;

    use crate::{
        budget::{
            core::{list_budgets_with_spent, upsert_budget},
            delete_endpoint::{DeleteBudgetState, delete_budget_endpoint},
        },
        category::{CategoryKind, CategoryName, NewCategory, create_category},
        transaction::test_utils::get_test_connection,
        user::UserID,
    };

    #[tokio::test]
    async fn deletes_budget_and_rejects_other_users() {
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
        let budget =
            upsert_budget(user_id, category.id, date!(2023 - 01 - 01), 100.0, 90, &conn).unwrap();
        let state = DeleteBudgetState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = delete_budget_endpoint(
            State(state.clone()),
            Extension(UserID::new(user_id.as_i64() + 1)),
            Path(budget.id),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response =
            delete_budget_endpoint(State(state.clone()), Extension(user_id), Path(budget.id))
                .await;
        assert_eq!(response.status(), StatusCode::OK);

        let connection = state.db_connection.lock().unwrap();
        assert!(list_budgets_with_spent(user_id, &connection)
            .unwrap()
            .is_empty());
    }
}
