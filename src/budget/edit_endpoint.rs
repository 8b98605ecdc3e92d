//! Defines the endpoint for updating a budget.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    budget::{BudgetId, core::update_budget},
    endpoints,
    user::UserID,
};

/// The state needed to edit a budget.
#[derive(Debug, Clone)]
pub struct EditBudgetState {
    /// The database connection for managing budgets.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for editing a budget.
#[derive(Debug, Deserialize)]
pub struct EditBudgetForm {
    amount: f64,
    alert_threshold: i64,
}

/// A route handler for updating a budget's amount and threshold, redirects
/// to the budgets view on success.
pub async fn edit_budget_endpoint(
    State(state): State<EditBudgetState>,
    Extension(user_id): Extension<UserID>,
    Path(budget_id): Path<BudgetId>,
    Form(form): Form<EditBudgetForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_budget(budget_id, user_id, form.amount, form.alert_threshold, &connection) {
        Ok(0) => {
            tracing::error!(
                "Could not update budget {budget_id}: update returned zero rows affected"
            );
            return Error::UpdateMissingBudget.into_alert_response();
        }
        Ok(_) => {}
        Err(error) => {
            tracing::error!("Could not update budget {budget_id}: {error}");
            return error.into_alert_response();
        }
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

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use axum_extra::extract::Form;
    use time::macros::date;

    use crate::{
        budget::{
            core::{get_budget, upsert_budget},
            edit_endpoint::{EditBudgetForm, EditBudgetState, edit_budget_endpoint},
        },
        category::{CategoryKind, CategoryName, NewCategory, create_category},
        transaction::test_utils::get_test_connection,
    };

    #[tokio::test]
    async fn can_update_budget() {
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
        let state = EditBudgetState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = edit_budget_endpoint(
            State(state.clone()),
            Extension(user_id),
            Path(budget.id),
            Form(EditBudgetForm {
                amount: 300.0,
                alert_threshold: 50,
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let connection = state.db_connection.lock().unwrap();
        let updated = get_budget(budget.id, user_id, &connection).unwrap();
        assert_eq!(updated.amount, 300.0);
        assert_eq!(updated.alert_threshold, 50);
    }
}
