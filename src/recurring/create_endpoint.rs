//! Defines the endpoint for creating a recurring transaction.

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
use time::Date;

use crate::{
    AppState, Error,
    account::AccountId,
    category::CategoryId,
    endpoints,
    recurring::{Frequency, NewRecurringTransaction, core::create_recurring_transaction},
    transaction::TransactionKind,
    user::UserID,
};

/// The state needed to create a recurring transaction.
#[derive(Debug, Clone)]
pub struct CreateRecurringState {
    /// The database connection for managing recurring transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateRecurringState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating a recurring transaction.
#[derive(Debug, Deserialize)]
pub struct RecurringForm {
    /// The description copied onto generated transactions.
    pub description: String,
    /// The category generated transactions are filed under.
    pub category_id: CategoryId,
    /// The account generated transactions reference.
    #[serde(default)]
    pub account_id: Option<AccountId>,
    /// The amount of each generated transaction.
    pub amount: f64,
    /// Whether generated transactions are income or expenses.
    pub kind: TransactionKind,
    /// How often a new transaction is due.
    pub frequency: Frequency,
    /// The date the schedule starts from.
    pub start_date: Date,
    /// The date after which no more transactions are generated.
    #[serde(default)]
    pub end_date: Option<Date>,
}

/// A route handler for creating a new recurring transaction, redirects to
/// the recurring view on success.
pub async fn create_recurring_endpoint(
    State(state): State<CreateRecurringState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<RecurringForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let new_recurring = NewRecurringTransaction {
        user_id,
        category_id: form.category_id,
        account_id: form.account_id,
        amount: form.amount,
        kind: form.kind,
        frequency: form.frequency,
        start_date: form.start_date,
        end_date: form.end_date,
        description: form.description,
    };

    if let Err(error) = create_recurring_transaction(new_recurring, &connection) {
        tracing::error!("could not create recurring transaction: {error}");

        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::RECURRING_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use time::macros::date;

    use crate::{
        category::{CategoryKind, CategoryName, NewCategory, create_category},
        recurring::{
            Frequency,
            core::list_recurring_transactions,
            create_endpoint::{CreateRecurringState, RecurringForm, create_recurring_endpoint},
        },
        transaction::{TransactionKind, test_utils::get_test_connection},
    };

    #[tokio::test]
    async fn can_create_recurring_transaction() {
        let (conn, user_id) = get_test_connection();
        let category = create_category(
            NewCategory {
                user_id: Some(user_id),
                name: CategoryName::new_unchecked("Rent"),
                kind: CategoryKind::Expense,
            },
            &conn,
        )
        .unwrap();
        let state = CreateRecurringState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = create_recurring_endpoint(
            State(state.clone()),
            Extension(user_id),
            Form(RecurringForm {
                description: "Rent".to_owned(),
                category_id: category.id,
                account_id: None,
                amount: 1200.0,
                kind: TransactionKind::Expense,
                frequency: Frequency::Monthly,
                start_date: date!(2023 - 01 - 01),
                end_date: None,
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let connection = state.db_connection.lock().unwrap();
        let items = list_recurring_transactions(user_id, &connection).unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0].recurring.is_active);
        assert_eq!(items[0].recurring.last_generated_date, None);
    }
}
