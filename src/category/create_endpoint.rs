//! Defines the endpoint for creating a new category.

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
    category::{CategoryKind, CategoryName, NewCategory, core::create_category},
    endpoints,
    user::UserID,
};

/// The state needed to create a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating a category.
#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    /// The display name of the category.
    pub name: String,
    /// Whether the category groups income or expenses.
    pub kind: CategoryKind,
}

/// A route handler for creating a new category, redirects to the categories
/// view on success.
pub async fn create_category_endpoint(
    State(state): State<CreateCategoryState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<CategoryForm>,
) -> Response {
    let name = match CategoryName::new(&form.name) {
        Ok(name) => name,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let new_category = NewCategory {
        user_id: Some(user_id),
        name,
        kind: form.kind,
    };

    if let Err(error) = create_category(new_category, &connection) {
        tracing::error!("could not create category: {error}");

        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
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
    use time::macros::date;

    use crate::{
        PasswordHash,
        category::{
            CategoryKind,
            create_endpoint::{CategoryForm, CreateCategoryState, create_category_endpoint},
            get_selectable_categories,
        },
        db::initialize,
        user::{NewUser, UserID, create_user},
    };

    fn get_test_connection() -> (Connection, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let user = create_user(
            NewUser {
                full_name: "Test User".to_owned(),
                email: "test@example.com".to_owned(),
                password_hash: PasswordHash::new_unchecked("hunter2"),
                recovery_hint: "test hint".to_owned(),
                created_at: date!(2023 - 01 - 01),
            },
            &conn,
        )
        .unwrap();

        (conn, user.id)
    }

    #[tokio::test]
    async fn can_create_category() {
        let (conn, user_id) = get_test_connection();
        let state = CreateCategoryState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let form = CategoryForm {
            name: "Groceries".to_owned(),
            kind: CategoryKind::Expense,
        };

        let response =
            create_category_endpoint(State(state.clone()), Extension(user_id), Form(form)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let connection = state.db_connection.lock().unwrap();
        let categories = get_selectable_categories(user_id, &connection).unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name.as_ref(), "Groceries");
    }

    #[tokio::test]
    async fn rejects_empty_name() {
        let (conn, user_id) = get_test_connection();
        let state = CreateCategoryState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let form = CategoryForm {
            name: "   ".to_owned(),
            kind: CategoryKind::Expense,
        };

        let response =
            create_category_endpoint(State(state.clone()), Extension(user_id), Form(form)).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let connection = state.db_connection.lock().unwrap();
        let categories = get_selectable_categories(user_id, &connection).unwrap();
        assert!(categories.is_empty());
    }
}
