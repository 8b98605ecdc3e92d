//! Defines the endpoint for creating a new account.
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
    account::{NewAccount, core::create_account},
    endpoints,
    user::UserID,
};

/// The state needed to create an account.
#[derive(Debug, Clone)]
pub struct CreateAccountState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating an account.
#[derive(Debug, Deserialize)]
pub struct AccountForm {
    /// The account name.
    pub name: String,
    /// A free-form label such as "Checking" or "Savings".
    pub account_type: String,
    /// The opening balance in dollars.
    pub balance: f64,
}

/// A route handler for creating a new account, redirects to the accounts
/// view on success.
pub async fn create_account_endpoint(
    State(state): State<CreateAccountState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<AccountForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let new_account = NewAccount {
        user_id: Some(user_id),
        name: form.name,
        account_type: form.account_type,
        balance: form.balance,
    };

    if let Err(error) = create_account(new_account, &connection) {
        tracing::error!("could not create account: {error}");

        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::ACCOUNTS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, body::Body, extract::State, http::Response, response::IntoResponse};
    use axum_extra::extract::Form;
    use axum_htmx::HX_REDIRECT;
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        PasswordHash,
        account::{
            create_endpoint::{AccountForm, CreateAccountState},
            create_account_endpoint, get_accounts_for_user,
        },
        db::initialize,
        endpoints,
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
    async fn can_create_account() {
        let (conn, user_id) = get_test_connection();
        let state = CreateAccountState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let form = AccountForm {
            name: "Test Account".to_owned(),
            account_type: "Checking".to_owned(),
            balance: 1000.0,
        };

        let response = create_account_endpoint(State(state.clone()), Extension(user_id), Form(form))
            .await
            .into_response();

        assert_redirects_to_accounts_view(response);

        let connection = state.db_connection.lock().unwrap();
        let accounts = get_accounts_for_user(user_id, &connection).unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].name, "Test Account");
        assert_eq!(accounts[0].balance, 1000.0);
        assert_eq!(accounts[0].user_id, Some(user_id));
    }

    #[track_caller]
    fn assert_redirects_to_accounts_view(response: Response<Body>) {
        let location = response
            .headers()
            .get(HX_REDIRECT)
            .expect("expected response to have the header hx-redirect");
        assert_eq!(
            location,
            endpoints::ACCOUNTS_VIEW,
            "got redirect to {location:?}, want redirect to {}",
            endpoints::ACCOUNTS_VIEW
        );
    }
}
