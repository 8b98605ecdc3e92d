//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{delete, get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    account::{
        create_account_endpoint, delete_account_endpoint, edit_account_endpoint,
        get_accounts_page, get_edit_account_page,
    },
    auth::{auth_guard, auth_guard_hx},
    bill::{
        create_bill_endpoint, delete_bill_endpoint, edit_bill_endpoint, get_bills_page,
        get_edit_bill_page, mark_bill_paid_endpoint,
    },
    budget::{
        delete_budget_endpoint, edit_budget_endpoint, get_budgets_page, get_edit_budget_page,
        move_to_savings_endpoint, upsert_budget_endpoint,
    },
    category::{create_category_endpoint, delete_category_endpoint, get_categories_page},
    dashboard::get_dashboard_page,
    endpoints,
    forgot_password::{get_forgot_password_page, post_forgot_password},
    internal_server_error::get_internal_server_error_page,
    log_in::{get_log_in_page, post_log_in},
    log_out::get_log_out,
    not_found::get_404_not_found,
    notification::{
        delete_notification_endpoint, get_notifications_page, mark_notification_read_endpoint,
    },
    profile::{
        change_password_endpoint, delete_profile_endpoint, get_profile_page,
        update_currency_endpoint,
    },
    recurring::{
        create_recurring_endpoint, edit_recurring_endpoint, generate_recurring_endpoint,
        get_edit_recurring_page, get_recurring_page,
    },
    register_user::{get_register_page, register_user},
    savings::{
        contribute_endpoint, create_goal_endpoint, delete_savings_endpoint,
        edit_savings_endpoint, get_edit_savings_page, get_savings_history_page, get_savings_page,
    },
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, edit_transaction_endpoint,
        export_transactions_endpoint, get_create_transaction_page, get_edit_transaction_page,
        get_transactions_page, upload_receipt_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::COFFEE, get(get_coffee))
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(
            endpoints::FORGOT_PASSWORD_VIEW,
            get(get_forgot_password_page),
        )
        .route(endpoints::FORGOT_PASSWORD_API, post(post_forgot_password))
        .route(endpoints::USERS, post(register_user))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::TRANSACTIONS_VIEW, get(get_transactions_page))
        .route(
            endpoints::NEW_TRANSACTION_VIEW,
            get(get_create_transaction_page),
        )
        .route(
            endpoints::EDIT_TRANSACTION_VIEW,
            get(get_edit_transaction_page),
        )
        .route(endpoints::ACCOUNTS_VIEW, get(get_accounts_page))
        .route(endpoints::EDIT_ACCOUNT_VIEW, get(get_edit_account_page))
        .route(endpoints::CATEGORIES_VIEW, get(get_categories_page))
        .route(endpoints::BUDGETS_VIEW, get(get_budgets_page))
        .route(endpoints::EDIT_BUDGET_VIEW, get(get_edit_budget_page))
        .route(endpoints::RECURRING_VIEW, get(get_recurring_page))
        .route(endpoints::EDIT_RECURRING_VIEW, get(get_edit_recurring_page))
        // Side-effecting read: expands due recurring transactions.
        .route(endpoints::GENERATE_RECURRING, get(generate_recurring_endpoint))
        // Side-effecting read: raises notifications for upcoming bills.
        .route(endpoints::BILLS_VIEW, get(get_bills_page))
        .route(endpoints::EDIT_BILL_VIEW, get(get_edit_bill_page))
        .route(endpoints::NOTIFICATIONS_VIEW, get(get_notifications_page))
        .route(endpoints::SAVINGS_VIEW, get(get_savings_page))
        .route(endpoints::EDIT_SAVINGS_VIEW, get(get_edit_savings_page))
        .route(
            endpoints::SAVINGS_HISTORY_VIEW,
            get(get_savings_history_page),
        )
        .route(endpoints::PROFILE_VIEW, get(get_profile_page))
        // Side-effecting read: sweeps budget remainders into savings.
        .route(endpoints::MOVE_TO_SAVINGS, get(move_to_savings_endpoint))
        // Plain (non-HTMX) form posts that respond with a file or redirect.
        .route(
            endpoints::EXPORT_TRANSACTIONS,
            post(export_transactions_endpoint),
        )
        .route(endpoints::TRANSACTION_RECEIPT, post(upload_receipt_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These POST/PUT/DELETE routes need to use the HX-REDIRECT header for auth redirects to work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(
                endpoints::TRANSACTIONS_API,
                post(create_transaction_endpoint),
            )
            .route(
                endpoints::TRANSACTION,
                put(edit_transaction_endpoint).delete(delete_transaction_endpoint),
            )
            .route(endpoints::ACCOUNTS_API, post(create_account_endpoint))
            .route(
                endpoints::ACCOUNT,
                put(edit_account_endpoint).delete(delete_account_endpoint),
            )
            .route(endpoints::CATEGORIES_API, post(create_category_endpoint))
            .route(endpoints::CATEGORY, delete(delete_category_endpoint))
            .route(endpoints::BUDGETS_API, post(upsert_budget_endpoint))
            .route(
                endpoints::BUDGET,
                put(edit_budget_endpoint).delete(delete_budget_endpoint),
            )
            .route(endpoints::RECURRING_API, post(create_recurring_endpoint))
            .route(endpoints::RECURRING, put(edit_recurring_endpoint))
            .route(endpoints::BILLS_API, post(create_bill_endpoint))
            .route(
                endpoints::BILL,
                put(edit_bill_endpoint).delete(delete_bill_endpoint),
            )
            .route(endpoints::MARK_BILL_PAID, post(mark_bill_paid_endpoint))
            .route(
                endpoints::MARK_NOTIFICATION_READ,
                post(mark_notification_read_endpoint),
            )
            .route(endpoints::NOTIFICATION, delete(delete_notification_endpoint))
            .route(endpoints::SAVINGS_API, post(create_goal_endpoint))
            .route(
                endpoints::SAVINGS_GOAL,
                put(edit_savings_endpoint).delete(delete_savings_endpoint),
            )
            .route(endpoints::CONTRIBUTE, post(contribute_endpoint))
            .route(endpoints::CHANGE_PASSWORD, post(change_password_endpoint))
            .route(endpoints::UPDATE_CURRENCY, post(update_currency_endpoint))
            .route(endpoints::DELETE_PROFILE, post(delete_profile_endpoint))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    let upload_dir = state.upload_dir.clone();

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .nest_service(endpoints::UPLOADS, ServeDir::new(upload_dir))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (StatusCode::IM_A_TEAPOT, Html("I'm a teapot")).into_response()
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}

#[cfg(test)]
mod root_route_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{endpoints, routing::get_index_page};

    #[tokio::test]
    async fn root_redirects_to_dashboard() {
        let response = get_index_page().await.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let location = response.headers().get("location").unwrap();
        assert_eq!(location, endpoints::DASHBOARD_VIEW);
    }
}

#[cfg(test)]
mod router_tests {
    use std::path::PathBuf;

    use axum_test::TestServer;
    use rusqlite::Connection;
    use scraper::{Html, Selector};

    use crate::{AppState, build_router, endpoints};

    fn get_test_server() -> TestServer {
        let connection =
            Connection::open_in_memory().expect("could not create in-memory SQLite database");
        let state = AppState::new(
            connection,
            "averylongsecretthatnobodyknows",
            "Etc/UTC",
            PathBuf::from("uploads/"),
        )
        .expect("could not create app state");

        TestServer::try_new(build_router(state)).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn log_in_page_renders_form() {
        let server = get_test_server();

        let response = server.get(endpoints::LOG_IN_VIEW).await;

        response.assert_status_ok();
        let document = Html::parse_document(&response.text());
        let email_selector = Selector::parse("input[name=email]").unwrap();
        let password_selector = Selector::parse("input[name=password]").unwrap();
        assert!(document.select(&email_selector).next().is_some());
        assert!(document.select(&password_selector).next().is_some());
    }

    #[tokio::test]
    async fn register_page_renders_form() {
        let server = get_test_server();

        let response = server.get(endpoints::REGISTER_VIEW).await;

        response.assert_status_ok();
        let document = Html::parse_document(&response.text());
        for field in ["full_name", "email", "password", "confirm_password", "recovery_hint"] {
            let selector = Selector::parse(&format!("input[name={field}]")).unwrap();
            assert!(
                document.select(&selector).next().is_some(),
                "registration form is missing the {field} input"
            );
        }
    }

    #[tokio::test]
    async fn protected_page_redirects_anonymous_users_to_log_in() {
        let server = get_test_server();

        let response = server.get(endpoints::TRANSACTIONS_VIEW).await;

        response.assert_status_see_other();
        let location = response.header("location");
        let location = location.to_str().unwrap();
        assert!(
            location.starts_with(endpoints::LOG_IN_VIEW),
            "got redirect to {location}, want the log-in page"
        );
    }

    #[tokio::test]
    async fn unknown_route_renders_404() {
        let server = get_test_server();

        let response = server.get("/definitely/not/a/route").await;

        response.assert_status_not_found();
    }
}
