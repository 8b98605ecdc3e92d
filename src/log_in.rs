//! This file defines the routes for displaying the log-in page and handling log-in requests.
//! The auth module handles the lower level authentication and cookie auth logic.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{CookieJar, Form, PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error,
    alert::{flash_banner, take_flash_message},
    auth::{normalize_redirect_url, set_auth_cookie},
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, base, loading_spinner, log_in_register, password_input, text_input},
    timezone::get_local_offset,
    user::{User, get_user_by_email},
};

fn log_in_form(
    email: &str,
    error_message: Option<&str>,
    redirect_url: Option<&str>,
) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN_API)
            hx-indicator="#indicator"
            hx-disabled-elt="#password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            @if let Some(redirect_url) = redirect_url {
                input type="hidden" name="redirect_url" value=(redirect_url);
            }

            (text_input("email", "Email", "email", email))

            (password_input("", 0, error_message))

            div class="flex items-center gap-x-3"
            {
                input
                    type="checkbox"
                    name="remember_me"
                    id="remember_me"
                    tabindex="0"
                    class="rounded-xs";

                label
                    for="remember_me"
                    class="block text-sm font-medium text-gray-900 dark:text-white"
                {
                    "Keep me logged in for one week"
                }
            }

            button
                type="submit" id="submit-button" tabindex="0"
                class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Log in"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Forgot your password? "

                a
                    href=(endpoints::FORGOT_PASSWORD_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                  "Reset it here"
                }
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400" {
                "Don't have an account? "
                a
                    href=(endpoints::REGISTER_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                  "Register here"
                }
            }
        }
    }
}

fn parse_redirect_url(raw_url: Option<&str>, source: &str) -> Option<String> {
    match raw_url.and_then(normalize_redirect_url) {
        Some(redirect_url) => Some(redirect_url),
        None => {
            if let Some(redirect_url) = raw_url {
                tracing::warn!("Invalid redirect URL from {source}: {redirect_url}");
            }
            None
        }
    }
}

/// The query parameters for the log-in page.
#[derive(Debug, Default, Deserialize)]
pub struct RedirectQuery {
    /// Where to send the user after a successful log-in.
    #[serde(default)]
    pub redirect_url: Option<String>,
}

/// Display the log-in page.
///
/// A pending flash message (e.g. "Registration successful") is shown once
/// above the form.
pub async fn get_log_in_page(Query(query): Query<RedirectQuery>, jar: CookieJar) -> Response {
    let (jar, flash_message) = take_flash_message(jar);
    let redirect_url = parse_redirect_url(query.redirect_url.as_deref(), "log-in query");

    let log_in_form = log_in_form("", None, redirect_url.as_deref());
    let form_with_flash = html! {
        @if let Some(message) = &flash_message {
            (flash_banner(message))
        }

        (log_in_form)
    };
    let content = log_in_register("Log in to your account", &form_with_flash);

    (jar, base("Log In", &[], &content)).into_response()
}

/// How long the auth cookie should last if the user selects "remember me" at log-in.
const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Invalid email or password.";

/// The form data for a log-in request.
#[derive(Debug, Deserialize)]
pub struct LogInData {
    /// The email the user registered with.
    pub email: String,
    /// The user's password.
    pub password: String,
    /// Present when the user ticked "remember me".
    #[serde(default)]
    pub remember_me: Option<String>,
    /// Where to send the user after a successful log-in.
    #[serde(default)]
    pub redirect_url: Option<String>,
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, the auth cookie set and the client is redirected to the dashboard page.
/// Otherwise, the form is returned with an error message explaining the problem.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The email and password combination is not correct.
/// - An internal error occurred when verifying the password.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<LogInData>,
) -> Response {
    let redirect_url = parse_redirect_url(user_data.redirect_url.as_deref(), "log-in form");
    let redirect_url = redirect_url.as_deref();

    let user: User = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return log_in_form(
                    &user_data.email,
                    Some("An internal error occurred. Please try again later."),
                    redirect_url,
                )
                .into_response();
            }
        };

        match get_user_by_email(&user_data.email, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => {
                // Same error as a wrong password so the response does not
                // reveal which emails are registered.
                return log_in_form(
                    &user_data.email,
                    Some(INVALID_CREDENTIALS_ERROR_MSG),
                    redirect_url,
                )
                .into_response();
            }
            Err(error) => {
                tracing::error!("Unhandled error while verifying credentials: {error}");
                return log_in_form(
                    &user_data.email,
                    Some("An internal error occurred. Please try again later."),
                    redirect_url,
                )
                .into_response();
            }
        }
    };

    let is_password_valid = match user.password_hash.verify(&user_data.password) {
        Ok(is_password_valid) => is_password_valid,
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return log_in_form(
                &user_data.email,
                Some("An internal error occurred. Please try again later."),
                redirect_url,
            )
            .into_response();
        }
    };

    if !is_password_valid {
        return log_in_form(
            &user_data.email,
            Some(INVALID_CREDENTIALS_ERROR_MSG),
            redirect_url,
        )
        .into_response();
    }

    let cookie_duration = if user_data.remember_me.is_some() {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    let local_timezone = match get_local_offset(&state.local_timezone) {
        Some(offset) => offset,
        None => return Error::InvalidTimezoneError(state.local_timezone).into_response(),
    };

    let redirect_url = redirect_url.unwrap_or(endpoints::DASHBOARD_VIEW);

    set_auth_cookie(jar.clone(), user.id, cookie_duration, local_timezone)
        .map(|updated_jar| {
            (
                updated_jar,
                HxRedirect(redirect_url.to_owned()),
                StatusCode::SEE_OTHER,
            )
        })
        .map_err(|err| {
            tracing::error!("Error setting auth cookie: {err}");
            (
                HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        })
        .into_response()
}

#[cfg(test)]
mod log_in_tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};
    use axum_extra::extract::{Form, PrivateCookieJar, cookie::Key};
    use axum_htmx::HX_REDIRECT;
    use rusqlite::Connection;
    use sha2::{Digest, Sha512};
    use time::macros::date;

    use crate::{
        PasswordHash,
        auth::DEFAULT_COOKIE_DURATION,
        db::initialize,
        endpoints,
        log_in::{LogInData, LoginState, post_log_in},
        user::{NewUser, create_user},
    };

    /// Use the minimum bcrypt cost to keep the test fast.
    const TEST_COST: u32 = 4;

    fn get_test_state() -> LoginState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        create_user(
            NewUser {
                full_name: "Test User".to_owned(),
                email: "test@example.com".to_owned(),
                password_hash: PasswordHash::new_unchecked(
                    &bcrypt::hash("averylongpassword1", TEST_COST).unwrap(),
                ),
                recovery_hint: "test hint".to_owned(),
                created_at: date!(2023 - 01 - 01),
            },
            &conn,
        )
        .unwrap();

        LoginState {
            cookie_key: Key::from(&Sha512::digest("foobar")),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    fn get_jar(state: &LoginState) -> PrivateCookieJar {
        PrivateCookieJar::new(state.cookie_key.clone())
    }

    #[tokio::test]
    async fn valid_credentials_redirect_to_dashboard() {
        let state = get_test_state();
        let jar = get_jar(&state);

        let response = post_log_in(
            State(state),
            jar,
            Form(LogInData {
                email: "test@example.com".to_owned(),
                password: "averylongpassword1".to_owned(),
                remember_me: None,
                redirect_url: None,
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(HX_REDIRECT).unwrap(),
            endpoints::DASHBOARD_VIEW
        );
    }

    #[tokio::test]
    async fn wrong_password_rerenders_form() {
        let state = get_test_state();
        let jar = get_jar(&state);

        let response = post_log_in(
            State(state),
            jar,
            Form(LogInData {
                email: "test@example.com".to_owned(),
                password: "wrong password".to_owned(),
                remember_me: None,
                redirect_url: None,
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(HX_REDIRECT).is_none());
    }

    #[tokio::test]
    async fn unknown_email_gets_same_error_as_wrong_password() {
        let state = get_test_state();
        let jar = get_jar(&state);

        let response = post_log_in(
            State(state),
            jar,
            Form(LogInData {
                email: "nobody@example.com".to_owned(),
                password: "averylongpassword1".to_owned(),
                remember_me: None,
                redirect_url: None,
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains(super::INVALID_CREDENTIALS_ERROR_MSG));
    }
}
