//! The page and endpoint for resetting a forgotten password with the
//! recovery hint chosen at registration.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{CookieJar, Form};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword,
    alert::set_flash_message,
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, base, log_in_register, password_input, text_input},
    user::{get_user_by_email, update_password},
};

fn forgot_password_form(email: &str, error_message: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::FORGOT_PASSWORD_API)
            class="space-y-4 md:space-y-6"
        {
            (text_input("email", "Email", "email", email))

            (text_input("hint", "Recovery hint", "text", ""))

            (password_input("", 0, error_message))

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Reset password" }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Remembered it after all? "

                a
                    href=(endpoints::LOG_IN_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                    "Log in here"
                }
            }
        }
    }
}

/// Display the forgot password page.
pub async fn get_forgot_password_page() -> Response {
    let form = forgot_password_form("", None);
    let content = log_in_register("Reset your password", &form);
    base("Forgot Password", &[], &content).into_response()
}

/// The state needed to reset a password.
#[derive(Debug, Clone)]
pub struct ForgotPasswordState {
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ForgotPasswordState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for a password reset.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    /// The email of the account to reset.
    pub email: String,
    /// The recovery hint chosen at registration.
    pub hint: String,
    /// The replacement password.
    pub password: String,
}

/// Reset a user's password when the recovery hint matches.
///
/// The hint comparison ignores case and surrounding whitespace. On success
/// the user is redirected to the log-in page with a flash message.
pub async fn post_forgot_password(
    State(state): State<ForgotPasswordState>,
    jar: CookieJar,
    Form(form): Form<ForgotPasswordForm>,
) -> Response {
    if form.email.trim().is_empty() || form.hint.trim().is_empty() {
        return forgot_password_form(&form.email, Some("All fields are required."))
            .into_response();
    }

    let validated_password = match ValidatedPassword::new(&form.password) {
        Ok(password) => password,
        Err(error) => {
            return forgot_password_form(&form.email, Some(error.to_string().as_ref()))
                .into_response();
        }
    };

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(password_hash) => password_hash,
        Err(error) => {
            tracing::error!("Error hashing password: {error}");
            return error.into_alert_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let user = match get_user_by_email(form.email.trim(), &connection) {
        Ok(user) => user,
        Err(Error::NotFound) => {
            return forgot_password_form(&form.email, Some("User not found.")).into_response();
        }
        Err(error) => {
            tracing::error!("Could not look up user for password reset: {error}");
            return error.into_alert_response();
        }
    };

    if !user
        .recovery_hint
        .trim()
        .eq_ignore_ascii_case(form.hint.trim())
    {
        return forgot_password_form(&form.email, Some("Incorrect recovery hint."))
            .into_response();
    }

    if let Err(error) = update_password(user.id, &password_hash, &connection) {
        tracing::error!("Could not reset password: {error}");
        return error.into_alert_response();
    }

    let jar = set_flash_message(jar, "Password reset successful. Please log in.");

    (
        jar,
        HxRedirect(endpoints::LOG_IN_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
