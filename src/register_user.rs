//! The registration page and the endpoint that creates new users.
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
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword,
    account::{NewAccount, create_account},
    alert::set_flash_message,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, loading_spinner,
        log_in_register, password_input, text_input,
    },
    timezone::get_local_offset,
    user::{NewUser, create_user},
};

/// The minimum number of characters the password should have to be considered valid on the client side (server-side validation is done on top of this validation).
const PASSWORD_INPUT_MIN_LENGTH: u8 = 14;

pub fn confirm_password_input(min_length: u8, error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label
                for="confirm-password"
                class=(FORM_LABEL_STYLE)
            {
                "Confirm Password"
            }

            input
                type="password"
                name="confirm_password"
                id="confirm-password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                minlength=(min_length)
                autofocus[error_message.is_some()]
            ;

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }
        }

    }
}

struct RegistrationFormValues<'a> {
    full_name: &'a str,
    email: &'a str,
    recovery_hint: &'a str,
    password_error_message: Option<&'a str>,
    confirm_password_error_message: Option<&'a str>,
    email_error_message: Option<&'a str>,
}

impl Default for RegistrationFormValues<'_> {
    fn default() -> Self {
        Self {
            full_name: "",
            email: "",
            recovery_hint: "",
            password_error_message: None,
            confirm_password_error_message: None,
            email_error_message: None,
        }
    }
}

fn registration_form(values: &RegistrationFormValues) -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            hx-indicator="#indicator"
            hx-disabled-elt="#password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            (text_input("full_name", "Full name", "text", values.full_name))

            div
            {
                (text_input("email", "Email", "email", values.email))

                @if let Some(error_message) = values.email_error_message
                {
                    p class="text-red-500 text-base" { (error_message) }
                }
            }

            (password_input("", PASSWORD_INPUT_MIN_LENGTH, values.password_error_message))
            (confirm_password_input(PASSWORD_INPUT_MIN_LENGTH, values.confirm_password_error_message))

            div
            {
                (text_input(
                    "recovery_hint",
                    "Recovery hint (used to reset your password)",
                    "text",
                    values.recovery_hint,
                ))
            }

            button
                type="submit" id="submit-button" tabindex="0"
                class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Create Account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "

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

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let registration_form = registration_form(&RegistrationFormValues::default());
    let content = log_in_register("Create your account", &registration_form);
    base("Register", &[], &content).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for creating users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for registering a user.
#[derive(Serialize, Deserialize)]
pub struct RegisterForm {
    /// The user's display name.
    pub full_name: String,
    /// The email the user will log in with.
    pub email: String,
    /// The password to create.
    pub password: String,
    /// A repeat of the password to catch typos.
    pub confirm_password: String,
    /// The answer the user must repeat to reset their password.
    pub recovery_hint: String,
}

/// Create a new user along with their default account, then redirect to
/// the log-in page with a confirmation flash message.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: CookieJar,
    Form(user_data): Form<RegisterForm>,
) -> Response {
    let form_values = RegistrationFormValues {
        full_name: &user_data.full_name,
        email: &user_data.email,
        recovery_hint: &user_data.recovery_hint,
        ..Default::default()
    };

    if user_data.full_name.trim().is_empty()
        || user_data.email.trim().is_empty()
        || user_data.recovery_hint.trim().is_empty()
    {
        return registration_form(&RegistrationFormValues {
            email_error_message: Some("All fields are required."),
            ..form_values
        })
        .into_response();
    }

    let validated_password = match ValidatedPassword::new(&user_data.password) {
        Ok(password) => password,
        Err(error) => {
            return registration_form(&RegistrationFormValues {
                password_error_message: Some(error.to_string().as_ref()),
                ..form_values
            })
            .into_response();
        }
    };

    if user_data.password != user_data.confirm_password {
        return registration_form(&RegistrationFormValues {
            confirm_password_error_message: Some("Passwords do not match"),
            ..form_values
        })
        .into_response();
    }

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(password_hash) => password_hash,
        Err(error) => {
            tracing::error!("Error hashing password: {error}");
            return error.into_alert_response();
        }
    };

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        return Error::InvalidTimezoneError(state.local_timezone).into_alert_response();
    };
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_user_with_default_account(&user_data, password_hash, today, &connection) {
        Ok(()) => {}
        Err(Error::EmailTaken) => {
            return registration_form(&RegistrationFormValues {
                email_error_message: Some("This email is already registered."),
                ..form_values
            })
            .into_response();
        }
        Err(error) => {
            tracing::error!("Could not register user: {error}");
            return error.into_alert_response();
        }
    }

    let jar = set_flash_message(jar, "Registration successful! Please log in.");

    (
        jar,
        HxRedirect(endpoints::LOG_IN_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// Insert the user and their "Default Account" within one database
/// transaction.
fn create_user_with_default_account(
    user_data: &RegisterForm,
    password_hash: PasswordHash,
    today: time::Date,
    connection: &Connection,
) -> Result<(), Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let user = create_user(
        NewUser {
            full_name: user_data.full_name.trim().to_owned(),
            email: user_data.email.trim().to_owned(),
            password_hash,
            recovery_hint: user_data.recovery_hint.trim().to_owned(),
            created_at: today,
        },
        &sql_transaction,
    )?;

    create_account(
        NewAccount {
            user_id: Some(user.id),
            name: "Default Account".to_owned(),
            account_type: "General".to_owned(),
            balance: 0.0,
        },
        &sql_transaction,
    )?;

    sql_transaction.commit()?;

    Ok(())
}
