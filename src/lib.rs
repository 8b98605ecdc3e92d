//! Pocketbook is a web app for tracking your income, expenses, budgets and
//! savings goals.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use time::Date;
use tokio::signal;

mod account;
mod alert;
mod app_state;
mod auth;
mod bill;
mod budget;
mod category;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod forgot_password;
mod html;
mod internal_server_error;
mod ledger;
mod log_in;
mod log_out;
mod logging;
mod navigation;
mod not_found;
mod notification;
mod password;
mod profile;
mod recurring;
mod register_user;
mod routing;
mod savings;
mod timezone;
mod transaction;
mod user;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use user::{User, UserID, get_user_by_email, update_password};

use crate::{
    alert::Alert,
    category::CategoryId,
    internal_server_error::{InternalServerErrorPageTemplate, render_internal_server_error},
    not_found::get_404_not_found_response,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid combination of email and password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The auth token cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// There was an error parsing the date in the cookie or creating the new
    /// expiry date time.
    ///
    /// Callers should pass in the original error as a string and the date
    /// string that caused the error.
    #[error("could not format expiry cookie date-time string \"{1}\": {0}")]
    InvalidDateFormat(String, String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The email used to register already belongs to a user.
    #[error("the email address is already registered")]
    EmailTaken,

    /// The category ID used to create a transaction or budget did not match a
    /// valid category.
    #[error("the category ID does not refer to a valid category")]
    InvalidCategory(Option<CategoryId>),

    /// An empty string was used to create a category name.
    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    /// A date in the future was used to create a transaction.
    ///
    /// Transactions record events that have already happened, therefore future
    /// dates are not allowed.
    #[error("{0} is a date in the future, which is not allowed")]
    FutureDate(Date),

    /// The multipart form could not be parsed as a receipt upload.
    #[error("Could not parse multipart form: {0}")]
    MultipartError(String),

    /// The uploaded file is not an accepted receipt type (png, jpg, jpeg or
    /// pdf).
    #[error("File is not an accepted receipt type")]
    NotReceipt,

    /// The uploaded receipt could not be written to the upload directory.
    #[error("could not save the uploaded file: {0}")]
    WriteFileError(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to delete a transaction that does not exist or belongs to
    /// another user
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a transaction that does not exist or belongs to
    /// another user
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete an account that does not exist
    #[error("tried to delete an account that is not in the database")]
    DeleteMissingAccount,

    /// Tried to update an account that does not exist
    #[error("tried to update an account that is not in the database")]
    UpdateMissingAccount,

    /// Tried to delete an account that still has transactions attached
    #[error("the account still has transactions linked to it")]
    AccountHasTransactions,

    /// Tried to delete a category that does not exist or is not owned by
    /// the requesting user
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// Tried to update a budget that does not exist
    #[error("tried to update a budget that is not in the database")]
    UpdateMissingBudget,

    /// Tried to delete a budget that does not exist
    #[error("tried to delete a budget that is not in the database")]
    DeleteMissingBudget,

    /// Tried to update a recurring transaction that does not exist
    #[error("tried to update a recurring transaction that is not in the database")]
    UpdateMissingRecurring,

    /// Tried to update a bill reminder that does not exist
    #[error("tried to update a bill reminder that is not in the database")]
    UpdateMissingBill,

    /// Tried to delete a bill reminder that does not exist
    #[error("tried to delete a bill reminder that is not in the database")]
    DeleteMissingBill,

    /// Tried to update a notification that does not exist
    #[error("tried to update a notification that is not in the database")]
    UpdateMissingNotification,

    /// Tried to delete a notification that does not exist
    #[error("tried to delete a notification that is not in the database")]
    DeleteMissingNotification,

    /// Tried to update a savings goal that does not exist
    #[error("tried to update a savings goal that is not in the database")]
    UpdateMissingGoal,

    /// Tried to delete a savings goal that does not exist
    #[error("tried to delete a savings goal that is not in the database")]
    DeleteMissingGoal,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::EmailTaken
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::InvalidTimezoneError(timezone) => {
                render_internal_server_error(InternalServerErrorPageTemplate {
                    description: "Invalid Timezone Settings",
                    fix: &format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                    ),
                })
            }
            Error::DatabaseLockError => render_internal_server_error(Default::default()),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                render_internal_server_error(Default::default())
            }
        }
    }
}

impl Error {
    fn into_alert_response(self) -> Response {
        match self {
            Error::InvalidTimezoneError(timezone) => Alert::Error {
                message: "Invalid Timezone Settings".to_owned(),
                details: format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response_with_status(StatusCode::INTERNAL_SERVER_ERROR),
            Error::FutureDate(date) => Alert::Error {
                message: "Invalid transaction date".to_owned(),
                details: format!(
                    "{date} is a date in the future, which is not allowed. Change the date to \
                    today or earlier."
                ),
            }
            .into_response_with_status(StatusCode::BAD_REQUEST),
            Error::InvalidCategory(category_id) => Alert::Error {
                message: "Invalid category ID".to_owned(),
                details: format!("Could not find a category with the ID {category_id:?}"),
            }
            .into_response_with_status(StatusCode::BAD_REQUEST),
            Error::NotReceipt => Alert::ErrorSimple {
                message: "Receipts must be a PNG, JPEG or PDF file.".to_owned(),
            }
            .into_response_with_status(StatusCode::BAD_REQUEST),
            Error::UpdateMissingTransaction => Alert::Error {
                message: "Could not update transaction".to_owned(),
                details: "The transaction could not be found.".to_owned(),
            }
            .into_response_with_status(StatusCode::NOT_FOUND),
            Error::DeleteMissingTransaction => Alert::Error {
                message: "Could not delete transaction".to_owned(),
                details: "The transaction could not be found. \
                    Try refreshing the page to see if the transaction has already been deleted."
                    .to_owned(),
            }
            .into_response_with_status(StatusCode::NOT_FOUND),
            Error::UpdateMissingAccount => Alert::Error {
                message: "Could not update account".to_owned(),
                details: "The account could not be found.".to_owned(),
            }
            .into_response_with_status(StatusCode::NOT_FOUND),
            Error::DeleteMissingAccount => Alert::Error {
                message: "Could not delete account".to_owned(),
                details: "The account could not be found. \
                    Try refreshing the page to see if the account has already been deleted."
                    .to_owned(),
            }
            .into_response_with_status(StatusCode::NOT_FOUND),
            Error::AccountHasTransactions => Alert::Error {
                message: "Could not delete account".to_owned(),
                details: "The account still has transactions linked to it. \
                    Delete or move those transactions first."
                    .to_owned(),
            }
            .into_response_with_status(StatusCode::BAD_REQUEST),
            Error::DeleteMissingCategory => Alert::Error {
                message: "Could not delete category".to_owned(),
                details: "The category could not be found, or it is a shared category."
                    .to_owned(),
            }
            .into_response_with_status(StatusCode::NOT_FOUND),
            Error::UpdateMissingBudget => Alert::Error {
                message: "Could not update budget".to_owned(),
                details: "The budget could not be found.".to_owned(),
            }
            .into_response_with_status(StatusCode::NOT_FOUND),
            Error::DeleteMissingBudget => Alert::Error {
                message: "Could not delete budget".to_owned(),
                details: "The budget could not be found. \
                    Try refreshing the page to see if the budget has already been deleted."
                    .to_owned(),
            }
            .into_response_with_status(StatusCode::NOT_FOUND),
            Error::UpdateMissingRecurring => Alert::Error {
                message: "Could not update recurring transaction".to_owned(),
                details: "The recurring transaction could not be found.".to_owned(),
            }
            .into_response_with_status(StatusCode::NOT_FOUND),
            Error::UpdateMissingBill => Alert::Error {
                message: "Could not update bill reminder".to_owned(),
                details: "The bill reminder could not be found.".to_owned(),
            }
            .into_response_with_status(StatusCode::NOT_FOUND),
            Error::DeleteMissingBill => Alert::Error {
                message: "Could not delete bill reminder".to_owned(),
                details: "The bill reminder could not be found. \
                    Try refreshing the page to see if the bill has already been deleted."
                    .to_owned(),
            }
            .into_response_with_status(StatusCode::NOT_FOUND),
            Error::UpdateMissingNotification => Alert::Error {
                message: "Could not update notification".to_owned(),
                details: "The notification could not be found.".to_owned(),
            }
            .into_response_with_status(StatusCode::NOT_FOUND),
            Error::DeleteMissingNotification => Alert::Error {
                message: "Could not delete notification".to_owned(),
                details: "The notification could not be found. \
                    Try refreshing the page to see if it has already been deleted."
                    .to_owned(),
            }
            .into_response_with_status(StatusCode::NOT_FOUND),
            Error::UpdateMissingGoal => Alert::Error {
                message: "Could not update savings goal".to_owned(),
                details: "The savings goal could not be found.".to_owned(),
            }
            .into_response_with_status(StatusCode::NOT_FOUND),
            Error::DeleteMissingGoal => Alert::Error {
                message: "Could not delete savings goal".to_owned(),
                details: "The savings goal could not be found. \
                    Try refreshing the page to see if it has already been deleted."
                    .to_owned(),
            }
            .into_response_with_status(StatusCode::NOT_FOUND),
            _ => Alert::Error {
                message: "Something went wrong".to_owned(),
                details: "An unexpected error occurred, check the server logs for more details."
                    .to_owned(),
            }
            .into_response_with_status(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}
