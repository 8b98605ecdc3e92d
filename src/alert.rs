//! Alert messages for the user.
//!
//! Two mechanisms live here:
//! - [Alert]: an HTML fragment swapped into the page's alert container,
//!   used as the response to HTMX requests that fail (or succeed with a
//!   message).
//! - Flash messages: a one-shot cookie set by an endpoint and consumed by
//!   the next page render. Reading the message clears the cookie, so a
//!   message is shown at most once.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use maud::{Markup, html};

/// The name of the cookie that carries a one-shot flash message.
pub const FLASH_COOKIE: &str = "alert";

/// An alert message shown to the user in the page's alert container.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// Something worked and the user should know about it.
    Success {
        /// The headline text of the alert.
        message: String,
    },
    /// Something went wrong, with details on how to proceed.
    Error {
        /// The headline text of the alert.
        message: String,
        /// Further detail, e.g. how to fix the problem.
        details: String,
    },
    /// Something went wrong, no further detail available.
    ErrorSimple {
        /// The headline text of the alert.
        message: String,
    },
}

impl Alert {
    /// Render the alert as an out-of-band fragment targeting the alert
    /// container in the base page layout.
    pub fn into_html(self) -> Markup {
        let (banner_style, message, details) = match self {
            Alert::Success { message } => (SUCCESS_BANNER_STYLE, message, String::new()),
            Alert::Error { message, details } => (ERROR_BANNER_STYLE, message, details),
            Alert::ErrorSimple { message } => (ERROR_BANNER_STYLE, message, String::new()),
        };

        html!(
            div id="alert-container" hx-swap-oob="true" class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div class=(banner_style) role="alert"
                {
                    p class="font-medium" { (message) }

                    @if !details.is_empty() {
                        p { (details) }
                    }
                }
            }
        )
    }

    /// Convert the alert into an HTTP response with the given status code.
    pub fn into_response_with_status(self, status_code: StatusCode) -> Response {
        (status_code, self.into_html()).into_response()
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        let status_code = match self {
            Alert::Success { .. } => StatusCode::OK,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        self.into_response_with_status(status_code)
    }
}

const SUCCESS_BANNER_STYLE: &str = "p-4 mb-4 text-sm rounded border \
    text-green-800 bg-green-50 border-green-300 \
    dark:bg-gray-800 dark:text-green-400 dark:border-green-800";

const ERROR_BANNER_STYLE: &str = "p-4 mb-4 text-sm rounded border \
    text-red-800 bg-red-50 border-red-300 \
    dark:bg-gray-800 dark:text-red-400 dark:border-red-800";

/// Render a flash message as an inline banner near the top of a page.
pub fn flash_banner(message: &str) -> Markup {
    html!(
        div class=(SUCCESS_BANNER_STYLE) role="alert"
        {
            (message)
        }
    )
}

/// Store `message` in the flash cookie so the next page render can show it.
pub fn set_flash_message(jar: CookieJar, message: &str) -> CookieJar {
    jar.add(
        Cookie::build((FLASH_COOKIE, message.to_owned()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict),
    )
}

/// Take the flash message out of the cookie jar.
///
/// Reading the message removes the cookie, so each message is displayed at
/// most once.
pub fn take_flash_message(jar: CookieJar) -> (CookieJar, Option<String>) {
    match jar.get(FLASH_COOKIE) {
        Some(cookie) => {
            let message = cookie.value().to_owned();
            let mut removal = Cookie::from(FLASH_COOKIE);
            removal.set_path("/");

            (jar.remove(removal), Some(message))
        }
        None => (jar, None),
    }
}

#[cfg(test)]
mod flash_message_tests {
    use axum_extra::extract::CookieJar;

    use super::{FLASH_COOKIE, set_flash_message, take_flash_message};

    #[test]
    fn take_returns_message_and_clears_cookie() {
        let jar = set_flash_message(CookieJar::new(), "Budget exceeded for this category!");

        let (jar, message) = take_flash_message(jar);

        assert_eq!(
            message,
            Some("Budget exceeded for this category!".to_owned())
        );
        assert!(jar.get(FLASH_COOKIE).is_none());
    }

    #[test]
    fn take_returns_none_without_cookie() {
        let (_, message) = take_flash_message(CookieJar::new());

        assert_eq!(message, None);
    }

    #[test]
    fn second_take_returns_none() {
        let jar = set_flash_message(CookieJar::new(), "Registration successful! Please log in.");

        let (jar, first) = take_flash_message(jar);
        let (_, second) = take_flash_message(jar);

        assert!(first.is_some());
        assert_eq!(second, None);
    }
}

#[cfg(test)]
mod alert_tests {
    use axum::http::StatusCode;

    use super::Alert;

    #[test]
    fn error_alert_renders_message_and_details() {
        let markup = Alert::Error {
            message: "Could not update transaction".to_owned(),
            details: "Try again later.".to_owned(),
        }
        .into_html();

        let html = markup.into_string();
        assert!(html.contains("Could not update transaction"));
        assert!(html.contains("Try again later."));
    }

    #[test]
    fn response_uses_given_status() {
        let response = Alert::ErrorSimple {
            message: "nope".to_owned(),
        }
        .into_response_with_status(StatusCode::NOT_FOUND);

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
