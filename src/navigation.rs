//! This file defines the templates and a convenience function for creating the navigation bar.

use maud::{Markup, html};

use crate::endpoints;

/// Template for a link in the navigation bar.
///
/// It will change appearance if `is_current` is set to
/// `true`. Only one link should be set as active at any one time.
#[derive(Clone)]
struct Link<'a> {
    url: &'a str,
    title: &'a str,
    is_current: bool,
}

impl Link<'_> {
    fn into_html(self) -> Markup {
        let style = if self.is_current {
            "block py-2 px-3 text-white bg-blue-700 rounded-sm lg:bg-transparent
        lg:text-blue-700 lg:p-0 dark:text-white lg:dark:text-blue-500"
        } else {
            "block py-2 px-3 text-gray-900 rounded-sm hover:bg-gray-100
        lg:hover:bg-transparent lg:border-0 lg:hover:text-blue-700 lg:p-0
        dark:text-white lg:dark:hover:text-blue-500 dark:hover:bg-gray-700
        dark:hover:text-white lg:dark:hover:bg-transparent"
        };

        html!( li { a href=(self.url) class=(style) { (self.title) } } )
    }
}

pub struct NavBar<'a> {
    links: Vec<Link<'a>>,
}

impl NavBar<'_> {
    /// Get the navigation bar.
    ///
    /// If a link matches `active_endpoint`, then that link will be
    /// marked as active and displayed differently in the HTML.
    pub fn new(active_endpoint: &str) -> NavBar<'_> {
        let entries = [
            (endpoints::DASHBOARD_VIEW, "Dashboard"),
            (endpoints::TRANSACTIONS_VIEW, "Transactions"),
            (endpoints::BUDGETS_VIEW, "Budgets"),
            (endpoints::RECURRING_VIEW, "Recurring"),
            (endpoints::BILLS_VIEW, "Bills"),
            (endpoints::SAVINGS_VIEW, "Savings"),
            (endpoints::NOTIFICATIONS_VIEW, "Notifications"),
            (endpoints::ACCOUNTS_VIEW, "Accounts"),
            (endpoints::CATEGORIES_VIEW, "Categories"),
            (endpoints::PROFILE_VIEW, "Profile"),
            (endpoints::LOG_OUT, "Log out"),
        ];

        let links = entries
            .into_iter()
            .map(|(url, title)| Link {
                url,
                title,
                is_current: active_endpoint == url,
            })
            .collect();

        NavBar { links }
    }

    pub fn into_html(self) -> Markup {
        html!(
            nav class="bg-white border-gray-200 dark:bg-gray-900"
            {
                div class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4"
                {
                    a href=(endpoints::DASHBOARD_VIEW) class="flex items-center space-x-3"
                    {
                        img src="/static/favicon-32x32.png" class="h-8" alt="Pocketbook logo";
                        span class="self-center text-2xl font-semibold whitespace-nowrap dark:text-white"
                        {
                            "Pocketbook"
                        }
                    }

                    div class="w-full lg:block lg:w-auto"
                    {
                        ul class="font-medium flex flex-col p-4 lg:p-0 mt-4 border
                            border-gray-100 rounded-lg bg-gray-50 lg:flex-row
                            lg:space-x-6 rtl:space-x-reverse lg:mt-0 lg:border-0
                            lg:bg-white dark:bg-gray-800 lg:dark:bg-gray-900
                            dark:border-gray-700"
                        {
                            @for link in self.links {
                                (link.into_html())
                            }
                        }
                    }
                }
            }
        )
    }
}
