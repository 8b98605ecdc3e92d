//! Summary cards shown at the top of the dashboard.

use maud::{Markup, html};

use crate::html::format_currency;

/// The figures shown in the dashboard's summary cards.
pub(super) struct SummaryFigures {
    /// The total balance across the user's accounts.
    pub total_balance: f64,
    /// Income recorded so far this month.
    pub total_income: f64,
    /// Expenses recorded so far this month.
    pub total_expenses: f64,
    /// The user's average savings goal progress in percent.
    pub savings_progress: f64,
    /// How much of this month's total budget has been used, in percent.
    pub budget_used_percent: f64,
    /// How much of this month's total budget remains.
    pub remaining_budget: f64,
}

fn card(label: &str, value: &str) -> Markup {
    html!(
        div class="rounded border border-gray-200 bg-white px-4 py-3 text-center
            dark:border-gray-700 dark:bg-gray-800"
        {
            p class="text-2xl font-bold" { (value) }
            p class="text-sm text-gray-500 dark:text-gray-400" { (label) }
        }
    )
}

/// Render the row of summary cards.
pub(super) fn summary_cards(figures: &SummaryFigures) -> Markup {
    html!(
        section class="grid grid-cols-2 lg:grid-cols-6 gap-4 w-full"
        {
            (card("Total balance", &format_currency(figures.total_balance)))
            (card("Income this month", &format_currency(figures.total_income)))
            (card("Expenses this month", &format_currency(figures.total_expenses)))
            (card(
                "Savings progress",
                &format!("{:.0}%", figures.savings_progress),
            ))
            (card(
                "Budget used",
                &format!("{:.1}%", figures.budget_used_percent),
            ))
            (card(
                "Budget remaining",
                &format_currency(figures.remaining_budget),
            ))
        }
    )
}
