//! Pure aggregation helpers for the dashboard page.

use crate::recurring::RecurringTransaction;

/// How much of the month's total budget has been used, as a percentage
/// rounded to one decimal place, and the amount remaining.
///
/// Returns zero for both when no budget is set, so a fresh account does
/// not show a division by zero.
pub fn budget_usage(total_budget: f64, total_expenses: f64) -> (f64, f64) {
    if total_budget > 0.0 {
        let percent = ((total_expenses / total_budget) * 1000.0).round() / 10.0;
        (percent, total_budget - total_expenses)
    } else {
        (0.0, 0.0)
    }
}

/// The templates most likely to fire next: those that have never generated
/// an instance first, then by earliest start date.
pub fn top_upcoming_recurring(
    mut templates: Vec<RecurringTransaction>,
    limit: usize,
) -> Vec<RecurringTransaction> {
    templates.sort_by_key(|template| (template.last_generated_date.is_some(), template.start_date));
    templates.truncate(limit);

    templates
}

#[cfg(test)]
mod budget_usage_tests {
    use super::budget_usage;

    #[test]
    fn no_budget_reads_as_zero() {
        assert_eq!(budget_usage(0.0, 123.0), (0.0, 0.0));
    }

    #[test]
    fn usage_is_rounded_to_one_decimal() {
        let (percent, remaining) = budget_usage(300.0, 100.0);

        assert_eq!(percent, 33.3);
        assert_eq!(remaining, 200.0);
    }

    #[test]
    fn overspending_exceeds_one_hundred_percent() {
        let (percent, remaining) = budget_usage(100.0, 150.0);

        assert_eq!(percent, 150.0);
        assert_eq!(remaining, -50.0);
    }
}
