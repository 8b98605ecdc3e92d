//! Pure date arithmetic for recurring transactions: when the next instance
//! of a template is due, and whether it should fire today.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use time::{Date, Duration};

/// How often a recurring transaction happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    /// A calendar month. The next occurrence is always the first day of the
    /// following month, regardless of month length.
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }
}

impl Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" => Ok(Frequency::Yearly),
            other => Err(format!("{other} is not a valid frequency")),
        }
    }
}

impl ToSql for Frequency {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Frequency {
    fn column_result(value: ValueRef) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// The date the next instance of a template is due, given the date the last
/// instance was generated (or the start date, if none was generated yet).
///
/// - daily: one day later
/// - weekly: seven days later
/// - monthly: the first day of the following month. The last date is
///   truncated to the first of its month before adding 32 days and
///   truncating again, so the result does not depend on month length.
/// - yearly: the same month and day one year later
///
/// Returns [None] when no valid next date exists (e.g. yearly from
/// February 29th into a non-leap year) or the date arithmetic overflows.
pub fn next_due_date(last: Date, frequency: Frequency) -> Option<Date> {
    match frequency {
        Frequency::Daily => last.checked_add(Duration::days(1)),
        Frequency::Weekly => last.checked_add(Duration::days(7)),
        Frequency::Monthly => {
            let first_of_month = last.replace_day(1).ok()?;
            let into_next_month = first_of_month.checked_add(Duration::days(32))?;
            into_next_month.replace_day(1).ok()
        }
        Frequency::Yearly => last.replace_year(last.year() + 1).ok(),
    }
}

/// Whether a template should fire today.
///
/// A template fires when its next due date has been reached and its end
/// date, if set, has not passed. At most one instance fires per check, no
/// matter how many periods have elapsed; missed periods are not back-filled.
pub fn should_generate(today: Date, next_due: Date, end_date: Option<Date>) -> bool {
    today >= next_due && end_date.is_none_or(|end_date| today <= end_date)
}

#[cfg(test)]
mod next_due_date_tests {
    use time::macros::date;

    use super::{Frequency, next_due_date};

    #[test]
    fn daily_advances_one_day() {
        assert_eq!(
            next_due_date(date!(2023 - 01 - 31), Frequency::Daily),
            Some(date!(2023 - 02 - 01))
        );
    }

    #[test]
    fn weekly_advances_seven_days() {
        assert_eq!(
            next_due_date(date!(2023 - 01 - 25), Frequency::Weekly),
            Some(date!(2023 - 02 - 01))
        );
    }

    #[test]
    fn monthly_from_end_of_month_lands_on_first_of_next() {
        // The truncate-to-first rule: the next occurrence after January 31st
        // is February 1st, not March 3rd.
        assert_eq!(
            next_due_date(date!(2023 - 01 - 31), Frequency::Monthly),
            Some(date!(2023 - 02 - 01))
        );
    }

    #[test]
    fn monthly_from_mid_month_lands_on_first_of_next() {
        assert_eq!(
            next_due_date(date!(2023 - 02 - 15), Frequency::Monthly),
            Some(date!(2023 - 03 - 01))
        );
    }

    #[test]
    fn monthly_from_december_rolls_into_next_year() {
        assert_eq!(
            next_due_date(date!(2023 - 12 - 31), Frequency::Monthly),
            Some(date!(2024 - 01 - 01))
        );
    }

    #[test]
    fn yearly_keeps_month_and_day() {
        assert_eq!(
            next_due_date(date!(2023 - 05 - 14), Frequency::Yearly),
            Some(date!(2024 - 05 - 14))
        );
    }

    #[test]
    fn yearly_from_leap_day_has_no_occurrence() {
        assert_eq!(next_due_date(date!(2024 - 02 - 29), Frequency::Yearly), None);
    }
}

#[cfg(test)]
mod should_generate_tests {
    use time::macros::date;

    use super::should_generate;

    #[test]
    fn fires_when_due_date_reached() {
        assert!(should_generate(
            date!(2023 - 02 - 01),
            date!(2023 - 02 - 01),
            None
        ));
    }

    #[test]
    fn fires_when_due_date_passed() {
        // Several periods may have elapsed; the caller still generates at
        // most one instance.
        assert!(should_generate(
            date!(2023 - 06 - 01),
            date!(2023 - 02 - 01),
            None
        ));
    }

    #[test]
    fn does_not_fire_before_due_date() {
        assert!(!should_generate(
            date!(2023 - 01 - 31),
            date!(2023 - 02 - 01),
            None
        ));
    }

    #[test]
    fn does_not_fire_after_end_date() {
        assert!(!should_generate(
            date!(2023 - 02 - 01),
            date!(2023 - 02 - 01),
            Some(date!(2023 - 01 - 15))
        ));
    }

    #[test]
    fn fires_on_end_date() {
        assert!(should_generate(
            date!(2023 - 02 - 01),
            date!(2023 - 02 - 01),
            Some(date!(2023 - 02 - 01))
        ));
    }
}
