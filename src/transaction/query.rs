//! Database query helpers for the transactions page and the monthly
//! aggregates used by budgets and the dashboard.

use rusqlite::{Connection, Row, ToSql, params};
use time::{Date, Month};

use crate::{
    Error,
    category::CategoryId,
    database_id::TransactionId,
    transaction::{Transaction, TransactionKind, core::map_transaction_row},
    user::UserID,
};

/// Optional filters applied to the transactions listing.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TransactionFilters {
    /// Only include transactions of this kind.
    pub kind: Option<TransactionKind>,
    /// Only include transactions on or after this date. Applied together
    /// with `to`.
    pub from: Option<Date>,
    /// Only include transactions on or before this date. Applied together
    /// with `from`.
    pub to: Option<Date>,
    /// Only include transactions whose description contains this text.
    pub keyword: Option<String>,
}

/// A transaction joined with the display names of its category and account.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionListItem {
    /// The transaction itself.
    pub transaction: Transaction,
    /// The name of the category the transaction is filed under.
    pub category_name: Option<String>,
    /// The name of the account the transaction applies to.
    pub account_name: Option<String>,
}

fn map_list_item(row: &Row) -> Result<TransactionListItem, rusqlite::Error> {
    let transaction = map_transaction_row(row)?;

    Ok(TransactionListItem {
        transaction,
        category_name: row.get(10)?,
        account_name: row.get(11)?,
    })
}

/// Retrieve the transactions recorded by `user_id`, newest first, applying
/// `filters`.
///
/// The date range filter only applies when both ends are given, matching
/// the filter form which submits both fields together.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_transactions(
    user_id: UserID,
    filters: &TransactionFilters,
    connection: &Connection,
) -> Result<Vec<TransactionListItem>, Error> {
    let mut query = "SELECT t.id, t.user_id, t.category_id, t.account_id, t.amount, t.kind, \
         t.date, t.description, t.receipt_url, t.is_recurring_generated, \
         c.name, a.name
         FROM \"transaction\" t
         LEFT JOIN category c ON t.category_id = c.id
         LEFT JOIN account a ON t.account_id = a.id
         WHERE t.user_id = ?"
        .to_owned();
    let user_id = user_id.as_i64();
    let mut params: Vec<&dyn ToSql> = vec![&user_id];

    if let Some(kind) = &filters.kind {
        query.push_str(" AND t.kind = ?");
        params.push(kind);
    }

    if let (Some(from), Some(to)) = (&filters.from, &filters.to) {
        query.push_str(" AND t.date BETWEEN ? AND ?");
        params.push(from);
        params.push(to);
    }

    let keyword_pattern = filters
        .keyword
        .as_ref()
        .map(|keyword| format!("%{keyword}%"));
    if let Some(pattern) = &keyword_pattern {
        query.push_str(" AND t.description LIKE ?");
        params.push(pattern);
    }

    query.push_str(" ORDER BY t.date DESC, t.id DESC");

    connection
        .prepare(&query)?
        .query_map(params.as_slice(), map_list_item)?
        .map(|maybe_item| maybe_item.map_err(Error::from))
        .collect()
}

/// The first day of the month that `date` falls in.
pub fn month_start(date: Date) -> Date {
    date.replace_day(1)
        .expect("every month has a first day")
}

/// The "YYYY-MM" prefix used to bucket transaction dates by month.
pub fn month_prefix(date: Date) -> String {
    format!("{:04}-{:02}", date.year(), u8::from(date.month()))
}

/// Parse a "YYYY-MM" month string into the first day of that month.
pub fn parse_month(raw_month: &str) -> Option<Date> {
    let (year, month) = raw_month.split_once('-')?;
    let year: i32 = year.parse().ok()?;
    let month: u8 = month.parse().ok()?;
    let month = Month::try_from(month).ok()?;

    Date::from_calendar_date(year, month, 1).ok()
}

/// Sum the expense amounts recorded by `user_id` in `category_id` during the
/// month that `month` falls in.
///
/// Returns 0.0 when there are no matching transactions.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn month_category_expense_total(
    user_id: UserID,
    category_id: CategoryId,
    month: Date,
    connection: &Connection,
) -> Result<f64, Error> {
    let total = connection
        .prepare(
            "SELECT COALESCE(SUM(amount), 0) FROM \"transaction\"
             WHERE user_id = ?1 AND category_id = ?2 AND kind = 'expense'
               AND strftime('%Y-%m', date) = ?3",
        )?
        .query_one(
            params![user_id.as_i64(), category_id, month_prefix(month)],
            |row| row.get(0),
        )?;

    Ok(total)
}

/// Sum the amounts of `kind` recorded by `user_id` on or after `start`.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn total_since(
    user_id: UserID,
    kind: TransactionKind,
    start: Date,
    connection: &Connection,
) -> Result<f64, Error> {
    let total = connection
        .prepare(
            "SELECT COALESCE(SUM(amount), 0) FROM \"transaction\"
             WHERE user_id = ?1 AND kind = ?2 AND date >= ?3",
        )?
        .query_one(params![user_id.as_i64(), kind, start], |row| row.get(0))?;

    Ok(total)
}

/// Sum this month's expenses grouped by category name for `user_id`.
///
/// Used by the dashboard's spending chart.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn expense_totals_by_category(
    user_id: UserID,
    start: Date,
    connection: &Connection,
) -> Result<Vec<(String, f64)>, Error> {
    connection
        .prepare(
            "SELECT c.name, SUM(t.amount) FROM \"transaction\" t
             JOIN category c ON t.category_id = c.id
             WHERE t.user_id = ?1 AND t.kind = 'expense' AND t.date >= ?2
             GROUP BY c.name",
        )?
        .query_map(params![user_id.as_i64(), start], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?
        .map(|maybe_row| maybe_row.map_err(Error::from))
        .collect()
}

/// Update the stored receipt path for a transaction.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn set_receipt_url(
    id: TransactionId,
    user_id: UserID,
    receipt_url: &str,
    connection: &Connection,
) -> Result<usize, Error> {
    connection
        .execute(
            "UPDATE \"transaction\" SET receipt_url = ?1 WHERE id = ?2 AND user_id = ?3",
            params![receipt_url, id, user_id.as_i64()],
        )
        .map_err(Error::from)
}

#[cfg(test)]
mod month_tests {
    use time::macros::date;

    use super::{month_prefix, month_start, parse_month};

    #[test]
    fn month_start_truncates_to_first() {
        assert_eq!(month_start(date!(2023 - 01 - 31)), date!(2023 - 01 - 01));
        assert_eq!(month_start(date!(2023 - 02 - 01)), date!(2023 - 02 - 01));
    }

    #[test]
    fn month_prefix_pads_month() {
        assert_eq!(month_prefix(date!(2023 - 01 - 31)), "2023-01");
        assert_eq!(month_prefix(date!(2023 - 11 - 05)), "2023-11");
    }

    #[test]
    fn parse_month_accepts_year_dash_month() {
        assert_eq!(parse_month("2023-01"), Some(date!(2023 - 01 - 01)));
        assert_eq!(parse_month("2023-13"), None);
        assert_eq!(parse_month("not a month"), None);
    }
}

#[cfg(test)]
mod query_tests {
    use rusqlite::Connection;
    use time::{Date, macros::date};

    use crate::{
        transaction::{
            NewTransaction, TransactionKind, core::test_utils::get_test_connection,
            create_transaction,
        },
        user::UserID,
    };

    use super::{
        TransactionFilters, get_transactions, month_category_expense_total, total_since,
    };

    fn insert_transaction(
        conn: &Connection,
        user_id: UserID,
        amount: f64,
        kind: TransactionKind,
        date: Date,
        description: &str,
    ) {
        create_transaction(
            NewTransaction {
                user_id,
                category_id: None,
                account_id: None,
                amount,
                kind,
                date,
                description: description.to_owned(),
                receipt_url: None,
                is_recurring_generated: false,
            },
            conn,
        )
        .expect("could not create test transaction");
    }

    #[test]
    fn filters_by_kind() {
        let (conn, user_id) = get_test_connection();
        insert_transaction(
            &conn,
            user_id,
            10.0,
            TransactionKind::Income,
            date!(2023 - 01 - 02),
            "salary",
        );
        insert_transaction(
            &conn,
            user_id,
            20.0,
            TransactionKind::Expense,
            date!(2023 - 01 - 03),
            "groceries",
        );

        let filters = TransactionFilters {
            kind: Some(TransactionKind::Expense),
            ..Default::default()
        };

        let items = get_transactions(user_id, &filters, &conn).unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].transaction.description, "groceries");
    }

    #[test]
    fn filters_by_date_range_and_keyword() {
        let (conn, user_id) = get_test_connection();
        insert_transaction(
            &conn,
            user_id,
            10.0,
            TransactionKind::Expense,
            date!(2023 - 01 - 02),
            "coffee beans",
        );
        insert_transaction(
            &conn,
            user_id,
            20.0,
            TransactionKind::Expense,
            date!(2023 - 02 - 02),
            "coffee machine",
        );
        insert_transaction(
            &conn,
            user_id,
            30.0,
            TransactionKind::Expense,
            date!(2023 - 02 - 03),
            "groceries",
        );

        let filters = TransactionFilters {
            from: Some(date!(2023 - 02 - 01)),
            to: Some(date!(2023 - 02 - 28)),
            keyword: Some("coffee".to_owned()),
            ..Default::default()
        };

        let items = get_transactions(user_id, &filters, &conn).unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].transaction.description, "coffee machine");
    }

    #[test]
    fn newest_transactions_come_first() {
        let (conn, user_id) = get_test_connection();
        insert_transaction(
            &conn,
            user_id,
            10.0,
            TransactionKind::Expense,
            date!(2023 - 01 - 02),
            "older",
        );
        insert_transaction(
            &conn,
            user_id,
            20.0,
            TransactionKind::Expense,
            date!(2023 - 03 - 02),
            "newer",
        );

        let items = get_transactions(user_id, &TransactionFilters::default(), &conn).unwrap();

        assert_eq!(items[0].transaction.description, "newer");
        assert_eq!(items[1].transaction.description, "older");
    }

    #[test]
    fn month_total_only_counts_matching_category_and_month() {
        let (conn, user_id) = get_test_connection();
        let category = crate::category::create_category(
            crate::category::NewCategory {
                user_id: Some(user_id),
                name: crate::category::CategoryName::new_unchecked("Groceries"),
                kind: crate::category::CategoryKind::Expense,
            },
            &conn,
        )
        .unwrap();

        for (amount, date) in [
            (10.0, date!(2023 - 01 - 02)),
            (15.5, date!(2023 - 01 - 31)),
            (99.0, date!(2023 - 02 - 01)),
        ] {
            create_transaction(
                NewTransaction {
                    user_id,
                    category_id: Some(category.id),
                    account_id: None,
                    amount,
                    kind: TransactionKind::Expense,
                    date,
                    description: "food".to_owned(),
                    receipt_url: None,
                    is_recurring_generated: false,
                },
                &conn,
            )
            .unwrap();
        }

        // An income transaction in the same category must not count.
        create_transaction(
            NewTransaction {
                user_id,
                category_id: Some(category.id),
                account_id: None,
                amount: 1000.0,
                kind: TransactionKind::Income,
                date: date!(2023 - 01 - 15),
                description: "refund".to_owned(),
                receipt_url: None,
                is_recurring_generated: false,
            },
            &conn,
        )
        .unwrap();

        let total =
            month_category_expense_total(user_id, category.id, date!(2023 - 01 - 01), &conn)
                .unwrap();

        assert_eq!(total, 25.5);
    }

    #[test]
    fn total_since_sums_by_kind() {
        let (conn, user_id) = get_test_connection();
        insert_transaction(
            &conn,
            user_id,
            100.0,
            TransactionKind::Income,
            date!(2023 - 01 - 02),
            "salary",
        );
        insert_transaction(
            &conn,
            user_id,
            40.0,
            TransactionKind::Expense,
            date!(2023 - 01 - 03),
            "groceries",
        );
        insert_transaction(
            &conn,
            user_id,
            5.0,
            TransactionKind::Expense,
            date!(2022 - 12 - 31),
            "last year",
        );

        let income = total_since(
            user_id,
            TransactionKind::Income,
            date!(2023 - 01 - 01),
            &conn,
        )
        .unwrap();
        let expenses = total_since(
            user_id,
            TransactionKind::Expense,
            date!(2023 - 01 - 01),
            &conn,
        )
        .unwrap();

        assert_eq!(income, 100.0);
        assert_eq!(expenses, 40.0);
    }
}
