//! Defines the core data models and database queries for monthly budgets,
//! and the check that raises the over-budget alert.

use rusqlite::{Connection, Row, params};
use time::Date;

use crate::{
    Error,
    category::CategoryId,
    transaction::{month_category_expense_total, month_start},
    user::UserID,
};

pub type BudgetId = i64;

/// The percentage of the budget at which the UI shows a warning colour.
/// Stored per budget but not consulted by [check_budget_alert], which fires
/// on the flat over-budget rule only.
pub const DEFAULT_ALERT_THRESHOLD: i64 = 90;

/// A spending limit for one category in one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct Budget {
    /// The ID of the budget.
    pub id: BudgetId,
    /// The user the budget belongs to.
    pub user_id: UserID,
    /// The category the budget limits.
    pub category_id: CategoryId,
    /// The first day of the month the budget applies to.
    pub month: Date,
    /// The spending limit for the month.
    pub amount: f64,
    /// The warning threshold as a percentage of `amount`.
    pub alert_threshold: i64,
}

/// A budget joined with its category name and the amount spent so far.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetListItem {
    /// The budget itself.
    pub budget: Budget,
    /// The name of the budgeted category.
    pub category_name: String,
    /// The expense total for the budget's category and month.
    pub total_spent: f64,
}

/// Create the budget table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                category_id INTEGER NOT NULL,
                month TEXT NOT NULL,
                amount REAL NOT NULL,
                alert_threshold INTEGER NOT NULL DEFAULT 90,
                FOREIGN KEY(user_id) REFERENCES user(id),
                FOREIGN KEY(category_id) REFERENCES category(id)
                )",
        (),
    )?;

    Ok(())
}

/// Map a database row to a [Budget].
pub fn map_budget_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    let raw_user_id: i64 = row.get(1)?;

    Ok(Budget {
        id: row.get(0)?,
        user_id: UserID::new(raw_user_id),
        category_id: row.get(2)?,
        month: row.get(3)?,
        amount: row.get(4)?,
        alert_threshold: row.get(5)?,
    })
}

const BUDGET_COLUMNS: &str = "id, user_id, category_id, month, amount, alert_threshold";

/// Create a budget for (user, category, month), or replace the amount and
/// threshold of the existing one.
///
/// There is at most one budget per (user, category, month); posting the
/// form again updates it instead of creating a duplicate.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn upsert_budget(
    user_id: UserID,
    category_id: CategoryId,
    month: Date,
    amount: f64,
    alert_threshold: i64,
    connection: &Connection,
) -> Result<Budget, Error> {
    let month = month_start(month);

    let existing = get_budget_for(user_id, category_id, month, connection)?;

    match existing {
        Some(budget) => {
            connection.execute(
                "UPDATE budget SET amount = ?1, alert_threshold = ?2 WHERE id = ?3",
                params![amount, alert_threshold, budget.id],
            )?;

            Ok(Budget {
                amount,
                alert_threshold,
                ..budget
            })
        }
        None => {
            let budget = connection
                .prepare(&format!(
                    "INSERT INTO budget (user_id, category_id, month, amount, alert_threshold)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     RETURNING {BUDGET_COLUMNS}"
                ))?
                .query_one(
                    params![
                        user_id.as_i64(),
                        category_id,
                        month,
                        amount,
                        alert_threshold
                    ],
                    map_budget_row,
                )?;

            Ok(budget)
        }
    }
}

/// Retrieve the budget with `id` owned by `user_id`.
///
/// # Errors
/// Returns an [Error::NotFound] if the budget does not exist or belongs to
/// another user, or an [Error::SqlError] if there is some other SQL error.
pub fn get_budget(id: BudgetId, user_id: UserID, connection: &Connection) -> Result<Budget, Error> {
    let budget = connection
        .prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budget WHERE id = :id AND user_id = :user_id"
        ))?
        .query_one(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            map_budget_row,
        )?;

    Ok(budget)
}

/// Retrieve the budget for (user, category, month), if one has been set.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_budget_for(
    user_id: UserID,
    category_id: CategoryId,
    month: Date,
    connection: &Connection,
) -> Result<Option<Budget>, Error> {
    let month = month_start(month);

    let mut statement = connection.prepare(&format!(
        "SELECT {BUDGET_COLUMNS} FROM budget
         WHERE user_id = :user_id AND category_id = :category_id AND month = :month"
    ))?;
    let mut rows = statement.query_map(
        &[
            (":user_id", &user_id.as_i64() as &dyn rusqlite::ToSql),
            (":category_id", &category_id),
            (":month", &month),
        ],
        map_budget_row,
    )?;

    rows.next().transpose().map_err(Error::from)
}

/// Retrieve the budgets owned by `user_id` with their category names and
/// expense totals, newest month first.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn list_budgets_with_spent(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<BudgetListItem>, Error> {
    connection
        .prepare(
            "SELECT b.id, b.user_id, b.category_id, b.month, b.amount, b.alert_threshold,
                    c.name,
                    (SELECT COALESCE(SUM(t.amount), 0)
                     FROM \"transaction\" t
                     WHERE t.user_id = b.user_id AND t.category_id = b.category_id
                       AND t.kind = 'expense'
                       AND strftime('%Y-%m', t.date) = strftime('%Y-%m', b.month)
                    ) AS total_spent
             FROM budget b
             JOIN category c ON b.category_id = c.id
             WHERE b.user_id = :user_id
             ORDER BY b.month DESC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], |row| {
            Ok(BudgetListItem {
                budget: map_budget_row(row)?,
                category_name: row.get(6)?,
                total_spent: row.get(7)?,
            })
        })?
        .map(|maybe_item| maybe_item.map_err(Error::from))
        .collect()
}

/// Retrieve the budgets owned by `user_id` for the month that `month` falls
/// in, with expense totals.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn budgets_for_month(
    user_id: UserID,
    month: Date,
    connection: &Connection,
) -> Result<Vec<BudgetListItem>, Error> {
    let month = month_start(month);

    connection
        .prepare(
            "SELECT b.id, b.user_id, b.category_id, b.month, b.amount, b.alert_threshold,
                    c.name,
                    (SELECT COALESCE(SUM(t.amount), 0)
                     FROM \"transaction\" t
                     WHERE t.user_id = b.user_id AND t.category_id = b.category_id
                       AND t.kind = 'expense'
                       AND strftime('%Y-%m', t.date) = strftime('%Y-%m', b.month)
                    ) AS total_spent
             FROM budget b
             JOIN category c ON b.category_id = c.id
             WHERE b.user_id = :user_id AND b.month = :month",
        )?
        .query_map(
            &[
                (":user_id", &user_id.as_i64() as &dyn rusqlite::ToSql),
                (":month", &month),
            ],
            |row| {
                Ok(BudgetListItem {
                    budget: map_budget_row(row)?,
                    category_name: row.get(6)?,
                    total_spent: row.get(7)?,
                })
            },
        )?
        .map(|maybe_item| maybe_item.map_err(Error::from))
        .collect()
}

/// The distinct months that `user_id` has budgets for, newest first, as
/// "YYYY-MM" strings.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn available_budget_months(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<String>, Error> {
    connection
        .prepare(
            "SELECT DISTINCT strftime('%Y-%m', month) FROM budget
             WHERE user_id = :user_id
             ORDER BY 1 DESC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], |row| row.get(0))?
        .map(|maybe_month| maybe_month.map_err(Error::from))
        .collect()
}

type RowsAffected = usize;

/// Update the amount and threshold of the budget with `id` owned by
/// `user_id`.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn update_budget(
    id: BudgetId,
    user_id: UserID,
    amount: f64,
    alert_threshold: i64,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "UPDATE budget SET amount = ?1, alert_threshold = ?2
             WHERE id = ?3 AND user_id = ?4",
            params![amount, alert_threshold, id, user_id.as_i64()],
        )
        .map_err(Error::from)
}

/// Delete the budget with `id` owned by `user_id`.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn delete_budget(
    id: BudgetId,
    user_id: UserID,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM budget WHERE id = ?1 AND user_id = ?2",
            params![id, user_id.as_i64()],
        )
        .map_err(Error::from)
}

/// Whether a month's spending has gone over its budget.
///
/// The comparison is strictly greater than: spending the budget exactly is
/// not an overrun.
pub fn is_over_budget(total_spent: f64, budget_amount: f64) -> bool {
    total_spent > budget_amount
}

/// The message flashed to the user when a budget is exceeded.
pub const BUDGET_EXCEEDED_MESSAGE: &str = "Budget exceeded for this category!";

/// Check whether the expenses in `category_id` for the month of `date` have
/// exceeded the budget for that month.
///
/// Returns the alert message when the budget exists and is exceeded. A
/// missing budget and a satisfied budget are both silent.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn check_budget_alert(
    user_id: UserID,
    category_id: CategoryId,
    date: Date,
    connection: &Connection,
) -> Result<Option<String>, Error> {
    let budget = match get_budget_for(user_id, category_id, date, connection)? {
        Some(budget) => budget,
        None => return Ok(None),
    };

    let total_spent = month_category_expense_total(user_id, category_id, date, connection)?;

    if is_over_budget(total_spent, budget.amount) {
        Ok(Some(BUDGET_EXCEEDED_MESSAGE.to_owned()))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod is_over_budget_tests {
    use super::is_over_budget;

    #[test]
    fn over_by_a_cent_fires() {
        assert!(is_over_budget(100.01, 100.0));
    }

    #[test]
    fn exactly_on_budget_is_silent() {
        assert!(!is_over_budget(100.0, 100.0));
    }

    #[test]
    fn under_budget_is_silent() {
        assert!(!is_over_budget(99.99, 100.0));
    }
}

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        category::{CategoryId, CategoryKind, CategoryName, NewCategory, create_category},
        transaction::{
            NewTransaction, TransactionKind, test_utils::get_test_connection,
            create_transaction,
        },
        user::UserID,
    };

    use super::{
        BUDGET_EXCEEDED_MESSAGE, check_budget_alert, available_budget_months, budgets_for_month,
        delete_budget, get_budget_for, list_budgets_with_spent, update_budget, upsert_budget,
    };

    fn setup() -> (Connection, UserID, CategoryId) {
        let (conn, user_id) = get_test_connection();

        let category = create_category(
            NewCategory {
                user_id: Some(user_id),
                name: CategoryName::new_unchecked("Groceries"),
                kind: CategoryKind::Expense,
            },
            &conn,
        )
        .unwrap();

        (conn, user_id, category.id)
    }

    fn spend(conn: &Connection, user_id: UserID, category_id: CategoryId, amount: f64) {
        create_transaction(
            NewTransaction {
                user_id,
                category_id: Some(category_id),
                account_id: None,
                amount,
                kind: TransactionKind::Expense,
                date: date!(2023 - 01 - 15),
                description: "food".to_owned(),
                receipt_url: None,
                is_recurring_generated: false,
            },
            conn,
        )
        .unwrap();
    }

    #[test]
    fn upsert_creates_then_updates() {
        let (conn, user_id, category_id) = setup();

        let created =
            upsert_budget(user_id, category_id, date!(2023 - 01 - 15), 100.0, 90, &conn).unwrap();
        // Months are truncated to their first day so there is at most one
        // budget per (user, category, month).
        assert_eq!(created.month, date!(2023 - 01 - 01));

        let updated =
            upsert_budget(user_id, category_id, date!(2023 - 01 - 31), 200.0, 75, &conn).unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.amount, 200.0);
        assert_eq!(updated.alert_threshold, 75);

        let budgets = list_budgets_with_spent(user_id, &conn).unwrap();
        assert_eq!(budgets.len(), 1);
    }

    #[test]
    fn alert_fires_only_over_budget() {
        let (conn, user_id, category_id) = setup();
        upsert_budget(user_id, category_id, date!(2023 - 01 - 01), 100.0, 90, &conn).unwrap();

        spend(&conn, user_id, category_id, 100.0);
        let alert = check_budget_alert(user_id, category_id, date!(2023 - 01 - 15), &conn).unwrap();
        assert_eq!(alert, None, "spending the budget exactly must be silent");

        spend(&conn, user_id, category_id, 0.01);
        let alert = check_budget_alert(user_id, category_id, date!(2023 - 01 - 15), &conn).unwrap();
        assert_eq!(alert, Some(BUDGET_EXCEEDED_MESSAGE.to_owned()));
    }

    #[test]
    fn alert_is_silent_without_budget() {
        let (conn, user_id, category_id) = setup();

        spend(&conn, user_id, category_id, 10_000.0);

        let alert = check_budget_alert(user_id, category_id, date!(2023 - 01 - 15), &conn).unwrap();
        assert_eq!(alert, None);
    }

    #[test]
    fn alert_ignores_threshold() {
        let (conn, user_id, category_id) = setup();
        // A 1% threshold with spending at 80% of the budget: the threshold
        // is stored but the alert only fires on the flat over-budget rule.
        upsert_budget(user_id, category_id, date!(2023 - 01 - 01), 100.0, 1, &conn).unwrap();

        spend(&conn, user_id, category_id, 80.0);

        let alert = check_budget_alert(user_id, category_id, date!(2023 - 01 - 15), &conn).unwrap();
        assert_eq!(alert, None);
    }

    #[test]
    fn list_includes_spent_totals() {
        let (conn, user_id, category_id) = setup();
        upsert_budget(user_id, category_id, date!(2023 - 01 - 01), 100.0, 90, &conn).unwrap();
        spend(&conn, user_id, category_id, 25.5);
        spend(&conn, user_id, category_id, 10.0);

        let budgets = list_budgets_with_spent(user_id, &conn).unwrap();

        assert_eq!(budgets.len(), 1);
        assert_eq!(budgets[0].total_spent, 35.5);
        assert_eq!(budgets[0].category_name, "Groceries");
    }

    #[test]
    fn months_are_distinct_and_newest_first() {
        let (conn, user_id, category_id) = setup();
        upsert_budget(user_id, category_id, date!(2023 - 01 - 01), 100.0, 90, &conn).unwrap();
        upsert_budget(user_id, category_id, date!(2023 - 03 - 01), 100.0, 90, &conn).unwrap();

        let months = available_budget_months(user_id, &conn).unwrap();

        assert_eq!(months, vec!["2023-03".to_owned(), "2023-01".to_owned()]);
    }

    #[test]
    fn budgets_for_month_filters_by_month() {
        let (conn, user_id, category_id) = setup();
        upsert_budget(user_id, category_id, date!(2023 - 01 - 01), 100.0, 90, &conn).unwrap();
        upsert_budget(user_id, category_id, date!(2023 - 02 - 01), 50.0, 90, &conn).unwrap();

        let january = budgets_for_month(user_id, date!(2023 - 01 - 20), &conn).unwrap();

        assert_eq!(january.len(), 1);
        assert_eq!(january[0].budget.amount, 100.0);
    }

    #[test]
    fn update_and_delete_scope_by_user() {
        let (conn, user_id, category_id) = setup();
        let budget =
            upsert_budget(user_id, category_id, date!(2023 - 01 - 01), 100.0, 90, &conn).unwrap();
        let other_user = UserID::new(user_id.as_i64() + 1);

        assert_eq!(update_budget(budget.id, other_user, 1.0, 1, &conn), Ok(0));
        assert_eq!(delete_budget(budget.id, other_user, &conn), Ok(0));
        assert_eq!(update_budget(budget.id, user_id, 1.0, 1, &conn), Ok(1));
        assert_eq!(delete_budget(budget.id, user_id, &conn), Ok(1));

        assert_eq!(
            get_budget_for(user_id, category_id, date!(2023 - 01 - 01), &conn).unwrap(),
            None
        );
    }
}
