//! Defines the core data models and database queries for bill reminders.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, user::UserID};

pub type BillId = i64;

/// Whether a bill has been paid yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    Pending,
    Paid,
}

impl BillStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillStatus::Pending => "pending",
            BillStatus::Paid => "paid",
        }
    }
}

impl Display for BillStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BillStatus::Pending),
            "paid" => Ok(BillStatus::Paid),
            other => Err(format!("{other} is not a valid bill status")),
        }
    }
}

impl ToSql for BillStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for BillStatus {
    fn column_result(value: ValueRef) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// A bill the user wants to be reminded about before its due date.
#[derive(Debug, Clone, PartialEq)]
pub struct BillReminder {
    /// The ID of the bill reminder.
    pub id: BillId,
    /// The user the reminder belongs to.
    pub user_id: UserID,
    /// What the bill is for, e.g. "Power".
    pub name: String,
    /// The amount due.
    pub amount: f64,
    /// When the bill is due.
    pub due_date: Date,
    /// Whether the bill has been paid.
    pub status: BillStatus,
}

/// The data needed to create a bill reminder. New reminders start pending.
#[derive(Debug, Clone)]
pub struct NewBillReminder {
    /// The user the reminder belongs to.
    pub user_id: UserID,
    /// What the bill is for.
    pub name: String,
    /// The amount due.
    pub amount: f64,
    /// When the bill is due.
    pub due_date: Date,
}

/// Create the bill reminder table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_bill_reminder_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS bill_reminder (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                amount REAL NOT NULL,
                due_date TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                FOREIGN KEY(user_id) REFERENCES user(id)
                )",
        (),
    )?;

    Ok(())
}

fn map_bill_row(row: &Row) -> Result<BillReminder, rusqlite::Error> {
    let raw_user_id: i64 = row.get(1)?;

    Ok(BillReminder {
        id: row.get(0)?,
        user_id: UserID::new(raw_user_id),
        name: row.get(2)?,
        amount: row.get(3)?,
        due_date: row.get(4)?,
        status: row.get(5)?,
    })
}

const BILL_COLUMNS: &str = "id, user_id, name, amount, due_date, status";

/// Create a new bill reminder in the database.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn create_bill_reminder(
    new_bill: NewBillReminder,
    connection: &Connection,
) -> Result<BillReminder, Error> {
    let bill = connection
        .prepare(&format!(
            "INSERT INTO bill_reminder (user_id, name, amount, due_date)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING {BILL_COLUMNS}"
        ))?
        .query_one(
            params![
                new_bill.user_id.as_i64(),
                new_bill.name,
                new_bill.amount,
                new_bill.due_date,
            ],
            map_bill_row,
        )?;

    Ok(bill)
}

/// Retrieve the bill reminder with `id` owned by `user_id`.
///
/// # Errors
/// Returns an [Error::NotFound] if the bill does not exist or belongs to
/// another user, or an [Error::SqlError] if there is some other SQL error.
pub fn get_bill_reminder(
    id: BillId,
    user_id: UserID,
    connection: &Connection,
) -> Result<BillReminder, Error> {
    let bill = connection
        .prepare(&format!(
            "SELECT {BILL_COLUMNS} FROM bill_reminder WHERE id = :id AND user_id = :user_id"
        ))?
        .query_one(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            map_bill_row,
        )?;

    Ok(bill)
}

/// Retrieve the bill reminders owned by `user_id`, earliest due date first.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn list_bill_reminders(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<BillReminder>, Error> {
    connection
        .prepare(&format!(
            "SELECT {BILL_COLUMNS} FROM bill_reminder
             WHERE user_id = :user_id
             ORDER BY due_date ASC"
        ))?
        .query_map(&[(":user_id", &user_id.as_i64())], map_bill_row)?
        .map(|maybe_bill| maybe_bill.map_err(Error::from))
        .collect()
}

/// Retrieve the pending bills owned by `user_id` with a due date between
/// `from` and `to` inclusive.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_pending_bills_due_between(
    user_id: UserID,
    from: Date,
    to: Date,
    connection: &Connection,
) -> Result<Vec<BillReminder>, Error> {
    connection
        .prepare(&format!(
            "SELECT {BILL_COLUMNS} FROM bill_reminder
             WHERE user_id = :user_id AND status = 'pending'
               AND due_date BETWEEN :from AND :to"
        ))?
        .query_map(
            &[
                (":user_id", &user_id.as_i64() as &dyn rusqlite::ToSql),
                (":from", &from),
                (":to", &to),
            ],
            map_bill_row,
        )?
        .map(|maybe_bill| maybe_bill.map_err(Error::from))
        .collect()
}

/// Retrieve up to `limit` pending bills owned by `user_id`, earliest due
/// date first.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_upcoming_pending_bills(
    user_id: UserID,
    limit: u32,
    connection: &Connection,
) -> Result<Vec<BillReminder>, Error> {
    connection
        .prepare(&format!(
            "SELECT {BILL_COLUMNS} FROM bill_reminder
             WHERE user_id = :user_id AND status = 'pending'
             ORDER BY due_date ASC
             LIMIT :limit"
        ))?
        .query_map(
            &[(":user_id", &user_id.as_i64()), (":limit", &(limit as i64))],
            map_bill_row,
        )?
        .map(|maybe_bill| maybe_bill.map_err(Error::from))
        .collect()
}

type RowsAffected = usize;

/// Replace the editable fields of the bill with `id` owned by `user_id`.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn update_bill_reminder(
    id: BillId,
    user_id: UserID,
    name: &str,
    amount: f64,
    due_date: Date,
    status: BillStatus,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "UPDATE bill_reminder
             SET name = ?1, amount = ?2, due_date = ?3, status = ?4
             WHERE id = ?5 AND user_id = ?6",
            params![name, amount, due_date, status, id, user_id.as_i64()],
        )
        .map_err(Error::from)
}

/// Mark the bill with `id` owned by `user_id` as paid.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn mark_bill_paid(
    id: BillId,
    user_id: UserID,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "UPDATE bill_reminder SET status = 'paid' WHERE id = ?1 AND user_id = ?2",
            params![id, user_id.as_i64()],
        )
        .map_err(Error::from)
}

/// Delete the bill with `id` owned by `user_id`.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn delete_bill_reminder(
    id: BillId,
    user_id: UserID,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM bill_reminder WHERE id = ?1 AND user_id = ?2",
            params![id, user_id.as_i64()],
        )
        .map_err(Error::from)
}

#[cfg(test)]
mod database_tests {
    use time::macros::date;

    use crate::{transaction::test_utils::get_test_connection, user::UserID};

    use super::{
        BillStatus, NewBillReminder, create_bill_reminder, delete_bill_reminder,
        get_bill_reminder, get_pending_bills_due_between, get_upcoming_pending_bills,
        list_bill_reminders, mark_bill_paid, update_bill_reminder,
    };

    fn new_bill(user_id: UserID, name: &str, due_date: time::Date) -> NewBillReminder {
        NewBillReminder {
            user_id,
            name: name.to_owned(),
            amount: 89.5,
            due_date,
        }
    }

    #[test]
    fn new_bills_start_pending() {
        let (conn, user_id) = get_test_connection();

        let bill = create_bill_reminder(new_bill(user_id, "Power", date!(2023 - 01 - 05)), &conn)
            .unwrap();

        assert_eq!(bill.status, BillStatus::Pending);
    }

    #[test]
    fn list_orders_by_due_date() {
        let (conn, user_id) = get_test_connection();
        create_bill_reminder(new_bill(user_id, "Later", date!(2023 - 02 - 01)), &conn).unwrap();
        create_bill_reminder(new_bill(user_id, "Sooner", date!(2023 - 01 - 05)), &conn).unwrap();

        let bills = list_bill_reminders(user_id, &conn).unwrap();

        assert_eq!(bills[0].name, "Sooner");
        assert_eq!(bills[1].name, "Later");
    }

    #[test]
    fn due_between_is_inclusive_and_skips_paid() {
        let (conn, user_id) = get_test_connection();
        let on_start =
            create_bill_reminder(new_bill(user_id, "On start", date!(2023 - 01 - 01)), &conn)
                .unwrap();
        create_bill_reminder(new_bill(user_id, "On end", date!(2023 - 01 - 04)), &conn).unwrap();
        create_bill_reminder(new_bill(user_id, "Outside", date!(2023 - 01 - 05)), &conn).unwrap();
        let paid =
            create_bill_reminder(new_bill(user_id, "Paid", date!(2023 - 01 - 02)), &conn).unwrap();
        mark_bill_paid(paid.id, user_id, &conn).unwrap();

        let due = get_pending_bills_due_between(
            user_id,
            date!(2023 - 01 - 01),
            date!(2023 - 01 - 04),
            &conn,
        )
        .unwrap();

        let names: Vec<_> = due.iter().map(|bill| bill.name.as_str()).collect();
        assert_eq!(names, vec!["On start", "On end"]);
        assert_eq!(due[0].id, on_start.id);
    }

    #[test]
    fn upcoming_respects_limit() {
        let (conn, user_id) = get_test_connection();
        for day in 1..=8 {
            create_bill_reminder(
                new_bill(
                    user_id,
                    &format!("Bill {day}"),
                    date!(2023 - 01 - 01).replace_day(day).unwrap(),
                ),
                &conn,
            )
            .unwrap();
        }

        let upcoming = get_upcoming_pending_bills(user_id, 5, &conn).unwrap();

        assert_eq!(upcoming.len(), 5);
        assert_eq!(upcoming[0].name, "Bill 1");
    }

    #[test]
    fn update_and_delete_scope_by_user() {
        let (conn, user_id) = get_test_connection();
        let bill = create_bill_reminder(new_bill(user_id, "Power", date!(2023 - 01 - 05)), &conn)
            .unwrap();
        let other_user = UserID::new(user_id.as_i64() + 1);

        assert_eq!(
            update_bill_reminder(
                bill.id,
                other_user,
                "Stolen",
                1.0,
                date!(2023 - 01 - 05),
                BillStatus::Paid,
                &conn
            ),
            Ok(0)
        );
        assert_eq!(delete_bill_reminder(bill.id, other_user, &conn), Ok(0));

        assert_eq!(mark_bill_paid(bill.id, user_id, &conn), Ok(1));
        let updated = get_bill_reminder(bill.id, user_id, &conn).unwrap();
        assert_eq!(updated.status, BillStatus::Paid);

        assert_eq!(delete_bill_reminder(bill.id, user_id, &conn), Ok(1));
    }
}
