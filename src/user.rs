//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
///
/// The caller should ensure that `id` is unique.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's display name.
    pub full_name: String,
    /// The email address the user logs in with. Unique across users.
    pub email: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// The answer the user must repeat to reset their password.
    pub recovery_hint: String,
    /// The currency code used when displaying amounts, e.g. "USD".
    pub currency: String,
    /// The date the user registered.
    pub created_at: Date,
}

/// The data needed to register a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// The user's display name.
    pub full_name: String,
    /// The email address the user logs in with.
    pub email: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// The answer the user must repeat to reset their password.
    pub recovery_hint: String,
    /// The date the user registered.
    pub created_at: Date,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                full_name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                recovery_hint TEXT NOT NULL,
                currency TEXT NOT NULL DEFAULT 'USD',
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns:
/// - [Error::EmailTaken] if a user with the same email already exists.
/// - [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    connection.execute(
        "INSERT INTO user (full_name, email, password, recovery_hint, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            new_user.full_name,
            new_user.email,
            new_user.password_hash.as_ref(),
            new_user.recovery_hint,
            new_user.created_at,
        ],
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        full_name: new_user.full_name,
        email: new_user.email,
        password_hash: new_user.password_hash,
        recovery_hint: new_user.recovery_hint,
        currency: "USD".to_owned(),
        created_at: new_user.created_at,
    })
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_id = row.get(0)?;
    let raw_password_hash: String = row.get(3)?;

    Ok(User {
        id: UserID::new(raw_id),
        full_name: row.get(1)?,
        email: row.get(2)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        recovery_hint: row.get(4)?,
        currency: row.get(5)?,
        created_at: row.get(6)?,
    })
}

const USER_COLUMNS: &str = "id, full_name, email, password, recovery_hint, currency, created_at";

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!("SELECT {USER_COLUMNS} FROM user WHERE id = :id"))?
        .query_one(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user from the database with an email equal to `email`.
///
/// # Errors
///
/// This function will return an error if:
/// - `email` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!(
            "SELECT {USER_COLUMNS} FROM user WHERE email = :email"
        ))?
        .query_one(&[(":email", &email)], map_user_row)
        .map_err(|error| error.into())
}

/// Replace the password hash stored for `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if `user_id` does not belong to a registered
/// user, or [Error::SqlError] if an SQL related error occurred.
pub fn update_password(
    user_id: UserID,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1 WHERE id = ?2",
        params![password_hash.as_ref(), user_id.as_i64()],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Replace the preferred currency stored for `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if `user_id` does not belong to a registered
/// user, or [Error::SqlError] if an SQL related error occurred.
pub fn update_currency(
    user_id: UserID,
    currency: &str,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET currency = ?1 WHERE id = ?2",
        params![currency, user_id.as_i64()],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Delete the user row for `user_id`.
///
/// Rows owned by the user (accounts, transactions, budgets and so on) are
/// deleted by the profile delete endpoint before this function is called.
///
/// # Errors
///
/// Returns [Error::NotFound] if `user_id` does not belong to a registered
/// user, or [Error::SqlError] if an SQL related error occurred.
pub fn delete_user(user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM user WHERE id = ?1",
        params![user_id.as_i64()],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

#[cfg(test)]
mod user_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error, PasswordHash,
        user::{
            NewUser, UserID, create_user, delete_user, get_user_by_email, get_user_by_id,
            update_currency, update_password,
        },
    };

    use super::create_user_table;

    fn get_db_connection() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        create_user_table(&conn).expect("Could not create user table");

        conn
    }

    fn test_user() -> NewUser {
        NewUser {
            full_name: "Test User".to_owned(),
            email: "test@example.com".to_owned(),
            password_hash: PasswordHash::new_unchecked("hunter2"),
            recovery_hint: "test hint".to_owned(),
            created_at: date!(2023 - 01 - 01),
        }
    }

    #[test]
    fn insert_user_succeeds() {
        let conn = get_db_connection();

        let inserted_user = create_user(test_user(), &conn).unwrap();

        assert!(inserted_user.id.as_i64() > 0);
        assert_eq!(inserted_user.email, "test@example.com");
        assert_eq!(inserted_user.currency, "USD");
    }

    #[test]
    fn insert_user_fails_on_duplicate_email() {
        let conn = get_db_connection();
        create_user(test_user(), &conn).unwrap();

        let result = create_user(test_user(), &conn);

        assert_eq!(result, Err(Error::EmailTaken));
    }

    #[test]
    fn get_user_fails_with_non_existent_id() {
        let conn = get_db_connection();

        let id = UserID::new(42);

        assert_eq!(get_user_by_id(id, &conn), Err(Error::NotFound));
    }

    #[test]
    fn get_user_by_email_succeeds() {
        let conn = get_db_connection();
        let inserted_user = create_user(test_user(), &conn).unwrap();

        let retrieved_user = get_user_by_email("test@example.com", &conn).unwrap();

        assert_eq!(retrieved_user, inserted_user);
    }

    #[test]
    fn get_user_by_email_fails_on_unknown_email() {
        let conn = get_db_connection();
        create_user(test_user(), &conn).unwrap();

        let result = get_user_by_email("nobody@example.com", &conn);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn update_password_replaces_hash() {
        let conn = get_db_connection();
        let user = create_user(test_user(), &conn).unwrap();
        let new_hash = PasswordHash::new_unchecked("hunter3");

        update_password(user.id, &new_hash, &conn).unwrap();

        let updated_user = get_user_by_id(user.id, &conn).unwrap();
        assert_eq!(updated_user.password_hash, new_hash);
    }

    #[test]
    fn update_currency_replaces_currency() {
        let conn = get_db_connection();
        let user = create_user(test_user(), &conn).unwrap();

        update_currency(user.id, "CAD", &conn).unwrap();

        let updated_user = get_user_by_id(user.id, &conn).unwrap();
        assert_eq!(updated_user.currency, "CAD");
    }

    #[test]
    fn delete_user_removes_row() {
        let conn = get_db_connection();
        let user = create_user(test_user(), &conn).unwrap();

        delete_user(user.id, &conn).unwrap();

        assert_eq!(get_user_by_id(user.id, &conn), Err(Error::NotFound));
    }

    #[test]
    fn delete_user_fails_on_missing_user() {
        let conn = get_db_connection();

        assert_eq!(delete_user(UserID::new(42), &conn), Err(Error::NotFound));
    }
}
