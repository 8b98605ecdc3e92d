//! Defines the core data models and database queries for categories.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::{Error, user::UserID};

pub type CategoryId = i64;

/// Whether a category groups income or expenses.
///
/// The kind is used to pick which categories show up in budget forms. It is
/// not checked against the kind of the transactions filed under the
/// category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Income,
    Expense,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Income => "income",
            CategoryKind::Expense => "expense",
        }
    }
}

impl Display for CategoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(CategoryKind::Income),
            "expense" => Ok(CategoryKind::Expense),
            other => Err(format!("{other} is not a valid category kind")),
        }
    }
}

impl ToSql for CategoryKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for CategoryKind {
    fn column_result(value: ValueRef) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// The name of a category. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name from a string.
    ///
    /// # Errors
    /// Returns an [Error::EmptyCategoryName] if `name` is empty or only
    /// whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let trimmed = name.trim();

        if trimmed.is_empty() {
            return Err(Error::EmptyCategoryName);
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that `name` is not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A label that groups transactions and budgets, e.g. "Groceries".
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The user that owns the category, or [None] for global categories that
    /// every user can use.
    pub user_id: Option<UserID>,
    /// The display name of the category.
    pub name: CategoryName,
    /// Whether the category groups income or expenses.
    pub kind: CategoryKind,
}

/// The data needed to create a category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    /// The user that owns the category, or [None] for global categories.
    pub user_id: Option<UserID>,
    /// The display name of the category.
    pub name: CategoryName,
    /// Whether the category groups income or expenses.
    pub kind: CategoryKind,
}

/// Create the category table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
                id INTEGER PRIMARY KEY,
                user_id INTEGER,
                name TEXT NOT NULL,
                kind TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id)
                )",
        (),
    )?;

    Ok(())
}

/// Map a database row to a [Category].
pub fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let raw_user_id: Option<i64> = row.get(1)?;
    let raw_name: String = row.get(2)?;

    Ok(Category {
        id: row.get(0)?,
        user_id: raw_user_id.map(UserID::new),
        name: CategoryName::new_unchecked(&raw_name),
        kind: row.get(3)?,
    })
}

/// Create a new category in the database.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn create_category(
    new_category: NewCategory,
    connection: &Connection,
) -> Result<Category, Error> {
    let category = connection
        .prepare(
            "INSERT INTO category (user_id, name, kind) VALUES (?1, ?2, ?3)
             RETURNING id, user_id, name, kind",
        )?
        .query_one(
            params![
                new_category.user_id.map(|id| id.as_i64()),
                new_category.name.as_ref(),
                new_category.kind,
            ],
            map_category_row,
        )?;

    Ok(category)
}

/// Retrieve a category by its `id`.
///
/// Categories are looked up without an ownership filter because global
/// categories have no owner.
///
/// # Errors
/// Returns an [Error::NotFound] if `id` does not refer to a category, or an
/// [Error::SqlError] if there is some other SQL error.
pub fn get_category(id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    let category = connection
        .prepare("SELECT id, user_id, name, kind FROM category WHERE id = :id")?
        .query_one(&[(":id", &id)], map_category_row)?;

    Ok(category)
}

/// Retrieve the categories a user may file transactions under: their own
/// categories plus the global ones.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_selectable_categories(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, kind FROM category
             WHERE user_id = :user_id OR user_id IS NULL",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_category_row)?
        .map(|maybe_category| maybe_category.map_err(Error::from))
        .collect()
}

/// Retrieve the expense categories a user may set budgets for.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_expense_categories(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, kind FROM category
             WHERE (user_id = :user_id OR user_id IS NULL) AND kind = 'expense'",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_category_row)?
        .map(|maybe_category| maybe_category.map_err(Error::from))
        .collect()
}

type RowsAffected = usize;

/// Delete the category with `id` owned by `user_id`.
///
/// Global categories cannot be deleted through this function.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn delete_category(
    id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM category WHERE id = ?1 AND user_id = ?2",
            params![id, user_id.as_i64()],
        )
        .map_err(Error::from)
}

#[cfg(test)]
mod category_name_tests {
    use crate::Error;

    use super::CategoryName;

    #[test]
    fn new_fails_on_empty_string() {
        assert_eq!(CategoryName::new(""), Err(Error::EmptyCategoryName));
        assert_eq!(CategoryName::new("   "), Err(Error::EmptyCategoryName));
    }

    #[test]
    fn new_trims_whitespace() {
        let name = CategoryName::new(" Groceries ").unwrap();

        assert_eq!(name.as_ref(), "Groceries");
    }
}

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error, PasswordHash,
        db::initialize,
        user::{NewUser, UserID, create_user},
    };

    use super::{
        CategoryKind, CategoryName, NewCategory, create_category, delete_category, get_category,
        get_expense_categories, get_selectable_categories,
    };

    fn get_test_connection() -> (Connection, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let user = create_user(
            NewUser {
                full_name: "Test User".to_owned(),
                email: "test@example.com".to_owned(),
                password_hash: PasswordHash::new_unchecked("hunter2"),
                recovery_hint: "test hint".to_owned(),
                created_at: date!(2023 - 01 - 01),
            },
            &conn,
        )
        .unwrap();

        (conn, user.id)
    }

    fn new_category(user_id: Option<UserID>, name: &str, kind: CategoryKind) -> NewCategory {
        NewCategory {
            user_id,
            name: CategoryName::new_unchecked(name),
            kind,
        }
    }

    #[test]
    fn create_and_get_category() {
        let (conn, user_id) = get_test_connection();

        let created = create_category(
            new_category(Some(user_id), "Groceries", CategoryKind::Expense),
            &conn,
        )
        .unwrap();

        let got = get_category(created.id, &conn).unwrap();
        assert_eq!(created, got);
        assert_eq!(got.kind, CategoryKind::Expense);
    }

    #[test]
    fn get_category_fails_on_invalid_id() {
        let (conn, _) = get_test_connection();

        assert_eq!(get_category(1337, &conn), Err(Error::NotFound));
    }

    #[test]
    fn selectable_categories_include_global() {
        let (conn, user_id) = get_test_connection();
        create_category(
            new_category(Some(user_id), "Mine", CategoryKind::Expense),
            &conn,
        )
        .unwrap();
        create_category(new_category(None, "Salary", CategoryKind::Income), &conn).unwrap();

        let selectable = get_selectable_categories(user_id, &conn).unwrap();

        assert_eq!(selectable.len(), 2);
    }

    #[test]
    fn expense_categories_exclude_income() {
        let (conn, user_id) = get_test_connection();
        create_category(
            new_category(Some(user_id), "Groceries", CategoryKind::Expense),
            &conn,
        )
        .unwrap();
        create_category(
            new_category(Some(user_id), "Salary", CategoryKind::Income),
            &conn,
        )
        .unwrap();

        let expense_categories = get_expense_categories(user_id, &conn).unwrap();

        assert_eq!(expense_categories.len(), 1);
        assert_eq!(expense_categories[0].name.as_ref(), "Groceries");
    }

    #[test]
    fn delete_category_scopes_by_user() {
        let (conn, user_id) = get_test_connection();
        let category = create_category(
            new_category(Some(user_id), "Groceries", CategoryKind::Expense),
            &conn,
        )
        .unwrap();

        let other_user = UserID::new(user_id.as_i64() + 1);
        assert_eq!(delete_category(category.id, other_user, &conn), Ok(0));
        assert_eq!(delete_category(category.id, user_id, &conn), Ok(1));
    }
}
