//! Defines the core data models and database queries for savings goals and
//! their contribution history.

use rusqlite::{Connection, Row, params};
use time::Date;

use crate::{Error, user::UserID};

pub type GoalId = i64;

/// A savings target the user is putting money aside for.
#[derive(Debug, Clone, PartialEq)]
pub struct SavingsGoal {
    /// The ID of the goal.
    pub id: GoalId,
    /// The user the goal belongs to.
    pub user_id: UserID,
    /// What the user is saving for.
    pub name: String,
    /// The amount the user wants to reach.
    pub target_amount: f64,
    /// The amount saved so far.
    pub current_amount: f64,
    /// When the user wants to reach the target.
    pub target_date: Date,
}

/// One contribution towards a savings goal. History rows are append-only.
#[derive(Debug, Clone, PartialEq)]
pub struct SavingsContribution {
    /// The ID of the history row.
    pub id: i64,
    /// The goal the contribution was made to.
    pub goal_id: GoalId,
    /// The contributed amount.
    pub amount: f64,
    /// When the contribution was made.
    pub contribution_date: Date,
}

/// The data needed to create a savings goal.
#[derive(Debug, Clone)]
pub struct NewSavingsGoal {
    /// The user the goal belongs to.
    pub user_id: UserID,
    /// What the user is saving for.
    pub name: String,
    /// The amount the user wants to reach.
    pub target_amount: f64,
    /// When the user wants to reach the target.
    pub target_date: Date,
}

/// Create the savings goal table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_savings_goal_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS savings_goal (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                target_amount REAL NOT NULL,
                current_amount REAL NOT NULL DEFAULT 0,
                target_date TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id)
                )",
        (),
    )?;

    Ok(())
}

/// Create the savings history table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_savings_history_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS savings_history (
                id INTEGER PRIMARY KEY,
                goal_id INTEGER NOT NULL,
                amount REAL NOT NULL,
                contribution_date TEXT NOT NULL,
                FOREIGN KEY(goal_id) REFERENCES savings_goal(id) ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

fn map_goal_row(row: &Row) -> Result<SavingsGoal, rusqlite::Error> {
    let raw_user_id: i64 = row.get(1)?;

    Ok(SavingsGoal {
        id: row.get(0)?,
        user_id: UserID::new(raw_user_id),
        name: row.get(2)?,
        target_amount: row.get(3)?,
        current_amount: row.get(4)?,
        target_date: row.get(5)?,
    })
}

const GOAL_COLUMNS: &str = "id, user_id, name, target_amount, current_amount, target_date";

/// Create a new savings goal in the database.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn create_goal(new_goal: NewSavingsGoal, connection: &Connection) -> Result<SavingsGoal, Error> {
    let goal = connection
        .prepare(&format!(
            "INSERT INTO savings_goal (user_id, name, target_amount, target_date)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING {GOAL_COLUMNS}"
        ))?
        .query_one(
            params![
                new_goal.user_id.as_i64(),
                new_goal.name,
                new_goal.target_amount,
                new_goal.target_date,
            ],
            map_goal_row,
        )?;

    Ok(goal)
}

/// Retrieve the savings goal with `id` owned by `user_id`.
///
/// # Errors
/// Returns an [Error::NotFound] if the goal does not exist or belongs to
/// another user, or an [Error::SqlError] if there is some other SQL error.
pub fn get_goal(id: GoalId, user_id: UserID, connection: &Connection) -> Result<SavingsGoal, Error> {
    let goal = connection
        .prepare(&format!(
            "SELECT {GOAL_COLUMNS} FROM savings_goal WHERE id = :id AND user_id = :user_id"
        ))?
        .query_one(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            map_goal_row,
        )?;

    Ok(goal)
}

/// Retrieve the savings goals owned by `user_id`, earliest target first.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_goals_for_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<SavingsGoal>, Error> {
    connection
        .prepare(&format!(
            "SELECT {GOAL_COLUMNS} FROM savings_goal
             WHERE user_id = :user_id
             ORDER BY target_date"
        ))?
        .query_map(&[(":user_id", &user_id.as_i64())], map_goal_row)?
        .map(|maybe_goal| maybe_goal.map_err(Error::from))
        .collect()
}

/// Add `amount` to a goal's saved total and append a history row.
///
/// The saved total is adjusted with a single UPDATE statement so concurrent
/// contributions never race on a read-then-write.
///
/// # Errors
/// Returns an [Error::UpdateMissingGoal] if the goal does not exist or
/// belongs to another user, or an [Error::SqlError] if there is some other
/// SQL error.
pub fn contribute_to_goal(
    goal_id: GoalId,
    user_id: UserID,
    amount: f64,
    contribution_date: Date,
    connection: &Connection,
) -> Result<(), Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let rows_affected = sql_transaction.execute(
        "UPDATE savings_goal SET current_amount = current_amount + ?1
         WHERE id = ?2 AND user_id = ?3",
        params![amount, goal_id, user_id.as_i64()],
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingGoal);
    }

    sql_transaction.execute(
        "INSERT INTO savings_history (goal_id, amount, contribution_date)
         VALUES (?1, ?2, ?3)",
        params![goal_id, amount, contribution_date],
    )?;

    sql_transaction.commit()?;

    Ok(())
}

/// Add `amount` to every goal of `user_id` whose target date is on or after
/// `today`.
///
/// Used when moving a month's remaining budget into savings: each budget's
/// remainder is credited to every unexpired goal, and no history rows are
/// written.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn add_to_unexpired_goals(
    user_id: UserID,
    amount: f64,
    today: Date,
    connection: &Connection,
) -> Result<usize, Error> {
    connection
        .execute(
            "UPDATE savings_goal SET current_amount = current_amount + ?1
             WHERE user_id = ?2 AND target_date >= ?3",
            params![amount, user_id.as_i64(), today],
        )
        .map_err(Error::from)
}

/// Retrieve the contribution history for a goal owned by `user_id`, newest
/// first.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_history_for_goal(
    goal_id: GoalId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<SavingsContribution>, Error> {
    connection
        .prepare(
            "SELECT sh.id, sh.goal_id, sh.amount, sh.contribution_date
             FROM savings_history sh
             JOIN savings_goal sg ON sh.goal_id = sg.id
             WHERE sg.user_id = :user_id AND sh.goal_id = :goal_id
             ORDER BY sh.contribution_date DESC, sh.id DESC",
        )?
        .query_map(
            &[(":user_id", &user_id.as_i64()), (":goal_id", &goal_id)],
            |row| {
                Ok(SavingsContribution {
                    id: row.get(0)?,
                    goal_id: row.get(1)?,
                    amount: row.get(2)?,
                    contribution_date: row.get(3)?,
                })
            },
        )?
        .map(|maybe_row| maybe_row.map_err(Error::from))
        .collect()
}

/// The user's average progress across their goals, as a percentage.
///
/// Goals with a zero target are skipped. Returns 0.0 when the user has no
/// goals.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn average_goal_progress(user_id: UserID, connection: &Connection) -> Result<f64, Error> {
    let progress = connection
        .prepare(
            "SELECT COALESCE(AVG(current_amount / NULLIF(target_amount, 0)) * 100, 0)
             FROM savings_goal
             WHERE user_id = :user_id",
        )?
        .query_one(&[(":user_id", &user_id.as_i64())], |row| row.get(0))?;

    Ok(progress)
}

type RowsAffected = usize;

/// Update the name, target amount and target date of the goal with `id`
/// owned by `user_id`.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn update_goal(
    id: GoalId,
    user_id: UserID,
    name: &str,
    target_amount: f64,
    target_date: Date,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "UPDATE savings_goal SET name = ?1, target_amount = ?2, target_date = ?3
             WHERE id = ?4 AND user_id = ?5",
            params![name, target_amount, target_date, id, user_id.as_i64()],
        )
        .map_err(Error::from)
}

/// Delete the goal with `id` owned by `user_id`. Its history rows are
/// removed with it.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn delete_goal(
    id: GoalId,
    user_id: UserID,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM savings_goal WHERE id = ?1 AND user_id = ?2",
            params![id, user_id.as_i64()],
        )
        .map_err(Error::from)
}

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error, transaction::test_utils::get_test_connection, user::UserID,
    };

    use super::{
        NewSavingsGoal, SavingsGoal, add_to_unexpired_goals, average_goal_progress,
        contribute_to_goal, create_goal, delete_goal, get_goal, get_goals_for_user,
        get_history_for_goal, update_goal,
    };

    fn insert_goal(
        conn: &Connection,
        user_id: UserID,
        name: &str,
        target_amount: f64,
        target_date: time::Date,
    ) -> SavingsGoal {
        create_goal(
            NewSavingsGoal {
                user_id,
                name: name.to_owned(),
                target_amount,
                target_date,
            },
            conn,
        )
        .unwrap()
    }

    #[test]
    fn new_goal_starts_at_zero() {
        let (conn, user_id) = get_test_connection();

        let goal = insert_goal(&conn, user_id, "Holiday", 1000.0, date!(2024 - 01 - 01));

        assert_eq!(goal.current_amount, 0.0);
    }

    #[test]
    fn contribute_updates_total_and_appends_history() {
        let (conn, user_id) = get_test_connection();
        let goal = insert_goal(&conn, user_id, "Holiday", 1000.0, date!(2024 - 01 - 01));

        contribute_to_goal(goal.id, user_id, 100.0, date!(2023 - 06 - 01), &conn).unwrap();
        contribute_to_goal(goal.id, user_id, 50.0, date!(2023 - 06 - 02), &conn).unwrap();

        let updated = get_goal(goal.id, user_id, &conn).unwrap();
        assert_eq!(updated.current_amount, 150.0);

        let history = get_history_for_goal(goal.id, user_id, &conn).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].amount, 50.0, "newest contribution comes first");
    }

    #[test]
    fn contribute_to_other_users_goal_is_rejected() {
        let (conn, user_id) = get_test_connection();
        let goal = insert_goal(&conn, user_id, "Holiday", 1000.0, date!(2024 - 01 - 01));
        let other_user = UserID::new(user_id.as_i64() + 1);

        let result = contribute_to_goal(goal.id, other_user, 100.0, date!(2023 - 06 - 01), &conn);

        assert_eq!(result, Err(Error::UpdateMissingGoal));
        let history = get_history_for_goal(goal.id, user_id, &conn).unwrap();
        assert!(history.is_empty(), "no history row without an update");
    }

    #[test]
    fn unexpired_goals_all_receive_the_amount() {
        let (conn, user_id) = get_test_connection();
        let expired = insert_goal(&conn, user_id, "Expired", 1000.0, date!(2023 - 01 - 01));
        let active_a = insert_goal(&conn, user_id, "Active A", 1000.0, date!(2023 - 06 - 30));
        let active_b = insert_goal(&conn, user_id, "Active B", 1000.0, date!(2024 - 01 - 01));

        let rows = add_to_unexpired_goals(user_id, 40.0, date!(2023 - 06 - 01), &conn).unwrap();

        assert_eq!(rows, 2);
        assert_eq!(get_goal(expired.id, user_id, &conn).unwrap().current_amount, 0.0);
        assert_eq!(
            get_goal(active_a.id, user_id, &conn).unwrap().current_amount,
            40.0
        );
        assert_eq!(
            get_goal(active_b.id, user_id, &conn).unwrap().current_amount,
            40.0
        );
    }

    #[test]
    fn average_progress_is_a_percentage() {
        let (conn, user_id) = get_test_connection();
        let half = insert_goal(&conn, user_id, "Half", 1000.0, date!(2024 - 01 - 01));
        let quarter = insert_goal(&conn, user_id, "Quarter", 1000.0, date!(2024 - 01 - 01));
        contribute_to_goal(half.id, user_id, 500.0, date!(2023 - 06 - 01), &conn).unwrap();
        contribute_to_goal(quarter.id, user_id, 250.0, date!(2023 - 06 - 01), &conn).unwrap();

        let progress = average_goal_progress(user_id, &conn).unwrap();

        assert!((progress - 37.5).abs() < 1e-9, "got {progress}, want 37.5");
    }

    #[test]
    fn average_progress_without_goals_is_zero() {
        let (conn, user_id) = get_test_connection();

        assert_eq!(average_goal_progress(user_id, &conn).unwrap(), 0.0);
    }

    #[test]
    fn update_and_delete_scope_by_user() {
        let (conn, user_id) = get_test_connection();
        let goal = insert_goal(&conn, user_id, "Holiday", 1000.0, date!(2024 - 01 - 01));
        let other_user = UserID::new(user_id.as_i64() + 1);

        assert_eq!(
            update_goal(goal.id, other_user, "Stolen", 1.0, date!(2024 - 01 - 01), &conn),
            Ok(0)
        );
        assert_eq!(delete_goal(goal.id, other_user, &conn), Ok(0));

        assert_eq!(
            update_goal(goal.id, user_id, "Trip", 2000.0, date!(2024 - 06 - 01), &conn),
            Ok(1)
        );
        assert_eq!(delete_goal(goal.id, user_id, &conn), Ok(1));
        assert!(get_goals_for_user(user_id, &conn).unwrap().is_empty());
    }
}
