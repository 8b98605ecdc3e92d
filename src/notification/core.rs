//! Defines the core data models and database queries for notifications,
//! including the duplicate check that keeps reminders to one notification
//! per source entity.

use rusqlite::{Connection, Row, params};
use time::OffsetDateTime;

use crate::{Error, user::UserID};

pub type NotificationId = i64;

/// The notification kind used for upcoming bill reminders.
pub const BILL_REMINDER_KIND: &str = "bill_reminder";

/// A message surfaced to the user in the notification center.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// The ID of the notification.
    pub id: NotificationId,
    /// The user the notification is for.
    pub user_id: UserID,
    /// The kind of event the notification describes, e.g. "bill_reminder".
    pub kind: String,
    /// The message shown to the user.
    pub message: String,
    /// The type of the entity the notification was raised for, e.g. "bill".
    pub related_entity_type: String,
    /// The ID of the entity the notification was raised for.
    pub related_entity_id: i64,
    /// Whether the user has read the notification.
    pub is_read: bool,
    /// When the notification was created.
    pub created_at: OffsetDateTime,
}

/// The data needed to create a notification.
#[derive(Debug, Clone)]
pub struct NewNotification {
    /// The user the notification is for.
    pub user_id: UserID,
    /// The kind of event the notification describes.
    pub kind: String,
    /// The message shown to the user.
    pub message: String,
    /// The type of the entity the notification was raised for.
    pub related_entity_type: String,
    /// The ID of the entity the notification was raised for.
    pub related_entity_id: i64,
    /// When the notification was created.
    pub created_at: OffsetDateTime,
}

/// Create the notification table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_notification_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS notification (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                kind TEXT NOT NULL,
                message TEXT NOT NULL,
                related_entity_type TEXT NOT NULL,
                related_entity_id INTEGER NOT NULL,
                is_read INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id)
                )",
        (),
    )?;

    Ok(())
}

fn map_notification_row(row: &Row) -> Result<Notification, rusqlite::Error> {
    let raw_user_id: i64 = row.get(1)?;

    Ok(Notification {
        id: row.get(0)?,
        user_id: UserID::new(raw_user_id),
        kind: row.get(2)?,
        message: row.get(3)?,
        related_entity_type: row.get(4)?,
        related_entity_id: row.get(5)?,
        is_read: row.get(6)?,
        created_at: row.get(7)?,
    })
}

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, kind, message, related_entity_type, related_entity_id, is_read, created_at";

/// Create a notification unless one already exists for the same
/// (user, related entity type, related entity id).
///
/// Returns `true` when a notification was created. The check is
/// at-most-one-ever: an existing notification is never refreshed, even if
/// its message has gone stale, and notifications that were read or hidden
/// still count as existing.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn create_notification_if_absent(
    new_notification: NewNotification,
    connection: &Connection,
) -> Result<bool, Error> {
    let exists = connection
        .prepare(
            "SELECT 1 FROM notification
             WHERE user_id = ?1 AND related_entity_type = ?2 AND related_entity_id = ?3
             LIMIT 1",
        )?
        .query_map(
            params![
                new_notification.user_id.as_i64(),
                new_notification.related_entity_type,
                new_notification.related_entity_id,
            ],
            |_| Ok(()),
        )?
        .next()
        .transpose()?
        .is_some();

    if exists {
        return Ok(false);
    }

    connection.execute(
        "INSERT INTO notification
         (user_id, kind, message, related_entity_type, related_entity_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            new_notification.user_id.as_i64(),
            new_notification.kind,
            new_notification.message,
            new_notification.related_entity_type,
            new_notification.related_entity_id,
            new_notification.created_at,
        ],
    )?;

    Ok(true)
}

/// Retrieve the notifications for `user_id`, newest first, optionally
/// filtered by kind.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn list_notifications(
    user_id: UserID,
    kind: Option<&str>,
    connection: &Connection,
) -> Result<Vec<Notification>, Error> {
    match kind {
        Some(kind) => connection
            .prepare(&format!(
                "SELECT {NOTIFICATION_COLUMNS} FROM notification
                 WHERE user_id = :user_id AND kind = :kind
                 ORDER BY created_at DESC, id DESC"
            ))?
            .query_map(
                &[
                    (":user_id", &user_id.as_i64() as &dyn rusqlite::ToSql),
                    (":kind", &kind),
                ],
                map_notification_row,
            )?
            .map(|maybe_notification| maybe_notification.map_err(Error::from))
            .collect(),
        None => connection
            .prepare(&format!(
                "SELECT {NOTIFICATION_COLUMNS} FROM notification
                 WHERE user_id = :user_id
                 ORDER BY created_at DESC, id DESC"
            ))?
            .query_map(&[(":user_id", &user_id.as_i64())], map_notification_row)?
            .map(|maybe_notification| maybe_notification.map_err(Error::from))
            .collect(),
    }
}

/// Retrieve up to `limit` unread notifications for `user_id`, newest first.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_unread_notifications(
    user_id: UserID,
    limit: u32,
    connection: &Connection,
) -> Result<Vec<Notification>, Error> {
    connection
        .prepare(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notification
             WHERE user_id = :user_id AND is_read = 0
             ORDER BY created_at DESC, id DESC
             LIMIT :limit"
        ))?
        .query_map(
            &[(":user_id", &user_id.as_i64()), (":limit", &(limit as i64))],
            map_notification_row,
        )?
        .map(|maybe_notification| maybe_notification.map_err(Error::from))
        .collect()
}

type RowsAffected = usize;

/// Mark the notification with `id` owned by `user_id` as read.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn mark_notification_read(
    id: NotificationId,
    user_id: UserID,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "UPDATE notification SET is_read = 1 WHERE id = ?1 AND user_id = ?2",
            params![id, user_id.as_i64()],
        )
        .map_err(Error::from)
}

/// Delete the notification with `id` owned by `user_id`.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn delete_notification(
    id: NotificationId,
    user_id: UserID,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM notification WHERE id = ?1 AND user_id = ?2",
            params![id, user_id.as_i64()],
        )
        .map_err(Error::from)
}
