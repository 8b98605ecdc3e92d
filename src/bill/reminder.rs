//! Creates notifications for bills that are due soon.

use rusqlite::Connection;
use time::{Date, Duration, OffsetDateTime};

use crate::{
    Error,
    bill::core::get_pending_bills_due_between,
    notification::{BILL_REMINDER_KIND, NewNotification, create_notification_if_absent},
    user::UserID,
};

/// How far ahead of the due date a reminder is raised.
pub const REMINDER_WINDOW: Duration = Duration::days(3);

/// The date range `[today, today + 3 days]` that bills are reminded in.
pub fn reminder_window(today: Date) -> (Date, Date) {
    (today, today + REMINDER_WINDOW)
}

/// Create a notification for every pending bill due within the reminder
/// window, skipping bills that already have one.
///
/// Existing notifications are never refreshed: if a bill's due date moves,
/// the original message stays as it was. Returns the number of
/// notifications created.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn notify_upcoming_bills(
    user_id: UserID,
    today: Date,
    connection: &Connection,
) -> Result<u32, Error> {
    let (from, to) = reminder_window(today);

    let bills = get_pending_bills_due_between(user_id, from, to, connection)?;

    let mut created_count = 0;

    for bill in bills {
        let message = format!("Bill '{}' is due on {}", bill.name, bill.due_date);

        let created = create_notification_if_absent(
            NewNotification {
                user_id,
                kind: BILL_REMINDER_KIND.to_owned(),
                message,
                related_entity_type: "bill".to_owned(),
                related_entity_id: bill.id,
                created_at: OffsetDateTime::now_utc(),
            },
            connection,
        )?;

        if created {
            created_count += 1;
        }
    }

    Ok(created_count)
}

#[cfg(test)]
mod reminder_window_tests {
    use time::macros::date;

    use super::reminder_window;

    #[test]
    fn window_spans_three_days_ahead() {
        let (from, to) = reminder_window(date!(2023 - 01 - 01));

        assert_eq!(from, date!(2023 - 01 - 01));
        assert_eq!(to, date!(2023 - 01 - 04));
    }
}

#[cfg(test)]
mod notify_upcoming_bills_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        bill::core::{NewBillReminder, create_bill_reminder, mark_bill_paid},
        notification::list_notifications,
        transaction::test_utils::get_test_connection,
        user::UserID,
    };

    use super::notify_upcoming_bills;

    fn insert_bill(
        conn: &Connection,
        user_id: UserID,
        name: &str,
        due_date: time::Date,
    ) -> crate::bill::BillReminder {
        create_bill_reminder(
            NewBillReminder {
                user_id,
                name: name.to_owned(),
                amount: 50.0,
                due_date,
            },
            conn,
        )
        .unwrap()
    }

    #[test]
    fn running_twice_creates_one_notification() {
        let (conn, user_id) = get_test_connection();
        insert_bill(&conn, user_id, "Power", date!(2023 - 01 - 03));

        assert_eq!(
            notify_upcoming_bills(user_id, date!(2023 - 01 - 01), &conn).unwrap(),
            1
        );
        assert_eq!(
            notify_upcoming_bills(user_id, date!(2023 - 01 - 01), &conn).unwrap(),
            0
        );

        let notifications = list_notifications(user_id, None, &conn).unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].message, "Bill 'Power' is due on 2023-01-03");
        assert_eq!(notifications[0].related_entity_id, 1);
    }

    #[test]
    fn bills_outside_the_window_are_ignored() {
        let (conn, user_id) = get_test_connection();
        insert_bill(&conn, user_id, "Too far", date!(2023 - 01 - 10));
        insert_bill(&conn, user_id, "Overdue", date!(2022 - 12 - 31));

        let created = notify_upcoming_bills(user_id, date!(2023 - 01 - 01), &conn).unwrap();

        assert_eq!(created, 0);
    }

    #[test]
    fn paid_bills_are_ignored() {
        let (conn, user_id) = get_test_connection();
        let bill = insert_bill(&conn, user_id, "Power", date!(2023 - 01 - 02));
        mark_bill_paid(bill.id, user_id, &conn).unwrap();

        let created = notify_upcoming_bills(user_id, date!(2023 - 01 - 01), &conn).unwrap();

        assert_eq!(created, 0);
    }

    #[test]
    fn moved_due_date_does_not_refresh_message() {
        let (conn, user_id) = get_test_connection();
        let bill = insert_bill(&conn, user_id, "Power", date!(2023 - 01 - 02));
        notify_upcoming_bills(user_id, date!(2023 - 01 - 01), &conn).unwrap();

        // The due date changes, but the original notification stands.
        crate::bill::core::update_bill_reminder(
            bill.id,
            user_id,
            "Power",
            50.0,
            date!(2023 - 01 - 04),
            crate::bill::BillStatus::Pending,
            &conn,
        )
        .unwrap();
        notify_upcoming_bills(user_id, date!(2023 - 01 - 01), &conn).unwrap();

        let notifications = list_notifications(user_id, None, &conn).unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].message, "Bill 'Power' is due on 2023-01-02");
    }
}
