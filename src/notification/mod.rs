//! Notifications and the duplicate check that keeps one notification per
//! source entity.

mod core;
mod delete_endpoint;
mod mark_read_endpoint;
mod notifications_page;

pub use core::{
    BILL_REMINDER_KIND, NewNotification, Notification, NotificationId,
    create_notification_if_absent, create_notification_table, get_unread_notifications,
    list_notifications,
};
pub use delete_endpoint::delete_notification_endpoint;
pub use mark_read_endpoint::mark_notification_read_endpoint;
pub use notifications_page::get_notifications_page;
