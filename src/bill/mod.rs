//! Bill reminders and the notifications raised for bills that are due soon.

mod bills_page;
mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;
mod mark_paid_endpoint;
mod reminder;

pub use bills_page::get_bills_page;
pub use core::{
    BillId, BillReminder, BillStatus, NewBillReminder, create_bill_reminder,
    create_bill_reminder_table, get_upcoming_pending_bills, list_bill_reminders,
};
pub use create_endpoint::create_bill_endpoint;
pub use delete_endpoint::delete_bill_endpoint;
pub use edit_endpoint::edit_bill_endpoint;
pub use edit_page::get_edit_bill_page;
pub use mark_paid_endpoint::mark_bill_paid_endpoint;
pub use reminder::notify_upcoming_bills;
