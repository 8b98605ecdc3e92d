//! Defines the endpoint that expands due recurring transactions into
//! concrete transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use rusqlite::Connection;
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error,
    alert::set_flash_message,
    endpoints,
    recurring::{
        core::{get_active_recurring_transactions, set_last_generated_date},
        schedule::{next_due_date, should_generate},
    },
    timezone::get_local_offset,
    transaction::{NewTransaction, create_transaction},
    user::UserID,
};

/// The state needed to generate recurring transactions.
#[derive(Debug, Clone)]
pub struct GenerateRecurringState {
    /// The database connection for managing recurring transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for GenerateRecurringState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// A route handler that generates the transactions currently due from the
/// user's active recurring templates, then redirects to the transactions
/// page with a summary flash message.
///
/// Generation only happens when a user requests this route; there is no
/// background scheduler. Each template fires at most once per request, so
/// periods missed while the app was not visited are not back-filled.
pub async fn generate_recurring_endpoint(
    State(state): State<GenerateRecurringState>,
    Extension(user_id): Extension<UserID>,
    jar: CookieJar,
) -> Response {
    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        return Error::InvalidTimezoneError(state.local_timezone).into_response();
    };
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    let generated_count = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_response();
            }
        };

        match generate_due_transactions(user_id, today, &connection) {
            Ok(count) => count,
            Err(error) => {
                tracing::error!("Could not generate recurring transactions: {error}");
                return error.into_response();
            }
        }
    };

    let jar = set_flash_message(jar, &format!("{generated_count} transaction(s) generated."));

    (jar, Redirect::to(endpoints::TRANSACTIONS_VIEW)).into_response()
}

/// Insert a transaction dated `today` for every active template that is
/// due, and stamp the template with today's date.
///
/// Generated transactions do not touch account balances; only transactions
/// recorded through the create endpoint are applied to an account.
pub(crate) fn generate_due_transactions(
    user_id: UserID,
    today: Date,
    connection: &Connection,
) -> Result<u32, Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let templates = get_active_recurring_transactions(user_id, &sql_transaction)?;

    let mut generated_count = 0;

    for template in templates {
        let last = template.last_generated_date.unwrap_or(template.start_date);

        let next_due = match next_due_date(last, template.frequency) {
            Some(next_due) => next_due,
            None => continue,
        };

        if !should_generate(today, next_due, template.end_date) {
            continue;
        }

        create_transaction(
            NewTransaction {
                user_id: template.user_id,
                category_id: Some(template.category_id),
                account_id: template.account_id,
                amount: template.amount,
                kind: template.kind,
                date: today,
                description: template.description.clone(),
                receipt_url: None,
                is_recurring_generated: true,
            },
            &sql_transaction,
        )?;

        set_last_generated_date(template.id, today, &sql_transaction)?;

        generated_count += 1;
    }

    sql_transaction.commit()?;

    Ok(generated_count)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::{Date, macros::date};

    use crate::{
        account::{NewAccount, create_account, get_account},
        category::{CategoryId, CategoryKind, CategoryName, NewCategory, create_category},
        recurring::{
            Frequency, NewRecurringTransaction, core::create_recurring_transaction,
            get_recurring_transaction,
        },
        transaction::{
            TransactionFilters, TransactionKind, test_utils::get_test_connection,
            count_transactions, get_transactions,
        },
        user::UserID,
    };

    use super::generate_due_transactions;

    fn setup() -> (Connection, UserID, CategoryId) {
        let (conn, user_id) = get_test_connection();

        let category = create_category(
            NewCategory {
                user_id: Some(user_id),
                name: CategoryName::new_unchecked("Rent"),
                kind: CategoryKind::Expense,
            },
            &conn,
        )
        .unwrap();

        (conn, user_id, category.id)
    }

    fn insert_template(
        conn: &Connection,
        user_id: UserID,
        category_id: CategoryId,
        frequency: Frequency,
        start_date: Date,
        end_date: Option<Date>,
    ) -> crate::recurring::RecurringTransaction {
        create_recurring_transaction(
            NewRecurringTransaction {
                user_id,
                category_id,
                account_id: None,
                amount: 1200.0,
                kind: TransactionKind::Expense,
                frequency,
                start_date,
                end_date,
                description: "Rent".to_owned(),
            },
            conn,
        )
        .unwrap()
    }

    #[test]
    fn generates_one_instance_dated_today() {
        let (conn, user_id, category_id) = setup();
        let template = insert_template(
            &conn,
            user_id,
            category_id,
            Frequency::Monthly,
            date!(2023 - 01 - 31),
            None,
        );
        let today = date!(2023 - 02 - 05);

        let count = generate_due_transactions(user_id, today, &conn).unwrap();

        assert_eq!(count, 1);

        let items = get_transactions(user_id, &TransactionFilters::default(), &conn).unwrap();
        assert_eq!(items.len(), 1);
        let generated = &items[0].transaction;
        // The generated transaction is dated today, not the due date.
        assert_eq!(generated.date, today);
        assert!(generated.is_recurring_generated);
        assert_eq!(generated.amount, 1200.0);

        let template = get_recurring_transaction(template.id, user_id, &conn).unwrap();
        assert_eq!(template.last_generated_date, Some(today));
    }

    #[test]
    fn missed_periods_are_not_back_filled() {
        let (conn, user_id, category_id) = setup();
        insert_template(
            &conn,
            user_id,
            category_id,
            Frequency::Daily,
            date!(2023 - 01 - 01),
            None,
        );

        // Many daily periods have elapsed; a single check generates exactly
        // one transaction.
        let count = generate_due_transactions(user_id, date!(2023 - 03 - 01), &conn).unwrap();

        assert_eq!(count, 1);
        assert_eq!(count_transactions(user_id, &conn).unwrap(), 1);
    }

    #[test]
    fn does_not_generate_before_due_date() {
        let (conn, user_id, category_id) = setup();
        insert_template(
            &conn,
            user_id,
            category_id,
            Frequency::Monthly,
            date!(2023 - 01 - 31),
            None,
        );

        let count = generate_due_transactions(user_id, date!(2023 - 01 - 31), &conn).unwrap();

        assert_eq!(count, 0);
        assert_eq!(count_transactions(user_id, &conn).unwrap(), 0);
    }

    #[test]
    fn does_not_generate_past_end_date() {
        let (conn, user_id, category_id) = setup();
        insert_template(
            &conn,
            user_id,
            category_id,
            Frequency::Monthly,
            date!(2023 - 01 - 01),
            Some(date!(2023 - 01 - 15)),
        );

        // Due on 2023-02-01 but the template ended on 2023-01-15.
        let count = generate_due_transactions(user_id, date!(2023 - 02 - 01), &conn).unwrap();

        assert_eq!(count, 0);
    }

    #[test]
    fn generated_transactions_do_not_touch_balances() {
        let (conn, user_id, category_id) = setup();
        let account = create_account(
            NewAccount {
                user_id: Some(user_id),
                name: "Everyday".to_owned(),
                account_type: "Checking".to_owned(),
                balance: 1000.0,
            },
            &conn,
        )
        .unwrap();
        create_recurring_transaction(
            NewRecurringTransaction {
                user_id,
                category_id,
                account_id: Some(account.id),
                amount: 1200.0,
                kind: TransactionKind::Expense,
                frequency: Frequency::Daily,
                start_date: date!(2023 - 01 - 01),
                end_date: None,
                description: "Rent".to_owned(),
            },
            &conn,
        )
        .unwrap();

        generate_due_transactions(user_id, date!(2023 - 01 - 02), &conn).unwrap();

        let account = get_account(account.id, user_id, &conn).unwrap();
        assert_eq!(account.balance, 1000.0);
    }

    #[test]
    fn second_run_on_same_day_generates_nothing_new_for_monthly() {
        let (conn, user_id, category_id) = setup();
        insert_template(
            &conn,
            user_id,
            category_id,
            Frequency::Monthly,
            date!(2023 - 01 - 31),
            None,
        );
        let today = date!(2023 - 02 - 05);

        assert_eq!(generate_due_transactions(user_id, today, &conn).unwrap(), 1);
        // After generating, the next due date moves to 2023-03-01.
        assert_eq!(generate_due_transactions(user_id, today, &conn).unwrap(), 0);
        assert_eq!(count_transactions(user_id, &conn).unwrap(), 1);
    }
}
