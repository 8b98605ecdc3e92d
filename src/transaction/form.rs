use maud::{Markup, html};
use time::Date;

use crate::{
    account::Account,
    category::Category,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE, FORM_TEXT_INPUT_STYLE,
        dollar_input_styles, loading_spinner,
    },
    transaction::{Transaction, TransactionKind},
};

/// The values used to pre-fill the transaction form.
pub(super) struct TransactionFormValues {
    pub amount: Option<f64>,
    pub kind: TransactionKind,
    pub date: Date,
    pub description: String,
    pub category_id: Option<i64>,
    pub account_id: Option<i64>,
    pub receipt_url: Option<String>,
}

impl TransactionFormValues {
    pub(super) fn empty(today: Date) -> Self {
        Self {
            amount: None,
            kind: TransactionKind::Expense,
            date: today,
            description: String::new(),
            category_id: None,
            account_id: None,
            receipt_url: None,
        }
    }

    pub(super) fn from_transaction(transaction: &Transaction) -> Self {
        Self {
            amount: Some(transaction.amount),
            kind: transaction.kind,
            date: transaction.date,
            description: transaction.description.clone(),
            category_id: transaction.category_id,
            account_id: transaction.account_id,
            receipt_url: transaction.receipt_url.clone(),
        }
    }
}

/// The shared form for creating and editing transactions.
///
/// `submit_attr` and `submit_url` select between `hx-post` for creation and
/// `hx-put` for editing.
pub(super) fn transaction_form(
    submit_attr: &str,
    submit_url: &str,
    submit_label: &str,
    values: &TransactionFormValues,
    categories: &[Category],
    accounts: &[Account],
) -> Markup {
    let amount_value = values
        .amount
        .map(|amount| amount.to_string())
        .unwrap_or_default();

    html!(
        form
            hx-post=[(submit_attr == "hx-post").then_some(submit_url)]
            hx-put=[(submit_attr == "hx-put").then_some(submit_url)]
            hx-indicator="#indicator"
            hx-target-error="#alert-container"
            class="space-y-4 w-full"
        {
            @if let Some(receipt_url) = &values.receipt_url {
                input type="hidden" name="receipt_url" value=(receipt_url);
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }
                div class="input-wrapper w-full"
                {
                    input type="number" name="amount" id="amount" step="0.01" min="0.01"
                        class=(FORM_TEXT_INPUT_STYLE) value=(amount_value) required;
                }
            }

            div
            {
                label for="kind" class=(FORM_LABEL_STYLE) { "Type" }
                select name="kind" id="kind" class=(FORM_SELECT_STYLE)
                {
                    option value="expense" selected[values.kind == TransactionKind::Expense]
                    {
                        "Expense"
                    }
                    option value="income" selected[values.kind == TransactionKind::Income]
                    {
                        "Income"
                    }
                }
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }
                input type="date" name="date" id="date" class=(FORM_TEXT_INPUT_STYLE)
                    value=(values.date) required;
            }

            div
            {
                label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }
                select name="category_id" id="category_id" class=(FORM_SELECT_STYLE) required
                {
                    @for category in categories {
                        option
                            value=(category.id)
                            selected[values.category_id == Some(category.id)]
                        {
                            (category.name) " (" (category.kind) ")"
                        }
                    }
                }
            }

            div
            {
                label for="account_id" class=(FORM_LABEL_STYLE) { "Account" }
                select name="account_id" id="account_id" class=(FORM_SELECT_STYLE)
                {
                    option value="" { "No account" }

                    @for account in accounts {
                        option
                            value=(account.id)
                            selected[values.account_id == Some(account.id)]
                        {
                            (account.name)
                        }
                    }
                }
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }
                input type="text" name="description" id="description"
                    class=(FORM_TEXT_INPUT_STYLE) value=(values.description)
                    placeholder="Defaults to the category name";
            }

            button type="submit" id="submit-button" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                (submit_label)
            }
        }
    )
}

/// The extra head styles used by the transaction form pages.
pub(super) fn transaction_form_head() -> crate::html::HeadElement {
    dollar_input_styles()
}
