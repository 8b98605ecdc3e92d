//! Pure balance arithmetic for applying transaction changes to accounts.
//!
//! An account's balance is the sum of the signed amounts of every
//! transaction ever applied to it: income adds, expense subtracts. The
//! functions here compute the balance deltas for creating, editing and
//! deleting a transaction; persisting the deltas is left to
//! [crate::account::adjust_account_balance].

use crate::{account::AccountId, transaction::TransactionKind};

/// The fields of a transaction that decide its effect on an account balance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedgerEntry {
    /// The account the transaction applies to, if any.
    pub account_id: Option<AccountId>,
    /// Whether the transaction is income or an expense.
    pub kind: TransactionKind,
    /// The magnitude of the transaction. Always positive.
    pub amount: f64,
}

/// A single balance delta to apply to one account.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceAdjustment {
    /// The account whose balance changes.
    pub account_id: AccountId,
    /// The signed amount to add to the account's balance.
    pub delta: f64,
}

/// The signed effect of a transaction on an account balance: positive for
/// income, negative for expenses.
pub fn signed_amount(kind: TransactionKind, amount: f64) -> f64 {
    match kind {
        TransactionKind::Income => amount,
        TransactionKind::Expense => -amount,
    }
}

/// The adjustment to apply when a transaction is created.
///
/// Returns [None] when the entry is not linked to an account, in which case
/// no balance changes.
pub fn creation_adjustment(entry: &LedgerEntry) -> Option<BalanceAdjustment> {
    entry.account_id.map(|account_id| BalanceAdjustment {
        account_id,
        delta: signed_amount(entry.kind, entry.amount),
    })
}

/// The adjustment that undoes a previously applied entry.
///
/// Used when a transaction is deleted, and for the first half of an edit.
pub fn reversal_adjustment(entry: &LedgerEntry) -> Option<BalanceAdjustment> {
    entry.account_id.map(|account_id| BalanceAdjustment {
        account_id,
        delta: -signed_amount(entry.kind, entry.amount),
    })
}

/// The adjustments to apply when a transaction is edited.
///
/// The old entry's effect is reversed against the account it was applied
/// to, then the new entry's effect is applied to the account it now
/// references. The two adjustments stay separate even when both entries
/// reference the same account, so each one is persisted on its own.
pub fn edit_adjustments(old: &LedgerEntry, new: &LedgerEntry) -> Vec<BalanceAdjustment> {
    [reversal_adjustment(old), creation_adjustment(new)]
        .into_iter()
        .flatten()
        .collect()
}

#[cfg(test)]
mod ledger_tests {
    use std::collections::HashMap;

    use crate::transaction::TransactionKind;

    use super::{
        BalanceAdjustment, LedgerEntry, creation_adjustment, edit_adjustments,
        reversal_adjustment, signed_amount,
    };

    /// Apply adjustments to a map of balances, the way the storage layer
    /// applies them to account rows.
    fn apply(balances: &mut HashMap<i64, f64>, adjustments: &[BalanceAdjustment]) {
        for adjustment in adjustments {
            *balances.entry(adjustment.account_id).or_insert(0.0) += adjustment.delta;
        }
    }

    #[test]
    fn income_is_positive_expense_is_negative() {
        assert_eq!(signed_amount(TransactionKind::Income, 500.0), 500.0);
        assert_eq!(signed_amount(TransactionKind::Expense, 500.0), -500.0);
    }

    #[test]
    fn creation_without_account_is_a_no_op() {
        let entry = LedgerEntry {
            account_id: None,
            kind: TransactionKind::Expense,
            amount: 12.3,
        };

        assert_eq!(creation_adjustment(&entry), None);
        assert_eq!(reversal_adjustment(&entry), None);
    }

    #[test]
    fn delete_restores_pre_creation_balance() {
        let mut balances = HashMap::from([(1, 1000.0)]);
        let entry = LedgerEntry {
            account_id: Some(1),
            kind: TransactionKind::Expense,
            amount: 200.0,
        };

        apply(&mut balances, &[creation_adjustment(&entry).unwrap()]);
        assert_eq!(balances[&1], 800.0);

        apply(&mut balances, &[reversal_adjustment(&entry).unwrap()]);
        assert_eq!(balances[&1], 1000.0);
    }

    #[test]
    fn edit_changes_amount_and_kind() {
        // Income 500 on a balance of 1000 gives 1500; editing the
        // transaction to a 150 expense must land on 1350.
        let mut balances = HashMap::from([(1, 1000.0)]);
        let old = LedgerEntry {
            account_id: Some(1),
            kind: TransactionKind::Income,
            amount: 500.0,
        };
        let new = LedgerEntry {
            account_id: Some(1),
            kind: TransactionKind::Expense,
            amount: 150.0,
        };

        apply(&mut balances, &[creation_adjustment(&old).unwrap()]);
        assert_eq!(balances[&1], 1500.0);

        apply(&mut balances, &edit_adjustments(&old, &new));
        assert_eq!(balances[&1], 1350.0);
    }

    #[test]
    fn edit_moves_transaction_between_accounts() {
        let mut balances = HashMap::from([(1, 100.0), (2, 100.0)]);
        let old = LedgerEntry {
            account_id: Some(1),
            kind: TransactionKind::Expense,
            amount: 40.0,
        };
        let new = LedgerEntry {
            account_id: Some(2),
            kind: TransactionKind::Expense,
            amount: 40.0,
        };

        apply(&mut balances, &[creation_adjustment(&old).unwrap()]);
        apply(&mut balances, &edit_adjustments(&old, &new));

        // Account 1 looks like the transaction never existed, account 2
        // looks like it was created there.
        assert_eq!(balances[&1], 100.0);
        assert_eq!(balances[&2], 60.0);
    }

    #[test]
    fn edit_to_unlinked_transaction_only_reverses() {
        let old = LedgerEntry {
            account_id: Some(1),
            kind: TransactionKind::Income,
            amount: 10.0,
        };
        let new = LedgerEntry {
            account_id: None,
            kind: TransactionKind::Income,
            amount: 10.0,
        };

        let adjustments = edit_adjustments(&old, &new);

        assert_eq!(adjustments, vec![BalanceAdjustment {
            account_id: 1,
            delta: -10.0,
        }]);
    }

    #[test]
    fn edit_keeps_two_separate_adjustments_on_same_account() {
        let old = LedgerEntry {
            account_id: Some(1),
            kind: TransactionKind::Expense,
            amount: 100.0,
        };
        let new = LedgerEntry {
            account_id: Some(1),
            kind: TransactionKind::Expense,
            amount: 150.0,
        };

        let adjustments = edit_adjustments(&old, &new);

        assert_eq!(adjustments, vec![
            BalanceAdjustment {
                account_id: 1,
                delta: 100.0,
            },
            BalanceAdjustment {
                account_id: 1,
                delta: -150.0,
            },
        ]);
    }

    #[test]
    fn replay_of_mixed_history_matches_signed_sum() {
        let mut balances = HashMap::from([(1, 0.0)]);
        let entries = [
            (TransactionKind::Income, 1000.0),
            (TransactionKind::Expense, 250.0),
            (TransactionKind::Expense, 125.5),
            (TransactionKind::Income, 75.25),
        ];

        for (kind, amount) in entries {
            let entry = LedgerEntry {
                account_id: Some(1),
                kind,
                amount,
            };
            apply(&mut balances, &[creation_adjustment(&entry).unwrap()]);
        }

        let want: f64 = entries
            .iter()
            .map(|(kind, amount)| signed_amount(*kind, *amount))
            .sum();
        assert_eq!(balances[&1], want);
    }
}
