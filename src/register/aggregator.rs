//! Sums transactions and withdrawals into a reconciliation summary

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::*;
use crate::utils::validation::validate_non_negative_amount;

/// Caller-supplied restriction on which transactions are summed.
/// Withdrawals are never filtered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionFilter {
    pub payment_method: Option<PaymentMethod>,
    /// Compared case-insensitively
    pub category: Option<String>,
}

impl TransactionFilter {
    /// Filter that accepts everything
    pub fn all() -> Self {
        Self::default()
    }

    pub fn payment_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = Some(method);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn matches(&self, transaction: &CashTransaction) -> bool {
        let method_matches = self
            .payment_method
            .as_ref()
            .is_none_or(|method| &transaction.payment_method == method);

        let category_matches = self.category.as_ref().is_none_or(|wanted| {
            transaction
                .category
                .as_ref()
                .is_some_and(|category| category.trim().eq_ignore_ascii_case(wanted.trim()))
        });

        method_matches && category_matches
    }
}

/// Aggregate transactions and withdrawals on top of an opening amount
pub fn aggregate(
    transactions: &[CashTransaction],
    withdrawals: &[Withdrawal],
    opening_amount: &BigDecimal,
) -> ReconciliationResult<ReconciliationSummary> {
    aggregate_filtered(transactions, withdrawals, opening_amount, &TransactionFilter::all())
}

/// Aggregate only the transactions accepted by `filter`.
///
/// Only the money fields are checked: a negative amount or an over-collected
/// deferred sale fails the whole call. Ids, reasons and installment counts
/// are a recording concern and never block a summary.
/// The result does not depend on input order.
pub fn aggregate_filtered(
    transactions: &[CashTransaction],
    withdrawals: &[Withdrawal],
    opening_amount: &BigDecimal,
    filter: &TransactionFilter,
) -> ReconciliationResult<ReconciliationSummary> {
    validate_non_negative_amount(opening_amount, "opening amount")?;

    let mut summary = ReconciliationSummary::empty(opening_amount.clone());

    for transaction in transactions.iter().filter(|t| filter.matches(t)) {
        transaction.validate_amounts()?;

        match transaction.transaction_type {
            TransactionType::Entry => {
                let collected = transaction.collected_amount();
                summary.total_entries += &collected;
                *summary
                    .payment_totals
                    .entry(transaction.payment_method.clone())
                    .or_insert_with(|| BigDecimal::from(0)) += &collected;
                summary.pending_deferred += transaction.pending_amount();
                summary.entry_count += 1;
            }
            TransactionType::Exit => {
                summary.total_exits += &transaction.amount;
                summary.exit_count += 1;
            }
        }
    }

    for withdrawal in withdrawals {
        withdrawal.validate_amount()?;
        summary.total_withdrawals += &withdrawal.amount;
        summary.withdrawal_count += 1;
    }

    summary.recompute_final_balance();

    debug!(
        entries = summary.entry_count,
        exits = summary.exit_count,
        withdrawals = summary.withdrawal_count,
        total_entries = %summary.total_entries,
        final_balance = %summary.final_balance,
        "aggregated register activity"
    );

    Ok(summary)
}

/// Sum several summaries into one, keeping the opening amount given
pub fn combine(summaries: &[ReconciliationSummary], opening_amount: BigDecimal) -> ReconciliationSummary {
    let mut combined = ReconciliationSummary::empty(opening_amount);

    for summary in summaries {
        combined.total_entries += &summary.total_entries;
        combined.total_exits += &summary.total_exits;
        combined.total_withdrawals += &summary.total_withdrawals;
        combined.pending_deferred += &summary.pending_deferred;
        combined.entry_count += summary.entry_count;
        combined.exit_count += summary.exit_count;
        combined.withdrawal_count += summary.withdrawal_count;

        for (method, amount) in &summary.payment_totals {
            *combined
                .payment_totals
                .entry(method.clone())
                .or_insert_with(|| BigDecimal::from(0)) += amount;
        }
    }

    combined.recompute_final_balance();
    combined
}
