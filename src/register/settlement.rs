//! Card receivable settlement estimation
//!
//! Card sales are paid out by the acquirer some days after the sale, minus a
//! fee. Credit sales split into installments are paid one installment per
//! interval. This module turns card entries into the payouts to expect.

use bigdecimal::BigDecimal;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calendar::BusinessCalendar;
use crate::types::*;
use crate::utils::validation::validate_non_negative_amount;

/// Upper limit for a configured `max_installments`
pub const MAX_INSTALLMENTS_CEILING: u32 = 120;

/// Payout delay and fee for one card method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementTerms {
    /// Days between the sale and the first payout
    pub days_to_settle: u32,
    /// Fee as a percentage of the gross amount
    pub fee_rate: BigDecimal,
}

impl SettlementTerms {
    pub fn new(days_to_settle: u32, fee_rate: BigDecimal) -> Self {
        Self {
            days_to_settle,
            fee_rate,
        }
    }

    /// Fee charged on a gross amount, rounded to cents
    pub fn fee_for(&self, gross_amount: &BigDecimal) -> BigDecimal {
        (gross_amount * &self.fee_rate / BigDecimal::from(100)).round(2)
    }

    pub fn validate(&self) -> ReconciliationResult<()> {
        validate_non_negative_amount(&self.fee_rate, "fee rate")?;

        if self.fee_rate > BigDecimal::from(100) {
            return Err(ReconciliationError::Validation(format!(
                "Fee rate cannot exceed 100%: {}",
                self.fee_rate
            )));
        }

        Ok(())
    }
}

/// Settlement terms per card method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardSettlementRules {
    /// Days between consecutive credit installments
    pub installment_interval_days: u32,
    /// Largest credit installment plan accepted
    pub max_installments: u32,
    pub debit: SettlementTerms,
    pub credit: SettlementTerms,
}

impl Default for CardSettlementRules {
    fn default() -> Self {
        Self {
            installment_interval_days: 30,
            max_installments: DEFAULT_MAX_INSTALLMENTS,
            debit: SettlementTerms::new(1, BigDecimal::new(199.into(), 2)),
            credit: SettlementTerms::new(30, BigDecimal::new(349.into(), 2)),
        }
    }
}

impl CardSettlementRules {
    /// Terms for a payment method, `None` for anything that is not a card
    pub fn terms_for(&self, method: &PaymentMethod) -> Option<&SettlementTerms> {
        match method {
            PaymentMethod::DebitCard => Some(&self.debit),
            PaymentMethod::CreditCard => Some(&self.credit),
            _ => None,
        }
    }

    pub fn validate(&self) -> ReconciliationResult<()> {
        self.debit.validate()?;
        self.credit.validate()?;

        if self.installment_interval_days == 0 {
            return Err(ReconciliationError::Validation(
                "Installment interval must be at least one day".to_string(),
            ));
        }

        if !(1..=MAX_INSTALLMENTS_CEILING).contains(&self.max_installments) {
            return Err(ReconciliationError::Validation(format!(
                "Maximum installments must be between 1 and {}: {}",
                MAX_INSTALLMENTS_CEILING, self.max_installments
            )));
        }

        Ok(())
    }
}

/// One expected acquirer payout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementEstimate {
    pub transaction_id: String,
    pub payment_method: PaymentMethod,
    /// 1-based installment number
    pub installment: u32,
    pub installment_count: u32,
    pub sale_date: NaiveDate,
    pub expected_date: NaiveDate,
    pub gross_amount: BigDecimal,
    pub fee_amount: BigDecimal,
    pub net_amount: BigDecimal,
}

/// Expected payouts for one transaction.
///
/// Exits and non-card entries produce nothing. Debit sales always settle in
/// one payout; credit sales settle per installment with any rounding
/// remainder on the last installment.
pub fn estimate_settlement(
    transaction: &CashTransaction,
    rules: &CardSettlementRules,
    calendar: &BusinessCalendar,
) -> ReconciliationResult<Vec<SettlementEstimate>> {
    if !transaction.is_entry() {
        return Ok(Vec::new());
    }

    let Some(terms) = rules.terms_for(&transaction.payment_method) else {
        return Ok(Vec::new());
    };

    transaction.validate_with_max_installments(rules.max_installments)?;

    let installment_count = match transaction.payment_method {
        PaymentMethod::CreditCard => transaction.installments.unwrap_or(1).max(1),
        _ => 1,
    };

    let sale_date = calendar.business_date(&transaction.timestamp);
    let count = BigDecimal::from(installment_count);
    let base_installment = (&transaction.amount / &count).with_scale(2);
    let earlier_installments = &base_installment * &BigDecimal::from(installment_count - 1);
    let last_installment = &transaction.amount - &earlier_installments;

    let mut estimates = Vec::new();
    for installment in 1..=installment_count {
        let gross_amount = if installment == installment_count {
            last_installment.clone()
        } else {
            base_installment.clone()
        };

        let offset_days = u64::from(terms.days_to_settle)
            + u64::from(installment - 1) * u64::from(rules.installment_interval_days);
        let expected_date = sale_date
            .checked_add_days(Days::new(offset_days))
            .ok_or_else(|| {
                ReconciliationError::Validation(format!(
                    "Settlement date for {} is out of range",
                    transaction.id
                ))
            })?;

        let fee_amount = terms.fee_for(&gross_amount);
        let net_amount = &gross_amount - &fee_amount;

        estimates.push(SettlementEstimate {
            transaction_id: transaction.id.clone(),
            payment_method: transaction.payment_method.clone(),
            installment,
            installment_count,
            sale_date,
            expected_date,
            gross_amount,
            fee_amount,
            net_amount,
        });
    }

    Ok(estimates)
}

/// Expected payouts for many transactions, ordered by expected date
pub fn settlement_schedule(
    transactions: &[CashTransaction],
    rules: &CardSettlementRules,
    calendar: &BusinessCalendar,
) -> ReconciliationResult<Vec<SettlementEstimate>> {
    let mut schedule = Vec::new();
    for transaction in transactions {
        schedule.extend(estimate_settlement(transaction, rules, calendar)?);
    }

    schedule.sort_by(|a, b| {
        a.expected_date
            .cmp(&b.expected_date)
            .then_with(|| a.transaction_id.cmp(&b.transaction_id))
            .then_with(|| a.installment.cmp(&b.installment))
    });

    Ok(schedule)
}

/// Net amount expected to arrive between two dates inclusive
pub fn net_receivable_between(
    schedule: &[SettlementEstimate],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> BigDecimal {
    schedule
        .iter()
        .filter(|e| e.expected_date >= start_date && e.expected_date <= end_date)
        .map(|e| &e.net_amount)
        .sum()
}
