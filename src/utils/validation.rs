//! Validation utilities

use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use crate::types::*;

/// Validate that an amount is zero or positive.
///
/// Negative amounts are rejected rather than clamped so that bad upstream
/// data surfaces instead of silently vanishing from the totals.
pub fn validate_non_negative_amount(amount: &BigDecimal, field: &str) -> ReconciliationResult<()> {
    if *amount < BigDecimal::from(0) {
        Err(ReconciliationError::Validation(format!(
            "{} cannot be negative: {}",
            field, amount
        )))
    } else {
        Ok(())
    }
}

/// Validate the collected part of a deferred sale
pub fn validate_received_amount(
    amount: &BigDecimal,
    received: &BigDecimal,
) -> ReconciliationResult<()> {
    validate_non_negative_amount(received, "amount received")?;

    if received > amount {
        return Err(ReconciliationError::Validation(format!(
            "Amount received ({}) exceeds sale amount ({})",
            received, amount
        )));
    }

    Ok(())
}

/// Validate that a date range is well ordered
pub fn validate_date_range(start_date: NaiveDate, end_date: NaiveDate) -> ReconciliationResult<()> {
    if end_date < start_date {
        return Err(ReconciliationError::Validation(format!(
            "End date {} is before start date {}",
            end_date, start_date
        )));
    }

    Ok(())
}

/// Validate a card installment count against the largest plan accepted
pub fn validate_installments(installments: Option<u32>, max_installments: u32) -> ReconciliationResult<()> {
    match installments {
        Some(0) => Err(ReconciliationError::Validation(
            "Installment count must be at least 1".to_string(),
        )),
        Some(count) if count > max_installments => Err(ReconciliationError::Validation(format!(
            "Installment count {} exceeds the maximum of {}",
            count, max_installments
        ))),
        _ => Ok(()),
    }
}

/// Validate a record identifier
pub fn validate_identifier(id: &str) -> ReconciliationResult<()> {
    if id.trim().is_empty() {
        return Err(ReconciliationError::Validation(
            "Identifier cannot be empty".to_string(),
        ));
    }

    if id.len() > 64 {
        return Err(ReconciliationError::Validation(
            "Identifier cannot exceed 64 characters".to_string(),
        ));
    }

    if !id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ReconciliationError::Validation(
            "Identifier can only contain alphanumeric characters, dashes, and underscores"
                .to_string(),
        ));
    }

    Ok(())
}

/// Validate the operator opening or closing a session
pub fn validate_operator_id(operator: &str) -> ReconciliationResult<()> {
    if operator.trim().is_empty() {
        return Err(ReconciliationError::Validation(
            "Operator cannot be empty".to_string(),
        ));
    }

    if operator.len() > 100 {
        return Err(ReconciliationError::Validation(
            "Operator cannot exceed 100 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validate the reason given for a withdrawal
pub fn validate_withdrawal_reason(reason: &str) -> ReconciliationResult<()> {
    if reason.trim().is_empty() {
        return Err(ReconciliationError::Validation(
            "Withdrawal reason cannot be empty".to_string(),
        ));
    }

    if reason.len() > 500 {
        return Err(ReconciliationError::Validation(
            "Withdrawal reason cannot exceed 500 characters".to_string(),
        ));
    }

    Ok(())
}
