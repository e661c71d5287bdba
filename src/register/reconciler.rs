//! Expected cash-in-hand and the one-shot session close

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::types::*;
use crate::utils::validation::{validate_non_negative_amount, validate_operator_id};

/// Cash that should physically be in the drawer.
///
/// Only cash entries pass through the drawer; card and PIX money settles
/// elsewhere. Withdrawals leave the drawer. Exits are not subtracted.
pub fn expected_cash_in_hand(summary: &ReconciliationSummary) -> BigDecimal {
    &summary.opening_amount + summary.payment_total(&PaymentMethod::Cash)
        - &summary.total_withdrawals
}

/// Counted-minus-expected difference and its classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variance {
    pub expected_amount: BigDecimal,
    pub counted_amount: BigDecimal,
    /// Positive is surplus, negative is shortage
    pub difference: BigDecimal,
    pub status: VarianceStatus,
}

impl Variance {
    pub fn new(expected_amount: BigDecimal, counted_amount: BigDecimal, tolerance: &BigDecimal) -> Self {
        let difference = &counted_amount - &expected_amount;
        let status = VarianceStatus::classify(&difference, tolerance);
        Self {
            expected_amount,
            counted_amount,
            difference,
            status,
        }
    }

    /// Variance recorded on a closed session, `None` while it is open
    pub fn of_session(session: &CashRegisterSession, tolerance: &BigDecimal) -> Option<Self> {
        match (&session.expected_amount, &session.closing_amount) {
            (Some(expected), Some(counted)) if session.is_closed() => {
                Some(Self::new(expected.clone(), counted.clone(), tolerance))
            }
            _ => None,
        }
    }
}

/// Parameters for closing a session
#[derive(Debug, Clone)]
pub struct CloseSessionParams {
    /// Cash physically counted in the drawer
    pub counted_amount: BigDecimal,
    pub closed_by: String,
    pub closed_at: DateTime<Utc>,
    pub notes: Option<String>,
}

impl CloseSessionParams {
    pub fn new(counted_amount: BigDecimal, closed_by: String, closed_at: DateTime<Utc>) -> Self {
        Self {
            counted_amount,
            closed_by,
            closed_at,
            notes: None,
        }
    }
}

/// Close an open session against a summary of everything posted before the close.
///
/// Returns the closed session; the input is left untouched. Closing is a
/// one-time transition, so a closed session fails with `InvalidState`.
/// Callers persisting the result must still guard against two concurrent
/// closes of the same stored session.
pub fn close_session(
    session: &CashRegisterSession,
    summary: &ReconciliationSummary,
    params: CloseSessionParams,
) -> ReconciliationResult<CashRegisterSession> {
    if session.is_closed() {
        return Err(ReconciliationError::InvalidState(format!(
            "Session {} for {} is already closed",
            session.id, session.business_date
        )));
    }

    validate_non_negative_amount(&params.counted_amount, "counted amount")?;
    validate_operator_id(&params.closed_by)?;

    if summary.opening_amount != session.opening_amount {
        return Err(ReconciliationError::Validation(format!(
            "Summary opening amount {} does not match session opening amount {}",
            summary.opening_amount, session.opening_amount
        )));
    }

    if params.closed_at < session.opened_at {
        return Err(ReconciliationError::Validation(format!(
            "Session {} cannot close before it was opened",
            session.id
        )));
    }

    let expected_amount = expected_cash_in_hand(summary);
    let difference = &params.counted_amount - &expected_amount;

    let mut closed = session.clone();
    closed.status = SessionStatus::Closed;
    closed.closing_amount = Some(params.counted_amount);
    closed.expected_amount = Some(expected_amount);
    closed.difference = Some(difference);
    closed.closed_at = Some(params.closed_at);
    closed.closed_by = Some(params.closed_by);
    if params.notes.is_some() {
        closed.notes = params.notes;
    }

    Ok(closed)
}

/// Log the outcome of a close at a level matching its variance
pub(crate) fn log_close(session: &CashRegisterSession, tolerance: &BigDecimal) {
    let Some(variance) = Variance::of_session(session, tolerance) else {
        return;
    };

    match variance.status {
        VarianceStatus::Reconciled => info!(
            session_id = %session.id,
            business_date = %session.business_date,
            expected = %variance.expected_amount,
            counted = %variance.counted_amount,
            "register closed and reconciled"
        ),
        VarianceStatus::Surplus | VarianceStatus::Shortage => warn!(
            session_id = %session.id,
            business_date = %session.business_date,
            expected = %variance.expected_amount,
            counted = %variance.counted_amount,
            difference = %variance.difference,
            status = ?variance.status,
            "register closed with a cash difference"
        ),
    }
}
