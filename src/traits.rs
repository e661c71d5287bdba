//! Storage abstraction for register data

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::types::*;

/// Storage abstraction for the cash register
///
/// The reconciliation core never performs I/O itself. Sessions,
/// transactions and withdrawals are fetched through this trait so any
/// backend (SQL database, REST API, in-memory) can supply them.
///
/// Implementations own the persistence guarantees the core cannot give:
/// at most one session per business day, at most one successful
/// transition of a stored session to closed, and no replacement of a stored
/// transaction or withdrawal by a later save with the same id.
#[async_trait]
pub trait CashRegisterStorage: Send + Sync {
    /// Save a newly opened session; fails if the day already has one
    async fn save_session(&mut self, session: &CashRegisterSession) -> ReconciliationResult<()>;

    /// Get the session for a business day
    async fn get_session(
        &self,
        business_date: NaiveDate,
    ) -> ReconciliationResult<Option<CashRegisterSession>>;

    /// List sessions whose business day falls within the inclusive range
    async fn list_sessions(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> ReconciliationResult<Vec<CashRegisterSession>>;

    /// Replace a stored session; a stored closed session must never be overwritten
    async fn update_session(&mut self, session: &CashRegisterSession) -> ReconciliationResult<()>;

    /// Save a new transaction; an id that is already stored fails with
    /// `InvalidState` and leaves the stored record untouched
    async fn save_transaction(&mut self, transaction: &CashTransaction)
        -> ReconciliationResult<()>;

    /// List transactions with `from <= timestamp < to`
    async fn get_transactions(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ReconciliationResult<Vec<CashTransaction>>;

    /// Save a new withdrawal; an id that is already stored fails with
    /// `InvalidState` and leaves the stored record untouched
    async fn save_withdrawal(&mut self, withdrawal: &Withdrawal) -> ReconciliationResult<()>;

    /// List withdrawals with `from <= timestamp < to`
    async fn get_withdrawals(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ReconciliationResult<Vec<Withdrawal>>;
}
