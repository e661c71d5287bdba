//! In-memory storage implementation for testing

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::traits::*;
use crate::types::*;

/// In-memory storage implementation for testing and development
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    sessions: Arc<RwLock<HashMap<NaiveDate, CashRegisterSession>>>,
    transactions: Arc<RwLock<HashMap<String, CashTransaction>>>,
    withdrawals: Arc<RwLock<HashMap<String, Withdrawal>>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            transactions: Arc::new(RwLock::new(HashMap::new())),
            withdrawals: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) -> ReconciliationResult<()> {
        write(&self.sessions)?.clear();
        write(&self.transactions)?.clear();
        write(&self.withdrawals)?.clear();
        Ok(())
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn read<T>(lock: &RwLock<T>) -> ReconciliationResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| ReconciliationError::Storage("storage lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> ReconciliationResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| ReconciliationError::Storage("storage lock poisoned".to_string()))
}

fn within(timestamp: &DateTime<Utc>, from: &DateTime<Utc>, to: &DateTime<Utc>) -> bool {
    timestamp >= from && timestamp < to
}

#[async_trait]
impl CashRegisterStorage for MemoryStorage {
    async fn save_session(&mut self, session: &CashRegisterSession) -> ReconciliationResult<()> {
        let mut sessions = write(&self.sessions)?;
        if sessions.contains_key(&session.business_date) {
            return Err(ReconciliationError::InvalidState(format!(
                "A session already exists for {}",
                session.business_date
            )));
        }
        sessions.insert(session.business_date, session.clone());
        Ok(())
    }

    async fn get_session(
        &self,
        business_date: NaiveDate,
    ) -> ReconciliationResult<Option<CashRegisterSession>> {
        Ok(read(&self.sessions)?.get(&business_date).cloned())
    }

    async fn list_sessions(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> ReconciliationResult<Vec<CashRegisterSession>> {
        let sessions = read(&self.sessions)?;
        let mut filtered: Vec<CashRegisterSession> = sessions
            .values()
            .filter(|s| s.business_date >= start_date && s.business_date <= end_date)
            .cloned()
            .collect();
        filtered.sort_by_key(|s| s.business_date);
        Ok(filtered)
    }

    async fn update_session(&mut self, session: &CashRegisterSession) -> ReconciliationResult<()> {
        let mut sessions = write(&self.sessions)?;
        let stored = sessions.get(&session.business_date).ok_or_else(|| {
            ReconciliationError::NotFound(format!("No session for {}", session.business_date))
        })?;

        if stored.id != session.id {
            return Err(ReconciliationError::NotFound(format!(
                "Session {} not found",
                session.id
            )));
        }

        if stored.is_closed() {
            return Err(ReconciliationError::InvalidState(format!(
                "Session {} is already closed",
                stored.id
            )));
        }

        sessions.insert(session.business_date, session.clone());
        Ok(())
    }

    async fn save_transaction(
        &mut self,
        transaction: &CashTransaction,
    ) -> ReconciliationResult<()> {
        let mut transactions = write(&self.transactions)?;
        if transactions.contains_key(&transaction.id) {
            return Err(ReconciliationError::InvalidState(format!(
                "Transaction {} already exists",
                transaction.id
            )));
        }
        transactions.insert(transaction.id.clone(), transaction.clone());
        Ok(())
    }

    async fn get_transactions(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ReconciliationResult<Vec<CashTransaction>> {
        let transactions = read(&self.transactions)?;
        Ok(transactions
            .values()
            .filter(|t| within(&t.timestamp, &from, &to))
            .cloned()
            .collect())
    }

    async fn save_withdrawal(&mut self, withdrawal: &Withdrawal) -> ReconciliationResult<()> {
        let mut withdrawals = write(&self.withdrawals)?;
        if withdrawals.contains_key(&withdrawal.id) {
            return Err(ReconciliationError::InvalidState(format!(
                "Withdrawal {} already exists",
                withdrawal.id
            )));
        }
        withdrawals.insert(withdrawal.id.clone(), withdrawal.clone());
        Ok(())
    }

    async fn get_withdrawals(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ReconciliationResult<Vec<Withdrawal>> {
        let withdrawals = read(&self.withdrawals)?;
        Ok(withdrawals
            .values()
            .filter(|w| within(&w.timestamp, &from, &to))
            .cloned()
            .collect())
    }
}
