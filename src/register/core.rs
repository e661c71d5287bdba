//! Cash register orchestrator that coordinates storage, reconciliation and reporting

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use crate::calendar::BusinessCalendar;
use crate::config::ReconciliationConfig;
use crate::register::aggregator::aggregate;
use crate::register::reconciler::{self, CloseSessionParams};
use crate::register::report::{
    build_daily_report, build_period_report, DailyReport, PeriodReport, ReportContext,
};
use crate::register::settlement::{settlement_schedule, CardSettlementRules, SettlementEstimate};
use crate::traits::*;
use crate::types::*;

/// Main cash register that runs sessions on top of a storage backend
pub struct CashRegister<S: CashRegisterStorage> {
    storage: S,
    context: ReportContext,
    settlement_rules: CardSettlementRules,
}

impl<S: CashRegisterStorage> CashRegister<S> {
    /// Create a cash register with the default configuration
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            context: ReportContext::default(),
            settlement_rules: CardSettlementRules::default(),
        }
    }

    /// Create a cash register from a validated configuration
    pub fn with_config(storage: S, config: &ReconciliationConfig) -> ReconciliationResult<Self> {
        Ok(Self {
            storage,
            context: ReportContext::from_config(config)?,
            settlement_rules: config.settlement.clone(),
        })
    }

    pub fn calendar(&self) -> &BusinessCalendar {
        &self.context.calendar
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    // Session operations
    /// Open the register for a business day
    pub async fn open_session(
        &mut self,
        business_date: NaiveDate,
        opening_amount: BigDecimal,
        operator: &str,
    ) -> ReconciliationResult<CashRegisterSession> {
        if let Some(existing) = self.storage.get_session(business_date).await? {
            return Err(ReconciliationError::InvalidState(format!(
                "Register already has session {} for {}",
                existing.id, business_date
            )));
        }

        let session = CashRegisterSession::open(
            business_date,
            opening_amount,
            operator.to_string(),
            Utc::now(),
        )?;
        self.storage.save_session(&session).await?;

        info!(
            session_id = %session.id,
            %business_date,
            opening_amount = %session.opening_amount,
            operator,
            "register opened"
        );

        Ok(session)
    }

    /// Get the session for a business day
    pub async fn get_session(
        &self,
        business_date: NaiveDate,
    ) -> ReconciliationResult<Option<CashRegisterSession>> {
        self.storage.get_session(business_date).await
    }

    /// Get the session for today's business day
    pub async fn current_session(&self) -> ReconciliationResult<Option<CashRegisterSession>> {
        self.get_session(self.calendar().today()).await
    }

    /// Close the register for a business day against the cash counted in the drawer
    pub async fn close_session(
        &mut self,
        business_date: NaiveDate,
        counted_amount: BigDecimal,
        operator: &str,
    ) -> ReconciliationResult<CashRegisterSession> {
        let session = self.storage.get_session(business_date).await?.ok_or_else(|| {
            ReconciliationError::InvalidState(format!(
                "No register session to close for {}",
                business_date
            ))
        })?;

        let summary = self
            .summary_for(business_date, &session.opening_amount)
            .await?;
        let closed = reconciler::close_session(
            &session,
            &summary,
            CloseSessionParams::new(counted_amount, operator.to_string(), Utc::now()),
        )?;

        self.storage.update_session(&closed).await?;
        reconciler::log_close(&closed, &self.context.tolerance);

        Ok(closed)
    }

    // Activity operations
    /// Record a sale or expense
    pub async fn record_transaction(
        &mut self,
        transaction: CashTransaction,
    ) -> ReconciliationResult<()> {
        transaction.validate_with_max_installments(self.settlement_rules.max_installments)?;

        let business_date = self.calendar().business_date(&transaction.timestamp);
        if let Some(session) = self.storage.get_session(business_date).await? {
            if session.is_closed() {
                warn!(
                    transaction_id = %transaction.id,
                    %business_date,
                    "recording a transaction on a closed day; its reconciliation is now stale"
                );
            }
        }

        self.storage.save_transaction(&transaction).await
    }

    /// Record cash removed from the till; the day's session must be open
    pub async fn record_withdrawal(&mut self, withdrawal: Withdrawal) -> ReconciliationResult<()> {
        withdrawal.validate()?;

        let business_date = self.calendar().business_date(&withdrawal.timestamp);
        match self.storage.get_session(business_date).await? {
            Some(session) if session.is_open() => {}
            Some(_) => {
                return Err(ReconciliationError::InvalidState(format!(
                    "Register for {} is already closed",
                    business_date
                )))
            }
            None => {
                return Err(ReconciliationError::InvalidState(format!(
                    "Register is not open for {}",
                    business_date
                )))
            }
        }

        info!(
            withdrawal_id = %withdrawal.id,
            amount = %withdrawal.amount,
            %business_date,
            "cash withdrawn from register"
        );

        self.storage.save_withdrawal(&withdrawal).await
    }

    // Reporting operations
    /// Summary of a business day so far
    pub async fn daily_summary(
        &self,
        business_date: NaiveDate,
    ) -> ReconciliationResult<ReconciliationSummary> {
        let opening_amount = self
            .storage
            .get_session(business_date)
            .await?
            .map(|s| s.opening_amount)
            .unwrap_or_else(|| BigDecimal::from(0));

        self.summary_for(business_date, &opening_amount).await
    }

    /// Report for one business day
    pub async fn daily_report(&self, business_date: NaiveDate) -> ReconciliationResult<DailyReport> {
        let (from, to) = self.calendar().day_bounds(business_date)?;
        let session = self.storage.get_session(business_date).await?;
        let transactions = self.storage.get_transactions(from, to).await?;
        let withdrawals = self.storage.get_withdrawals(from, to).await?;

        build_daily_report(
            &self.context,
            business_date,
            session.as_ref(),
            &transactions,
            &withdrawals,
        )
    }

    /// Report for every business day in an inclusive range
    pub async fn period_report(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> ReconciliationResult<PeriodReport> {
        let (from, to) = self.calendar().range_bounds(start_date, end_date)?;
        let sessions = self.storage.list_sessions(start_date, end_date).await?;
        let transactions = self.storage.get_transactions(from, to).await?;
        let withdrawals = self.storage.get_withdrawals(from, to).await?;

        build_period_report(
            &self.context,
            start_date,
            end_date,
            &sessions,
            &transactions,
            &withdrawals,
        )
    }

    /// Expected card payouts for sales made in an inclusive range
    pub async fn receivables_schedule(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> ReconciliationResult<Vec<SettlementEstimate>> {
        let (from, to) = self.calendar().range_bounds(start_date, end_date)?;
        let transactions = self.storage.get_transactions(from, to).await?;

        settlement_schedule(&transactions, &self.settlement_rules, self.calendar())
    }

    async fn summary_for(
        &self,
        business_date: NaiveDate,
        opening_amount: &BigDecimal,
    ) -> ReconciliationResult<ReconciliationSummary> {
        let (from, to) = self.calendar().day_bounds(business_date)?;
        let transactions = self.storage.get_transactions(from, to).await?;
        let withdrawals = self.storage.get_withdrawals(from, to).await?;

        aggregate(&transactions, &withdrawals, opening_amount)
    }
}
