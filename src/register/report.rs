//! Daily and period reports built from register activity

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::calendar::BusinessCalendar;
use crate::config::ReconciliationConfig;
use crate::register::aggregator::{aggregate_filtered, combine, TransactionFilter};
use crate::register::reconciler::{expected_cash_in_hand, Variance};
use crate::types::*;

/// Everything report building needs besides the data itself
#[derive(Debug, Clone, PartialEq)]
pub struct ReportContext {
    pub calendar: BusinessCalendar,
    /// Largest difference still treated as reconciled
    pub tolerance: BigDecimal,
    pub filter: TransactionFilter,
}

impl Default for ReportContext {
    fn default() -> Self {
        let config = ReconciliationConfig::default();
        Self {
            calendar: BusinessCalendar::default(),
            tolerance: config.reconciliation_tolerance,
            filter: TransactionFilter::all(),
        }
    }
}

impl ReportContext {
    pub fn from_config(config: &ReconciliationConfig) -> ReconciliationResult<Self> {
        config.validate()?;
        Ok(Self {
            calendar: config.calendar()?,
            tolerance: config.reconciliation_tolerance.clone(),
            filter: TransactionFilter::all(),
        })
    }

    pub fn with_filter(mut self, filter: TransactionFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// Collected amount and number of entries for one payment method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentBreakdown {
    pub method: PaymentMethod,
    pub amount: BigDecimal,
    pub count: usize,
}

/// Register activity for one business day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    /// `None` when nobody opened the register that day
    pub session: Option<CashRegisterSession>,
    pub summary: ReconciliationSummary,
    pub expected_cash_in_hand: BigDecimal,
    /// Present once the session is closed
    pub variance: Option<Variance>,
    pub payment_breakdown: Vec<PaymentBreakdown>,
}

impl DailyReport {
    /// No session and no activity; still a valid report
    pub fn is_empty(&self) -> bool {
        self.session.is_none()
            && self.summary.transaction_count() == 0
            && self.summary.withdrawal_count == 0
    }
}

/// Counts and averages over a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodStatistics {
    pub days_in_range: usize,
    pub total_transactions: usize,
    pub entry_count: usize,
    pub exit_count: usize,
    pub withdrawal_count: usize,
    /// Collected entries per entry, zero without entries
    pub average_ticket: BigDecimal,
    pub average_daily_entries: BigDecimal,
    pub average_daily_exits: BigDecimal,
}

/// Session discipline over a period; informational only
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatistics {
    pub days_with_session: usize,
    pub days_closed: usize,
    pub days_open: usize,
}

/// Register activity over a range of business days
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// One report per day, in date order, including days without activity
    pub days: Vec<DailyReport>,
    /// Period totals; the opening amount is that of the first session in range
    pub summary: ReconciliationSummary,
    /// `total_entries - total_exits - total_withdrawals`
    pub net_balance: BigDecimal,
    pub payment_breakdown: Vec<PaymentBreakdown>,
    pub statistics: PeriodStatistics,
    pub session_statistics: SessionStatistics,
}

/// Build the report for one business day.
///
/// Transactions and withdrawals outside `date` are ignored, so callers may
/// pass a wider slice. Without a session the opening amount is zero.
pub fn build_daily_report(
    context: &ReportContext,
    date: NaiveDate,
    session: Option<&CashRegisterSession>,
    transactions: &[CashTransaction],
    withdrawals: &[Withdrawal],
) -> ReconciliationResult<DailyReport> {
    if let Some(session) = session {
        if session.business_date != date {
            return Err(ReconciliationError::Validation(format!(
                "Session {} belongs to {}, not {}",
                session.id, session.business_date, date
            )));
        }
    }

    let day_transactions: Vec<CashTransaction> = transactions
        .iter()
        .filter(|t| context.calendar.contains(date, &t.timestamp))
        .cloned()
        .collect();
    let day_withdrawals: Vec<Withdrawal> = withdrawals
        .iter()
        .filter(|w| context.calendar.contains(date, &w.timestamp))
        .cloned()
        .collect();

    let opening_amount = session
        .map(|s| s.opening_amount.clone())
        .unwrap_or_else(|| BigDecimal::from(0));

    let summary = aggregate_filtered(
        &day_transactions,
        &day_withdrawals,
        &opening_amount,
        &context.filter,
    )?;

    let entry_counts = count_entries_by_method(&day_transactions, &context.filter);
    let payment_breakdown = breakdown(&summary.payment_totals, &entry_counts);

    Ok(DailyReport {
        date,
        session: session.cloned(),
        expected_cash_in_hand: expected_cash_in_hand(&summary),
        variance: session.and_then(|s| Variance::of_session(s, &context.tolerance)),
        summary,
        payment_breakdown,
    })
}

/// Build the report for every business day from `start_date` to `end_date` inclusive.
///
/// At most one session per day is accepted.
pub fn build_period_report(
    context: &ReportContext,
    start_date: NaiveDate,
    end_date: NaiveDate,
    sessions: &[CashRegisterSession],
    transactions: &[CashTransaction],
    withdrawals: &[Withdrawal],
) -> ReconciliationResult<PeriodReport> {
    let dates = context.calendar.days_in_range(start_date, end_date)?;
    let in_range = |date: &NaiveDate| *date >= start_date && *date <= end_date;

    let mut sessions_by_day: HashMap<NaiveDate, &CashRegisterSession> = HashMap::new();
    for session in sessions.iter().filter(|s| in_range(&s.business_date)) {
        if sessions_by_day.insert(session.business_date, session).is_some() {
            return Err(ReconciliationError::Validation(format!(
                "More than one session on {}",
                session.business_date
            )));
        }
    }

    let mut transactions_by_day: HashMap<NaiveDate, Vec<CashTransaction>> = HashMap::new();
    for transaction in transactions {
        let date = context.calendar.business_date(&transaction.timestamp);
        if in_range(&date) {
            transactions_by_day
                .entry(date)
                .or_default()
                .push(transaction.clone());
        }
    }

    let mut withdrawals_by_day: HashMap<NaiveDate, Vec<Withdrawal>> = HashMap::new();
    for withdrawal in withdrawals {
        let date = context.calendar.business_date(&withdrawal.timestamp);
        if in_range(&date) {
            withdrawals_by_day
                .entry(date)
                .or_default()
                .push(withdrawal.clone());
        }
    }

    let days = dates
        .iter()
        .map(|date| {
            build_daily_report(
                context,
                *date,
                sessions_by_day.get(date).copied(),
                transactions_by_day.get(date).map(Vec::as_slice).unwrap_or(&[]),
                withdrawals_by_day.get(date).map(Vec::as_slice).unwrap_or(&[]),
            )
        })
        .collect::<ReconciliationResult<Vec<_>>>()?;

    let opening_amount = days
        .iter()
        .find_map(|day| day.session.as_ref().map(|s| s.opening_amount.clone()))
        .unwrap_or_else(|| BigDecimal::from(0));
    let day_summaries: Vec<ReconciliationSummary> =
        days.iter().map(|day| day.summary.clone()).collect();
    let summary = combine(&day_summaries, opening_amount);

    let net_balance = &summary.total_entries - &summary.total_exits - &summary.total_withdrawals;

    let mut entry_counts: BTreeMap<PaymentMethod, usize> = BTreeMap::new();
    for line in days.iter().flat_map(|day| &day.payment_breakdown) {
        *entry_counts.entry(line.method.clone()).or_default() += line.count;
    }
    let payment_breakdown = breakdown(&summary.payment_totals, &entry_counts);

    let statistics = PeriodStatistics {
        days_in_range: dates.len(),
        total_transactions: summary.transaction_count(),
        entry_count: summary.entry_count,
        exit_count: summary.exit_count,
        withdrawal_count: summary.withdrawal_count,
        average_ticket: average(&summary.total_entries, summary.entry_count),
        average_daily_entries: average(&summary.total_entries, dates.len()),
        average_daily_exits: average(&summary.total_exits, dates.len()),
    };

    let session_statistics = days
        .iter()
        .filter_map(|day| day.session.as_ref())
        .fold(SessionStatistics::default(), |mut stats, session| {
            stats.days_with_session += 1;
            if session.is_closed() {
                stats.days_closed += 1;
            } else {
                stats.days_open += 1;
            }
            stats
        });

    debug!(
        %start_date,
        %end_date,
        days = dates.len(),
        transactions = statistics.total_transactions,
        %net_balance,
        "built period report"
    );

    Ok(PeriodReport {
        start_date,
        end_date,
        days,
        summary,
        net_balance,
        payment_breakdown,
        statistics,
        session_statistics,
    })
}

fn count_entries_by_method(
    transactions: &[CashTransaction],
    filter: &TransactionFilter,
) -> BTreeMap<PaymentMethod, usize> {
    let mut counts = BTreeMap::new();
    for transaction in transactions
        .iter()
        .filter(|t| t.is_entry() && filter.matches(t))
    {
        *counts.entry(transaction.payment_method.clone()).or_default() += 1;
    }
    counts
}

/// Fixed display methods first, then anything else seen, in tag order
fn breakdown(
    totals: &BTreeMap<PaymentMethod, BigDecimal>,
    counts: &BTreeMap<PaymentMethod, usize>,
) -> Vec<PaymentBreakdown> {
    let line = |method: &PaymentMethod| PaymentBreakdown {
        method: method.clone(),
        amount: totals
            .get(method)
            .cloned()
            .unwrap_or_else(|| BigDecimal::from(0)),
        count: counts.get(method).copied().unwrap_or(0),
    };

    let mut lines: Vec<PaymentBreakdown> = PaymentMethod::DISPLAY_ORDER.iter().map(line).collect();

    let mut others: Vec<&PaymentMethod> = totals
        .keys()
        .chain(counts.keys())
        .filter(|method| matches!(method, PaymentMethod::Other(_)))
        .collect();
    others.sort();
    others.dedup();
    lines.extend(others.into_iter().map(line));

    lines
}

fn average(total: &BigDecimal, count: usize) -> BigDecimal {
    if count == 0 {
        return BigDecimal::from(0);
    }
    (total / &BigDecimal::from(count as u64)).round(2)
}
