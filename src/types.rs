//! Core types and data structures for the cash register

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::utils::validation::{
    validate_identifier, validate_installments, validate_non_negative_amount,
    validate_operator_id, validate_received_amount, validate_withdrawal_reason,
};

/// Largest card installment plan accepted unless configured otherwise
pub const DEFAULT_MAX_INSTALLMENTS: u32 = 24;

/// Payment methods accepted at the register
///
/// Serialized as a plain string. Tags that do not match a known method are
/// preserved in [`PaymentMethod::Other`] so historical records stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentMethod {
    /// Physical cash, the only method that passes through the drawer
    Cash,
    /// Instant bank transfer
    Pix,
    DebitCard,
    CreditCard,
    /// Sold on credit (a prazo), collected later in installments
    Deferred,
    /// Split across several methods at the point of sale
    Multiple,
    /// Unrecognised tag, kept verbatim
    Other(String),
}

impl PaymentMethod {
    /// Methods shown in every payment breakdown, in display order
    pub const DISPLAY_ORDER: [PaymentMethod; 6] = [
        PaymentMethod::Cash,
        PaymentMethod::Pix,
        PaymentMethod::CreditCard,
        PaymentMethod::DebitCard,
        PaymentMethod::Deferred,
        PaymentMethod::Multiple,
    ];

    /// Canonical tag for this method
    pub fn as_str(&self) -> &str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Pix => "pix",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::Deferred => "deferred",
            PaymentMethod::Multiple => "multiple",
            PaymentMethod::Other(tag) => tag,
        }
    }

    /// Parse a tag, accepting the legacy Portuguese spellings.
    /// Never fails: unknown tags become [`PaymentMethod::Other`].
    pub fn parse(tag: &str) -> Self {
        let normalized = tag.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "cash" | "dinheiro" => PaymentMethod::Cash,
            "pix" => PaymentMethod::Pix,
            "debit_card" | "debit" | "debito" | "cartao_debito" => PaymentMethod::DebitCard,
            "credit_card" | "credit" | "credito" | "cartao_credito" => PaymentMethod::CreditCard,
            "deferred" | "installment" | "a_prazo" | "aprazo" | "crediario" => {
                PaymentMethod::Deferred
            }
            "multiple" | "multiplo" | "multiplos" => PaymentMethod::Multiple,
            _ => PaymentMethod::Other(tag.trim().to_string()),
        }
    }

    /// Whether money received this way ends up in the physical drawer
    pub fn settles_in_drawer(&self) -> bool {
        matches!(self, PaymentMethod::Cash)
    }

    /// Whether this is a card method settled later by the acquirer
    pub fn is_card(&self) -> bool {
        matches!(self, PaymentMethod::DebitCard | PaymentMethod::CreditCard)
    }
}

impl From<&str> for PaymentMethod {
    fn from(tag: &str) -> Self {
        Self::parse(tag)
    }
}

impl From<String> for PaymentMethod {
    fn from(tag: String) -> Self {
        Self::parse(&tag)
    }
}

impl From<PaymentMethod> for String {
    fn from(method: PaymentMethod) -> Self {
        method.as_str().to_string()
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Direction of a cash-flow transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money coming in (a sale)
    #[serde(alias = "entrada")]
    Entry,
    /// Money going out (an expense)
    #[serde(alias = "saida")]
    Exit,
}

impl FromStr for TransactionType {
    type Err = ReconciliationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "entry" | "entrada" => Ok(TransactionType::Entry),
            "exit" | "saida" => Ok(TransactionType::Exit),
            other => Err(ReconciliationError::Validation(format!(
                "Unknown transaction type: {}",
                other
            ))),
        }
    }
}

/// A single entry or exit recorded against the register
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashTransaction {
    /// Unique identifier for the transaction
    pub id: String,
    pub transaction_type: TransactionType,
    /// Face amount of the transaction
    pub amount: BigDecimal,
    /// Amount collected so far, only meaningful for deferred sales
    pub amount_received: Option<BigDecimal>,
    pub payment_method: PaymentMethod,
    /// Free-form category used by report filters
    pub category: Option<String>,
    pub description: Option<String>,
    /// Number of card installments, credit card sales only
    pub installments: Option<u32>,
    /// When the transaction happened
    pub timestamp: DateTime<Utc>,
}

impl CashTransaction {
    /// Create a new transaction
    pub fn new(
        id: String,
        transaction_type: TransactionType,
        amount: BigDecimal,
        payment_method: PaymentMethod,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            transaction_type,
            amount,
            amount_received: None,
            payment_method,
            category: None,
            description: None,
            installments: None,
            timestamp,
        }
    }

    /// Create a sale
    pub fn entry(
        id: String,
        amount: BigDecimal,
        payment_method: PaymentMethod,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::new(id, TransactionType::Entry, amount, payment_method, timestamp)
    }

    /// Create an expense
    pub fn exit(
        id: String,
        amount: BigDecimal,
        payment_method: PaymentMethod,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::new(id, TransactionType::Exit, amount, payment_method, timestamp)
    }

    /// Create a sale on credit with the amount collected so far
    pub fn deferred_sale(
        id: String,
        amount: BigDecimal,
        amount_received: BigDecimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut transaction = Self::entry(id, amount, PaymentMethod::Deferred, timestamp);
        transaction.amount_received = Some(amount_received);
        transaction
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_installments(mut self, installments: u32) -> Self {
        self.installments = Some(installments);
        self
    }

    pub fn is_entry(&self) -> bool {
        self.transaction_type == TransactionType::Entry
    }

    /// Amount that has actually been collected.
    ///
    /// Deferred sales count only what was received; every other
    /// transaction counts its face amount.
    pub fn collected_amount(&self) -> BigDecimal {
        match self.payment_method {
            PaymentMethod::Deferred => self
                .amount_received
                .clone()
                .unwrap_or_else(|| BigDecimal::from(0)),
            _ => self.amount.clone(),
        }
    }

    /// Uncollected balance of a deferred sale, zero for everything else
    pub fn pending_amount(&self) -> BigDecimal {
        match self.payment_method {
            PaymentMethod::Deferred => &self.amount - self.collected_amount(),
            _ => BigDecimal::from(0),
        }
    }

    /// Validate the transaction for recording, allowing plans of up to
    /// [`DEFAULT_MAX_INSTALLMENTS`] installments
    pub fn validate(&self) -> ReconciliationResult<()> {
        self.validate_with_max_installments(DEFAULT_MAX_INSTALLMENTS)
    }

    /// Validate the transaction for recording against a configured installment limit
    pub fn validate_with_max_installments(&self, max_installments: u32) -> ReconciliationResult<()> {
        validate_identifier(&self.id)?;
        self.validate_amounts()?;
        validate_installments(self.installments, max_installments)
    }

    /// Check only the money fields, leaving ids and installments alone
    pub fn validate_amounts(&self) -> ReconciliationResult<()> {
        validate_non_negative_amount(&self.amount, "transaction amount")?;

        if self.payment_method == PaymentMethod::Deferred {
            if let Some(received) = &self.amount_received {
                validate_received_amount(&self.amount, received)?;
            }
        }

        Ok(())
    }
}

/// Cash physically removed from the till (sangria)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub id: String,
    pub amount: BigDecimal,
    pub reason: String,
    /// Operator who removed the cash
    pub operator: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Withdrawal {
    /// Create a new withdrawal
    pub fn new(id: String, amount: BigDecimal, reason: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            amount,
            reason,
            operator: None,
            timestamp,
        }
    }

    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    /// Validate the withdrawal for recording
    pub fn validate(&self) -> ReconciliationResult<()> {
        validate_identifier(&self.id)?;
        self.validate_amount()?;
        validate_withdrawal_reason(&self.reason)
    }

    pub fn validate_amount(&self) -> ReconciliationResult<()> {
        validate_non_negative_amount(&self.amount, "withdrawal amount")
    }
}

/// Lifecycle state of a register session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Open,
    /// Terminal
    Closed,
}

/// Outcome of comparing counted cash against the expected amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarianceStatus {
    /// Difference within tolerance
    Reconciled,
    /// More cash counted than expected
    Surplus,
    /// Less cash counted than expected
    Shortage,
}

impl VarianceStatus {
    /// Classify a counted-minus-expected difference.
    ///
    /// Magnitudes up to and including `tolerance` are reconciled.
    pub fn classify(difference: &BigDecimal, tolerance: &BigDecimal) -> Self {
        if difference.abs() <= *tolerance {
            VarianceStatus::Reconciled
        } else if *difference > BigDecimal::from(0) {
            VarianceStatus::Surplus
        } else {
            VarianceStatus::Shortage
        }
    }
}

/// One open-to-close lifecycle of the register for a business day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashRegisterSession {
    /// Unique identifier for the session
    pub id: String,
    /// Business day this session belongs to
    pub business_date: NaiveDate,
    pub status: SessionStatus,
    /// Cash in the drawer at opening, never changes afterwards
    pub opening_amount: BigDecimal,
    /// Cash counted at close
    pub closing_amount: Option<BigDecimal>,
    /// Cash the records say should be in the drawer at close
    pub expected_amount: Option<BigDecimal>,
    /// `closing_amount - expected_amount`
    pub difference: Option<BigDecimal>,
    pub opened_at: DateTime<Utc>,
    pub opened_by: String,
    pub closed_at: Option<DateTime<Utc>>,
    pub closed_by: Option<String>,
    pub notes: Option<String>,
}

impl CashRegisterSession {
    /// Open a new session
    pub fn open(
        business_date: NaiveDate,
        opening_amount: BigDecimal,
        opened_by: String,
        opened_at: DateTime<Utc>,
    ) -> ReconciliationResult<Self> {
        validate_non_negative_amount(&opening_amount, "opening amount")?;
        validate_operator_id(&opened_by)?;

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            business_date,
            status: SessionStatus::Open,
            opening_amount,
            closing_amount: None,
            expected_amount: None,
            difference: None,
            opened_at,
            opened_by,
            closed_at: None,
            closed_by: None,
            notes: None,
        })
    }

    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open
    }

    pub fn is_closed(&self) -> bool {
        self.status == SessionStatus::Closed
    }

    /// Classify the recorded difference, `None` while the session is open
    pub fn variance_status(&self, tolerance: &BigDecimal) -> Option<VarianceStatus> {
        self.difference
            .as_ref()
            .map(|difference| VarianceStatus::classify(difference, tolerance))
    }
}

/// Totals for a set of transactions and withdrawals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    pub opening_amount: BigDecimal,
    /// Collected entries; deferred sales contribute only what was received
    pub total_entries: BigDecimal,
    pub total_exits: BigDecimal,
    pub total_withdrawals: BigDecimal,
    /// `opening_amount + total_entries - total_exits - total_withdrawals`
    pub final_balance: BigDecimal,
    /// Collected entries per payment method, sums to `total_entries`
    pub payment_totals: BTreeMap<PaymentMethod, BigDecimal>,
    /// Uncollected balance of deferred sales, never part of any total above
    pub pending_deferred: BigDecimal,
    pub entry_count: usize,
    pub exit_count: usize,
    pub withdrawal_count: usize,
}

impl ReconciliationSummary {
    /// Summary of no activity
    pub fn empty(opening_amount: BigDecimal) -> Self {
        Self {
            final_balance: opening_amount.clone(),
            opening_amount,
            total_entries: BigDecimal::from(0),
            total_exits: BigDecimal::from(0),
            total_withdrawals: BigDecimal::from(0),
            payment_totals: BTreeMap::new(),
            pending_deferred: BigDecimal::from(0),
            entry_count: 0,
            exit_count: 0,
            withdrawal_count: 0,
        }
    }

    /// Collected total for one payment method
    pub fn payment_total(&self, method: &PaymentMethod) -> BigDecimal {
        self.payment_totals
            .get(method)
            .cloned()
            .unwrap_or_else(|| BigDecimal::from(0))
    }

    /// Number of entries and exits
    pub fn transaction_count(&self) -> usize {
        self.entry_count + self.exit_count
    }

    /// Recompute `final_balance` from the totals
    pub fn recompute_final_balance(&mut self) {
        self.final_balance = &self.opening_amount + &self.total_entries
            - &self.total_exits
            - &self.total_withdrawals;
    }

    /// Check both summary invariants
    pub fn is_consistent(&self) -> bool {
        let bucket_total: BigDecimal = self.payment_totals.values().sum();
        let expected_balance = &self.opening_amount + &self.total_entries
            - &self.total_exits
            - &self.total_withdrawals;

        bucket_total == self.total_entries && expected_balance == self.final_balance
    }
}

/// Errors that can occur in the cash register
#[derive(Debug, thiserror::Error)]
pub enum ReconciliationError {
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for cash register operations
pub type ReconciliationResult<T> = Result<T, ReconciliationError>;
