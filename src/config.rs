//! Configuration for the cash register
//!
//! Loaded from TOML. Every field has a default, so an empty document is a
//! valid configuration for a Sao Paulo business.
//!
//! ```toml
//! utc_offset = "-03:00"
//! reconciliation_tolerance = "0.01"
//!
//! [settlement]
//! installment_interval_days = 30
//! max_installments = 24
//!
//! [settlement.debit]
//! days_to_settle = 1
//! fee_rate = "1.99"
//!
//! [settlement.credit]
//! days_to_settle = 30
//! fee_rate = "3.49"
//! ```

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::calendar::{BusinessCalendar, SAO_PAULO_UTC_OFFSET};
use crate::register::settlement::CardSettlementRules;
use crate::types::*;

/// Cash register configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconciliationConfig {
    /// Fixed UTC offset that defines business day boundaries
    pub utc_offset: String,
    /// Largest counted-vs-expected difference still treated as reconciled.
    /// Write it as a string in TOML to keep it exact.
    pub reconciliation_tolerance: BigDecimal,
    /// Card payout terms
    pub settlement: CardSettlementRules,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            utc_offset: SAO_PAULO_UTC_OFFSET.to_string(),
            reconciliation_tolerance: BigDecimal::new(1.into(), 2),
            settlement: CardSettlementRules::default(),
        }
    }
}

impl ReconciliationConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> ReconciliationResult<Self> {
        let config: Self = toml::from_str(source)
            .map_err(|e| ReconciliationError::Config(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> ReconciliationResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            ReconciliationError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&source)
    }

    /// Serialize back to TOML
    pub fn to_toml_string(&self) -> ReconciliationResult<String> {
        toml::to_string(self).map_err(|e| ReconciliationError::Config(e.to_string()))
    }

    /// Business calendar for the configured offset
    pub fn calendar(&self) -> ReconciliationResult<BusinessCalendar> {
        BusinessCalendar::from_utc_offset(&self.utc_offset)
    }

    pub fn validate(&self) -> ReconciliationResult<()> {
        self.calendar()?;

        if self.reconciliation_tolerance < BigDecimal::from(0) {
            return Err(ReconciliationError::Config(format!(
                "Reconciliation tolerance cannot be negative: {}",
                self.reconciliation_tolerance
            )));
        }

        self.settlement
            .validate()
            .map_err(|e| ReconciliationError::Config(e.to_string()))
    }
}
