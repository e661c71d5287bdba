//! # Cash Register Core
//!
//! Reconciliation and reporting for a small business cash register: sums a
//! day's sales, expenses and till withdrawals, works out how much cash should
//! be in the drawer, and records the counted-vs-expected difference when the
//! register closes.
//!
//! ## Features
//!
//! - **Exact money**: every amount is a `BigDecimal`, never a float
//! - **Deferred sales**: sales on credit count only what was collected
//! - **Sessions**: open/close lifecycle with a one-shot close and variance classification
//! - **Reports**: daily reports and multi-day period roll-ups with statistics
//! - **Card settlement**: expected acquirer payouts for debit and credit sales
//! - **Business calendar**: one configured UTC offset decides every day boundary
//! - **Storage abstraction**: backend-agnostic design with trait-based storage
//!
//! ## Quick Start
//!
//! ```rust
//! use cash_register_core::{aggregate, expected_cash_in_hand, CashTransaction, PaymentMethod};
//! use bigdecimal::BigDecimal;
//! use chrono::Utc;
//!
//! let sale = CashTransaction::entry(
//!     "sale-1".to_string(),
//!     BigDecimal::from(50),
//!     PaymentMethod::Cash,
//!     Utc::now(),
//! );
//! let summary = aggregate(&[sale], &[], &BigDecimal::from(100)).unwrap();
//! assert_eq!(expected_cash_in_hand(&summary), BigDecimal::from(150));
//! ```

pub mod calendar;
pub mod config;
pub mod register;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use calendar::*;
pub use config::*;
pub use register::*;
pub use traits::*;
pub use types::*;
