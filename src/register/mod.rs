//! Register module containing aggregation, reconciliation, reporting and settlement

pub mod aggregator;
pub mod core;
pub mod reconciler;
pub mod report;
pub mod settlement;

pub use aggregator::*;
pub use core::*;
pub use reconciler::*;
pub use report::*;
pub use settlement::*;
