//! Verity Runtime - the fan-out orchestrator
//!
//! [`FactChecker`] turns a claim into one [`verity_core::ConsolidatedResult`]
//! by querying every selected provider and reasoning engine concurrently.
//! The cache, admission gate and session store are injected seams; the
//! defaults are a no-op cache, an open gate and no session tracking.

pub mod admission;
pub mod cache;
pub mod config;
pub mod orchestrator;
pub mod sinks;

pub use admission::*;
pub use cache::*;
pub use config::*;
pub use orchestrator::*;
pub use sinks::*;
