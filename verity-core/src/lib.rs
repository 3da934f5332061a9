//! Verity Core - domain model and pure algorithms for multi-source fact checking
//!
//! This crate provides the foundational primitives:
//! - Query, evidence, outcome and verdict types
//! - The provider catalog and provider selection
//! - Domain classification, credibility assessment, ranking and consolidation
//! - Citation heuristics, progress updates and the session store
//!
//! Nothing here performs I/O.

pub mod types;
pub mod providers;
pub mod classifier;
pub mod selection;
pub mod credibility;
pub mod ranking;
pub mod consolidation;
pub mod citations;
pub mod progress;
pub mod store;

pub use types::*;
pub use providers::*;
pub use classifier::*;
pub use selection::*;
pub use credibility::*;
pub use ranking::*;
pub use consolidation::*;
pub use progress::*;
pub use store::*;

/// Default results requested from each provider
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Default overall deadline for one fact check, in milliseconds
pub const DEFAULT_DEADLINE_MS: u64 = 25_000;

/// Upper bound on the confidence of a result where every branch failed
pub const FAILED_CONFIDENCE_CEILING: f64 = 0.4;
