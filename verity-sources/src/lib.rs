//! Verity Sources
//!
//! Everything that talks to the outside world on behalf of a fact check:
//! - **Adapters**: one per evidence source (fact-check registry, scholarly,
//!   medical, legal, economic, environmental and web search APIs)
//! - **Engines**: reasoning services that produce a verdict on a claim
//! - **Strategy**: the ordered fallback chain over engines
//! - **Backends**: OpenAI-compatible and Anthropic LLM clients
//!
//! ## Prompts
//!
//! Engine instructions are TOML files in `prompts/`, embedded at compile
//! time. See [`prompts::PromptRegistry`] for loading overrides from disk.

pub mod adapters;
pub mod backend;
pub mod engines;
pub mod prompts;
pub mod registry;
pub mod strategy;
pub mod traits;
pub mod verdict;

pub use backend::*;
pub use prompts::*;
pub use registry::*;
pub use strategy::*;
pub use traits::*;
pub use verdict::*;
