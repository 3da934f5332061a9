//! Verity Net Layer
//!
//! Provides the HTTP plumbing shared by every provider adapter:
//! - Client construction with optional proxy and user-agent rotation
//! - Deadline-bounded fetches with a typed error taxonomy
//! - HTML and Atom text extraction

pub mod client;
pub mod fetch;
pub mod markup;

pub use client::*;
pub use fetch::*;
pub use markup::*;
