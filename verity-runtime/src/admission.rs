//! Admission-control seam
//!
//! A deny means "do not start this query"; it never aborts a run that has
//! already begun.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Answer of an admission gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Admission {
    pub allowed: bool,
    pub retry_after: Option<Duration>,
}

impl Admission {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            retry_after: None,
        }
    }

    pub fn deny(retry_after: Option<Duration>) -> Self {
        Self {
            allowed: false,
            retry_after,
        }
    }
}

/// Decides whether a caller may start a query
#[async_trait]
pub trait AdmissionGate: Send + Sync {
    async fn allow(&self, identifier: &str) -> Admission;
}

/// Admits everything
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

#[async_trait]
impl AdmissionGate for AllowAll {
    async fn allow(&self, _identifier: &str) -> Admission {
        Admission::allow()
    }
}
