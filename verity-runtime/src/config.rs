//! Run configuration
//!
//! Everything tunable about a fact check, loadable from a TOML file:
//!
//! ```toml
//! cache_ttl_secs = 3600
//!
//! [run]
//! max_results_per_provider = 5
//! overall_deadline_ms = 25000
//! enabled_providers = ["pubmed", "openalex"]   # or "auto"
//!
//! [tiers]
//! registry = 0.5
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

use verity_core::{ProviderId, ProviderTier, UnknownProvider, DEFAULT_DEADLINE_MS, DEFAULT_MAX_RESULTS};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Which providers a run may use
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawEnabled", into = "RawEnabled")]
pub enum EnabledProviders {
    /// Whatever the classifier selects
    #[default]
    Auto,
    /// Only these, intersected with the selection
    Only(Vec<ProviderId>),
}

impl EnabledProviders {
    pub fn as_filter(&self) -> Option<&[ProviderId]> {
        match self {
            EnabledProviders::Auto => None,
            EnabledProviders::Only(ids) => Some(ids),
        }
    }
}

impl FromStr for EnabledProviders {
    type Err = UnknownProvider;

    /// `auto`, or a comma-separated list of provider ids
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(EnabledProviders::Auto);
        }
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(ProviderId::from_str)
            .collect::<Result<Vec<_>, _>>()
            .map(EnabledProviders::Only)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawEnabled {
    Keyword(String),
    List(Vec<ProviderId>),
}

impl TryFrom<RawEnabled> for EnabledProviders {
    type Error = String;

    fn try_from(raw: RawEnabled) -> Result<Self, Self::Error> {
        match raw {
            RawEnabled::Keyword(k) if k.eq_ignore_ascii_case("auto") => Ok(EnabledProviders::Auto),
            RawEnabled::Keyword(k) => Err(format!("expected \"auto\" or a list, got \"{}\"", k)),
            RawEnabled::List(ids) => Ok(EnabledProviders::Only(ids)),
        }
    }
}

impl From<EnabledProviders> for RawEnabled {
    fn from(enabled: EnabledProviders) -> Self {
        match enabled {
            EnabledProviders::Auto => RawEnabled::Keyword("auto".to_string()),
            EnabledProviders::Only(ids) => RawEnabled::List(ids),
        }
    }
}

/// Per-query options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub max_results_per_provider: usize,
    pub overall_deadline_ms: u64,
    pub enabled_providers: EnabledProviders,
    /// Branches are cut this long before the overall deadline, leaving
    /// time to rank and consolidate
    pub grace_ms: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_results_per_provider: DEFAULT_MAX_RESULTS,
            overall_deadline_ms: DEFAULT_DEADLINE_MS,
            enabled_providers: EnabledProviders::Auto,
            grace_ms: 250,
        }
    }
}

impl RunConfig {
    pub fn with_deadline_ms(mut self, deadline_ms: u64) -> Self {
        self.overall_deadline_ms = deadline_ms;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results_per_provider = max_results;
        self
    }

    pub fn with_enabled(mut self, enabled: EnabledProviders) -> Self {
        self.enabled_providers = enabled;
        self
    }

    pub fn overall_budget(&self) -> Duration {
        Duration::from_millis(self.overall_deadline_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_results_per_provider == 0 {
            return Err(ConfigError::Invalid("max_results_per_provider must be at least 1".to_string()));
        }
        if self.overall_deadline_ms == 0 {
            return Err(ConfigError::Invalid("overall_deadline_ms must be positive".to_string()));
        }
        if self.grace_ms >= self.overall_deadline_ms {
            return Err(ConfigError::Invalid("grace_ms must be below overall_deadline_ms".to_string()));
        }
        Ok(())
    }
}

/// Share of the overall deadline granted to each provider tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierBudgets {
    pub reasoning: f64,
    pub registry: f64,
    pub specialist: f64,
}

impl Default for TierBudgets {
    fn default() -> Self {
        Self {
            reasoning: 0.9,
            registry: 0.5,
            specialist: 0.6,
        }
    }
}

impl TierBudgets {
    pub fn fraction(&self, tier: ProviderTier) -> f64 {
        match tier {
            ProviderTier::Reasoning => self.reasoning,
            ProviderTier::Registry => self.registry,
            ProviderTier::Specialist => self.specialist,
        }
    }

    /// Deadline for a branch of `tier`, never later than `cutoff`
    pub fn deadline_for(&self, tier: ProviderTier, start: Instant, budget: Duration, cutoff: Instant) -> Instant {
        (start + budget.mul_f64(self.fraction(tier))).min(cutoff)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("reasoning", self.reasoning),
            ("registry", self.registry),
            ("specialist", self.specialist),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::Invalid(format!(
                    "tier budget {} must be in (0, 1], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Complete fact-check configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactCheckConfig {
    pub run: RunConfig,
    pub tiers: TierBudgets,
    pub cache_ttl_secs: u64,
    pub cache_capacity: u64,
    pub session_ttl_secs: u64,
    pub max_sessions: usize,
}

impl Default for FactCheckConfig {
    fn default() -> Self {
        Self {
            run: RunConfig::default(),
            tiers: TierBudgets::default(),
            cache_ttl_secs: 3600,
            cache_capacity: 256,
            session_ttl_secs: 1800,
            max_sessions: 512,
        }
    }
}

impl FactCheckConfig {
    /// Load and validate a TOML config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.run.validate()?;
        self.tiers.validate()?;
        if self.cache_capacity == 0 || self.max_sessions == 0 {
            return Err(ConfigError::Invalid("cache_capacity and max_sessions must be positive".to_string()));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        let secs = self.session_ttl_secs.min(i64::MAX as u64 / 1000);
        chrono::Duration::seconds(secs as i64)
    }
}
