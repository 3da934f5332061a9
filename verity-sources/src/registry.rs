//! Provider registry and source wiring
//!
//! Builds every evidence adapter and the reasoning-engine chain from API
//! keys, so callers only deal in [`ProviderId`]s.

use reqwest::Client;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use verity_core::{EngineId, ProviderId};

use crate::adapters::{
    ArxivProvider, BraveProvider, ClinicalTrialsProvider, CourtListenerProvider, EonetProvider,
    FactCheckProvider, GbifProvider, GdeltProvider, OpenAlexProvider, PubMedProvider,
    WikipediaProvider, WorldBankProvider,
};
use crate::engines::{CrossCheckEngine, DirectKnowledgeEngine, FactCheckEngine, WebReasoningEngine};
use crate::{FallbackChain, PromptError, PromptRegistry, SharedBackend, SharedEngine, SharedProvider};

/// API keys for external services, each optional
#[derive(Debug, Clone, Default)]
pub struct SourceKeys {
    pub perplexity: Option<String>,
    pub google_factcheck: Option<String>,
    pub brave: Option<String>,
    pub ncbi: Option<String>,
    pub courtlistener: Option<String>,
    pub openai: Option<String>,
    pub anthropic: Option<String>,
    pub openrouter: Option<String>,
}

impl SourceKeys {
    /// Read keys from the environment; empty values count as missing
    pub fn from_env() -> Self {
        Self {
            perplexity: env_key("PERPLEXITY_API_KEY"),
            google_factcheck: env_key("GOOGLE_FACTCHECK_API_KEY"),
            brave: env_key("BRAVE_API_KEY"),
            ncbi: env_key("NCBI_API_KEY"),
            courtlistener: env_key("COURTLISTENER_API_KEY"),
            openai: env_key("OPENAI_API_KEY"),
            anthropic: env_key("ANTHROPIC_API_KEY"),
            openrouter: env_key("OPENROUTER_API_KEY"),
        }
    }
}

fn env_key(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(non_empty)
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Evidence providers by id
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<ProviderId, SharedProvider>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider, replacing any with the same id
    pub fn register(&mut self, provider: SharedProvider) {
        self.providers.insert(provider.id(), provider);
    }

    pub fn get(&self, id: ProviderId) -> Option<&SharedProvider> {
        self.providers.get(&id)
    }

    pub fn contains(&self, id: ProviderId) -> bool {
        self.providers.contains_key(&id)
    }

    /// Registered ids, in catalog order
    pub fn ids(&self) -> Vec<ProviderId> {
        self.providers.keys().copied().collect()
    }

    /// Ids whose provider has the credentials it needs
    pub fn configured_ids(&self) -> Vec<ProviderId> {
        self.providers
            .iter()
            .filter(|(_, p)| p.is_configured())
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Everything the orchestrator queries: evidence providers, the
/// fallback chain and an optional independent cross-check
#[derive(Clone)]
pub struct SourceSet {
    pub registry: ProviderRegistry,
    pub chain: FallbackChain,
    pub cross_check: Option<SharedEngine>,
}

impl SourceSet {
    /// Wire up the standard adapters and engines.
    ///
    /// Every evidence adapter is registered; those missing a key report
    /// `provider_not_configured` when selected. Engines that cannot run at
    /// all (no key, no LLM backend) are left out of the chain. The chain
    /// order is web reasoning, fact-check registry, then direct knowledge.
    pub fn build(
        client: Client,
        keys: &SourceKeys,
        prompts: &PromptRegistry,
        backend: Option<SharedBackend>,
        cross_check: bool,
    ) -> Result<Self, PromptError> {
        let fact_check = Arc::new(FactCheckProvider::new(client.clone(), keys.google_factcheck.clone()));

        let mut registry = ProviderRegistry::new();
        registry.register(fact_check.clone());
        registry.register(Arc::new(OpenAlexProvider::new(client.clone())));
        registry.register(Arc::new(PubMedProvider::new(client.clone(), keys.ncbi.clone())));
        registry.register(Arc::new(ArxivProvider::new(client.clone())));
        registry.register(Arc::new(ClinicalTrialsProvider::new(client.clone())));
        registry.register(Arc::new(GdeltProvider::new(client.clone())));
        registry.register(Arc::new(WorldBankProvider::new(client.clone())));
        registry.register(Arc::new(GbifProvider::new(client.clone())));
        registry.register(Arc::new(EonetProvider::new(client.clone())));
        registry.register(Arc::new(WikipediaProvider::new(client.clone())));
        registry.register(Arc::new(CourtListenerProvider::new(
            client.clone(),
            keys.courtlistener.clone(),
        )));
        registry.register(Arc::new(BraveProvider::new(client.clone(), keys.brave.clone())));

        let mut chain = FallbackChain::empty();
        if keys.perplexity.is_some() {
            let prompt = prompts.require("web_reasoning")?.clone();
            chain.push(Arc::new(WebReasoningEngine::new(
                client.clone(),
                keys.perplexity.clone(),
                prompt,
            )));
        }
        if keys.google_factcheck.is_some() {
            chain.push(Arc::new(FactCheckEngine::new(fact_check)));
        }

        let mut cross: Option<SharedEngine> = None;
        if let Some(backend) = backend {
            let prompt = prompts.require("direct_knowledge")?.clone();
            chain.push(Arc::new(DirectKnowledgeEngine::new(backend.clone(), prompt)));
            if cross_check {
                let prompt = prompts.require("cross_check")?.clone();
                cross = Some(Arc::new(CrossCheckEngine::new(backend, prompt)));
            }
        }

        info!(
            "Sources ready: {} providers ({} configured), chain [{}], cross-check {}",
            registry.len(),
            registry.configured_ids().len(),
            chain
                .engine_ids()
                .iter()
                .map(EngineId::as_str)
                .collect::<Vec<_>>()
                .join(" -> "),
            if cross.is_some() { "on" } else { "off" }
        );

        Ok(Self {
            registry,
            chain,
            cross_check: cross,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LlmBackend, LlmError};
    use async_trait::async_trait;

    struct NullBackend;

    #[async_trait]
    impl LlmBackend for NullBackend {
        async fn generate(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
            Err(LlmError::EmptyResponse)
        }

        fn model_name(&self) -> &str {
            "null"
        }
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty("  ".to_string()), None);
        assert_eq!(non_empty(" key ".to_string()), Some("key".to_string()));
    }

    #[test]
    fn test_keyless_build() {
        let prompts = PromptRegistry::load_embedded();
        let set = SourceSet::build(Client::new(), &SourceKeys::default(), &prompts, None, true).unwrap();

        assert_eq!(set.registry.len(), 12);
        assert!(!set.registry.contains(ProviderId::WebReasoning));
        assert!(set.registry.contains(ProviderId::FactCheck));
        assert!(!set.registry.configured_ids().contains(&ProviderId::Brave));
        assert!(set.registry.configured_ids().contains(&ProviderId::Wikipedia));
        assert!(set.chain.is_empty());
        assert!(set.cross_check.is_none());
    }

    #[test]
    fn test_full_chain_order() {
        let keys = SourceKeys {
            perplexity: Some("p".to_string()),
            google_factcheck: Some("g".to_string()),
            ..Default::default()
        };
        let prompts = PromptRegistry::load_embedded();
        let backend: SharedBackend = Arc::new(NullBackend);
        let set = SourceSet::build(Client::new(), &keys, &prompts, Some(backend), true).unwrap();

        assert_eq!(
            set.chain.engine_ids(),
            vec![EngineId::WebReasoning, EngineId::FactCheckRegistry, EngineId::DirectKnowledge]
        );
        assert_eq!(set.cross_check.map(|e| e.id()), Some(EngineId::CrossCheck));
    }
}
