//! Prompt management for reasoning engines
//!
//! Loads prompt definitions from TOML files, so engine wording can be
//! tuned without touching code. The built-in set is embedded at compile time.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// Errors loading prompt files
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Failed to read prompt file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid prompt definition: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Prompt not found: {0}")]
    Missing(String),
}

/// A prompt definition loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct Prompt {
    pub prompt: PromptMetadata,
    pub template: PromptTemplate,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromptMetadata {
    pub id: String,
    pub name: String,
    /// Engine this prompt drives, e.g. `web_reasoning`
    pub engine: String,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromptTemplate {
    pub system: String,
    /// User message; `{claim}` is replaced with the claim text
    pub user: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_format() -> String {
    "json".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

const EMBEDDED: &[(&str, &str)] = &[
    ("web_reasoning.toml", include_str!("../prompts/web_reasoning.toml")),
    ("direct_knowledge.toml", include_str!("../prompts/direct_knowledge.toml")),
    ("cross_check.toml", include_str!("../prompts/cross_check.toml")),
];

/// Registry of all loaded prompts
#[derive(Debug, Default, Clone)]
pub struct PromptRegistry {
    prompts: HashMap<String, Prompt>,
}

impl PromptRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Load all prompts embedded in the binary
    pub fn load_embedded() -> Self {
        let mut registry = Self::new();
        for (name, source) in EMBEDDED {
            registry.load_str(name, source);
        }
        registry
    }

    /// Load prompts from a directory, overriding embedded ones with the same id
    pub fn load_from_dir<P: AsRef<Path>>(mut self, dir: P) -> Result<Self, PromptError> {
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "toml") {
                let content = std::fs::read_to_string(&path)?;
                self.load_str(&path.display().to_string(), &content);
            }
        }
        Ok(self)
    }

    fn load_str(&mut self, name: &str, source: &str) {
        match toml::from_str::<Prompt>(source) {
            Ok(prompt) if prompt.prompt.enabled => self.register(prompt),
            Ok(_) => {}
            Err(e) => warn!("Skipping prompt {}: {}", name, e),
        }
    }

    /// Register a prompt
    pub fn register(&mut self, prompt: Prompt) {
        self.prompts.insert(prompt.prompt.id.clone(), prompt);
    }

    /// Get a prompt by ID
    pub fn get(&self, id: &str) -> Option<&Prompt> {
        self.prompts.get(id)
    }

    /// Get a prompt by ID, failing if it is absent
    pub fn require(&self, id: &str) -> Result<&Prompt, PromptError> {
        self.get(id).ok_or_else(|| PromptError::Missing(id.to_string()))
    }

    /// List all prompt IDs, sorted
    pub fn list_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.prompts.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    /// Count of loaded prompts
    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

impl Prompt {
    /// Get the system prompt
    pub fn system_prompt(&self) -> &str {
        self.template.system.trim()
    }

    /// Render the user message for a claim
    pub fn user_message(&self, claim: &str) -> String {
        self.template.user.trim().replace("{claim}", claim)
    }
}
