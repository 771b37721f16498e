//! Resolves configured provider names to concrete OpenAI-compatible endpoints.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use assistd_config::AppConfig;
use assistd_core::error::ProviderError;
use assistd_core::provider::Provider;
use tracing::debug;

use crate::openai_compat::OpenAiCompatProvider;

/// Hosted and local backends that speak the OpenAI chat-completions dialect.
const KNOWN_ENDPOINTS: &[(&str, &str)] = &[
    ("openrouter", "https://openrouter.ai/api/v1"),
    ("openai", "https://api.openai.com/v1"),
    ("deepseek", "https://api.deepseek.com/v1"),
    ("groq", "https://api.groq.com/openai/v1"),
    ("together", "https://api.together.xyz/v1"),
    ("ollama", "http://localhost:11434/v1"),
    ("vllm", "http://localhost:8000/v1"),
    ("llamacpp", "http://localhost:8080/v1"),
];

/// Base URL for a well-known provider name.
pub fn known_base_url(name: &str) -> Option<&'static str> {
    KNOWN_ENDPOINTS
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, url)| *url)
}

/// Where and how to reach one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub name: String,
    pub base_url: String,
    pub api_key: String,
}

impl Endpoint {
    /// Resolve `name` against its `[providers.<name>]` table, falling back to
    /// the top-level API key and the well-known URL table.
    pub fn resolve(config: &AppConfig, name: &str) -> Result<Self, ProviderError> {
        let table = config.providers.get(name);

        let base_url = table
            .and_then(|t| t.api_url.clone())
            .or_else(|| known_base_url(name).map(str::to_string))
            .ok_or_else(|| {
                ProviderError::NotConfigured(format!(
                    "Provider '{name}' has no api_url and is not a known endpoint"
                ))
            })?;

        let api_key = table
            .and_then(|t| t.api_key.clone())
            .or_else(|| config.api_key.clone())
            .unwrap_or_default();

        Ok(Self {
            name: name.to_string(),
            base_url,
            api_key,
        })
    }
}

/// Named providers built from configuration, with one designated default.
pub struct ProviderRouter {
    providers: BTreeMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: BTreeMap::new(),
            default_provider: default_provider.into(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// The provider every agent step goes to.
    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.get(&self.default_provider)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }
}

/// Build one provider per `[providers.<name>]` table plus the default provider.
pub fn build_from_config(config: &AppConfig) -> Result<ProviderRouter, ProviderError> {
    let timeout = Duration::from_secs(config.request_timeout_secs);
    let mut router = ProviderRouter::new(&config.default_provider);

    let names = config
        .providers
        .keys()
        .map(String::as_str)
        .chain(std::iter::once(config.default_provider.as_str()));

    for name in names {
        if router.get(name).is_some() {
            continue;
        }
        let endpoint = Endpoint::resolve(config, name)?;
        debug!(provider = %endpoint.name, url = %endpoint.base_url, "Registering provider");
        let provider = OpenAiCompatProvider::from_endpoint(&endpoint, timeout)?;
        router.register(endpoint.name, Arc::new(provider));
    }

    Ok(router)
}
