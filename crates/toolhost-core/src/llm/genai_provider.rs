//! GenaiProvider - LLM access through the genai crate
//!
//! Native genai adapters (Ollama, OpenAI, Anthropic, Gemini, ...) are used as
//! is. OpenAI-compatible services (Azure, OpenRouter, Mistral) are routed
//! through a `ServiceTargetResolver`. Auth comes from `LlmSettings`, never
//! from genai's own environment lookup.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use genai::chat::{
    ChatMessage as GenaiMessage, ChatOptions as GenaiOptions, ChatRequest, ChatResponseFormat,
};
use genai::resolver::{AuthData, AuthResolver, Endpoint, ServiceTargetResolver};
use genai::{adapter::AdapterKind, Client, ModelIden, ServiceTarget};

use crate::config::LlmSettings;
use crate::logging::Logger;
use crate::types::{ChatMessage, MessageRole};

use super::error::{LlmError, LlmResult};
use super::traits::{GenerateOptions, LlmProvider, OutputFormat};

/// LLM provider backed by a genai `Client`
pub struct GenaiProvider {
    settings: LlmSettings,
    client: Client,
    logger: Arc<dyn Logger>,
}

impl GenaiProvider {
    /// Create a provider for the given settings
    pub fn new(settings: LlmSettings, logger: Arc<dyn Logger>) -> LlmResult<Self> {
        if requires_api_base(&settings.provider) && settings.api_base.is_none() {
            return Err(LlmError::Other(format!(
                "{} requires LLM_API_BASE to be set",
                settings.provider
            )));
        }
        if requires_api_key(&settings.provider) && settings.api_key.is_none() {
            return Err(LlmError::missing_api_key(&settings.provider));
        }
        let client = create_client(&settings);
        Ok(Self {
            settings,
            client,
            logger,
        })
    }

    pub fn settings(&self) -> &LlmSettings {
        &self.settings
    }

    /// Check if this provider can handle the given provider ID
    pub fn supports(provider: &str) -> bool {
        adapter_for(provider).is_some()
    }
}

#[async_trait]
impl LlmProvider for GenaiProvider {
    fn name(&self) -> &str {
        &self.settings.provider
    }

    async fn generate(&self, messages: Vec<ChatMessage>, options: GenerateOptions) -> LlmResult<String> {
        self.logger.debug(&format!(
            "[GenaiProvider] generate: provider={}, model={}, messages={}",
            self.settings.provider,
            self.settings.model,
            messages.len()
        ));

        let request = ChatRequest::new(messages.into_iter().map(to_genai_message).collect());
        let genai_options = to_genai_options(&options);

        let response = self
            .client
            .exec_chat(self.settings.model.as_str(), request, Some(&genai_options))
            .await
            .map_err(|e| LlmError::request(&self.settings.provider, e.to_string()))?;

        let text = response
            .first_text()
            .map(str::to_string)
            .ok_or_else(|| LlmError::EmptyResponse {
                provider: self.settings.provider.clone(),
            })?;

        self.logger.debug(&format!("[GenaiProvider] completion: {} chars", text.len()));
        Ok(text)
    }
}

fn to_genai_message(message: ChatMessage) -> GenaiMessage {
    match message.role {
        MessageRole::System => GenaiMessage::system(message.content),
        MessageRole::User => GenaiMessage::user(message.content),
    }
}

fn to_genai_options(options: &GenerateOptions) -> GenaiOptions {
    let mut genai_opts = GenaiOptions::default();

    if let Some(temp) = options.temperature {
        genai_opts = genai_opts.with_temperature(temp as f64);
    }

    if let Some(max_tokens) = options.max_tokens {
        genai_opts = genai_opts.with_max_tokens(max_tokens);
    }

    if options.format == OutputFormat::Json {
        genai_opts = genai_opts.with_response_format(ChatResponseFormat::JsonMode);
    }

    genai_opts
}

/// genai adapter that serves a provider id
fn adapter_for(provider: &str) -> Option<AdapterKind> {
    let kind = match provider.to_lowercase().as_str() {
        "ollama" => AdapterKind::Ollama,
        "openai" | "azure" | "openrouter" | "mistral" => AdapterKind::OpenAI,
        "anthropic" => AdapterKind::Anthropic,
        "gemini" | "google" => AdapterKind::Gemini,
        "groq" => AdapterKind::Groq,
        "xai" => AdapterKind::Xai,
        "deepseek" => AdapterKind::DeepSeek,
        "cohere" => AdapterKind::Cohere,
        "fireworks" => AdapterKind::Fireworks,
        "together" => AdapterKind::Together,
        _ => return None,
    };
    Some(kind)
}

/// Fixed endpoint of OpenAI-compatible services genai has no adapter for
fn compat_endpoint(provider: &str) -> Option<&'static str> {
    match provider {
        "openrouter" => Some("https://openrouter.ai/api/v1/"),
        "mistral" => Some("https://api.mistral.ai/v1/"),
        _ => None,
    }
}

fn requires_api_base(provider: &str) -> bool {
    provider.eq_ignore_ascii_case("azure")
}

/// Local runtimes are the only keyless providers
fn requires_api_key(provider: &str) -> bool {
    !provider.eq_ignore_ascii_case("ollama")
}

/// Build a genai Client whose auth and endpoint follow `settings`
fn create_client(settings: &LlmSettings) -> Client {
    let api_key = settings.api_key.clone();

    let auth_resolver = AuthResolver::from_resolver_async_fn(
        move |_model_iden: ModelIden| -> Pin<Box<dyn Future<Output = genai::resolver::Result<Option<AuthData>>> + Send>> {
            let key = api_key.clone();
            // None lets keyless adapters such as Ollama proceed
            Box::pin(async move { Ok(key.map(AuthData::from_single)) })
        },
    );

    let provider = settings.provider.to_lowercase();
    let api_base = settings.api_base.clone();

    let target_resolver = ServiceTargetResolver::from_resolver_fn(
        move |target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error> {
            let Some(adapter_kind) = adapter_for(&provider) else {
                return Ok(target);
            };

            let endpoint = match (&api_base, compat_endpoint(&provider)) {
                (Some(base), _) => Endpoint::from_owned(base.clone()),
                (None, Some(fixed)) => Endpoint::from_static(fixed),
                (None, None) => target.endpoint,
            };
            let model = ModelIden::new(adapter_kind, target.model.model_name.clone());

            Ok(ServiceTarget {
                endpoint,
                auth: target.auth,
                model,
            })
        },
    );

    Client::builder()
        .with_auth_resolver(auth_resolver)
        .with_service_target_resolver(target_resolver)
        .build()
}
