//! LLM provider implementations
//!
//! The orchestration layer only needs one operation from a model: turn a
//! list of messages into a completion. `GenaiProvider` does this for every
//! genai-supported backend; `MockProvider` is kept for testing purposes.

mod error;
mod genai_provider;
mod mock;
mod traits;

pub use error::{LlmError, LlmResult};
pub use genai_provider::GenaiProvider;
pub use mock::{MockMode, MockProvider, RecordedCall};
pub use traits::{GenerateOptions, LlmProvider, OutputFormat};

use std::sync::Arc;

use crate::config::LlmSettings;
use crate::logging::Logger;

/// Create a provider for the given settings
///
/// A provider id of `mock` yields an echoing `MockProvider`; anything else
/// goes through genai.
pub fn create_provider(settings: LlmSettings, logger: Arc<dyn Logger>) -> LlmResult<Arc<dyn LlmProvider>> {
    match settings.provider.to_lowercase().as_str() {
        "mock" => Ok(Arc::new(MockProvider::echo(logger))),
        _ => Ok(Arc::new(GenaiProvider::new(settings, logger)?)),
    }
}
