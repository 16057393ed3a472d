//! Core types shared across the orchestration layer

mod message;
mod tool;
mod cancellation;

pub use message::{last_user_text, ChatMessage, MessageRole};
pub use tool::{ParameterSpec, ToolDescriptor, ToolOutput, ToolProgress, NO_PARAMETER_DESCRIPTION};
pub use cancellation::CancellationToken;
