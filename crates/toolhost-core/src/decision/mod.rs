//! Model decisions
//!
//! Each turn the model answers with a JSON object naming either a tool to
//! call or a direct answer:
//!
//! ```json
//! { "tool_call": { "tool": "echo", "arguments": { "message": "hello" } }, "direct_answer": null }
//! { "tool_call": null, "direct_answer": "Two plus two equals four." }
//! ```

mod error;
mod parser;

use serde_json::{Map, Value};

pub use error::{DecisionError, DecisionResult};
pub use parser::{DecisionParser, THINK_END_MARKER};

/// What the model chose to do for one turn
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    ToolInvocation {
        tool_name: String,
        arguments: Map<String, Value>,
    },
    DirectAnswer {
        text: String,
    },
}
