//! Prompt text sent to the model

/// System instructions for the decision step
pub fn build_system_instructions(tools_description: &str) -> String {
    format!(
        r#"You are a helpful assistant with access to external tools. Your goal is to help the user either by answering directly or by calling the appropriate tool.
You MUST respond ONLY with a valid JSON object, with no text, reasoning, preamble or Markdown code fences outside it. The object MUST have this shape:
{{"tool_call": {{"tool": "string", "arguments": {{"key": "value"}}}}, "direct_answer": "string"}}

Rules for your JSON response:
1. If a tool is required, set `tool_call` and leave `direct_answer` as null.
2. If no tool is needed, set `direct_answer` to your natural language answer and leave `tool_call` as null.
3. Do not include anything outside the JSON object.
4. Do not wrap the JSON in Markdown code blocks.
5. Only use tools that are listed below.

Available Tools:
{tools}

Example for a tool call (the user asks to 'echo hello'):
{{
    "tool_call": {{
        "tool": "echo",
        "arguments": {{
            "message": "hello"
        }}
    }},
    "direct_answer": null
}}

Example for a direct answer (the user asks 'what is 2+2?'):
{{
    "tool_call": null,
    "direct_answer": "Two plus two equals four."
}}"#,
        tools = tools_description
    )
}

/// System instructions for turning a tool result into a reply
pub fn build_compose_instructions(original_prompt: &str) -> String {
    format!(
        "You are a helpful assistant. Based on the provided context and the original user's intent, \
         generate a natural, concise and informative response. Do not repeat the raw data. \
         Focus on the most relevant information. \
         Respond ONLY with natural language, without JSON formatting or additional text.\n\n\
         Original User Prompt: {}",
        original_prompt
    )
}

/// User content carrying a tool's raw result
pub fn tool_result_message(tool_name: &str, raw_result: &str) -> String {
    format!("Tool '{}' executed with result: {}", tool_name, raw_result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::{Decision, DecisionParser};

    #[test]
    fn test_system_instructions_embed_tools() {
        let instructions = build_system_instructions("Tool: echo\nDescription: Echo\n");
        assert!(instructions.contains("Available Tools:\nTool: echo\nDescription: Echo\n"));
        assert!(instructions.contains("\"direct_answer\": null"));
    }

    #[test]
    fn test_examples_are_valid_decisions() {
        let instructions = build_system_instructions("");
        let example = instructions
            .split("(the user asks to 'echo hello'):\n")
            .nth(1)
            .unwrap();
        let decision = DecisionParser::new().parse(example).unwrap();
        assert!(matches!(decision, Decision::ToolInvocation { ref tool_name, .. } if tool_name == "echo"));
    }

    #[test]
    fn test_compose_prompts() {
        assert!(build_compose_instructions("weather in Paris?").ends_with("Original User Prompt: weather in Paris?"));
        assert_eq!(
            tool_result_message("echo", "Echo: hi"),
            "Tool 'echo' executed with result: Echo: hi"
        );
    }
}
