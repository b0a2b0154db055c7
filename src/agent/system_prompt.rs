//! System Instruction
//!
//! The fixed instruction text handed to the model gateway on every call.
//! It enumerates the JSON step protocol (plan, action, observe, output) the
//! model is expected to follow. This is a prompt convention between agent
//! and model: the loop never validates the structure, it only inspects
//! whether tool requests are present.

use super::tools::BuiltinTool;

const INSTRUCTION_HEADER: &str = r#"You are a helpful AI assistant that resolves user queries using the available tools.
Work in plan, action, observe, and output steps.

Rules:
- Write all your code in the AI_code folder; create it if it does not exist.
- Always output in JSON format.
- Perform one action at a time and wait for the observation before proceeding.
- Carefully analyze the user query and break it into small logical steps if needed.
- Only use the available tools.
- Never tell the user to copy-paste code or to create any folder or file themselves.

Output JSON format:
{
    "step": "string",         // plan, action, observe, or output
    "content": "string",      // thought process if step is plan or output
    "function": "string",     // tool name if step is action
    "input": "any"            // tool input parameters if step is action
}

Example:
User Query: Create a Python file named app.py that prints "Hello, World!".

{ "step": "plan", "content": "The user wants a Python file with specific content." }
{ "step": "action", "function": "write_file", "input": {"path": "AI_code/app.py", "content": "print('Hello, World!')"} }
{ "step": "observe", "output": "written" }
{ "step": "output", "content": "The file app.py has been created successfully." }
"#;

/// Build the full system instruction: protocol rules plus the current tool
/// registry, so the model only ever names tools the loop can dispatch.
pub fn build_system_instruction(tools: &[BuiltinTool]) -> String {
    let mut prompt = String::from(INSTRUCTION_HEADER);
    prompt.push_str("\nAvailable tools:\n");
    for tool in tools {
        prompt.push_str(&format!("- {}: {}\n", tool.name, tool.description));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::tools::create_builtin_tools;

    #[test]
    fn test_instruction_lists_every_tool() {
        let tools = create_builtin_tools();
        let prompt = build_system_instruction(&tools);
        for tool in &tools {
            assert!(prompt.contains(&tool.name));
        }
    }

    #[test]
    fn test_instruction_names_protocol_steps() {
        let prompt = build_system_instruction(&create_builtin_tools());
        for step in ["plan", "action", "observe", "output"] {
            assert!(prompt.contains(step));
        }
    }
}
