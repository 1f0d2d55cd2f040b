//! Tool definitions for the portfolio assistant.
//!
//! Four named tools, each returning a human-readable status string
//! rather than structured data. Definitions carry a JSON Schema for the
//! input so callers can render forms or validate before invoking.

mod executor;

pub use executor::ToolExecutor;

use serde::Serialize;
use serde_json::json;

/// A named tool with a JSON-schema input description.
#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    /// Name of the tool.
    pub name: String,
    /// Description of what the tool does.
    pub description: String,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: serde_json::Value,
}

/// All tools exposed by the assistant.
#[must_use]
pub fn all_tools() -> Vec<Tool> {
    vec![
        Tool {
            name: "create_project".to_owned(),
            description: "Create a new portfolio project".to_owned(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Unique project name" },
                    "project_type": { "type": "string", "description": "e.g. scraper, api, analysis" },
                    "description": { "type": "string" },
                    "priority": { "type": "integer", "minimum": 1, "maximum": 10, "default": 5 },
                },
                "required": ["name", "project_type", "description"],
            }),
        },
        Tool {
            name: "update_project_progress".to_owned(),
            description: "Update a project's completion percentage and optionally its status"
                .to_owned(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "project_name": { "type": "string" },
                    "completion_percentage": { "type": "number", "minimum": 0, "maximum": 100 },
                    "status": { "type": "string", "enum": ["planned", "active", "completed"] },
                },
                "required": ["project_name", "completion_percentage"],
            }),
        },
        Tool {
            name: "track_skill".to_owned(),
            description: "Record or update a skill with its proficiency (1-10)".to_owned(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "skill_name": { "type": "string" },
                    "category": { "type": "string" },
                    "proficiency": { "type": "integer", "minimum": 1, "maximum": 10 },
                    "relevant": { "type": "boolean", "default": false },
                    "notes": { "type": "string", "default": "" },
                },
                "required": ["skill_name", "category", "proficiency"],
            }),
        },
        Tool {
            name: "portfolio_status".to_owned(),
            description: "Render the full portfolio dashboard as text".to_owned(),
            input_schema: json!({ "type": "object", "properties": {} }),
        },
    ]
}

/// Get a tool by name.
#[must_use]
pub fn get_tool_by_name(name: &str) -> Option<Tool> {
    all_tools().into_iter().find(|t| t.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_tools_are_defined() {
        let tools = all_tools();
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "create_project",
                "update_project_progress",
                "track_skill",
                "portfolio_status"
            ]
        );
    }

    #[test]
    fn lookup_by_name_works() {
        assert!(get_tool_by_name("track_skill").is_some());
        assert!(get_tool_by_name("drop_database").is_none());
    }
}
