//! Catalog of the actions the reasoning endpoint may request.
//!
//! The registry holds one plan-announcement action followed by one action per
//! specialist, in a fixed order. It is the only thing that tells the endpoint
//! what it can call, and it also drives the generated system prompt, so adding
//! a specialist means adding one [`SpecialistAction`] here and binding one
//! client in the [`crate::SpecialistDirectory`].

use serde_json::{json, Value};
use waypoint_ai::ToolDefinition;

pub const PLAN_ACTION_NAME: &str = "create_plan";

#[derive(Debug, Clone, PartialEq, Eq)]
/// One specialist entry in the registry.
pub struct SpecialistAction {
    pub key: String,
    pub display_name: String,
    /// One-line capability summary used in the system prompt.
    pub summary: String,
    /// Action description declared to the reasoning endpoint.
    pub description: String,
    pub task_hint: String,
    /// Present when the action takes an optional `context` argument.
    pub context_hint: Option<String>,
    /// Key of a specialist whose result should be gathered first.
    pub depends_on: Option<String>,
}

impl SpecialistAction {
    pub fn action_name(&self) -> String {
        specialist_action_name(&self.key)
    }

    fn tool_definition(&self) -> ToolDefinition {
        let mut properties = serde_json::Map::new();
        properties.insert(
            "task".to_string(),
            json!({ "type": "string", "description": self.task_hint }),
        );
        if let Some(context_hint) = &self.context_hint {
            properties.insert(
                "context".to_string(),
                json!({ "type": "string", "description": context_hint }),
            );
        }

        ToolDefinition {
            name: self.action_name(),
            description: self.description.clone(),
            parameters: json!({
                "type": "object",
                "properties": Value::Object(properties),
                "required": ["task"],
            }),
        }
    }
}

/// Action name used for the specialist with the given key.
pub fn specialist_action_name(key: &str) -> String {
    format!("call_{key}_agent")
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// What a requested action name resolves to.
pub enum ActionKind<'a> {
    AnnouncePlan,
    Specialist(&'a SpecialistAction),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRegistry {
    specialists: Vec<SpecialistAction>,
}

impl ActionRegistry {
    pub fn new(specialists: Vec<SpecialistAction>) -> Self {
        Self { specialists }
    }

    /// The five travel specialists: weather, packing, activities, budget and
    /// transport.
    pub fn travel() -> Self {
        Self::new(vec![
            SpecialistAction {
                key: "weather".to_string(),
                display_name: "Weather Agent".to_string(),
                summary: "Gets weather forecasts and current conditions for destinations"
                    .to_string(),
                description: "Get weather forecast for a destination. Call when the question involves weather, outdoor plans, or when packing/activities agents need weather context.".to_string(),
                task_hint: "What weather information to gather".to_string(),
                context_hint: None,
                depends_on: None,
            },
            SpecialistAction {
                key: "packing".to_string(),
                display_name: "Packing Agent".to_string(),
                summary: "Recommends what to pack (best results when given weather context)"
                    .to_string(),
                description: "Get packing recommendations. Best when given weather context. Call after weather agent if both are needed.".to_string(),
                task_hint: "What packing advice is needed".to_string(),
                context_hint: Some(
                    "Weather or other context to inform packing recommendations".to_string(),
                ),
                depends_on: Some("weather".to_string()),
            },
            SpecialistAction {
                key: "activities".to_string(),
                display_name: "Activities Agent".to_string(),
                summary:
                    "Suggests things to do, restaurants, sightseeing (can adjust for weather)"
                        .to_string(),
                description: "Get activity and sightseeing recommendations. Can adjust for weather if context is provided.".to_string(),
                task_hint: "What activity recommendations are needed".to_string(),
                context_hint: Some(
                    "Weather or other context to adjust recommendations".to_string(),
                ),
                depends_on: Some("weather".to_string()),
            },
            SpecialistAction {
                key: "budget".to_string(),
                display_name: "Budget Agent".to_string(),
                summary: "Estimates trip costs (flights, hotels, food, activities)".to_string(),
                description: "Get trip cost estimates. Independent - does not need weather context. Can be called in parallel with other agents.".to_string(),
                task_hint: "What cost information is needed".to_string(),
                context_hint: None,
                depends_on: None,
            },
            SpecialistAction {
                key: "transport".to_string(),
                display_name: "Transport Agent".to_string(),
                summary: "Provides flight options, airport transfers, local transit info"
                    .to_string(),
                description: "Get transportation information (flights, local transit, getting around). Independent - does not need weather context. Can be called in parallel with other agents.".to_string(),
                task_hint: "What transportation information is needed".to_string(),
                context_hint: None,
                depends_on: None,
            },
        ])
    }

    pub fn specialists(&self) -> &[SpecialistAction] {
        &self.specialists
    }

    pub fn specialist_keys(&self) -> Vec<String> {
        self.specialists
            .iter()
            .map(|specialist| specialist.key.clone())
            .collect()
    }

    pub fn specialist(&self, key: &str) -> Option<&SpecialistAction> {
        self.specialists
            .iter()
            .find(|specialist| specialist.key == key)
    }

    pub fn display_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.specialist(key)
            .map(|specialist| specialist.display_name.as_str())
            .unwrap_or(key)
    }

    pub fn classify(&self, action_name: &str) -> Option<ActionKind<'_>> {
        if action_name == PLAN_ACTION_NAME {
            return Some(ActionKind::AnnouncePlan);
        }
        self.specialists
            .iter()
            .find(|specialist| specialist.action_name() == action_name)
            .map(ActionKind::Specialist)
    }

    /// Declared actions in catalog order: the plan action first.
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions = Vec::with_capacity(self.specialists.len() + 1);
        definitions.push(self.plan_definition());
        definitions.extend(
            self.specialists
                .iter()
                .map(SpecialistAction::tool_definition),
        );
        definitions
    }

    fn plan_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: PLAN_ACTION_NAME.to_string(),
            description: "Announce which agents you will call and in what order. ALWAYS call this first before calling any agent tools.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "steps": {
                        "type": "array",
                        "description": "Ordered list of agents to call. Group parallel agents together.",
                        "items": {
                            "type": "object",
                            "properties": {
                                "agent": { "type": "string", "enum": self.specialist_keys() },
                                "reason": {
                                    "type": "string",
                                    "description": "Brief reason for calling this agent"
                                }
                            },
                            "required": ["agent", "reason"]
                        }
                    }
                },
                "required": ["steps"]
            }),
        }
    }

    /// Renders the supervisor system prompt from the catalog.
    pub fn system_prompt(&self) -> String {
        let mut prompt = format!(
            "You are a trip planning supervisor that coordinates specialized agents to help users with travel questions. You have {} agents available:\n\n",
            self.specialists.len()
        );
        for (index, specialist) in self.specialists.iter().enumerate() {
            prompt.push_str(&format!(
                "{}. **{}** - {}\n",
                index + 1,
                specialist.display_name,
                specialist.summary
            ));
        }

        prompt.push_str(&format!(
            "\n## How to work:\n\n\
             1. FIRST, call `{PLAN_ACTION_NAME}` to announce which agents you'll use and why. Only include agents relevant to the user's question.\n\
             2. THEN, call the agent tools to gather information. **Call independent agents in parallel** by making multiple tool calls in a single response.\n\
             3. FINALLY, after all agent calls complete, synthesize a comprehensive response using markdown formatting.\n\n\
             ## Dependencies:\n"
        ));

        let independent = self
            .specialists
            .iter()
            .filter(|specialist| specialist.depends_on.is_none())
            .map(|specialist| specialist.display_name.as_str())
            .collect::<Vec<_>>();
        if !independent.is_empty() {
            prompt.push_str(&format!(
                "- {} never need another agent's result - call them together in the first round.\n",
                independent.join(", ")
            ));
        }
        for specialist in &self.specialists {
            let Some(dependency) = specialist.depends_on.as_deref() else {
                continue;
            };
            prompt.push_str(&format!(
                "- {} works best after {} has answered: call it in a later round and pass that result as `context`. Never put both in the same round.\n",
                specialist.display_name,
                self.display_name(dependency)
            ));
        }

        prompt.push_str(
            "\n## Important rules:\n\
             - Only call agents that are relevant to the question.\n\
             - Be efficient - call independent agents simultaneously in a single response to minimize wait time.\n\
             - After receiving agent results, write a well-structured final answer with markdown headers and bullet points. If an agent failed, say what information is missing.",
        );
        prompt
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::travel()
    }
}
