//! Agent Card served at `/.well-known/agent.json`
//!
//! A2A clients fetch the card to discover the agent's endpoint, capabilities,
//! and skills before sending tasks.

use crate::config::AgentConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentCapabilities {
    pub streaming: bool,
    pub push_notifications: bool,
    pub state_transition_history: bool,
}

impl Default for AgentCapabilities {
    fn default() -> Self {
        Self {
            streaming: false,
            push_notifications: false,
            state_transition_history: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentProvider {
    pub organization: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A skill the agent advertises
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentSkill {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default = "default_modes", alias = "input_modes")]
    pub input_modes: Vec<String>,
    #[serde(default = "default_modes", alias = "output_modes")]
    pub output_modes: Vec<String>,
}

fn default_modes() -> Vec<String> {
    vec!["text".to_string()]
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Skills advertised when the configuration does not list any
pub fn default_skills() -> Vec<AgentSkill> {
    vec![
        AgentSkill {
            id: "text-to-sql".to_string(),
            name: "Text-to-SQL Query".to_string(),
            description: "Converts natural language questions into T-SQL queries, executes them \
                          against the sales database, and returns a natural language answer with \
                          the SQL query and raw results."
                .to_string(),
            tags: strings(&["sql", "database", "analytics", "sales", "text-to-sql"]),
            examples: strings(&[
                "Show me the top 5 customers by total spending",
                "What is the total revenue by product category?",
                "Which orders are still being processed?",
                "What is the average order value?",
                "List products that have never been ordered",
            ]),
            input_modes: strings(&["text"]),
            output_modes: strings(&["text", "data"]),
        },
        AgentSkill {
            id: "schema-discovery".to_string(),
            name: "Database Schema Discovery".to_string(),
            description: "Describes the tables, columns, keys, and row counts of the database."
                .to_string(),
            tags: strings(&["schema", "metadata", "database", "tables"]),
            examples: strings(&[
                "What tables are in the database?",
                "What columns does the Products table have?",
            ]),
            input_modes: strings(&["text"]),
            output_modes: strings(&["text"]),
        },
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    pub name: String,
    pub description: String,
    pub url: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<AgentProvider>,
    pub capabilities: AgentCapabilities,
    pub default_input_modes: Vec<String>,
    pub default_output_modes: Vec<String>,
    pub skills: Vec<AgentSkill>,
}

impl AgentCard {
    /// Build the card from the `[agent]` configuration section
    pub fn from_config(config: &AgentConfig) -> Self {
        let agent = &config.agent;
        let skills = if agent.skills.is_empty() {
            default_skills()
        } else {
            agent.skills.clone()
        };

        Self {
            name: agent.name.clone(),
            description: agent.description.clone(),
            url: agent.url.clone(),
            version: agent.version.clone(),
            documentation_url: agent.documentation_url.clone(),
            provider: agent.organization.as_ref().map(|organization| AgentProvider {
                organization: organization.clone(),
                url: Some(agent.url.clone()),
            }),
            capabilities: AgentCapabilities::default(),
            default_input_modes: strings(&["text"]),
            default_output_modes: strings(&["text", "data"]),
            skills,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_uses_default_skills() {
        let config = AgentConfig::test_config();
        let card = AgentCard::from_config(&config);

        assert_eq!(card.name, config.agent.name);
        assert_eq!(card.url, config.agent.url);
        assert!(card.capabilities.state_transition_history);
        assert!(!card.capabilities.streaming);
        let ids: Vec<_> = card.skills.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["text-to-sql", "schema-discovery"]);
    }

    #[test]
    fn test_card_serializes_camel_case() {
        let card = AgentCard::from_config(&AgentConfig::test_config());
        let value = serde_json::to_value(&card).unwrap();

        assert_eq!(value["capabilities"]["stateTransitionHistory"], true);
        assert_eq!(value["defaultOutputModes"][1], "data");
        assert_eq!(value["skills"][0]["outputModes"][1], "data");
        assert_eq!(value["provider"]["organization"], "Test Workshop");
    }

    #[test]
    fn test_card_without_provider() {
        let mut config = AgentConfig::test_config();
        config.agent.organization = None;

        let value = serde_json::to_value(AgentCard::from_config(&config)).unwrap();
        assert!(value.get("provider").is_none());
    }
}
