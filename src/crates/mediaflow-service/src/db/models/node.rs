//! Node and template row models for database persistence

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A template row: the static, per-node-type metadata the scheduler's skip
/// rule and transient-read logic consult. Seeded ahead of time rather than
/// written by the scheduler itself.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TemplateRow {
    pub node_type: String,
    pub is_transient: bool,
    pub is_terminal: bool,
}

impl TemplateRow {
    pub fn into_template(self) -> mediaflow_core::canvas::Template {
        mediaflow_core::canvas::Template {
            node_type: self.node_type,
            is_transient: self.is_transient,
            is_terminal: self.is_terminal,
        }
    }
}

/// A node row joined with its template. `config` and `result` are
/// JSON-encoded columns.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NodeRow {
    pub id: String,
    pub node_type: String,
    pub name: String,
    pub config: String,
    pub result: Option<String>,
    pub is_dirty: bool,
    pub template_is_transient: bool,
    pub template_is_terminal: bool,
}

impl NodeRow {
    pub fn into_node(self) -> Result<mediaflow_core::canvas::Node, serde_json::Error> {
        Ok(mediaflow_core::canvas::Node {
            id: self.id,
            node_type: self.node_type.clone(),
            name: self.name,
            config: serde_json::from_str(&self.config)?,
            result: self
                .result
                .map(|json| serde_json::from_str(&json))
                .transpose()?,
            is_dirty: self.is_dirty,
            template: mediaflow_core::canvas::Template {
                node_type: self.node_type,
                is_transient: self.template_is_transient,
                is_terminal: self.template_is_terminal,
            },
        })
    }
}
