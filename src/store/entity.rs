use rusqlite::types::Value;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::{
    AgentFlowSpec, ChatSession, FlowConfig, GalleryItem, Message, ModelConfig, Skill, Timestamp,
};

// ============================================================================
// Entity
// ============================================================================

/// A record kind persisted in its own table.
///
/// The row id and both timestamps live in columns and are written back into
/// the record on every read, so the stored JSON is never authoritative for
/// them.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + 'static {
    /// Table holding this kind.
    const TABLE: &'static str;
    /// Human-readable kind, used in status messages.
    const KIND: &'static str;

    fn id(&self) -> Option<i64>;
    fn set_id(&mut self, id: i64);
    fn user_id(&self) -> Option<&str>;
    fn created_at(&self) -> Option<Timestamp>;
    fn set_timestamps(&mut self, created_at: Timestamp, updated_at: Timestamp);

    fn session_id(&self) -> Option<i64> {
        None
    }

    fn workflow_id(&self) -> Option<i64> {
        None
    }
}

impl Entity for Skill {
    const TABLE: &'static str = "skills";
    const KIND: &'static str = "Skill";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    fn created_at(&self) -> Option<Timestamp> {
        self.created_at
    }

    fn set_timestamps(&mut self, created_at: Timestamp, updated_at: Timestamp) {
        self.created_at = Some(created_at);
        self.updated_at = Some(updated_at);
    }
}

impl Entity for ModelConfig {
    const TABLE: &'static str = "models";
    const KIND: &'static str = "Model";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    fn created_at(&self) -> Option<Timestamp> {
        self.created_at
    }

    fn set_timestamps(&mut self, created_at: Timestamp, updated_at: Timestamp) {
        self.created_at = Some(created_at);
        self.updated_at = Some(updated_at);
    }
}

impl Entity for AgentFlowSpec {
    const TABLE: &'static str = "agents";
    const KIND: &'static str = "Agent";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    fn created_at(&self) -> Option<Timestamp> {
        self.created_at
    }

    fn set_timestamps(&mut self, created_at: Timestamp, updated_at: Timestamp) {
        self.created_at = Some(created_at);
        self.updated_at = Some(updated_at);
    }
}

impl Entity for FlowConfig {
    const TABLE: &'static str = "workflows";
    const KIND: &'static str = "Workflow";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    fn created_at(&self) -> Option<Timestamp> {
        self.created_at
    }

    fn set_timestamps(&mut self, created_at: Timestamp, updated_at: Timestamp) {
        self.created_at = Some(created_at);
        self.updated_at = Some(updated_at);
    }
}

impl Entity for ChatSession {
    const TABLE: &'static str = "sessions";
    const KIND: &'static str = "Session";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn user_id(&self) -> Option<&str> {
        Some(&self.user_id)
    }

    fn created_at(&self) -> Option<Timestamp> {
        self.created_at
    }

    fn set_timestamps(&mut self, created_at: Timestamp, updated_at: Timestamp) {
        self.created_at = Some(created_at);
        self.updated_at = Some(updated_at);
    }

    fn workflow_id(&self) -> Option<i64> {
        self.workflow_id
    }
}

impl Entity for Message {
    const TABLE: &'static str = "messages";
    const KIND: &'static str = "Message";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn user_id(&self) -> Option<&str> {
        Some(&self.user_id)
    }

    fn created_at(&self) -> Option<Timestamp> {
        self.created_at
    }

    fn set_timestamps(&mut self, created_at: Timestamp, updated_at: Timestamp) {
        self.created_at = Some(created_at);
        self.updated_at = Some(updated_at);
    }

    fn session_id(&self) -> Option<i64> {
        self.session_id
    }

    fn workflow_id(&self) -> Option<i64> {
        self.workflow_id
    }
}

impl Entity for GalleryItem {
    const TABLE: &'static str = "gallery";
    const KIND: &'static str = "Gallery";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn user_id(&self) -> Option<&str> {
        Some(GalleryItem::user_id(self))
    }

    fn created_at(&self) -> Option<Timestamp> {
        self.created_at
    }

    fn set_timestamps(&mut self, created_at: Timestamp, updated_at: Timestamp) {
        self.created_at = Some(created_at);
        self.updated_at = Some(updated_at);
    }

    fn session_id(&self) -> Option<i64> {
        self.session.id
    }

    fn workflow_id(&self) -> Option<i64> {
        self.session.workflow_id
    }
}

// ============================================================================
// Filters
// ============================================================================

/// Column equality filters, combined with AND. An empty filter matches every
/// row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub id: Option<i64>,
    pub user_id: Option<String>,
    pub session_id: Option<i64>,
    pub workflow_id: Option<i64>,
}

impl Filters {
    /// Rows owned by `user_id`.
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_session(mut self, session_id: i64) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// True when no column is constrained.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Render a `WHERE` clause with positional parameters.
    pub(crate) fn where_clause(&self) -> (String, Vec<Value>) {
        let mut conditions = Vec::new();
        let mut params = Vec::new();

        if let Some(id) = self.id {
            params.push(Value::Integer(id));
            conditions.push(format!("id = ?{}", params.len()));
        }
        if let Some(ref user_id) = self.user_id {
            params.push(Value::Text(user_id.clone()));
            conditions.push(format!("user_id = ?{}", params.len()));
        }
        if let Some(session_id) = self.session_id {
            params.push(Value::Integer(session_id));
            conditions.push(format!("session_id = ?{}", params.len()));
        }
        if let Some(workflow_id) = self.workflow_id {
            params.push(Value::Integer(workflow_id));
            conditions.push(format!("workflow_id = ?{}", params.len()));
        }

        if conditions.is_empty() {
            (String::new(), params)
        } else {
            (format!("WHERE {}", conditions.join(" AND ")), params)
        }
    }
}

impl std::fmt::Display for Filters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if let Some(id) = self.id {
            parts.push(format!("id={id}"));
        }
        if let Some(ref user_id) = self.user_id {
            parts.push(format!("user_id={user_id}"));
        }
        if let Some(session_id) = self.session_id {
            parts.push(format!("session_id={session_id}"));
        }
        if let Some(workflow_id) = self.workflow_id {
            parts.push(format!("workflow_id={workflow_id}"));
        }
        write!(f, "{{{}}}", parts.join(", "))
    }
}
