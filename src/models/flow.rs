use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use super::agent::AgentFlowSpec;
use super::groupchat::GroupChatFlowSpec;
use super::wire::{self, opt_timestamp, Timestamp};

/// Shape of a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FlowType {
    #[default]
    TwoAgents,
    GroupChat,
}

impl FlowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowType::TwoAgents => "twoagents",
            FlowType::GroupChat => "groupchat",
        }
    }
}

impl std::fmt::Display for FlowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the outcome of a finished conversation is summarised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SummaryMethod {
    None,
    #[default]
    Last,
    Llm,
}

/// The receiving side of a flow.
///
/// A receiver is a group chat exactly when its `type` is `"groupchat"` and it
/// carries a `groupchat_config`; everything else is a single agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FlowReceiver {
    GroupChat(GroupChatFlowSpec),
    Agent(AgentFlowSpec),
}

impl FlowReceiver {
    pub fn is_group_chat(&self) -> bool {
        matches!(self, FlowReceiver::GroupChat(_))
    }

    pub fn name(&self) -> &str {
        match self {
            FlowReceiver::GroupChat(spec) => &spec.config.name,
            FlowReceiver::Agent(spec) => spec.name(),
        }
    }
}

impl From<AgentFlowSpec> for FlowReceiver {
    fn from(spec: AgentFlowSpec) -> Self {
        FlowReceiver::Agent(spec)
    }
}

impl From<GroupChatFlowSpec> for FlowReceiver {
    fn from(spec: GroupChatFlowSpec) -> Self {
        FlowReceiver::GroupChat(spec)
    }
}

impl<'de> Deserialize<'de> for FlowReceiver {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(d)?;
        let is_group_chat = value.get("type").and_then(serde_json::Value::as_str)
            == Some("groupchat")
            && value
                .get("groupchat_config")
                .is_some_and(|config| !config.is_null());

        if is_group_chat {
            serde_json::from_value(value)
                .map(FlowReceiver::GroupChat)
                .map_err(de::Error::custom)
        } else {
            serde_json::from_value(value)
                .map(FlowReceiver::Agent)
                .map_err(de::Error::custom)
        }
    }
}

/// A complete conversation flow between a sender and a receiver. This is the
/// unit persisted as a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub sender: AgentFlowSpec,
    pub receiver: FlowReceiver,
    #[serde(rename = "type", default)]
    pub kind: FlowType,
    #[serde(default)]
    pub summary_method: SummaryMethod,
    #[serde(
        default,
        deserialize_with = "wire::opt_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, with = "opt_timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, with = "opt_timestamp", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl FlowConfig {
    pub fn new(name: impl Into<String>, sender: AgentFlowSpec, receiver: FlowReceiver) -> Self {
        let kind = if receiver.is_group_chat() {
            FlowType::GroupChat
        } else {
            FlowType::TwoAgents
        };
        Self {
            name: name.into(),
            description: String::new(),
            sender,
            receiver,
            kind,
            summary_method: SummaryMethod::default(),
            id: None,
            user_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Whether the declared flow type agrees with the receiver variant.
    pub fn receiver_matches_type(&self) -> bool {
        match self.kind {
            FlowType::GroupChat => self.receiver.is_group_chat(),
            FlowType::TwoAgents => !self.receiver.is_group_chat(),
        }
    }
}
