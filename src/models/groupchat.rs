use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

use super::agent::{AgentConfig, AgentFlowSpec};
use super::skill::Skill;
use super::wire::{self, opt_timestamp, Timestamp};

/// Default name of the group chat manager.
pub const DEFAULT_ADMIN_NAME: &str = "Admin";

/// Default number of speaking rounds before a group chat stops.
pub const DEFAULT_MAX_ROUND: u32 = 10;

/// How the next speaker is chosen in a group chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpeakerSelectionMethod {
    #[default]
    Auto,
    RoundRobin,
    Random,
}

/// Whether a speaker may take two turns in a row, globally or per agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AllowRepeatSpeaker {
    Flag(bool),
    Agents(Vec<AgentConfig>),
}

impl Default for AllowRepeatSpeaker {
    fn default() -> Self {
        Self::Flag(true)
    }
}

/// Orchestration parameters of a group chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupChatConfig {
    #[serde(default)]
    pub agents: Vec<AgentFlowSpec>,
    #[serde(default = "default_admin_name")]
    pub admin_name: String,
    #[serde(default)]
    pub messages: Vec<serde_json::Value>,
    #[serde(default = "default_max_round")]
    pub max_round: u32,
    #[serde(default)]
    pub speaker_selection_method: SpeakerSelectionMethod,
    #[serde(default)]
    pub allow_repeat_speaker: AllowRepeatSpeaker,
}

fn default_admin_name() -> String {
    DEFAULT_ADMIN_NAME.to_string()
}

fn default_max_round() -> u32 {
    DEFAULT_MAX_ROUND
}

impl Default for GroupChatConfig {
    fn default() -> Self {
        Self {
            agents: Vec::new(),
            admin_name: default_admin_name(),
            messages: Vec::new(),
            max_round: DEFAULT_MAX_ROUND,
            speaker_selection_method: SpeakerSelectionMethod::default(),
            allow_repeat_speaker: AllowRepeatSpeaker::default(),
        }
    }
}

/// The `"type": "groupchat"` tag. Rejects any other value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupChatTag;

impl Serialize for GroupChatTag {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str("groupchat")
    }
}

impl<'de> Deserialize<'de> for GroupChatTag {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        if raw == "groupchat" {
            Ok(GroupChatTag)
        } else {
            Err(de::Error::custom(format!(
                "expected type \"groupchat\", found \"{raw}\""
            )))
        }
    }
}

/// Group-chat variant of a flow participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupChatFlowSpec {
    #[serde(rename = "type", default)]
    pub kind: GroupChatTag,
    pub config: AgentConfig,
    #[serde(default)]
    pub groupchat_config: GroupChatConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<Skill>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
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

impl GroupChatFlowSpec {
    pub fn new(config: AgentConfig, groupchat_config: GroupChatConfig) -> Self {
        Self {
            kind: GroupChatTag,
            config,
            groupchat_config,
            skills: None,
            description: None,
            id: None,
            user_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Names of the member agents, in speaking-order declaration.
    pub fn member_names(&self) -> Vec<&str> {
        self.groupchat_config
            .agents
            .iter()
            .map(AgentFlowSpec::name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::agent::AgentKind;
    use serde_json::json;

    #[test]
    fn defaults_match_manager_conventions() {
        let config: GroupChatConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(config, GroupChatConfig::default());
        assert_eq!(config.admin_name, "Admin");
        assert_eq!(config.max_round, 10);
        assert_eq!(config.allow_repeat_speaker, AllowRepeatSpeaker::Flag(true));
    }

    #[test]
    fn speaker_selection_is_snake_case() {
        let method: SpeakerSelectionMethod = serde_json::from_value(json!("round_robin")).unwrap();
        assert_eq!(method, SpeakerSelectionMethod::RoundRobin);
        assert!(serde_json::from_value::<SpeakerSelectionMethod>(json!("loudest")).is_err());
    }

    #[test]
    fn repeat_speaker_can_list_agents() {
        let allow: AllowRepeatSpeaker =
            serde_json::from_value(json!([{"name": "critic"}, {"name": "writer"}])).unwrap();
        match allow {
            AllowRepeatSpeaker::Agents(agents) => assert_eq!(agents[1].name, "writer"),
            other => panic!("expected agent list, got {other:?}"),
        }
    }

    #[test]
    fn tag_rejects_other_kinds() {
        let err = serde_json::from_value::<GroupChatFlowSpec>(json!({
            "type": "assistant",
            "config": {"name": "manager"},
            "groupchat_config": {}
        }));
        assert!(err.is_err());
    }

    #[test]
    fn member_names_follow_declaration_order() {
        let spec: GroupChatFlowSpec = serde_json::from_value(json!({
            "type": "groupchat",
            "config": {"name": "group_chat_manager"},
            "groupchat_config": {
                "agents": [
                    {"type": "assistant", "config": {"name": "planner"}},
                    {"type": "assistant", "config": {"name": "coder"}}
                ],
                "speaker_selection_method": "random"
            }
        }))
        .unwrap();
        assert_eq!(spec.member_names(), vec!["planner", "coder"]);
        assert_eq!(spec.groupchat_config.agents[0].kind, AgentKind::Assistant);
        assert_eq!(
            serde_json::to_value(&spec).unwrap()["type"],
            json!("groupchat")
        );
    }
}
