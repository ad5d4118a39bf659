use serde::{Deserialize, Serialize};

use super::llm::LlmSetting;
use super::skill::Skill;
use super::wire::{self, opt_timestamp, Timestamp};

/// Default auto-reply budget for a freshly created agent.
pub const DEFAULT_MAX_CONSECUTIVE_AUTO_REPLY: u32 = 10;

// ============================================================================
// Enumerations
// ============================================================================

/// Discriminant of an agent participating in a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    #[default]
    Assistant,
    UserProxy,
    GroupChat,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Assistant => "assistant",
            AgentKind::UserProxy => "userproxy",
            AgentKind::GroupChat => "groupchat",
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When an agent asks a human for input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HumanInputMode {
    #[default]
    Never,
    Terminate,
    Always,
}

/// Termination check: a plain switch or an expression evaluated by the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TerminationCondition {
    Flag(bool),
    Expression(String),
}

/// Code execution policy of an agent.
///
/// `false` disables execution, `true` enables it with runtime defaults, a
/// string names a preset and an object carries explicit settings
/// (`work_dir`, `use_docker`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CodeExecutionConfig {
    Flag(bool),
    Preset(String),
    Settings(serde_json::Map<String, serde_json::Value>),
}

// ============================================================================
// Agent configuration
// ============================================================================

/// Behavioural configuration of one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    #[serde(default)]
    pub llm_config: LlmSetting,
    #[serde(default)]
    pub human_input_mode: HumanInputMode,
    #[serde(default = "default_max_consecutive_auto_reply")]
    pub max_consecutive_auto_reply: u32,
    #[serde(default)]
    pub system_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_termination_msg: Option<TerminationCondition>,
    #[serde(default = "default_auto_reply")]
    pub default_auto_reply: Option<String>,
    #[serde(default = "default_code_execution")]
    pub code_execution_config: Option<CodeExecutionConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_max_consecutive_auto_reply() -> u32 {
    DEFAULT_MAX_CONSECUTIVE_AUTO_REPLY
}

fn default_auto_reply() -> Option<String> {
    Some(String::new())
}

fn default_code_execution() -> Option<CodeExecutionConfig> {
    Some(CodeExecutionConfig::Flag(false))
}

impl AgentConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            llm_config: LlmSetting::Disabled,
            human_input_mode: HumanInputMode::default(),
            max_consecutive_auto_reply: DEFAULT_MAX_CONSECUTIVE_AUTO_REPLY,
            system_message: None,
            is_termination_msg: None,
            default_auto_reply: default_auto_reply(),
            code_execution_config: default_code_execution(),
            description: None,
        }
    }
}

// ============================================================================
// Agent flow spec
// ============================================================================

/// A typed, identified agent instance usable as a flow participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentFlowSpec {
    #[serde(rename = "type", default)]
    pub kind: AgentKind,
    pub config: AgentConfig,
    #[serde(
        default,
        deserialize_with = "wire::opt_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<Skill>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, with = "opt_timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, with = "opt_timestamp", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl AgentFlowSpec {
    pub fn new(kind: AgentKind, config: AgentConfig) -> Self {
        Self {
            kind,
            config,
            id: None,
            skills: None,
            user_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::llm::{LlmConfig, ModelConfig};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn minimal_config_fills_defaults() {
        let config: AgentConfig = serde_json::from_value(json!({"name": "primary"})).unwrap();
        assert_eq!(config, AgentConfig::new("primary"));
        assert_eq!(config.max_consecutive_auto_reply, 10);
        assert_eq!(config.human_input_mode, HumanInputMode::Never);
        assert_eq!(config.default_auto_reply.as_deref(), Some(""));
        assert_eq!(
            config.code_execution_config,
            Some(CodeExecutionConfig::Flag(false))
        );
    }

    #[test]
    fn explicit_nulls_survive_round_trip() {
        let raw = json!({
            "name": "user_proxy",
            "llm_config": false,
            "human_input_mode": "NEVER",
            "max_consecutive_auto_reply": 5,
            "system_message": null,
            "default_auto_reply": null,
            "code_execution_config": null
        });
        let config: AgentConfig = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(config.default_auto_reply, None);
        assert_eq!(config.code_execution_config, None);
        assert_eq!(serde_json::to_value(&config).unwrap(), raw);
    }

    #[test]
    fn code_execution_accepts_every_shape() {
        let cases = [
            (json!(true), CodeExecutionConfig::Flag(true)),
            (json!("local"), CodeExecutionConfig::Preset("local".into())),
        ];
        for (raw, expected) in cases {
            let parsed: CodeExecutionConfig = serde_json::from_value(raw).unwrap();
            assert_eq!(parsed, expected);
        }

        let settings: CodeExecutionConfig =
            serde_json::from_value(json!({"work_dir": "coding", "use_docker": false})).unwrap();
        match settings {
            CodeExecutionConfig::Settings(map) => assert_eq!(map["work_dir"], "coding"),
            other => panic!("expected settings, got {other:?}"),
        }
    }

    #[test]
    fn termination_condition_is_bool_or_string() {
        let flag: TerminationCondition = serde_json::from_value(json!(false)).unwrap();
        let expr: TerminationCondition =
            serde_json::from_value(json!("x.get('content', '').endswith('TERMINATE')")).unwrap();
        assert_eq!(flag, TerminationCondition::Flag(false));
        assert!(matches!(expr, TerminationCondition::Expression(_)));
    }

    #[test]
    fn flow_spec_parses_front_end_shape() {
        let spec: AgentFlowSpec = serde_json::from_value(json!({
            "type": "userproxy",
            "id": "12",
            "config": {
                "name": "userproxy",
                "llm_config": {"config_list": [{"model": "gpt-4"}], "temperature": 0.1},
                "human_input_mode": "NEVER",
                "max_consecutive_auto_reply": 5,
                "system_message": ""
            },
            "skills": [{"name": "fetch_profile", "content": "def fetch_profile(): ..."}],
            "created_at": "2024-01-05T10:00:00"
        }))
        .unwrap();

        assert_eq!(spec.kind, AgentKind::UserProxy);
        assert_eq!(spec.id, Some(12));
        assert_eq!(spec.name(), "userproxy");
        assert_eq!(
            spec.config.llm_config,
            LlmSetting::Enabled(LlmConfig::with_models(vec![ModelConfig::new("gpt-4")]))
        );
        assert_eq!(spec.skills.as_ref().map(Vec::len), Some(1));
        assert!(spec.created_at.is_some());
    }

    #[test]
    fn kind_serializes_lowercase() {
        let spec = AgentFlowSpec::new(AgentKind::GroupChat, AgentConfig::new("manager"));
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["type"], "groupchat");
        assert_eq!(AgentKind::UserProxy.to_string(), "userproxy");
    }
}
