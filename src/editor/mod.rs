//! Editable view over one agent specification.
//!
//! The editor keeps a local copy of an externally owned [`AgentFlowSpec`].
//! Every field edit produces a fresh spec whose config differs from the
//! previous one in exactly one field; the new spec becomes the local state and
//! is handed to the owner through the change callback. A new spec arriving
//! from the owner replaces local state wholesale.

mod name;

pub use name::*;

use std::ops::RangeInclusive;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::models::{
    AgentConfig, AgentFlowSpec, AgentKind, CodeExecutionConfig, HumanInputMode, LlmConfig,
    LlmSetting, TerminationCondition,
};

/// Title shown above the editor when the owner does not supply one.
pub const DEFAULT_TITLE: &str = "Agent Specification";

/// Highest auto-reply count offered for group chat managers.
pub const GROUPCHAT_MAX_AUTO_REPLY: u32 = 600;

/// Highest auto-reply count offered for every other agent.
pub const AGENT_MAX_AUTO_REPLY: u32 = 30;

// ============================================================================
// Edits
// ============================================================================

/// A replacement value for exactly one [`AgentConfig`] field.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigEdit {
    Name(String),
    Description(Option<String>),
    LlmConfig(LlmSetting),
    HumanInputMode(HumanInputMode),
    MaxConsecutiveAutoReply(u32),
    SystemMessage(Option<String>),
    DefaultAutoReply(Option<String>),
    IsTerminationMsg(Option<TerminationCondition>),
    CodeExecutionConfig(Option<CodeExecutionConfig>),
}

impl ConfigEdit {
    /// The JSON key of the field this edit replaces.
    pub fn field(&self) -> &'static str {
        match self {
            ConfigEdit::Name(_) => "name",
            ConfigEdit::Description(_) => "description",
            ConfigEdit::LlmConfig(_) => "llm_config",
            ConfigEdit::HumanInputMode(_) => "human_input_mode",
            ConfigEdit::MaxConsecutiveAutoReply(_) => "max_consecutive_auto_reply",
            ConfigEdit::SystemMessage(_) => "system_message",
            ConfigEdit::DefaultAutoReply(_) => "default_auto_reply",
            ConfigEdit::IsTerminationMsg(_) => "is_termination_msg",
            ConfigEdit::CodeExecutionConfig(_) => "code_execution_config",
        }
    }

    /// Build an edit from a field key and a JSON value.
    pub fn from_json(key: &str, value: serde_json::Value) -> Result<Self, EditError> {
        fn parse<T: DeserializeOwned>(key: &str, value: serde_json::Value) -> Result<T, EditError> {
            serde_json::from_value(value).map_err(|source| EditError::InvalidValue {
                field: key.to_string(),
                source,
            })
        }

        let edit = match key {
            "name" => ConfigEdit::Name(parse(key, value)?),
            "description" => ConfigEdit::Description(parse(key, value)?),
            "llm_config" => ConfigEdit::LlmConfig(parse(key, value)?),
            "human_input_mode" => ConfigEdit::HumanInputMode(parse(key, value)?),
            "max_consecutive_auto_reply" => ConfigEdit::MaxConsecutiveAutoReply(parse(key, value)?),
            "system_message" => ConfigEdit::SystemMessage(parse(key, value)?),
            "default_auto_reply" => ConfigEdit::DefaultAutoReply(parse(key, value)?),
            "is_termination_msg" => ConfigEdit::IsTerminationMsg(parse(key, value)?),
            "code_execution_config" => ConfigEdit::CodeExecutionConfig(parse(key, value)?),
            other => return Err(EditError::UnknownField(other.to_string())),
        };
        Ok(edit)
    }
}

/// Errors from the key/value edit path.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("unknown agent config field: {0}")]
    UnknownField(String),
    #[error("invalid value for {field}: {source}")]
    InvalidValue {
        field: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Return a copy of `config` with the single field named by `edit` replaced.
///
/// An LLM config whose model list is empty is stored as the disabled marker.
pub fn apply_edit(config: &AgentConfig, edit: ConfigEdit) -> AgentConfig {
    let mut next = config.clone();
    match edit {
        ConfigEdit::Name(v) => next.name = v,
        ConfigEdit::Description(v) => next.description = v,
        ConfigEdit::LlmConfig(v) => next.llm_config = v.normalized(),
        ConfigEdit::HumanInputMode(v) => next.human_input_mode = v,
        ConfigEdit::MaxConsecutiveAutoReply(v) => next.max_consecutive_auto_reply = v,
        ConfigEdit::SystemMessage(v) => next.system_message = v,
        ConfigEdit::DefaultAutoReply(v) => next.default_auto_reply = v,
        ConfigEdit::IsTerminationMsg(v) => next.is_termination_msg = v,
        ConfigEdit::CodeExecutionConfig(v) => next.code_execution_config = v,
    }
    next
}

// ============================================================================
// Editor
// ============================================================================

/// Local editable copy of an agent spec that reports every change upward.
pub struct AgentSpecEditor<F>
where
    F: FnMut(AgentFlowSpec),
{
    title: String,
    external: AgentFlowSpec,
    local: AgentFlowSpec,
    on_change: F,
}

impl<F> AgentSpecEditor<F>
where
    F: FnMut(AgentFlowSpec),
{
    pub fn new(title: Option<&str>, spec: AgentFlowSpec, on_change: F) -> Self {
        Self {
            title: title.unwrap_or(DEFAULT_TITLE).to_string(),
            local: spec.clone(),
            external: spec,
            on_change,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// The current local spec, including edits not yet echoed back.
    pub fn spec(&self) -> &AgentFlowSpec {
        &self.local
    }

    /// Accept a new spec from the owner, discarding local state.
    pub fn receive(&mut self, spec: AgentFlowSpec) {
        debug!(agent = %spec.config.name, "agent spec replaced by owner");
        self.local = spec.clone();
        self.external = spec;
    }

    /// Replace one config field and notify the owner.
    pub fn apply(&mut self, edit: ConfigEdit) -> &AgentFlowSpec {
        let field = edit.field();
        let updated = AgentFlowSpec {
            config: apply_edit(&self.local.config, edit),
            ..self.local.clone()
        };
        debug!(agent = %updated.config.name, field, "agent config edited");

        self.local = updated.clone();
        (self.on_change)(updated);
        &self.local
    }

    /// Key/value form of [`apply`](Self::apply). Nothing changes on error.
    pub fn apply_json(
        &mut self,
        key: &str,
        value: serde_json::Value,
    ) -> Result<&AgentFlowSpec, EditError> {
        let edit = ConfigEdit::from_json(key, value)?;
        Ok(self.apply(edit))
    }

    /// The local LLM config, or an empty placeholder when disabled.
    pub fn effective_llm_config(&self) -> LlmConfig {
        self.local
            .config
            .llm_config
            .config()
            .cloned()
            .unwrap_or_default()
    }

    /// Name check for the owner's current spec.
    pub fn name_validation(&self) -> NameValidation {
        check_and_sanitize_input(&self.external.config.name)
    }

    /// Allowed range for `max_consecutive_auto_reply`.
    pub fn auto_reply_bounds(&self) -> RangeInclusive<u32> {
        match self.local.kind {
            AgentKind::GroupChat => 1..=GROUPCHAT_MAX_AUTO_REPLY,
            _ => 1..=AGENT_MAX_AUTO_REPLY,
        }
    }

    /// A system message only matters to agents that talk to a model.
    pub fn shows_system_message(&self) -> bool {
        self.effective_llm_config().has_models()
    }

    pub fn human_input_modes(&self) -> &'static [HumanInputMode] {
        &[HumanInputMode::Never]
    }
}
