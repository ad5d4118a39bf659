use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

use super::wire::{self, opt_timestamp, Timestamp};

/// Temperature used when an agent has no LLM config of its own.
pub const DEFAULT_TEMPERATURE: f64 = 0.1;

// ============================================================================
// Model endpoint
// ============================================================================

/// One model endpoint and the credentials needed to reach it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_seed: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "wire::opt_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<i64>,
    #[serde(default, with = "opt_timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, with = "opt_timestamp", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl ModelConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }
}

// ============================================================================
// LLM parameters
// ============================================================================

/// Invocation parameters for an agent backed by a language model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub config_list: Vec<ModelConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_seed: Option<i64>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            config_list: Vec::new(),
            timeout: None,
            cache_seed: None,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl LlmConfig {
    pub fn with_models(models: Vec<ModelConfig>) -> Self {
        Self {
            config_list: models,
            ..Self::default()
        }
    }

    pub fn has_models(&self) -> bool {
        !self.config_list.is_empty()
    }
}

// ============================================================================
// Enabled / disabled marker
// ============================================================================

/// An agent's LLM backing: either a full config, or the disabled marker that
/// is written on the wire as the literal `false`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LlmSetting {
    #[default]
    Disabled,
    Enabled(LlmConfig),
}

impl LlmSetting {
    /// Build a setting from a config, collapsing an empty model list into the
    /// disabled marker.
    pub fn from_config(config: LlmConfig) -> Self {
        if config.has_models() {
            Self::Enabled(config)
        } else {
            Self::Disabled
        }
    }

    /// Apply the empty-list collapse to an existing setting.
    pub fn normalized(self) -> Self {
        match self {
            Self::Enabled(config) => Self::from_config(config),
            Self::Disabled => Self::Disabled,
        }
    }

    pub fn config(&self) -> Option<&LlmConfig> {
        match self {
            Self::Enabled(config) => Some(config),
            Self::Disabled => None,
        }
    }
}

impl From<LlmConfig> for LlmSetting {
    fn from(config: LlmConfig) -> Self {
        Self::Enabled(config)
    }
}

impl Serialize for LlmSetting {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Disabled => s.serialize_bool(false),
            Self::Enabled(config) => config.serialize(s),
        }
    }
}

impl<'de> Deserialize<'de> for LlmSetting {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Flag(bool),
            Config(LlmConfig),
        }

        match Option::<Repr>::deserialize(d)? {
            None | Some(Repr::Flag(false)) => Ok(Self::Disabled),
            Some(Repr::Flag(true)) => Err(de::Error::custom(
                "llm_config must be an object or false",
            )),
            Some(Repr::Config(config)) => Ok(Self::Enabled(config)),
        }
    }
}
