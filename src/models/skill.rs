use serde::{Deserialize, Serialize};

use super::wire::{self, opt_timestamp, Timestamp};

/// A reusable code snippet that can be attached to an agent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Skill {
    #[serde(alias = "title")]
    pub name: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Secret names the snippet expects in its environment.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub secrets: serde_json::Map<String, serde_json::Value>,
    /// Packages the snippet needs installed.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub libraries: serde_json::Map<String, serde_json::Value>,
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

impl Skill {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_title_alias() {
        let skill: Skill = serde_json::from_value(json!({
            "title": "generate_images",
            "content": "def generate_images(query): ...",
            "user_id": "guestuser@gmail.com"
        }))
        .unwrap();
        assert_eq!(skill.name, "generate_images");
        assert_eq!(skill.user_id.as_deref(), Some("guestuser@gmail.com"));
    }

    #[test]
    fn empty_maps_are_omitted() {
        let value = serde_json::to_value(Skill::new("noop", "pass")).unwrap();
        assert_eq!(value, json!({"name": "noop", "content": "pass"}));
    }
}
