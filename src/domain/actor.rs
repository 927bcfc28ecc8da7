use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A runnable automation unit owned by the caller's platform account.
///
/// Read-only from the bridge's perspective. Fields the bridge does not model
/// are kept in `extra` so the actor list is passed through unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Actor {
    /// Human-facing label: the title when present, else `username/name`.
    pub fn display_name(&self) -> String {
        match &self.title {
            Some(title) if !title.is_empty() => title.clone(),
            _ => format!("{}/{}", self.username, self.name),
        }
    }
}

/// One page of the platform's actor listing, passed through as received.
///
/// The counters describe the whole account, not just `items`, so they are
/// never recomputed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ActorPage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<bool>,
    #[serde(default)]
    pub items: Vec<Actor>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Declared shape of an actor's run input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActorSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type", default = "object_type")]
    pub schema_type: String,
    /// Absent when the actor takes no input. Declaration order is kept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, SchemaProperty>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ActorSchema {
    pub fn is_required(&self, field: &str) -> bool {
        self.required
            .as_ref()
            .is_some_and(|names| names.iter().any(|n| n == field))
    }

    pub fn takes_input(&self) -> bool {
        self.properties.is_some()
    }
}

/// Recursive descriptor of one input field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SchemaProperty {
    #[serde(rename = "type", default)]
    pub property_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaProperty>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, SchemaProperty>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn object_type() -> String {
    "object".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_keeps_property_order_and_extras() {
        let schema: ActorSchema = serde_json::from_value(json!({
            "title": "Scraper input",
            "type": "object",
            "schemaVersion": 1,
            "properties": {
                "startUrls": { "type": "array", "title": "Start URLs", "editor": "requestListSources" },
                "maxPages": { "type": "integer", "default": 10 },
                "debug": { "type": "boolean" }
            },
            "required": ["startUrls"]
        }))
        .unwrap();

        let keys: Vec<&str> = schema
            .properties
            .as_ref()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["startUrls", "maxPages", "debug"]);
        assert!(schema.is_required("startUrls"));
        assert!(!schema.is_required("debug"));
        assert_eq!(schema.extra.get("schemaVersion"), Some(&json!(1)));

        let start_urls = &schema.properties.as_ref().unwrap()["startUrls"];
        assert_eq!(
            start_urls.extra.get("editor"),
            Some(&json!("requestListSources"))
        );
    }

    #[test]
    fn test_schema_without_properties() {
        let schema: ActorSchema = serde_json::from_value(json!({ "type": "object" })).unwrap();
        assert!(!schema.takes_input());
        assert!(!schema.is_required("anything"));
    }

    #[test]
    fn test_actor_passthrough_roundtrip() {
        let raw = json!({
            "id": "abc123",
            "name": "web-scraper",
            "username": "apify",
            "createdAt": "2024-01-01T00:00:00.000Z",
            "stats": { "totalRuns": 4 }
        });
        let actor: Actor = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(actor.display_name(), "apify/web-scraper");
        assert_eq!(serde_json::to_value(&actor).unwrap(), raw);
    }
}
