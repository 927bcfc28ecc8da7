//! Input form model derived from an actor's input schema.
//!
//! The schema's `type` string is an open set. It is folded into a closed
//! [`FieldKind`] first, and every widget decision is a total match over that.

use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::domain::{ActorSchema, SchemaProperty};

/// Closed classification of a property's declared `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Array,
    /// `object` and anything unrecognized.
    Other,
}

impl FieldKind {
    pub fn of(property: &SchemaProperty) -> Self {
        match property.property_type.as_str() {
            "string" => Self::String,
            "number" | "integer" => Self::Number,
            "boolean" => Self::Boolean,
            "array" => Self::Array,
            _ => Self::Other,
        }
    }
}

/// Input control a field is rendered with.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "widget", rename_all = "snake_case")]
pub enum Widget {
    Select { options: Vec<Value> },
    Text,
    Numeric,
    Checkbox,
    /// One item per line.
    LineList,
    /// Raw JSON text.
    JsonEditor,
}

pub fn widget_for(property: &SchemaProperty) -> Widget {
    match FieldKind::of(property) {
        FieldKind::String => match &property.enum_values {
            Some(options) => Widget::Select {
                options: options.clone(),
            },
            None => Widget::Text,
        },
        FieldKind::Number => Widget::Numeric,
        FieldKind::Boolean => Widget::Checkbox,
        FieldKind::Array => Widget::LineList,
        FieldKind::Other => Widget::JsonEditor,
    }
}

/// Everything needed to render one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormField {
    pub key: String,
    pub label: String,
    pub description: Option<String>,
    pub placeholder: String,
    pub required: bool,
    pub kind: FieldKind,
    #[serde(flatten)]
    pub widget: Widget,
}

/// Fields in schema declaration order. Empty when the actor takes no input.
pub fn fields(schema: &ActorSchema) -> Vec<FormField> {
    let Some(properties) = &schema.properties else {
        return Vec::new();
    };

    properties
        .iter()
        .map(|(key, property)| {
            let kind = FieldKind::of(property);
            let label = property.title.clone().unwrap_or_else(|| key.clone());
            FormField {
                key: key.clone(),
                placeholder: placeholder(kind, property, &label),
                label,
                description: property.description.clone(),
                required: schema.is_required(key),
                kind,
                widget: widget_for(property),
            }
        })
        .collect()
}

fn placeholder(kind: FieldKind, property: &SchemaProperty, label: &str) -> String {
    if let Some(description) = &property.description {
        return description.clone();
    }
    match kind {
        FieldKind::Array => "Enter one item per line".to_string(),
        FieldKind::Other => "Enter JSON data".to_string(),
        FieldKind::String | FieldKind::Number | FieldKind::Boolean => format!("Enter {label}"),
    }
}

/// Starting values for a form: declared defaults, else `false` for
/// booleans and `[]` for arrays. Other fields start unset.
pub fn initial_input(schema: &ActorSchema) -> Map<String, Value> {
    let mut input = Map::new();
    let Some(properties) = &schema.properties else {
        return input;
    };

    for (key, property) in properties {
        let value = match (&property.default, FieldKind::of(property)) {
            (Some(default), _) => default.clone(),
            (None, FieldKind::Boolean) => Value::Bool(false),
            (None, FieldKind::Array) => Value::Array(Vec::new()),
            (None, _) => continue,
        };
        input.insert(key.clone(), value);
    }
    input
}

/// Convert the raw text of a field into the value sent as run input.
///
/// Numbers that fail to parse become `0`. Line lists drop blank lines.
/// The JSON editor keeps the raw text when it is not valid JSON.
pub fn parse_field(kind: FieldKind, raw: &str) -> Value {
    match kind {
        FieldKind::String => Value::String(raw.to_string()),
        FieldKind::Number => parse_number(raw),
        FieldKind::Boolean => Value::Bool(matches!(
            raw.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        )),
        FieldKind::Array => Value::Array(
            raw.split('\n')
                .filter(|line| !line.trim().is_empty())
                .map(|line| Value::String(line.to_string()))
                .collect(),
        ),
        FieldKind::Other => {
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
        }
    }
}

fn parse_number(raw: &str) -> Value {
    let trimmed = raw.trim();
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::Number(int.into());
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map_or_else(|| Value::Number(0.into()), Value::Number)
}

/// Text shown in an editor for a current value: strings as-is, line lists
/// one item per line, everything else as pretty JSON.
pub fn display_value(kind: FieldKind, value: &Value) -> String {
    match (kind, value) {
        (_, Value::Null) => String::new(),
        (_, Value::String(s)) => s.clone(),
        (FieldKind::Array, Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        (_, Value::Array(_) | Value::Object(_)) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        (_, primitive) => primitive.to_string(),
    }
}
