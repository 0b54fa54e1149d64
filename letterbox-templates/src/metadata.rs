//! Template catalogue metadata.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Input widget a field expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Textarea,
    Number,
}

/// One template input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub default: Value,
}

impl FieldSpec {
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        kind: FieldKind,
        default: impl Into<Value>,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            default: default.into(),
        }
    }

    pub fn text(name: &str, label: &str, default: &str) -> Self {
        Self::new(name, label, FieldKind::Text, default)
    }

    pub fn textarea(name: &str, label: &str, default: &str) -> Self {
        Self::new(name, label, FieldKind::Textarea, default)
    }

    pub fn number(name: &str, label: &str, default: i64) -> Self {
        Self::new(name, label, FieldKind::Number, default)
    }
}

/// Describes a template to callers choosing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateMeta {
    pub display_name: String,
    pub description: String,
    pub fields: Vec<FieldSpec>,
}

impl TemplateMeta {
    pub fn new(display_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            description: description.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// `data` with every missing or null field filled from its default.
    ///
    /// Non-object input is treated as an empty object.
    pub fn with_defaults(&self, data: &Value) -> Value {
        let mut merged = data.as_object().cloned().unwrap_or_default();
        for field in &self.fields {
            let missing = merged.get(&field.name).is_none_or(Value::is_null);
            if missing {
                merged.insert(field.name.clone(), field.default.clone());
            }
        }
        Value::Object(merged)
    }
}
