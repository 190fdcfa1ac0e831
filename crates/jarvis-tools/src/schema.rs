//! Typed parameter schemas
//!
//! Every tool declares its arguments as a [`ParamSchema`] tree. The tree is
//! rendered to JSON Schema for the LLM and used to validate incoming
//! arguments before a handler ever sees them.

use crate::error::{Error, Result};
use serde_json::{Map, Value};

/// Declared shape of a tool argument.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamSchema {
    /// UTF-8 string, optionally restricted to a fixed set of values
    String {
        /// Help text shown to the LLM
        description: Option<String>,
        /// Allowed values
        enum_values: Option<Vec<String>>,
    },
    /// Whole number
    Integer {
        /// Help text shown to the LLM
        description: Option<String>,
    },
    /// Any JSON number
    Number {
        /// Help text shown to the LLM
        description: Option<String>,
    },
    /// true / false
    Boolean {
        /// Help text shown to the LLM
        description: Option<String>,
    },
    /// Homogeneous list
    Array {
        /// Help text shown to the LLM
        description: Option<String>,
        /// Element schema
        items: Box<ParamSchema>,
    },
    /// Object with named properties
    Object {
        /// Help text shown to the LLM
        description: Option<String>,
        /// Properties in declaration order
        properties: Vec<(String, ParamSchema)>,
        /// Names that must be present
        required: Vec<String>,
    },
}

impl ParamSchema {
    /// A free-form string
    #[must_use]
    pub fn string() -> Self {
        Self::String {
            description: None,
            enum_values: None,
        }
    }

    /// A string restricted to `values`
    #[must_use]
    pub fn string_enum(values: &[&str]) -> Self {
        Self::String {
            description: None,
            enum_values: Some(values.iter().map(|v| (*v).to_string()).collect()),
        }
    }

    /// A whole number
    #[must_use]
    pub fn integer() -> Self {
        Self::Integer { description: None }
    }

    /// Any number
    #[must_use]
    pub fn number() -> Self {
        Self::Number { description: None }
    }

    /// A boolean
    #[must_use]
    pub fn boolean() -> Self {
        Self::Boolean { description: None }
    }

    /// A list of `items`
    #[must_use]
    pub fn array(items: ParamSchema) -> Self {
        Self::Array {
            description: None,
            items: Box::new(items),
        }
    }

    /// An empty object; add fields with [`property`](Self::property)
    /// and [`required_property`](Self::required_property)
    #[must_use]
    pub fn object() -> Self {
        Self::Object {
            description: None,
            properties: Vec::new(),
            required: Vec::new(),
        }
    }

    /// Attach help text
    #[must_use]
    pub fn describe(mut self, text: impl Into<String>) -> Self {
        let text = Some(text.into());
        match &mut self {
            Self::String { description, .. }
            | Self::Integer { description }
            | Self::Number { description }
            | Self::Boolean { description }
            | Self::Array { description, .. }
            | Self::Object { description, .. } => *description = text,
        }
        self
    }

    /// Add an optional property (no-op on non-object schemas)
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, schema: ParamSchema) -> Self {
        if let Self::Object { properties, .. } = &mut self {
            properties.push((name.into(), schema));
        }
        self
    }

    /// Add a required property (no-op on non-object schemas)
    #[must_use]
    pub fn required_property(mut self, name: impl Into<String>, schema: ParamSchema) -> Self {
        if let Self::Object {
            properties,
            required,
            ..
        } = &mut self
        {
            let name = name.into();
            required.push(name.clone());
            properties.push((name, schema));
        }
        self
    }

    fn type_name(&self) -> &'static str {
        match self {
            Self::String { .. } => "string",
            Self::Integer { .. } => "integer",
            Self::Number { .. } => "number",
            Self::Boolean { .. } => "boolean",
            Self::Array { .. } => "array",
            Self::Object { .. } => "object",
        }
    }

    /// Render as a JSON Schema fragment
    #[must_use]
    pub fn to_json_schema(&self) -> Value {
        let mut out = Map::new();
        out.insert("type".into(), Value::from(self.type_name()));

        match self {
            Self::String {
                description,
                enum_values,
            } => {
                insert_description(&mut out, description.as_deref());
                if let Some(values) = enum_values {
                    out.insert("enum".into(), Value::from(values.clone()));
                }
            }
            Self::Integer { description }
            | Self::Number { description }
            | Self::Boolean { description } => {
                insert_description(&mut out, description.as_deref());
            }
            Self::Array { description, items } => {
                insert_description(&mut out, description.as_deref());
                out.insert("items".into(), items.to_json_schema());
            }
            Self::Object {
                description,
                properties,
                required,
            } => {
                insert_description(&mut out, description.as_deref());
                let props: Map<String, Value> = properties
                    .iter()
                    .map(|(name, schema)| (name.clone(), schema.to_json_schema()))
                    .collect();
                out.insert("properties".into(), Value::Object(props));
                out.insert("required".into(), Value::from(required.clone()));
            }
        }

        Value::Object(out)
    }

    /// Check `value` against this schema.
    ///
    /// Errors name the offending JSON path, e.g. `$.items[1].name`.
    /// Unknown object keys are accepted and an explicit `null` counts as
    /// absent.
    pub fn validate(&self, value: &Value) -> Result<()> {
        self.validate_at(value, "$")
    }

    fn validate_at(&self, value: &Value, path: &str) -> Result<()> {
        match (self, value) {
            (Self::String { enum_values, .. }, Value::String(s)) => {
                if let Some(allowed) = enum_values {
                    if !allowed.iter().any(|a| a == s) {
                        return Err(Error::InvalidArgs(format!(
                            "{path}: '{s}' is not one of [{}]",
                            allowed.join(", ")
                        )));
                    }
                }
                Ok(())
            }
            (Self::Integer { .. }, Value::Number(n)) => {
                let whole = n.is_i64()
                    || n.is_u64()
                    || n.as_f64().is_some_and(|f| f.fract() == 0.0);
                if whole {
                    Ok(())
                } else {
                    Err(Error::InvalidArgs(format!("{path}: expected integer, got {n}")))
                }
            }
            (Self::Number { .. }, Value::Number(_)) | (Self::Boolean { .. }, Value::Bool(_)) => {
                Ok(())
            }
            (Self::Array { items, .. }, Value::Array(values)) => {
                for (i, v) in values.iter().enumerate() {
                    items.validate_at(v, &format!("{path}[{i}]"))?;
                }
                Ok(())
            }
            (
                Self::Object {
                    properties,
                    required,
                    ..
                },
                Value::Object(map),
            ) => {
                for name in required {
                    if map.get(name).is_none_or(Value::is_null) {
                        return Err(Error::InvalidArgs(format!(
                            "{path}.{name}: missing required field"
                        )));
                    }
                }
                for (name, schema) in properties {
                    match map.get(name) {
                        None | Some(Value::Null) => {}
                        Some(v) => schema.validate_at(v, &format!("{path}.{name}"))?,
                    }
                }
                Ok(())
            }
            (schema, other) => Err(Error::InvalidArgs(format!(
                "{path}: expected {}, got {}",
                schema.type_name(),
                json_type(other)
            ))),
        }
    }
}

fn insert_description(out: &mut Map<String, Value>, description: Option<&str>) {
    if let Some(d) = description {
        out.insert("description".into(), Value::from(d));
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
