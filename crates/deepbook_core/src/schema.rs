//! Declarative shapes for structured model output.
//!
//! A [`SchemaDescriptor`] lists the fields a model response must contain,
//! their primitive types and a few simple constraints. The same descriptor
//! serves three purposes:
//!
//! - [`SchemaDescriptor::validate`] checks a raw JSON value and returns a
//!   normalized copy, or the path of the first offending field
//! - [`SchemaDescriptor::to_json_schema`] produces a strict JSON Schema for
//!   providers with native structured output
//! - [`SchemaDescriptor::format_instructions`] produces prompt text for
//!   providers without it
//!
//! # Examples
//!
//! ```
//! use deepbook_core::{FieldSpec, SchemaDescriptor};
//! use serde_json::json;
//!
//! let schema = SchemaDescriptor::new("metadata")
//!     .field(FieldSpec::text("title").non_empty())
//!     .field(FieldSpec::text_list("themes"));
//!
//! let value = schema
//!     .validate(&json!({"title": "  Tilly the Turtle ", "themes": ["kindness"], "extra": 1}))
//!     .unwrap();
//! assert_eq!(value, json!({"title": "Tilly the Turtle", "themes": ["kindness"]}));
//!
//! let err = schema.validate(&json!({"title": "", "themes": []})).unwrap_err();
//! assert_eq!(err.path, "title");
//! ```

use deepbook_error::{SchemaValidationError, SchemaViolation};
use serde_json::{Map, Value, json};

/// Path used when the root value itself is malformed.
const ROOT_PATH: &str = "$";

/// Primitive shape of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// A string
    Text,
    /// A whole number
    Integer,
    /// A list of strings
    TextList,
    /// A nested object
    Object(SchemaDescriptor),
    /// A list of nested objects
    List(SchemaDescriptor),
}

impl FieldType {
    fn expected(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Integer => "integer",
            FieldType::TextList => "list of text",
            FieldType::Object(_) => "object",
            FieldType::List(_) => "list of objects",
        }
    }
}

/// A constraint checked after a field has been coerced to its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Text (or every text list item) must be non-empty after trimming
    NonEmpty,
    /// Integer must be greater than zero
    Positive,
    /// List must hold at least this many items
    MinItems(usize),
}

/// One declared field of a schema.
#[derive(Debug, Clone, PartialEq, derive_getters::Getters, derive_setters::Setters)]
#[setters(prefix = "with_", into)]
pub struct FieldSpec {
    /// JSON key
    #[setters(skip)]
    name: String,
    /// Expected shape
    #[setters(skip)]
    field_type: FieldType,
    /// Whether absence (or null) is an error
    required: bool,
    /// Human-readable hint passed to the model
    description: Option<String>,
    /// Checks applied after coercion
    #[setters(skip)]
    constraints: Vec<Constraint>,
}

impl FieldSpec {
    /// A required field of the given type.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: true,
            description: None,
            constraints: Vec::new(),
        }
    }

    /// A required text field.
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Text)
    }

    /// A required integer field.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer)
    }

    /// A required list-of-text field.
    pub fn text_list(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::TextList)
    }

    /// A required nested object field.
    pub fn object(name: impl Into<String>, schema: SchemaDescriptor) -> Self {
        Self::new(name, FieldType::Object(schema))
    }

    /// A required list-of-objects field.
    pub fn list(name: impl Into<String>, item: SchemaDescriptor) -> Self {
        Self::new(name, FieldType::List(item))
    }

    /// Mark the field optional.
    pub fn optional(self) -> Self {
        self.with_required(false)
    }

    /// Attach a description.
    pub fn describe(self, description: impl Into<String>) -> Self {
        self.with_description(Some(description.into()))
    }

    /// Require non-empty text.
    pub fn non_empty(self) -> Self {
        self.constrain(Constraint::NonEmpty)
    }

    /// Require a positive integer.
    pub fn positive(self) -> Self {
        self.constrain(Constraint::Positive)
    }

    /// Require at least `min` list items.
    pub fn min_items(self, min: usize) -> Self {
        self.constrain(Constraint::MinItems(min))
    }

    /// Add an arbitrary constraint.
    pub fn constrain(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    fn validate_value(&self, path: &str, raw: &Value) -> Result<Value, SchemaValidationError> {
        let wrong_type = || {
            SchemaValidationError::new(
                path,
                SchemaViolation::WrongType {
                    expected: self.field_type.expected(),
                },
            )
        };

        let value = match &self.field_type {
            FieldType::Text => match raw {
                Value::String(s) => Value::String(s.trim().to_string()),
                _ => return Err(wrong_type()),
            },
            FieldType::Integer => coerce_integer(raw).map(Value::from).ok_or_else(wrong_type)?,
            FieldType::TextList => match raw {
                // A lone string is read as a one-item list.
                Value::String(s) => json!([s.trim()]),
                Value::Array(items) => {
                    let mut out = Vec::with_capacity(items.len());
                    for (i, item) in items.iter().enumerate() {
                        match item {
                            Value::String(s) => out.push(Value::String(s.trim().to_string())),
                            _ => {
                                return Err(SchemaValidationError::new(
                                    format!("{path}[{i}]"),
                                    SchemaViolation::WrongType { expected: "text" },
                                ));
                            }
                        }
                    }
                    Value::Array(out)
                }
                _ => return Err(wrong_type()),
            },
            FieldType::Object(schema) => schema.validate_object(path, raw)?,
            FieldType::List(schema) => match raw {
                Value::Array(items) => {
                    let mut out = Vec::with_capacity(items.len());
                    for (i, item) in items.iter().enumerate() {
                        out.push(schema.validate_object(&format!("{path}[{i}]"), item)?);
                    }
                    Value::Array(out)
                }
                _ => return Err(wrong_type()),
            },
        };

        for constraint in &self.constraints {
            check_constraint(path, *constraint, &value)?;
        }
        Ok(value)
    }
}

fn coerce_integer(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn check_constraint(
    path: &str,
    constraint: Constraint,
    value: &Value,
) -> Result<(), SchemaValidationError> {
    match (constraint, value) {
        (Constraint::NonEmpty, Value::String(s)) if s.is_empty() => {
            Err(SchemaValidationError::new(path, SchemaViolation::EmptyText))
        }
        (Constraint::NonEmpty, Value::Array(items)) => {
            match items.iter().position(|v| v.as_str().is_some_and(str::is_empty)) {
                Some(i) => Err(SchemaValidationError::new(
                    format!("{path}[{i}]"),
                    SchemaViolation::EmptyText,
                )),
                None => Ok(()),
            }
        }
        (Constraint::Positive, Value::Number(n)) if n.as_i64().is_some_and(|n| n <= 0) => {
            Err(SchemaValidationError::new(path, SchemaViolation::NonPositive))
        }
        (Constraint::MinItems(min), Value::Array(items)) if items.len() < min => Err(
            SchemaValidationError::new(path, SchemaViolation::TooFewItems { min }),
        ),
        _ => Ok(()),
    }
}

/// The declared shape of one stage's structured output.
#[derive(Debug, Clone, PartialEq, derive_getters::Getters)]
pub struct SchemaDescriptor {
    /// Short identifier, also used as the JSON Schema name
    name: String,
    /// Declared fields in prompt order
    fields: Vec<FieldSpec>,
}

impl SchemaDescriptor {
    /// An empty object schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field.
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Validate a raw model response and return its normalized form.
    ///
    /// Normalization trims text, drops undeclared keys, and coerces
    /// integral floats and numeric strings to integers. Optional fields that
    /// are absent or null are omitted from the result.
    ///
    /// # Errors
    ///
    /// Returns the first violation found, with the offending field path.
    pub fn validate(&self, value: &Value) -> Result<Value, SchemaValidationError> {
        self.validate_object("", value)
    }

    fn validate_object(&self, prefix: &str, value: &Value) -> Result<Value, SchemaValidationError> {
        let Value::Object(object) = value else {
            let path = if prefix.is_empty() { ROOT_PATH } else { prefix };
            return Err(SchemaValidationError::new(
                path,
                SchemaViolation::WrongType { expected: "object" },
            ));
        };

        let mut normalized = Map::new();
        for field in &self.fields {
            let path = if prefix.is_empty() {
                field.name.clone()
            } else {
                format!("{prefix}.{}", field.name)
            };
            match object.get(&field.name) {
                None | Some(Value::Null) if field.required => {
                    return Err(SchemaValidationError::new(path, SchemaViolation::MissingField));
                }
                None | Some(Value::Null) => {}
                Some(raw) => {
                    normalized.insert(field.name.clone(), field.validate_value(&path, raw)?);
                }
            }
        }
        Ok(Value::Object(normalized))
    }

    /// Strict JSON Schema for this shape.
    ///
    /// Every property is listed as required and optional ones accept `null`,
    /// which is the form strict structured-output modes expect.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            let mut property = match &field.field_type {
                FieldType::Text => json!({"type": "string"}),
                FieldType::Integer => json!({"type": "integer"}),
                FieldType::TextList => json!({"type": "array", "items": {"type": "string"}}),
                FieldType::Object(schema) => schema.to_json_schema(),
                FieldType::List(schema) => json!({"type": "array", "items": schema.to_json_schema()}),
            };
            if !field.required
                && let Some(ty) = property.get("type").cloned()
            {
                property["type"] = json!([ty, "null"]);
            }
            if let Some(description) = &field.description {
                property["description"] = Value::String(description.clone());
            }
            properties.insert(field.name.clone(), property);
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": self.fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
            "additionalProperties": false,
        })
    }

    /// Prompt text asking a model to answer with JSON of this shape.
    pub fn format_instructions(&self) -> String {
        let schema = self.to_json_schema();
        let rendered = serde_json::to_string_pretty(&schema).unwrap_or_else(|_| schema.to_string());
        format!(
            "Respond with a single JSON object and nothing else. \
             It must conform to the following JSON schema:\n```json\n{rendered}\n```"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn character() -> SchemaDescriptor {
        SchemaDescriptor::new("character")
            .field(FieldSpec::text("name").non_empty())
            .field(FieldSpec::text("personality"))
    }

    fn cast() -> SchemaDescriptor {
        SchemaDescriptor::new("cast").field(FieldSpec::list("characters", character()).min_items(1))
    }

    #[test]
    fn test_nested_path_reported() {
        let err = cast()
            .validate(&json!({"characters": [
                {"name": "Tilly", "personality": "shy"},
                {"name": "   ", "personality": "bold"}
            ]}))
            .unwrap_err();
        assert_eq!(err.path, "characters[1].name");
        assert_eq!(err.violation, SchemaViolation::EmptyText);
    }

    #[test]
    fn test_missing_and_null_fields() {
        let err = character().validate(&json!({"name": "Tilly"})).unwrap_err();
        assert_eq!(err.path, "personality");
        assert_eq!(err.violation, SchemaViolation::MissingField);

        let err = character()
            .validate(&json!({"name": null, "personality": "kind"}))
            .unwrap_err();
        assert_eq!(err.violation, SchemaViolation::MissingField);
    }

    #[test]
    fn test_min_items() {
        let err = cast().validate(&json!({"characters": []})).unwrap_err();
        assert_eq!(err.violation, SchemaViolation::TooFewItems { min: 1 });
    }

    #[test]
    fn test_integer_coercion() {
        let schema = SchemaDescriptor::new("entry")
            .field(FieldSpec::integer("chapter").positive())
            .field(FieldSpec::integer("year").optional());

        let value = schema.validate(&json!({"chapter": 2.0, "year": " 1999 "})).unwrap();
        assert_eq!(value, json!({"chapter": 2, "year": 1999}));

        let value = schema.validate(&json!({"chapter": "3"})).unwrap();
        assert_eq!(value, json!({"chapter": 3}));

        let err = schema.validate(&json!({"chapter": 0})).unwrap_err();
        assert_eq!(err.violation, SchemaViolation::NonPositive);

        let err = schema.validate(&json!({"chapter": 1.5})).unwrap_err();
        assert_eq!(err.violation, SchemaViolation::WrongType { expected: "integer" });
    }

    #[test]
    fn test_text_list_accepts_single_string() {
        let schema = SchemaDescriptor::new("tags").field(FieldSpec::text_list("themes"));
        let value = schema.validate(&json!({"themes": " friendship "})).unwrap();
        assert_eq!(value, json!({"themes": ["friendship"]}));

        let err = schema.validate(&json!({"themes": ["ok", 3]})).unwrap_err();
        assert_eq!(err.path, "themes[1]");
    }

    #[test]
    fn test_root_must_be_object() {
        let err = character().validate(&json!(["Tilly"])).unwrap_err();
        assert_eq!(err.path, ROOT_PATH);
    }

    #[test]
    fn test_json_schema_is_strict() {
        let schema = SchemaDescriptor::new("entry")
            .field(FieldSpec::text("title").describe("Chapter title"))
            .field(FieldSpec::integer("year").optional());
        let js = schema.to_json_schema();

        assert_eq!(js["additionalProperties"], json!(false));
        assert_eq!(js["required"], json!(["title", "year"]));
        assert_eq!(js["properties"]["year"]["type"], json!(["integer", "null"]));
        assert_eq!(js["properties"]["title"]["description"], json!("Chapter title"));
    }

    #[test]
    fn test_format_instructions_embed_schema() {
        let text = cast().format_instructions();
        assert!(text.contains("\"characters\""));
        assert!(text.contains("```json"));
    }
}
