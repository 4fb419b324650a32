//! Schema-to-validator compiler
//!
//! Walks the same schema tree as the renderer and derives one constraint per
//! field key. The resulting `ValidatorSpec` lives for a single submission.

use std::fmt;

use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::schema::{email_pattern, SchemaNode, NID_PATTERN, SLIDER_MAX, SLIDER_MIN};

/// Constraint attached to one submitted field. Every constraint accepts null.
#[derive(Debug, Clone)]
pub enum Constraint {
    /// Closed choice: the value must equal one of these strings
    Literal(Vec<String>),
    Pattern(Regex),
    IntRange { min: i64, max: i64 },
    FreeString,
}

impl Constraint {
    /// Check a submitted value, returning the value to keep.
    pub fn check(&self, value: &Value) -> Result<Value, String> {
        if value.is_null() {
            return Ok(Value::Null);
        }

        match self {
            Self::Literal(options) => match value {
                Value::String(s) if s.is_empty() => Ok(Value::Null),
                Value::String(s) if options.iter().any(|o| o == s) => Ok(value.clone()),
                Value::String(s) => Err(format!("{:?} is not one of {:?}", s, options)),
                other => Err(format!("expected one of {:?}, got {}", options, other)),
            },
            Self::Pattern(regex) => match value {
                Value::String(s) if s.is_empty() => Ok(Value::Null),
                Value::String(s) if regex.is_match(s) => Ok(value.clone()),
                Value::String(_) => Err(format!("does not match {}", regex.as_str())),
                other => Err(format!("expected a string, got {}", other)),
            },
            Self::IntRange { min, max } => {
                let n = match value {
                    Value::Number(n) => n.as_i64(),
                    Value::String(s) if s.trim().is_empty() => return Ok(Value::Null),
                    Value::String(s) => s.trim().parse::<i64>().ok(),
                    _ => None,
                }
                .ok_or_else(|| format!("expected an integer, got {}", value))?;

                if (*min..=*max).contains(&n) {
                    Ok(Value::from(n))
                } else {
                    Err(format!("{} is outside {}..={}", n, min, max))
                }
            }
            Self::FreeString => match value {
                Value::String(_) => Ok(value.clone()),
                Value::Number(n) => Ok(Value::String(n.to_string())),
                // checkbox groups submit every ticked box
                Value::Array(items) => items
                    .iter()
                    .map(|item| item.as_str().ok_or("expected a list of strings"))
                    .collect::<Result<Vec<_>, _>>()
                    .map(|parts| Value::String(parts.join(", ")))
                    .map_err(str::to_string),
                other => Err(format!("expected a string, got {}", other)),
            },
        }
    }
}

/// Field key to constraint, in depth-first schema order
#[derive(Debug, Clone, Default)]
pub struct ValidatorSpec {
    fields: IndexMap<String, Constraint>,
}

impl ValidatorSpec {
    pub fn get(&self, key: &str) -> Option<&Constraint> {
        self.fields.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validate a flat payload.
    ///
    /// The output holds every compiled key, null where the payload had no
    /// value. Keys the schema does not declare are dropped. All failures are
    /// collected before returning.
    pub fn validate(&self, payload: &Map<String, Value>) -> Result<Map<String, Value>, ValidationErrors> {
        let mut output = Map::new();
        let mut errors = ValidationErrors::default();

        for (key, constraint) in &self.fields {
            let value = payload.get(key).unwrap_or(&Value::Null);
            match constraint.check(value) {
                Ok(checked) => {
                    output.insert(key.clone(), checked);
                }
                Err(reason) => errors.push(key, reason),
            }
        }

        for key in payload.keys().filter(|key| !self.fields.contains_key(*key)) {
            debug!(key = %key, "Dropping field not declared by the form");
        }

        if errors.is_empty() {
            Ok(output)
        } else {
            Err(errors)
        }
    }
}

/// Compile a form document into its validator.
pub fn compile(schema: &[Value]) -> ValidatorSpec {
    let mut spec = ValidatorSpec::default();
    compile_into(schema, &mut spec.fields);
    spec
}

fn compile_into(schema: &[Value], fields: &mut IndexMap<String, Constraint>) {
    for raw in schema {
        let node = match SchemaNode::parse(raw) {
            Ok(node) => node,
            Err(e) => {
                warn!(error = %e, "Skipping malformed node while compiling validator");
                continue;
            }
        };

        if let Some(elements) = node.elements() {
            compile_into(elements, fields);
            continue;
        }

        let Some(key) = node.key() else {
            continue;
        };

        let constraint = match constraint_for(&node) {
            Ok(constraint) => constraint,
            Err(e) => {
                warn!(key, error = %e, "Skipping field with an unusable pattern");
                continue;
            }
        };

        // last write wins; move the key to its latest position
        fields.shift_remove(key);
        fields.insert(key.to_string(), constraint);
    }
}

fn constraint_for(node: &SchemaNode) -> Result<Constraint, regex::Error> {
    let constraint = match node {
        SchemaNode::Radio(field) => Constraint::Literal(field.options.clone()),
        SchemaNode::Dropdown(field) if !field.other => Constraint::Literal(field.options.clone()),
        SchemaNode::Email(field) => {
            Constraint::Pattern(Regex::new(&email_pattern(field.domain.as_deref()))?)
        }
        SchemaNode::Nid(_) => Constraint::Pattern(Regex::new(NID_PATTERN)?),
        SchemaNode::Slider(_) => Constraint::IntRange {
            min: SLIDER_MIN,
            max: SLIDER_MAX,
        },
        _ => Constraint::FreeString,
    };

    Ok(constraint)
}

/// One rejected field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub key: String,
    pub reason: String,
}

/// Every field that failed validation in one payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn single(key: impl Into<String>, reason: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.push(key, reason);
        errors
    }

    pub fn push(&mut self, key: impl Into<String>, reason: impl Into<String>) {
        self.fields.push(FieldError {
            key: key.into(),
            reason: reason.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.fields.iter()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.iter().any(|f| f.key == key)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field.key, field.reason)?;
        }
        Ok(())
    }
}
