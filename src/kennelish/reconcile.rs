//! Nested-path reconciler (write path)
//!
//! Validated payloads are flat and may use `parent.child` keys. `reconcile`
//! regroups them one level deep and `merge` applies the result onto a record
//! without ever overwriting a stored value with null.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use super::validate::ValidationErrors;
use crate::error::{OnboardError, Result};

/// Marker inside free-text attestations that counts as agreement.
const PROMISE_MARKER: &str = "i promise not";

/// Record type a form can write to.
pub trait FormRecord: Serialize + DeserializeOwned {
    /// Serialized default for a nested one-to-one relation, or `None` when
    /// the record has no relation by that name.
    fn nested_default(relation: &str) -> Option<Value>;
}

/// Lenient yes/no parsing for free-text consent answers.
///
/// Strings are compared case-insensitively; everything else passes through.
pub fn normalize(value: &Value) -> Value {
    let Value::String(s) = value else {
        return value.clone();
    };

    let lowered = s.to_lowercase();
    match lowered.as_str() {
        "yes" | "true" | "1" => Value::Bool(true),
        "no" | "false" | "0" => Value::Bool(false),
        _ if lowered.contains(PROMISE_MARKER) => Value::Bool(true),
        _ => value.clone(),
    }
}

/// Regroup dotted keys into one level of nesting.
///
/// A payload without any dotted key is returned as is. Otherwise every key
/// is handled on its own: flat keys stay at the top, dotted keys split on
/// the first `.`. When a flat key collides with a group of the same name the
/// group wins.
pub fn reconcile(payload: Map<String, Value>) -> Map<String, Value> {
    if !payload.keys().any(|key| key.contains('.')) {
        return payload;
    }

    let mut flat = Map::new();
    let mut groups: Map<String, Value> = Map::new();

    for (key, value) in payload {
        match key.split_once('.') {
            Some((parent, child)) => {
                let group = groups
                    .entry(parent.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(group) = group {
                    group.insert(child.to_string(), value);
                }
            }
            None => {
                flat.insert(key, value);
            }
        }
    }

    for (parent, group) in groups {
        if flat.contains_key(&parent) {
            warn!(key = %parent, "Flat field collides with dotted fields, keeping the dotted ones");
        }
        flat.insert(parent, group);
    }

    flat
}

/// Apply a reconciled patch onto a record.
///
/// Nulls are skipped. A mapping recurses into the sub-entity of that name,
/// creating it from `FormRecord::nested_default` when none is attached yet.
/// A string landing on a boolean field goes through `normalize`.
pub fn merge<R: FormRecord>(entity: &R, patch: &Map<String, Value>) -> Result<R> {
    let mut target = serde_json::to_value(entity)?;

    let Value::Object(fields) = &mut target else {
        return Err(OnboardError::Internal(
            "record does not serialize to an object".to_string(),
        ));
    };

    merge_fields(fields, patch, &R::nested_default);

    serde_json::from_value(target).map_err(|e| {
        OnboardError::MalformedInput(ValidationErrors::single("record", e.to_string()))
    })
}

fn no_nested(_relation: &str) -> Option<Value> {
    None
}

fn merge_fields(
    target: &mut Map<String, Value>,
    patch: &Map<String, Value>,
    nested_default: &dyn Fn(&str) -> Option<Value>,
) {
    for (key, value) in patch {
        if value.is_null() {
            continue;
        }

        if let Value::Object(sub_patch) = value {
            if sub_patch.values().all(Value::is_null) {
                continue;
            }

            if let Some(Value::Object(existing)) = target.get_mut(key) {
                merge_fields(existing, sub_patch, &no_nested);
                continue;
            }

            let attached = target.get(key).map_or(false, |current| !current.is_null());
            if attached {
                warn!(key = %key, "Dotted fields target a scalar field, skipping");
                continue;
            }

            match nested_default(key) {
                Some(Value::Object(mut fresh)) => {
                    merge_fields(&mut fresh, sub_patch, &no_nested);
                    target.insert(key.clone(), Value::Object(fresh));
                }
                _ => warn!(key = %key, "No nested entity type for dotted fields, skipping"),
            }
            continue;
        }

        match target.get_mut(key) {
            Some(current) => {
                *current = if current.is_boolean() {
                    normalize(value)
                } else {
                    value.clone()
                };
            }
            None => warn!(key = %key, "Record has no such field, skipping"),
        }
    }
}
