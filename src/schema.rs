//! The schema capability the validator delegates to.
//!
//! [`Schema`] is the seam: given a JSON value, return one formatted,
//! human-readable string per violation. The validator never looks inside
//! those strings. [`JsonSchema`] implements it with the `jsonschema` crate;
//! any other backend (or a plain closure) can be plugged in instead.

use jsonschema::{ValidationError, Validator};
use serde_json::{Map, Value};

/// Checks a value and reports every violation as a formatted string.
///
/// An empty vector means the value conforms.
pub trait Schema: Send + Sync + 'static {
    fn validate(&self, value: &Value) -> Vec<String>;
}

impl<F> Schema for F
where
    F: Fn(&Value) -> Vec<String> + Send + Sync + 'static,
{
    fn validate(&self, value: &Value) -> Vec<String> {
        self(value)
    }
}

/// A compiled JSON Schema document.
///
/// The draft is detected from `$schema`, defaulting to 2020-12.
pub struct JsonSchema {
    validator: Validator,
}

impl JsonSchema {
    /// Compiles `document`. On failure returns the compiler's message.
    pub fn compile(document: &Value) -> Result<Self, String> {
        let validator = jsonschema::validator_for(document).map_err(|e| e.to_string())?;
        Ok(Self { validator })
    }

    /// Compiles `document` after lower-casing every object property name it
    /// declares, so it matches instances whose keys were lower-cased too
    /// (HTTP header names).
    ///
    /// Fails if two declared names differ only in case.
    pub fn compile_case_insensitive(document: &Value) -> Result<Self, String> {
        Self::compile(&fold_property_names(document)?)
    }
}

impl Schema for JsonSchema {
    fn validate(&self, value: &Value) -> Vec<String> {
        self.validator.iter_errors(value).map(|e| format_error(&e)).collect()
    }
}

/// `"<instance path>: <message>"`, or the bare message at the document root.
fn format_error(error: &ValidationError<'_>) -> String {
    let path = error.instance_path.to_string();
    if path.is_empty() {
        error.to_string()
    } else {
        format!("{path}: {error}")
    }
}

/// Lower-cases every place a schema names an object property: the keys of
/// `properties`, `dependentSchemas`, `dependentRequired` and `dependencies`,
/// the name lists of `required`, `dependentRequired` and `dependencies`, and
/// the `const`/`enum` literals under `propertyNames`. Recurses through every
/// subschema. `patternProperties` regexes are left as written.
///
/// Two names that differ only in case are an error.
fn fold_property_names(schema: &Value) -> Result<Value, String> {
    match schema {
        Value::Object(map) => {
            let mut folded = Map::with_capacity(map.len());
            for (key, value) in map {
                let value = match (key.as_str(), value) {
                    ("properties" | "dependentSchemas", Value::Object(named)) => {
                        Value::Object(fold_names(key, named, fold_property_names)?)
                    }
                    ("dependentRequired", Value::Object(named)) => {
                        Value::Object(fold_names(key, named, |names| Ok(lowercase_names(names)))?)
                    }
                    // Draft 7: either a name list or a subschema per property.
                    ("dependencies", Value::Object(named)) => {
                        Value::Object(fold_names(key, named, |dep| match dep {
                            Value::Array(_) => Ok(lowercase_names(dep)),
                            sub => fold_property_names(sub),
                        })?)
                    }
                    ("required", Value::Array(_)) => lowercase_names(value),
                    ("propertyNames", _) => fold_name_literals(value),
                    // Literal values, not subschemas.
                    ("const" | "enum" | "default" | "examples", _) => value.clone(),
                    _ => fold_property_names(value)?,
                };
                folded.insert(key.clone(), value);
            }
            Ok(Value::Object(folded))
        }
        Value::Array(items) => {
            let items = items.iter().map(fold_property_names).collect::<Result<_, _>>()?;
            Ok(Value::Array(items))
        }
        other => Ok(other.clone()),
    }
}

fn fold_names(
    keyword: &str,
    named: &Map<String, Value>,
    fold_value: impl Fn(&Value) -> Result<Value, String>,
) -> Result<Map<String, Value>, String> {
    let mut folded = Map::with_capacity(named.len());
    for (name, value) in named {
        let lower = name.to_ascii_lowercase();
        if folded.contains_key(&lower) {
            return Err(format!("`{keyword}` names `{lower}` more than once when case is ignored"));
        }
        folded.insert(lower, fold_value(value)?);
    }
    Ok(folded)
}

/// A name or a list of names, lower-cased. Anything else is kept.
fn lowercase_names(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.to_ascii_lowercase()),
        Value::Array(items) => Value::Array(items.iter().map(lowercase_names).collect()),
        other => other.clone(),
    }
}

/// Inside a `propertyNames` subschema the instance is the name itself, so
/// only its `const`/`enum` literals change.
fn fold_name_literals(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    let value = match key.as_str() {
                        "const" | "enum" => lowercase_names(value),
                        _ => fold_name_literals(value),
                    };
                    (key.clone(), value)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(fold_name_literals).collect()),
        other => other.clone(),
    }
}
