//! Step input resolution.
//!
//! Every input binding that is a [`SourceRef`] is resolved against the task
//! context before the tool runs. A reference to a step that was skipped or
//! has not yet executed resolves to an explicit missing marker; it is never
//! silently treated as a present value.

use std::collections::BTreeMap;

use serde_json::Value;

use orchid_core::{InputValue, PlannedStep, SourceRef, TaskContext};

/// Inputs after resolution: present values plus explicit missing markers.
///
/// Resolving the same step twice against unchanged history yields the same
/// result; resolution reads the context and never mutates it.
#[derive(Debug, Clone, Default)]
pub struct ResolvedInputs {
    values: BTreeMap<String, Value>,
    missing: BTreeMap<String, String>,
}

impl ResolvedInputs {
    /// Get a resolved value by input name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Get a resolved string value by input name.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    /// Returns true if the named input resolved to a missing marker.
    pub fn is_missing(&self, name: &str) -> bool {
        self.missing.contains_key(name)
    }

    /// Why the named input is missing, if it is.
    pub fn missing_reason(&self, name: &str) -> Option<&str> {
        self.missing.get(name).map(String::as_str)
    }

    /// All resolved values.
    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    /// Names of all missing inputs.
    pub fn missing_names(&self) -> Vec<&str> {
        self.missing.keys().map(String::as_str).collect()
    }
}

/// Outcome of resolving one reference.
enum Resolved {
    Value(Value),
    Missing(String),
}

/// Resolve all of a step's input bindings against the task context.
pub fn resolve_inputs(step: &PlannedStep, context: &TaskContext) -> ResolvedInputs {
    let mut resolved = ResolvedInputs::default();

    for (name, input) in &step.inputs {
        match input {
            InputValue::Literal(value) => {
                resolved.values.insert(name.clone(), value.clone());
            }
            InputValue::Ref(source) => match resolve_ref(source, context) {
                Resolved::Value(value) => {
                    resolved.values.insert(name.clone(), value);
                }
                Resolved::Missing(reason) => {
                    resolved.missing.insert(name.clone(), reason);
                }
            },
        }
    }

    resolved
}

fn resolve_ref(source: &SourceRef, context: &TaskContext) -> Resolved {
    match source {
        SourceRef::Constant { value } => Resolved::Value(value.clone()),

        SourceRef::UserInput { name } => match context.inputs.get(name) {
            Some(value) => Resolved::Value(value.clone()),
            None => Resolved::Missing(format!("user input '{}' not provided", name)),
        },

        SourceRef::Environment { path } => {
            if context.environment.is_null() {
                return Resolved::Missing("environment not sensed".to_string());
            }
            match lookup_path(&context.environment, path) {
                Some(value) => Resolved::Value(value),
                None => Resolved::Missing(format!("environment path '{}' not found", path)),
            }
        }

        SourceRef::PreviousStep { step_id, path } => {
            let result = match context.step_result(step_id) {
                Some(result) => result,
                None => {
                    return Resolved::Missing(format!(
                        "step '{}' was skipped or has not executed",
                        step_id
                    ));
                }
            };

            let (head, rest) = match path.split_once('.') {
                Some((head, rest)) => (head, Some(rest)),
                None => (path.as_str(), None),
            };

            let root = match result.outputs.get(head) {
                Some(value) => value,
                None => {
                    return Resolved::Missing(format!(
                        "step '{}' produced no output '{}'",
                        step_id, head
                    ));
                }
            };

            match rest {
                None => Resolved::Value(root.clone()),
                Some(rest) => match lookup_path(root, rest) {
                    Some(value) => Resolved::Value(value),
                    None => Resolved::Missing(format!(
                        "path '{}' not found in output '{}' of step '{}'",
                        rest, head, step_id
                    )),
                },
            }
        }
    }
}

/// Walk a dotted path into a JSON value. An empty path yields the value
/// itself.
fn lookup_path(value: &Value, path: &str) -> Option<Value> {
    if path.is_empty() {
        return Some(value.clone());
    }
    let mut current = value;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current.clone())
}
