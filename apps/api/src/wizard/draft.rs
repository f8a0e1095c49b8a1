//! Draft form state — the mutable aggregate a wizard session accumulates.
//!
//! Writes never validate; validity is computed by the step validators at
//! read time, so the draft is free to be incomplete mid-edit. Nested
//! objects (location, budget range) merge one level deep so an update to
//! `location.city` preserves `location.country`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftFormState {
    fields: Map<String, Value>,
}

impl DraftFormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets one field. If both the existing and incoming values are
    /// objects, keys merge one level deep; otherwise the value replaces.
    pub fn update(&mut self, field: &str, value: Value) {
        match (self.fields.get_mut(field), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                for (k, v) in incoming {
                    existing.insert(k, v);
                }
            }
            (_, value) => {
                self.fields.insert(field.to_string(), value);
            }
        }
    }

    /// Reducer-style merge of a partial update, one atomic call per batch
    /// of field changes.
    pub fn merge(&mut self, partial: Map<String, Value>) {
        for (field, value) in partial {
            self.update(&field, value);
        }
    }

    pub fn reset(&mut self) {
        self.fields.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(|v| v.as_str())
    }

    pub fn bool_field(&self, field: &str) -> bool {
        self.fields
            .get(field)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// Whether a field holds a non-blank string.
    pub fn has_text(&self, field: &str) -> bool {
        self.str_field(field)
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false)
    }

    pub fn object(&self, field: &str) -> Option<&Map<String, Value>> {
        self.fields.get(field).and_then(|v| v.as_object())
    }

    pub fn array(&self, field: &str) -> Option<&Vec<Value>> {
        self.fields.get(field).and_then(|v| v.as_array())
    }

    pub fn string_list(&self, field: &str) -> Vec<String> {
        self.array(field)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A budget range split into its editable sub-fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetRange {
    pub min: String,
    pub max: String,
}

const BUDGET_SEPARATOR: &str = " - ";
const BUDGET_UP_TO: &str = "Up to ";

/// Combines the two editable budget sub-fields into the stored string.
///
/// Both empty -> ""; min only -> min; max only -> "Up to {max}";
/// both -> "{min} - {max}".
pub fn format_budget_range(min: &str, max: &str) -> String {
    match (min.is_empty(), max.is_empty()) {
        (true, true) => String::new(),
        (false, true) => min.to_string(),
        (true, false) => format!("{BUDGET_UP_TO}{max}"),
        (false, false) => format!("{min}{BUDGET_SEPARATOR}{max}"),
    }
}

/// Splits a stored budget string back into its editable sub-fields.
/// Inverse of `format_budget_range`; format -> parse -> format is a fixpoint.
pub fn parse_budget_range(stored: &str) -> BudgetRange {
    if stored.is_empty() {
        return BudgetRange::default();
    }
    if let Some((min, max)) = stored.split_once(BUDGET_SEPARATOR) {
        return BudgetRange {
            min: min.to_string(),
            max: max.to_string(),
        };
    }
    if let Some(max) = stored.strip_prefix(BUDGET_UP_TO) {
        return BudgetRange {
            min: String::new(),
            max: max.to_string(),
        };
    }
    BudgetRange {
        min: stored.to_string(),
        max: String::new(),
    }
}
