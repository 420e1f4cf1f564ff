//! A typed-accessor wrapper over the freeform JSON "props" bag every
//! component carries. Which keys are meaningful depends on the
//! component's `kind`; callers ask for a key with a default and get it
//! coerced the way the original engine's dynamically-typed dictionary
//! lookups did (missing or mistyped values fall back silently).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Props(Map<String, Value>);

impl Props {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn f64(&self, key: &str, default: f64) -> f64 {
        self.0.get(key).and_then(Value::as_f64).unwrap_or(default)
    }

    pub fn bool(&self, key: &str, default: bool) -> bool {
        self.0.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    pub fn str(&self, key: &str, default: &str) -> String {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| default.to_string())
    }

    pub fn str_opt(&self, key: &str) -> Option<String> {
        self.0.get(key).and_then(Value::as_str).map(str::to_string)
    }

    /// Integer property clamped into `[lo, hi]`, as used for PLC
    /// input/output counts (clamped to `[1, 64]`).
    pub fn clamped_i64(&self, key: &str, default: i64, lo: i64, hi: i64) -> usize {
        let raw = self.0.get(key).and_then(Value::as_i64).unwrap_or(default);
        raw.clamp(lo, hi) as usize
    }

    /// The `poles` list for a contactor, defaulting to a single `"NO"` pole.
    pub fn poles(&self) -> Vec<String> {
        match self.0.get("poles").and_then(Value::as_array) {
            Some(arr) if !arr.is_empty() => arr
                .iter()
                .map(|v| v.as_str().unwrap_or("NO").to_string())
                .collect(),
            _ => vec!["NO".to_string()],
        }
    }

    pub fn object(&self, key: &str) -> Option<&Map<String, Value>> {
        self.0.get(key).and_then(Value::as_object)
    }

    pub fn inner(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn inner_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }
}

impl From<Map<String, Value>> for Props {
    fn from(map: Map<String, Value>) -> Self {
        Props(map)
    }
}
