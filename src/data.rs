//! The flat key/value snapshot entities read from.
//!
//! Global keys are bare (`state`, `effects`, `audio_input`); per-device keys
//! are `{code}_{field}`. Keys are never removed once written.

use crate::effects::PresetTable;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

pub const STATE: &str = "state";
pub const SW_VERSION: &str = "device_sw_version";
pub const EFFECTS: &str = "effects";
pub const DEFAULT_PRESETS: &str = "default_presets";
pub const CUSTOM_PRESETS: &str = "custom_presets";
pub const AUDIO_INPUT: &str = "audio_input";
pub const AUDIO_INPUT_OPTIONS: &str = "audio_input_options";
pub const PAUSED: &str = "paused";

pub const LIGHT_STATE: &str = "state";
pub const LIGHT_BRIGHTNESS: &str = "brightness";
pub const LIGHT_EFFECT: &str = "effect";
pub const LIGHT_EFFECT_CONFIG: &str = "effect_config";
pub const LIGHT_CONFIG: &str = "config";
pub const LIGHT_COLOR: &str = "color";

/// Placeholder effect when no effect list is known yet.
pub const NO_EFFECT: &str = "-";

pub fn device_key(code: &str, field: &str) -> String {
    format!("{}_{}", code, field)
}

/// Python-style truthiness of a JSON value: null, false, zero and empty
/// strings or containers are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FlatData(IndexMap<String, Value>);

impl FlatData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &IndexMap<String, Value> {
        &self.0
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key).map(is_truthy).unwrap_or(false)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    pub fn get_object(&self, key: &str) -> Option<&Map<String, Value>> {
        self.get(key).and_then(Value::as_object)
    }

    /// Global reachability flag of the last cycle.
    pub fn available(&self) -> bool {
        self.get_bool(STATE)
    }

    pub fn effects(&self) -> Vec<String> {
        self.get(EFFECTS)
            .and_then(Value::as_array)
            .map(|effects| effects.iter().filter_map(|e| e.as_str().map(str::to_string)).collect())
            .unwrap_or_default()
    }

    pub fn presets(&self, key: &str) -> PresetTable {
        self.get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
            .unwrap_or_default()
    }

    pub fn first_effect(&self) -> String {
        self.effects()
            .into_iter()
            .next()
            .unwrap_or_else(|| NO_EFFECT.to_string())
    }

    /// `id -> name` options of the audio input select.
    pub fn audio_options(&self) -> IndexMap<String, String> {
        self.get_object(AUDIO_INPUT_OPTIONS)
            .map(|options| {
                options
                    .iter()
                    .filter_map(|(id, name)| name.as_str().map(|name| (id.clone(), name.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn device_bool(&self, code: &str, field: &str) -> bool {
        self.get_bool(&device_key(code, field))
    }

    pub fn device_str(&self, code: &str, field: &str) -> Option<&str> {
        self.get_str(&device_key(code, field))
    }

    pub fn device_object(&self, code: &str, field: &str) -> Map<String, Value> {
        self.get_object(&device_key(code, field)).cloned().unwrap_or_default()
    }

    pub fn device_brightness(&self, code: &str) -> u8 {
        self.get_f64(&device_key(code, LIGHT_BRIGHTNESS))
            .map(|b| b.clamp(0.0, 255.0) as u8)
            .unwrap_or(0)
    }

    /// Writes the off-state quartet for a device.
    pub fn set_device_off(&mut self, code: &str) {
        let effect = self.first_effect();
        self.insert(device_key(code, LIGHT_STATE), false);
        self.insert(device_key(code, LIGHT_BRIGHTNESS), 0);
        self.insert(device_key(code, LIGHT_EFFECT), effect);
        self.insert(device_key(code, LIGHT_EFFECT_CONFIG), Map::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!({})));
        assert!(!is_truthy(&json!([])));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(is_truthy(&json!({"type": "bar"})));
        assert!(is_truthy(&json!(0.1)));
        assert!(is_truthy(&json!(true)));
    }

    #[test]
    fn test_device_key() {
        assert_eq!(device_key("wled", LIGHT_EFFECT_CONFIG), "wled_effect_config");
    }

    #[test]
    fn test_set_device_off_uses_first_effect() {
        let mut data = FlatData::new();
        data.insert(EFFECTS, json!(["bar", "wavelength"]));
        data.insert("wled_effect_config", json!({"blur": 1.0}));

        data.set_device_off("wled");

        assert!(!data.device_bool("wled", LIGHT_STATE));
        assert_eq!(data.device_brightness("wled"), 0);
        assert_eq!(data.device_str("wled", LIGHT_EFFECT), Some("bar"));
        assert!(data.device_object("wled", LIGHT_EFFECT_CONFIG).is_empty());
    }

    #[test]
    fn test_set_device_off_without_effects() {
        let mut data = FlatData::new();
        data.set_device_off("strip");

        assert_eq!(data.device_str("strip", LIGHT_EFFECT), Some(NO_EFFECT));
    }

    #[test]
    fn test_presets_and_options() {
        let mut data = FlatData::new();
        data.insert(DEFAULT_PRESETS, json!({"bar": ["p1", "p2"]}));
        data.insert(AUDIO_INPUT_OPTIONS, json!({"0": "Default", "1": "Line In"}));

        assert_eq!(data.presets(DEFAULT_PRESETS)["bar"], vec!["p1", "p2"]);
        assert!(data.presets(CUSTOM_PRESETS).is_empty());
        assert_eq!(data.audio_options()["1"], "Line In");
    }

    #[test]
    fn test_insertion_order_kept() {
        let mut data = FlatData::new();
        data.insert("b", 1);
        data.insert("a", 2);
        data.insert("b", 3);

        assert_eq!(data.keys().cloned().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(data.get("b"), Some(&json!(3)));
        assert!(!data.available());
    }
}
