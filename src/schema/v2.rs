use super::common;
use super::{LiveState, Normalizer, Version};
use crate::client::Endpoint;
use crate::data::{is_truthy, CUSTOM_PRESETS, DEFAULT_PRESETS, PAUSED, SW_VERSION};
use crate::effects::Palette;
use serde_json::{Map, Value};
use std::sync::{Mutex, PoisonError};

const SEQUENCE: &[Endpoint] = &[
    Endpoint::Colors,
    Endpoint::Schema,
    Endpoint::Devices,
    Endpoint::Virtuals,
    Endpoint::Scenes,
];

const SKIPPED_PROPERTIES: &[&str] = &["background_color"];

fn audio_index(value: &Value) -> Value {
    match value {
        Value::String(s) => s.parse::<i64>().map(Value::from).unwrap_or_else(|_| value.clone()),
        Value::Number(n) => n.as_f64().map(|f| Value::from(f as i64)).unwrap_or_else(|| value.clone()),
        _ => value.clone(),
    }
}

/// Lights are virtuals backed by physical devices; colours are named.
#[derive(Debug, Default)]
pub struct V2Normalizer {
    /// Physical devices from the last `devices` response, merged into the
    /// virtuals that follow it.
    physical: Mutex<Map<String, Value>>,
}

impl V2Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn apply_config(&self, response: &Value, state: &mut LiveState) {
        if let Some(version) = response.get("configuration_version") {
            state.data.insert(SW_VERSION, version.clone());
        }

        if let Some(audio) = response.get("audio").and_then(Value::as_object) {
            common::apply_audio(state, audio, "audio_device", audio_index);
        }

        common::apply_presets(state, response.get("ledfx_presets"), DEFAULT_PRESETS);
        common::apply_presets(state, response.get("user_presets"), CUSTOM_PRESETS);
    }

    /// Virtuals with the backing device's address and type folded in.
    fn merge_virtuals(&self, virtuals: &Map<String, Value>) -> Map<String, Value> {
        let physical = self.physical.lock().unwrap_or_else(PoisonError::into_inner);

        virtuals
            .iter()
            .map(|(code, virtual_device)| {
                let mut merged = virtual_device.clone();
                let backing = virtual_device
                    .get("is_device")
                    .and_then(Value::as_str)
                    .and_then(|id| physical.get(id));

                if let (Some(backing), Some(object)) = (backing, merged.as_object_mut()) {
                    if let Some(ip) = backing.pointer("/config/ip_address") {
                        let config = object
                            .entry("config")
                            .or_insert_with(|| Value::Object(Map::new()));
                        if let Some(config) = config.as_object_mut() {
                            config.insert("ip_address".to_string(), ip.clone());
                        }
                    }
                    if let Some(kind) = backing.get("type") {
                        object.insert("type".to_string(), kind.clone());
                    }
                }

                (code.clone(), merged)
            })
            .collect()
    }
}

impl Normalizer for V2Normalizer {
    fn version(&self) -> Version {
        Version::V2
    }

    fn sequence(&self) -> &'static [Endpoint] {
        SEQUENCE
    }

    fn is_virtual(&self) -> bool {
        true
    }

    fn apply(&self, endpoint: Endpoint, response: &Value, state: &mut LiveState) {
        match endpoint {
            Endpoint::Config => self.apply_config(response, state),
            Endpoint::Colors => state.palette = Palette::from_response(response),
            Endpoint::Schema => common::apply_schema(state, response, SKIPPED_PROPERTIES),
            Endpoint::Devices => {
                let devices = response
                    .get("devices")
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default();
                *self.physical.lock().unwrap_or_else(PoisonError::into_inner) = devices;
            }
            Endpoint::Virtuals => {
                if let Some(paused) = response.get(PAUSED) {
                    state.data.insert(PAUSED, is_truthy(paused));
                }

                if let Some(virtuals) = response.get("virtuals").and_then(Value::as_object) {
                    if virtuals.is_empty() {
                        state.present_devices.clear();
                    } else {
                        let merged = self.merge_virtuals(virtuals);
                        common::apply_devices(state, &merged, Version::V2);
                    }
                }
            }
            Endpoint::Scenes => common::apply_scenes(state, response),
            Endpoint::Info | Endpoint::AudioDevices => {
                tracing::trace!("{} is not polled for v2 servers", endpoint.path());
            }
        }
    }
}
