use super::common;
use super::{LiveState, Normalizer, Version};
use crate::client::Endpoint;
use crate::data::{CUSTOM_PRESETS, DEFAULT_PRESETS, SW_VERSION};
use serde_json::Value;

const SEQUENCE: &[Endpoint] = &[
    Endpoint::Info,
    Endpoint::Schema,
    Endpoint::Devices,
    Endpoint::AudioDevices,
    Endpoint::Scenes,
];

/// Devices addressed directly, config nested under `config`, audio input
/// chosen by index.
#[derive(Debug, Default, Clone, Copy)]
pub struct V1Normalizer;

impl V1Normalizer {
    fn apply_config(&self, response: &Value, state: &mut LiveState) {
        let Some(config) = response.get("config") else {
            return;
        };

        if let Some(audio) = config.get("audio").and_then(Value::as_object) {
            common::apply_audio(state, audio, "device_name", Value::clone);
        }

        common::apply_presets(state, config.get("default_presets"), DEFAULT_PRESETS);
        common::apply_presets(state, config.get("custom_presets"), CUSTOM_PRESETS);
    }
}

impl Normalizer for V1Normalizer {
    fn version(&self) -> Version {
        Version::V1
    }

    fn sequence(&self) -> &'static [Endpoint] {
        SEQUENCE
    }

    fn is_virtual(&self) -> bool {
        false
    }

    fn apply(&self, endpoint: Endpoint, response: &Value, state: &mut LiveState) {
        match endpoint {
            Endpoint::Config => self.apply_config(response, state),
            Endpoint::Info => {
                if let Some(version) = response.get("version") {
                    state.data.insert(SW_VERSION, version.clone());
                }
            }
            Endpoint::Schema => common::apply_schema(state, response, &[]),
            Endpoint::Devices => {
                if let Some(devices) = response.get("devices").and_then(Value::as_object) {
                    common::apply_devices(state, devices, Version::V1);
                }
            }
            Endpoint::AudioDevices => {
                if let Some(devices) = response.get("devices").and_then(Value::as_object) {
                    state
                        .data
                        .insert(crate::data::AUDIO_INPUT_OPTIONS, Value::Object(devices.clone()));
                }
            }
            Endpoint::Scenes => common::apply_scenes(state, response),
            Endpoint::Colors | Endpoint::Virtuals => {
                tracing::trace!("{} is not polled for v1 servers", endpoint.path());
            }
        }
    }
}
