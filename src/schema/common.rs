//! Parsing steps shared by both schema versions.

use super::types::{title_case, Observation};
use super::{LiveState, Version};
use crate::data::{
    device_key, is_truthy, AUDIO_INPUT, AUDIO_INPUT_OPTIONS, EFFECTS, LIGHT_BRIGHTNESS, LIGHT_COLOR, LIGHT_CONFIG,
    LIGHT_EFFECT, LIGHT_EFFECT_CONFIG, LIGHT_STATE,
};
use crate::effects::brightness;
use crate::registry::{
    icons, Binding, ComputedFields, DeviceInfo, EntityCategory, EntityDescriptor, EntityKind, StaticMetadata,
};
use serde_json::{Map, Value};

const BRIGHTNESS: &str = "brightness";
const BACKGROUND_COLOR: &str = "background_color";
const DEVICE_INDEX: &str = "device_index";

/// Brightness assumed for an active effect that does not report one.
pub const DEFAULT_EFFECT_BRIGHTNESS: f64 = 1.0;

fn object(value: Option<&Value>) -> Option<&Map<String, Value>> {
    value.and_then(Value::as_object)
}

/// Copies the audio section into the flat map, one diagnostic sensor per
/// field. `selected` is the field naming the active input.
pub fn apply_audio(state: &mut LiveState, audio: &Map<String, Value>, selected: &str, convert: fn(&Value) -> Value) {
    for (code, value) in audio {
        if code == selected {
            state.data.insert(AUDIO_INPUT, convert(value));
            continue;
        }
        if code == DEVICE_INDEX {
            continue;
        }

        state.data.insert(code.as_str(), value.clone());

        let metadata = StaticMetadata::new(title_case(&code.replace('_', " ")))
            .maybe_icon(icons::lookup(EntityKind::Sensor, code))
            .category(EntityCategory::Diagnostic)
            .disabled_by_default();
        let info = state.service_info();
        state.discover(EntityDescriptor::global(
            EntityKind::Sensor,
            Binding::Service,
            code,
            metadata,
            info,
        ));
    }
}

/// `{effect: [preset ids, sorted]}` under `key`, skipped when empty.
pub fn apply_presets(state: &mut LiveState, presets: Option<&Value>, key: &str) {
    let Some(presets) = object(presets).filter(|p| !p.is_empty()) else {
        return;
    };

    let table: Map<String, Value> = presets
        .iter()
        .map(|(effect, entries)| {
            let mut ids: Vec<String> = entries
                .as_object()
                .map(|entries| entries.keys().cloned().collect())
                .unwrap_or_default();
            ids.sort();
            (effect.clone(), Value::from(ids))
        })
        .collect();

    state.data.insert(key, Value::Object(table));
}

/// Effect list, effect property table and audio input options.
/// `brightness` and the keys in `skipped` never become properties.
pub fn apply_schema(state: &mut LiveState, response: &Value, skipped: &[&str]) {
    if let Some(effects) = object(response.get("effects")).filter(|e| !e.is_empty()) {
        let mut names: Vec<String> = effects.keys().cloned().collect();
        names.sort();
        state.data.insert(EFFECTS, names);

        for (effect, fields) in effects {
            let Some(properties) = object(fields.pointer("/schema/properties")) else {
                continue;
            };

            for (key, schema) in properties {
                if key == BRIGHTNESS || skipped.contains(&key.as_str()) {
                    continue;
                }

                match state.properties.observe(effect, key, schema, &state.palette) {
                    Observation::New => tracing::debug!("New effect property '{}' ({})", key, effect),
                    Observation::Unsupported => tracing::trace!("Skipping property '{}' of {}", key, effect),
                    Observation::Extended | Observation::Unchanged => {}
                }
            }
        }
    }

    if let Some(options) = object(response.pointer("/audio/schema/properties/audio_device/enum")) {
        state.data.insert(AUDIO_INPUT_OPTIONS, Value::Object(options.clone()));
        resolve_audio_input(state);
    }
}

/// Replaces a numeric audio input with its option name.
pub fn resolve_audio_input(state: &mut LiveState) {
    let Some(index) = state.data.get(AUDIO_INPUT).and_then(Value::as_i64) else {
        return;
    };

    if let Some(name) = state.data.audio_options().get(&index.to_string()) {
        state.data.insert(AUDIO_INPUT, name.clone());
    }
}

/// Colour and gradient definitions replaced by their names.
pub fn convert_effect_config(state: &LiveState, mut config: Map<String, Value>) -> Map<String, Value> {
    for (key, value) in config.iter_mut() {
        if !state.properties.is_color(key) {
            continue;
        }
        if let Some(name) = value.as_str().and_then(|v| state.palette.name_for_value(v)) {
            *value = Value::String(name.to_string());
        }
    }
    config
}

fn light_device_info(address: &str, code: &str, config: &Map<String, Value>, device: &Value) -> DeviceInfo {
    let text = |field: &str| config.get(field).and_then(Value::as_str).map(str::to_string);

    DeviceInfo {
        identifier: text("ip_address").unwrap_or_else(|| format!("{}-{}", address, code)),
        name: text("name").unwrap_or_else(|| code.to_string()),
        manufacturer: None,
        model: text("type").or_else(|| device.get("type").and_then(Value::as_str).map(str::to_string)),
        sw_version: None,
        configuration_url: format!("http://{}/devices/{}", address, code),
    }
}

/// Per-device entities for every known effect property.
fn apply_device_fields(state: &mut LiveState, code: &str, info: &DeviceInfo) {
    let properties: Vec<_> = state.properties.iter().cloned().collect();

    for property in properties {
        let kind = property.kind.entity_kind();
        let mut metadata = StaticMetadata::new(property.name.as_str())
            .maybe_icon(icons::lookup(kind, &property.key))
            .category(EntityCategory::Config)
            .disabled_by_default();
        if let super::PropertyKind::Number(bounds) = property.kind {
            metadata = metadata.bounds(bounds);
        }

        let descriptor = EntityDescriptor::for_device(
            kind,
            Binding::EffectProperty,
            code,
            &property.key,
            metadata,
            info.clone(),
        )
        .with_computed(ComputedFields {
            applicable_effects: property.applicable_effects.clone(),
            options: property.enum_values.clone(),
        });

        state.discover(descriptor);
    }
}

/// Writes the light keys of every device and discovers its entities.
pub fn apply_devices(state: &mut LiveState, devices: &Map<String, Value>, version: Version) {
    state.present_devices = devices.keys().cloned().collect();

    for (code, device) in devices {
        let effect = device.get("effect");
        let is_on = effect.map(is_truthy).unwrap_or(false);
        let effect_config = object(effect.and_then(|e| e.get("config"))).cloned().unwrap_or_default();

        if is_on {
            let level = effect_config
                .get(BRIGHTNESS)
                .and_then(Value::as_f64)
                .unwrap_or(DEFAULT_EFFECT_BRIGHTNESS);
            let effect_type = effect.and_then(|e| e.get("type")).cloned().unwrap_or(Value::Null);

            state.data.insert(device_key(code, LIGHT_STATE), true);
            state.data.insert(device_key(code, LIGHT_BRIGHTNESS), brightness::to_display(level));
            state.data.insert(device_key(code, LIGHT_EFFECT), effect_type);
            let converted = convert_effect_config(state, effect_config.clone());
            state.data.insert(device_key(code, LIGHT_EFFECT_CONFIG), Value::Object(converted));
        } else {
            state.data.set_device_off(code);
        }

        if version == Version::V2 {
            let color = match is_on {
                true => effect_config.get(BACKGROUND_COLOR).cloned().unwrap_or(Value::Null),
                false => Value::Null,
            };
            state.data.insert(device_key(code, LIGHT_COLOR), color);
        }

        let device_config = object(device.get("config")).cloned().unwrap_or_default();
        let shown: Map<String, Value> = device_config
            .iter()
            .filter(|(key, _)| !matches!(key.as_str(), "name" | "icon_name"))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        state.data.insert(device_key(code, LIGHT_CONFIG), Value::Object(shown));

        let info = light_device_info(state.address(), code, &device_config, device);
        apply_device_fields(state, code, &info);

        let icon = icons::light(device_config.get("icon_name").and_then(Value::as_str));
        let metadata = StaticMetadata::new(info.name.as_str()).icon(icon);
        let mut light = EntityDescriptor::global(EntityKind::Light, Binding::Light, code, metadata, info);
        light.device_code = Some(code.clone());
        state.discover(light);
    }
}

/// One button per scene.
pub fn apply_scenes(state: &mut LiveState, response: &Value) {
    let Some(scenes) = object(response.get("scenes")) else {
        return;
    };

    for (code, scene) in scenes {
        let name = scene
            .get("name")
            .and_then(Value::as_str)
            .map(title_case)
            .unwrap_or_else(|| code.clone());
        let metadata = StaticMetadata::new(name).icon(icons::SCENE);
        let info = state.service_info();

        state.discover(EntityDescriptor::global(EntityKind::Button, Binding::Scene, code, metadata, info));
    }
}
