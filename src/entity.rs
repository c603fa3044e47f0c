//! What entities read from the live state.
//!
//! [`view`] renders an entity whether or not it is available; [`check`]
//! gates actions and reports why an entity is unavailable.

use crate::data::{
    device_key, is_truthy, AUDIO_INPUT, CUSTOM_PRESETS, DEFAULT_PRESETS, LIGHT_BRIGHTNESS, LIGHT_COLOR, LIGHT_CONFIG,
    LIGHT_EFFECT, LIGHT_EFFECT_CONFIG, LIGHT_STATE, PAUSED,
};
use crate::effects::build_effects;
use crate::registry::{Binding, EntityDescriptor, EntityKind};
use crate::schema::LiveState;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Unavailable {
    /// The last poll cycle failed.
    Unreachable,
    /// The device is missing from the latest device list.
    DeviceMissing,
    DeviceOff,
    /// The running effect has no such property.
    EffectNotApplicable,
    NoOptions,
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Unavailable::Unreachable => "server unreachable",
            Unavailable::DeviceMissing => "device not reported by the server",
            Unavailable::DeviceOff => "device is off",
            Unavailable::EffectNotApplicable => "not a property of the running effect",
            Unavailable::NoOptions => "no options known",
        };
        f.write_str(reason)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    Playing,
    Paused,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LightView {
    pub is_on: bool,
    pub brightness: u8,
    pub effect: Option<String>,
    pub effect_list: Vec<String>,
    /// V2 background colour.
    pub color: Option<String>,
    /// Effect config without brightness, then the device config.
    pub attributes: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum EntityValue {
    Light(LightView),
    Number(Option<f64>),
    Switch(bool),
    Select {
        current: Option<String>,
        options: Vec<String>,
    },
    Sensor(Value),
    Button,
    MediaPlayer(PlayerState),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EntityView {
    pub key: String,
    pub kind: EntityKind,
    pub name: String,
    pub available: bool,
    pub value: EntityValue,
}

fn device_code(descriptor: &EntityDescriptor) -> &str {
    descriptor.device_code.as_deref().unwrap_or(descriptor.key.as_str())
}

/// Current option names of the audio input select.
pub fn audio_options(state: &LiveState) -> Vec<String> {
    state.data.audio_options().into_values().collect()
}

fn options(state: &LiveState, descriptor: &EntityDescriptor) -> Vec<String> {
    match descriptor.binding {
        Binding::AudioInput => audio_options(state),
        _ => descriptor.computed.options.clone(),
    }
}

/// Gating accessor: `Ok` when the entity can take an action right now.
pub fn check(state: &LiveState, descriptor: &EntityDescriptor) -> Result<(), Unavailable> {
    if !state.data.available() {
        return Err(Unavailable::Unreachable);
    }

    match descriptor.binding {
        Binding::Light => {
            if !state.is_device_present(device_code(descriptor)) {
                return Err(Unavailable::DeviceMissing);
            }
        }
        Binding::EffectProperty => {
            let code = device_code(descriptor);
            if !state.is_device_present(code) {
                return Err(Unavailable::DeviceMissing);
            }
            if !state.data.device_bool(code, LIGHT_STATE) {
                return Err(Unavailable::DeviceOff);
            }
            let applicable = state
                .data
                .device_str(code, LIGHT_EFFECT)
                .is_some_and(|effect| descriptor.computed.applicable_effects.contains(effect));
            if !applicable {
                return Err(Unavailable::EffectNotApplicable);
            }
            if descriptor.kind == EntityKind::Select && descriptor.computed.options.is_empty() {
                return Err(Unavailable::NoOptions);
            }
        }
        Binding::AudioInput => {
            if state.data.audio_options().is_empty() {
                return Err(Unavailable::NoOptions);
            }
        }
        Binding::Service | Binding::Scene | Binding::MediaPlayer => {}
    }

    Ok(())
}

pub fn is_available(state: &LiveState, descriptor: &EntityDescriptor) -> bool {
    check(state, descriptor).is_ok()
}

fn light_view(state: &LiveState, code: &str) -> LightView {
    let data = &state.data;

    let mut attributes = data.device_object(code, LIGHT_EFFECT_CONFIG);
    attributes.remove(LIGHT_BRIGHTNESS);
    attributes.extend(data.device_object(code, LIGHT_CONFIG));

    LightView {
        is_on: data.device_bool(code, LIGHT_STATE),
        brightness: data.device_brightness(code),
        effect: data.device_str(code, LIGHT_EFFECT).map(str::to_string),
        effect_list: build_effects(&data.effects(), &data.presets(DEFAULT_PRESETS), &data.presets(CUSTOM_PRESETS)),
        color: data.device_str(code, LIGHT_COLOR).map(str::to_string),
        attributes,
    }
}

fn property_value(state: &LiveState, descriptor: &EntityDescriptor) -> Option<Value> {
    state
        .data
        .device_object(device_code(descriptor), LIGHT_EFFECT_CONFIG)
        .get(&descriptor.field)
        .cloned()
}

/// Display accessor: the entity's state as last polled, never failing.
pub fn view(state: &LiveState, descriptor: &EntityDescriptor) -> EntityView {
    let value = match (descriptor.kind, descriptor.binding) {
        (EntityKind::Light, _) => EntityValue::Light(light_view(state, device_code(descriptor))),
        (EntityKind::Number, _) => EntityValue::Number(property_value(state, descriptor).and_then(|v| v.as_f64())),
        (EntityKind::Switch, _) => {
            EntityValue::Switch(property_value(state, descriptor).map(|v| is_truthy(&v)).unwrap_or(false))
        }
        (EntityKind::Select, Binding::AudioInput) => EntityValue::Select {
            current: state.data.get_str(AUDIO_INPUT).map(str::to_string),
            options: options(state, descriptor),
        },
        (EntityKind::Select, _) => EntityValue::Select {
            current: property_value(state, descriptor).and_then(|v| v.as_str().map(str::to_string)),
            options: options(state, descriptor),
        },
        (EntityKind::Sensor, _) => EntityValue::Sensor(state.data.get(&descriptor.key).cloned().unwrap_or(Value::Null)),
        (EntityKind::Button, _) => EntityValue::Button,
        (EntityKind::MediaPlayer, _) => EntityValue::MediaPlayer(match state.data.get_bool(PAUSED) {
            true => PlayerState::Paused,
            false => PlayerState::Playing,
        }),
    };

    EntityView {
        key: descriptor.key.clone(),
        kind: descriptor.kind,
        name: descriptor.metadata.name.clone(),
        available: is_available(state, descriptor),
        value,
    }
}

/// Views of every registered entity, grouped by kind.
pub fn snapshot(state: &LiveState) -> Vec<EntityView> {
    EntityKind::ALL
        .iter()
        .flat_map(|kind| state.registry.descriptors(*kind))
        .map(|descriptor| view(state, &descriptor))
        .collect()
}

/// Raw flat-map key an entity reads, for diagnostics.
pub fn source_key(descriptor: &EntityDescriptor) -> String {
    match (descriptor.binding, descriptor.device_code.as_deref()) {
        (Binding::EffectProperty, Some(code)) => device_key(code, LIGHT_EFFECT_CONFIG),
        (Binding::Light, Some(code)) => device_key(code, LIGHT_STATE),
        _ => descriptor.key.clone(),
    }
}
