//! User actions. Each one is routed through the [`routes`] table, gated on
//! entity availability, sent upstream, and only then written to the flat
//! map.

pub mod error;
pub mod routes;

pub use error::{ActionError, ActionResult};
pub use routes::{ActionKind, Route};

use crate::data::{
    device_key, AUDIO_INPUT, CUSTOM_PRESETS, DEFAULT_PRESETS, LIGHT_BRIGHTNESS, LIGHT_COLOR, LIGHT_EFFECT,
    LIGHT_EFFECT_CONFIG, LIGHT_STATE, NO_EFFECT, PAUSED,
};
use crate::effects::{brightness, find_effect, rgbw_to_hex, EffectCategory};
use crate::entity;
use crate::registry::{EntityDescriptor, EntityKind};
use crate::schema::{common, LiveState, Version};
use crate::updater::Updater;
use serde_json::{Map, Value};
use std::sync::Arc;

const BRIGHTNESS: &str = "brightness";
const ACTIVE: &str = "active";
const BACKGROUND_COLOR: &str = "background_color";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TurnOn {
    /// Effect label as listed by the light, `*`/`**` preset labels included.
    pub effect: Option<String>,
    /// Display brightness.
    pub brightness: Option<u8>,
    pub rgbw: Option<[u8; 4]>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    TurnOn(TurnOn),
    TurnOff,
    SetValue(Value),
    SelectOption(String),
    Press,
    Play,
    Pause,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::TurnOn(_) => ActionKind::TurnOn,
            Action::TurnOff => ActionKind::TurnOff,
            Action::SetValue(_) => ActionKind::SetValue,
            Action::SelectOption(_) => ActionKind::SelectOption,
            Action::Press => ActionKind::Press,
            Action::Play => ActionKind::Play,
            Action::Pause => ActionKind::Pause,
        }
    }
}

/// Known effect config, then brightness, then the changed field; `active`
/// is always forced on.
fn merged_config(base: &Map<String, Value>, level: f64, change: Option<(&str, Value)>) -> Map<String, Value> {
    let mut config = base.clone();
    config.insert(BRIGHTNESS.to_string(), Value::from(level));
    if let Some((key, value)) = change {
        config.insert(key.to_string(), value);
    }
    config.insert(ACTIVE.to_string(), Value::Bool(true));
    config
}

/// Colour and gradient names replaced by their definitions.
fn to_upstream(state: &LiveState, config: &Map<String, Value>) -> Map<String, Value> {
    config
        .iter()
        .map(|(key, value)| {
            let definition = match state.properties.is_color(key) {
                true => value.as_str().and_then(|name| state.palette.value_for_name(name)),
                false => None,
            };
            let value = definition
                .map(|definition| Value::String(definition.to_string()))
                .unwrap_or_else(|| value.clone());
            (key.clone(), value)
        })
        .collect()
}

fn without_brightness(mut config: Map<String, Value>) -> Map<String, Value> {
    config.remove(BRIGHTNESS);
    config
}

/// Scalar entries of the effect config echoed by the server.
fn scalar_config(response: &Value) -> Map<String, Value> {
    response
        .pointer("/effect/config")
        .and_then(Value::as_object)
        .map(|config| {
            config
                .iter()
                .filter(|(key, value)| key.as_str() != BRIGHTNESS && !value.is_object() && !value.is_array())
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect()
        })
        .unwrap_or_default()
}

/// Display brightness of the effect a device-on or preset call started.
fn reported_brightness(response: &Value) -> u8 {
    let level = response
        .pointer("/effect/config/brightness")
        .and_then(Value::as_f64)
        .unwrap_or(common::DEFAULT_EFFECT_BRIGHTNESS);
    brightness::to_display(level)
}

fn device_code(descriptor: &EntityDescriptor) -> &str {
    descriptor.device_code.as_deref().unwrap_or(descriptor.key.as_str())
}

#[derive(Debug)]
struct DeviceSnapshot {
    is_on: bool,
    brightness: u8,
    effect: Option<String>,
    effect_config: Map<String, Value>,
}

impl DeviceSnapshot {
    fn read(state: &LiveState, code: &str) -> Self {
        Self {
            is_on: state.data.device_bool(code, LIGHT_STATE),
            brightness: state.data.device_brightness(code),
            effect: state
                .data
                .device_str(code, LIGHT_EFFECT)
                .filter(|effect| *effect != NO_EFFECT)
                .map(str::to_string),
            effect_config: state.data.device_object(code, LIGHT_EFFECT_CONFIG),
        }
    }
}

/// Performs actions on the entities of one updater.
#[derive(Debug, Clone)]
pub struct Controller {
    updater: Arc<Updater>,
}

impl Controller {
    pub fn new(updater: Arc<Updater>) -> Self {
        Self { updater }
    }

    pub fn updater(&self) -> &Arc<Updater> {
        &self.updater
    }

    pub async fn perform(&self, kind: EntityKind, key: &str, action: Action) -> ActionResult<()> {
        let descriptor = self
            .updater
            .read(|state| state.registry.get(kind, key).cloned())
            .ok_or_else(|| ActionError::NotFound {
                kind,
                key: key.to_string(),
            })?;

        let action_kind = action.kind();
        let unmapped = ActionError::Unmapped {
            kind: descriptor.kind,
            binding: descriptor.binding,
            action: action_kind,
        };
        let route = routes::resolve(descriptor.kind, descriptor.binding, action_kind).ok_or_else(|| unmapped.clone())?;

        self.updater
            .read(|state| entity::check(state, &descriptor))
            .map_err(|reason| ActionError::Unavailable {
                key: descriptor.key.clone(),
                reason,
            })?;

        tracing::debug!("{} {} '{}'", action_kind, descriptor.kind, descriptor.key);

        let result = match (route, action) {
            (Route::LightOn, Action::TurnOn(request)) => self.light_on(&descriptor, request).await,
            (Route::LightOff, _) => self.light_off(&descriptor).await,
            (Route::SetProperty, Action::SetValue(value)) => self.set_property(&descriptor, value).await,
            (Route::SetProperty, Action::TurnOn(_)) => self.set_property(&descriptor, Value::Bool(true)).await,
            (Route::SetProperty, Action::TurnOff) => self.set_property(&descriptor, Value::Bool(false)).await,
            (Route::SelectProperty, Action::SelectOption(option)) => self.select_property(&descriptor, option).await,
            (Route::SelectAudioInput, Action::SelectOption(option)) => {
                self.select_audio_input(&descriptor, option).await
            }
            (Route::RunScene, _) => self.run_scene(&descriptor).await,
            (Route::TogglePlayback, action) => self.toggle_playback(action == Action::Pause).await,
            _ => Err(unmapped),
        };

        match &result {
            Ok(()) => self.updater.notify_listeners(),
            Err(err) => tracing::error!("{} on {} '{}' failed: {}", action_kind, descriptor.kind, descriptor.key, err),
        }
        result
    }

    fn is_v2(&self) -> bool {
        self.updater.version() == Some(Version::V2)
    }

    async fn light_on(&self, descriptor: &EntityDescriptor, request: TurnOn) -> ActionResult<()> {
        let code = device_code(descriptor);
        let client = self.updater.client();
        let is_virtual = self.updater.is_virtual();
        let is_v2 = self.is_v2();

        let (device, resolved) = self.updater.read(|state| {
            let resolved = request.effect.as_deref().map(|label| {
                find_effect(
                    label,
                    &state.data.presets(DEFAULT_PRESETS),
                    &state.data.presets(CUSTOM_PRESETS),
                )
            });
            (DeviceSnapshot::read(state, code), resolved)
        });

        let effect = resolved
            .as_ref()
            .map(|resolved| resolved.effect.clone())
            .or_else(|| device.effect.clone())
            .ok_or_else(|| ActionError::MissingDeviceState(code.to_string()))?;
        let preset = resolved.as_ref().and_then(|resolved| resolved.preset.clone());
        let category = resolved
            .as_ref()
            .map(|resolved| resolved.category)
            .unwrap_or(EffectCategory::None);

        let mut effect_config = device.effect_config;
        let mut level = device.brightness;
        let mut new_effect = None;

        if Some(&effect) != device.effect.as_ref() || !device.is_on || preset.is_some() {
            let response = match preset.as_deref() {
                Some(preset) if category != EffectCategory::None => {
                    client.preset(code, category.as_str(), &effect, preset, is_virtual).await?
                }
                _ => client.device_on(code, &effect, is_virtual).await?,
            };

            effect_config = self
                .updater
                .read(|state| common::convert_effect_config(state, scalar_config(&response)));
            level = reported_brightness(&response);
            new_effect = Some(effect.clone());
        }

        if request.rgbw.is_some() && !is_v2 {
            tracing::debug!("Ignoring colour for '{}', the server has no background colour", code);
        }
        let color = request.rgbw.filter(|_| is_v2).map(rgbw_to_hex);

        if request.brightness.is_some() || color.is_some() {
            level = request.brightness.unwrap_or(level);
            let merged = merged_config(
                &effect_config,
                brightness::to_api(level as f64),
                color.clone().map(|hex| (BACKGROUND_COLOR, Value::String(hex))),
            );
            let upstream = self.updater.read(|state| to_upstream(state, &merged));

            client.effect(code, &effect, &upstream, is_virtual).await?;
            effect_config = without_brightness(merged);
        }

        self.updater.write(|state| {
            let data = &mut state.data;
            data.insert(device_key(code, LIGHT_STATE), true);
            data.insert(device_key(code, LIGHT_BRIGHTNESS), request.brightness.unwrap_or(level));
            if let Some(effect) = new_effect {
                data.insert(device_key(code, LIGHT_EFFECT), effect);
            }
            data.insert(device_key(code, LIGHT_EFFECT_CONFIG), effect_config);
            if let Some(color) = color {
                data.insert(device_key(code, LIGHT_COLOR), color);
            }
        });

        Ok(())
    }

    async fn light_off(&self, descriptor: &EntityDescriptor) -> ActionResult<()> {
        let code = device_code(descriptor);
        self.updater.client().device_off(code, self.updater.is_virtual()).await?;

        self.updater.write(|state| {
            state.data.insert(device_key(code, LIGHT_STATE), false);
            state.data.insert(device_key(code, LIGHT_BRIGHTNESS), 0);
            state.data.insert(device_key(code, LIGHT_EFFECT_CONFIG), Map::new());
        });

        Ok(())
    }

    async fn set_property(&self, descriptor: &EntityDescriptor, value: Value) -> ActionResult<()> {
        if descriptor.kind == EntityKind::Number {
            let valid = match (value.as_f64(), descriptor.metadata.bounds) {
                (Some(number), Some(bounds)) => number >= bounds.min && number <= bounds.max,
                (Some(_), None) => true,
                (None, _) => false,
            };
            if !valid {
                return Err(ActionError::InvalidValue {
                    key: descriptor.key.clone(),
                    value,
                });
            }
        }

        self.update_effect(device_code(descriptor), &descriptor.field, value).await
    }

    async fn select_property(&self, descriptor: &EntityDescriptor, option: String) -> ActionResult<()> {
        if !descriptor.computed.options.contains(&option) {
            return Err(ActionError::UnknownOption {
                key: descriptor.key.clone(),
                option,
            });
        }

        self.update_effect(device_code(descriptor), &descriptor.field, Value::String(option))
            .await
    }

    /// Sends the running effect's config with one field changed.
    async fn update_effect(&self, code: &str, field: &str, value: Value) -> ActionResult<()> {
        let device = self.updater.read(|state| DeviceSnapshot::read(state, code));
        let effect = device
            .effect
            .ok_or_else(|| ActionError::MissingDeviceState(code.to_string()))?;

        let merged = merged_config(
            &device.effect_config,
            brightness::to_api(device.brightness as f64),
            Some((field, value)),
        );
        let upstream = self.updater.read(|state| to_upstream(state, &merged));

        self.updater
            .client()
            .effect(code, &effect, &upstream, self.updater.is_virtual())
            .await?;

        self.updater.write(|state| {
            state
                .data
                .insert(device_key(code, LIGHT_EFFECT_CONFIG), without_brightness(merged))
        });

        Ok(())
    }

    async fn select_audio_input(&self, descriptor: &EntityDescriptor, option: String) -> ActionResult<()> {
        let options = self.updater.read(|state| state.data.audio_options());
        let Some(id) = options
            .iter()
            .find(|(_, name)| **name == option)
            .map(|(id, _)| id.clone())
        else {
            return Err(ActionError::UnknownOption {
                key: descriptor.key.clone(),
                option,
            });
        };

        let index: i64 = id.parse().map_err(|_| ActionError::InvalidValue {
            key: descriptor.key.clone(),
            value: Value::String(id.clone()),
        })?;

        self.updater.client().set_audio_device(index, self.is_v2()).await?;
        self.updater.write(|state| state.data.insert(AUDIO_INPUT, option));

        Ok(())
    }

    async fn run_scene(&self, descriptor: &EntityDescriptor) -> ActionResult<()> {
        self.updater.client().run_scene(&descriptor.key).await?;
        Ok(())
    }

    /// The server only exposes a toggle; the requested state is recorded.
    async fn toggle_playback(&self, pause: bool) -> ActionResult<()> {
        self.updater.client().toggle_play_pause().await?;
        self.updater.write(|state| state.data.insert(PAUSED, pause));
        Ok(())
    }
}
