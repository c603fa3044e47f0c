use crate::registry::{Binding, EntityKind};
use serde::Serialize;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    TurnOn,
    TurnOff,
    SetValue,
    SelectOption,
    Press,
    Play,
    Pause,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::TurnOn => "turn_on",
            ActionKind::TurnOff => "turn_off",
            ActionKind::SetValue => "set_value",
            ActionKind::SelectOption => "select_option",
            ActionKind::Press => "press",
            ActionKind::Play => "play",
            ActionKind::Pause => "pause",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handler an action is dispatched to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    LightOn,
    LightOff,
    SetProperty,
    SelectProperty,
    SelectAudioInput,
    RunScene,
    TogglePlayback,
}

const ROUTES: &[(EntityKind, Binding, ActionKind, Route)] = &[
    (EntityKind::Light, Binding::Light, ActionKind::TurnOn, Route::LightOn),
    (EntityKind::Light, Binding::Light, ActionKind::TurnOff, Route::LightOff),
    (EntityKind::Number, Binding::EffectProperty, ActionKind::SetValue, Route::SetProperty),
    (EntityKind::Switch, Binding::EffectProperty, ActionKind::TurnOn, Route::SetProperty),
    (EntityKind::Switch, Binding::EffectProperty, ActionKind::TurnOff, Route::SetProperty),
    (EntityKind::Select, Binding::EffectProperty, ActionKind::SelectOption, Route::SelectProperty),
    (EntityKind::Select, Binding::AudioInput, ActionKind::SelectOption, Route::SelectAudioInput),
    (EntityKind::Button, Binding::Scene, ActionKind::Press, Route::RunScene),
    (EntityKind::MediaPlayer, Binding::MediaPlayer, ActionKind::Play, Route::TogglePlayback),
    (EntityKind::MediaPlayer, Binding::MediaPlayer, ActionKind::Pause, Route::TogglePlayback),
];

pub fn resolve(kind: EntityKind, binding: Binding, action: ActionKind) -> Option<Route> {
    ROUTES
        .iter()
        .find(|(k, b, a, _)| *k == kind && *b == binding && *a == action)
        .map(|(_, _, _, route)| *route)
}

/// Actions an entity accepts.
pub fn supported(kind: EntityKind, binding: Binding) -> Vec<ActionKind> {
    ROUTES
        .iter()
        .filter(|(k, b, _, _)| *k == kind && *b == binding)
        .map(|(_, _, action, _)| *action)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve() {
        assert_eq!(
            resolve(EntityKind::Light, Binding::Light, ActionKind::TurnOn),
            Some(Route::LightOn)
        );
        assert_eq!(
            resolve(EntityKind::Select, Binding::AudioInput, ActionKind::SelectOption),
            Some(Route::SelectAudioInput)
        );
        assert_eq!(resolve(EntityKind::Light, Binding::Light, ActionKind::Press), None);
        assert_eq!(resolve(EntityKind::Sensor, Binding::Service, ActionKind::SetValue), None);
    }

    #[test]
    fn test_each_route_is_unique() {
        for (i, (kind, binding, action, _)) in ROUTES.iter().enumerate() {
            let duplicates = ROUTES[i + 1..]
                .iter()
                .filter(|(k, b, a, _)| k == kind && b == binding && a == action)
                .count();
            assert_eq!(duplicates, 0, "{} {:?} {} routed twice", kind, binding, action);
        }
    }

    #[test]
    fn test_supported() {
        assert_eq!(
            supported(EntityKind::Switch, Binding::EffectProperty),
            vec![ActionKind::TurnOn, ActionKind::TurnOff]
        );
        assert!(supported(EntityKind::Sensor, Binding::Service).is_empty());
    }
}
