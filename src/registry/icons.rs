use super::types::EntityKind;

pub const LIGHT_DEFAULT: &str = "mdi:led-strip-variant";
pub const SCENE: &str = "mdi:image";
pub const AUDIO_INPUT: &str = "mdi:audio-input-stereo-minijack";

const SENSORS: &[(&str, &str)] = &[
    ("fft_size", "mdi:numeric"),
    ("host_api", "mdi:api"),
    ("mic_rate", "mdi:microphone-settings"),
];

const SELECTS: &[(&str, &str)] = &[
    ("align", "mdi:format-vertical-align-center"),
    ("background_color", "mdi:format-color-fill"),
    ("color", "mdi:format-color-fill"),
    ("color_high", "mdi:format-color-fill"),
    ("color_lows", "mdi:format-color-fill"),
    ("color_mids", "mdi:format-color-fill"),
    ("ease_method", "mdi:fence"),
    ("frequency", "mdi:sine-wave"),
    ("frequency_range", "mdi:sine-wave"),
    ("gradient_name", "mdi:gradient-horizontal"),
    ("high_colour", "mdi:format-color-fill"),
    ("lows_colour", "mdi:format-color-fill"),
    ("mids_colour", "mdi:format-color-fill"),
    ("mixing_mode", "mdi:bowl-mix"),
    ("mode", "mdi:book-open"),
    ("modulation_effect", "mdi:auto-fix"),
    ("raindrop_animation", "mdi:transition"),
    ("strobe_color", "mdi:format-color-fill"),
];

const NUMBERS: &[(&str, &str)] = &[
    ("band_count", "mdi:counter"),
    ("bass_strobe_decay_rate", "mdi:volume-vibrate"),
    ("bass_threshold", "mdi:volume-vibrate"),
    ("block_count", "mdi:counter"),
    ("blur", "mdi:blur"),
    ("color_step", "mdi:debug-step-over"),
    ("decay", "mdi:close-box-multiple-outline"),
    ("fade_rate", "mdi:reiterate"),
    ("gradient_repeat", "mdi:repeat-variant"),
    ("gradient_roll", "mdi:script-outline"),
    ("high_sensitivity", "mdi:brightness-7"),
    ("lows_sensitivity", "mdi:brightness-7"),
    ("mids_sensitivity", "mdi:brightness-7"),
    ("modulation_speed", "mdi:speedometer"),
    ("multiplier", "mdi:aspect-ratio"),
    ("responsiveness", "mdi:brightness-7"),
    ("sensitivity", "mdi:brightness-7"),
    ("speed", "mdi:speedometer"),
    ("strobe_decay_rate", "mdi:reiterate"),
    ("strobe_width", "mdi:table-column-width"),
    ("threshold", "mdi:debug-step-over"),
];

const SWITCHES: &[(&str, &str)] = &[
    ("color_cycler", "mdi:palette"),
    ("flip", "mdi:flip-horizontal"),
    ("flip_gradient", "mdi:gradient-horizontal"),
    ("mirror", "mdi:mirror"),
    ("modulate", "mdi:view-module-outline"),
    ("sparks", "mdi:shimmer"),
];

/// Icon for a property or sensor key, if one is assigned.
pub fn lookup(kind: EntityKind, key: &str) -> Option<&'static str> {
    let table = match kind {
        EntityKind::Sensor => SENSORS,
        EntityKind::Select => SELECTS,
        EntityKind::Number => NUMBERS,
        EntityKind::Switch => SWITCHES,
        _ => return None,
    };

    table.iter().find(|(name, _)| *name == key).map(|(_, icon)| *icon)
}

/// A device's own icon when it is an `mdi:` name.
pub fn light(icon_name: Option<&str>) -> &str {
    match icon_name {
        Some(icon) if icon.starts_with("mdi:") => icon,
        _ => LIGHT_DEFAULT,
    }
}
