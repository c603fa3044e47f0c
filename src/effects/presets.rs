use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Presets per base effect, each list sorted.
pub type PresetTable = BTreeMap<String, Vec<String>>;

const DEFAULT_PREFIX: &str = "* ";
const CUSTOM_PREFIX: &str = "** ";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectCategory {
    None,
    #[serde(rename = "default_presets")]
    Default,
    #[serde(rename = "custom_presets")]
    Custom,
}

impl EffectCategory {
    /// Value sent as `category` when applying a preset.
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectCategory::None => "none",
            EffectCategory::Default => "default_presets",
            EffectCategory::Custom => "custom_presets",
        }
    }
}

impl fmt::Display for EffectCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedEffect {
    pub effect: String,
    pub preset: Option<String>,
    pub category: EffectCategory,
}

impl ResolvedEffect {
    fn bare(effect: &str) -> Self {
        Self {
            effect: effect.to_string(),
            preset: None,
            category: EffectCategory::None,
        }
    }
}

fn sorted(values: &[String]) -> Vec<String> {
    let mut values = values.to_vec();
    values.sort();
    values
}

/// Effect labels offered to the user: every base effect followed by its
/// default presets (`* name`) and then its custom presets (`** name`).
pub fn build_effects(effects: &[String], default_presets: &PresetTable, custom_presets: &PresetTable) -> Vec<String> {
    let mut labels = Vec::new();

    for effect in sorted(effects) {
        let defaults = default_presets.get(&effect).map(|p| sorted(p)).unwrap_or_default();
        let customs = custom_presets.get(&effect).map(|p| sorted(p)).unwrap_or_default();

        labels.push(effect);
        labels.extend(defaults.into_iter().map(|preset| format!("{}{}", DEFAULT_PREFIX, preset)));
        labels.extend(customs.into_iter().map(|preset| format!("{}{}", CUSTOM_PREFIX, preset)));
    }

    labels
}

fn owner(table: &PresetTable, preset: &str) -> Option<String> {
    table
        .iter()
        .find(|(_, presets)| presets.iter().any(|p| p == preset))
        .map(|(effect, _)| effect.clone())
}

/// Reverse of [`build_effects`]. A label without a known preset resolves to
/// a bare effect with [`EffectCategory::None`].
pub fn find_effect(label: &str, default_presets: &PresetTable, custom_presets: &PresetTable) -> ResolvedEffect {
    if let Some(preset) = label.strip_prefix(CUSTOM_PREFIX) {
        if let Some(effect) = owner(custom_presets, preset) {
            return ResolvedEffect {
                effect,
                preset: Some(preset.to_string()),
                category: EffectCategory::Custom,
            };
        }
        if let Some(effect) = owner(default_presets, preset) {
            return ResolvedEffect {
                effect,
                preset: Some(preset.to_string()),
                category: EffectCategory::Default,
            };
        }
        return ResolvedEffect::bare(preset);
    }

    if let Some(preset) = label.strip_prefix(DEFAULT_PREFIX) {
        if let Some(effect) = owner(default_presets, preset) {
            return ResolvedEffect {
                effect,
                preset: Some(preset.to_string()),
                category: EffectCategory::Default,
            };
        }
        return ResolvedEffect::bare(preset);
    }

    ResolvedEffect::bare(label)
}
