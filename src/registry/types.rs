use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

pub const MANUFACTURER: &str = "LedFx Developers";
pub const SERVICE_NAME: &str = "LedFx";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Button,
    Light,
    Number,
    Select,
    Sensor,
    Switch,
    MediaPlayer,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Button,
        EntityKind::Light,
        EntityKind::Number,
        EntityKind::Select,
        EntityKind::Sensor,
        EntityKind::Switch,
        EntityKind::MediaPlayer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Button => "button",
            EntityKind::Light => "light",
            EntityKind::Number => "number",
            EntityKind::Select => "select",
            EntityKind::Sensor => "sensor",
            EntityKind::Switch => "switch",
            EntityKind::MediaPlayer => "media_player",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    Config,
    Diagnostic,
}

/// What an entity is wired to; actions are routed on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Binding {
    /// Read-only global value of the server.
    Service,
    Light,
    Scene,
    EffectProperty,
    AudioInput,
    MediaPlayer,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DeviceInfo {
    pub identifier: String,
    pub name: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub sw_version: Option<String>,
    pub configuration_url: String,
}

impl DeviceInfo {
    /// The server itself, owner of global entities.
    pub fn service(address: &str, sw_version: Option<String>) -> Self {
        Self {
            identifier: address.to_string(),
            name: SERVICE_NAME.to_string(),
            manufacturer: Some(MANUFACTURER.to_string()),
            model: None,
            sw_version,
            configuration_url: format!("http://{}/", address),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct NumberBounds {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

/// Fixed once the descriptor is created.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StaticMetadata {
    pub name: String,
    pub icon: Option<String>,
    pub category: Option<EntityCategory>,
    pub enabled_by_default: bool,
    pub bounds: Option<NumberBounds>,
}

impl StaticMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon: None,
            category: None,
            enabled_by_default: true,
            bounds: None,
        }
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn maybe_icon(mut self, icon: Option<&str>) -> Self {
        self.icon = icon.map(str::to_string);
        self
    }

    pub fn category(mut self, category: EntityCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn disabled_by_default(mut self) -> Self {
        self.enabled_by_default = false;
        self
    }

    pub fn bounds(mut self, bounds: NumberBounds) -> Self {
        self.bounds = Some(bounds);
        self
    }
}

/// Refreshed whenever an already known key is observed again.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ComputedFields {
    pub applicable_effects: BTreeSet<String>,
    pub options: Vec<String>,
}

impl ComputedFields {
    /// Grows the effect set and replaces the options.
    pub fn merge(&mut self, other: &ComputedFields) -> bool {
        let before = self.applicable_effects.len();
        self.applicable_effects.extend(other.applicable_effects.iter().cloned());
        let grew = self.applicable_effects.len() != before;

        let options_changed = self.options != other.options;
        if options_changed {
            self.options = other.options.clone();
        }

        grew || options_changed
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EntityDescriptor {
    /// `{device}_{property}` for device entities, the bare key otherwise.
    pub key: String,
    /// Property, scene or global key without the device prefix.
    pub field: String,
    pub kind: EntityKind,
    pub binding: Binding,
    pub device_code: Option<String>,
    pub metadata: StaticMetadata,
    pub device_info: DeviceInfo,
    pub computed: ComputedFields,
}

impl EntityDescriptor {
    pub fn global(kind: EntityKind, binding: Binding, key: &str, metadata: StaticMetadata, device_info: DeviceInfo) -> Self {
        Self {
            key: key.to_string(),
            field: key.to_string(),
            kind,
            binding,
            device_code: None,
            metadata,
            device_info,
            computed: ComputedFields::default(),
        }
    }

    pub fn for_device(
        kind: EntityKind,
        binding: Binding,
        code: &str,
        field: &str,
        metadata: StaticMetadata,
        device_info: DeviceInfo,
    ) -> Self {
        Self {
            key: crate::data::device_key(code, field),
            field: field.to_string(),
            kind,
            binding,
            device_code: Some(code.to_string()),
            metadata,
            device_info,
            computed: ComputedFields::default(),
        }
    }

    pub fn with_computed(mut self, computed: ComputedFields) -> Self {
        self.computed = computed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn computed(effects: &[&str], options: &[&str]) -> ComputedFields {
        ComputedFields {
            applicable_effects: effects.iter().map(|e| e.to_string()).collect(),
            options: options.iter().map(|o| o.to_string()).collect(),
        }
    }

    #[test]
    fn test_computed_merge_grows_effects() {
        let mut fields = computed(&["bar"], &[]);

        assert!(fields.merge(&computed(&["wavelength"], &[])));
        assert!(!fields.merge(&computed(&["bar"], &[])));
        assert_eq!(fields.applicable_effects.len(), 2);
    }

    #[test]
    fn test_computed_merge_never_shrinks() {
        let mut fields = computed(&["bar", "rain"], &["a"]);

        assert!(fields.merge(&computed(&[], &["a", "b"])));
        assert!(fields.applicable_effects.contains("rain"));
        assert_eq!(fields.options, vec!["a", "b"]);
    }

    #[test]
    fn test_descriptor_keys() {
        let info = DeviceInfo::service("127.0.0.1:8888", None);
        let global = EntityDescriptor::global(
            EntityKind::Button,
            Binding::Scene,
            "party",
            StaticMetadata::new("Party"),
            info.clone(),
        );
        let bound = EntityDescriptor::for_device(
            EntityKind::Number,
            Binding::EffectProperty,
            "wled",
            "blur",
            StaticMetadata::new("Blur").disabled_by_default(),
            info,
        );

        assert_eq!(global.key, "party");
        assert_eq!(global.device_code, None);
        assert_eq!(bound.key, "wled_blur");
        assert_eq!(bound.field, "blur");
        assert_eq!(bound.device_code.as_deref(), Some("wled"));
        assert!(!bound.metadata.enabled_by_default);
    }

    #[test]
    fn test_service_device_info() {
        let info = DeviceInfo::service("10.0.0.2:8888", Some("2.0.1".to_string()));

        assert_eq!(info.identifier, "10.0.0.2:8888");
        assert_eq!(info.configuration_url, "http://10.0.0.2:8888/");
        assert_eq!(info.manufacturer.as_deref(), Some(MANUFACTURER));
    }
}
