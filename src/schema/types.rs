use crate::effects::Palette;
use crate::registry::{EntityKind, NumberBounds};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// Upstream schema generation, fixed once detected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Version {
    V1,
    V2,
}

impl Version {
    /// `config` holds V1's nested document; V2 reports `configuration_version`.
    pub fn detect(config: &Value) -> Option<Self> {
        let object = config.as_object()?;
        if object.contains_key("config") {
            Some(Version::V1)
        } else if object.contains_key("configuration_version") {
            Some(Version::V2)
        } else {
            None
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::V1 => f.write_str("v1"),
            Version::V2 => f.write_str("v2"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    Boolean,
    Number(NumberBounds),
    String,
    /// Resolved against the named colour or gradient table.
    Color { gradient: bool },
}

fn number_field(schema: &Value, field: &str) -> Option<f64> {
    schema.get(field).and_then(Value::as_f64)
}

impl PropertyKind {
    pub fn from_schema(schema: &Value) -> Option<Self> {
        match schema.get("type").and_then(Value::as_str)? {
            "boolean" => Some(PropertyKind::Boolean),
            "integer" | "number" => {
                let min = number_field(schema, "minimum");
                Some(PropertyKind::Number(NumberBounds {
                    min: min.unwrap_or(0.0),
                    max: number_field(schema, "maximum").unwrap_or(0.0),
                    step: min.unwrap_or(0.1).max(0.1),
                }))
            }
            "string" => Some(PropertyKind::String),
            "color" => Some(PropertyKind::Color {
                gradient: schema.get("gradient").and_then(Value::as_bool).unwrap_or(false),
            }),
            _ => None,
        }
    }

    pub fn entity_kind(&self) -> EntityKind {
        match self {
            PropertyKind::Boolean => EntityKind::Switch,
            PropertyKind::Number(_) => EntityKind::Number,
            PropertyKind::String | PropertyKind::Color { .. } => EntityKind::Select,
        }
    }

    pub fn is_color(&self) -> bool {
        matches!(self, PropertyKind::Color { .. })
    }
}

/// Python's `str.title()`: a letter is upper-cased when it follows a
/// non-letter, every other letter is lower-cased.
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut previous_is_letter = false;

    for c in value.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(c);
            previous_is_letter = false;
        }
    }

    out
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PropertyDescriptor {
    pub key: String,
    pub name: String,
    pub kind: PropertyKind,
    pub enum_values: Vec<String>,
    pub applicable_effects: BTreeSet<String>,
}

impl PropertyDescriptor {
    fn options(kind: &PropertyKind, schema: &Value, palette: &Palette) -> Vec<String> {
        match kind {
            PropertyKind::String => {
                let mut values: Vec<String> = schema
                    .get("enum")
                    .and_then(Value::as_array)
                    .map(|values| values.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                    .unwrap_or_default();
                values.sort();
                values
            }
            PropertyKind::Color { gradient } => palette.options(*gradient),
            _ => Vec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Observation {
    New,
    Extended,
    Unchanged,
    /// The property's type has no entity representation.
    Unsupported,
}

/// Effect properties seen in any schema so far. Entries are never removed.
#[derive(Clone, Debug, Default)]
pub struct PropertyTable {
    properties: IndexMap<String, PropertyDescriptor>,
}

impl PropertyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, effect: &str, key: &str, schema: &Value, palette: &Palette) -> Observation {
        if let Some(existing) = self.properties.get_mut(key) {
            let grew = existing.applicable_effects.insert(effect.to_string());

            let mut refreshed = false;
            if existing.kind.is_color() {
                let options = PropertyDescriptor::options(&existing.kind, schema, palette);
                refreshed = options != existing.enum_values;
                existing.enum_values = options;
            }

            return if grew || refreshed {
                Observation::Extended
            } else {
                Observation::Unchanged
            };
        }

        let Some(kind) = PropertyKind::from_schema(schema) else {
            return Observation::Unsupported;
        };

        let name = schema
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| title_case(key));

        let descriptor = PropertyDescriptor {
            key: key.to_string(),
            name,
            enum_values: PropertyDescriptor::options(&kind, schema, palette),
            kind,
            applicable_effects: BTreeSet::from([effect.to_string()]),
        };

        self.properties.insert(key.to_string(), descriptor);
        Observation::New
    }

    pub fn get(&self, key: &str) -> Option<&PropertyDescriptor> {
        self.properties.get(key)
    }

    pub fn is_color(&self, key: &str) -> bool {
        self.get(key).map(|p| p.kind.is_color()).unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.properties.values()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}
