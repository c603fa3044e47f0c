use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Named colours and gradients published by a V2 server.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Palette {
    pub colors: IndexMap<String, String>,
    pub gradients: IndexMap<String, String>,
}

// Builtin entries first, user entries override them.
fn merge_section(section: Option<&Value>) -> IndexMap<String, String> {
    let mut merged = IndexMap::new();
    let Some(section) = section else {
        return merged;
    };

    for tier in ["builtin", "user"] {
        if let Some(entries) = section.get(tier).and_then(Value::as_object) {
            for (name, definition) in entries {
                if let Some(definition) = definition.as_str() {
                    merged.insert(name.clone(), definition.to_string());
                }
            }
        }
    }

    merged
}

impl Palette {
    pub fn from_response(response: &Value) -> Self {
        Self {
            colors: merge_section(response.get("colors")),
            gradients: merge_section(response.get("gradients")),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty() && self.gradients.is_empty()
    }

    /// Selectable names for a colour property, sorted.
    pub fn options(&self, gradient: bool) -> Vec<String> {
        let table = if gradient { &self.gradients } else { &self.colors };
        let mut names: Vec<String> = table.keys().cloned().collect();
        names.sort();
        names
    }

    /// Name shown for a raw definition, colours searched before gradients.
    pub fn name_for_value(&self, value: &str) -> Option<&str> {
        self.colors
            .iter()
            .chain(self.gradients.iter())
            .find(|(_, definition)| definition.as_str() == value)
            .map(|(name, _)| name.as_str())
    }

    /// Definition sent upstream for a selected name.
    pub fn value_for_name(&self, name: &str) -> Option<&str> {
        self.colors
            .get(name)
            .or_else(|| self.gradients.get(name))
            .map(String::as_str)
    }
}

/// `#rrggbb` for an RGBW colour, the white channel lifting every component.
pub fn rgbw_to_hex(rgbw: [u8; 4]) -> String {
    let [r, g, b, w] = rgbw;
    format!(
        "#{:02x}{:02x}{:02x}",
        r.saturating_add(w),
        g.saturating_add(w),
        b.saturating_add(w)
    )
}
