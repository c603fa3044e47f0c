//! Diagnostics report and system health summary.

use crate::config::Config;
use crate::data::SW_VERSION;
use crate::registry::EntityKind;
use crate::updater::Updater;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

const TO_REDACT: &[&str] = &["username", "password"];
pub const REDACTED: &str = "**REDACTED**";

/// Copy of `value` with every credential field replaced, at any depth.
pub fn redact(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    let value = match TO_REDACT.contains(&key.as_str()) && !value.is_null() {
                        true => Value::String(REDACTED.to_string()),
                        false => redact(value),
                    };
                    (key.clone(), value)
                })
                .collect(),
        ),
        Value::Array(values) => Value::Array(values.iter().map(redact).collect()),
        _ => value.clone(),
    }
}

fn to_redacted_value(value: &impl Serialize) -> Value {
    match serde_json::to_value(value) {
        Ok(value) => redact(&value),
        Err(err) => {
            tracing::warn!("Cannot serialize diagnostics section: {}", err);
            Value::Null
        }
    }
}

fn table_name(kind: EntityKind) -> Option<&'static str> {
    match kind {
        EntityKind::Button => Some("buttons"),
        EntityKind::Light => Some("devices"),
        EntityKind::Number => Some("numbers"),
        EntityKind::Select => Some("selects"),
        EntityKind::Sensor => Some("sensors"),
        EntityKind::Switch => Some("switches"),
        EntityKind::MediaPlayer => None,
    }
}

/// Redacted configuration, flat data, request trail and the keys of every
/// non-empty descriptor table.
pub fn report(config: &Config, updater: &Updater) -> Value {
    let mut report = Map::new();
    report.insert("config_entry".to_string(), to_redacted_value(config));
    report.insert("data".to_string(), to_redacted_value(&updater.data()));

    let requests = updater.client().diagnostics();
    if !requests.is_empty() {
        report.insert("requests".to_string(), to_redacted_value(&requests.snapshot()));
    }

    updater.read(|state| {
        for kind in EntityKind::ALL {
            let Some(name) = table_name(kind) else {
                continue;
            };
            let keys = state.registry.keys(kind);
            if !keys.is_empty() {
                report.insert(name.to_string(), Value::from(keys));
            }
        }
    });

    Value::Object(report)
}

/// `"{host}:{port} ({sw_version})" -> "ok" | "unreachable"` per updater,
/// after the crate version.
pub fn system_health<'a>(updaters: impl IntoIterator<Item = &'a Updater>) -> IndexMap<String, String> {
    let mut info = IndexMap::new();
    info.insert("version".to_string(), env!("CARGO_PKG_VERSION").to_string());

    for updater in updaters {
        let data = updater.data();
        let version = data.get_str(SW_VERSION).unwrap_or_default();
        let status = if data.available() { "ok" } else { "unreachable" };
        info.insert(format!("{} ({})", updater.address(), version), status.to_string());
    }

    info
}
