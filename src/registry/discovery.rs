use super::types::{EntityDescriptor, EntityKind};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

pub type NewEntityCallback = Arc<dyn Fn(&EntityDescriptor) + Send + Sync>;

#[derive(Clone, Debug, PartialEq)]
pub enum Registration {
    /// First sighting of the key; the caller announces it.
    New(EntityDescriptor),
    /// Known key whose computed fields changed.
    Updated,
    Unchanged,
}

impl Registration {
    pub fn is_new(&self) -> bool {
        matches!(self, Registration::New(_))
    }
}

/// Append-only descriptor arenas, one per entity kind, enumerated in
/// insertion order.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    tables: IndexMap<EntityKind, IndexMap<String, EntityDescriptor>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        let tables = EntityKind::ALL
            .iter()
            .map(|kind| (*kind, IndexMap::new()))
            .collect();
        Self { tables }
    }

    pub fn register(&mut self, descriptor: EntityDescriptor) -> Registration {
        let table = self.tables.entry(descriptor.kind).or_default();

        if let Some(existing) = table.get_mut(&descriptor.key) {
            if existing.computed.merge(&descriptor.computed) {
                return Registration::Updated;
            }
            return Registration::Unchanged;
        }

        tracing::debug!("Discovered {} '{}'", descriptor.kind, descriptor.key);
        table.insert(descriptor.key.clone(), descriptor.clone());
        Registration::New(descriptor)
    }

    pub fn get(&self, kind: EntityKind, key: &str) -> Option<&EntityDescriptor> {
        self.tables.get(&kind).and_then(|table| table.get(key))
    }

    pub fn contains(&self, kind: EntityKind, key: &str) -> bool {
        self.get(kind, key).is_some()
    }

    pub fn keys(&self, kind: EntityKind) -> Vec<String> {
        self.tables
            .get(&kind)
            .map(|table| table.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn descriptors(&self, kind: EntityKind) -> Vec<EntityDescriptor> {
        self.tables
            .get(&kind)
            .map(|table| table.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.tables.get(&kind).map(IndexMap::len).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.tables.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One "new entity" callback per kind.
#[derive(Default)]
pub struct Subscribers {
    callbacks: Mutex<HashMap<EntityKind, NewEntityCallback>>,
}

impl fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let callbacks = self.callbacks.lock().unwrap_or_else(PoisonError::into_inner);
        let mut kinds: Vec<_> = callbacks.keys().collect();
        kinds.sort();
        f.debug_struct("Subscribers").field("kinds", &kinds).finish()
    }
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, kind: EntityKind, callback: NewEntityCallback) {
        let mut callbacks = self.callbacks.lock().unwrap_or_else(PoisonError::into_inner);
        if callbacks.insert(kind, callback).is_some() {
            tracing::warn!("Subscriber for {} already registered, replacing", kind);
        }
    }

    pub fn is_subscribed(&self, kind: EntityKind) -> bool {
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&kind)
    }

    pub fn unsubscribe_all(&self) {
        self.callbacks.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Fires the callback of the descriptor's kind. Unsubscribed kinds are
    /// skipped; the descriptor shows up in the next enumeration instead.
    pub fn notify(&self, descriptor: &EntityDescriptor) -> bool {
        let callback = self
            .callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&descriptor.kind)
            .cloned();

        match callback {
            Some(callback) => {
                callback(descriptor);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::types::{Binding, ComputedFields, DeviceInfo, StaticMetadata};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn number(code: &str, field: &str, effects: &[&str]) -> EntityDescriptor {
        EntityDescriptor::for_device(
            EntityKind::Number,
            Binding::EffectProperty,
            code,
            field,
            StaticMetadata::new(field),
            DeviceInfo::service("127.0.0.1:8888", None),
        )
        .with_computed(ComputedFields {
            applicable_effects: effects.iter().map(|e| e.to_string()).collect(),
            options: Vec::new(),
        })
    }

    #[test]
    fn test_register_new_key() {
        let mut registry = EntityRegistry::new();

        assert!(registry.register(number("wled", "blur", &["bar"])).is_new());
        assert!(registry.contains(EntityKind::Number, "wled_blur"));
        assert_eq!(registry.count(EntityKind::Number), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = EntityRegistry::new();

        registry.register(number("wled", "blur", &["bar"]));
        assert_eq!(registry.register(number("wled", "blur", &["bar"])), Registration::Unchanged);
        assert_eq!(registry.count(EntityKind::Number), 1);
    }

    #[test]
    fn test_register_extends_known_key() {
        let mut registry = EntityRegistry::new();
        registry.register(number("wled", "blur", &["bar"]));

        let mut renamed = number("wled", "blur", &["rain"]);
        renamed.metadata.name = "Renamed".to_string();

        assert_eq!(registry.register(renamed), Registration::Updated);

        let stored = registry.get(EntityKind::Number, "wled_blur").unwrap();
        assert_eq!(stored.metadata.name, "blur");
        assert!(stored.computed.applicable_effects.contains("bar"));
        assert!(stored.computed.applicable_effects.contains("rain"));
    }

    #[test]
    fn test_kinds_are_separate_tables() {
        let mut registry = EntityRegistry::new();
        let mut switch = number("wled", "blur", &[]);
        switch.kind = EntityKind::Switch;

        registry.register(number("wled", "blur", &[]));
        assert!(registry.register(switch).is_new());
        assert_eq!(registry.keys(EntityKind::Switch), vec!["wled_blur".to_string()]);
    }

    #[test]
    fn test_enumeration_keeps_insertion_order() {
        let mut registry = EntityRegistry::new();
        registry.register(number("wled", "speed", &[]));
        registry.register(number("strip", "blur", &[]));
        registry.register(number("wled", "blur", &[]));

        assert_eq!(
            registry.keys(EntityKind::Number),
            vec!["wled_speed", "strip_blur", "wled_blur"]
        );
        assert!(registry.descriptors(EntityKind::Button).is_empty());
    }

    #[test]
    fn test_notify_reaches_subscriber() {
        let subscribers = Subscribers::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        subscribers.subscribe(
            EntityKind::Number,
            Arc::new(move |_: &EntityDescriptor| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert!(subscribers.notify(&number("wled", "blur", &[])));
        assert!(!subscribers.notify(&EntityDescriptor {
            kind: EntityKind::Button,
            ..number("wled", "blur", &[])
        }));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_all() {
        let subscribers = Subscribers::new();
        subscribers.subscribe(EntityKind::Light, Arc::new(|_: &EntityDescriptor| {}));
        assert!(subscribers.is_subscribed(EntityKind::Light));

        subscribers.unsubscribe_all();

        assert!(!subscribers.is_subscribed(EntityKind::Light));
        assert!(!subscribers.notify(&EntityDescriptor {
            kind: EntityKind::Light,
            ..number("wled", "wled", &[])
        }));
    }
}
