//! Turns endpoint payloads into the flat data map, the effect property
//! table and entity descriptors. One [`Normalizer`] per upstream
//! [`Version`], chosen from the first config response.

pub mod common;
pub mod types;
pub mod v1;
pub mod v2;

use crate::client::Endpoint;
use crate::data::{FlatData, SW_VERSION};
use crate::effects::Palette;
use crate::registry::{DeviceInfo, EntityDescriptor, EntityRegistry, Registration};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

pub use types::{Observation, PropertyDescriptor, PropertyKind, PropertyTable, Version};
pub use v1::V1Normalizer;
pub use v2::V2Normalizer;

/// Everything a poll cycle writes. Shared between the updater, entity
/// reads and actions.
#[derive(Debug)]
pub struct LiveState {
    pub data: FlatData,
    pub properties: PropertyTable,
    pub palette: Palette,
    pub registry: EntityRegistry,
    /// Descriptors discovered but not yet announced to subscribers.
    pub discovered: Vec<EntityDescriptor>,
    /// Device codes reported by the latest device list.
    pub present_devices: BTreeSet<String>,
    pub version: Option<Version>,
    address: String,
}

impl LiveState {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            data: FlatData::new(),
            properties: PropertyTable::new(),
            palette: Palette::default(),
            registry: EntityRegistry::new(),
            discovered: Vec::new(),
            present_devices: BTreeSet::new(),
            version: None,
            address: address.into(),
        }
    }

    /// `host:port` of the server.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn service_info(&self) -> DeviceInfo {
        DeviceInfo::service(&self.address, self.data.get_str(SW_VERSION).map(str::to_string))
    }

    /// Records a descriptor and queues it for announcement when it is new.
    pub fn discover(&mut self, descriptor: EntityDescriptor) -> bool {
        match self.registry.register(descriptor) {
            Registration::New(descriptor) => {
                self.discovered.push(descriptor);
                true
            }
            Registration::Updated | Registration::Unchanged => false,
        }
    }

    pub fn take_discovered(&mut self) -> Vec<EntityDescriptor> {
        std::mem::take(&mut self.discovered)
    }

    pub fn is_device_present(&self, code: &str) -> bool {
        self.present_devices.contains(code)
    }
}

/// Per-version parsing strategy.
pub trait Normalizer: Send + Sync + fmt::Debug {
    fn version(&self) -> Version;

    /// Endpoints polled after `config`, in order.
    fn sequence(&self) -> &'static [Endpoint];

    /// Mutating device calls address `/virtuals/{id}` instead of `/devices/{id}`.
    fn is_virtual(&self) -> bool;

    fn apply(&self, endpoint: Endpoint, response: &Value, state: &mut LiveState);
}

pub fn for_version(version: Version) -> Arc<dyn Normalizer> {
    match version {
        Version::V1 => Arc::new(V1Normalizer),
        Version::V2 => Arc::new(V2Normalizer::new()),
    }
}
