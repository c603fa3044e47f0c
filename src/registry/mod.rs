pub mod discovery;
pub mod icons;
pub mod types;

pub use discovery::{EntityRegistry, NewEntityCallback, Registration, Subscribers};
pub use types::{
    Binding, ComputedFields, DeviceInfo, EntityCategory, EntityDescriptor, EntityKind, NumberBounds,
    StaticMetadata,
};
