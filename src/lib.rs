pub mod actions;
pub mod client;
pub mod config;
pub mod data;
pub mod diagnostics;
pub mod effects;
pub mod entity;
pub mod registry;
pub mod schema;
pub mod updater;

#[cfg(test)]
mod testing;

pub use actions::{Action, ActionError, ActionKind, Controller, TurnOn};
pub use client::{BasicAuth, ClientError, ClientResult, Endpoint, LedFxClient, Method, ReqwestTransport, Request, Transport};
pub use config::Config;
pub use data::FlatData;
pub use effects::{build_effects, find_effect, Brightness, EffectCategory, Palette, ResolvedEffect};
pub use entity::{EntityValue, EntityView, Unavailable};
pub use registry::{EntityDescriptor, EntityKind, EntityRegistry, NewEntityCallback};
pub use schema::{LiveState, Normalizer, Version};
pub use updater::{verify_access, CycleOutcome, Scheduler, Updater};
