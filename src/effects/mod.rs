pub mod brightness;
pub mod color;
pub mod presets;

pub use brightness::{to_api, to_display, Brightness};
pub use color::{rgbw_to_hex, Palette};
pub use presets::{build_effects, find_effect, EffectCategory, PresetTable, ResolvedEffect};
