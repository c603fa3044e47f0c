/// Upper end of the display range.
pub const DISPLAY_MAX: u8 = 255;

const SCALE: f64 = 100.0 * 2.55;

/// Brightness as LedFx stores it in an effect config: `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Brightness(f64);

impl Brightness {
    pub fn new(value: f64) -> Self {
        Self(value.clamp(0.0, 1.0))
    }

    /// Converts a `0..=255` display value, keeping one decimal.
    pub fn from_display(display: f64) -> Self {
        Self(to_api(display))
    }

    pub fn as_f64(&self) -> f64 {
        self.0
    }

    pub fn to_display(&self) -> u8 {
        to_display(self.0)
    }
}

impl Default for Brightness {
    fn default() -> Self {
        Self(0.0)
    }
}

/// `ceil(api * 100 * 2.55)` clamped to `0..=255`.
pub fn to_display(api: f64) -> u8 {
    let value = (api * 100.0 * 2.55).ceil();
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, DISPLAY_MAX as f64) as u8
}

/// `display / 100 / 2.55` rounded to one decimal, clamped to `0.0..=1.0`.
pub fn to_api(display: f64) -> f64 {
    let value = (display / SCALE).min(1.0);
    if value.is_nan() {
        return 0.0;
    }
    ((value * 10.0).round() / 10.0).max(0.0)
}
