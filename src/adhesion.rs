use crate::settings::{Settings, SettingsUpdate, SECTOR_COUNT};

/// Angular width of one sector in degrees
pub const SECTOR_DEGREES: f64 = 360.0 / SECTOR_COUNT as f64;

/// Rotation applied so that sector 0 points up (negative y, as on the host canvas)
const UP_OFFSET_DEGREES: f64 = 90.0;

/// Map an approach angle (radians, `atan2` convention) to its sector.
///
/// Sectors are 30° wide and centered on multiples of 30° from "up", so sector
/// 0 covers -15°..15° around up. The result is the same for `angle` and
/// `angle + 2πk`.
pub fn sector_index(angle: f64) -> usize {
    let degrees = (angle.to_degrees() + UP_OFFSET_DEGREES).rem_euclid(360.0);
    // The upper half of the last sector rounds to SECTOR_COUNT and wraps to 0
    (degrees / SECTOR_DEGREES).round() as usize % SECTOR_COUNT
}

/// Direction-dependent sticking probability
#[derive(Debug, Clone, Default)]
pub struct AdhesionModel {
    settings: Settings,
}

impl AdhesionModel {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Merge a partial settings update, returns true if anything changed
    pub fn update(&mut self, update: &SettingsUpdate) -> bool {
        self.settings.merge(update)
    }

    /// Probability that a walker approaching from `angle` sticks, clamped to 0..=1
    pub fn stick_probability(&self, angle: f64) -> f64 {
        let multiplier = self.settings.dir_mult[sector_index(angle)];
        (self.settings.base_adhesion * multiplier).clamp(0.0, 1.0)
    }
}
