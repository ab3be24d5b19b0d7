use serde::{Deserialize, Serialize};

/// Number of approach-direction sectors around a stuck particle
pub const SECTOR_COUNT: usize = 12;

/// Adhesion settings shared with the host
///
/// Field names follow the wire protocol (`baseAdhesion`, `dirMult`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Base sticking probability (0.0-1.0)
    pub base_adhesion: f64,
    /// Per-sector multipliers, sector 0 pointing up
    pub dir_mult: [f64; SECTOR_COUNT],
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_adhesion: 0.35,
            dir_mult: [1.0; SECTOR_COUNT],
        }
    }
}

/// A partial settings update; absent fields keep their previous value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_adhesion: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir_mult: Option<Vec<f64>>,
}

impl SettingsUpdate {
    pub fn base_adhesion(value: f64) -> Self {
        Self {
            base_adhesion: Some(value),
            dir_mult: None,
        }
    }

    pub fn dir_mult(values: [f64; SECTOR_COUNT]) -> Self {
        Self {
            base_adhesion: None,
            dir_mult: Some(values.to_vec()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.base_adhesion.is_none() && self.dir_mult.is_none()
    }
}

impl Settings {
    /// Merge an update field by field.
    ///
    /// Values are taken as-is; clamping happens where the probability is used.
    /// A multiplier list that does not have exactly one entry per sector is
    /// dropped. Returns true if anything changed.
    pub fn merge(&mut self, update: &SettingsUpdate) -> bool {
        let mut changed = false;

        if let Some(base) = update.base_adhesion {
            changed |= self.base_adhesion != base;
            self.base_adhesion = base;
        }

        if let Some(values) = &update.dir_mult {
            match <[f64; SECTOR_COUNT]>::try_from(values.as_slice()) {
                Ok(dir_mult) => {
                    changed |= self.dir_mult != dir_mult;
                    self.dir_mult = dir_mult;
                }
                Err(_) => {
                    log::debug!(
                        "ignoring dirMult with {} entries (expected {})",
                        values.len(),
                        SECTOR_COUNT
                    );
                }
            }
        }

        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_only_supplied_fields() {
        let mut settings = Settings {
            base_adhesion: 0.5,
            dir_mult: [2.0; SECTOR_COUNT],
        };

        assert!(settings.merge(&SettingsUpdate::base_adhesion(0.9)));
        assert_eq!(settings.base_adhesion, 0.9);
        assert_eq!(settings.dir_mult, [2.0; SECTOR_COUNT]);

        let mut mult = [1.0; SECTOR_COUNT];
        mult[3] = 0.25;
        assert!(settings.merge(&SettingsUpdate::dir_mult(mult)));
        assert_eq!(settings.base_adhesion, 0.9);
        assert_eq!(settings.dir_mult[3], 0.25);
    }

    #[test]
    fn test_empty_update_is_noop() {
        let mut settings = Settings::default();
        let before = settings.clone();
        assert!(!settings.merge(&SettingsUpdate::default()));
        assert_eq!(settings, before);
    }

    #[test]
    fn test_wrong_length_dir_mult_ignored() {
        let mut settings = Settings::default();
        let update = SettingsUpdate {
            base_adhesion: Some(0.1),
            dir_mult: Some(vec![3.0; 5]),
        };
        settings.merge(&update);
        assert_eq!(settings.base_adhesion, 0.1);
        assert_eq!(settings.dir_mult, [1.0; SECTOR_COUNT]);
    }

    #[test]
    fn test_wire_field_names() {
        let update: SettingsUpdate = serde_json::from_str(r#"{"baseAdhesion":0.7}"#).unwrap();
        assert_eq!(update.base_adhesion, Some(0.7));
        assert!(update.dir_mult.is_none());

        let json = serde_json::to_string(&Settings::default()).unwrap();
        assert!(json.contains("\"baseAdhesion\""));
        assert!(json.contains("\"dirMult\""));
    }
}
