use crate::settings::{Settings, SECTOR_COUNT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A named set of adhesion settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub description: String,
    pub settings: Settings,
}

impl Preset {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        base_adhesion: f64,
        dir_mult: [f64; SECTOR_COUNT],
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            settings: Settings {
                base_adhesion,
                dir_mult,
            },
        }
    }
}

/// Multipliers that keep every `period`-th sector at 1.0 and the rest at `low`
fn every_nth(period: usize, low: f64) -> [f64; SECTOR_COUNT] {
    let mut mult = [low; SECTOR_COUNT];
    for (i, m) in mult.iter_mut().enumerate() {
        if i % period == 0 {
            *m = 1.0;
        }
    }
    mult
}

/// Manager for loading and saving presets
pub struct PresetManager {
    /// Built-in presets that ship with the worker
    pub builtin: Vec<Preset>,
    /// User-created presets loaded from disk
    pub user: Vec<Preset>,
    dir: Option<PathBuf>,
}

impl Default for PresetManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PresetManager {
    /// Load built-ins plus user presets from the config directory
    pub fn new() -> Self {
        Self::with_dir(Self::default_dir())
    }

    /// Load built-ins plus user presets from `dir`
    pub fn with_dir(dir: Option<PathBuf>) -> Self {
        let mut manager = Self {
            builtin: Vec::new(),
            user: Vec::new(),
            dir,
        };
        manager.load_builtin_presets();
        manager.load_user_presets();
        manager
    }

    fn load_builtin_presets(&mut self) {
        // Sector 0 points up, sectors advance in 30° steps
        self.builtin = vec![
            Preset::new(
                "Isotropic",
                "Same adhesion from every direction",
                0.35,
                [1.0; SECTOR_COUNT],
            ),
            Preset::new(
                "Dendritic",
                "Full adhesion, thin branching arms",
                1.0,
                [1.0; SECTOR_COUNT],
            ),
            Preset::new(
                "Sparse",
                "Low adhesion, walkers penetrate deeper for a denser cluster",
                0.05,
                [1.0; SECTOR_COUNT],
            ),
            Preset::new(
                "Snowflake",
                "Six preferred directions",
                0.8,
                every_nth(2, 0.1),
            ),
            Preset::new(
                "Cross",
                "Growth along the four axes",
                0.8,
                every_nth(3, 0.15),
            ),
            Preset::new(
                "Vertical",
                "Sticks mostly when approaching from above or below",
                0.7,
                [1.0, 0.6, 0.2, 0.05, 0.2, 0.6, 1.0, 0.6, 0.2, 0.05, 0.2, 0.6],
            ),
            Preset::new(
                "Lopsided",
                "Adhesion rises steadily around the circle",
                0.5,
                [0.2, 0.35, 0.5, 0.65, 0.8, 0.95, 1.1, 1.25, 1.4, 1.55, 1.7, 1.85],
            ),
        ];
    }

    /// Default presets directory under the user config dir
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("dla-worker").join("presets"))
    }

    /// Load user presets from disk, skipping unreadable files
    fn load_user_presets(&mut self) {
        let Some(dir) = &self.dir else {
            return;
        };
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "json") {
                match fs::read_to_string(&path)
                    .map_err(|e| e.to_string())
                    .and_then(|content| {
                        serde_json::from_str::<Preset>(&content).map_err(|e| e.to_string())
                    }) {
                    Ok(preset) => self.user.push(preset),
                    Err(err) => log::warn!("skipping preset {}: {}", path.display(), err),
                }
            }
        }
    }

    fn preset_path(dir: &Path, name: &str) -> PathBuf {
        let filename = name
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect::<String>();
        dir.join(format!("{}.json", filename))
    }

    /// Save a preset to disk
    pub fn save_preset(&mut self, preset: Preset) -> Result<PathBuf, String> {
        let dir = self.dir.as_ref().ok_or("Could not determine config directory")?;

        fs::create_dir_all(dir)
            .map_err(|e| format!("Failed to create presets directory: {}", e))?;

        let path = Self::preset_path(dir, &preset.name);
        let json = serde_json::to_string_pretty(&preset)
            .map_err(|e| format!("Failed to serialize preset: {}", e))?;
        fs::write(&path, json).map_err(|e| format!("Failed to write preset file: {}", e))?;

        match self.user.iter_mut().find(|p| p.name == preset.name) {
            Some(existing) => *existing = preset,
            None => self.user.push(preset),
        }

        Ok(path)
    }

    /// Delete a user preset
    pub fn delete_preset(&mut self, name: &str) -> Result<(), String> {
        let dir = self.dir.as_ref().ok_or("Could not determine config directory")?;

        if let Some(pos) = self.user.iter().position(|p| p.name == name) {
            self.user.remove(pos);
        }

        let path = Self::preset_path(dir, name);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| format!("Failed to delete preset file: {}", e))?;
        }

        Ok(())
    }

    /// Get all presets (builtin + user)
    pub fn all_presets(&self) -> impl Iterator<Item = &Preset> {
        self.builtin.iter().chain(self.user.iter())
    }

    /// Find a preset by name
    pub fn find(&self, name: &str) -> Option<&Preset> {
        self.all_presets().find(|p| p.name.eq_ignore_ascii_case(name))
    }
}
