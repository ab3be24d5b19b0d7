use crate::settings::Settings;
use crate::walker::WalkParams;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete worker configuration for export/import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Version field for future compatibility
    pub version: u32,
    /// Spatial index cell size
    pub cell_size: f64,
    /// Radius of every particle
    pub particle_radius: f64,
    /// Spawn circle distance beyond the aggregate
    pub spawn_margin: f64,
    /// Kill circle distance beyond the aggregate
    pub kill_margin: f64,
    /// Random walk step length
    pub step_size: f64,
    /// Walk steps per scheduler batch
    pub steps_per_batch: usize,
    /// Adhesion settings the worker starts with
    pub settings: Settings,
    /// Fixed RNG seed; `None` seeds from the OS
    pub rng_seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            version: 1,
            cell_size: 8.0,
            particle_radius: 3.0,
            spawn_margin: 40.0,
            kill_margin: 80.0,
            step_size: 2.0,
            steps_per_batch: 50_000,
            settings: Settings::default(),
            rng_seed: None,
        }
    }
}

impl SimulationConfig {
    /// Export config to a JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;
        fs::write(path, json).map_err(|e| format!("Failed to write config file: {}", e))?;
        Ok(())
    }

    /// Import config from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let content =
            fs::read_to_string(path).map_err(|e| format!("Failed to read config file: {}", e))?;
        serde_json::from_str(&content).map_err(|e| format!("Failed to parse config file: {}", e))
    }

    /// Check that the geometry can actually run
    pub fn validate(&self) -> Result<(), String> {
        let positive = [
            ("cell_size", self.cell_size),
            ("particle_radius", self.particle_radius),
            ("step_size", self.step_size),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(format!("{} must be positive, got {}", name, value));
            }
        }
        if !(self.spawn_margin.is_finite() && self.spawn_margin >= 0.0) {
            return Err(format!(
                "spawn_margin must be non-negative, got {}",
                self.spawn_margin
            ));
        }
        if !(self.kill_margin.is_finite() && self.kill_margin > self.spawn_margin) {
            return Err(format!(
                "kill_margin ({}) must exceed spawn_margin ({})",
                self.kill_margin, self.spawn_margin
            ));
        }
        if self.steps_per_batch == 0 {
            return Err("steps_per_batch must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn walk_params(&self) -> WalkParams {
        WalkParams {
            particle_radius: self.particle_radius,
            spawn_margin: self.spawn_margin,
            kill_margin: self.kill_margin,
            step_size: self.step_size,
        }
    }
}
