//! Messages exchanged between the host and the simulation worker.
//!
//! The JSON shapes are the stable contract with rendering and audio
//! consumers:
//!
//! ```text
//! in:  {"type":"start"} | {"type":"stop"} | {"type":"reset"}
//!      {"type":"updateSettings","settings":{"baseAdhesion":0.4,"dirMult":[...12]}}
//! out: {"type":"particles","data":[{"x":..,"y":..,"index":..}],"stats":{"stuckCount":..,"maxRadius":..}}
//! ```

use crate::aggregate::{Particle, Stats};
use crate::settings::SettingsUpdate;
use serde::{Deserialize, Serialize};

/// Host to worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    /// Begin or resume; ignored if already running
    Start,
    /// Pause, keeping all state
    Stop,
    /// Stop, clear and reseed
    Reset,
    /// Merge the supplied settings fields
    UpdateSettings {
        #[serde(default)]
        settings: Option<SettingsUpdate>,
    },
}

impl Command {
    /// Parse one JSON command, `None` for anything unrecognized
    pub fn parse(text: &str) -> Option<Self> {
        match serde_json::from_str(text) {
            Ok(command) => Some(command),
            Err(err) => {
                log::debug!("ignoring malformed command {:?}: {}", text, err);
                None
            }
        }
    }

    pub fn update_settings(settings: SettingsUpdate) -> Self {
        Command::UpdateSettings {
            settings: Some(settings),
        }
    }
}

/// Worker to host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    /// Newly stuck particles in stick order plus the stats after the last one
    Particles { data: Vec<Particle>, stats: Stats },
}

impl Event {
    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string(self).map_err(|e| format!("Failed to serialize event: {}", e))
    }
}
