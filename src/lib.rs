//! Diffusion-limited aggregation running on a dedicated worker thread.
//!
//! A single walker diffuses around a growing aggregate, sticking with a
//! direction-dependent probability. The host talks to the worker only through
//! [`protocol::Command`] and [`protocol::Event`] messages.

pub mod adhesion;
pub mod aggregate;
pub mod config;
pub mod presets;
pub mod protocol;
pub mod scheduler;
pub mod settings;
pub mod simulation;
pub mod spatial;
pub mod walker;
pub mod worker;

pub use aggregate::{Particle, Stats};
pub use config::SimulationConfig;
pub use protocol::{Command, Event};
pub use settings::{Settings, SettingsUpdate};
pub use simulation::Simulation;
pub use worker::{SimulationWorker, Worker};
