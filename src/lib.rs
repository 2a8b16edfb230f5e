//! Reactor Trainer Library
//!
//! Headless core of an arcade-style reactor training simulator: tick-based
//! thermal/power physics, damage accrual, level progression and alarm
//! classification, plus the timer plumbing and Tauri IPC surface that drive it.

pub mod alarms;
pub mod config;
pub mod driver;
pub mod events;
pub mod history;
pub mod physics;
pub mod reactor;

#[cfg(feature = "desktop")]
pub mod commands;

pub use alarms::{AlarmReport, CoolantStatus, ReactorStatus};
pub use config::{Balance, BalancePreset, ConfigError, SimulationConfig, Timing};
pub use events::ReactorEvent;
pub use reactor::{
    CommandError, Phase, ReactorSimulator, ReactorSnapshot, ReactorState, ScramTicket, TickOutcome,
};

#[cfg(feature = "desktop")]
pub use commands::SimulatorState;
