//! Alarm classification
//!
//! Pure functions of reactor state. The reactor status follows a strict
//! priority order (first match wins); the coolant status is classified
//! independently.

use serde::{Deserialize, Serialize};

use crate::reactor::ReactorState;

pub const CRITICAL_TEMPERATURE: f64 = 450.0; // [°C]
pub const CRITICAL_DAMAGE: f64 = 80.0; // [%]
pub const DAMAGED_THRESHOLD: f64 = 60.0; // [%]
pub const WARNING_TEMPERATURE: f64 = 400.0; // [°C]
pub const WARNING_PRESSURE: f64 = 180.0; // [bar]
pub const LOW_COOLANT: f64 = 30.0; // [%]
pub const COOLANT_CRITICAL: f64 = 20.0; // [%]
pub const COOLANT_WARNING: f64 = 40.0; // [%]

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningReason {
    Damaged,
    OutOfSafeRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "level", content = "reason")]
pub enum ReactorStatus {
    Normal,
    Warning(WarningReason),
    Critical,
}

impl ReactorStatus {
    pub fn label(self) -> &'static str {
        match self {
            ReactorStatus::Normal => "Normal",
            ReactorStatus::Warning(WarningReason::Damaged) => "Damaged",
            ReactorStatus::Warning(WarningReason::OutOfSafeRange) => "Out of safe range",
            ReactorStatus::Critical => "Critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoolantStatus {
    Normal,
    Warning,
    Critical,
}

/// Result of one classification pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmReport {
    pub reactor: ReactorStatus,
    pub coolant: CoolantStatus,
}

impl Default for AlarmReport {
    fn default() -> Self {
        Self {
            reactor: ReactorStatus::Normal,
            coolant: CoolantStatus::Normal,
        }
    }
}

impl AlarmReport {
    /// Reactor status label as shown to the operator; pause overrides it
    pub fn display_label(&self, paused: bool) -> &'static str {
        if paused {
            "Paused"
        } else {
            self.reactor.label()
        }
    }

    pub fn any_critical(&self) -> bool {
        self.reactor == ReactorStatus::Critical || self.coolant == CoolantStatus::Critical
    }
}

pub fn classify_reactor(
    temperature: f64,
    pressure: f64,
    coolant_level: f64,
    damage: f64,
) -> ReactorStatus {
    if temperature > CRITICAL_TEMPERATURE || damage > CRITICAL_DAMAGE {
        ReactorStatus::Critical
    } else if damage > DAMAGED_THRESHOLD {
        ReactorStatus::Warning(WarningReason::Damaged)
    } else if temperature > WARNING_TEMPERATURE
        || pressure > WARNING_PRESSURE
        || coolant_level < LOW_COOLANT
    {
        ReactorStatus::Warning(WarningReason::OutOfSafeRange)
    } else {
        ReactorStatus::Normal
    }
}

pub fn classify_coolant(coolant_level: f64) -> CoolantStatus {
    if coolant_level < COOLANT_CRITICAL {
        CoolantStatus::Critical
    } else if coolant_level < COOLANT_WARNING {
        CoolantStatus::Warning
    } else {
        CoolantStatus::Normal
    }
}

pub fn classify(state: &ReactorState) -> AlarmReport {
    AlarmReport {
        reactor: classify_reactor(
            state.temperature,
            state.pressure,
            state.coolant_level,
            state.damage,
        ),
        coolant: classify_coolant(state.coolant_level),
    }
}

/// Visual damage tier of the core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageTier {
    Intact,
    Damaged,
    Severe,
}

/// Core glow hint for renderers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoreGlow {
    pub intensity: f64, // 0 at 200 °C, 1 at 600 °C
    pub tier: DamageTier,
}

pub fn core_glow(temperature: f64, damage: f64) -> CoreGlow {
    let tier = if damage > 75.0 {
        DamageTier::Severe
    } else if damage > 50.0 {
        DamageTier::Damaged
    } else {
        DamageTier::Intact
    };

    CoreGlow {
        intensity: ((temperature - 200.0) / 400.0).clamp(0.0, 1.0),
        tier,
    }
}
