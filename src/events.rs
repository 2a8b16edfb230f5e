//! Notifications emitted by the simulator for the presentation layer

use serde::{Deserialize, Serialize};

/// Discrete event a frontend renders as a dialog or banner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReactorEvent {
    LevelCompleted {
        level: u32,
        damage: f64,   // [%]
        progress: f64, // Energy generated this level
        target: f64,
    },
    /// Terminal; the frontend is expected to answer with a reset
    MeltdownOccurred { level: u32 },
    ScramEngaged,
    CoolantRecharged { new_level: f64, cost: f64 },
    CoolantAlreadyFull,
    /// Fires once per depletion episode
    CoolantDepleted,
    LevelAdvanced { new_level: u32, new_target: f64 },
}

impl ReactorEvent {
    pub fn message(&self) -> String {
        match self {
            ReactorEvent::LevelCompleted {
                level,
                damage,
                progress,
                target,
            } => format!(
                "Level {} complete!\nDamage: {}%\nTarget: {}/{} MW",
                level,
                damage.round(),
                progress.round(),
                target
            ),
            ReactorEvent::MeltdownOccurred { level } => {
                format!("MELTDOWN!\nLevel: {}\nRestart?", level)
            }
            ReactorEvent::ScramEngaged => "SCRAM engaged - reactor cooling down".to_string(),
            ReactorEvent::CoolantRecharged { new_level, cost } => format!(
                "Coolant recharged: {}%\nCost: {} MW of energy",
                new_level.round(),
                cost
            ),
            ReactorEvent::CoolantAlreadyFull => "Coolant already at maximum".to_string(),
            ReactorEvent::CoolantDepleted => {
                "Out of coolant! The reactor will overheat.".to_string()
            }
            ReactorEvent::LevelAdvanced {
                new_level,
                new_target,
            } => format!("Level {}!\nTarget: {} MW", new_level, new_target),
        }
    }

    /// Whether the frontend must collect a decision from the operator
    pub fn requires_response(&self) -> bool {
        matches!(self, ReactorEvent::MeltdownOccurred { .. })
    }
}
