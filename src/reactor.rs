//! Reactor Simulation State
//!
//! This module contains the reactor state aggregate and the simulator that
//! owns it. The simulator is passive: a driver calls [`ReactorSimulator::tick`]
//! on a fixed cadence, forwards operator commands, then reads a snapshot and
//! drains the pending notifications for rendering.
//!
//! Every field is clamped back into its declared range after each mutation,
//! so the snapshot handed to a frontend is always valid.

use serde::{Deserialize, Serialize};

use crate::alarms::{self, AlarmReport, CoreGlow};
use crate::config::Balance;
use crate::events::ReactorEvent;
use crate::history::{History, HistorySample};
use crate::physics::{self, constants::*};

/// Initial and per-level default values
pub mod defaults {
    pub const TEMPERATURE: f64 = 350.0; // [°C]
    pub const PRESSURE: f64 = 155.0; // [bar]
    pub const COOLANT_LEVEL: f64 = 85.0; // [%]
    pub const CONTROL_ROD_INSERTION: f64 = 70.0; // [%]
    pub const COOLING_SPEED: f64 = 50.0; // [%]
    pub const COOLANT_FLOW: f64 = 75.0; // [%]
    pub const POWER_OUTPUT: f64 = 750.0; // [MW]
    pub const ENERGY_PER_LEVEL: f64 = 1000.0;
    pub const SCRAM_TEMPERATURE: f64 = 250.0; // [°C] after the delayed SCRAM effect
}

/// Complete reactor state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactorState {
    // Thermal
    pub temperature: f64,   // [°C], 200-600
    pub pressure: f64,      // [bar], derived from temperature
    pub coolant_level: f64, // [%]

    // Operator inputs
    pub control_rod_insertion: f64, // [%]
    pub cooling_speed: f64,         // [%]
    pub coolant_flow: f64,          // [%]

    // Output and wear
    pub power_output: f64, // [MW], 0-1000
    pub damage: f64,       // [%]

    // Progression
    pub current_level: u32,
    pub level_target: f64,
    pub total_power_generated: f64,
    pub level_complete: bool,

    // Status
    pub is_operating: bool, // false after meltdown until reset
    pub is_paused: bool,
    pub has_shown_empty_alert: bool,
    pub elapsed_ticks: u64,

    pub history: History,
}

impl Default for ReactorState {
    fn default() -> Self {
        Self {
            temperature: defaults::TEMPERATURE,
            pressure: defaults::PRESSURE,
            coolant_level: defaults::COOLANT_LEVEL,
            control_rod_insertion: defaults::CONTROL_ROD_INSERTION,
            cooling_speed: defaults::COOLING_SPEED,
            coolant_flow: defaults::COOLANT_FLOW,
            power_output: defaults::POWER_OUTPUT,
            damage: 0.0,
            current_level: 1,
            level_target: level_target_for(1),
            total_power_generated: 0.0,
            level_complete: false,
            is_operating: true,
            is_paused: false,
            has_shown_empty_alert: false,
            elapsed_ticks: 0,
            history: History::new(),
        }
    }
}

/// Cumulative energy needed to complete `level`
pub fn level_target_for(level: u32) -> f64 {
    defaults::ENERGY_PER_LEVEL * f64::from(level)
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

impl ReactorState {
    /// Bring every field back inside its invariant range
    fn normalize(&mut self) {
        self.temperature = finite_or(self.temperature, defaults::TEMPERATURE)
            .clamp(MIN_TEMPERATURE, MAX_TEMPERATURE);
        self.pressure = physics::pressure_for(self.temperature);
        self.coolant_level = physics::clamp_percent(finite_or(self.coolant_level, 0.0));
        self.control_rod_insertion = physics::clamp_percent(finite_or(
            self.control_rod_insertion,
            defaults::CONTROL_ROD_INSERTION,
        ));
        self.cooling_speed =
            physics::clamp_percent(finite_or(self.cooling_speed, defaults::COOLING_SPEED));
        self.coolant_flow =
            physics::clamp_percent(finite_or(self.coolant_flow, defaults::COOLANT_FLOW));
        self.power_output = finite_or(self.power_output, 0.0).clamp(0.0, MAX_POWER_MW);
        self.damage = finite_or(self.damage, 0.0).clamp(0.0, MAX_DAMAGE);
        self.current_level = self.current_level.max(1);
        self.level_target = level_target_for(self.current_level);
        self.total_power_generated = finite_or(self.total_power_generated, 0.0).max(0.0);
        if self.damage >= MAX_DAMAGE {
            self.is_operating = false;
        }
        if !self.is_operating || self.level_complete {
            self.power_output = 0.0;
        }
        self.history.truncate_to_capacity();
    }

    pub fn phase(&self) -> Phase {
        if !self.is_operating {
            Phase::Meltdown
        } else if self.level_complete {
            Phase::LevelComplete
        } else {
            Phase::Running
        }
    }

    /// Level progress in percent, capped at 100
    pub fn progress_percent(&self) -> f64 {
        (self.total_power_generated / self.level_target * 100.0).min(100.0)
    }
}

/// Level / meltdown state machine position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Running,
    /// Generation frozen until the operator advances
    LevelComplete,
    /// Terminal until reset
    Meltdown,
}

/// What a call to [`ReactorSimulator::tick`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickOutcome {
    Advanced,
    Paused,
    Halted,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("level {level} is not complete yet")]
    LevelNotComplete { level: u32 },

    #[error("reactor destroyed by meltdown, reset required")]
    ReactorDestroyed,
}

/// Handle for the delayed half of an emergency SCRAM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScramTicket(u64);

/// Read-only view handed to frontends after every tick or command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactorSnapshot {
    pub state: ReactorState,
    pub phase: Phase,
    pub alarms: AlarmReport,
    pub status_label: String,
    pub progress_percent: f64,
    pub glow: CoreGlow,
    pub scram_pending: bool,
}

/// Reactor simulation engine
#[derive(Debug, Clone)]
pub struct ReactorSimulator {
    state: ReactorState,
    balance: Balance,
    outbox: Vec<ReactorEvent>,
    scram_serial: u64,
    pending_scram: Option<u64>,
    scram_held: bool, // delay elapsed while paused
}

impl Default for ReactorSimulator {
    fn default() -> Self {
        Self::new(Balance::default())
    }
}

impl ReactorSimulator {
    pub fn new(balance: Balance) -> Self {
        Self {
            state: ReactorState::default(),
            balance,
            outbox: Vec::new(),
            scram_serial: 0,
            pending_scram: None,
            scram_held: false,
        }
    }

    /// Resume from a previously captured state
    pub fn from_state(balance: Balance, mut state: ReactorState) -> Self {
        state.normalize();
        Self {
            state,
            ..Self::new(balance)
        }
    }

    pub fn state(&self) -> &ReactorState {
        &self.state
    }

    pub fn balance(&self) -> &Balance {
        &self.balance
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn alarms(&self) -> AlarmReport {
        alarms::classify(&self.state)
    }

    pub fn scram_pending(&self) -> bool {
        self.pending_scram.is_some()
    }

    /// Get current state snapshot
    pub fn snapshot(&self) -> ReactorSnapshot {
        let alarms = self.alarms();
        ReactorSnapshot {
            state: self.state.clone(),
            phase: self.phase(),
            alarms,
            status_label: alarms.display_label(self.state.is_paused).to_string(),
            progress_percent: self.state.progress_percent(),
            glow: alarms::core_glow(self.state.temperature, self.state.damage),
            scram_pending: self.scram_pending(),
        }
    }

    /// Take all notifications emitted since the last call
    pub fn drain_events(&mut self) -> Vec<ReactorEvent> {
        std::mem::take(&mut self.outbox)
    }

    pub fn set_control_rod_insertion(&mut self, percent: f64) {
        self.state.control_rod_insertion =
            sanitize_percent(percent, self.state.control_rod_insertion);
    }

    pub fn set_cooling_speed(&mut self, percent: f64) {
        self.state.cooling_speed = sanitize_percent(percent, self.state.cooling_speed);
    }

    pub fn set_coolant_flow(&mut self, percent: f64) {
        self.state.coolant_flow = sanitize_percent(percent, self.state.coolant_flow);
    }

    /// Advance the simulation by one fixed step
    pub fn tick(&mut self) -> TickOutcome {
        if self.state.is_paused {
            return TickOutcome::Paused;
        }
        if !self.state.is_operating {
            return TickOutcome::Halted;
        }

        self.step_physics();
        self.evaluate_progress();
        if self.state.is_operating {
            self.check_coolant_depletion();
        }

        let state = &mut self.state;
        state.history.push(HistorySample {
            temperature: state.temperature,
            pressure: state.pressure,
            power: state.power_output,
        });
        state.elapsed_ticks += 1;

        log::debug!(
            "tick {}: T={:.1}°C P={:.1}bar coolant={:.1}% power={:.0}MW damage={:.1}%",
            state.elapsed_ticks,
            state.temperature,
            state.pressure,
            state.coolant_level,
            state.power_output,
            state.damage,
        );

        TickOutcome::Advanced
    }

    /// Run up to `steps` ticks, returning how many actually advanced
    pub fn run_ticks(&mut self, steps: usize) -> usize {
        let mut advanced = 0;
        for _ in 0..steps {
            if self.tick() != TickOutcome::Advanced {
                break;
            }
            advanced += 1;
        }
        advanced
    }

    fn step_physics(&mut self) {
        let balance = &self.balance;
        let state = &mut self.state;

        let reactivity = physics::reactivity(state.control_rod_insertion);
        let heat = physics::heat_generated(reactivity);
        let cooling = physics::cooling_effect(state.coolant_flow, state.cooling_speed);

        state.temperature = physics::next_temperature(state.temperature, heat, cooling);
        state.damage =
            (state.damage + physics::damage_rate(state.temperature)).clamp(0.0, MAX_DAMAGE);
        state.pressure = physics::pressure_for(state.temperature);

        let drain = physics::coolant_consumption(balance, state.coolant_flow, state.cooling_speed);
        state.coolant_level = physics::clamp_percent(state.coolant_level - drain);

        state.power_output = physics::power_output(reactivity, state.temperature, state.damage);
        if state.level_complete {
            state.power_output = 0.0;
        } else if state.power_output > 0.0 {
            state.total_power_generated += state.power_output * balance.energy_rate;
        }
    }

    /// Meltdown takes priority over level completion
    fn evaluate_progress(&mut self) {
        let state = &mut self.state;

        if state.damage >= MAX_DAMAGE {
            state.is_operating = false;
            state.power_output = 0.0;
            self.pending_scram = None;
            self.scram_held = false;
            log::warn!("Meltdown at level {}", state.current_level);
            self.outbox.push(ReactorEvent::MeltdownOccurred {
                level: state.current_level,
            });
            return;
        }

        if !state.level_complete && state.total_power_generated >= state.level_target {
            state.level_complete = true;
            state.power_output = 0.0;
            log::info!(
                "Level {} complete with {:.1}% damage",
                state.current_level,
                state.damage
            );
            self.outbox.push(ReactorEvent::LevelCompleted {
                level: state.current_level,
                damage: state.damage,
                progress: state.total_power_generated,
                target: state.level_target,
            });
        }
    }

    fn check_coolant_depletion(&mut self) {
        let state = &mut self.state;

        if state.coolant_level > 0.0 {
            state.has_shown_empty_alert = false;
            return;
        }
        if state.has_shown_empty_alert {
            return;
        }

        state.has_shown_empty_alert = true;
        state.temperature = (state.temperature + self.balance.empty_coolant_penalty)
            .clamp(MIN_TEMPERATURE, MAX_TEMPERATURE);
        state.pressure = physics::pressure_for(state.temperature);
        log::warn!("Coolant depleted, core temperature now {:.1}°C", state.temperature);
        self.outbox.push(ReactorEvent::CoolantDepleted);
    }

    /// Initiate emergency SCRAM
    ///
    /// Rods drop immediately; the cool-down lands later through
    /// [`ReactorSimulator::complete_scram`]. A newer SCRAM supersedes any
    /// ticket still outstanding.
    pub fn emergency_scram(&mut self) -> ScramTicket {
        self.state.control_rod_insertion = 100.0;
        self.scram_serial += 1;
        self.pending_scram = Some(self.scram_serial);
        self.scram_held = false;
        log::info!("SCRAM initiated, rods fully inserted");
        ScramTicket(self.scram_serial)
    }

    /// Apply the delayed SCRAM effect; returns false for stale tickets
    ///
    /// While paused the effect is held and lands when the simulation resumes.
    pub fn complete_scram(&mut self, ticket: ScramTicket) -> bool {
        if self.pending_scram != Some(ticket.0) {
            log::debug!("Ignoring superseded SCRAM ticket {}", ticket.0);
            return false;
        }
        if self.state.is_paused {
            log::debug!("SCRAM ticket {} held until resume", ticket.0);
            self.scram_held = true;
            return false;
        }
        self.land_scram()
    }

    fn land_scram(&mut self) -> bool {
        self.pending_scram = None;
        self.scram_held = false;

        if !self.state.is_operating {
            return false;
        }

        self.state.temperature = defaults::SCRAM_TEMPERATURE;
        self.state.pressure = physics::pressure_for(self.state.temperature);
        self.state.power_output = 0.0;
        log::info!("SCRAM engaged, core cooled to {:.0}°C", self.state.temperature);
        self.outbox.push(ReactorEvent::ScramEngaged);
        true
    }

    pub fn recharge_coolant(&mut self) {
        let state = &mut self.state;

        if state.coolant_level >= 100.0 {
            self.outbox.push(ReactorEvent::CoolantAlreadyFull);
            return;
        }

        state.coolant_level = (state.coolant_level + self.balance.recharge_amount).min(100.0);
        state.has_shown_empty_alert = false;
        state.total_power_generated =
            (state.total_power_generated - self.balance.recharge_cost).max(0.0);
        log::info!("Coolant recharged to {:.1}%", state.coolant_level);
        self.outbox.push(ReactorEvent::CoolantRecharged {
            new_level: state.coolant_level,
            cost: self.balance.recharge_cost,
        });
    }

    /// Flip pause; returns the new paused flag
    pub fn toggle_pause(&mut self) -> bool {
        self.state.is_paused = !self.state.is_paused;
        log::info!(
            "Simulation {}",
            if self.state.is_paused { "paused" } else { "resumed" }
        );
        if !self.state.is_paused && self.scram_held {
            self.land_scram();
        }
        self.state.is_paused
    }

    pub fn advance_level(&mut self) -> Result<(), CommandError> {
        let state = &mut self.state;

        if !state.is_operating {
            return Err(CommandError::ReactorDestroyed);
        }
        if !state.level_complete {
            return Err(CommandError::LevelNotComplete {
                level: state.current_level,
            });
        }

        state.current_level += 1;
        state.level_target = level_target_for(state.current_level);
        state.total_power_generated = 0.0;
        state.level_complete = false;
        state.damage = (state.damage - self.balance.level_repair).max(0.0);
        state.has_shown_empty_alert = false;
        state.control_rod_insertion = defaults::CONTROL_ROD_INSERTION;
        state.cooling_speed = defaults::COOLING_SPEED;
        state.coolant_flow = defaults::COOLANT_FLOW;

        log::info!(
            "Advanced to level {} (target {} MW)",
            state.current_level,
            state.level_target
        );
        self.outbox.push(ReactorEvent::LevelAdvanced {
            new_level: state.current_level,
            new_target: state.level_target,
        });
        Ok(())
    }

    /// Reset simulation to initial state
    pub fn reset(&mut self) {
        self.state = ReactorState::default();
        self.pending_scram = None;
        self.scram_held = false;
        log::info!("Reactor reset to initial state");
    }
}

/// Clamp operator input to [0, 100]; NaN leaves the current value in place
fn sanitize_percent(value: f64, current: f64) -> f64 {
    if value.is_nan() {
        current
    } else {
        physics::clamp_percent(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_values() {
        let sim = ReactorSimulator::default();
        let state = sim.state();
        assert_eq!(state.temperature, 350.0);
        assert_eq!(state.pressure, 155.0);
        assert_eq!(state.coolant_level, 85.0);
        assert_eq!(state.power_output, 750.0);
        assert_eq!(state.level_target, 1000.0);
        assert_eq!(sim.phase(), Phase::Running);
        assert!(state.history.is_empty());
    }

    #[test]
    fn test_inputs_are_clamped() {
        let mut sim = ReactorSimulator::default();
        sim.set_control_rod_insertion(150.0);
        sim.set_cooling_speed(-20.0);
        sim.set_coolant_flow(f64::NAN);
        assert_eq!(sim.state().control_rod_insertion, 100.0);
        assert_eq!(sim.state().cooling_speed, 0.0);
        assert_eq!(sim.state().coolant_flow, 75.0);
    }

    #[test]
    fn test_pause_is_a_no_op() {
        let mut sim = ReactorSimulator::default();
        sim.toggle_pause();
        let before = sim.state().clone();
        assert_eq!(sim.tick(), TickOutcome::Paused);
        assert_eq!(sim.state(), &before);
        assert_eq!(sim.snapshot().status_label, "Paused");
    }

    #[test]
    fn test_stale_scram_ticket_is_ignored() {
        let mut sim = ReactorSimulator::default();
        let first = sim.emergency_scram();
        let second = sim.emergency_scram();
        assert!(!sim.complete_scram(first));
        assert!(sim.complete_scram(second));
        assert_eq!(sim.state().temperature, 250.0);
        assert_eq!(sim.drain_events(), vec![ReactorEvent::ScramEngaged]);
    }

    #[test]
    fn test_scram_due_while_paused_lands_on_resume() {
        let mut sim = ReactorSimulator::default();
        let ticket = sim.emergency_scram();
        sim.toggle_pause();

        assert!(!sim.complete_scram(ticket));
        assert_eq!(sim.tick(), TickOutcome::Paused);
        assert_eq!(sim.state().temperature, 350.0);
        assert!(sim.scram_pending());
        assert!(sim.drain_events().is_empty());

        sim.toggle_pause();
        assert_eq!(sim.state().temperature, 250.0);
        assert!(!sim.scram_pending());
        assert_eq!(sim.drain_events(), vec![ReactorEvent::ScramEngaged]);
    }

    #[test]
    fn test_held_scram_superseded_by_new_scram() {
        let mut sim = ReactorSimulator::default();
        let first = sim.emergency_scram();
        sim.toggle_pause();
        sim.complete_scram(first);
        let second = sim.emergency_scram();

        sim.toggle_pause();
        assert_eq!(sim.state().temperature, 350.0);
        assert!(sim.complete_scram(second));
        assert_eq!(sim.state().temperature, 250.0);
    }

    #[test]
    fn test_reset_cancels_pending_scram() {
        let mut sim = ReactorSimulator::default();
        let ticket = sim.emergency_scram();
        sim.reset();
        assert!(!sim.scram_pending());
        assert!(!sim.complete_scram(ticket));
        assert_eq!(sim.state().control_rod_insertion, 70.0);
    }

    #[test]
    fn test_advance_rejected_while_running() {
        let mut sim = ReactorSimulator::default();
        assert_eq!(
            sim.advance_level(),
            Err(CommandError::LevelNotComplete { level: 1 })
        );
    }

    #[test]
    fn test_from_state_normalizes() {
        let state = ReactorState {
            temperature: 900.0,
            coolant_level: -5.0,
            damage: 140.0,
            current_level: 0,
            ..ReactorState::default()
        };
        let sim = ReactorSimulator::from_state(Balance::standard(), state);
        let state = sim.state();
        assert_eq!(state.temperature, 600.0);
        assert_eq!(state.pressure, 300.0);
        assert_eq!(state.coolant_level, 0.0);
        assert_eq!(state.damage, 100.0);
        assert_eq!(state.current_level, 1);
        assert_eq!(sim.phase(), Phase::Meltdown);
    }
}
