//! Tauri commands for the reactor trainer
//!
//! These commands are exposed to the frontend via Tauri's IPC mechanism.
//! Every command answers with a fresh snapshot plus the notifications it
//! produced, so the frontend never has to poll for dialogs separately.

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tauri::State;

use crate::config::{SimulationConfig, Timing};
use crate::driver::{self, ScramScheduler, SharedSimulator, TickAccumulator};
use crate::events::ReactorEvent;
use crate::history::COLUMNS;
use crate::reactor::{ReactorSimulator, ReactorSnapshot};

/// Simulation state wrapper for Tauri
pub struct SimulatorState {
    pub simulator: SharedSimulator,
    pub scram: ScramScheduler,
    pub accumulator: Mutex<TickAccumulator>,
    pub timing: Timing,
}

impl SimulatorState {
    pub fn new(config: SimulationConfig) -> Self {
        let tick_period = Duration::from_millis(config.timing.tick_period_ms);
        Self {
            simulator: driver::shared(ReactorSimulator::new(config.balance)),
            scram: ScramScheduler::new(),
            accumulator: Mutex::new(TickAccumulator::new(tick_period)),
            timing: config.timing,
        }
    }
}

/// Response for every state-changing command
#[derive(Serialize, Deserialize)]
pub struct SimulationResponse {
    pub snapshot: ReactorSnapshot,
    pub events: Vec<ReactorEvent>,
}

fn respond(simulator: &mut ReactorSimulator) -> SimulationResponse {
    SimulationResponse {
        events: simulator.drain_events(),
        snapshot: simulator.snapshot(),
    }
}

/// Get current reactor state
#[tauri::command]
pub fn get_reactor_state(state: State<SimulatorState>) -> ReactorSnapshot {
    driver::lock(&state.simulator).snapshot()
}

/// Perform one simulation step
#[tauri::command]
pub fn simulation_step(state: State<SimulatorState>) -> SimulationResponse {
    let mut simulator = driver::lock(&state.simulator);
    simulator.tick();
    respond(&mut simulator)
}

/// Run multiple simulation steps
#[tauri::command]
pub fn simulation_run(state: State<SimulatorState>, steps: usize) -> SimulationResponse {
    let mut simulator = driver::lock(&state.simulator);
    simulator.run_ticks(steps.min(driver::MAX_TICKS_PER_CALL));
    respond(&mut simulator)
}

/// Run real-time simulation
/// Takes delta_real_time (seconds since last call) and time_speed multiplier
#[tauri::command(rename_all = "camelCase")]
pub fn simulation_realtime(
    state: State<SimulatorState>,
    delta_real_time: f64,
    time_speed: f64,
) -> SimulationResponse {
    let steps_to_run = state
        .accumulator
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .advance(delta_real_time, time_speed);

    let mut simulator = driver::lock(&state.simulator);
    for _ in 0..steps_to_run {
        simulator.tick();
    }
    respond(&mut simulator)
}

#[tauri::command]
pub fn set_control_rods(state: State<SimulatorState>, position: f64) -> ReactorSnapshot {
    let mut simulator = driver::lock(&state.simulator);
    simulator.set_control_rod_insertion(position);
    simulator.snapshot()
}

#[tauri::command]
pub fn set_cooling_speed(state: State<SimulatorState>, speed: f64) -> ReactorSnapshot {
    let mut simulator = driver::lock(&state.simulator);
    simulator.set_cooling_speed(speed);
    simulator.snapshot()
}

#[tauri::command]
pub fn set_coolant_flow(state: State<SimulatorState>, flow: f64) -> ReactorSnapshot {
    let mut simulator = driver::lock(&state.simulator);
    simulator.set_coolant_flow(flow);
    simulator.snapshot()
}

/// Initiate emergency SCRAM; the cool-down lands after the configured delay
#[tauri::command]
pub async fn scram(state: State<'_, SimulatorState>) -> Result<SimulationResponse, String> {
    let delay = Duration::from_millis(state.timing.scram_delay_ms);
    state.scram.engage(&state.simulator, delay);
    Ok(respond(&mut driver::lock(&state.simulator)))
}

#[tauri::command]
pub fn recharge_coolant(state: State<SimulatorState>) -> SimulationResponse {
    let mut simulator = driver::lock(&state.simulator);
    simulator.recharge_coolant();
    respond(&mut simulator)
}

#[tauri::command]
pub fn toggle_pause(state: State<SimulatorState>) -> SimulationResponse {
    let mut simulator = driver::lock(&state.simulator);
    simulator.toggle_pause();
    respond(&mut simulator)
}

#[tauri::command]
pub fn advance_level(state: State<SimulatorState>) -> Result<SimulationResponse, String> {
    let mut simulator = driver::lock(&state.simulator);
    simulator.advance_level().map_err(|err| err.to_string())?;
    Ok(respond(&mut simulator))
}

/// Reset simulation to initial state
#[tauri::command]
pub fn reset_simulation(state: State<SimulatorState>) -> SimulationResponse {
    state.scram.cancel();
    state
        .accumulator
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .reset();

    let mut simulator = driver::lock(&state.simulator);
    simulator.reset();
    respond(&mut simulator)
}

/// Trend chart series normalised to [0, 1]
#[derive(Serialize)]
pub struct HistoryChart {
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<f64>>,
}

#[tauri::command]
pub fn get_history_chart(state: State<SimulatorState>) -> HistoryChart {
    let chart = driver::lock(&state.simulator).state().history.chart_series();
    HistoryChart {
        columns: COLUMNS.to_vec(),
        rows: chart.outer_iter().map(|row| row.to_vec()).collect(),
    }
}
