//! Reactor Trainer - Desktop Entry Point
//!
//! Tauri application wrapping the headless simulator

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use reactor_trainer_lib::commands::*;
use reactor_trainer_lib::SimulationConfig;

fn main() {
    // Initialize logging
    env_logger::init();

    let config = SimulationConfig::load();

    // Build and run Tauri application
    tauri::Builder::default()
        .plugin(tauri_plugin_shell::init())
        .manage(SimulatorState::new(config))
        .invoke_handler(tauri::generate_handler![
            get_reactor_state,
            simulation_step,
            simulation_run,
            simulation_realtime,
            set_control_rods,
            set_cooling_speed,
            set_coolant_flow,
            scram,
            recharge_coolant,
            toggle_pause,
            advance_level,
            reset_simulation,
            get_history_chart,
        ])
        .run(tauri::generate_context!())
        .expect("Error while running Reactor Trainer");
}
