//! Per-tick reactor formulas
//!
//! Deliberately simplified arcade feedback loop: heat is driven by rod
//! withdrawal, removed by coolant flow × cooling speed, and power falls off
//! with temperature and accumulated damage. Every function here is pure.

use crate::config::Balance;

/// Physical limits and thresholds
pub mod constants {
    pub const MIN_TEMPERATURE: f64 = 200.0; // [°C]
    pub const MAX_TEMPERATURE: f64 = 600.0; // [°C]
    pub const SAFE_MAX_TEMPERATURE: f64 = 400.0; // [°C] damage accrues above
    pub const NOMINAL_TEMPERATURE: f64 = 350.0; // [°C] full-efficiency point
    pub const MAX_HEAT: f64 = 1000.0; // Heat at zero rod insertion
    pub const MAX_COOLING: f64 = 800.0; // Cooling at full flow and speed
    pub const HEAT_GAIN: f64 = 0.1; // [°C] per unit of net heat
    pub const OVERHEAT_DAMAGE_RATE: f64 = 0.15; // [%] per °C above safe max
    pub const UNDERCOOL_DAMAGE_RATE: f64 = 0.05; // [%] per °C below minimum
    pub const MAX_POWER_MW: f64 = 1000.0;
    pub const EFFICIENCY_SPAN: f64 = 500.0; // [°C] over which efficiency drops to zero
    pub const MAX_DAMAGE: f64 = 100.0; // [%]
    pub const BASE_PRESSURE: f64 = 100.0; // [bar] at minimum temperature
    pub const PRESSURE_PER_DEGREE: f64 = 0.5; // [bar/°C]
}

use constants::*;

/// Clamp a percent-type quantity to [0, 100]
pub fn clamp_percent(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Reactivity factor: fraction of the core left unshielded by rods
pub fn reactivity(control_rod_insertion: f64) -> f64 {
    (100.0 - control_rod_insertion) / 100.0
}

pub fn heat_generated(reactivity: f64) -> f64 {
    reactivity * MAX_HEAT
}

pub fn cooling_effect(coolant_flow: f64, cooling_speed: f64) -> f64 {
    coolant_flow * cooling_speed / 10_000.0 * MAX_COOLING
}

/// Temperature after one tick of net heating, held inside the physical range
pub fn next_temperature(temperature: f64, heat: f64, cooling: f64) -> f64 {
    (temperature + (heat - cooling) * HEAT_GAIN).clamp(MIN_TEMPERATURE, MAX_TEMPERATURE)
}

/// Damage accrued during one tick spent at `temperature`
///
/// Accrual is proportional to the excursion outside the safe band, so a
/// reactor sitting just above 400 °C wears slowly while one pinned at the
/// 600 °C ceiling melts down within a handful of ticks.
pub fn damage_rate(temperature: f64) -> f64 {
    if temperature > SAFE_MAX_TEMPERATURE {
        (temperature - SAFE_MAX_TEMPERATURE) * OVERHEAT_DAMAGE_RATE
    } else if temperature < MIN_TEMPERATURE {
        (MIN_TEMPERATURE - temperature) * UNDERCOOL_DAMAGE_RATE
    } else {
        0.0
    }
}

/// Pressure is a pure function of temperature
pub fn pressure_for(temperature: f64) -> f64 {
    BASE_PRESSURE + (temperature - MIN_TEMPERATURE) * PRESSURE_PER_DEGREE
}

/// Coolant drained per tick for the given settings, never negative
pub fn coolant_consumption(balance: &Balance, coolant_flow: f64, cooling_speed: f64) -> f64 {
    let drain = balance.coolant_base_drain
        + coolant_flow * cooling_speed * balance.coolant_flow_speed_drain
        - cooling_speed * balance.coolant_speed_credit;
    drain.max(0.0)
}

/// Electrical output, floored at zero when the core runs far above nominal
pub fn power_output(reactivity: f64, temperature: f64, damage: f64) -> f64 {
    let efficiency = 1.0 - (temperature - NOMINAL_TEMPERATURE) / EFFICIENCY_SPAN;
    let integrity = 1.0 - damage / MAX_DAMAGE;
    (reactivity * MAX_POWER_MW * efficiency * integrity).clamp(0.0, MAX_POWER_MW)
}
