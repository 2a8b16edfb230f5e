//! Timer-driven scheduling around the simulator
//!
//! The simulator itself never waits. This module owns the wall-clock side:
//! the fixed-period tick loop, the deferred half of a SCRAM, and the
//! accumulator used when a frontend drives the cadence itself.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::events::ReactorEvent;
use crate::reactor::{ReactorSimulator, ReactorSnapshot, ScramTicket, TickOutcome};

pub type SharedSimulator = Arc<Mutex<ReactorSimulator>>;
pub type ReportTx = broadcast::Sender<TickReport>;

/// Upper bound on ticks run for a single real-time request
pub const MAX_TICKS_PER_CALL: usize = 1000;

pub fn shared(simulator: ReactorSimulator) -> SharedSimulator {
    Arc::new(Mutex::new(simulator))
}

/// Lock the shared simulator, recovering the state from a poisoned lock
pub fn lock(sim: &SharedSimulator) -> MutexGuard<'_, ReactorSimulator> {
    sim.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Everything a frontend needs after one scheduled tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickReport {
    pub outcome: TickOutcome,
    pub snapshot: ReactorSnapshot,
    pub events: Vec<ReactorEvent>,
}

/// Tick once and collect the resulting snapshot and notifications
pub fn tick_and_report(sim: &SharedSimulator) -> TickReport {
    let mut guard = lock(sim);
    let outcome = guard.tick();
    let report = TickReport {
        outcome,
        events: guard.drain_events(),
        snapshot: guard.snapshot(),
    };
    if outcome == TickOutcome::Advanced && report.snapshot.alarms.any_critical() {
        let state = &report.snapshot.state;
        log::warn!(
            "Critical alarm at tick {}: T={:.1}°C coolant={:.1}% damage={:.1}%",
            state.elapsed_ticks,
            state.temperature,
            state.coolant_level,
            state.damage,
        );
    }
    report
}

/// Call `tick()` every `period` and broadcast a report per tick
///
/// A zero period runs as fast as the runtime allows. The loop ends after
/// `max_ticks` calls when given, otherwise it runs until the task is dropped.
pub async fn run_tick_loop(
    sim: SharedSimulator,
    report_tx: ReportTx,
    period: Duration,
    max_ticks: Option<u64>,
) {
    let mut interval = if period.is_zero() {
        None
    } else {
        let mut iv = tokio::time::interval_at(Instant::now() + period, period);
        iv.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Some(iv)
    };

    let mut ticks = 0u64;
    loop {
        if let Some(ref mut iv) = interval {
            iv.tick().await;
        } else {
            tokio::task::yield_now().await;
        }

        let report = tick_and_report(&sim);
        // No subscribers is fine; the simulation keeps running headless
        let _ = report_tx.send(report);

        ticks += 1;
        if max_ticks.is_some_and(|max| ticks >= max) {
            break;
        }
    }
}

/// Owns the deferred cool-down of an emergency SCRAM
///
/// Only one completion is outstanding at a time: engaging again aborts the
/// previous timer, and the simulator ignores superseded tickets anyway.
#[derive(Debug, Default)]
pub struct ScramScheduler {
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl ScramScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert rods now and schedule the cool-down after `delay`
    ///
    /// Must be called from within a tokio runtime.
    pub fn engage(&self, sim: &SharedSimulator, delay: Duration) -> ScramTicket {
        let ticket = lock(sim).emergency_scram();

        let sim = Arc::clone(sim);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            lock(&sim).complete_scram(ticket);
        });

        let previous = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
        ticket
    }

    /// Abort the outstanding cool-down, if any
    pub fn cancel(&self) {
        let pending = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = pending {
            handle.abort();
        }
    }
}

/// Converts elapsed real time into whole simulation ticks
///
/// At `time_speed = 1` one tick runs per tick period of real time; fractional
/// remainders carry over to the next call so slow speeds still advance.
#[derive(Debug, Clone)]
pub struct TickAccumulator {
    tick_period: f64, // [s]
    accumulated: f64, // [s]
}

impl TickAccumulator {
    pub fn new(tick_period: Duration) -> Self {
        Self {
            tick_period: tick_period.as_secs_f64(),
            accumulated: 0.0,
        }
    }

    /// Number of ticks due after `delta_real_time` seconds at `time_speed`
    pub fn advance(&mut self, delta_real_time: f64, time_speed: f64) -> usize {
        let sim_time_delta = delta_real_time * time_speed;
        if !sim_time_delta.is_finite() || sim_time_delta <= 0.0 || self.tick_period <= 0.0 {
            return 0;
        }

        self.accumulated += sim_time_delta;
        let steps_to_run = (self.accumulated / self.tick_period).floor() as usize;
        self.accumulated -= (steps_to_run as f64) * self.tick_period;

        steps_to_run.min(MAX_TICKS_PER_CALL)
    }

    pub fn reset(&mut self) {
        self.accumulated = 0.0;
    }
}
