//! Headless reactor trainer
//!
//! Drives the simulator on its fixed cadence and prints one JSON object per
//! tick to stdout. Optional scripted operator behaviour stands in for the
//! desktop frontend: scheduled SCRAM, automatic coolant recharges, and
//! answering level-complete and meltdown prompts.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};

use reactor_trainer_lib::driver::{self, ScramScheduler, SharedSimulator, TickReport};
use reactor_trainer_lib::{
    BalancePreset, Phase, ReactorEvent, ReactorSimulator, SimulationConfig, TickOutcome,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Preset {
    Standard,
    Accelerated,
}

impl From<Preset> for BalancePreset {
    fn from(preset: Preset) -> Self {
        match preset {
            Preset::Standard => BalancePreset::Standard,
            Preset::Accelerated => BalancePreset::Accelerated,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "reactor-headless",
    version,
    about = "Run the reactor trainer without a UI and emit a JSONL trace"
)]
struct Args {
    /// Number of scheduler ticks to run
    #[arg(long, default_value_t = 500)]
    ticks: u64,

    /// Tick period in milliseconds (0 = as fast as possible); defaults to the config
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Balance preset, overriding the config file
    #[arg(value_enum, long)]
    preset: Option<Preset>,

    /// Explicit config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Initial control rod insertion (%)
    #[arg(long)]
    rods: Option<f64>,

    /// Initial cooling speed (%)
    #[arg(long)]
    cooling: Option<f64>,

    /// Initial coolant flow (%)
    #[arg(long)]
    flow: Option<f64>,

    /// Trigger an emergency SCRAM once this many ticks have elapsed
    #[arg(long)]
    scram_at: Option<u64>,

    /// Recharge coolant whenever it drops below this level (%)
    #[arg(long)]
    recharge_below: Option<f64>,

    /// Advance to the next level as soon as one is complete
    #[arg(long)]
    auto_advance: bool,

    /// Restart after a meltdown instead of stopping
    #[arg(long)]
    auto_restart: bool,
}

/// Scripted operator behaviour taken from the command line
#[derive(Debug, Clone, Default)]
struct Script {
    scram_at: Option<u64>,
    recharge_below: Option<f64>,
    auto_advance: bool,
    auto_restart: bool,
}

impl From<&Args> for Script {
    fn from(args: &Args) -> Self {
        Self {
            scram_at: args.scram_at,
            recharge_below: args.recharge_below,
            auto_advance: args.auto_advance,
            auto_restart: args.auto_restart,
        }
    }
}

struct Operator {
    script: Script,
    sim: SharedSimulator,
    scram: ScramScheduler,
    scram_delay: Duration,
}

impl Operator {
    fn react(&self, report: &TickReport) -> ControlFlow<()> {
        let state = &report.snapshot.state;

        if report.outcome == TickOutcome::Advanced
            && self.script.scram_at == Some(state.elapsed_ticks)
        {
            self.scram.engage(&self.sim, self.scram_delay);
        }

        if let Some(threshold) = self.script.recharge_below {
            if report.snapshot.phase == Phase::Running && state.coolant_level < threshold {
                driver::lock(&self.sim).recharge_coolant();
            }
        }

        for event in &report.events {
            log::info!("{}", event.message().replace('\n', " | "));
            if matches!(event, ReactorEvent::LevelCompleted { .. }) && self.script.auto_advance {
                if let Err(err) = driver::lock(&self.sim).advance_level() {
                    log::warn!("Could not advance level: {}", err);
                }
            }
            if event.requires_response() {
                if !self.script.auto_restart {
                    return ControlFlow::Break(());
                }
                self.scram.cancel();
                driver::lock(&self.sim).reset();
            }
        }
        ControlFlow::Continue(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_path(path)?,
        None => SimulationConfig::load(),
    };
    if let Some(preset) = args.preset {
        config.balance = BalancePreset::from(preset).balance();
    }

    let mut simulator = ReactorSimulator::new(config.balance.clone());
    if let Some(rods) = args.rods {
        simulator.set_control_rod_insertion(rods);
    }
    if let Some(cooling) = args.cooling {
        simulator.set_cooling_speed(cooling);
    }
    if let Some(flow) = args.flow {
        simulator.set_coolant_flow(flow);
    }

    let sim = driver::shared(simulator);
    let period = Duration::from_millis(args.tick_ms.unwrap_or(config.timing.tick_period_ms));
    let (report_tx, mut report_rx) = broadcast::channel(1024);
    let ticker = tokio::spawn(driver::run_tick_loop(
        Arc::clone(&sim),
        report_tx,
        period,
        Some(args.ticks),
    ));

    let operator = Operator {
        script: Script::from(&args),
        sim,
        scram: ScramScheduler::new(),
        scram_delay: Duration::from_millis(config.timing.scram_delay_ms),
    };

    loop {
        match report_rx.recv().await {
            Ok(report) => {
                println!("{}", serde_json::to_string(&report)?);
                if operator.react(&report).is_break() {
                    log::warn!("Meltdown, stopping (pass --auto-restart to keep going)");
                    ticker.abort();
                    break;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                log::warn!("Trace fell behind, {} reports dropped", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reactor_trainer_lib::ReactorState;

    fn operator(script: Script, state: ReactorState) -> Operator {
        Operator {
            script,
            sim: driver::shared(ReactorSimulator::from_state(Default::default(), state)),
            scram: ScramScheduler::new(),
            scram_delay: Duration::from_millis(500),
        }
    }

    fn near_meltdown() -> ReactorState {
        ReactorState {
            temperature: 600.0,
            damage: 99.0,
            ..ReactorState::default()
        }
    }

    #[test]
    fn test_recharges_below_threshold() {
        let script = Script {
            recharge_below: Some(90.0),
            ..Script::default()
        };
        let op = operator(script, ReactorState::default());
        let report = driver::tick_and_report(&op.sim);
        let before = report.snapshot.state.coolant_level;

        assert!(op.react(&report).is_continue());
        assert!((driver::lock(&op.sim).state().coolant_level - (before + 10.0)).abs() < 1e-9);
    }

    #[test]
    fn test_auto_advance_on_level_complete() {
        let script = Script {
            auto_advance: true,
            ..Script::default()
        };
        let state = ReactorState {
            total_power_generated: 999.0,
            ..ReactorState::default()
        };
        let op = operator(script, state);
        let report = driver::tick_and_report(&op.sim);

        assert!(op.react(&report).is_continue());
        let guard = driver::lock(&op.sim);
        assert_eq!(guard.state().current_level, 2);
        assert_eq!(guard.phase(), Phase::Running);
    }

    #[test]
    fn test_meltdown_stops_without_auto_restart() {
        let op = operator(Script::default(), near_meltdown());
        let report = driver::tick_and_report(&op.sim);

        assert!(op.react(&report).is_break());
        assert_eq!(driver::lock(&op.sim).phase(), Phase::Meltdown);
    }

    #[test]
    fn test_meltdown_restarts_with_auto_restart() {
        let script = Script {
            auto_restart: true,
            ..Script::default()
        };
        let op = operator(script, near_meltdown());
        let report = driver::tick_and_report(&op.sim);

        assert!(op.react(&report).is_continue());
        let guard = driver::lock(&op.sim);
        assert_eq!(guard.phase(), Phase::Running);
        assert_eq!(guard.state(), &ReactorState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scram_at_scheduled_tick() {
        let script = Script {
            scram_at: Some(2),
            ..Script::default()
        };
        let op = operator(script, ReactorState::default());

        let first = driver::tick_and_report(&op.sim);
        assert!(op.react(&first).is_continue());
        assert!(!driver::lock(&op.sim).scram_pending());

        let second = driver::tick_and_report(&op.sim);
        assert!(op.react(&second).is_continue());
        assert_eq!(driver::lock(&op.sim).state().control_rod_insertion, 100.0);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(driver::lock(&op.sim).state().temperature, 250.0);
    }
}
