use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;

use reactor_trainer_lib::driver::{self, ScramScheduler};
use reactor_trainer_lib::{ReactorEvent, ReactorSimulator, TickOutcome};

#[tokio::test(start_paused = true)]
async fn tick_loop_runs_on_fixed_period() {
    let sim = driver::shared(ReactorSimulator::default());
    let (tx, mut rx) = broadcast::channel(16);
    let start = Instant::now();

    let handle = tokio::spawn(driver::run_tick_loop(
        Arc::clone(&sim),
        tx,
        Duration::from_millis(400),
        Some(3),
    ));

    for expected in 1..=3u64 {
        let report = rx.recv().await.unwrap();
        assert_eq!(report.outcome, TickOutcome::Advanced);
        assert_eq!(report.snapshot.state.elapsed_ticks, expected);
    }
    handle.await.unwrap();

    assert!(start.elapsed() >= Duration::from_millis(1200));
    assert!(rx.recv().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn paused_simulator_still_reports() {
    let sim = driver::shared(ReactorSimulator::default());
    driver::lock(&sim).toggle_pause();
    let (tx, mut rx) = broadcast::channel(16);

    tokio::spawn(driver::run_tick_loop(
        Arc::clone(&sim),
        tx,
        Duration::from_millis(400),
        Some(2),
    ));

    for _ in 0..2 {
        let report = rx.recv().await.unwrap();
        assert_eq!(report.outcome, TickOutcome::Paused);
        assert_eq!(report.snapshot.status_label, "Paused");
        assert_eq!(report.snapshot.state.elapsed_ticks, 0);
    }
}

#[tokio::test(start_paused = true)]
async fn scram_cools_down_after_delay() {
    let sim = driver::shared(ReactorSimulator::default());
    let scheduler = ScramScheduler::new();

    scheduler.engage(&sim, Duration::from_millis(500));
    assert_eq!(driver::lock(&sim).state().control_rod_insertion, 100.0);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(driver::lock(&sim).state().temperature, 350.0);
    assert!(driver::lock(&sim).scram_pending());

    tokio::time::sleep(Duration::from_millis(200)).await;
    let mut guard = driver::lock(&sim);
    assert_eq!(guard.state().temperature, 250.0);
    assert_eq!(guard.drain_events(), vec![ReactorEvent::ScramEngaged]);
}

#[tokio::test(start_paused = true)]
async fn repeated_scram_completes_once() {
    let sim = driver::shared(ReactorSimulator::default());
    let scheduler = ScramScheduler::new();

    scheduler.engage(&sim, Duration::from_millis(500));
    tokio::time::sleep(Duration::from_millis(100)).await;
    scheduler.engage(&sim, Duration::from_millis(500));

    // The first timer would have fired at 500ms; it was superseded
    tokio::time::sleep(Duration::from_millis(450)).await;
    assert!(driver::lock(&sim).drain_events().is_empty());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(
        driver::lock(&sim).drain_events(),
        vec![ReactorEvent::ScramEngaged]
    );
}

#[tokio::test(start_paused = true)]
async fn cancelled_scram_never_lands() {
    let sim = driver::shared(ReactorSimulator::default());
    let scheduler = ScramScheduler::new();

    scheduler.engage(&sim, Duration::from_millis(500));
    scheduler.cancel();
    driver::lock(&sim).reset();

    tokio::time::sleep(Duration::from_secs(2)).await;
    let guard = driver::lock(&sim);
    assert_eq!(guard.state().temperature, 350.0);
    assert!(!guard.scram_pending());
}

#[tokio::test(start_paused = true)]
async fn ticks_keep_running_while_scram_is_pending() {
    let sim = driver::shared(ReactorSimulator::default());
    let (tx, mut rx) = broadcast::channel(16);
    let scheduler = ScramScheduler::new();

    tokio::spawn(driver::run_tick_loop(
        Arc::clone(&sim),
        tx,
        Duration::from_millis(400),
        Some(3),
    ));
    scheduler.engage(&sim, Duration::from_millis(500));

    // 400ms: rods in, cooling pulls 30°C per tick
    let first = rx.recv().await.unwrap();
    assert!((first.snapshot.state.temperature - 320.0).abs() < 1e-6);
    assert!(first.snapshot.scram_pending);
    assert!(first.events.is_empty());

    // 500ms: cool-down to 250°C, then the 800ms tick pulls another 30°C
    let second = rx.recv().await.unwrap();
    assert_eq!(second.events, vec![ReactorEvent::ScramEngaged]);
    assert!((second.snapshot.state.temperature - 220.0).abs() < 1e-6);
    assert!(!second.snapshot.scram_pending);

    let third = rx.recv().await.unwrap();
    assert_eq!(third.snapshot.state.elapsed_ticks, 3);
}
