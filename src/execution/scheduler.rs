use chrono::Utc;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};

use super::{CycleOutcome, LoopState, TradingEngine};
use crate::api::ExchangeGateway;

/// Drives the engine on a fixed period, first cycle immediately
pub struct Scheduler<G> {
    engine: TradingEngine<G>,
    period: Duration,
    state: LoopState,
}

impl<G: ExchangeGateway> Scheduler<G> {
    pub fn new(engine: TradingEngine<G>, period: Duration) -> Self {
        Self {
            engine,
            period,
            state: LoopState::new(),
        }
    }

    /// Run a single cycle against the wall clock
    pub async fn tick(&mut self) -> CycleOutcome {
        let outcome = self.engine.run_cycle(&mut self.state, Utc::now()).await;
        tracing::info!(outcome = %outcome, "Cycle complete");
        outcome
    }

    /// Loop forever. Cycles never overlap; a slow cycle skips missed ticks.
    pub async fn run(&mut self) {
        let mut ticker = interval_at(Instant::now(), self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut cycle = 0u64;
        loop {
            ticker.tick().await;
            cycle += 1;
            tracing::debug!(cycle, "Starting trading cycle");
            self.tick().await;
        }
    }

    pub fn engine(&self) -> &TradingEngine<G> {
        &self.engine
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}
