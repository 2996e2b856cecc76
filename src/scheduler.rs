use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{error, info, warn};
use reqwest::StatusCode;
use tokio::sync::watch;

use crate::config::Config;
use crate::error::Result;
use crate::fetch::PayloadSource;
use crate::records::merge_payload;
use crate::render::RowSink;

/// Source of the delay between refresh cycles.
pub trait Timer {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

impl Timer for TokioTimer {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Fetching,
}

/// What a single fetch, merge and render pass achieved.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleReport {
    Rendered {
        rows: usize,
        skipped_stock: usize,
        skipped_credit: usize,
        unmatched_credit: usize,
    },
    FetchFailed {
        status: Option<StatusCode>,
        error: String,
    },
    RenderFailed {
        rows: usize,
        error: String,
    },
}

impl CycleReport {
    pub fn is_rendered(&self) -> bool {
        matches!(self, CycleReport::Rendered { .. })
    }
}

/// Periodic fetch → merge → render driver.
///
/// The next cycle is only scheduled after the previous one finished, so there is
/// never more than one request in flight. Failures are logged and left to the
/// next cycle.
pub struct RefreshLoop<S, K, T = TokioTimer> {
    source: S,
    sink: K,
    timer: T,
    interval: Duration,
    state: LoopState,
    cycles: u64,
    config_updates: Option<watch::Receiver<Arc<Config>>>,
}

impl<S, K> RefreshLoop<S, K, TokioTimer>
where
    S: PayloadSource,
    K: RowSink,
{
    pub fn new(source: S, sink: K, interval: Duration) -> Self {
        Self::with_timer(source, sink, TokioTimer, interval)
    }
}

impl<S, K, T> RefreshLoop<S, K, T>
where
    S: PayloadSource,
    K: RowSink,
    T: Timer,
{
    pub fn with_timer(source: S, sink: K, timer: T, interval: Duration) -> Self {
        Self {
            source,
            sink,
            timer,
            interval,
            state: LoopState::Idle,
            cycles: 0,
            config_updates: None,
        }
    }

    /// Apply fetch settings and interval from `updates` whenever they change.
    pub fn with_config_updates(mut self, updates: watch::Receiver<Arc<Config>>) -> Self {
        self.config_updates = Some(updates);
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Run one fetch → merge → render pass.
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.apply_config_updates();

        self.cycles += 1;
        self.state = LoopState::Fetching;
        let started = Instant::now();
        info!("Refresh cycle {} started", self.cycles);

        let fetched = self.source.fetch().await;
        self.state = LoopState::Idle;

        let payload = match fetched {
            Ok(payload) => payload,
            Err(err) => {
                let status = err.status();
                let status_label = status
                    .map(|code| code.as_u16().to_string())
                    .unwrap_or_else(|| "none".to_string());
                error!(
                    "Refresh cycle {} failed (status {}): {}",
                    self.cycles, status_label, err
                );
                return CycleReport::FetchFailed {
                    status,
                    error: err.to_string(),
                };
            }
        };

        let merged = merge_payload(&payload);
        let rows = merged.rows.len();
        if let Err(err) = self.sink.render(&merged.rows) {
            error!("Refresh cycle {} could not render: {}", self.cycles, err);
            return CycleReport::RenderFailed {
                rows,
                error: err.to_string(),
            };
        }

        info!(
            "Refresh cycle {} rendered {} rows in {} ms",
            self.cycles,
            rows,
            started.elapsed().as_millis()
        );
        CycleReport::Rendered {
            rows,
            skipped_stock: merged.skipped_stock,
            skipped_credit: merged.skipped_credit,
            unmatched_credit: merged.unmatched_credit,
        }
    }

    /// Run exactly `count` cycles, waiting the interval between them but not after the last.
    pub async fn run_cycles(&mut self, count: usize) -> Vec<CycleReport> {
        let mut reports = Vec::with_capacity(count);
        for remaining in (0..count).rev() {
            reports.push(self.run_cycle().await);
            if remaining > 0 {
                self.timer.sleep(self.interval).await;
            }
        }
        reports
    }

    /// Run until `shutdown` turns `true` or its sender is dropped.
    ///
    /// Shutdown also interrupts a cycle that is still waiting on the server.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = self.run_cycle() => {}
                _ = shutdown_requested(&mut shutdown) => {
                    info!("Shutdown requested while a refresh cycle was running");
                    break;
                }
            }

            let delay = self.interval;
            info!("Next refresh in {}s", delay.as_secs());
            tokio::select! {
                _ = self.timer.sleep(delay) => {}
                _ = shutdown_requested(&mut shutdown) => break,
            }
        }

        self.state = LoopState::Idle;
        info!("Refresh loop stopped after {} cycles", self.cycles);
        Ok(())
    }

    fn apply_config_updates(&mut self) {
        let Some(updates) = self.config_updates.as_mut() else {
            return;
        };
        if !updates.has_changed().unwrap_or(false) {
            return;
        }

        let config = updates.borrow_and_update().clone();
        match self.source.reconfigure(&config.fetch) {
            Ok(()) => {
                self.interval = config.refresh_interval;
                info!(
                    "Applied new configuration; refresh interval {}s",
                    self.interval.as_secs()
                );
            }
            Err(err) => warn!("Keeping previous fetch settings: {}", err),
        }
    }
}

/// Resolves once the flag is `true` or the sender is gone.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
