//! # Runtime Module
//!
//! Cooperative dispatch loop of a field node.
//!
//! One interval tick drives three time-gated tasks, checked in order:
//!
//! 1. Button poll (identity debounce), every 200 ms by default
//! 2. Status display refresh, every 500 ms
//! 3. Telemetry send, every 500 ms
//!
//! Each due task runs to completion before the next is considered. The
//! send awaits its transport, so a slow HTTP push delays the following
//! ticks instead of overlapping them.

pub mod display;

use std::future::Future;
use std::sync::Arc;

use tokio::time::{interval, Duration, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::hal::ButtonInput;
use crate::identity::debounce::IdentityButtons;
use crate::identity::IdentityAssigner;
use crate::sampler::TelemetrySampler;
use crate::transport::TransportSender;
use display::{StatusDisplay, StatusLine};

/// Interval gate: due once at least `interval_ms` has elapsed since the
/// last run. The first check is always due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    interval_ms: u64,
    last_run_ms: Option<u64>,
}

impl Cadence {
    #[must_use]
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_run_ms: None,
        }
    }

    /// Returns true and records the run when the task is due at `now_ms`
    pub fn due(&mut self, now_ms: u64) -> bool {
        let due = match self.last_run_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.interval_ms,
        };
        if due {
            self.last_run_ms = Some(now_ms);
        }
        due
    }
}

struct ButtonTask {
    increment: Box<dyn ButtonInput>,
    decrement: Box<dyn ButtonInput>,
    state: IdentityButtons,
    cadence: Cadence,
}

struct DisplayTask {
    display: Box<dyn StatusDisplay>,
    cadence: Cadence,
}

struct SendTask {
    sender: TransportSender,
    cadence: Cadence,
}

/// The node's main loop and the tasks it drives
pub struct NodeRuntime {
    identity: Arc<IdentityAssigner>,
    sampler: Arc<TelemetrySampler>,
    buttons: Option<ButtonTask>,
    display: Option<DisplayTask>,
    send: Option<SendTask>,
    tick: Duration,
}

impl std::fmt::Debug for NodeRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRuntime")
            .field("buttons", &self.buttons.is_some())
            .field("display", &self.display.is_some())
            .field("send", &self.send.is_some())
            .field("tick", &self.tick)
            .finish()
    }
}

impl NodeRuntime {
    /// Runtime with no tasks; add them with the `with_*` builders
    pub fn new(
        identity: Arc<IdentityAssigner>,
        sampler: Arc<TelemetrySampler>,
        tick: Duration,
    ) -> Self {
        Self {
            identity,
            sampler,
            buttons: None,
            display: None,
            send: None,
            tick,
        }
    }

    /// Poll the identity buttons every `interval_ms`
    pub fn with_buttons(
        mut self,
        increment: Box<dyn ButtonInput>,
        decrement: Box<dyn ButtonInput>,
        state: IdentityButtons,
        interval_ms: u64,
    ) -> Self {
        self.buttons = Some(ButtonTask {
            increment,
            decrement,
            state,
            cadence: Cadence::new(interval_ms),
        });
        self
    }

    /// Refresh `display` every `interval_ms`
    pub fn with_display(mut self, display: Box<dyn StatusDisplay>, interval_ms: u64) -> Self {
        self.display = Some(DisplayTask {
            display,
            cadence: Cadence::new(interval_ms),
        });
        self
    }

    /// Send a reading every `interval_ms`
    pub fn with_sender(mut self, sender: TransportSender, interval_ms: u64) -> Self {
        self.send = Some(SendTask {
            sender,
            cadence: Cadence::new(interval_ms),
        });
        self
    }

    /// Run every task that is due at `now_ms` (milliseconds since start)
    pub async fn run_once(&mut self, now_ms: u64) {
        if let Some(task) = self.buttons.as_mut() {
            if task.cadence.due(now_ms) {
                let increment = read_button(task.increment.as_mut(), "increment");
                let decrement = read_button(task.decrement.as_mut(), "decrement");
                task.state.poll(increment, decrement, now_ms, &self.identity);
            }
        }

        if let Some(task) = self.display.as_mut() {
            if task.cadence.due(now_ms) {
                let node_id = self.identity.get();
                match self.sampler.read_blocking(node_id).await {
                    Ok(reading) => {
                        if let Err(e) = task.display.show(&StatusLine::new(node_id, &reading)) {
                            warn!("Display refresh failed: {}", e);
                        }
                    }
                    Err(e) => warn!("Sensor read for display failed: {}", e),
                }
            }
        }

        if let Some(task) = self.send.as_mut() {
            if task.cadence.due(now_ms) {
                task.sender.tick().await;
            }
        }
    }

    /// Tick until `shutdown` resolves
    pub async fn run_until<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let started = Instant::now();
        let mut ticker = interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(tick_ms = self.tick.as_millis() as u64, "Node runtime started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now_ms = started.elapsed().as_millis() as u64;
                    self.run_once(now_ms).await;
                }
                _ = &mut shutdown => {
                    info!("Node runtime stopping");
                    break;
                }
            }
        }
    }
}

fn read_button(button: &mut dyn ButtonInput, name: &str) -> Option<bool> {
    match button.read_level() {
        Ok(level) => Some(level),
        Err(e) => {
            debug!(button = name, "Button read failed: {}", e);
            None
        }
    }
}
