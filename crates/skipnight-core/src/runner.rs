//! Tick loop and the thread-safe hand-off into it.
//!
//! The [`VoteEngine`] is single-threaded: it must only be touched from the
//! tick loop. Callers on other tasks (a chat listener, a bed event hook)
//! push work through a cloneable [`TickHandle`]; the work is applied at the
//! start of the next [`TickLoop::perform_one_tick`], before the engine's own
//! scheduled tasks run. Each submitted event yields a [`Completion`] that
//! resolves once the event has been applied.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info};

use crate::engine::{TickSummary, VoteEngine};
use crate::error::VoteError;
use crate::event::{Outcome, VoteEvent};
use crate::host::WorldHost;
use crate::messaging::Messenger;

/// What the engine answered to one event.
pub type EventResult = Result<Outcome, VoteError>;

/// Arbitrary work on the engine queued for the tick thread (host world
/// changes, configuration reloads).
pub type EngineJob<H, M> = Box<dyn FnOnce(&mut VoteEngine<H, M>) + Send>;

/// Errors of the hand-off between tasks and the tick loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RunnerError {
    /// The tick loop is gone; nothing will apply the work.
    #[error("tick loop has shut down")]
    Closed,

    /// The tick loop dropped the event without answering.
    #[error("event was dropped before it was applied")]
    Dropped,
}

/// Work waiting for the tick thread.
enum Request<H, M> {
    Event {
        event: VoteEvent,
        reply: oneshot::Sender<EventResult>,
    },
    Job(EngineJob<H, M>),
}

/// Cloneable sender of work into a [`TickLoop`].
pub struct TickHandle<H, M> {
    tx: mpsc::UnboundedSender<Request<H, M>>,
}

impl<H, M> Clone for TickHandle<H, M> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<H, M> std::fmt::Debug for TickHandle<H, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickHandle")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl<H, M> TickHandle<H, M> {
    /// Queue an event for the next tick.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Closed`] if the tick loop no longer exists.
    pub fn submit(&self, event: VoteEvent) -> Result<Completion, RunnerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Request::Event { event, reply })
            .map_err(|_| RunnerError::Closed)?;
        Ok(Completion { rx })
    }

    /// Queue work on the engine for the next tick, in order with events.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Closed`] if the tick loop no longer exists.
    pub fn with_engine(
        &self,
        job: impl FnOnce(&mut VoteEngine<H, M>) + Send + 'static,
    ) -> Result<(), RunnerError> {
        self.tx
            .send(Request::Job(Box::new(job)))
            .map_err(|_| RunnerError::Closed)
    }
}

/// Pending answer to a submitted event.
#[derive(Debug)]
pub struct Completion {
    rx: oneshot::Receiver<EventResult>,
}

impl Completion {
    /// The answer, if the event has been applied yet.
    ///
    /// Lets a tick-driven caller poll between ticks instead of awaiting.
    pub fn try_result(&mut self) -> Option<Result<EventResult, RunnerError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(Ok(result)),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(RunnerError::Dropped)),
        }
    }

    /// Wait until the event has been applied.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Dropped`] if the tick loop went away first.
    pub async fn wait(self) -> Result<EventResult, RunnerError> {
        self.rx.await.map_err(|_| RunnerError::Dropped)
    }
}

/// Callback invoked after each tick completes.
pub trait TickCallback: Send {
    /// Called with the summary of the tick that just ran.
    fn on_tick(&mut self, summary: &TickSummary);
}

/// A no-op tick callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary) {}
}

/// Owner of the engine and consumer of queued work.
#[derive(Debug)]
pub struct TickLoop<H, M> {
    engine: VoteEngine<H, M>,
    rx: mpsc::UnboundedReceiver<Request<H, M>>,
}

impl<H: WorldHost, M: Messenger> TickLoop<H, M> {
    /// Wrap an engine, returning the loop and the first handle into it.
    pub fn new(engine: VoteEngine<H, M>) -> (Self, TickHandle<H, M>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { engine, rx }, TickHandle { tx })
    }

    /// The engine.
    pub const fn engine(&self) -> &VoteEngine<H, M> {
        &self.engine
    }

    /// Mutable access to the engine, for callers already on the tick thread.
    pub const fn engine_mut(&mut self) -> &mut VoteEngine<H, M> {
        &mut self.engine
    }

    /// Apply all queued work, then run one engine tick.
    pub fn perform_one_tick(&mut self) -> TickSummary {
        let mut applied: usize = 0;
        while let Ok(request) = self.rx.try_recv() {
            match request {
                Request::Event { event, reply } => {
                    let result = self.engine.dispatch(event);
                    if reply.send(result).is_err() {
                        debug!("event submitter stopped waiting");
                    }
                }
                Request::Job(job) => job(&mut self.engine),
            }
            applied = applied.saturating_add(1);
        }
        let summary = self.engine.tick();
        if applied > 0 || !summary.resolutions.is_empty() {
            debug!(
                tick = summary.tick,
                applied,
                resolutions = summary.resolutions.len(),
                "tick"
            );
        }
        summary
    }

    /// Run `count` ticks back to back, returning the summary of each.
    pub fn perform_ticks(&mut self, count: u64) -> Vec<TickSummary> {
        (0..count).map(|_| self.perform_one_tick()).collect()
    }

    /// Tick on a fixed interval until `shutdown` turns true or its sender
    /// is dropped. Returns the number of ticks run.
    pub async fn run(
        &mut self,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
        callback: &mut dyn TickCallback,
    ) -> u64 {
        let mut total_ticks: u64 = 0;
        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!(
            interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            "Tick loop starting"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    let summary = self.perform_one_tick();
                    total_ticks = total_ticks.saturating_add(1);
                    callback.on_tick(&summary);
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!(total_ticks, tick = self.engine.now(), "Tick loop stopped");
        total_ticks
    }
}
