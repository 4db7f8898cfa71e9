use crate::{
    TradeForgeError,
    checkpoint::{Checkpoint, CheckpointMeta},
    clock::SimClock,
    replay::{controller::ReplayController, limits::ReplayLimits, stats::ReplayStats},
};
use std::path::PathBuf;
use tradeforge_data::{
    event::MergedEvent,
    merge::{CursoredEvents, TimelineMerger},
};
use tradeforge_execution::{engine::Engine, report::ExecutionReport};
use tracing::{info, warn};

/// Cooperative pause/resume controller.
pub mod controller;

/// Replay termination limits.
pub mod limits;

/// Replay counters.
pub mod stats;

/// Observer of the replay's merged events and host-facing reports.
///
/// All methods default to no-ops; implement only what the host consumes.
pub trait ReplaySink {
    fn on_event(&mut self, _event: &MergedEvent) {}
    fn on_report(&mut self, _report: &ExecutionReport) {}
}

impl ReplaySink for () {}

/// Auto-checkpoint configuration: one checkpoint written atomically per pause transition.
#[derive(Debug, Clone)]
pub struct AutoCheckpoint {
    pub path: PathBuf,
    pub meta: CheckpointMeta,
}

/// Drives the merged timeline through a [`SimClock`] into the matching [`Engine`].
///
/// For each event the driver derives a wall deadline from the event's sim timestamp (anchored
/// at the first emitted event), awaits the clock, forwards the event, and relays the engine's
/// reports to the sink. Limits are checked before each emission; the first violation emits one
/// synthetic `End` report and terminates cleanly. Between events the driver cooperates with its
/// [`ReplayController`]; sim time is never skewed by wall pauses.
#[derive(Debug)]
pub struct ReplayDriver<T, D, C> {
    merger: TimelineMerger<T, D>,
    engine: Engine,
    clock: C,
    limits: ReplayLimits,
    controller: ReplayController,
    auto_checkpoint: Option<AutoCheckpoint>,
    stats: ReplayStats,
}

impl<T, D, C> ReplayDriver<T, D, C>
where
    T: CursoredEvents,
    D: CursoredEvents,
    C: SimClock,
{
    /// Construct a new [`ReplayDriver`].
    pub fn new(
        merger: TimelineMerger<T, D>,
        engine: Engine,
        clock: C,
        limits: ReplayLimits,
        controller: ReplayController,
    ) -> Self {
        Self {
            merger,
            engine,
            clock,
            limits,
            controller,
            auto_checkpoint: None,
            stats: ReplayStats::default(),
        }
    }

    /// Write a checkpoint to `auto.path` on every pause.
    pub fn with_auto_checkpoint(mut self, auto: AutoCheckpoint) -> Self {
        self.auto_checkpoint = Some(auto);
        self
    }

    pub fn stats(&self) -> &ReplayStats {
        &self.stats
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    pub fn controller(&self) -> ReplayController {
        self.controller.clone()
    }

    /// Capture a [`Checkpoint`] of the current replay position and engine state.
    pub fn capture(&self, meta: CheckpointMeta) -> Checkpoint {
        Checkpoint::capture(
            meta,
            self.merger.current_cursor(),
            self.merger.start_state(),
            &self.engine,
        )
    }

    /// Run the replay to completion (or limit breach), relaying events and reports to `sink`.
    ///
    /// Returns the final stats on clean termination; reader and engine failures surface as the
    /// error after a terminal `End` report carrying the description.
    pub async fn run<S>(&mut self, sink: &mut S) -> Result<ReplayStats, TradeForgeError>
    where
        S: ReplaySink,
    {
        info!(clock = %self.clock.desc(), "replay starting");
        let mut anchor: Option<(u64, u64)> = None;

        loop {
            if self.controller.is_paused() {
                self.write_auto_checkpoint();
                self.controller.wait_until_resumed().await;
                // re-anchor so the backlog is not burst through after a long pause
                anchor = None;
            }

            // peek before consuming: a limit-violating event must stay unconsumed so the
            // merger's cursors keep pointing at it for checkpoints
            let next_ts = match self.merger.peek_ts() {
                Ok(Some(next_ts)) => next_ts,
                Ok(None) => {
                    sink.on_report(&ExecutionReport::end(self.stats.sim_last_ts.unwrap_or(0)));
                    info!(events = self.stats.events_out, "replay complete");
                    return Ok(self.stats);
                }
                Err(error) => {
                    sink.on_report(&ExecutionReport::end_with_error(
                        self.stats.sim_last_ts.unwrap_or(0),
                        error.to_string(),
                    ));
                    return Err(error.into());
                }
            };

            let now_wall = self.clock.now_wall_ms();
            if let Some(breach) = self.limits.violated(&self.stats, next_ts, now_wall) {
                info!(?breach, events = self.stats.events_out, "replay limit reached");
                sink.on_report(&ExecutionReport::end(
                    self.stats.sim_last_ts.unwrap_or(next_ts),
                ));
                return Ok(self.stats);
            }

            let event = match self.merger.next() {
                Some(Ok(event)) => event,
                Some(Err(error)) => {
                    sink.on_report(&ExecutionReport::end_with_error(
                        self.stats.sim_last_ts.unwrap_or(0),
                        error.to_string(),
                    ));
                    return Err(error.into());
                }
                None => {
                    sink.on_report(&ExecutionReport::end(self.stats.sim_last_ts.unwrap_or(0)));
                    return Ok(self.stats);
                }
            };

            let deadline = match anchor {
                Some((sim_anchor, wall_anchor)) => {
                    wall_anchor + event.ts().saturating_sub(sim_anchor)
                }
                None => {
                    anchor = Some((event.ts(), now_wall));
                    now_wall
                }
            };
            self.clock.tick_until(deadline).await;

            sink.on_event(&event);
            let reports = match self.engine.process(&event) {
                Ok(reports) => reports,
                Err(error) => {
                    sink.on_report(&ExecutionReport::end_with_error(
                        event.ts(),
                        error.to_string(),
                    ));
                    return Err(error.into());
                }
            };
            for report in &reports {
                sink.on_report(report);
            }

            self.stats.record(event.ts(), self.clock.now_wall_ms());
        }
    }

    fn write_auto_checkpoint(&self) {
        let Some(auto) = &self.auto_checkpoint else {
            return;
        };

        let checkpoint = self.capture(auto.meta.clone());
        match checkpoint.save_atomic(&auto.path) {
            Ok(()) => info!(path = %auto.path.display(), "checkpoint written on pause"),
            Err(error) => warn!(%error, "auto-checkpoint failed"),
        }
    }
}
