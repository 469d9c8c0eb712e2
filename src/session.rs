//! Session controller
//!
//! Owns the two squares, the event log and the pending-tick handle, and moves
//! between Idle, Running, Stopped and Collided in response to commands and
//! ticks. Exactly one mutator exists; a tick always finishes (including all of
//! its log writes) before the next one is scheduled.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::TICK_DT;
use crate::persistence::{LogRecord, LogStore, StoreWarning};
use crate::platform::{BoundsProvider, ManualScheduler, PendingTick, Renderer, Scheduler, TickHandle};
use crate::settings::{Settings, SinkMode};
use crate::sim::{Bounds, StepReport, World, step};
use crate::sink::{RemoteSink, SinkKind};
use crate::view::LogView;

pub const MSG_PLACED: &str = "Squares placed at new start positions";
pub const MSG_MOVED: &str = "Squares moved one step";
pub const MSG_OPEN: &str = "Button \"play\" pressed";
pub const MSG_CLOSE: &str = "Button \"close\" pressed";
pub const MSG_START: &str = "Button \"start\" pressed. Animation started";
pub const MSG_STOP: &str = "Button \"stop\" pressed. Animation stopped";
pub const MSG_RELOAD: &str = "Button \"reload\" pressed. Squares reset";

const MSG_STORAGE_FULL: &str = "WARNING: log storage is full. Persistence suspended.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Squares placed (or waiting for valid bounds), not moving
    Idle,
    /// Tick loop active
    Running,
    /// Halted by the user, can resume
    Stopped,
    /// Squares touched; only reload leaves this state
    Collided,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("bounds {width}x{height} cannot hold a square of size {size}")]
    InvalidBounds { width: f32, height: f32, size: f32 },

    #[error("squares cannot be placed while the session is running")]
    Running,
}

/// Which commands currently have an effect (button visibility)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controls {
    pub start: bool,
    pub stop: bool,
    pub reload: bool,
}

pub struct Session<S: Scheduler> {
    state: SessionState,
    world: World,
    log: LogStore,
    scheduler: S,
    bounds: Box<dyn BoundsProvider>,
    renderer: Box<dyn Renderer>,
    sink: Option<Box<dyn RemoteSink>>,
    sink_mode: SinkMode,
    rng: Pcg32,
    tick_interval_ms: u32,
    pending: Option<TickHandle>,
    visible: bool,
    ticks: u64,
    status: String,
}

impl<S: Scheduler> Session<S> {
    pub fn new(
        settings: &Settings,
        log: LogStore,
        scheduler: S,
        bounds: Box<dyn BoundsProvider>,
        renderer: Box<dyn Renderer>,
    ) -> Self {
        let seed = settings.seed.unwrap_or_else(rand::random);
        log::info!("Session created (seed {seed}, {} records loaded)", log.len());
        Self {
            state: SessionState::Idle,
            world: World::new(
                settings.square_size,
                Vec2::from(settings.primary_velocity),
                Vec2::from(settings.secondary_velocity),
            ),
            log,
            scheduler,
            bounds,
            renderer,
            sink: None,
            sink_mode: settings.sink_mode,
            rng: Pcg32::seed_from_u64(seed),
            tick_interval_ms: settings.tick_interval_ms,
            pending: None,
            visible: false,
            ticks: 0,
            status: String::new(),
        }
    }

    /// Attach a remote sink; forwarding follows the configured [`SinkMode`]
    pub fn with_sink(mut self, sink: Box<dyn RemoteSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    // === Commands ===

    /// Show the animation area. A fresh (idle) run gets new start positions.
    pub fn open(&mut self) {
        self.visible = true;
        if self.state == SessionState::Idle {
            self.place_or_defer();
        }
        self.record(MSG_OPEN);
    }

    /// Hide the animation area, halting a running loop, and return the log.
    pub fn close(&mut self) -> LogView {
        self.visible = false;
        if self.state == SessionState::Running {
            self.cancel_pending();
            self.state = SessionState::Stopped;
        }
        self.record(MSG_CLOSE);

        if self.sink_mode == SinkMode::FinalOnClose {
            let records = self.log.drain();
            self.forward(&records, SinkKind::Final);
        }
        LogView::new(self.log.drain())
    }

    /// Begin the tick loop. Returns false if the command had no effect.
    pub fn start(&mut self) -> bool {
        if !matches!(self.state, SessionState::Idle | SessionState::Stopped) {
            return false;
        }
        if !self.world.placed && !self.place_or_defer() {
            return false;
        }

        self.state = SessionState::Running;
        self.record(MSG_START);
        self.schedule_next();
        true
    }

    /// Halt the tick loop. Stopping a non-running session is a no-op.
    pub fn stop(&mut self) -> bool {
        if self.state != SessionState::Running {
            return false;
        }
        self.cancel_pending();
        self.state = SessionState::Stopped;
        self.record(MSG_STOP);
        true
    }

    /// Reset to Idle with fresh start positions. Ignored while running.
    pub fn reload(&mut self) -> bool {
        if self.state == SessionState::Running {
            return false;
        }
        self.cancel_pending();
        // A deferred placement must not let the next start reuse old positions
        self.world.placed = false;
        self.place_or_defer();
        self.state = SessionState::Idle;
        self.record(MSG_RELOAD);
        true
    }

    /// Place both squares against the current bounds.
    ///
    /// Hosts may call this again after a resize when a previous placement was
    /// deferred. Refused while the tick loop is running.
    pub fn place_bodies(&mut self) -> Result<(), SessionError> {
        if self.state == SessionState::Running {
            return Err(SessionError::Running);
        }
        let bounds = self.bounds.current_bounds();
        if !self.world.place(bounds, &mut self.rng) {
            return Err(SessionError::InvalidBounds {
                width: bounds.width,
                height: bounds.height,
                size: self.world.size(),
            });
        }
        self.record(MSG_PLACED);
        self.renderer.render(&self.world.primary, &self.world.secondary);
        Ok(())
    }

    // === Tick loop ===

    /// Run the tick identified by `handle`.
    ///
    /// Ticks that were cancelled, or that arrive after the session left
    /// Running, are ignored and return `None`.
    pub fn on_tick(&mut self, handle: TickHandle) -> Option<StepReport> {
        if self.state != SessionState::Running || self.pending != Some(handle) {
            log::debug!("Ignoring stale tick {:?}", handle);
            return None;
        }
        self.pending = None;

        let bounds = self.bounds.current_bounds();
        if !bounds.fits(self.world.size()) {
            log::warn!(
                "Bounds {}x{} unusable, skipping tick",
                bounds.width,
                bounds.height
            );
            self.schedule_next();
            return None;
        }

        let report = self.advance(bounds);

        if report.collided() {
            self.state = SessionState::Collided;
            log::info!("Collision after {} ticks", self.ticks);
            return Some(report);
        }

        self.renderer.render(&self.world.primary, &self.world.secondary);
        self.schedule_next();
        Some(report)
    }

    fn advance(&mut self, bounds: Bounds) -> StepReport {
        let report = step(
            &mut self.world.primary,
            &mut self.world.secondary,
            &bounds,
            TICK_DT,
        );
        self.ticks += 1;

        self.record(MSG_MOVED);
        for event in &report.events {
            self.record(&event.message());
        }
        report
    }

    fn schedule_next(&mut self) {
        self.pending = Some(self.scheduler.schedule(self.tick_interval_ms));
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
        }
    }

    fn place_or_defer(&mut self) -> bool {
        match self.place_bodies() {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Deferring square placement: {}", e);
                false
            }
        }
    }

    // === Logging ===

    fn record(&mut self, message: &str) -> LogRecord {
        let record = self.log.append(message);
        self.status = match self.log.warning() {
            Some(StoreWarning::QuotaExceeded) => MSG_STORAGE_FULL.to_string(),
            Some(StoreWarning::WriteFailed(reason)) => {
                format!("WARNING: log not saved ({reason}). Persistence suspended.")
            }
            None => format!("{}: {}", record.sequence, record.message),
        };

        if self.sink_mode == SinkMode::Immediate {
            self.forward(std::slice::from_ref(&record), SinkKind::Immediate);
        }
        record
    }

    fn forward(&mut self, records: &[LogRecord], kind: SinkKind) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        if let Err(e) = sink.send(records, kind) {
            log::warn!("Remote sink failed ({} batch): {}", kind.as_str(), e);
        }
    }

    // === Accessors ===

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn log(&self) -> &LogStore {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut LogStore {
        &mut self.log
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn pending_tick(&self) -> Option<TickHandle> {
        self.pending
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Completed physics ticks since creation
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Last event (`"<seq>: <message>"`) or the storage warning
    pub fn status_line(&self) -> &str {
        &self.status
    }

    pub fn controls(&self) -> Controls {
        match self.state {
            SessionState::Idle | SessionState::Stopped => Controls {
                start: true,
                ..Controls::default()
            },
            SessionState::Running => Controls {
                stop: true,
                ..Controls::default()
            },
            SessionState::Collided => Controls {
                reload: true,
                ..Controls::default()
            },
        }
    }
}

impl Session<ManualScheduler> {
    /// Pop the next queued tick and run it after `wait` returns.
    ///
    /// Returns `None` once nothing is scheduled.
    pub fn run_next(&mut self, wait: impl FnOnce(u32)) -> Option<Option<StepReport>> {
        let PendingTick { handle, delay_ms } = self.scheduler.pop()?;
        wait(delay_ms);
        Some(self.on_tick(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::persistence::{LogStore, MemoryStore};
    use crate::platform::{FixedBounds, NullRenderer, SharedBounds};
    use crate::sim::{Body, BodyId, Side, StepEvent};
    use crate::sink::MemorySink;

    fn settings() -> Settings {
        Settings {
            seed: Some(1234),
            ..Settings::default()
        }
    }

    fn log_store(backend: &MemoryStore) -> LogStore {
        LogStore::new(
            Box::new(backend.clone()),
            Box::new(FixedClock::new("12:00:00.000", "2024-01-01 12:00:00.000")),
            "animation_logs",
            1500,
        )
    }

    fn session_with(settings: &Settings, bounds: Box<dyn BoundsProvider>) -> Session<ManualScheduler> {
        Session::new(
            settings,
            log_store(&MemoryStore::new()),
            ManualScheduler::new(),
            bounds,
            Box::new(NullRenderer),
        )
    }

    fn session() -> Session<ManualScheduler> {
        session_with(&settings(), Box::new(FixedBounds(Bounds::new(200.0, 200.0))))
    }

    fn messages(session: &Session<ManualScheduler>) -> Vec<String> {
        session.log().records().map(|r| r.message.clone()).collect()
    }

    #[test]
    fn test_open_places_and_logs() {
        let mut s = session();
        s.open();
        assert!(s.is_visible());
        assert!(s.world().placed);
        assert_eq!(messages(&s), vec![MSG_PLACED, MSG_OPEN]);
        assert_eq!(s.status_line(), format!("2: {MSG_OPEN}"));
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[test]
    fn test_start_stop_transitions() {
        let mut s = session();
        s.open();
        assert!(s.start());
        assert_eq!(s.state(), SessionState::Running);
        assert_eq!(s.scheduler().pending(), 1);
        assert!(!s.start());

        assert!(s.stop());
        assert_eq!(s.state(), SessionState::Stopped);
        assert_eq!(s.scheduler().pending(), 0);
        assert!(s.pending_tick().is_none());

        // Idempotent stop
        let before = s.log().len();
        assert!(!s.stop());
        assert_eq!(s.log().len(), before);
        assert_eq!(s.state(), SessionState::Stopped);
    }

    #[test]
    fn test_tick_logs_move_then_walls() {
        let mut s = session();
        s.open();
        s.world_mut().primary = Body::new(Vec2::new(184.0, 50.0), Vec2::new(2.2, 1.6), 15.0);
        s.world_mut().secondary = Body::new(Vec2::new(20.0, 100.0), Vec2::new(-1.8, -1.3), 15.0);
        s.start();

        let report = s.run_next(|_| {}).unwrap().unwrap();
        assert_eq!(
            report.events,
            vec![StepEvent::WallHit { body: BodyId::Primary, side: Side::Right }]
        );
        let tail: Vec<String> = messages(&s).into_iter().rev().take(2).collect();
        assert_eq!(tail, vec!["Blue square: hit right wall".to_string(), MSG_MOVED.to_string()]);
        assert_eq!(s.state(), SessionState::Running);
        assert_eq!(s.scheduler().pending(), 1);
    }

    #[test]
    fn test_collision_halts_loop() {
        let mut s = session();
        s.open();
        s.world_mut().primary = Body::new(Vec2::new(50.0, 50.0), Vec2::new(1.0, 0.0), 15.0);
        s.world_mut().secondary = Body::new(Vec2::new(60.0, 50.0), Vec2::new(0.0, 0.0), 15.0);
        s.start();

        let report = s.run_next(|_| {}).unwrap().unwrap();
        assert!(report.collided());
        assert_eq!(s.state(), SessionState::Collided);
        assert_eq!(s.scheduler().pending(), 0);
        assert_eq!(messages(&s).last().map(String::as_str), Some("Squares collided! Animation stopped"));
        assert_eq!(s.controls(), Controls { reload: true, ..Controls::default() });

        assert!(!s.start());
        assert!(!s.stop());
        assert!(s.reload());
        assert_eq!(s.state(), SessionState::Idle);
        assert!(s.start());
    }

    #[test]
    fn test_stale_tick_ignored() {
        let mut s = session();
        s.open();
        s.start();
        let stale = s.pending_tick().unwrap();
        s.stop();
        let before = s.log().len();
        assert!(s.on_tick(stale).is_none());
        assert_eq!(s.log().len(), before);
        assert!(s.on_tick(TickHandle(424242)).is_none());
    }

    fn collide(s: &mut Session<ManualScheduler>) {
        s.world_mut().primary = Body::new(Vec2::new(50.0, 50.0), Vec2::new(1.0, 0.0), 15.0);
        s.world_mut().secondary = Body::new(Vec2::new(60.0, 50.0), Vec2::ZERO, 15.0);
        s.start();
        s.run_next(|_| {});
        assert_eq!(s.state(), SessionState::Collided);
    }

    #[test]
    fn test_reload_with_invalid_bounds_replaces_on_start() {
        for from_collided in [true, false] {
            let bounds = SharedBounds::new(200.0, 200.0);
            let mut s = session_with(&settings(), Box::new(bounds.clone()));
            s.open();
            if from_collided {
                collide(&mut s);
            } else {
                s.start();
                s.stop();
                assert_eq!(s.state(), SessionState::Stopped);
            }
            let stale = (s.world().primary, s.world().secondary);

            bounds.resize(0.0, 0.0);
            assert!(s.reload());
            assert!(!s.world().placed);
            assert!(!s.start());
            assert_eq!(s.state(), SessionState::Idle);

            bounds.resize(200.0, 200.0);
            let before = s.log().len();
            assert!(s.start());
            assert!(s.world().placed);
            assert_eq!(messages(&s)[before], MSG_PLACED);
            assert_ne!((s.world().primary, s.world().secondary), stale);
            assert_eq!(s.world().primary.position.x, 185.0);
            assert_eq!(s.world().secondary.position.y, 185.0);
        }
    }

    #[test]
    fn test_place_bodies_refused_while_running() {
        let mut s = session();
        s.open();
        s.start();
        let before = (s.world().primary, s.log().len());
        assert_eq!(s.place_bodies(), Err(SessionError::Running));
        assert_eq!((s.world().primary, s.log().len()), before);
    }

    #[test]
    fn test_reload_rejected_while_running() {
        let mut s = session();
        s.open();
        s.start();
        assert!(!s.reload());
        assert_eq!(s.state(), SessionState::Running);
    }

    #[test]
    fn test_reload_logs_placement_and_reset() {
        let mut s = session();
        assert!(s.reload());
        assert_eq!(messages(&s), vec![MSG_PLACED, MSG_RELOAD]);
    }

    #[test]
    fn test_close_stops_and_returns_view() {
        let mut s = session();
        s.open();
        s.start();
        let view = s.close();
        assert!(!s.is_visible());
        assert_eq!(s.state(), SessionState::Stopped);
        assert_eq!(s.scheduler().pending(), 0);
        assert_eq!(view.records.last().map(|r| r.message.as_str()), Some(MSG_CLOSE));
        assert_eq!(view.records.len(), s.log().len());
    }

    #[test]
    fn test_invalid_bounds_defers_placement() {
        let bounds = SharedBounds::new(0.0, 0.0);
        let mut s = session_with(&settings(), Box::new(bounds.clone()));
        s.open();
        assert!(!s.world().placed);
        assert_eq!(messages(&s), vec![MSG_OPEN]);

        assert!(!s.start());
        assert_eq!(s.state(), SessionState::Idle);
        assert!(matches!(s.place_bodies(), Err(SessionError::InvalidBounds { .. })));

        bounds.resize(200.0, 200.0);
        assert!(s.start());
        assert!(s.world().placed);
        assert_eq!(s.state(), SessionState::Running);
    }

    #[test]
    fn test_unusable_bounds_skip_tick() {
        let bounds = SharedBounds::new(200.0, 200.0);
        let mut s = session_with(&settings(), Box::new(bounds.clone()));
        s.open();
        s.start();
        bounds.resize(0.0, 0.0);
        let before = s.log().len();
        assert!(s.run_next(|_| {}).unwrap().is_none());
        assert_eq!(s.log().len(), before);
        assert_eq!(s.state(), SessionState::Running);
        assert_eq!(s.scheduler().pending(), 1);
    }

    #[test]
    fn test_storage_warning_in_status() {
        let backend = MemoryStore::new();
        let mut s = Session::new(
            &settings(),
            log_store(&backend),
            ManualScheduler::new(),
            Box::new(FixedBounds(Bounds::new(200.0, 200.0))),
            Box::new(NullRenderer),
        );
        backend.set_quota(Some(5));
        s.open();
        assert_eq!(s.status_line(), MSG_STORAGE_FULL);
        assert_eq!(s.log().len(), 2);
    }

    #[test]
    fn test_immediate_sink_forwarding_survives_failure() {
        let sink = MemorySink::new();
        let mut s = session_with(
            &Settings {
                sink_mode: SinkMode::Immediate,
                ..settings()
            },
            Box::new(FixedBounds(Bounds::new(200.0, 200.0))),
        )
        .with_sink(Box::new(sink.clone()));

        s.open();
        assert_eq!(sink.batches().len(), 2);
        assert!(sink.batches().iter().all(|(kind, b)| *kind == SinkKind::Immediate && b.len() == 1));

        sink.set_failing(true);
        assert!(s.start());
        assert_eq!(s.state(), SessionState::Running);
        assert_eq!(s.log().len(), 3);
    }

    #[test]
    fn test_final_sink_on_close() {
        let sink = MemorySink::new();
        let mut s = session_with(
            &Settings {
                sink_mode: SinkMode::FinalOnClose,
                ..settings()
            },
            Box::new(FixedBounds(Bounds::new(200.0, 200.0))),
        )
        .with_sink(Box::new(sink.clone()));

        s.open();
        assert!(sink.batches().is_empty());
        s.close();
        let batches = sink.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].0, SinkKind::Final);
        assert_eq!(batches[0].1.len(), 3);
    }

    #[test]
    fn test_same_seed_same_start() {
        let mut a = session();
        let mut b = session();
        a.open();
        b.open();
        assert_eq!(a.world().primary, b.world().primary);
        assert_eq!(a.world().secondary, b.world().secondary);
    }
}
