//! Bounce Log - two bouncing squares with a durable event log
//!
//! Core modules:
//! - `sim`: Deterministic step physics (wall reflection, mutual collision)
//! - `clock`: Event sequence numbers and timestamps
//! - `persistence`: Bounded append-only log with durable reload
//! - `session`: Idle/Running/Stopped/Collided state machine
//! - `platform`: Renderer, bounds and scheduling seams
//! - `sink`: Optional remote log sink and its line format

pub mod clock;
pub mod persistence;
pub mod platform;
pub mod session;
pub mod settings;
pub mod sim;
pub mod sink;
pub mod view;

pub use persistence::{LogRecord, LogStore, RecordKind};
pub use session::{Session, SessionState};
pub use settings::{Settings, SinkMode};

/// Simulation and logging defaults
pub mod consts {
    /// Edge length of each square
    pub const SQUARE_SIZE: f32 = 15.0;
    /// Delay between the end of one tick and the start of the next (ms)
    pub const TICK_INTERVAL_MS: u32 = 20;
    /// Fixed per-tick time delta; velocities are expressed in units per tick
    pub const TICK_DT: f32 = 1.0;

    /// Maximum number of log records kept before front eviction
    pub const MAX_LOG_SIZE: usize = 1500;
    /// Key the log buffer is persisted under
    pub const LOG_STORAGE_KEY: &str = "animation_logs";

    /// Initial velocity of the primary (blue) square
    pub const PRIMARY_VELOCITY: [f32; 2] = [2.2, 1.6];
    /// Initial velocity of the secondary (orange) square
    pub const SECONDARY_VELOCITY: [f32; 2] = [-1.8, -1.3];
}
