//! Polity node: runs the governance and economy engines on a schedule.
//!
//! The node:
//! - Opens polls, reviews judicial challenges and resolves closed polls on
//!   every heartbeat
//! - Reconciles members and roles with the platform once an hour
//! - Pays income once per lunar quarter
//! - Renews or revokes temporary privileges as they expire
//! - Carries passed proposals into the constitution

pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod node;
pub mod platform;
pub mod shutdown;

pub use config::NodeConfig;
pub use context::CivicContext;
pub use dispatch::Dispatcher;
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use node::{
    Checkpoint, HeartbeatReport, Platform, PolityNode, ReconcileReport, SnapshotCheckpoint,
};
pub use platform::{
    LogPlatform, Member, Notifier, PlatformRole, PrivilegeGate, RosterSource, StaticRoster,
};
pub use shutdown::{ShutdownController, ShutdownSignal};
