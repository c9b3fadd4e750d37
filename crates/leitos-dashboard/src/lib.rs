//! # leitos-dashboard
//!
//! Application layer of the bed-management dashboard: the bed/patient state
//! engine, the PCP capacity monitor, the ICU wait board, the read-through
//! cache and the audit logger, plus configuration and tracing setup for the
//! `leitos-dashboard` binary.

pub mod app;
pub mod audit;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod icu_board;
pub mod notify;
pub mod observability;
pub mod pcp;
pub mod seed;

pub use app::Dashboard;
pub use audit::{AuditLogger, AuditRecord};
pub use cache::{CacheStats, ReadThroughCache};
pub use config::{AppConfig, ConfigError};
pub use engine::{Actor, BedEngine, Operation};
pub use error::{EngineError, EngineResult, ValidationError};
pub use icu_board::{IcuWaitBoard, IcuWaitEntry, build_board};
pub use notify::{BroadcastNotifier, LogNotifier, Notification, Notifier, Severity};
pub use observability::{apply_logging_level, init_tracing, init_tracing_with_level};
pub use pcp::{PcpMonitor, PcpSettings, PcpStatus, evaluate};
