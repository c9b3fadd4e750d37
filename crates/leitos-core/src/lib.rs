//! # leitos-core
//!
//! Domain model for the bed-management dashboard: sectors, beds, patients,
//! PCP capacity levels, isolation types and audit log entries, plus the
//! small pure helpers shared by every layer (wait-time formatting, the
//! occupancy consistency checker, document change events).

pub mod bed;
pub mod consistency;
pub mod entity;
pub mod error;
pub mod events;
pub mod id;
pub mod isolation;
pub mod log_entry;
pub mod patient;
pub mod pcp;
pub mod sector;
pub mod time;

pub use bed::{Bed, BedStatus, BedType};
pub use consistency::{OccupancyViolation, check_occupancy};
pub use entity::{Entity, collections};
pub use error::{CoreError, ErrorCategory, Result};
pub use id::generate_id;
pub use isolation::IsolationType;
pub use log_entry::LogEntry;
pub use patient::{AdmissionStatus, Patient, PendingTransfer, RegulationStatus, Sex};
pub use pcp::{PcpLevel, overlapping_levels, select_level};
pub use sector::Sector;
pub use time::{WaitTime, format_wait, now_utc};
