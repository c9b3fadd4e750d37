//! Document change events.
//!
//! Store backends publish one [`DocumentEvent`] per committed document
//! change on a [`ChangeBroadcaster`]; live subscriptions listen to it and
//! rebuild their collection snapshot when their collection is touched.
//!
//! ```text
//!   write / batch commit
//!          │
//!          ▼
//!   ChangeBroadcaster ──► subscription task ──► watch<Snapshot> ──► views
//! ```

pub mod broadcaster;
pub mod types;

pub use broadcaster::ChangeBroadcaster;
pub use types::{DocumentEvent, DocumentEventType};
