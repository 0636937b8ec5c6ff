pub mod client;
pub mod conflict;
pub mod entity_id;
pub mod entity_type;
pub mod entry;
pub mod tracker;
pub mod versioned;

pub use client::Client;
pub use conflict::{ConflictDescriptor, ConflictRecord, Resolution};
pub use entity_type::EntityType;
pub use entry::{Entry, IncomingEntry};
pub use tracker::{IncomingTracker, Tracker, TrackerType};
