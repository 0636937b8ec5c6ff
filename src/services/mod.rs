pub mod conflict_detector;
pub mod delta_assembler;
pub mod resolution_handler;
pub mod store;
pub mod sync_engine;
pub mod window_policy;

pub use resolution_handler::{resolve, ResolveRequest};
pub use store::SyncStore;
pub use sync_engine::{apply_batch, BatchUpdate, UpdateResult};
