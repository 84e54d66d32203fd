pub mod files;
pub mod repository;
pub mod snapshot;

pub use files::{atomic_write, data_file, ensure_data_dir, get_data_dir, init_local_dir, read_file};
pub use repository::{JsonFileRepository, MemoryRepository, Repository};
pub use snapshot::{Snapshot, SnapshotData, SNAPSHOT_VERSION};
