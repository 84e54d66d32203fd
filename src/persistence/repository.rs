use super::files::{atomic_write, read_file};
use super::snapshot::Snapshot;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Storage contract the engine persists through. Each engine mutation
/// hands over the complete next state in one `save` call, so the store
/// moves between valid snapshots and a failure mid-mutation can never
/// leave a partially written state behind.
pub trait Repository {
    /// Read the full persisted state
    fn load(&mut self) -> Result<Snapshot>;

    /// Atomically replace the persisted state with `snapshot`
    fn save(&mut self, snapshot: &Snapshot) -> Result<()>;
}

/// In-memory repository: the null store, and the workhorse for tests
#[derive(Debug, Default)]
pub struct MemoryRepository {
    snapshot: Snapshot,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Repository for MemoryRepository {
    fn load(&mut self) -> Result<Snapshot> {
        Ok(self.snapshot.clone())
    }

    fn save(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.snapshot = snapshot.clone();
        Ok(())
    }
}

/// Repository backed by a single data.json, rewritten atomically on every
/// save (temp file + rename). A missing file loads as the empty default.
#[derive(Debug)]
pub struct JsonFileRepository {
    path: PathBuf,
    snapshot: Snapshot,
}

impl JsonFileRepository {
    pub fn open(path: PathBuf) -> Result<Self> {
        let content = read_file(&path)?;
        let snapshot = if content.trim().is_empty() {
            Snapshot::empty()
        } else {
            Snapshot::from_json(&content)
                .with_context(|| format!("Invalid data file: {}", path.display()))?
        };
        Ok(Self { path, snapshot })
    }
}

impl Repository for JsonFileRepository {
    fn load(&mut self) -> Result<Snapshot> {
        Ok(self.snapshot.clone())
    }

    fn save(&mut self, snapshot: &Snapshot) -> Result<()> {
        let json = snapshot.to_json()?;
        atomic_write(&self.path, &json)
            .with_context(|| format!("Failed to write data file: {}", self.path.display()))?;
        self.snapshot = snapshot.clone();
        Ok(())
    }
}
