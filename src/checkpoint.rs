//! Checkpoint management for resumable runs
//!
//! The checkpoint is the run's single unit of persistence: it carries both
//! the set of completed entity IDs and their accumulated results, so an
//! interrupted run resumes without re-contacting any finished entity. Saves
//! are atomic (write to temp file, fsync, rename).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::hash::{Hash, Hasher};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::entity::{EntityResult, ManualResearchItem};

const CHECKPOINT_FILENAME: &str = ".civicfinder-checkpoint.json";
const CHECKPOINT_VERSION: u32 = 1;

/// How to handle an existing checkpoint at startup
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ResumeMode {
    /// Ask the user interactively (non-interactive sessions start fresh)
    #[default]
    Prompt,
    /// Resume without asking
    AutoResume,
    /// Ignore and overwrite any existing checkpoint
    Fresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Checkpoint {
    version: u32,
    pub created_at: DateTime<Utc>,
    /// Hash of run settings; a mismatch means the checkpoint belongs to a
    /// differently-configured run and must not be resumed
    pub settings_hash: u64,
    /// Entity IDs in completion order
    completed: Vec<String>,
    /// Accumulated per-entity results keyed by entity ID
    results: HashMap<String, EntityResult>,
    /// Entities routed to the manual-research list so far
    pub manual_items: Vec<ManualResearchItem>,
    #[serde(skip)]
    checkpoint_dir: Option<PathBuf>,
}

impl Checkpoint {
    pub fn new(settings_hash: u64, checkpoint_dir: &Path) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            created_at: Utc::now(),
            settings_hash,
            completed: Vec::new(),
            results: HashMap::new(),
            manual_items: Vec::new(),
            checkpoint_dir: Some(checkpoint_dir.to_path_buf()),
        }
    }

    pub fn checkpoint_path(dir: &Path) -> PathBuf {
        dir.join(CHECKPOINT_FILENAME)
    }

    pub fn exists(dir: &Path) -> bool {
        Self::checkpoint_path(dir).exists()
    }

    /// Load a checkpoint from the given directory
    pub fn load(dir: &Path) -> anyhow::Result<Self> {
        let path = Self::checkpoint_path(dir);
        let content = fs::read_to_string(&path)?;
        let mut checkpoint: Checkpoint = serde_json::from_str(&content)?;

        if checkpoint.version != CHECKPOINT_VERSION {
            anyhow::bail!(
                "Checkpoint version mismatch: found {}, expected {}",
                checkpoint.version,
                CHECKPOINT_VERSION
            );
        }

        checkpoint.checkpoint_dir = Some(dir.to_path_buf());
        Ok(checkpoint)
    }

    /// Save atomically: write to a temp file, sync, then rename over the
    /// real path so a crash mid-save never corrupts an existing checkpoint.
    pub fn save(&self) -> anyhow::Result<()> {
        let dir = self
            .checkpoint_dir
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("checkpoint has no directory set"))?;

        let path = Self::checkpoint_path(dir);
        let temp_path = path.with_extension("json.tmp");

        let json = serde_json::to_string_pretty(self)?;

        let mut file = fs::File::create(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, &path)?;
        tracing::debug!(path = %path.display(), completed = self.completed.len(), "checkpoint saved");
        Ok(())
    }

    /// Remove the checkpoint file after a clean, fully-exported run
    pub fn delete(dir: &Path) -> anyhow::Result<()> {
        let path = Self::checkpoint_path(dir);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    /// Whether this checkpoint was produced by a run with the same settings
    pub fn is_compatible(&self, settings_hash: u64) -> bool {
        self.settings_hash == settings_hash
    }

    pub fn is_completed(&self, entity_id: &str) -> bool {
        self.results.contains_key(entity_id)
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// Record a finished entity. Re-recording the same entity replaces its
    /// result without duplicating it in the completion order.
    pub fn record_entity(&mut self, result: EntityResult, manual: Option<ManualResearchItem>) {
        let id = result.entity.id();
        if !self.results.contains_key(&id) {
            self.completed.push(id.clone());
        }
        self.results.insert(id, result);
        if let Some(item) = manual {
            self.manual_items.push(item);
        }
    }

    /// All accumulated results in completion order
    pub fn results_in_order(&self) -> Vec<&EntityResult> {
        self.completed
            .iter()
            .filter_map(|id| self.results.get(id))
            .collect()
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entities completed, {} manual-research items, created {}",
            self.completed.len(),
            self.manual_items.len(),
            self.created_at.format("%Y-%m-%d %H:%M UTC")
        )
    }
}

/// Hash the settings that make checkpoints incompatible when they change
pub fn generate_settings_hash(
    delay_secs: u64,
    timeout_secs: u64,
    max_links_per_site: usize,
    input_file: &str,
) -> u64 {
    let mut hasher = DefaultHasher::new();
    delay_secs.hash(&mut hasher);
    timeout_secs.hash(&mut hasher);
    max_links_per_site.hash(&mut hasher);
    input_file.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Entity, EntityCategory, EntityResult};
    use tempfile::TempDir;

    fn sample_result(name: &str) -> EntityResult {
        EntityResult::unresolved(Entity {
            name: name.to_string(),
            county: None,
            state: "MD".to_string(),
            category: EntityCategory::Government,
            distance: 10.0,
        })
    }

    #[test]
    fn test_checkpoint_roundtrip() {
        let dir = TempDir::new().unwrap();
        let hash = generate_settings_hash(2, 10, 10, "counties.csv");

        let mut checkpoint = Checkpoint::new(hash, dir.path());
        checkpoint.record_entity(sample_result("Frederick County"), None);
        checkpoint.record_entity(sample_result("Adams County"), None);
        checkpoint.save().unwrap();

        assert!(Checkpoint::exists(dir.path()));
        let loaded = Checkpoint::load(dir.path()).unwrap();
        assert!(loaded.is_compatible(hash));
        assert_eq!(loaded.completed_count(), 2);
        assert!(loaded.is_completed("frederick county|md"));
        assert!(!loaded.is_completed("unknown county|md"));

        let ordered = loaded.results_in_order();
        assert_eq!(ordered[0].entity.name, "Frederick County");
        assert_eq!(ordered[1].entity.name, "Adams County");
    }

    #[test]
    fn test_settings_hash_detects_changes() {
        let base = generate_settings_hash(2, 10, 10, "counties.csv");
        assert_eq!(base, generate_settings_hash(2, 10, 10, "counties.csv"));
        assert_ne!(base, generate_settings_hash(5, 10, 10, "counties.csv"));
        assert_ne!(base, generate_settings_hash(2, 10, 10, "other.csv"));
    }

    #[test]
    fn test_rerecording_does_not_duplicate() {
        let dir = TempDir::new().unwrap();
        let mut checkpoint = Checkpoint::new(0, dir.path());
        checkpoint.record_entity(sample_result("Frederick County"), None);
        checkpoint.record_entity(sample_result("Frederick County"), None);
        assert_eq!(checkpoint.completed_count(), 1);
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let dir = TempDir::new().unwrap();
        let path = Checkpoint::checkpoint_path(dir.path());
        let json = serde_json::json!({
            "version": 99,
            "created_at": Utc::now(),
            "settings_hash": 0,
            "completed": [],
            "results": {},
            "manual_items": []
        });
        fs::write(&path, json.to_string()).unwrap();
        assert!(Checkpoint::load(dir.path()).is_err());
    }

    #[test]
    fn test_delete_removes_file() {
        let dir = TempDir::new().unwrap();
        let checkpoint = Checkpoint::new(0, dir.path());
        checkpoint.save().unwrap();
        assert!(Checkpoint::exists(dir.path()));
        Checkpoint::delete(dir.path()).unwrap();
        assert!(!Checkpoint::exists(dir.path()));
    }
}
