//! `WeightStore`: the current `WeightVector`, persisted at
//! `<VOLUME>/grader/weights.json` and rewritten atomically (write to a
//! sibling temp file, then rename — spec §4.3, §4.4).

use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::info;

use crate::domain::weights::WeightVector;
use crate::errors::CoreError;

pub struct WeightStore {
    path: PathBuf,
    current: RwLock<WeightVector>,
}

impl WeightStore {
    pub fn open(volume_mount_path: &Path) -> Result<Self, CoreError> {
        let grader_dir = volume_mount_path.join("grader");
        std::fs::create_dir_all(&grader_dir).map_err(|e| CoreError::StorageFatal {
            path: grader_dir.display().to_string(),
            reason: e.to_string(),
        })?;
        let path = grader_dir.join("weights.json");

        let current = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| CoreError::ValidationFailure {
                reason: format!("weights.json is not valid: {e}"),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => WeightVector::default(),
            Err(e) => {
                return Err(CoreError::StorageFatal {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })
            }
        };

        Ok(Self {
            path,
            current: RwLock::new(current),
        })
    }

    pub fn current(&self) -> WeightVector {
        self.current.read().clone()
    }

    /// Replace the in-memory weights and rewrite `weights.json`
    /// atomically: write to a `.tmp` sibling, `fsync`, then `rename`
    /// over the canonical path so a reader never observes a
    /// partially-written file (spec §4.3: "write-to-temp, rename").
    pub fn replace(&self, weights: WeightVector) -> Result<(), CoreError> {
        let json = serde_json::to_vec_pretty(&weights).map_err(|e| CoreError::ValidationFailure {
            reason: format!("weights failed to serialize: {e}"),
        })?;

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &json).map_err(|e| CoreError::StorageFatal {
            path: tmp_path.display().to_string(),
            reason: e.to_string(),
        })?;
        {
            let tmp_file = std::fs::File::open(&tmp_path).map_err(|e| CoreError::StorageFatal {
                path: tmp_path.display().to_string(),
                reason: e.to_string(),
            })?;
            tmp_file.sync_all().ok();
        }
        std::fs::rename(&tmp_path, &self.path).map_err(|e| CoreError::StorageFatal {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;

        *self.current.write() = weights;
        info!(path = %self.path.display(), "weights.json rewritten atomically");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn replace_persists_and_survives_reopen() {
        let dir = tempdir().unwrap();
        let store = WeightStore::open(dir.path()).unwrap();
        let mut weights = WeightVector::default();
        weights
            .group_mut("NBA", "TOTAL")
            .0
            .insert("sharp".to_string(), 0.6);
        store.replace(weights).unwrap();

        let reopened = WeightStore::open(dir.path()).unwrap();
        let group = reopened.current().group("NBA", "TOTAL").cloned().unwrap();
        assert_eq!(group.0["sharp"], 0.6);
    }

    #[test]
    fn opens_empty_when_no_file_present() {
        let dir = tempdir().unwrap();
        let store = WeightStore::open(dir.path()).unwrap();
        assert!(store.current().group("NBA", "TOTAL").is_none());
    }
}
