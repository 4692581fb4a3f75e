//! Directory-backed progress store

use crate::error::{Result, StorageError};
use crate::key::storage_key;
use lesson_core::{LessonId, PersistedProgressRecord, ProgressStore, ProgressValue};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Progress store keeping one JSON file per lesson.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// crash mid-write leaves the previous record intact.
#[derive(Debug, Clone)]
pub struct FileProgressStore {
    dir: PathBuf,
}

impl FileProgressStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            StorageError::unavailable(format!("cannot create {}: {}", dir.display(), e))
        })?;

        debug!(dir = %dir.display(), "Opened progress store");
        Ok(Self { dir })
    }

    /// Root directory of the store
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, lesson_id: &LessonId) -> Result<PathBuf> {
        Ok(self.dir.join(format!("{}.json", storage_key(lesson_id)?)))
    }

    /// Load the record for a lesson
    pub fn load_record(&self, lesson_id: &LessonId) -> Result<Option<PersistedProgressRecord>> {
        let path = self.entry_path(lesson_id)?;

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let record: PersistedProgressRecord =
            serde_json::from_slice(&bytes).map_err(|e| StorageError::Corrupt {
                lesson_id: lesson_id.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Some(record))
    }

    /// Overwrite the record for a lesson
    pub fn save_record(&self, lesson_id: &LessonId, record: &PersistedProgressRecord) -> Result<()> {
        let path = self.entry_path(lesson_id)?;
        let tmp = path.with_extension("json.tmp");

        let json = serde_json::to_vec(record)?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;

        trace!(
            lesson_id = %lesson_id,
            current_time = record.current_time,
            percentage = record.percentage,
            "Saved progress"
        );
        Ok(())
    }

    /// Remove the record for a lesson, if any
    pub fn remove_record(&self, lesson_id: &LessonId) -> Result<()> {
        let path = self.entry_path(lesson_id)?;

        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(lesson_id = %lesson_id, "Cleared saved progress");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl ProgressStore for FileProgressStore {
    fn load(&self, lesson_id: &LessonId) -> lesson_core::Result<Option<PersistedProgressRecord>> {
        Ok(self.load_record(lesson_id)?)
    }

    fn save(&self, lesson_id: &LessonId, progress: &ProgressValue) -> lesson_core::Result<()> {
        Ok(self.save_record(lesson_id, &PersistedProgressRecord::new(progress))?)
    }

    fn clear(&self, lesson_id: &LessonId) -> lesson_core::Result<()> {
        Ok(self.remove_record(lesson_id)?)
    }
}
