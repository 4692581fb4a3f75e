//! In-memory progress store

use crate::error::{Result, StorageError};
use lesson_core::{LessonId, PersistedProgressRecord, ProgressStore, ProgressValue};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Process-local progress store.
///
/// Lives as long as the process, which matches a single browsing session.
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    records: Mutex<HashMap<LessonId, PersistedProgressRecord>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of lessons with a saved record
    pub fn len(&self) -> usize {
        self.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<LessonId, PersistedProgressRecord>>> {
        self.records
            .lock()
            .map_err(|_| StorageError::unavailable("progress store lock poisoned"))
    }
}

impl ProgressStore for MemoryProgressStore {
    fn load(&self, lesson_id: &LessonId) -> lesson_core::Result<Option<PersistedProgressRecord>> {
        Ok(self.lock()?.get(lesson_id).cloned())
    }

    fn save(&self, lesson_id: &LessonId, progress: &ProgressValue) -> lesson_core::Result<()> {
        self.lock()?
            .insert(lesson_id.clone(), PersistedProgressRecord::new(progress));
        Ok(())
    }

    fn clear(&self, lesson_id: &LessonId) -> lesson_core::Result<()> {
        self.lock()?.remove(lesson_id);
        Ok(())
    }
}
