//! Lesson Player Storage
//!
//! Local, per-lesson persistence of the last known playback position so a
//! viewer can resume where they left off after a reload.
//!
//! # Architecture
//!
//! - **One entry per lesson**: keyed `video_progress_{lessonId}`, value is the
//!   JSON record `{currentTime, duration, percentage, timestamp}`
//! - **Synchronous**: local storage never suspends the event loop
//! - **Device scoped**: cross-device resume is the backend's job
//!
//! Two backends implement [`lesson_core::ProgressStore`]:
//! - [`FileProgressStore`]: one JSON file per lesson in a directory
//! - [`MemoryProgressStore`]: process-local map, for tests and ephemeral hosts
//!
//! # Example
//!
//! ```rust,no_run
//! use lesson_core::{LessonId, ProgressStore, ProgressValue};
//! use lesson_storage::FileProgressStore;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = FileProgressStore::open("/tmp/lesson-progress")?;
//! let lesson = LessonId::new("lesson-1");
//!
//! store.save(&lesson, &ProgressValue::from_playback(42.0, 300.0).unwrap())?;
//! let record = store.load(&lesson)?.expect("saved above");
//! assert_eq!(record.current_time, 42.0);
//!
//! store.clear(&lesson)?;
//! assert!(store.load(&lesson)?.is_none());
//! # Ok(())
//! # }
//! ```

mod error;
mod file;
mod key;
mod memory;

pub use error::{Result, StorageError};
pub use file::FileProgressStore;
pub use key::storage_key;
pub use memory::MemoryProgressStore;
