//! Storage key derivation

use crate::error::{Result, StorageError};
use lesson_core::LessonId;
use std::fmt::Write;

const KEY_PREFIX: &str = "video_progress_";

/// Storage key for a lesson: `video_progress_{lessonId}`.
///
/// Characters outside `[A-Za-z0-9_-]` are percent-encoded so the key is
/// always a safe single path component.
pub fn storage_key(lesson_id: &LessonId) -> Result<String> {
    if lesson_id.is_blank() {
        return Err(StorageError::InvalidKey(lesson_id.to_string()));
    }

    let mut key = String::with_capacity(KEY_PREFIX.len() + lesson_id.as_str().len());
    key.push_str(KEY_PREFIX);

    for byte in lesson_id.as_str().bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            key.push(byte as char);
        } else {
            // Writing to a String cannot fail
            let _ = write!(key, "%{byte:02X}");
        }
    }

    Ok(key)
}
