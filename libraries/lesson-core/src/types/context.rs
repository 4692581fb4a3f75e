//! Playback context for one mounted player

use super::ids::{CourseId, LessonId, ModuleId};
use serde::{Deserialize, Serialize};

/// Identifies the content being watched.
///
/// Built once per mount from the parameters handed to the player and never
/// mutated afterwards. The titles, slugs and image URL are only carried along
/// for downstream display (e.g. "continue watching" cards).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackContext {
    /// Lesson being watched (required)
    pub lesson_id: LessonId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<CourseId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_id: Option<ModuleId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_slug: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_slug: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_image_url: Option<String>,
}

impl PlaybackContext {
    /// Create a context with only the lesson set
    pub fn new(lesson_id: LessonId) -> Self {
        Self {
            lesson_id,
            course_id: None,
            module_id: None,
            lesson_title: None,
            course_title: None,
            course_slug: None,
            module_title: None,
            module_slug: None,
            lesson_image_url: None,
        }
    }

    pub fn with_course(mut self, id: CourseId, title: Option<String>, slug: Option<String>) -> Self {
        self.course_id = Some(id);
        self.course_title = title;
        self.course_slug = slug;
        self
    }

    pub fn with_module(mut self, id: ModuleId, title: Option<String>, slug: Option<String>) -> Self {
        self.module_id = Some(id);
        self.module_title = title;
        self.module_slug = slug;
        self
    }

    pub fn with_lesson_title(mut self, title: impl Into<String>) -> Self {
        self.lesson_title = Some(title.into());
        self
    }

    pub fn with_lesson_image(mut self, url: impl Into<String>) -> Self {
        self.lesson_image_url = Some(url.into());
        self
    }
}
