//! Lesson records and their persistence.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteLessonStore;
pub use store::{CreateLessonRequest, LessonStore, LessonStoreError};
pub use types::{Lesson, VideoOutcome, VideoStatus};
