//! Per-lesson exclusive locks.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Serializes pipeline runs per lesson. Delivery upstream is at-least-once,
/// so the same lesson can be handed to two tasks; whoever acquires second
/// waits and then sees the updated record instead of transcoding twice.
#[derive(Default)]
pub struct LessonLocks {
    locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl LessonLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for one lesson, waiting if another run holds it.
    pub async fn acquire(&self, lesson_id: i64) -> OwnedMutexGuard<()> {
        let entry = {
            let mut locks = self.locks.lock().await;
            // A held or contended lock is referenced by at least one guard
            // or pending acquire outside the map, so count 1 means idle.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(lesson_id).or_default())
        };
        entry.lock_owned().await
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}
