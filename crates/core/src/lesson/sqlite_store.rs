//! SQLite-backed lesson store.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::store::{CreateLessonRequest, LessonStore, LessonStoreError};
use super::types::{Lesson, VideoOutcome, VideoStatus};

pub struct SqliteLessonStore {
    conn: Mutex<Connection>,
}

impl SqliteLessonStore {
    pub fn new(path: &Path) -> Result<Self, LessonStoreError> {
        let conn =
            Connection::open(path).map_err(|e| LessonStoreError::Database(e.to_string()))?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self, LessonStoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| LessonStoreError::Database(e.to_string()))?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn initialize_schema(conn: &Connection) -> Result<(), LessonStoreError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS lessons (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            video_path TEXT,
            video_status TEXT NOT NULL DEFAULT 'pending',
            video_progress INTEGER NOT NULL DEFAULT 0,
            encryption_key BLOB,
            hls_path TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_lessons_video_status ON lessons(video_status);",
    )
    .map_err(|e| LessonStoreError::Database(e.to_string()))?;

    // Migration for databases created before progress tracking; fails
    // harmlessly when the column already exists.
    let _ = conn.execute(
        "ALTER TABLE lessons ADD COLUMN video_progress INTEGER NOT NULL DEFAULT 0",
        [],
    );

    Ok(())
}

fn row_to_lesson(row: &rusqlite::Row<'_>) -> rusqlite::Result<Lesson> {
    let status_str: String = row.get("video_status")?;
    let video_status = VideoStatus::parse(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            format!("unknown video_status '{}'", status_str).into(),
        )
    })?;

    let created_str: String = row.get("created_at")?;
    let updated_str: String = row.get("updated_at")?;

    Ok(Lesson {
        id: row.get("id")?,
        title: row.get("title")?,
        video_path: row.get("video_path")?,
        video_status,
        video_progress: row.get("video_progress")?,
        encryption_key: row.get("encryption_key")?,
        hls_path: row.get("hls_path")?,
        created_at: DateTime::parse_from_rfc3339(&created_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        updated_at: DateTime::parse_from_rfc3339(&updated_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

impl LessonStore for SqliteLessonStore {
    fn create(&self, request: CreateLessonRequest) -> Result<Lesson, LessonStoreError> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO lessons (title, video_path, video_status, video_progress, created_at, updated_at)
             VALUES (?1, ?2, ?3, 0, ?4, ?4)",
            params![
                request.title,
                request.video_path,
                VideoStatus::Pending.as_str(),
                now.to_rfc3339()
            ],
        )
        .map_err(|e| LessonStoreError::Database(e.to_string()))?;

        let id = conn.last_insert_rowid();
        Ok(Lesson {
            id,
            title: request.title,
            video_path: request.video_path,
            video_status: VideoStatus::Pending,
            video_progress: 0,
            encryption_key: None,
            hls_path: None,
            created_at: now,
            updated_at: now,
        })
    }

    fn get(&self, lesson_id: i64) -> Result<Option<Lesson>, LessonStoreError> {
        let conn = self.conn.lock().unwrap();
        match conn.query_row(
            "SELECT * FROM lessons WHERE id = ?1",
            params![lesson_id],
            row_to_lesson,
        ) {
            Ok(lesson) => Ok(Some(lesson)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(LessonStoreError::Database(e.to_string())),
        }
    }

    fn list_pending(&self, limit: i64) -> Result<Vec<Lesson>, LessonStoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT * FROM lessons
                 WHERE video_status = 'pending' AND video_path IS NOT NULL
                 ORDER BY created_at ASC
                 LIMIT ?1",
            )
            .map_err(|e| LessonStoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![limit], row_to_lesson)
            .map_err(|e| LessonStoreError::Database(e.to_string()))?;

        let mut lessons = Vec::new();
        for row in rows {
            lessons.push(row.map_err(|e| LessonStoreError::Database(e.to_string()))?);
        }
        Ok(lessons)
    }

    fn list_processing(&self) -> Result<Vec<Lesson>, LessonStoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT * FROM lessons
                 WHERE video_status = 'processing'
                 ORDER BY created_at ASC",
            )
            .map_err(|e| LessonStoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], row_to_lesson)
            .map_err(|e| LessonStoreError::Database(e.to_string()))?;

        let mut lessons = Vec::new();
        for row in rows {
            lessons.push(row.map_err(|e| LessonStoreError::Database(e.to_string()))?);
        }
        Ok(lessons)
    }

    fn mark_processing(&self, lesson_id: i64) -> Result<Lesson, LessonStoreError> {
        let conn = self.conn.lock().unwrap();

        let current = match conn.query_row(
            "SELECT * FROM lessons WHERE id = ?1",
            params![lesson_id],
            row_to_lesson,
        ) {
            Ok(lesson) => lesson,
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                return Err(LessonStoreError::NotFound(lesson_id))
            }
            Err(e) => return Err(LessonStoreError::Database(e.to_string())),
        };

        if !current.video_status.can_process() {
            return Err(LessonStoreError::InvalidTransition {
                lesson_id,
                current: current.video_status,
            });
        }

        let now = Utc::now();
        conn.execute(
            "UPDATE lessons SET video_status = ?1, video_progress = 0, updated_at = ?2 WHERE id = ?3",
            params![
                VideoStatus::Processing.as_str(),
                now.to_rfc3339(),
                lesson_id
            ],
        )
        .map_err(|e| LessonStoreError::Database(e.to_string()))?;

        Ok(Lesson {
            video_status: VideoStatus::Processing,
            video_progress: 0,
            updated_at: now,
            ..current
        })
    }

    fn update_progress(&self, lesson_id: i64, percent: u8) -> Result<(), LessonStoreError> {
        let conn = self.conn.lock().unwrap();
        let changed = conn
            .execute(
                "UPDATE lessons SET video_progress = ?1, updated_at = ?2 WHERE id = ?3",
                params![
                    percent.min(100),
                    Utc::now().to_rfc3339(),
                    lesson_id
                ],
            )
            .map_err(|e| LessonStoreError::Database(e.to_string()))?;

        if changed == 0 {
            return Err(LessonStoreError::NotFound(lesson_id));
        }
        Ok(())
    }

    fn record_outcome(
        &self,
        lesson_id: i64,
        outcome: &VideoOutcome,
    ) -> Result<Lesson, LessonStoreError> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();

        let changed = match outcome {
            VideoOutcome::Success {
                encryption_key,
                playlist_path,
            } => conn
                .execute(
                    "UPDATE lessons
                     SET video_status = ?1, video_progress = 100,
                         encryption_key = ?2, hls_path = ?3, updated_at = ?4
                     WHERE id = ?5",
                    params![
                        VideoStatus::Completed.as_str(),
                        encryption_key,
                        playlist_path,
                        now.to_rfc3339(),
                        lesson_id
                    ],
                )
                .map_err(|e| LessonStoreError::Database(e.to_string()))?,
            VideoOutcome::Failure { .. } => conn
                .execute(
                    "UPDATE lessons SET video_status = ?1, updated_at = ?2 WHERE id = ?3",
                    params![VideoStatus::Failed.as_str(), now.to_rfc3339(), lesson_id],
                )
                .map_err(|e| LessonStoreError::Database(e.to_string()))?,
        };

        if changed == 0 {
            return Err(LessonStoreError::NotFound(lesson_id));
        }

        conn.query_row(
            "SELECT * FROM lessons WHERE id = ?1",
            params![lesson_id],
            row_to_lesson,
        )
        .map_err(|e| LessonStoreError::Database(e.to_string()))
    }
}
