use crate::error::StorageError;
use crate::model::{Exercise, Routine, VideoRecord, WorkoutSession};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

pub const WORKOUTS_KEY: &str = "gymtrack_workouts";
pub const ROUTINES_KEY: &str = "gymtrack_routines";
pub const CUSTOM_EXERCISES_KEY: &str = "gymtrack_custom_exercises";
pub const COMPLETED_VIDEOS_KEY: &str = "gymtrack_completed_videos";
pub const ACTIVE_WORKOUT_KEY: &str = "gymtrack_active_workout";

/// Appended to a collection key to hold a blob that failed to parse.
pub const CORRUPT_SUFFIX: &str = ".corrupt";

/// Durable string storage: whole blobs in, whole blobs out.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Single-table SQLite store. Each `set` is one upsert, so a blob is either
/// fully replaced or untouched.
#[derive(Debug)]
pub struct SqliteKvStore {
    conn: Connection,
}

impl SqliteKvStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path.as_ref())?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;
        Ok(Self { conn })
    }
}

impl KvStore for SqliteKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            r#"
            INSERT INTO kv (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryKvStore {
    entries: HashMap<String, String>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Typed access to the app's collections on top of a [`KvStore`].
///
/// Loads never fail: unreadable or corrupt blobs come back empty with a
/// warning. Saves rewrite the whole collection and hand errors back.
#[derive(Debug)]
pub struct Repository<K: KvStore> {
    kv: K,
}

impl<K: KvStore> Repository<K> {
    pub fn new(kv: K) -> Self {
        Self { kv }
    }

    pub fn kv(&self) -> &K {
        &self.kv
    }

    pub fn load_sessions(&self) -> Vec<WorkoutSession> {
        self.load_collection(WORKOUTS_KEY)
    }

    pub fn save_sessions(&mut self, sessions: &[WorkoutSession]) -> Result<(), StorageError> {
        self.save_collection(WORKOUTS_KEY, sessions)
    }

    pub fn load_routines(&self) -> Vec<Routine> {
        self.load_collection(ROUTINES_KEY)
    }

    pub fn save_routines(&mut self, routines: &[Routine]) -> Result<(), StorageError> {
        self.save_collection(ROUTINES_KEY, routines)
    }

    pub fn load_custom_exercises(&self) -> Vec<Exercise> {
        self.load_collection(CUSTOM_EXERCISES_KEY)
    }

    pub fn save_custom_exercises(&mut self, exercises: &[Exercise]) -> Result<(), StorageError> {
        self.save_collection(CUSTOM_EXERCISES_KEY, exercises)
    }

    pub fn load_completed_videos(&self) -> Vec<VideoRecord> {
        self.load_collection(COMPLETED_VIDEOS_KEY)
    }

    pub fn save_completed_videos(&mut self, videos: &[VideoRecord]) -> Result<(), StorageError> {
        self.save_collection(COMPLETED_VIDEOS_KEY, videos)
    }

    /// Id of the session the user is currently logging into, if any.
    pub fn active_session_id(&self) -> Option<String> {
        match self.kv.get(ACTIVE_WORKOUT_KEY) {
            Ok(id) => id.filter(|id| !id.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "could not read active session pointer");
                None
            }
        }
    }

    pub fn set_active_session_id(&mut self, id: &str) -> Result<(), StorageError> {
        self.kv.set(ACTIVE_WORKOUT_KEY, id)
    }

    pub fn clear_active_session_id(&mut self) -> Result<(), StorageError> {
        self.kv.remove(ACTIVE_WORKOUT_KEY)
    }

    fn load_collection<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let raw = match self.kv.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(key, error = %e, "storage unavailable, starting empty");
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(key, error = %e, "stored data is corrupt, starting empty");
                Vec::new()
            }
        }
    }

    fn save_collection<T>(&mut self, key: &str, items: &[T]) -> Result<(), StorageError>
    where
        T: Serialize + DeserializeOwned,
    {
        let raw = serde_json::to_string(items)?;
        self.quarantine_unreadable::<T>(key)?;
        self.kv.set(key, &raw)?;
        tracing::debug!(key, count = items.len(), "saved collection");
        Ok(())
    }

    /// Moves a blob that no longer parses to `<key>.corrupt` (or the first
    /// free `<key>.corrupt.N`) so the save that follows cannot erase it.
    fn quarantine_unreadable<T: DeserializeOwned>(&mut self, key: &str) -> Result<(), StorageError> {
        let Some(existing) = self.kv.get(key)? else {
            return Ok(());
        };
        if serde_json::from_str::<Vec<T>>(&existing).is_ok() {
            return Ok(());
        }
        let mut target = format!("{key}{CORRUPT_SUFFIX}");
        let mut n = 1;
        while self.kv.get(&target)?.is_some() {
            target = format!("{key}{CORRUPT_SUFFIX}.{n}");
            n += 1;
        }
        self.kv.set(&target, &existing)?;
        tracing::warn!(key, target = %target, "kept unreadable data aside before overwriting");
        Ok(())
    }
}
