//! Whole-app backup document.
//!
//! Export gathers every collection into one JSON document. Import parses the
//! full document before touching storage, then replaces each collection it
//! carries wholesale; collections missing from the document are left alone.

use crate::error::ImportError;
use crate::model::{Exercise, Routine, WorkoutSession};
use crate::storage::{KvStore, Repository};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const EXPORT_VERSION: u32 = 1;

fn default_version() -> u32 {
    EXPORT_VERSION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub exported_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub workouts: Option<Vec<WorkoutSession>>,
    #[serde(default)]
    pub routines: Option<Vec<Routine>>,
    #[serde(default)]
    pub custom_exercises: Option<Vec<Exercise>>,
}

pub fn export_document<K: KvStore>(repo: &Repository<K>, now: DateTime<Utc>) -> ExportDocument {
    ExportDocument {
        version: EXPORT_VERSION,
        exported_at: Some(now),
        workouts: Some(repo.load_sessions()),
        routines: Some(repo.load_routines()),
        custom_exercises: Some(repo.load_custom_exercises()),
    }
}

pub fn to_json(document: &ExportDocument) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(document)
}

pub fn parse_document(raw: &str) -> Result<ExportDocument, ImportError> {
    let document: ExportDocument = serde_json::from_str(raw)?;
    if document.version > EXPORT_VERSION {
        return Err(ImportError::UnsupportedVersion(document.version));
    }
    Ok(document)
}

pub fn import_document<K: KvStore>(
    repo: &mut Repository<K>,
    raw: &str,
) -> Result<ExportDocument, ImportError> {
    let document = parse_document(raw)?;
    if let Some(workouts) = &document.workouts {
        repo.save_sessions(workouts)?;
    }
    if let Some(routines) = &document.routines {
        repo.save_routines(routines)?;
    }
    if let Some(custom) = &document.custom_exercises {
        repo.save_custom_exercises(custom)?;
    }
    tracing::info!(
        workouts = document.workouts.as_ref().map_or(0, Vec::len),
        routines = document.routines.as_ref().map_or(0, Vec::len),
        "imported backup"
    );
    Ok(document)
}
