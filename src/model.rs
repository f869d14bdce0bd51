use chrono::{Local, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Rest applied to an exercise when neither the template nor the caller picks one.
pub const DEFAULT_TARGET_REST_SECS: u32 = 90;

/// Number of blank sets a routine exercise expands to when `setsCount` is missing.
pub const DEFAULT_SETS_COUNT: u32 = 3;

/// Color given to routines (and sessions started from them) without an explicit one.
pub const DEFAULT_ROUTINE_COLOR: &str = "#8b5cf6";

/// A tracked per-set input field.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Param {
    Weight,
    Reps,
    Time,
    Duration,
}

impl Param {
    pub const ALL: [Param; 4] = [Param::Weight, Param::Reps, Param::Time, Param::Duration];

    pub fn unit(&self) -> &'static str {
        match self {
            Param::Weight => "kg",
            Param::Reps => "reps",
            Param::Time => "s",
            Param::Duration => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownParam(pub String);

impl fmt::Display for UnknownParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown field '{}' (expected one of weight, reps, time, duration)",
            self.0
        )
    }
}

impl std::error::Error for UnknownParam {}

impl FromStr for Param {
    type Err = UnknownParam;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "weight" | "kg" => Ok(Param::Weight),
            "reps" => Ok(Param::Reps),
            "time" => Ok(Param::Time),
            "duration" => Ok(Param::Duration),
            other => Err(UnknownParam(other.to_string())),
        }
    }
}

pub fn default_params() -> Vec<Param> {
    vec![Param::Weight, Param::Reps]
}

fn default_target_rest() -> u32 {
    DEFAULT_TARGET_REST_SECS
}

fn default_sets_count() -> u32 {
    DEFAULT_SETS_COUNT
}

fn default_routine_color() -> String {
    DEFAULT_ROUTINE_COLOR.to_string()
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Raw value of one set field. Blank entries are stored as an empty string,
/// the same way a half-filled form would leave them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn blank() -> Self {
        FieldValue::Text(String::new())
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, FieldValue::Text(s) if s.trim().is_empty())
    }

    /// Numeric reading of the value; text that parses as a number counts.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }

    /// Lenient read of a stored value. Anything that is neither a number nor
    /// a string is blank.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => n.as_f64().map_or_else(Self::blank, FieldValue::Number),
            serde_json::Value::String(s) => FieldValue::Text(s),
            _ => Self::blank(),
        }
    }

    /// Interprets user input: numbers become `Number`, anything else is kept verbatim.
    pub fn parse(input: &str) -> Self {
        match input.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => FieldValue::Number(n),
            _ => FieldValue::Text(input.to_string()),
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        Self::blank()
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<u32> for FieldValue {
    fn from(n: u32) -> Self {
        FieldValue::Number(n as f64)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) if n.fract() == 0.0 => write!(f, "{}", *n as i64),
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Text(s) if s.is_empty() => write!(f, "-"),
            FieldValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// One performed set. `values` carries exactly the parent exercise's params.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSetEntry")]
pub struct SetEntry {
    pub id: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(flatten)]
    pub values: BTreeMap<Param, FieldValue>,
}

/// Stored set as found on disk. Nulls read as blank and unknown fields are
/// dropped, so a single odd value never fails the whole history.
#[derive(Deserialize)]
struct RawSetEntry {
    id: String,
    #[serde(default)]
    completed: Option<bool>,
    #[serde(flatten)]
    rest: BTreeMap<String, serde_json::Value>,
}

impl From<RawSetEntry> for SetEntry {
    fn from(raw: RawSetEntry) -> Self {
        let values = raw
            .rest
            .into_iter()
            .filter_map(|(key, value)| match key.parse::<Param>() {
                Ok(param) => Some((param, FieldValue::from_json(value))),
                Err(_) => {
                    tracing::debug!("dropping unknown set field {key:?} on {}", raw.id);
                    None
                }
            })
            .collect();
        Self {
            id: raw.id,
            completed: raw.completed.unwrap_or(false),
            values,
        }
    }
}

impl SetEntry {
    /// A not-yet-performed set with one blank value per param.
    pub fn blank(id: String, params: &[Param]) -> Self {
        Self {
            id,
            completed: false,
            values: params.iter().map(|p| (*p, FieldValue::blank())).collect(),
        }
    }

    pub fn value(&self, param: Param) -> Option<&FieldValue> {
        self.values.get(&param)
    }

    /// Weight x reps when both are numeric, otherwise zero.
    pub fn volume(&self) -> f64 {
        match (
            self.value(Param::Weight).and_then(FieldValue::as_number),
            self.value(Param::Reps).and_then(FieldValue::as_number),
        ) {
            (Some(w), Some(r)) => w * r,
            _ => 0.0,
        }
    }
}

/// One movement tracked within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub emoji: String,
    #[serde(default)]
    pub is_custom: bool,
    #[serde(default = "default_params")]
    pub params: Vec<Param>,
    #[serde(default = "default_target_rest")]
    pub target_rest: u32,
    #[serde(default)]
    pub sets: Vec<SetEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_video: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_yt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_kcal: Option<u32>,
}

impl ExerciseEntry {
    pub fn completed_sets(&self) -> usize {
        self.sets.iter().filter(|s| s.completed).count()
    }
}

/// One workout occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSession {
    pub id: String,
    pub date: NaiveDate,
    pub start_time: String,
    #[serde(default)]
    pub start_timestamp: i64,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub exercises: Vec<ExerciseEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routine_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routine_color: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_video_workout: bool,
}

impl WorkoutSession {
    pub fn is_complete(&self) -> bool {
        self.end_time.is_some()
    }

    pub fn exercise(&self, exercise_id: &str) -> Option<&ExerciseEntry> {
        self.exercises.iter().find(|e| e.id == exercise_id)
    }

    pub fn completed_sets(&self) -> usize {
        self.exercises.iter().map(ExerciseEntry::completed_sets).sum()
    }

    pub fn total_sets(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }

    /// Epoch ms the session began. Records without `startTimestamp` are
    /// placed at `date` + `startTime` in local time, or local midnight when
    /// the time of day does not parse.
    pub fn started_at_ms(&self) -> i64 {
        if self.start_timestamp > 0 {
            return self.start_timestamp;
        }
        let time = NaiveTime::parse_from_str(self.start_time.trim(), "%H:%M")
            .unwrap_or(NaiveTime::MIN);
        self.date
            .and_time(time)
            .and_local_timezone(Local)
            .earliest()
            .map(|dt| dt.timestamp_millis())
            .unwrap_or(0)
    }
}

/// Exercise definition from the catalog, a custom exercise, or an ad-hoc
/// descriptor passed to `add_exercise`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub emoji: String,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub is_custom: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_rest: Option<u32>,
}

impl Exercise {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            category: String::new(),
            emoji: String::new(),
            params: Vec::new(),
            is_custom: false,
            target_rest: None,
        }
    }

    pub fn with_params(mut self, params: &[Param]) -> Self {
        self.params = params.to_vec();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Declared params, or weight/reps when the descriptor names none.
    pub fn effective_params(&self) -> Vec<Param> {
        if self.params.is_empty() {
            default_params()
        } else {
            self.params.clone()
        }
    }
}

/// Shape of one exercise inside a routine template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineExercise {
    #[serde(default)]
    pub exercise_id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub emoji: String,
    #[serde(default = "default_params")]
    pub params: Vec<Param>,
    #[serde(default)]
    pub is_custom: bool,
    #[serde(default = "default_sets_count")]
    pub sets_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_rest: Option<u32>,
}

impl RoutineExercise {
    pub fn from_exercise(exercise: &Exercise, sets_count: u32) -> Self {
        Self {
            exercise_id: exercise.id.clone(),
            name: exercise.name.clone(),
            category: exercise.category.clone(),
            emoji: exercise.emoji.clone(),
            params: exercise.effective_params(),
            is_custom: exercise.is_custom,
            sets_count,
            target_rest: exercise.target_rest,
        }
    }
}

/// Reusable exercise-list template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    pub id: String,
    pub name: String,
    #[serde(default = "default_routine_color")]
    pub color: String,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub exercises: Vec<RoutineExercise>,
}

/// Follow-along video as it appears in the offline catalog files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    #[serde(rename = "yt")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "cat", default)]
    pub category: String,
    #[serde(rename = "dur", default)]
    pub duration_label: String,
    #[serde(default)]
    pub kcal: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}
