use crate::error::StorageError;
use crate::model::{Exercise, Param, VideoRecord};
use crate::util::new_id;
use std::path::Path;

pub const CATEGORIES: [&str; 8] = [
    "Chest", "Back", "Shoulders", "Arms", "Legs", "Core", "Cardio", "Custom",
];

const WR: &[Param] = &[Param::Weight, Param::Reps];
const R: &[Param] = &[Param::Reps];
const T: &[Param] = &[Param::Time];

#[rustfmt::skip]
const BUILTIN: &[(&str, &str, &str, &str, &[Param])] = &[
    ("bench-press", "Bench Press", "Chest", "🏋️", WR),
    ("incline-bench", "Incline Bench Press", "Chest", "🏋️", WR),
    ("dumbbell-fly", "Dumbbell Fly", "Chest", "🦋", WR),
    ("cable-crossover", "Cable Crossover", "Chest", "🔗", WR),
    ("push-ups", "Push-ups", "Chest", "🤸", R),
    ("dips-chest", "Chest Dips", "Chest", "⬇️", WR),
    ("lat-pulldown", "Lat Pulldown", "Back", "🔽", WR),
    ("pull-ups", "Pull-ups", "Back", "🧗", WR),
    ("barbell-row", "Barbell Row", "Back", "🚣", WR),
    ("dumbbell-row", "Dumbbell Row", "Back", "🚣", WR),
    ("cable-row", "Seated Cable Row", "Back", "🔗", WR),
    ("deadlift", "Deadlift", "Back", "🏗️", WR),
    ("overhead-press", "Overhead Press", "Shoulders", "🏋️", WR),
    ("lateral-raise", "Lateral Raise", "Shoulders", "🦅", WR),
    ("rear-delt-fly", "Rear Delt Fly", "Shoulders", "🦋", WR),
    ("face-pull", "Face Pull", "Shoulders", "🎯", WR),
    ("bicep-curl", "Bicep Curl", "Arms", "💪", WR),
    ("hammer-curl", "Hammer Curl", "Arms", "🔨", WR),
    ("tricep-pushdown", "Tricep Pushdown", "Arms", "⬇️", WR),
    ("skull-crusher", "Skull Crusher", "Arms", "💀", WR),
    ("squat", "Squat", "Legs", "🦵", WR),
    ("leg-press", "Leg Press", "Legs", "🦿", WR),
    ("lunge", "Lunge", "Legs", "🚶", WR),
    ("leg-curl", "Leg Curl", "Legs", "🔄", WR),
    ("calf-raise", "Calf Raise", "Legs", "🦶", WR),
    ("romanian-deadlift", "Romanian Deadlift", "Legs", "🏗️", WR),
    ("hip-thrust", "Hip Thrust", "Legs", "🍑", WR),
    ("plank", "Plank", "Core", "🧱", T),
    ("crunch", "Crunch", "Core", "🔥", R),
    ("leg-raise", "Leg Raise", "Core", "🦵", R),
    ("russian-twist", "Russian Twist", "Core", "🌀", WR),
    ("treadmill", "Treadmill", "Cardio", "🏃", T),
    ("cycling", "Stationary Bike", "Cardio", "🚴", T),
    ("rowing", "Rowing Machine", "Cardio", "🚣", T),
    ("jump-rope", "Jump Rope", "Cardio", "🤸", T),
];

pub fn builtin_exercises() -> Vec<Exercise> {
    BUILTIN
        .iter()
        .map(|(id, name, category, emoji, params)| Exercise {
            id: id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            emoji: emoji.to_string(),
            params: params.to_vec(),
            is_custom: false,
            target_rest: None,
        })
        .collect()
}

/// Built-in exercises plus the user's own.
#[derive(Debug, Clone)]
pub struct ExerciseCatalog {
    builtin: Vec<Exercise>,
    custom: Vec<Exercise>,
}

impl ExerciseCatalog {
    pub fn new(custom: Vec<Exercise>) -> Self {
        Self {
            builtin: builtin_exercises(),
            custom,
        }
    }

    pub fn custom(&self) -> &[Exercise] {
        &self.custom
    }

    pub fn all(&self) -> impl Iterator<Item = &Exercise> {
        self.builtin.iter().chain(self.custom.iter())
    }

    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Exercise> {
        self.all()
            .filter(move |e| e.category.eq_ignore_ascii_case(category))
    }

    /// Exact id, then case-insensitive name.
    pub fn find(&self, query: &str) -> Option<&Exercise> {
        let query = query.trim();
        self.all()
            .find(|e| e.id == query)
            .or_else(|| self.all().find(|e| e.name.eq_ignore_ascii_case(query)))
    }

    /// Case-insensitive substring match on name or category.
    pub fn search(&self, query: &str) -> Vec<&Exercise> {
        let needle = query.trim().to_lowercase();
        self.all()
            .filter(|e| {
                e.name.to_lowercase().contains(&needle)
                    || e.category.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Adds a user-defined exercise and returns its id.
    pub fn add_custom(&mut self, mut exercise: Exercise) -> String {
        if exercise.id.is_empty() {
            exercise.id = format!("custom-{}", new_id());
        }
        if exercise.category.is_empty() {
            exercise.category = "Custom".to_string();
        }
        exercise.params = exercise.effective_params();
        exercise.is_custom = true;
        let id = exercise.id.clone();
        self.custom.push(exercise);
        id
    }

    pub fn update_custom(&mut self, exercise_id: &str, update: impl FnOnce(&mut Exercise)) -> bool {
        match self.custom.iter_mut().find(|e| e.id == exercise_id) {
            Some(exercise) => {
                update(exercise);
                exercise.is_custom = true;
                true
            }
            None => false,
        }
    }

    pub fn delete_custom(&mut self, exercise_id: &str) -> bool {
        let before = self.custom.len();
        self.custom.retain(|e| e.id != exercise_id);
        before != self.custom.len()
    }
}

/// Read-only list of follow-along videos, produced offline.
#[derive(Debug, Clone, Default)]
pub struct VideoCatalog {
    videos: Vec<VideoRecord>,
}

impl VideoCatalog {
    pub fn new(videos: Vec<VideoRecord>) -> Self {
        Self { videos }
    }

    pub fn from_json(raw: &str) -> Result<Self, StorageError> {
        Ok(Self::new(serde_json::from_str(raw)?))
    }

    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn videos(&self) -> &[VideoRecord] {
        &self.videos
    }

    pub fn find(&self, video_id: &str) -> Option<&VideoRecord> {
        self.videos.iter().find(|v| v.id == video_id)
    }

    pub fn search(&self, query: &str) -> Vec<&VideoRecord> {
        let needle = query.trim().to_lowercase();
        self.videos
            .iter()
            .filter(|v| {
                v.title.to_lowercase().contains(&needle)
                    || v.category.to_lowercase().contains(&needle)
            })
            .collect()
    }
}

/// Appends `video` to the completed log unless it is already there.
pub fn mark_video_completed(completed: &mut Vec<VideoRecord>, video: &VideoRecord) -> bool {
    if completed.iter().any(|v| v.id == video.id) {
        return false;
    }
    completed.push(video.clone());
    true
}
