use crate::clock::{Clock, SystemClock};
use crate::model::{
    Exercise, ExerciseEntry, FieldValue, Param, Routine, SetEntry, VideoRecord, WorkoutSession,
    DEFAULT_ROUTINE_COLOR, DEFAULT_SETS_COUNT, DEFAULT_TARGET_REST_SECS,
};
use crate::util::{new_id, time_of_day};

/// Owns the workout history, most recent session first.
///
/// Every lookup that misses (stale session, exercise or set id) leaves the
/// collection untouched; mutators report whether they applied so callers can
/// log, but they never fail. Once a session is finished its exercises and sets
/// are frozen; only notes and color stay editable.
#[derive(Debug)]
pub struct SessionStore<C: Clock = SystemClock> {
    sessions: Vec<WorkoutSession>,
    clock: C,
}

impl SessionStore<SystemClock> {
    pub fn new(sessions: Vec<WorkoutSession>) -> Self {
        Self::with_clock(sessions, SystemClock)
    }
}

impl<C: Clock> SessionStore<C> {
    pub fn with_clock(sessions: Vec<WorkoutSession>, clock: C) -> Self {
        Self { sessions, clock }
    }

    pub fn sessions(&self) -> &[WorkoutSession] {
        &self.sessions
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn get(&self, session_id: &str) -> Option<&WorkoutSession> {
        self.sessions.iter().find(|s| s.id == session_id)
    }

    pub fn create_session(&mut self) -> &WorkoutSession {
        let session = self.blank_session();
        self.prepend(session)
    }

    /// Starts a session whose exercises are expanded from the routine's shape,
    /// each with `setsCount` blank sets.
    pub fn create_session_from_routine(&mut self, routine: &Routine) -> &WorkoutSession {
        let mut session = self.blank_session();
        session.exercises = routine
            .exercises
            .iter()
            .map(|rex| {
                let params = if rex.params.is_empty() {
                    crate::model::default_params()
                } else {
                    rex.params.clone()
                };
                let count = if rex.sets_count == 0 {
                    DEFAULT_SETS_COUNT
                } else {
                    rex.sets_count
                };
                let sets = (0..count)
                    .map(|_| SetEntry::blank(new_id(), &params))
                    .collect();
                ExerciseEntry {
                    id: new_id(),
                    name: rex.name.clone(),
                    category: rex.category.clone(),
                    emoji: rex.emoji.clone(),
                    is_custom: rex.is_custom,
                    params,
                    target_rest: rex.target_rest.unwrap_or(DEFAULT_TARGET_REST_SECS),
                    sets,
                    notes: None,
                    is_video: false,
                    video_yt: None,
                    video_duration: None,
                    video_kcal: None,
                }
            })
            .collect();
        session.routine_name = Some(routine.name.clone());
        session.routine_color = Some(if routine.color.is_empty() {
            DEFAULT_ROUTINE_COLOR.to_string()
        } else {
            routine.color.clone()
        });
        self.prepend(session)
    }

    /// Records a followed video as an already finished session holding one
    /// completed set.
    pub fn log_video_session(&mut self, video: &VideoRecord) -> &WorkoutSession {
        let mut session = self.blank_session();
        session.end_time = Some(session.start_time.clone());
        session.is_video_workout = true;

        let params = vec![Param::Duration];
        let mut set = SetEntry::blank(new_id(), &params);
        set.completed = true;
        set.values.insert(
            Param::Duration,
            FieldValue::Text(video.duration_label.clone()),
        );

        session.exercises.push(ExerciseEntry {
            id: new_id(),
            name: video.title.clone(),
            category: if video.category.is_empty() {
                "Video".to_string()
            } else {
                video.category.clone()
            },
            emoji: "📺".to_string(),
            is_custom: false,
            params,
            target_rest: DEFAULT_TARGET_REST_SECS,
            sets: vec![set],
            notes: None,
            is_video: true,
            video_yt: Some(video.id.clone()),
            video_duration: Some(video.duration_label.clone()),
            video_kcal: Some(video.kcal),
        });
        self.prepend(session)
    }

    /// Stamps `endTime`. Calling it again overwrites the earlier value.
    pub fn finish_session(&mut self, session_id: &str) -> bool {
        let end_time = time_of_day(&self.clock.now());
        match self.session_mut(session_id) {
            Some(session) => {
                session.end_time = Some(end_time);
                tracing::debug!(session = session_id, "finished session");
                true
            }
            None => false,
        }
    }

    pub fn delete_session(&mut self, session_id: &str) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != session_id);
        before != self.sessions.len()
    }

    /// Appends a new exercise with one blank set. Returns the new exercise id.
    pub fn add_exercise(&mut self, session_id: &str, exercise: &Exercise) -> Option<String> {
        let params = exercise.effective_params();
        let entry = ExerciseEntry {
            id: new_id(),
            name: exercise.name.clone(),
            category: exercise.category.clone(),
            emoji: exercise.emoji.clone(),
            is_custom: exercise.is_custom,
            sets: vec![SetEntry::blank(new_id(), &params)],
            params,
            target_rest: exercise.target_rest.unwrap_or(DEFAULT_TARGET_REST_SECS),
            notes: None,
            is_video: false,
            video_yt: None,
            video_duration: None,
            video_kcal: None,
        };
        let session = self.open_session_mut(session_id)?;
        let id = entry.id.clone();
        session.exercises.push(entry);
        Some(id)
    }

    pub fn remove_exercise(&mut self, session_id: &str, exercise_id: &str) -> bool {
        match self.open_session_mut(session_id) {
            Some(session) => {
                let before = session.exercises.len();
                session.exercises.retain(|e| e.id != exercise_id);
                before != session.exercises.len()
            }
            None => false,
        }
    }

    /// Appends a blank set shaped by the exercise's params. Returns the new set id.
    pub fn add_set(&mut self, session_id: &str, exercise_id: &str) -> Option<String> {
        let exercise = self.exercise_mut(session_id, exercise_id)?;
        let set = SetEntry::blank(new_id(), &exercise.params);
        let id = set.id.clone();
        exercise.sets.push(set);
        Some(id)
    }

    pub fn remove_set(&mut self, session_id: &str, exercise_id: &str, set_id: &str) -> bool {
        match self.exercise_mut(session_id, exercise_id) {
            Some(exercise) => {
                let before = exercise.sets.len();
                exercise.sets.retain(|s| s.id != set_id);
                before != exercise.sets.len()
            }
            None => false,
        }
    }

    /// Writes one raw field value. No range checks; fields the exercise does
    /// not track are ignored.
    pub fn update_set(
        &mut self,
        session_id: &str,
        exercise_id: &str,
        set_id: &str,
        field: Param,
        value: impl Into<FieldValue>,
    ) -> bool {
        let Some(exercise) = self.exercise_mut(session_id, exercise_id) else {
            return false;
        };
        if !exercise.params.contains(&field) {
            tracing::debug!(exercise = exercise_id, %field, "field not tracked by exercise");
            return false;
        }
        match exercise.sets.iter_mut().find(|s| s.id == set_id) {
            Some(set) => {
                set.values.insert(field, value.into());
                true
            }
            None => false,
        }
    }

    pub fn toggle_set_complete(&mut self, session_id: &str, exercise_id: &str, set_id: &str) -> bool {
        let set = self
            .exercise_mut(session_id, exercise_id)
            .and_then(|e| e.sets.iter_mut().find(|s| s.id == set_id));
        match set {
            Some(set) => {
                set.completed = !set.completed;
                true
            }
            None => false,
        }
    }

    /// Copies a past session as a new, open one: fresh ids and timestamps,
    /// values kept as a template, every set marked not completed.
    pub fn duplicate_session(&mut self, source_id: &str) -> Option<&WorkoutSession> {
        let source = self.get(source_id)?.clone();
        let now = self.clock.now();
        let copy = WorkoutSession {
            id: new_id(),
            date: now.date_naive(),
            start_time: time_of_day(&now),
            start_timestamp: now.timestamp_millis(),
            end_time: None,
            exercises: source
                .exercises
                .into_iter()
                .map(|e| ExerciseEntry {
                    id: new_id(),
                    sets: e
                        .sets
                        .into_iter()
                        .map(|s| SetEntry {
                            id: new_id(),
                            completed: false,
                            values: s.values,
                        })
                        .collect(),
                    ..e
                })
                .collect(),
            ..source
        };
        Some(self.prepend(copy))
    }

    pub fn update_notes(&mut self, session_id: &str, notes: impl Into<String>) -> bool {
        match self.session_mut(session_id) {
            Some(session) => {
                session.notes = Some(notes.into());
                true
            }
            None => false,
        }
    }

    pub fn update_exercise_notes(
        &mut self,
        session_id: &str,
        exercise_id: &str,
        notes: impl Into<String>,
    ) -> bool {
        let exercise = self
            .session_mut(session_id)
            .and_then(|s| s.exercises.iter_mut().find(|e| e.id == exercise_id));
        match exercise {
            Some(exercise) => {
                exercise.notes = Some(notes.into());
                true
            }
            None => false,
        }
    }

    pub fn update_exercise_rest(&mut self, session_id: &str, exercise_id: &str, secs: u32) -> bool {
        match self.exercise_mut(session_id, exercise_id) {
            Some(exercise) => {
                exercise.target_rest = secs;
                true
            }
            None => false,
        }
    }

    pub fn update_session_color(&mut self, session_id: &str, color: impl Into<String>) -> bool {
        match self.session_mut(session_id) {
            Some(session) => {
                session.routine_color = Some(color.into());
                true
            }
            None => false,
        }
    }

    /// The open session dated today, if any. The store does not prevent two
    /// open sessions on one day; see [`SessionStore::open_sessions_today`].
    pub fn active_session_for_today(&self) -> Option<&WorkoutSession> {
        let today = self.clock.now().date_naive();
        self.sessions
            .iter()
            .find(|s| s.date == today && s.end_time.is_none())
    }

    /// Number of unfinished sessions dated today. Callers check this before
    /// starting a new session.
    pub fn open_sessions_today(&self) -> usize {
        let today = self.clock.now().date_naive();
        self.sessions
            .iter()
            .filter(|s| s.date == today && s.end_time.is_none())
            .count()
    }

    pub fn stats(&self) -> crate::stats::WorkoutStats {
        crate::stats::compute_stats(&self.sessions, self.clock.now().date_naive())
    }

    fn blank_session(&self) -> WorkoutSession {
        let now = self.clock.now();
        WorkoutSession {
            id: new_id(),
            date: now.date_naive(),
            start_time: time_of_day(&now),
            start_timestamp: now.timestamp_millis(),
            end_time: None,
            exercises: Vec::new(),
            notes: None,
            routine_name: None,
            routine_color: None,
            is_video_workout: false,
        }
    }

    fn prepend(&mut self, session: WorkoutSession) -> &WorkoutSession {
        tracing::debug!(session = %session.id, date = %session.date, "created session");
        self.sessions.insert(0, session);
        &self.sessions[0]
    }

    fn session_mut(&mut self, session_id: &str) -> Option<&mut WorkoutSession> {
        self.sessions.iter_mut().find(|s| s.id == session_id)
    }

    fn open_session_mut(&mut self, session_id: &str) -> Option<&mut WorkoutSession> {
        let session = self.session_mut(session_id)?;
        if session.end_time.is_some() {
            tracing::debug!(session = session_id, "session already finished");
            return None;
        }
        Some(session)
    }

    fn exercise_mut(&mut self, session_id: &str, exercise_id: &str) -> Option<&mut ExerciseEntry> {
        self.open_session_mut(session_id)?
            .exercises
            .iter_mut()
            .find(|e| e.id == exercise_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::model::RoutineExercise;
    use chrono::{Duration, Local, TimeZone};
    use std::collections::HashSet;

    fn store() -> SessionStore<FixedClock> {
        let now = Local.with_ymd_and_hms(2026, 10, 16, 18, 30, 0).unwrap();
        SessionStore::with_clock(Vec::new(), FixedClock::new(now))
    }

    fn squat() -> Exercise {
        Exercise::named("Squat")
            .with_category("Legs")
            .with_params(&[Param::Weight, Param::Reps])
    }

    #[test]
    fn test_create_session_is_open_and_prepended() {
        let mut store = store();
        let first = store.create_session().id.clone();
        store.clock().advance(Duration::minutes(5));
        let second = store.create_session().clone();

        assert_eq!(store.sessions()[0].id, second.id);
        assert_eq!(store.sessions()[1].id, first);
        assert_eq!(second.start_time, "18:35");
        assert_eq!(second.date.to_string(), "2026-10-16");
        assert!(second.end_time.is_none());
        assert!(second.exercises.is_empty());
    }

    #[test]
    fn test_add_exercise_defaults() {
        let mut store = store();
        let sid = store.create_session().id.clone();
        let eid = store.add_exercise(&sid, &Exercise::named("Row")).unwrap();

        let ex = store.get(&sid).unwrap().exercise(&eid).unwrap();
        assert_eq!(ex.params, vec![Param::Weight, Param::Reps]);
        assert_eq!(ex.target_rest, 90);
        assert_eq!(ex.sets.len(), 1);
        assert!(ex.sets[0].values.values().all(FieldValue::is_blank));
    }

    #[test]
    fn test_add_and_remove_sets_never_reuse_ids() {
        let mut store = store();
        let sid = store.create_session().id.clone();
        let eid = store.add_exercise(&sid, &squat()).unwrap();

        let mut seen: HashSet<String> = store.get(&sid).unwrap().exercise(&eid).unwrap().sets
            .iter()
            .map(|s| s.id.clone())
            .collect();
        let mut expected = 1;
        for round in 0..10 {
            let id = store.add_set(&sid, &eid).unwrap();
            assert!(seen.insert(id.clone()), "set id reused");
            expected += 1;
            if round % 3 == 0 {
                assert!(store.remove_set(&sid, &eid, &id));
                expected -= 1;
            }
        }
        let ex = store.get(&sid).unwrap().exercise(&eid).unwrap();
        assert_eq!(ex.sets.len(), expected);
    }

    #[test]
    fn test_update_set_only_touches_tracked_fields() {
        let mut store = store();
        let sid = store.create_session().id.clone();
        let eid = store.add_exercise(&sid, &squat()).unwrap();
        let set_id = store.get(&sid).unwrap().exercise(&eid).unwrap().sets[0].id.clone();

        assert!(store.update_set(&sid, &eid, &set_id, Param::Weight, 80.0));
        assert!(store.update_set(&sid, &eid, &set_id, Param::Reps, "8"));
        assert!(!store.update_set(&sid, &eid, &set_id, Param::Time, 30.0));

        let set = &store.get(&sid).unwrap().exercise(&eid).unwrap().sets[0];
        assert_eq!(set.value(Param::Weight), Some(&FieldValue::Number(80.0)));
        assert_eq!(set.value(Param::Reps), Some(&FieldValue::Text("8".into())));
        assert_eq!(set.values.len(), 2);
    }

    #[test]
    fn test_stale_ids_are_no_ops() {
        let mut store = store();
        let sid = store.create_session().id.clone();
        let eid = store.add_exercise(&sid, &squat()).unwrap();
        let snapshot = store.sessions().to_vec();

        assert!(!store.finish_session("missing"));
        assert!(!store.delete_session("missing"));
        assert!(store.add_exercise("missing", &squat()).is_none());
        assert!(!store.remove_exercise(&sid, "missing"));
        assert!(store.add_set(&sid, "missing").is_none());
        assert!(!store.remove_set(&sid, &eid, "missing"));
        assert!(!store.update_set(&sid, &eid, "missing", Param::Weight, 1.0));
        assert!(!store.toggle_set_complete(&sid, "missing", "missing"));
        assert!(!store.update_notes("missing", "x"));
        assert!(!store.update_exercise_notes(&sid, "missing", "x"));
        assert!(!store.update_exercise_rest(&sid, "missing", 60));
        assert!(!store.update_session_color("missing", "#fff"));
        assert!(store.duplicate_session("missing").is_none());

        assert_eq!(store.sessions(), snapshot.as_slice());
    }

    #[test]
    fn test_end_time_only_set_by_finish() {
        let mut store = store();
        let sid = store.create_session().id.clone();
        let eid = store.add_exercise(&sid, &squat()).unwrap();
        let set_id = store.add_set(&sid, &eid).unwrap();
        store.update_set(&sid, &eid, &set_id, Param::Reps, 5.0);
        store.toggle_set_complete(&sid, &eid, &set_id);
        store.update_notes(&sid, "felt strong");
        store.update_exercise_rest(&sid, &eid, 120);
        store.update_session_color(&sid, "#22c55e");
        assert!(store.get(&sid).unwrap().end_time.is_none());

        assert!(store.finish_session(&sid));
        assert_eq!(store.get(&sid).unwrap().end_time.as_deref(), Some("18:30"));

        store.clock().advance(Duration::minutes(10));
        assert!(store.finish_session(&sid));
        assert_eq!(store.get(&sid).unwrap().end_time.as_deref(), Some("18:40"));
    }

    #[test]
    fn test_finished_session_content_is_frozen_except_notes() {
        let mut store = store();
        let sid = store.create_session().id.clone();
        let eid = store.add_exercise(&sid, &squat()).unwrap();
        let set_id = store.get(&sid).unwrap().exercise(&eid).unwrap().sets[0].id.clone();
        store.finish_session(&sid);

        assert!(store.add_exercise(&sid, &squat()).is_none());
        assert!(store.add_set(&sid, &eid).is_none());
        assert!(!store.toggle_set_complete(&sid, &eid, &set_id));
        assert!(!store.remove_exercise(&sid, &eid));
        assert!(store.update_notes(&sid, "late note"));
        assert!(store.update_exercise_notes(&sid, &eid, "knees ok"));
        assert_eq!(store.get(&sid).unwrap().notes.as_deref(), Some("late note"));
    }

    #[test]
    fn test_duplicate_keeps_shape_and_values_resets_completion() {
        let mut store = store();
        let sid = store.create_session().id.clone();
        let eid = store.add_exercise(&sid, &squat()).unwrap();
        let set_id = store.get(&sid).unwrap().exercise(&eid).unwrap().sets[0].id.clone();
        store.add_set(&sid, &eid);
        store.update_set(&sid, &eid, &set_id, Param::Weight, 80.0);
        store.toggle_set_complete(&sid, &eid, &set_id);
        store.finish_session(&sid);
        let original = store.get(&sid).unwrap().clone();

        store.clock().advance(Duration::days(2));
        let copy = store.duplicate_session(&sid).unwrap().clone();

        assert_ne!(copy.id, original.id);
        assert!(copy.end_time.is_none());
        assert_eq!(copy.date.to_string(), "2026-10-18");
        assert_eq!(copy.exercises.len(), original.exercises.len());
        for (c, o) in copy.exercises.iter().zip(&original.exercises) {
            assert_ne!(c.id, o.id);
            assert_eq!(c.name, o.name);
            assert_eq!(c.params, o.params);
            assert_eq!(c.sets.len(), o.sets.len());
            for (cs, os) in c.sets.iter().zip(&o.sets) {
                assert_ne!(cs.id, os.id);
                assert!(!cs.completed);
                assert_eq!(cs.values, os.values);
            }
        }
        assert_eq!(store.get(&sid).unwrap(), &original);
        assert_eq!(store.sessions()[0].id, copy.id);
    }

    #[test]
    fn test_create_from_routine_blanks_values() {
        let mut store = store();
        let routine = Routine {
            id: "r-1".into(),
            name: "Push".into(),
            color: "#ef4444".into(),
            created_at: 0,
            exercises: vec![
                RoutineExercise::from_exercise(&squat(), 4),
                RoutineExercise {
                    target_rest: Some(60),
                    ..RoutineExercise::from_exercise(
                        &Exercise::named("Plank").with_params(&[Param::Time]),
                        2,
                    )
                },
            ],
        };
        let session = store.create_session_from_routine(&routine).clone();

        assert_eq!(session.routine_name.as_deref(), Some("Push"));
        assert_eq!(session.routine_color.as_deref(), Some("#ef4444"));
        assert_eq!(session.exercises[0].sets.len(), 4);
        assert_eq!(session.exercises[0].target_rest, 90);
        assert_eq!(session.exercises[1].sets.len(), 2);
        assert_eq!(session.exercises[1].target_rest, 60);
        assert_eq!(session.exercises[1].params, vec![Param::Time]);
        assert!(session
            .exercises
            .iter()
            .flat_map(|e| &e.sets)
            .all(|s| !s.completed && s.values.values().all(FieldValue::is_blank)));
    }

    #[test]
    fn test_log_video_session_is_complete() {
        let mut store = store();
        let video = VideoRecord {
            id: "dQw4w9WgXcQ".into(),
            title: "Total body 30".into(),
            category: String::new(),
            duration_label: "30 min".into(),
            kcal: 250,
            level: None,
        };
        let session = store.log_video_session(&video).clone();

        assert!(session.is_video_workout);
        assert_eq!(session.end_time.as_deref(), Some(session.start_time.as_str()));
        assert_eq!(session.exercises.len(), 1);
        let ex = &session.exercises[0];
        assert!(ex.is_video);
        assert_eq!(ex.category, "Video");
        assert_eq!(ex.video_kcal, Some(250));
        assert_eq!(ex.sets.len(), 1);
        assert!(ex.sets[0].completed);
        assert_eq!(
            ex.sets[0].value(Param::Duration),
            Some(&FieldValue::Text("30 min".into()))
        );
    }

    #[test]
    fn test_active_session_for_today() {
        let mut store = store();
        assert!(store.active_session_for_today().is_none());
        let sid = store.create_session().id.clone();
        assert_eq!(store.active_session_for_today().unwrap().id, sid);
        assert_eq!(store.open_sessions_today(), 1);

        store.finish_session(&sid);
        assert!(store.active_session_for_today().is_none());

        let open = store.create_session().id.clone();
        store.clock().advance(Duration::days(1));
        assert!(store.active_session_for_today().is_none());
        assert_eq!(store.open_sessions_today(), 0);
        assert!(store.get(&open).is_some());
    }

    #[test]
    fn test_delete_session() {
        let mut store = store();
        let a = store.create_session().id.clone();
        let b = store.create_session().id.clone();
        assert!(store.delete_session(&a));
        assert_eq!(store.sessions().len(), 1);
        assert_eq!(store.sessions()[0].id, b);
    }
}
