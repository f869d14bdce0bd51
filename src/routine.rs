use crate::clock::{Clock, SystemClock};
use crate::model::{
    default_params, Routine, RoutineExercise, DEFAULT_ROUTINE_COLOR, DEFAULT_SETS_COUNT,
};
use crate::util::new_id;

/// Fields to change on an existing routine; `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct RoutinePatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub exercises: Option<Vec<RoutineExercise>>,
}

#[derive(Debug)]
pub struct RoutineStore<C: Clock = SystemClock> {
    routines: Vec<Routine>,
    clock: C,
}

impl RoutineStore<SystemClock> {
    pub fn new(routines: Vec<Routine>) -> Self {
        Self::with_clock(routines, SystemClock)
    }
}

impl<C: Clock> RoutineStore<C> {
    pub fn with_clock(routines: Vec<Routine>, clock: C) -> Self {
        Self { routines, clock }
    }

    pub fn routines(&self) -> &[Routine] {
        &self.routines
    }

    pub fn get(&self, routine_id: &str) -> Option<&Routine> {
        self.routines.iter().find(|r| r.id == routine_id)
    }

    /// Looks a routine up by id, then by case-insensitive name.
    pub fn find(&self, query: &str) -> Option<&Routine> {
        self.get(query).or_else(|| {
            self.routines
                .iter()
                .find(|r| r.name.eq_ignore_ascii_case(query.trim()))
        })
    }

    /// Newest routine goes first.
    pub fn create_routine(
        &mut self,
        name: impl Into<String>,
        exercises: Vec<RoutineExercise>,
        color: Option<&str>,
    ) -> &Routine {
        let routine = Routine {
            id: format!("r-{}", new_id()),
            name: name.into(),
            color: color
                .filter(|c| !c.is_empty())
                .unwrap_or(DEFAULT_ROUTINE_COLOR)
                .to_string(),
            created_at: self.clock.now().timestamp_millis(),
            exercises: exercises.into_iter().map(normalize).collect(),
        };
        tracing::debug!(routine = %routine.id, name = %routine.name, "created routine");
        self.routines.insert(0, routine);
        &self.routines[0]
    }

    pub fn delete_routine(&mut self, routine_id: &str) -> bool {
        let before = self.routines.len();
        self.routines.retain(|r| r.id != routine_id);
        before != self.routines.len()
    }

    pub fn update_routine(&mut self, routine_id: &str, patch: RoutinePatch) -> bool {
        let Some(routine) = self.routines.iter_mut().find(|r| r.id == routine_id) else {
            return false;
        };
        if let Some(name) = patch.name {
            routine.name = name;
        }
        if let Some(color) = patch.color {
            routine.color = color;
        }
        if let Some(exercises) = patch.exercises {
            routine.exercises = exercises.into_iter().map(normalize).collect();
        }
        true
    }
}

fn normalize(mut exercise: RoutineExercise) -> RoutineExercise {
    if exercise.params.is_empty() {
        exercise.params = default_params();
    }
    if exercise.sets_count == 0 {
        exercise.sets_count = DEFAULT_SETS_COUNT;
    }
    exercise
}
