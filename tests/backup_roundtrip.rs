use assert_matches::assert_matches;
use chrono::Utc;
use gymtrack::backup::{export_document, import_document, to_json};
use gymtrack::catalog::ExerciseCatalog;
use gymtrack::error::ImportError;
use gymtrack::model::{Exercise, Param, RoutineExercise};
use gymtrack::routine::RoutineStore;
use gymtrack::session::SessionStore;
use gymtrack::storage::{Repository, SqliteKvStore};

fn seeded(path: &std::path::Path) -> Repository<SqliteKvStore> {
    let mut repo = Repository::new(SqliteKvStore::open(path).unwrap());

    let mut catalog = ExerciseCatalog::new(Vec::new());
    catalog.add_custom(Exercise::named("Sled Push").with_params(&[Param::Weight, Param::Time]));
    repo.save_custom_exercises(catalog.custom()).unwrap();

    let mut routines = RoutineStore::new(Vec::new());
    let squat = catalog.find("squat").unwrap().clone();
    let routine = routines
        .create_routine("Legs", vec![RoutineExercise::from_exercise(&squat, 5)], Some("#22c55e"))
        .clone();
    repo.save_routines(routines.routines()).unwrap();

    let mut sessions = SessionStore::new(Vec::new());
    let sid = sessions.create_session_from_routine(&routine).id.clone();
    let eid = sessions.get(&sid).unwrap().exercises[0].id.clone();
    let set = sessions.get(&sid).unwrap().exercises[0].sets[0].id.clone();
    sessions.update_set(&sid, &eid, &set, Param::Weight, 100.0);
    sessions.update_set(&sid, &eid, &set, Param::Reps, 5u32);
    sessions.toggle_set_complete(&sid, &eid, &set);
    sessions.update_notes(&sid, "felt strong");
    sessions.finish_session(&sid);
    repo.save_sessions(sessions.sessions()).unwrap();
    repo
}

#[test]
fn export_then_import_into_empty_store_matches() {
    let dir = tempfile::tempdir().unwrap();
    let source = seeded(&dir.path().join("source.db"));
    let json = to_json(&export_document(&source, Utc::now())).unwrap();

    let mut target = Repository::new(SqliteKvStore::open(dir.path().join("target.db")).unwrap());
    import_document(&mut target, &json).unwrap();

    assert_eq!(target.load_sessions(), source.load_sessions());
    assert_eq!(target.load_routines(), source.load_routines());
    assert_eq!(target.load_custom_exercises(), source.load_custom_exercises());
    assert_eq!(target.load_sessions()[0].notes.as_deref(), Some("felt strong"));
}

#[test]
fn import_replaces_rather_than_merges() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = seeded(&dir.path().join("gym.db"));
    assert_eq!(repo.load_sessions().len(), 1);

    import_document(&mut repo, r#"{"version":1,"workouts":[],"routines":[]}"#).unwrap();
    assert!(repo.load_sessions().is_empty());
    assert!(repo.load_routines().is_empty());
    // not in the document, so untouched
    assert_eq!(repo.load_custom_exercises().len(), 1);
}

#[test]
fn rejected_import_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = seeded(&dir.path().join("gym.db"));
    let before = repo.load_sessions();

    let err = import_document(&mut repo, "[1, 2").unwrap_err();
    assert_matches!(err, ImportError::InvalidJson(_));
    let err = import_document(&mut repo, r#"{"version":2,"workouts":[]}"#).unwrap_err();
    assert_matches!(err, ImportError::UnsupportedVersion(2));

    assert_eq!(repo.load_sessions(), before);
}
