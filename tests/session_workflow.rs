use chrono::{Duration, Local, TimeZone};
use gymtrack::clock::{Clock, FixedClock};
use gymtrack::model::{Exercise, FieldValue, Param, RoutineExercise};
use gymtrack::routine::RoutineStore;
use gymtrack::session::SessionStore;
use gymtrack::storage::{Repository, SqliteKvStore};

fn clock() -> FixedClock {
    FixedClock::new(Local.with_ymd_and_hms(2026, 10, 16, 18, 30, 0).unwrap())
}

// Squat: add a second set, log 80 kg on the first, complete it, finish.
#[test]
fn squat_session_counts_one_completed_set() {
    let mut store = SessionStore::with_clock(Vec::new(), clock());
    let sid = store.create_session().id.clone();

    let squat = Exercise::named("Squat").with_params(&[Param::Weight, Param::Reps]);
    let eid = store.add_exercise(&sid, &squat).unwrap();
    store.add_set(&sid, &eid).unwrap();

    let set1 = store.get(&sid).unwrap().exercise(&eid).unwrap().sets[0].id.clone();
    assert_eq!(store.get(&sid).unwrap().exercise(&eid).unwrap().sets.len(), 2);
    assert!(store.update_set(&sid, &eid, &set1, Param::Weight, 80.0));
    assert!(store.toggle_set_complete(&sid, &eid, &set1));

    store.clock().advance(Duration::minutes(45));
    assert!(store.finish_session(&sid));

    let session = store.get(&sid).unwrap();
    assert_eq!(session.end_time.as_deref(), Some("19:15"));
    assert_eq!(
        session.exercise(&eid).unwrap().sets[0].value(Param::Weight),
        Some(&FieldValue::Number(80.0))
    );

    let stats = store.stats();
    assert_eq!(stats.total_completed_sets, 1);
    assert_eq!(stats.total_completed_sessions, 1);
    assert_eq!(stats.this_week_count, 1);
    assert_eq!(stats.streak, 1);
}

#[test]
fn routine_session_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("gymtrack.db");
    let clock = clock();

    let sid = {
        let mut repo = Repository::new(SqliteKvStore::open(&db).unwrap());
        let mut routines = RoutineStore::with_clock(Vec::new(), &clock);
        let bench = Exercise::named("Bench Press").with_category("Chest");
        let routine = routines
            .create_routine("Push", vec![RoutineExercise::from_exercise(&bench, 4)], None)
            .clone();
        repo.save_routines(routines.routines()).unwrap();

        let mut store = SessionStore::with_clock(repo.load_sessions(), &clock);
        let sid = store.create_session_from_routine(&routine).id.clone();
        repo.save_sessions(store.sessions()).unwrap();
        repo.set_active_session_id(&sid).unwrap();
        sid
    };

    let repo = Repository::new(SqliteKvStore::open(&db).unwrap());
    assert_eq!(repo.active_session_id().as_deref(), Some(sid.as_str()));
    let store = SessionStore::with_clock(repo.load_sessions(), &clock);
    let session = store.active_session_for_today().unwrap();
    assert_eq!(session.id, sid);
    assert_eq!(session.routine_name.as_deref(), Some("Push"));
    assert_eq!(session.exercises[0].sets.len(), 4);
    assert!(session.exercises[0].sets.iter().all(|s| !s.completed));
    assert_eq!(repo.load_routines()[0].name, "Push");
}

#[test]
fn stale_ids_change_nothing() {
    let mut store = SessionStore::with_clock(Vec::new(), clock());
    let sid = store.create_session().id.clone();
    let eid = store.add_exercise(&sid, &Exercise::named("Row")).unwrap();
    let before = store.sessions().to_vec();

    assert!(!store.remove_exercise(&sid, "gone"));
    assert!(!store.remove_set(&sid, &eid, "gone"));
    assert!(!store.toggle_set_complete("gone", &eid, "gone"));
    assert!(!store.update_set(&sid, "gone", "gone", Param::Reps, 5u32));
    assert!(store.add_set("gone", &eid).is_none());
    assert!(store.duplicate_session("gone").is_none());
    assert_eq!(store.sessions(), &before[..]);

    // a new day rolls the active session over
    store.clock().advance(Duration::days(1));
    assert!(store.active_session_for_today().is_none());
    assert_eq!(store.clock().now().date_naive().to_string(), "2026-10-17");
}
