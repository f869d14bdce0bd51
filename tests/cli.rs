use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn gymtrack(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("gymtrack").unwrap();
    cmd.env("GYMTRACK_DB", dir.join("gymtrack.db"))
        .env("GYMTRACK_CONFIG", dir.join("config.json"))
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn logs_a_workout_end_to_end() {
    let dir = TempDir::new().unwrap();
    let d = dir.path();

    gymtrack(d)
        .arg("start")
        .assert()
        .success()
        .stdout(predicate::str::contains("Started workout"));
    gymtrack(d).arg("start").assert().failure();

    gymtrack(d)
        .args(["add-exercise", "Squat"])
        .assert()
        .success()
        .stdout(predicate::str::contains("exercise #1"));
    gymtrack(d).args(["add-set", "1"]).assert().success();
    gymtrack(d).args(["set", "1", "1", "weight", "80"]).assert().success();
    gymtrack(d).args(["set", "1", "1", "reps", "5"]).assert().success();
    gymtrack(d).args(["set", "1", "1", "time", "30"]).assert().failure();
    gymtrack(d).args(["done", "1", "1"]).assert().success();

    gymtrack(d)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Squat"))
        .stdout(predicate::str::contains("[x] 80 kg · 5 reps"));

    gymtrack(d)
        .arg("finish")
        .assert()
        .success()
        .stdout(predicate::str::contains("1/2 sets, 400 kg"));

    gymtrack(d)
        .args(["stats", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"totalCompletedSets\": 1"))
        .stdout(predicate::str::contains("\"streak\": 1"));

    gymtrack(d)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("No open workout"));
}

#[test]
fn routines_start_prefilled_workouts() {
    let dir = TempDir::new().unwrap();
    let d = dir.path();

    gymtrack(d)
        .args(["routine", "create", "Pull", "-e", "Deadlift:2", "-e", "Pull-ups"])
        .assert()
        .success();
    gymtrack(d)
        .args(["routine", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deadlift×2"))
        .stdout(predicate::str::contains("Pull-ups×3"));

    gymtrack(d).args(["start", "--routine", "pull"]).assert().success();
    gymtrack(d)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pull"))
        .stdout(predicate::str::contains("2. 🧗 Pull-ups"));
}

#[test]
fn short_rest_finishes_without_input() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("config.json"),
        r#"{"tickIntervalMs": 20, "sound": false}"#,
    )
    .unwrap();

    gymtrack(dir.path())
        .args(["rest", "0", "--label", "Plank"])
        .write_stdin("")
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .success()
        .stdout(predicate::str::contains("Rest over"));
}

#[test]
fn export_and_import_between_databases() {
    let source = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    let backup = source.path().join("backup.json");

    gymtrack(source.path()).arg("start").assert().success();
    gymtrack(source.path()).args(["add-exercise", "Plank"]).assert().success();
    gymtrack(source.path()).arg("finish").assert().success();
    gymtrack(source.path())
        .arg("export")
        .arg(&backup)
        .assert()
        .success();

    gymtrack(target.path())
        .arg("import")
        .arg(&backup)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 workouts"));
    gymtrack(target.path())
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("0/1 sets"));

    std::fs::write(&backup, "{broken").unwrap();
    gymtrack(target.path()).arg("import").arg(&backup).assert().failure();
}

#[test]
fn calendar_and_history_by_date() {
    let dir = TempDir::new().unwrap();
    let d = dir.path();
    let backup = d.join("september.json");
    std::fs::write(
        &backup,
        r#"{"version": 1, "workouts": [
            {"id": "w1", "date": "2026-09-03", "startTime": "07:00", "endTime": "08:00", "exercises": []},
            {"id": "w2", "date": "2026-09-03", "startTime": "18:00", "endTime": "18:40", "exercises": []},
            {"id": "w3", "date": "2026-09-10", "startTime": "12:00", "endTime": null, "exercises": []},
            {"id": "w4", "date": "2026-10-01", "startTime": "12:00", "endTime": "13:00", "exercises": []}
        ]}"#,
    )
    .unwrap();
    gymtrack(d).arg("import").arg(&backup).assert().success();

    gymtrack(d)
        .args(["calendar", "--month", "2026-09"])
        .assert()
        .success()
        .stdout(predicate::str::contains("September 2026"))
        .stdout(predicate::str::contains("* 2026-09-03 Thu 2 workouts"))
        .stdout(predicate::str::contains("  2026-09-10 Thu 1 workout"))
        .stdout(predicate::str::contains("2026-10-01").count(1))
        .stdout(predicate::str::contains("Last finished: 2026-10-01"));
    gymtrack(d)
        .args(["calendar", "--month", "2026-08"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no workouts"));
    gymtrack(d).args(["calendar", "--month", "sept"]).assert().failure();

    gymtrack(d)
        .args(["history", "--date", "2026-09-03"])
        .assert()
        .success()
        .stdout(predicate::str::contains("w1"))
        .stdout(predicate::str::contains("w2"))
        .stdout(predicate::str::contains("w3").not())
        .stdout(predicate::str::contains("w4").not());
}
