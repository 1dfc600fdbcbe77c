use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use predicates::prelude::*;
use std::process::Command;

const LAT: &str = "-27.945563";
const LNG: &str = "25.661019";

fn cli(db: &assert_fs::fixture::ChildPath) -> Command {
    let mut cmd = Command::cargo_bin("rate_grid_cli").unwrap();
    cmd.env_remove("RATE_GRID_DB")
        .args(["--db", db.path().to_str().unwrap()]);
    cmd
}

#[test]
fn show_uses_default_grid() {
    let dir = assert_fs::TempDir::new().unwrap();
    let db = dir.child("session.db");

    cli(&db)
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dimensions: 10 rows x 10 cols"))
        .stdout(predicate::str::contains("Blocks: 0"));
}

#[test]
fn add_update_list_delete() {
    let dir = assert_fs::TempDir::new().unwrap();
    let db = dir.child("session.db");

    cli(&db)
        .args(["add", LAT, LNG, "3000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added block"));

    let output = cli(&db).arg("list").output().unwrap();
    let listing = String::from_utf8(output.stdout).unwrap();
    let id = listing.lines().next().unwrap().split(',').next().unwrap().to_string();
    assert!(listing.contains(&format!("{id},3000")));

    cli(&db)
        .args(["update", &id, "4500"])
        .assert()
        .success();
    cli(&db)
        .args(["locate", LAT, LNG])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Cell {id} (selected, rate 4500)")));

    cli(&db)
        .args(["delete", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Deleted block {id}")));
    cli(&db)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn duplicate_add_fails() {
    let dir = assert_fs::TempDir::new().unwrap();
    let db = dir.child("session.db");

    cli(&db).args(["add", LAT, LNG, "10"]).assert().success();
    cli(&db)
        .args(["add", LAT, LNG, "20"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn locate_outside_grid_fails() {
    let dir = assert_fs::TempDir::new().unwrap();
    let db = dir.child("session.db");

    cli(&db)
        .args(["locate", "0.0", "0.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No grid cell found"));
}

#[test]
fn init_requires_confirmation_when_blocks_exist() {
    let dir = assert_fs::TempDir::new().unwrap();
    let db = dir.child("session.db");

    cli(&db).args(["batch", "applied", "50", "0-0", "1-1"]).assert().success();
    cli(&db)
        .args(["init", "--rows", "4", "--cols", "4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("confirmation required"));
    cli(&db)
        .args(["init", "--rows", "4", "--cols", "4", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated 4x4 grid, discarded 2 block(s)"));
    cli(&db)
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dimensions: 4 rows x 4 cols"));
}

#[test]
fn part_file_export_and_import() {
    let dir = assert_fs::TempDir::new().unwrap();
    let db = dir.child("session.db");
    let part = dir.child("field.part");
    let part_path = part.path().to_str().unwrap();

    cli(&db)
        .args(["batch", "selected", "1200", "2-3", "7-8", "9-9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set 3 cell(s) to selected"));
    cli(&db)
        .args(["export-part", part_path])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 3 record(s)"));
    assert_eq!(std::fs::metadata(part.path()).unwrap().len(), 60);

    cli(&db).arg("clear").assert().success();
    cli(&db)
        .args(["import-part", part_path])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 3 block(s), skipped 0"));
    cli(&db)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("7-8,1200"));
}

#[test]
fn malformed_part_file_is_reported() {
    let dir = assert_fs::TempDir::new().unwrap();
    let db = dir.child("session.db");
    let part = dir.child("bad.part");
    part.write_binary(&[1u8; 19]).unwrap();

    cli(&db)
        .args(["import-part", part.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed part file"));
}

#[test]
fn json_backup_and_geojson_export() {
    let dir = assert_fs::TempDir::new().unwrap();
    let db = dir.child("session.db");
    let json = dir.child("blocks.json");
    let geojson = dir.child("grid.geojson");

    cli(&db).args(["batch", "applied", "80", "4-4"]).assert().success();
    cli(&db)
        .args(["export-json", json.path().to_str().unwrap()])
        .assert()
        .success();
    json.assert(predicate::str::contains("\"targetRate\": 80"));

    cli(&db).arg("clear").assert().success();
    cli(&db)
        .args(["import-json", json.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 block(s)"));

    cli(&db)
        .args(["export-geojson", geojson.path().to_str().unwrap()])
        .assert()
        .success();
    geojson.assert(predicate::str::contains("FeatureCollection"));
}

#[test]
fn export_json_without_blocks_fails() {
    let dir = assert_fs::TempDir::new().unwrap();
    let db = dir.child("session.db");
    let json = dir.child("blocks.json");

    cli(&db)
        .args(["export-json", json.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No valid blocks"));
}

#[test]
fn applied_status_persists_between_commands() {
    let dir = assert_fs::TempDir::new().unwrap();
    let db = dir.child("session.db");

    cli(&db).args(["batch", "applied", "80", "4-4"]).assert().success();
    cli(&db).arg("show").assert().success();

    let output = cli(&db).arg("list").output().unwrap();
    assert!(String::from_utf8(output.stdout).unwrap().contains("4-4,80"));

    let geojson = dir.child("grid.geojson");
    cli(&db)
        .args(["export-geojson", geojson.path().to_str().unwrap()])
        .assert()
        .success();
    geojson.assert(predicate::str::contains("\"status\":\"applied\""));
}

#[test]
fn non_finite_coordinates_are_rejected() {
    let dir = assert_fs::TempDir::new().unwrap();
    let db = dir.child("session.db");

    cli(&db)
        .args(["add", "NaN", "NaN", "100"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No grid cell found"));
    cli(&db)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}
