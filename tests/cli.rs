use assert_cmd::prelude::*;
use predicates::str::contains;
use std::process::Command;

fn tumble() -> Command {
    Command::cargo_bin("tumble").expect("binary exists")
}

#[test]
fn runs_headless_with_the_builtin_cube() {
    tumble()
        .args(["--summary-only", "--frames", "1"])
        .assert()
        .success()
        .stdout(contains("Loaded scene with 1 model(s) and 1 actor(s)"))
        .stdout(contains(" - cube (1 part(s))"))
        .stdout(contains("cube: idle rotation=0.0 deg"));
}

#[test]
fn spin_scenario_rolls_a_quarter_turn_and_returns_to_idle() {
    tumble()
        .args(["--summary-only", "--spin", "z", "--frames", "120"])
        .assert()
        .success()
        .stdout(contains("rotation=90.0 deg"))
        .stdout(contains("cube: idle"));
}

#[test]
fn loads_an_obj_model_with_materials() {
    let dir = tempfile::tempdir().expect("temp dir");
    std::fs::write(
        dir.path().join("widget.mtl"),
        "newmtl body\nKd 0.8 0.2 0.2\nnewmtl trim\nKd 0.2 0.2 0.8\n",
    )
    .expect("write mtl");
    let obj_path = dir.path().join("widget.obj");
    std::fs::write(
        &obj_path,
        "mtllib widget.mtl\n\
         v 0 0 0\nv 1 0 0\nv 0 1 0\nv 0 0 1\n\
         usemtl body\nf 1 2 3\n\
         usemtl trim\nf 1 3 4\n",
    )
    .expect("write obj");

    tumble()
        .arg(&obj_path)
        .args(["--summary-only", "--frames", "1"])
        .assert()
        .success()
        .stdout(contains("Loaded scene with 1 model(s) and 1 actor(s)"))
        .stdout(contains(" - widget (2 part(s))"));
}

#[test]
fn reports_model_load_failures() {
    let dir = tempfile::tempdir().expect("temp dir");
    let obj_path = dir.path().join("broken.obj");
    std::fs::write(&obj_path, "v 0 zero 0\nf 1 1 1\n").expect("write obj");

    tumble()
        .arg(&obj_path)
        .arg("--summary-only")
        .assert()
        .failure()
        .stderr(contains("failed to load model"));
}

#[test]
fn rejects_unknown_arguments() {
    tumble()
        .arg("--what")
        .assert()
        .failure()
        .stderr(contains("Unknown argument"));
}
