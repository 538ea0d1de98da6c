use assert_cmd::prelude::*;
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn write_scene() -> NamedTempFile {
    let gltf = r#"{
        "asset": {"version": "2.0"},
        "scene": 0,
        "scenes": [{"name": "Panorama", "nodes": [0, 1]}],
        "nodes": [
            {"name": "Box", "mesh": 0},
            {"name": "rig", "translation": [0, 10, 0]}
        ],
        "meshes": [{"name": "BoxMesh"}]
    }"#;

    let mut tmp = NamedTempFile::new().expect("temp scene");
    tmp.write_all(gltf.as_bytes()).expect("write scene");
    tmp
}

#[test]
fn summary_reports_scene_and_fullscreen_mode() {
    let scene = write_scene();
    let mut cmd = Command::cargo_bin("viewer360").expect("binary exists");
    cmd.arg(scene.path()).arg("--summary-only");
    cmd.assert()
        .success()
        .stdout(contains("Loaded scene with 2 objects (1 mesh instances)"))
        .stdout(contains(" - Box (mesh)"))
        .stdout(contains(" - rig (group)"))
        .stdout(contains("Presentation mode: fullscreen"))
        .stdout(contains("Control label: FULLSCREEN"));
}

#[test]
fn mock_headset_selects_immersive_mode() {
    let scene = write_scene();
    let mut cmd = Command::cargo_bin("viewer360").expect("binary exists");
    cmd.arg(scene.path()).arg("--mock-vr").arg("--summary-only");
    cmd.assert()
        .success()
        .stdout(contains("Presentation mode: immersive (Mock Headset)"))
        .stdout(contains("Control label: ENTER VR"));
}

#[test]
fn missing_scene_is_reported_not_fatal() {
    let mut cmd = Command::cargo_bin("viewer360").expect("binary exists");
    cmd.arg("/nonexistent/scene.gltf").arg("--summary-only");
    cmd.assert()
        .success()
        .stdout(contains("Scene failed to load:"))
        .stdout(contains("Control label: FULLSCREEN"));
}

#[test]
fn unknown_arguments_are_rejected() {
    let mut cmd = Command::cargo_bin("viewer360").expect("binary exists");
    cmd.arg("scene.gltf").arg("--bogus");
    cmd.assert()
        .failure()
        .stderr(contains("Unknown argument"));
}
