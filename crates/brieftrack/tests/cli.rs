#![cfg(feature = "cli")]

mod common;

use assert_cmd::Command;
use common::{block_texture, paste};
use predicates::prelude::*;
use std::path::Path;

fn save_png(img: &brieftrack::GrayImage, path: &Path) {
    ::image::GrayImage::from_raw(img.width as u32, img.height as u32, img.data.clone())
        .expect("buffer")
        .save(path)
        .expect("save png");
}

fn brieftrack() -> Command {
    Command::cargo_bin("brieftrack").expect("binary")
}

#[test]
fn build_inspect_and_track() {
    let dir = tempfile::tempdir().expect("tempdir");
    let reference = block_texture(200, 200, 6, 7);
    let ref_png = dir.path().join("reference.png");
    save_png(&reference, &ref_png);
    let frame_png = dir.path().join("frame.png");
    save_png(&paste(&reference, 300, 260, 20, 30), &frame_png);
    let blank_png = dir.path().join("blank.png");
    save_png(&brieftrack::GrayImage::filled(300, 260, 0), &blank_png);
    let model = dir.path().join("model.bin");

    brieftrack()
        .args(["build-model", "--image"])
        .arg(&ref_png)
        .arg("--out")
        .arg(&model)
        .assert()
        .success()
        .stdout(predicate::str::contains("features"));

    brieftrack()
        .args(["inspect", "--model"])
        .arg(&model)
        .assert()
        .success()
        .stdout(predicate::str::contains("target size:        200 x 200"));

    let out = brieftrack()
        .args(["track", "--model"])
        .arg(&model)
        .arg(&frame_png)
        .arg(&blank_png)
        .output()
        .expect("run");
    assert!(out.status.success());
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json report");
    let frames = report.as_array().expect("array");
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0]["status"], "tracked");
    assert_eq!(frames[1]["status"], "lost");
    // the lost frame still reports the last good homography
    assert_eq!(frames[0]["homography"], frames[1]["homography"]);
    assert!(frames[1]["outline"].is_array());
}

#[test]
fn missing_model_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    brieftrack()
        .args(["inspect", "--model"])
        .arg(dir.path().join("nope.bin"))
        .assert()
        .failure();
}
