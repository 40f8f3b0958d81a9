// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use assert_cmd::Command;

#[test]
fn compute_requires_msdir() {
    let mut cmd = Command::cargo_bin("pointing-offset").unwrap();
    cmd.arg("compute").assert().failure();
}

#[test]
fn compute_rejects_rfi_file_without_apply_mask() {
    let mut cmd = Command::cargo_bin("pointing-offset").unwrap();
    cmd.args(["compute", "--msdir", ".", "--rfi_file", "mask.txt"])
        .assert()
        .failure();
}

#[test]
fn help_mentions_compute_subcommand() {
    let mut cmd = Command::cargo_bin("pointing-offset").unwrap();
    let output = cmd.arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("compute"));
}
