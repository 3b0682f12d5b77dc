use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_fake_pilot(bin_path: &Path, exit_code: u8) {
    let script = format!(
        r#"#!/usr/bin/env bash
set -u

if [[ -n "${{RCYCLER_TEST_PILOT_LOG:-}}" ]]; then
  printf "%s\n" "$*" >> "${{RCYCLER_TEST_PILOT_LOG}}"
fi

exit {exit_code}
"#
    );
    fs::write(bin_path, script).expect("write fake pilot");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(bin_path).expect("metadata").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(bin_path, perms).expect("chmod");
    }
}

#[test]
fn run_drives_the_helper_and_archives_the_run_log() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("cycler");
    let resume = tmp.path().join("resume-a.pdf");
    let pilot = tmp.path().join("portal-pilot");
    let pilot_log = tmp.path().join("pilot.log");
    fs::create_dir_all(&home).expect("mkdir home");
    fs::write(&resume, "%PDF-1.4 fake resume\n").expect("write resume");
    write_fake_pilot(&pilot, 0);

    assert_cmd::cargo::cargo_bin_cmd!("rcycler")
        .current_dir(tmp.path())
        .env("RCYCLER_HOME", &home)
        .env("RCYCLER_PILOT_BIN", &pilot)
        .env("RCYCLER_TEST_PILOT_LOG", &pilot_log)
        .env("RCYCLER_RESUME_FILES", resume.to_string_lossy().to_string())
        .env("PORTAL_USERNAME", "someone@example.com")
        .env("PORTAL_PASSWORD", "hunter2")
        .arg("run")
        .arg("--no-preflight")
        .assert()
        .success()
        .stdout(predicates::str::contains("run_number=1"));

    let invocations = fs::read_to_string(&pilot_log).expect("read pilot log");
    assert!(invocations.contains("login --url"));
    assert!(invocations.contains("goto --url"));
    assert!(invocations.contains("upload --url"));
    assert!(invocations.contains("resume-a.pdf"));

    let archive = home.join("logs/run_archive.log");
    let raw = fs::read_to_string(&archive).expect("read archive");
    assert!(raw.contains("starting automation run"));
    assert!(raw.contains("resume upload completed"));
    assert!(raw.trim_end().ends_with("| RUN NO : 1"));

    let state_raw = fs::read_to_string(home.join("state/rotation.json")).expect("read state");
    assert!(state_raw.contains("last_resume_sha256"));
}

#[test]
fn helper_failure_is_reported_but_the_run_is_still_archived() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("cycler");
    let resume = tmp.path().join("resume-a.pdf");
    let pilot = tmp.path().join("portal-pilot");
    fs::create_dir_all(&home).expect("mkdir home");
    fs::write(&resume, "%PDF-1.4 fake resume\n").expect("write resume");
    write_fake_pilot(&pilot, 1);

    assert_cmd::cargo::cargo_bin_cmd!("rcycler")
        .current_dir(tmp.path())
        .env("RCYCLER_HOME", &home)
        .env("RCYCLER_PILOT_BIN", &pilot)
        .env("RCYCLER_RESUME_FILES", resume.to_string_lossy().to_string())
        .env("RCYCLER_PILOT_RETRIES", "0")
        .env("PORTAL_USERNAME", "someone@example.com")
        .env("PORTAL_PASSWORD", "hunter2")
        .arg("run")
        .arg("--no-preflight")
        .assert()
        .failure()
        .stderr(predicates::str::contains("upload failed"));

    let raw =
        fs::read_to_string(home.join("logs/run_archive.log")).expect("read archive");
    assert!(raw.contains("automation step failed"));
    assert!(raw.trim_end().ends_with("| RUN NO : 1"));
}

#[test]
fn consecutive_runs_rotate_resumes_and_number_monotonically() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("cycler");
    let resume_a = tmp.path().join("resume-a.pdf");
    let resume_b = tmp.path().join("resume-b.pdf");
    let pilot = tmp.path().join("portal-pilot");
    let pilot_log = tmp.path().join("pilot.log");
    fs::create_dir_all(&home).expect("mkdir home");
    fs::write(&resume_a, "fake resume a\n").expect("write resume a");
    fs::write(&resume_b, "fake resume b\n").expect("write resume b");
    write_fake_pilot(&pilot, 0);

    let files = format!(
        "{},{}",
        resume_a.to_string_lossy(),
        resume_b.to_string_lossy()
    );
    for expected in ["run_number=1", "run_number=2", "run_number=3"] {
        assert_cmd::cargo::cargo_bin_cmd!("rcycler")
            .current_dir(tmp.path())
            .env("RCYCLER_HOME", &home)
            .env("RCYCLER_PILOT_BIN", &pilot)
            .env("RCYCLER_TEST_PILOT_LOG", &pilot_log)
            .env("RCYCLER_RESUME_FILES", &files)
            .env("PORTAL_USERNAME", "someone@example.com")
            .env("PORTAL_PASSWORD", "hunter2")
            .arg("run")
            .arg("--no-preflight")
            .assert()
            .success()
            .stdout(predicates::str::contains(expected));
    }

    let invocations = fs::read_to_string(&pilot_log).expect("read pilot log");
    let uploads: Vec<&str> = invocations
        .lines()
        .filter(|line| line.starts_with("upload"))
        .collect();
    assert_eq!(uploads.len(), 3);
    assert!(uploads[0].contains("resume-a.pdf"));
    assert!(uploads[1].contains("resume-b.pdf"));
    assert!(uploads[2].contains("resume-a.pdf"));
}

#[test]
fn missing_credentials_fail_the_login_step_but_archival_still_runs() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("cycler");
    let resume = tmp.path().join("resume-a.pdf");
    let pilot = tmp.path().join("portal-pilot");
    fs::create_dir_all(&home).expect("mkdir home");
    fs::write(&resume, "fake resume\n").expect("write resume");
    write_fake_pilot(&pilot, 0);

    assert_cmd::cargo::cargo_bin_cmd!("rcycler")
        .current_dir(tmp.path())
        .env("RCYCLER_HOME", &home)
        .env("RCYCLER_PILOT_BIN", &pilot)
        .env("RCYCLER_RESUME_FILES", resume.to_string_lossy().to_string())
        .env_remove("PORTAL_USERNAME")
        .env_remove("PORTAL_PASSWORD")
        .arg("run")
        .arg("--no-preflight")
        .assert()
        .failure()
        .stderr(predicates::str::contains("PORTAL_USERNAME"));

    let raw =
        fs::read_to_string(home.join("logs/run_archive.log")).expect("read archive");
    assert!(raw.trim_end().ends_with("| RUN NO : 1"));
}
