// Drives the compiled binary through a PTY.
//
// Notes:
// - Requires a TTY; uses expectrl which allocates a pseudo terminal.
// - Unix-only and ignored by default. The run writes the config file.
// - Run manually via: `cargo test --test integration_min_session -- --ignored`.

#![cfg(unix)]

use std::time::Duration;

use expectrl::{spawn, Eof};

#[test]
#[ignore]
fn starts_and_quits_on_escape() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let log = dir.path().join("mindtick.log");
    let bin = assert_cmd::cargo::cargo_bin("mindtick");
    let cmd = format!(
        "{} --in-memory --mute --exercise math --log-file {}",
        bin.display(),
        log.display()
    );

    let mut p = spawn(cmd)?;
    std::thread::sleep(Duration::from_millis(300));

    // one question's worth of typing, a tab to switch, then quit
    p.send("12\r")?;
    p.send("\t")?;
    std::thread::sleep(Duration::from_millis(200));
    p.send("\x1b")?;

    p.expect(Eof)?;
    let logged = std::fs::read_to_string(&log)?;
    assert!(logged.contains("mounted exercise"));
    Ok(())
}
