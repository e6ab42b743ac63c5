//! Stdout capture runs as the only test in its binary: the harness reports
//! results on the same descriptor, so a second test could write into it.
#![cfg(unix)]

use pretty_assertions::assert_eq;
use shell_exec::capture::Capture;
use shell_exec::{PreparedCommand, config};
use std::io::Write;

#[test]
fn stdout_routing_seen_through_the_real_descriptor() {
    // run: stdout hidden outside verbose mode
    let cap = Capture::stdout().expect("capture stdout");
    PreparedCommand::new("echo", ["hello world"])
        .run()
        .expect("echo succeeds");
    assert_eq!(cap.output(), "");

    // run: shown in verbose mode
    config::set_verbose(true);
    let cap = Capture::stdout().expect("capture stdout");
    PreparedCommand::new("echo", ["hello world"])
        .run()
        .expect("echo succeeds");
    assert_eq!(cap.output(), "hello world\n");

    // output: captured and teed in verbose mode
    let cap = Capture::stdout().expect("capture stdout");
    let text = PreparedCommand::new("echo", ["hello world"])
        .output()
        .expect("echo succeeds");
    assert_eq!(text, "hello world");
    assert_eq!(cap.output(), "hello world\n");
    config::set_verbose(false);

    // output: not teed otherwise
    let cap = Capture::stdout().expect("capture stdout");
    let text = PreparedCommand::new("echo", ["quiet"])
        .output()
        .expect("echo succeeds");
    assert_eq!(text, "quiet");
    assert_eq!(cap.output(), "");

    // run_v turns stdout back on after silent
    let cap = Capture::stdout().expect("capture stdout");
    PreparedCommand::new("echo", ["hello world"])
        .silent()
        .run_v()
        .expect("echo succeeds");
    assert_eq!(cap.output(), "hello world\n");

    // direct writes, and release being idempotent
    let mut cap = Capture::stdout().expect("capture stdout");
    std::io::stdout()
        .write_all(b"direct\n")
        .expect("write to captured stdout");
    cap.release();
    cap.release();
    assert!(cap.is_released());
    assert_eq!(cap.output(), "direct\n");
}
