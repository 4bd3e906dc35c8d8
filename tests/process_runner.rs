// tests/process_runner.rs
mod common;
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::fs;
use std::time::{Duration, Instant};

use keysweep::errors::RunError;
use keysweep::exec::{Invocation, ProcessRunner, RunEvent, RunStatus, shell_quote};

type TestResult = Result<(), Box<dyn Error>>;

fn runner() -> ProcessRunner {
    ProcessRunner::new(Duration::from_millis(200))
}

#[tokio::test]
async fn lines_arrive_in_order_then_exit_code() -> TestResult {
    init_tracing();

    let handle = runner().start(Invocation::shell("printf 'a\\nb\\nc\\n'; exit 3"));
    let result = with_timeout(handle.wait()).await;

    assert_eq!(result.lines, vec!["a", "b", "c"]);
    assert_eq!(result.exit_code(), Some(3));
    assert_eq!(result.text(), "a\nb\nc");
    Ok(())
}

#[tokio::test]
async fn terminal_event_is_last() -> TestResult {
    init_tracing();

    let mut handle = runner().start(Invocation::shell("echo one; echo two"));
    let mut events = Vec::new();
    while let Some(event) = with_timeout(handle.next_event()).await {
        events.push(event);
    }

    assert_eq!(events.len(), 3);
    assert!(matches!(&events[0], RunEvent::Line(l) if l == "one"));
    assert!(matches!(&events[1], RunEvent::Line(l) if l == "two"));
    assert!(matches!(events[2], RunEvent::Completed(0)));
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    Ok(())
}

#[tokio::test]
async fn stderr_is_merged_in_write_order() -> TestResult {
    init_tracing();

    let handle = runner().start(Invocation::shell(
        "echo out1; echo err1 >&2; echo out2; echo err2 >&2",
    ));
    let result = with_timeout(handle.wait()).await;

    assert_eq!(result.lines, vec!["out1", "err1", "out2", "err2"]);
    assert_eq!(result.exit_code(), Some(0));
    Ok(())
}

#[tokio::test]
async fn wait_with_sees_each_line_as_it_arrives() -> TestResult {
    init_tracing();

    let handle = runner().start(Invocation::argv("sh", ["-c", "echo x; echo y"]));
    let mut seen = Vec::new();
    let result = with_timeout(handle.wait_with(|line| seen.push(line.to_string()))).await;

    assert_eq!(seen, result.lines);
    assert_eq!(seen, vec!["x", "y"]);
    Ok(())
}

#[tokio::test]
async fn invalid_utf8_is_replaced_and_crlf_trimmed() -> TestResult {
    init_tracing();

    let handle = runner().start(Invocation::shell("printf 'ok\\r\\nbad\\377byte\\nlast'"));
    let result = with_timeout(handle.wait()).await;

    assert_eq!(result.lines, vec!["ok", "bad\u{FFFD}byte", "last"]);
    Ok(())
}

#[tokio::test]
async fn capture_file_holds_raw_bytes() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let capture = dir.path().join("raw.txt");

    let handle = runner().start(
        Invocation::shell("printf 'one\\r\\ntwo\\377\\n'; echo three >&2").with_capture_to(&capture),
    );
    let result = with_timeout(handle.wait()).await;

    assert_eq!(result.exit_code(), Some(0));
    assert_eq!(fs::read(&capture)?, b"one\r\ntwo\xff\nthree\n");
    Ok(())
}

#[tokio::test]
async fn missing_program_is_a_launch_failure_with_no_lines() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let capture = dir.path().join("raw.txt");

    let handle = runner().start(
        Invocation::argv("keysweep-definitely-not-installed", ["x"]).with_capture_to(&capture),
    );
    let result = with_timeout(handle.wait()).await;

    assert!(result.lines.is_empty());
    match result.status {
        RunStatus::Failed(RunError::Launch { program, .. }) => {
            assert_eq!(program, "keysweep-definitely-not-installed");
        }
        other => panic!("expected launch failure, got {other:?}"),
    }
    assert!(!capture.exists(), "no capture for a process that never ran");
    Ok(())
}

#[tokio::test]
async fn invalid_working_dir_is_a_launch_failure() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;

    let handle = runner()
        .start(Invocation::shell("echo hi").with_working_dir(dir.path().join("missing")));
    let result = with_timeout(handle.wait()).await;

    assert!(result.lines.is_empty());
    assert!(matches!(result.status, RunStatus::Failed(RunError::Launch { .. })));
    Ok(())
}

#[tokio::test]
async fn working_dir_is_applied() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("marker.txt"), "here\n")?;

    let handle = runner().start(Invocation::shell("cat marker.txt").with_working_dir(dir.path()));
    let result = with_timeout(handle.wait()).await;

    assert_eq!(result.lines, vec!["here"]);
    Ok(())
}

#[tokio::test]
async fn argv_arguments_are_not_shell_interpreted() -> TestResult {
    init_tracing();

    let handle = runner().start(Invocation::argv("echo", ["$HOME; rm -rf /tmp/x", "*"]));
    let result = with_timeout(handle.wait()).await;

    assert_eq!(result.lines, vec!["$HOME; rm -rf /tmp/x *"]);
    Ok(())
}

#[tokio::test]
async fn shell_quote_survives_hostile_paths() -> TestResult {
    init_tracing();
    let hostile = "it's a $(dangerous) `name`; echo pwned";

    let handle = runner().start(Invocation::shell(format!("printf '%s\\n' {}", shell_quote(hostile))));
    let result = with_timeout(handle.wait()).await;

    assert_eq!(result.lines, vec![hostile]);
    Ok(())
}

#[tokio::test]
async fn cancel_keeps_earlier_lines_and_reports_cancelled() -> TestResult {
    init_tracing();
    let runner = runner();

    let mut handle = runner.start(Invocation::shell("echo a; echo b; sleep 30; echo never"));
    let mut lines = Vec::new();
    while lines.len() < 2 {
        match with_timeout(handle.next_event()).await {
            Some(RunEvent::Line(line)) => lines.push(line),
            other => panic!("expected a line, got {other:?}"),
        }
    }

    assert_eq!(runner.active_runs(), vec![handle.id()]);
    assert!(handle.cancel());

    let result = with_timeout(handle.wait()).await;
    assert!(result.is_cancelled());
    assert_eq!(result.exit_code(), None);
    assert!(result.lines.is_empty(), "no lines after the ones already consumed");
    assert_eq!(lines, vec!["a", "b"]);
    Ok(())
}

#[tokio::test]
async fn cancel_escalates_when_sigterm_is_ignored() -> TestResult {
    init_tracing();
    let runner = runner();

    let handle = runner.start(Invocation::shell("trap '' TERM; echo ready; sleep 30"));
    let canceller = handle.canceller();

    let result = with_timeout(handle.wait_with(|line| {
        if line == "ready" {
            canceller.cancel();
        }
    }))
    .await;

    assert!(result.is_cancelled());
    assert_eq!(result.lines, vec!["ready"]);
    Ok(())
}

#[tokio::test]
async fn cancel_kills_group_members_that_outlive_the_leader() -> TestResult {
    init_tracing();
    let runner = runner();

    // The subshell ignores SIGTERM and keeps the pipe open after the
    // leading `sh` has exited.
    let handle = runner.start(Invocation::shell(
        "(trap '' TERM; echo ready; exec sleep 30); true",
    ));
    let canceller = handle.canceller();

    let started = Instant::now();
    let result = with_timeout(handle.wait_with(|line| {
        if line == "ready" {
            canceller.cancel();
        }
    }))
    .await;

    assert!(result.is_cancelled());
    assert_eq!(result.lines, vec!["ready"]);
    assert!(
        started.elapsed() < Duration::from_secs(5),
        "run lasted {:?}; grace period is 200ms",
        started.elapsed()
    );
    Ok(())
}

#[tokio::test]
async fn delivered_cancel_always_ends_cancelled() -> TestResult {
    init_tracing();
    let runner = runner();

    // Short runs, cancelled at varying points around their exit.
    for i in 0..20u64 {
        let handle = runner.start(Invocation::shell("echo hi"));
        let canceller = handle.canceller();
        let delay = Duration::from_millis(i % 5);
        let cancel = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            canceller.cancel()
        });

        let result = with_timeout(handle.wait()).await;
        let delivered = cancel.await?;

        assert_eq!(
            delivered,
            result.is_cancelled(),
            "iteration {i}: cancel() returned {delivered}, run status {:?}",
            result.status
        );
    }
    Ok(())
}

#[tokio::test]
async fn cancel_all_reaches_every_active_run() -> TestResult {
    init_tracing();
    let runner = runner();

    let first = runner.start(Invocation::shell("echo go; sleep 30"));
    let second = runner.start(Invocation::shell("echo go; sleep 30"));
    assert_ne!(first.id(), second.id());

    // Give both processes time to start before cancelling.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(runner.cancel_all(), 2);

    let (a, b) = with_timeout(async { tokio::join!(first.wait(), second.wait()) }).await;
    assert!(a.is_cancelled());
    assert!(b.is_cancelled());
    assert!(runner.active_runs().is_empty());
    Ok(())
}

#[tokio::test]
async fn cancelling_a_finished_run_is_a_no_op() -> TestResult {
    init_tracing();
    let runner = runner();

    let handle = runner.start(Invocation::shell("echo done"));
    let id = handle.id();
    let canceller = handle.canceller();
    let result = with_timeout(handle.wait()).await;

    assert_eq!(result.exit_code(), Some(0));
    assert!(!canceller.cancel());
    assert!(!runner.cancel(id));
    assert!(!runner.cancel(9_999));
    Ok(())
}

#[tokio::test]
async fn concurrent_runs_do_not_mix_output() -> TestResult {
    init_tracing();
    let runner = runner();

    let handles: Vec<_> = (0..4)
        .map(|n| runner.start(Invocation::shell(format!("for i in 1 2 3 4 5; do echo {n}-$i; done"))))
        .collect();

    for (n, handle) in handles.into_iter().enumerate() {
        let result = with_timeout(handle.wait()).await;
        let expected: Vec<String> = (1..=5).map(|i| format!("{n}-{i}")).collect();
        assert_eq!(result.lines, expected);
    }
    Ok(())
}
