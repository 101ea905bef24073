//! Open/toggle/close lifecycle of sessions

use crate::common::harness::{SessionHarness, TERMINATED_CODE};
use termtoggle::app::{OpenOutcome, OpenRequest, SessionError};
use termtoggle::config::Config;
use termtoggle::host::SpawnError;
use termtoggle::model::{CommandLine, Layout, SessionKey, SessionState, SplitDirection};
use termtoggle::partial_config::PartialSessionConfig;

fn key(k: &str) -> SessionKey {
    SessionKey::new(k)
}

fn options(persist: bool) -> OpenRequest {
    OpenRequest {
        options: PartialSessionConfig {
            persist: Some(persist),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn state(harness: &SessionHarness, k: &str) -> Option<SessionState> {
    harness.controller.session(&key(k)).map(|s| s.state())
}

/// The shell-a walkthrough: open, hide, show, close
#[test]
fn test_shell_a_scenario() {
    crate::common::tracing::init_tracing_from_env();
    let mut harness = SessionHarness::new();

    assert_eq!(harness.open("shell-a", "bash").unwrap(), OpenOutcome::Started);
    assert_eq!(state(&harness, "shell-a"), Some(SessionState::Visible));
    let buffer = harness.buffer_of("shell-a").unwrap();
    let window = harness.window_of("shell-a").unwrap();

    let (_, outcome) = harness.controller.toggle(Some("shell-a")).unwrap();
    assert_eq!(outcome, OpenOutcome::Hidden);
    assert_eq!(state(&harness, "shell-a"), Some(SessionState::Hidden));
    assert!(harness.windows.0.borrow().window(window).is_none());
    assert_eq!(harness.buffer_of("shell-a"), Some(buffer));

    let (_, outcome) = harness.controller.toggle(Some("shell-a")).unwrap();
    assert_eq!(outcome, OpenOutcome::Shown);
    assert_eq!(state(&harness, "shell-a"), Some(SessionState::Visible));
    assert_eq!(harness.buffer_of("shell-a"), Some(buffer));
    assert_eq!(harness.processes.spawn_count(), 1);

    harness.controller.close(Some("shell-a")).unwrap();
    assert!(harness.controller.session(&key("shell-a")).is_none());
    assert_eq!(harness.window_count(), 0);
}

#[test]
fn test_double_open_hides() {
    let mut harness = SessionHarness::new();
    harness.open("k", "htop").unwrap();
    assert_eq!(harness.open("k", "htop").unwrap(), OpenOutcome::Hidden);
    assert_eq!(state(&harness, "k"), Some(SessionState::Hidden));
    assert_eq!(harness.window_count_for("k"), 0);
    assert_eq!(harness.window_count(), 0);

    // Process and buffer survive a plain hide
    let process = harness.process_of("k").unwrap();
    assert!(harness.processes.alive(process));
    assert_eq!(harness.buffer_count(), 1);
}

#[test]
fn test_persist_reuses_buffer_after_host_closes_window() {
    let mut harness = SessionHarness::new();
    harness
        .open_with("k", "bash", Layout::Floating, options(true))
        .unwrap();
    let buffer = harness.buffer_of("k").unwrap();
    let process = harness.process_of("k").unwrap();

    harness.close_window_externally("k");
    assert_eq!(harness.open("k", "bash").unwrap(), OpenOutcome::Shown);
    assert_eq!(harness.buffer_of("k"), Some(buffer));
    assert_eq!(harness.process_of("k"), Some(process));
    assert_eq!(harness.window_count_for("k"), 1);
    assert_eq!(harness.processes.spawn_count(), 1);
}

#[test]
fn test_no_persist_gets_fresh_buffer_after_host_closes_window() {
    let mut harness = SessionHarness::new();
    harness
        .open_with("k", "bash", Layout::Floating, options(false))
        .unwrap();
    let buffer = harness.buffer_of("k").unwrap();
    let process = harness.process_of("k").unwrap();

    harness.close_window_externally("k");
    assert_eq!(harness.open("k", "bash").unwrap(), OpenOutcome::Restarted);
    let fresh = harness.buffer_of("k").unwrap();
    assert_ne!(fresh, buffer);
    assert!(!harness.controller.buffers().is_buffer_valid(buffer));
    assert!(harness.processes.terminated().contains(&process));
    assert_eq!(harness.processes.spawn_count(), 2);

    // The stored snapshot kept persist=false
    let session = harness.controller.session(&key("k")).unwrap();
    assert!(!session.config.persist);
}

#[test]
fn test_no_persist_hide_releases_process_and_buffer() {
    let mut harness = SessionHarness::new();
    harness
        .open_with("k", "bash", Layout::Floating, options(false))
        .unwrap();
    let process = harness.process_of("k").unwrap();

    harness.controller.toggle(Some("k")).unwrap();
    assert_eq!(state(&harness, "k"), Some(SessionState::Hidden));
    assert_eq!(harness.buffer_count(), 0);
    assert!(!harness.processes.alive(process));

    // The kill's exit report is not a failure of the session
    harness.controller.process_async_messages();
    assert!(harness.controller.take_notices().is_empty());

    let (_, outcome) = harness.controller.toggle(Some("k")).unwrap();
    assert_eq!(outcome, OpenOutcome::Restarted);
    assert_eq!(harness.buffer_count(), 1);
}

#[test]
fn test_dead_hidden_session_restarts() {
    let mut harness = SessionHarness::new();
    harness.open("k", "make").unwrap();
    let buffer = harness.buffer_of("k").unwrap();
    let process = harness.process_of("k").unwrap();
    harness.controller.toggle(Some("k")).unwrap();

    harness.processes.exit(process, 0);
    let (_, outcome) = harness.controller.toggle(Some("k")).unwrap();
    assert_eq!(outcome, OpenOutcome::Restarted);
    assert_ne!(harness.buffer_of("k"), Some(buffer));
    assert_eq!(harness.buffer_count(), 1);
    assert_eq!(harness.processes.spawn_count(), 2);
    assert_eq!(
        harness.processes.requests()[1].command,
        CommandLine::Shell("make".into())
    );
}

#[test]
fn test_dead_visible_session_keeps_window_until_toggled() {
    let mut harness = SessionHarness::new();
    harness.open("k", "make").unwrap();
    let process = harness.process_of("k").unwrap();
    harness.processes.output(process, "build finished\n");
    harness.processes.exit(process, 0);
    harness.controller.process_async_messages();

    let session = harness.controller.session(&key("k")).unwrap();
    assert_eq!(session.state(), SessionState::Visible);
    assert_eq!(session.exit_code(), Some(0));
    assert_eq!(harness.window_count_for("k"), 1);
    assert_eq!(
        harness.controller.peek(Some("k"), 5).unwrap(),
        vec!["build finished"]
    );

    assert_eq!(harness.open("k", "make").unwrap(), OpenOutcome::Hidden);
}

#[test]
fn test_spawn_failure_leaves_nothing_behind() {
    let mut harness = SessionHarness::new();
    harness.processes.fail_next_spawn(SpawnError::Launch {
        command: "nope".into(),
        reason: "No such file or directory".into(),
    });

    let err = harness.open("k", "nope").unwrap_err();
    assert!(matches!(err, SessionError::Spawn(SpawnError::Launch { .. })));
    assert!(harness.controller.session(&key("k")).is_none());
    assert_eq!(harness.window_count(), 0);
    assert_eq!(harness.buffer_count(), 0);
    assert_eq!(harness.controller.last_used(), None);

    // The key is usable afterwards
    assert_eq!(harness.open("k", "bash").unwrap(), OpenOutcome::Started);
}

#[test]
fn test_empty_command_is_a_spawn_error() {
    let mut harness = SessionHarness::new();
    let err = harness.open("k", "   ").unwrap_err();
    assert_eq!(err, SessionError::Spawn(SpawnError::EmptyCommand));
    assert!(harness.controller.registry().is_empty());
    assert_eq!(harness.processes.spawn_count(), 0);
}

#[test]
fn test_close_terminates_and_respects_persist() {
    let mut harness = SessionHarness::new();
    harness
        .open_with("keep", "bash", Layout::Floating, options(true))
        .unwrap();
    harness
        .open_with("drop", "bash", Layout::Floating, options(false))
        .unwrap();
    let keep_process = harness.process_of("keep").unwrap();
    let keep_buffer = harness.buffer_of("keep").unwrap();
    let drop_buffer = harness.buffer_of("drop").unwrap();

    harness.controller.close(Some("keep")).unwrap();
    harness.controller.close(Some("drop")).unwrap();

    assert!(harness.processes.terminated().contains(&keep_process));
    assert!(harness.controller.buffers().is_buffer_valid(keep_buffer));
    assert!(!harness.controller.buffers().is_buffer_valid(drop_buffer));
    assert_eq!(harness.window_count(), 0);
    assert!(harness.controller.registry().is_empty());

    // Late exit reports of closed sessions are ignored
    harness.controller.process_async_messages();
    assert!(harness.controller.take_notices().is_empty());
}

#[test]
fn test_repeated_persist_close_does_not_leak_buffers() {
    let mut harness = SessionHarness::new();
    for _ in 0..50 {
        harness
            .open_with("k", "bash", Layout::Floating, options(true))
            .unwrap();
        harness.controller.close(Some("k")).unwrap();
        assert!(harness.buffer_count() <= 1);
    }
    assert_eq!(harness.buffer_count(), 1);
    assert_eq!(harness.processes.spawn_count(), 50);
}

#[test]
fn test_reopen_after_persist_close_reuses_buffer() {
    let mut harness = SessionHarness::new();
    harness
        .open_with("k", "bash", Layout::Floating, options(true))
        .unwrap();
    let buffer = harness.buffer_of("k").unwrap();
    let process = harness.process_of("k").unwrap();
    harness.processes.output(process, "before close\n");

    harness.controller.close(Some("k")).unwrap();
    assert_eq!(
        harness.controller.peek(Some("k"), 5).unwrap(),
        vec!["before close".to_string()]
    );

    harness
        .open_with("k", "bash", Layout::Floating, options(true))
        .unwrap();
    assert_eq!(harness.buffer_of("k"), Some(buffer));
    assert_eq!(harness.buffer_count(), 1);
    assert_ne!(harness.process_of("k"), Some(process));
}

#[test]
fn test_reattached_buffer_survives_failed_spawn() {
    let mut harness = SessionHarness::new();
    harness
        .open_with("k", "bash", Layout::Floating, options(true))
        .unwrap();
    let buffer = harness.buffer_of("k").unwrap();
    harness.controller.close(Some("k")).unwrap();

    harness
        .processes
        .fail_next_spawn(SpawnError::Pty("no pty".to_string()));
    assert!(harness
        .open_with("k", "bash", Layout::Floating, options(true))
        .is_err());
    assert!(harness.controller.buffers().is_buffer_valid(buffer));
    assert_eq!(harness.window_count(), 0);

    harness
        .open_with("k", "bash", Layout::Floating, options(true))
        .unwrap();
    assert_eq!(harness.buffer_of("k"), Some(buffer));
}

#[test]
fn test_close_without_persist_frees_every_buffer() {
    let mut harness = SessionHarness::new();
    for _ in 0..5 {
        harness
            .open_with("k", "bash", Layout::Floating, options(false))
            .unwrap();
        harness.controller.close(Some("k")).unwrap();
    }
    assert_eq!(harness.buffer_count(), 0);
    assert_eq!(
        harness.controller.peek(Some("k"), 5),
        Err(SessionError::NotFound(key("k")))
    );
}

#[test]
fn test_close_unknown_key() {
    let mut harness = SessionHarness::new();
    assert_eq!(
        harness.controller.close(Some("ghost")),
        Err(SessionError::NotFound(key("ghost")))
    );
    assert_eq!(harness.controller.close(None), Err(SessionError::NoTarget));
}

#[test]
fn test_toggle_without_target() {
    let mut harness = SessionHarness::new();
    assert_eq!(
        harness.controller.toggle(None).unwrap_err(),
        SessionError::NoTarget
    );
}

#[test]
fn test_toggle_unknown_key_starts_default_shell() {
    let mut harness = SessionHarness::with_config(Config {
        shell: Some("/bin/fake-sh".into()),
        ..Default::default()
    });
    let (k, outcome) = harness.controller.toggle(Some("scratch")).unwrap();
    assert_eq!(k, key("scratch"));
    assert_eq!(outcome, OpenOutcome::Started);
    assert_eq!(
        harness.processes.requests()[0].command,
        CommandLine::Argv(vec!["/bin/fake-sh".into()])
    );
}

#[test]
fn test_resolve_key_prefers_focus_then_last_used() {
    let mut harness = SessionHarness::new();
    harness.open("a", "bash").unwrap();
    harness
        .open_with(
            "b",
            "bash",
            Layout::split(SplitDirection::Below),
            OpenRequest {
                options: PartialSessionConfig {
                    enter: Some(false),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(harness.controller.last_used(), Some(&key("b")));

    // "a" has focus even though "b" was used last
    let (k, outcome) = harness.controller.toggle(None).unwrap();
    assert_eq!((k, outcome), (key("a"), OpenOutcome::Hidden));

    // Focus went with the window; fall back to the last-used key
    let (k, outcome) = harness.controller.toggle(None).unwrap();
    assert_eq!((k, outcome), (key("a"), OpenOutcome::Shown));
}

#[test]
fn test_reopen_applies_call_site_options() {
    let mut harness = SessionHarness::new();
    harness.open("k", "bash").unwrap();
    harness.controller.toggle(Some("k")).unwrap();

    let request = OpenRequest {
        options: PartialSessionConfig {
            width: Some(20.0),
            ..Default::default()
        },
        ..Default::default()
    };
    assert_eq!(
        harness.controller.open(key("k"), request).unwrap(),
        OpenOutcome::Shown
    );
    assert_eq!(harness.geometry_of("k").unwrap().width, 20);
}

#[test]
fn test_run_derives_key_from_command_and_layout() {
    let mut harness = SessionHarness::new();
    let (k, outcome) = harness
        .controller
        .run(
            CommandLine::Shell("cargo   watch".into()),
            Layout::split(SplitDirection::Right),
            None,
            PartialSessionConfig::default(),
        )
        .unwrap();
    assert_eq!(k, key("right:cargo watch"));
    assert_eq!(outcome, OpenOutcome::Started);

    let (k2, outcome) = harness
        .controller
        .run(
            CommandLine::Shell("cargo watch".into()),
            Layout::split(SplitDirection::Right),
            None,
            PartialSessionConfig::default(),
        )
        .unwrap();
    assert_eq!(k2, k);
    assert_eq!(outcome, OpenOutcome::Hidden);
}

#[test]
fn test_list_is_sorted_and_reports_state() {
    let mut harness = SessionHarness::new();
    harness.open("zeta", "bash").unwrap();
    harness.open("alpha", "make").unwrap();
    harness.controller.toggle(Some("zeta")).unwrap();
    let process = harness.process_of("alpha").unwrap();
    harness.processes.exit(process, 0);

    let list = harness.controller.list();
    let keys: Vec<&str> = list.iter().map(|s| s.key.as_str()).collect();
    assert_eq!(keys, vec!["alpha", "zeta"]);
    assert_eq!(list[0].state, SessionState::Visible);
    assert!(!list[0].alive);
    assert_eq!(list[0].exit_code, Some(0));
    assert_eq!(list[1].state, SessionState::Hidden);
    assert!(list[1].alive);
}

/// A session killed from outside still gets its exit reported
#[test]
fn test_external_kill_is_reported() {
    let mut harness = SessionHarness::new();
    harness.open("k", "bash").unwrap();
    let process = harness.process_of("k").unwrap();
    harness.processes.exit(process, TERMINATED_CODE);
    harness.controller.process_async_messages();
    assert_eq!(harness.controller.take_notices().len(), 1);
}
