//! Sessions backed by real PTY processes

use std::time::{Duration, Instant};
use termtoggle::app::{Notice, SessionController};
use termtoggle::config::Config;
use termtoggle::model::{CommandLine, Layout, SessionKey};
use termtoggle::partial_config::PartialSessionConfig;
use termtoggle::services::async_bridge::AsyncBridge;
use termtoggle::services::headless::HeadlessWindows;
use termtoggle::services::output::MemoryBuffers;
use termtoggle::services::terminal::TerminalManager;
use termtoggle::types::Viewport;

fn controller() -> SessionController {
    let bridge = AsyncBridge::new();
    SessionController::new(
        Config::default(),
        Box::new(HeadlessWindows::new(Viewport::new(100, 40))),
        Box::new(MemoryBuffers::new(100)),
        Box::new(TerminalManager::new(bridge.clone(), Some("/bin/sh".into()))),
        bridge,
    )
}

/// Pump the controller until `key` has exited
fn wait_for_exit(controller: &mut SessionController, key: &SessionKey) -> Option<i32> {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        controller.process_async_messages();
        if let Some(code) = controller.session(key).and_then(|s| s.exit_code()) {
            return Some(code);
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    None
}

#[test]
fn test_failing_command_output_and_warning() {
    crate::common::tracing::init_tracing_from_env();
    let mut controller = controller();
    let (key, _) = controller
        .run(
            CommandLine::Shell("echo hello from pty; exit 3".into()),
            Layout::Floating,
            Some(SessionKey::new("pty")),
            PartialSessionConfig::default(),
        )
        .unwrap();

    assert_eq!(wait_for_exit(&mut controller, &key), Some(3));
    let notices = controller.take_notices();
    assert!(notices
        .iter()
        .any(|n| matches!(n, Notice::ExitWarning { code: 3, .. })));

    // The reader thread may still be flushing the last chunk
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut output = Vec::new();
    while Instant::now() < deadline {
        output = controller.peek(Some("pty"), 10).unwrap();
        if output.iter().any(|l| l.contains("hello from pty")) {
            break;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    assert!(
        output.iter().any(|l| l.contains("hello from pty")),
        "output was {:?}",
        output
    );
}

#[test]
fn test_close_kills_running_process() {
    let mut controller = controller();
    let (key, _) = controller
        .run(
            CommandLine::Argv(vec!["sleep".into(), "30".into()]),
            Layout::Floating,
            None,
            PartialSessionConfig::default(),
        )
        .unwrap();
    assert!(controller.session(&key).unwrap().is_alive());

    controller.close(Some(key.as_str())).unwrap();
    assert!(controller.session(&key).is_none());

    // The kill is not reported as a failure
    std::thread::sleep(Duration::from_millis(200));
    controller.process_async_messages();
    assert!(controller.take_notices().is_empty());
}
