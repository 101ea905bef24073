use anyhow::{Context, Result as AnyhowResult};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;
use termtoggle::app::SessionController;
use termtoggle::config::Config;
use termtoggle::config_io;
use termtoggle::i18n;
use termtoggle::input::{parse_line, Action};
use termtoggle::services::async_bridge::AsyncBridge;
use termtoggle::services::headless::HeadlessWindows;
use termtoggle::services::output::MemoryBuffers;
use termtoggle::services::terminal::TerminalManager;
use termtoggle::services::tracing_setup;
use termtoggle::types::Viewport;

/// How often exits are collected while waiting for input
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Named terminal sessions you can toggle, resize and maximize
#[derive(Parser, Debug)]
#[command(name = "termtoggle")]
#[command(about = "Named, toggleable terminal sessions", long_about = None)]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Path to log file (default: termtoggle.log in the state directory)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Screen width to lay windows out in (default: terminal width)
    #[arg(long)]
    cols: Option<u16>,

    /// Screen height to lay windows out in (default: terminal height)
    #[arg(long)]
    rows: Option<u16>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    dump_config: bool,

    /// Override the message locale (e.g., 'en')
    #[arg(long, value_name = "LOCALE")]
    locale: Option<String>,
}

fn init_logging(args: &Args) -> AnyhowResult<()> {
    let log_file = match &args.log_file {
        Some(path) => path.clone(),
        None => {
            let dir = config_io::log_dir();
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            dir.join("termtoggle.log")
        }
    };
    if !tracing_setup::init_global(&log_file) {
        eprintln!("Warning: could not log to {}", log_file.display());
    }
    Ok(())
}

fn viewport(args: &Args, config: &Config) -> Viewport {
    let (cols, rows) = crossterm::terminal::size().unwrap_or((80, 24));
    Viewport::new(args.cols.unwrap_or(cols), args.rows.unwrap_or(rows))
        .with_chrome(config.chrome.top, config.chrome.bottom)
}

fn print_notices(controller: &mut SessionController) {
    for notice in controller.take_notices() {
        println!("{}", i18n::notice_message(&notice));
    }
}

/// Run one action; returns false when the user asked to quit
fn dispatch(controller: &mut SessionController, action: Action) -> bool {
    let result = match action {
        Action::Run {
            key,
            layout,
            options,
            command,
        } => controller
            .run(command, layout, key, options)
            .map(|(key, outcome)| println!("{}", i18n::open_message(&key, outcome))),
        Action::Toggle { key } => controller
            .toggle(key.as_deref())
            .map(|(key, outcome)| println!("{}", i18n::open_message(&key, outcome))),
        Action::Resize { key, amount } => {
            let target = controller
                .resolve_key(key.as_deref())
                .map(|k| k.to_string())
                .unwrap_or_default();
            controller
                .resize(key.as_deref(), &amount)
                .map(|geometry| println!("{}", i18n::resized_message(&target, geometry)))
        }
        Action::Maximize { key } => {
            let target = controller
                .resolve_key(key.as_deref())
                .map(|k| k.to_string())
                .unwrap_or_default();
            controller
                .maximize(key.as_deref())
                .map(|outcome| println!("{}", i18n::maximize_message(&target, outcome)))
        }
        Action::Close { key } => controller
            .close(key.as_deref())
            .map(|key| println!("{}", i18n::closed_message(&key))),
        Action::List => {
            let sessions = controller.list();
            if sessions.is_empty() {
                println!("{}", i18n::list_empty());
            }
            for summary in &sessions {
                println!("{}", i18n::summary_line(summary));
            }
            Ok(())
        }
        Action::Apps { name: None, .. } => {
            let apps = controller.apps();
            if apps.is_empty() {
                println!("{}", i18n::apps_empty());
            } else {
                println!("{}", i18n::apps_header());
                for (name, command) in apps {
                    println!("{}", i18n::app_line(name, command));
                }
            }
            Ok(())
        }
        Action::Apps {
            name: Some(name),
            layout,
            options,
        } => controller
            .open_app(&name, layout, options)
            .map(|(key, outcome)| println!("{}", i18n::open_message(&key, outcome))),
        Action::Peek { key, lines } => controller.peek(key.as_deref(), lines).map(|output| {
            if output.is_empty() {
                println!("{}", i18n::peek_empty());
            }
            for line in output {
                println!("{}", line);
            }
        }),
        Action::Help => {
            print!("{}", i18n::help_text());
            Ok(())
        }
        Action::Quit => return false,
    };

    if let Err(e) = result {
        println!("{}", i18n::error_message(&e));
    }
    true
}

/// Forward stdin lines to the main loop
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn main() -> AnyhowResult<()> {
    let args = Args::parse();

    let config = config_io::load(args.config.as_deref()).context("Failed to load config")?;

    if args.dump_config {
        let json =
            serde_json::to_string_pretty(&config).context("Failed to serialize config")?;
        println!("{}", json);
        return Ok(());
    }

    init_logging(&args)?;
    i18n::init(args.locale.as_deref());
    tracing::info!("termtoggle starting");

    let initial_viewport = viewport(&args, &config);
    let bridge = AsyncBridge::new();
    let spawner = TerminalManager::new(bridge.clone(), config.shell.clone());
    let windows = HeadlessWindows::new(initial_viewport);
    let buffers = MemoryBuffers::new(config.scrollback_lines);
    let mut controller = SessionController::new(
        config,
        Box::new(windows),
        Box::new(buffers),
        Box::new(spawner),
        bridge,
    );

    let lines = spawn_stdin_reader();
    loop {
        match lines.recv_timeout(POLL_INTERVAL) {
            Ok(line) => match parse_line(&line) {
                Ok(Some(action)) => {
                    if !dispatch(&mut controller, action) {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => println!("{}", i18n::parse_error_message(&e)),
            },
            Err(mpsc::RecvTimeoutError::Timeout) => {
                let current = viewport(&args, controller.config());
                controller.set_viewport(current);
                controller.process_async_messages();
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
        print_notices(&mut controller);
        io::stdout().flush().context("Failed to flush stdout")?;
    }

    tracing::info!("termtoggle exiting");
    Ok(())
}
