//! Line-oriented operator console on stdin.

use crate::app::Multitoon;
use crate::events::ControlScheme;
use crate::utils::ActivityLog;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

pub const HELP: &str = "\
Commands:
  start | stop                 start or stop broadcasting
  toggle N | enable N | disable N
                               change toon N (1-4)
  scheme N wasd|arrows         movement keys used for toon N
  save N | load N              presets 1-5 (Ctrl+1..5 also loads)
  refresh                      rediscover game windows
  ltr on|off                   assign toons left to right by window position
  keepalive on|off             start or stop the keep-alive pulser
  keepalive key K              key to pulse (empty to clear)
  keepalive every SECS         pulse interval, 5-600 seconds
  diag                         run the symbol test against the first game window
  status | log | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Toggle(usize),
    Enable(usize),
    Disable(usize),
    Scheme(usize, ControlScheme),
    Save(u8),
    Load(u8),
    Refresh,
    LeftToRight(bool),
    KeepAlive(bool),
    KeepAliveKey(String),
    KeepAliveEvery(u64),
    Diagnostics,
    Status,
    Log,
    Help,
    Quit,
}

/// How the console loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleExit {
    Quit,
    InputClosed,
}

fn toon_index(arg: Option<&str>) -> Result<usize, String> {
    let arg = arg.ok_or("missing toon number")?;
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("'{}' is not a toon number", arg)),
    }
}

fn preset_index(arg: Option<&str>) -> Result<u8, String> {
    let arg = arg.ok_or("missing preset number")?;
    arg.parse::<u8>().map_err(|_| format!("'{}' is not a preset number", arg))
}

fn on_off(arg: Option<&str>) -> Result<bool, String> {
    match arg.map(str::to_ascii_lowercase).as_deref() {
        Some("on") => Ok(true),
        Some("off") => Ok(false),
        _ => Err("expected 'on' or 'off'".to_string()),
    }
}

/// Parse one console line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };

    let command = match head.to_ascii_lowercase().as_str() {
        "start" => Command::Start,
        "stop" => Command::Stop,
        "toggle" => Command::Toggle(toon_index(words.next())?),
        "enable" => Command::Enable(toon_index(words.next())?),
        "disable" => Command::Disable(toon_index(words.next())?),
        "scheme" => {
            let index = toon_index(words.next())?;
            let scheme = words
                .next()
                .ok_or("missing scheme (wasd or arrows)")?
                .parse::<ControlScheme>()?;
            Command::Scheme(index, scheme)
        }
        "save" => Command::Save(preset_index(words.next())?),
        "load" => Command::Load(preset_index(words.next())?),
        "refresh" => Command::Refresh,
        "ltr" => Command::LeftToRight(on_off(words.next())?),
        "keepalive" => match words.next().map(str::to_ascii_lowercase).as_deref() {
            Some("key") => Command::KeepAliveKey(words.next().unwrap_or("").to_string()),
            Some("every") => {
                let secs = words.next().ok_or("missing interval in seconds")?;
                Command::KeepAliveEvery(
                    secs.parse::<u64>()
                        .map_err(|_| format!("'{}' is not a number of seconds", secs))?,
                )
            }
            other => Command::KeepAlive(on_off(other)?),
        },
        "diag" => Command::Diagnostics,
        "status" => Command::Status,
        "log" => Command::Log,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command '{}' (try 'help')", other)),
    };

    if let Some(extra) = words.next() {
        return Err(format!("unexpected argument '{}'", extra));
    }
    Ok(Some(command))
}

/// Run one command. Returns the text to show the operator, if any.
pub async fn execute(app: &Multitoon, activity: &ActivityLog, command: Command) -> Option<String> {
    match command {
        Command::Start => app.start_service().await,
        Command::Stop => app.stop_service().await,
        Command::Toggle(index) => {
            app.toggle_toon(index);
        }
        Command::Enable(index) => {
            app.set_toon_enabled(index, true);
        }
        Command::Disable(index) => {
            app.set_toon_enabled(index, false);
        }
        Command::Scheme(index, scheme) => {
            app.set_scheme(index, scheme);
        }
        Command::Save(index) => {
            if let Err(e) = app.save_preset(index) {
                return Some(e.to_string());
            }
        }
        Command::Load(index) => {
            if let Err(e) = app.load_preset(index).await {
                return Some(e.to_string());
            }
        }
        Command::Refresh => {
            app.refresh_windows().await;
        }
        Command::LeftToRight(enabled) => {
            if let Err(e) = app.set_left_to_right(enabled) {
                return Some(e.to_string());
            }
        }
        Command::KeepAlive(true) => {
            if let Err(e) = app.start_keep_alive() {
                return Some(e.to_string());
            }
        }
        Command::KeepAlive(false) => app.stop_keep_alive().await,
        Command::KeepAliveKey(key) => {
            if let Err(e) = app.set_keep_alive_key(&key) {
                return Some(e.to_string());
            }
        }
        Command::KeepAliveEvery(secs) => {
            if let Err(e) = app.set_keep_alive_interval(Duration::from_secs(secs)) {
                return Some(e.to_string());
            }
        }
        Command::Diagnostics => {
            return Some(match app.run_diagnostics().await {
                Ok(report) => report.summary(),
                Err(e) => e.to_string(),
            })
        }
        Command::Status => return Some(app.status().to_string()),
        Command::Log => return Some(activity.recent().join("\n")),
        Command::Help => return Some(HELP.to_string()),
        Command::Quit => {}
    }
    None
}

/// Read commands from stdin until `quit` or end of input.
pub async fn run(app: Arc<Multitoon>, activity: Arc<ActivityLog>) -> ConsoleExit {
    println!("multitoon console ready, type 'help' for commands");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("Console input closed");
                return ConsoleExit::InputClosed;
            }
            Err(e) => {
                warn!("Console read failed: {}", e);
                return ConsoleExit::InputClosed;
            }
        };

        match parse_command(&line) {
            Ok(None) => {}
            Ok(Some(Command::Quit)) => return ConsoleExit::Quit,
            Ok(Some(command)) => {
                if let Some(output) = execute(&app, &activity, command).await {
                    println!("{}", output);
                }
            }
            Err(message) => println!("{}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::services::testing::{FakeWindowQuery, RecordingInjector};
    use crate::services::HeldKeys;
    use crate::utils::LogSink;

    #[test]
    fn parses_every_command() {
        let cases = [
            ("start", Command::Start),
            ("  STOP ", Command::Stop),
            ("toggle 2", Command::Toggle(1)),
            ("enable 1", Command::Enable(0)),
            ("disable 4", Command::Disable(3)),
            ("scheme 3 arrows", Command::Scheme(2, ControlScheme::Arrows)),
            ("scheme 1 WASD", Command::Scheme(0, ControlScheme::Wasd)),
            ("save 5", Command::Save(5)),
            ("load 1", Command::Load(1)),
            ("refresh", Command::Refresh),
            ("ltr on", Command::LeftToRight(true)),
            ("keepalive off", Command::KeepAlive(false)),
            ("keepalive key space", Command::KeepAliveKey("space".into())),
            ("keepalive key", Command::KeepAliveKey(String::new())),
            ("keepalive every 120", Command::KeepAliveEvery(120)),
            ("diag", Command::Diagnostics),
            ("status", Command::Status),
            ("log", Command::Log),
            ("?", Command::Help),
            ("exit", Command::Quit),
        ];
        for (line, expected) in cases {
            assert_eq!(parse_command(line), Ok(Some(expected)), "{}", line);
        }
    }

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(parse_command(""), Ok(None));
        assert_eq!(parse_command("   "), Ok(None));
    }

    #[test]
    fn bad_input_is_reported() {
        assert!(parse_command("jump").is_err());
        assert!(parse_command("toggle").is_err());
        assert!(parse_command("toggle 0").is_err());
        assert!(parse_command("toggle two").is_err());
        assert!(parse_command("scheme 1 hjkl").is_err());
        assert!(parse_command("ltr maybe").is_err());
        assert!(parse_command("keepalive every soon").is_err());
        assert!(parse_command("start now").is_err());
        assert!(parse_command("diag all").is_err());
    }

    #[tokio::test]
    async fn execute_drives_the_controller() {
        let dir = tempfile::tempdir().unwrap();
        let query = Arc::new(FakeWindowQuery::with_windows(&[(10, 0)]));
        let activity = Arc::new(ActivityLog::default());
        let app = Multitoon::new(
            &Config::default(),
            dir.path(),
            query,
            Arc::new(RecordingInjector::default()),
            Arc::new(HeldKeys::new()),
            activity.clone(),
        );

        assert_eq!(execute(&app, &activity, Command::Refresh).await, None);
        execute(&app, &activity, Command::Enable(0)).await;
        execute(&app, &activity, Command::Scheme(0, ControlScheme::Arrows)).await;
        assert_eq!(app.status().slots[0].scheme, ControlScheme::Arrows);
        assert!(app.status().slots[0].enabled);

        let error = execute(&app, &activity, Command::Load(9)).await;
        assert!(error.unwrap().contains("out of range"));

        let refused = execute(&app, &activity, Command::KeepAlive(true)).await;
        assert!(refused.unwrap().contains("No keep-alive key set"));
        assert!(!app.status().keep_alive_running);

        let status = execute(&app, &activity, Command::Status).await.unwrap();
        assert!(status.starts_with("Service idle"));

        activity.log("marker line");
        let log = execute(&app, &activity, Command::Log).await.unwrap();
        assert!(log.contains("marker line"));
        assert!(log.contains("Toon 1 enabled"));
    }

    #[tokio::test(start_paused = true)]
    async fn diag_reports_a_summary() {
        let dir = tempfile::tempdir().unwrap();
        let activity = Arc::new(ActivityLog::default());
        let app = Multitoon::new(
            &Config::default(),
            dir.path(),
            Arc::new(FakeWindowQuery::with_windows(&[(12, 0)])),
            Arc::new(RecordingInjector::default()),
            Arc::new(HeldKeys::new()),
            activity.clone(),
        );

        let summary = execute(&app, &activity, Command::Diagnostics).await.unwrap();
        assert!(summary.starts_with("Symbol test on window 12:"));
        assert!(summary.ends_with(", 0 failed"));
    }
}
