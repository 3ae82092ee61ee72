//! The interactive console: command parsing and the stdin loop.
//!
//! Presentation glue only — every command resolves to one session call and a
//! printed result.  Operator-initiated failures are printed inline and never
//! abort the loop; only `quit` (or EOF) ends the session.

use std::io::Write;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use windeck_core::{BoundsDraft, CaptureSettings, KeyPress, ViewRect};

use crate::application::api::{SnapshotSource, WindowApi};
use crate::application::session::{ConsoleSession, OpenOutcome};

// ── Command grammar ───────────────────────────────────────────────────────────

/// One parsed operator command.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Help,
    Quit,
    Login { token: String },
    Logout,
    Windows,
    Select { win_id: i64 },
    Open { url: String, account_idx: u32 },
    Close,
    CloseAll,
    Bounds { draft: BoundsDraft },
    Apply,
    Reload,
    Click { x: f64, y: f64 },
    Key { press: KeyPress },
    View { rect: ViewRect },
    Loop { enabled: bool },
    Controls { visible: bool },
    SetInterval { ms: u64 },
    SetQuality { quality: u8 },
    SetScale { scale: f64 },
    Ping,
    Status,
}

/// Errors produced while parsing a command line.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),
}

/// Parses one line of operator input.
pub fn parse_command(line: &str) -> Result<ConsoleCommand, ParseError> {
    let mut parts = line.split_whitespace();
    let word = parts.next().ok_or(ParseError::Empty)?;
    let args: Vec<&str> = parts.collect();

    match word {
        "help" | "?" => Ok(ConsoleCommand::Help),
        "quit" | "exit" => Ok(ConsoleCommand::Quit),

        "login" => match args.as_slice() {
            [token] => Ok(ConsoleCommand::Login { token: (*token).to_string() }),
            _ => Err(ParseError::Usage("login <token>")),
        },
        "logout" => Ok(ConsoleCommand::Logout),

        "windows" | "ls" => Ok(ConsoleCommand::Windows),
        "select" => match args.as_slice() {
            [id] => id
                .parse()
                .map(|win_id| ConsoleCommand::Select { win_id })
                .map_err(|_| ParseError::Usage("select <win_id>")),
            _ => Err(ParseError::Usage("select <win_id>")),
        },

        "open" => match args.as_slice() {
            [url] => Ok(ConsoleCommand::Open { url: (*url).to_string(), account_idx: 0 }),
            [url, idx] => idx
                .parse()
                .map(|account_idx| ConsoleCommand::Open {
                    url: (*url).to_string(),
                    account_idx,
                })
                .map_err(|_| ParseError::Usage("open <url> [account_idx]")),
            _ => Err(ParseError::Usage("open <url> [account_idx]")),
        },
        "close" => Ok(ConsoleCommand::Close),
        "close-all" => Ok(ConsoleCommand::CloseAll),

        "bounds" => match args.as_slice() {
            [x, y, w, h] => {
                let parse = |s: &&str| s.parse::<i32>();
                match (parse(x), parse(y), parse(w), parse(h)) {
                    (Ok(x), Ok(y), Ok(w), Ok(h)) => {
                        Ok(ConsoleCommand::Bounds { draft: BoundsDraft { x, y, w, h } })
                    }
                    _ => Err(ParseError::Usage("bounds <x> <y> <w> <h>")),
                }
            }
            _ => Err(ParseError::Usage("bounds <x> <y> <w> <h>")),
        },
        "apply" => Ok(ConsoleCommand::Apply),
        "reload" => Ok(ConsoleCommand::Reload),

        "click" => match args.as_slice() {
            [x, y] => match (x.parse(), y.parse()) {
                (Ok(x), Ok(y)) => Ok(ConsoleCommand::Click { x, y }),
                _ => Err(ParseError::Usage("click <x> <y>")),
            },
            _ => Err(ParseError::Usage("click <x> <y>")),
        },
        "key" => match args.as_slice() {
            [spec] => Ok(ConsoleCommand::Key { press: parse_key(*spec) }),
            _ => Err(ParseError::Usage("key <key>  (e.g. key Enter, key a, key ctrl+c)")),
        },
        "view" => match args.as_slice() {
            [left, top, w, h] => {
                let parse = |s: &&str| s.parse::<f64>();
                match (parse(left), parse(top), parse(w), parse(h)) {
                    (Ok(l), Ok(t), Ok(w), Ok(h)) => {
                        Ok(ConsoleCommand::View { rect: ViewRect::new(l, t, w, h) })
                    }
                    _ => Err(ParseError::Usage("view <left> <top> <width> <height>")),
                }
            }
            _ => Err(ParseError::Usage("view <left> <top> <width> <height>")),
        },

        "loop" => parse_on_off(&args, "loop on|off")
            .map(|enabled| ConsoleCommand::Loop { enabled }),
        "controls" => parse_on_off(&args, "controls on|off")
            .map(|visible| ConsoleCommand::Controls { visible }),

        "set" => match args.as_slice() {
            ["interval", v] => v
                .parse()
                .map(|ms| ConsoleCommand::SetInterval { ms })
                .map_err(|_| ParseError::Usage("set interval <ms>")),
            ["quality", v] => v
                .parse()
                .map(|quality| ConsoleCommand::SetQuality { quality })
                .map_err(|_| ParseError::Usage("set quality <1-100>")),
            ["scale", v] => v
                .parse()
                .map(|scale| ConsoleCommand::SetScale { scale })
                .map_err(|_| ParseError::Usage("set scale <0.1-1.0>")),
            _ => Err(ParseError::Usage("set interval|quality|scale <value>")),
        },

        "ping" => Ok(ConsoleCommand::Ping),
        "status" => Ok(ConsoleCommand::Status),

        other => Err(ParseError::Unknown(other.to_string())),
    }
}

fn parse_on_off(args: &[&str], usage: &'static str) -> Result<bool, ParseError> {
    match args {
        ["on"] => Ok(true),
        ["off"] => Ok(false),
        _ => Err(ParseError::Usage(usage)),
    }
}

/// Parses a key spec like `Enter`, `a`, or `ctrl+c` into a [`KeyPress`].
///
/// Modifier prefixes are recognized so the allow-list's "ignore chords" rule
/// is reachable from the console; the session decides what to do with them.
fn parse_key(spec: &str) -> KeyPress {
    let mut press = KeyPress::plain("");
    let mut rest = spec;

    loop {
        let lowered = rest.to_ascii_lowercase();
        if lowered.starts_with("ctrl+") && rest.len() > 5 {
            press.ctrl = true;
            rest = &rest[5..];
        } else if lowered.starts_with("alt+") && rest.len() > 4 {
            press.alt = true;
            rest = &rest[4..];
        } else if lowered.starts_with("meta+") && rest.len() > 5 {
            press.meta = true;
            rest = &rest[5..];
        } else {
            break;
        }
    }

    press.key = rest.to_string();
    press
}

// ── The stdin loop ────────────────────────────────────────────────────────────

/// Runs the interactive dashboard until `quit` or EOF.
pub async fn run_dashboard<A>(session: &mut ConsoleSession<A>) -> anyhow::Result<()>
where
    A: WindowApi + SnapshotSource,
{
    println!("windeck console — type 'help' for commands, 'quit' to exit");
    print_status(session);

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = lines.next_line().await? else {
            break; // EOF
        };

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(ParseError::Empty) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        if !dispatch(session, command).await {
            break;
        }
    }

    session.shutdown();
    Ok(())
}

/// Executes one command.  Returns `false` when the loop should end.
async fn dispatch<A>(session: &mut ConsoleSession<A>, command: ConsoleCommand) -> bool
where
    A: WindowApi + SnapshotSource,
{
    match command {
        ConsoleCommand::Help => print_help(),
        ConsoleCommand::Quit => return false,

        ConsoleCommand::Login { token } => match session.login(&token).await {
            Ok(count) => println!("logged in — {count} window(s) visible"),
            Err(e) => println!("login failed: {e}"),
        },
        ConsoleCommand::Logout => match session.logout() {
            Ok(()) => println!("logged out"),
            Err(e) => println!("logout failed: {e}"),
        },

        ConsoleCommand::Windows => match session.refresh_windows().await {
            Ok(windows) => print_windows(windows),
            Err(e) => println!("window list failed: {e}"),
        },
        ConsoleCommand::Select { win_id } => match session.select(win_id).await {
            Ok(()) => print_status(session),
            Err(e) => println!("select failed: {e}"),
        },

        ConsoleCommand::Open { url, account_idx } => {
            match session.open(&url, account_idx).await {
                Ok(OpenOutcome::FocusedExisting(id)) => {
                    println!("focused existing window #{id}")
                }
                Ok(OpenOutcome::Opened) => println!("window requested"),
                Err(e) => println!("open failed: {e}"),
            }
        }
        ConsoleCommand::Close => match session.close_selected().await {
            Ok(()) => println!("window closed"),
            Err(e) => println!("close failed: {e}"),
        },
        ConsoleCommand::CloseAll => match session.close_all().await {
            Ok(count) => println!("closed {count} window(s)"),
            Err(e) => println!("close-all failed: {e}"),
        },

        ConsoleCommand::Bounds { draft } => {
            session.set_bounds_draft(draft);
            println!(
                "draft: x={} y={} w={} h={}  (submit with 'apply')",
                draft.x, draft.y, draft.w, draft.h
            );
        }
        ConsoleCommand::Apply => match session.apply_bounds().await {
            Ok(outcome) => println!("{}", outcome.message),
            Err(e) => println!("apply failed: {e}"),
        },
        ConsoleCommand::Reload => match session.reload().await {
            Ok(()) => println!("reload requested"),
            Err(e) => println!("reload failed: {e}"),
        },

        ConsoleCommand::Click { x, y } => match session.click(x, y).await {
            Ok((ax, ay)) => println!("clicked at ({ax}, {ay})"),
            Err(e) => println!("click failed: {e}"),
        },
        ConsoleCommand::Key { press } => match session.send_key(press).await {
            Ok(true) => println!("key sent"),
            Ok(false) => println!("key ignored (modifier chord or unsupported key)"),
            Err(e) => println!("key failed: {e}"),
        },
        ConsoleCommand::View { rect } => {
            session.set_view(rect);
            println!("view geometry set");
        }

        ConsoleCommand::Loop { enabled } => match session.set_loop_enabled(enabled) {
            Ok(()) => println!("capture loop {}", if enabled { "enabled" } else { "disabled" }),
            Err(e) => println!("loop toggle failed: {e}"),
        },
        ConsoleCommand::Controls { visible } => match session.set_controls_visible(visible) {
            Ok(()) => print_status(session),
            Err(e) => println!("controls toggle failed: {e}"),
        },

        ConsoleCommand::SetInterval { ms } => {
            let capture = CaptureSettings { interval_ms: ms, ..session.settings().capture };
            apply_capture(session, capture);
        }
        ConsoleCommand::SetQuality { quality } => {
            let capture = CaptureSettings { quality, ..session.settings().capture };
            apply_capture(session, capture);
        }
        ConsoleCommand::SetScale { scale } => {
            let capture = CaptureSettings { scale, ..session.settings().capture };
            apply_capture(session, capture);
        }

        ConsoleCommand::Ping => match session.ping().await {
            Ok(latency) => println!("{} ms", latency.as_millis()),
            Err(e) => println!("ping failed: {e}"),
        },
        ConsoleCommand::Status => print_status(session),
    }

    true
}

fn apply_capture<A>(session: &mut ConsoleSession<A>, capture: CaptureSettings)
where
    A: WindowApi + SnapshotSource,
{
    match session.update_capture(capture) {
        Ok(()) => println!(
            "capture: every {} ms, quality {}, scale {}",
            capture.interval_ms, capture.quality, capture.scale
        ),
        Err(e) => println!("settings rejected: {e}"),
    }
}

fn print_windows(windows: &[windeck_core::WindowDescriptor]) {
    if windows.is_empty() {
        println!("no active windows");
        return;
    }
    for win in windows {
        let title = if win.title.is_empty() { "(untitled)" } else { &win.title };
        println!(
            "#{:<4} {:<40} {}x{} @ {},{}  {}",
            win.id, title, win.bounds.width, win.bounds.height, win.bounds.x, win.bounds.y,
            win.url
        );
    }
}

fn print_status<A>(session: &ConsoleSession<A>)
where
    A: WindowApi + SnapshotSource,
{
    let settings = session.settings();
    match session.selected_window() {
        Some(win) => println!(
            "selected: #{} {} ({}x{})",
            win.id,
            if win.title.is_empty() { "(untitled)" } else { &win.title },
            win.bounds.width,
            win.bounds.height
        ),
        None => println!("selected: none"),
    }
    println!(
        "capture: {} — every {} ms, quality {}, scale {}",
        if session.capture_running() { "live" } else { "paused" },
        settings.capture.interval_ms,
        settings.capture.quality,
        settings.capture.scale
    );
    if let Some(frame) = session.current_frame() {
        println!("latest frame: {}", frame.display());
    }
    if settings.controls_visible {
        println!(
            "controls: loop={}, selection persists across restarts",
            if settings.loop_enabled { "on" } else { "off" }
        );
    }
}

fn print_help() {
    println!(
        "\
commands:
  login <token>            authenticate against the server
  logout                   drop the stored token
  windows                  list remote windows
  select <win_id>          select a window and start monitoring it
  open <url> [idx]         open a URL (reuses a window on the same host)
  close | close-all        close the selected window / every window
  bounds <x> <y> <w> <h>   edit the bounds draft
  apply                    submit the bounds draft
  reload                   reload the selected window's page
  click <x> <y>            forward a click at viewer coordinates
  key <key>                forward a key (Enter, a, ctrl+c, ...)
  view <l> <t> <w> <h>     describe the external viewer's image box
  loop on|off              start/stop the snapshot loop
  set interval <ms>        poll period
  set quality <1-100>      snapshot quality
  set scale <0.1-1.0>      snapshot downscale factor
  controls on|off          show extra detail in status output
  ping                     measure server round-trip time
  status                   show selection and capture state
  quit                     exit"
    );
}

// ── Tests ─────────────────────────────────────────────────────────────────────
