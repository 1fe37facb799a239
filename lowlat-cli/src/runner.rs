use std::{
    io,
    sync::{Arc, Mutex},
    thread::sleep,
    time::{Duration, Instant},
};

use clap::ArgMatches;
use crossterm::{
    cursor, execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{info, warn};
use lowlat_lib::constants::DEFAULT_TARGET_BUFFER_SECS;
use lowlat_lib::hls::HlsBackend;
use lowlat_lib::monitor::{LatencyReport, ReportFn};
use lowlat_lib::playback::{MediaBackend, PlaybackEvent, PlaybackSession, SessionState};
use lowlat_lib::simulate::SimulatedBackend;
use lowlat_lib::Result;
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::controls::{self, KeyOutcome};
use crate::logging::{self, LogBuffer};
use crate::ui;

type LatestReport = Arc<Mutex<Option<LatencyReport>>>;

pub fn run(args: &ArgMatches, log_buffer: LogBuffer) -> Result<i32> {
    info!("Starting lowlat");

    let quiet = args.get_flag("quiet");
    let json = args.get_flag("json");
    let initial_buffer = args
        .get_one::<f64>("buffer")
        .copied()
        .unwrap_or(DEFAULT_TARGET_BUFFER_SECS);
    let exit_after = args
        .get_one::<f64>("exit-after")
        .copied()
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64);

    let backend: Arc<dyn MediaBackend> = if args.get_flag("simulate") {
        Arc::new(SimulatedBackend {
            total_segments: args.get_one::<usize>("simulate-segments").copied(),
            fail_after: args.get_one::<usize>("simulate-fail-after").copied(),
            ..SimulatedBackend::default()
        })
    } else {
        Arc::new(HlsBackend::new()?)
    };

    let latest: LatestReport = Arc::new(Mutex::new(None));
    let report: ReportFn = if quiet {
        Arc::new(move |report| print_report(&report, json))
    } else {
        let latest = latest.clone();
        Arc::new(move |report| {
            *latest.lock().unwrap_or_else(|e| e.into_inner()) = Some(report);
        })
    };

    let mut session = PlaybackSession::new(backend, report);
    session.set_target_buffer(initial_buffer);

    if quiet {
        session.start()?;
        return Ok(run_headless(&mut session, json, exit_after));
    }

    if let Err(err) = session.start() {
        warn!("initial start failed: {}", err);
    }
    run_tui(&mut session, &latest, &log_buffer, exit_after);
    Ok(0)
}

fn print_report(report: &LatencyReport, json: bool) {
    if json {
        match serde_json::to_string(report) {
            Ok(line) => println!("{}", line),
            Err(err) => warn!("could not serialize report: {}", err),
        }
    } else {
        println!("{} [{}]", report.label(), report.severity);
    }
}

fn print_event(event: &PlaybackEvent, json: bool) {
    if json {
        println!("{}", serde_json::json!({ "event": event.to_string() }));
    } else {
        println!("event: {}", event);
    }
}

/// Print updates until the deadline or the stream ends or fails.
fn run_headless(session: &mut PlaybackSession, json: bool, exit_after: Option<Duration>) -> i32 {
    let started = Instant::now();

    let code = loop {
        for event in session.poll_events() {
            print_event(&event, json);
        }

        match session.state() {
            SessionState::Ended => break 0,
            SessionState::Failed(_) => break 1,
            SessionState::Idle | SessionState::Playing => {}
        }

        if exit_after.is_some_and(|limit| started.elapsed() >= limit) {
            break 0;
        }

        sleep(Duration::from_millis(50));
    };

    session.stop();
    code
}

fn run_tui(
    session: &mut PlaybackSession,
    latest: &LatestReport,
    log_buffer: &LogBuffer,
    exit_after: Option<Duration>,
) {
    let started = Instant::now();
    let _raw_mode = RawModeGuard::enable().ok();
    let mut terminal = {
        let mut stdout = io::stdout();
        let _ = execute!(stdout, EnterAlternateScreen, cursor::Hide);
        let backend = CrosstermBackend::new(stdout);
        Terminal::new(backend).ok()
    };

    let mut last_event: Option<PlaybackEvent> = None;

    loop {
        if let Some(event) = session.poll_events().pop() {
            last_event = Some(event);
        }

        if let Some(term) = terminal.as_mut() {
            let report = *latest.lock().unwrap_or_else(|e| e.into_inner());
            let target_buffer_secs = session.target_buffer_secs();
            let status = controls::status_text(controls::StatusArgs {
                report,
                target_buffer_secs,
                state: session.state(),
                last_event: last_event.as_ref(),
            });
            let log_lines = logging::snapshot(log_buffer);
            ui::draw_status(term, &status, target_buffer_secs, &log_lines);
        }

        match controls::handle_key_event(session) {
            KeyOutcome::Quit => break,
            KeyOutcome::Restarted | KeyOutcome::Stopped => {
                *latest.lock().unwrap_or_else(|e| e.into_inner()) = None;
                last_event = None;
            }
            KeyOutcome::BufferChanged(_) | KeyOutcome::Ignored => {}
        }

        if exit_after.is_some_and(|limit| started.elapsed() >= limit) {
            break;
        }

        sleep(Duration::from_millis(50));
    }

    session.stop();

    // Restore the terminal state before exiting.
    if let Some(mut term) = terminal {
        let _ = term.show_cursor();
        let stdout = term.backend_mut();
        let _ = execute!(stdout, LeaveAlternateScreen, cursor::Show);
    }
}

struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
