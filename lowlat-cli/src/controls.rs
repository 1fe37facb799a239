use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use log::warn;
use lowlat_lib::monitor::{LatencyReport, Severity};
use lowlat_lib::playback::{PlaybackEvent, PlaybackSession, SessionState};

/// Step applied by one press of the buffer keys (seconds).
const BUFFER_STEP_SECS: f64 = 0.1;

pub struct StatusSnapshot {
    pub latency: String,
    pub severity: Option<Severity>,
    pub buffer: String,
    pub text: String,
}

pub struct StatusArgs<'a> {
    pub report: Option<LatencyReport>,
    pub target_buffer_secs: f64,
    pub state: &'a SessionState,
    pub last_event: Option<&'a PlaybackEvent>,
}

pub fn status_text(args: StatusArgs) -> StatusSnapshot {
    let latency = match args.report {
        Some(report) => format!("Estimated latency: {}", report.label()),
        None => "Estimated latency: -- ms".to_string(),
    };

    let state = match args.state {
        SessionState::Idle => "■ Stopped".to_string(),
        SessionState::Playing => "▶ Playing".to_string(),
        SessionState::Ended => "⏹ Ended".to_string(),
        SessionState::Failed(error) => format!("✖ Failed: {}", error),
    };

    let buffering = match args.report {
        Some(report) => format!(
            "Buffering: {}   Loaded ahead: {:.1}s",
            if report.is_buffering { "yes" } else { "no" },
            report.loaded_duration_secs
        ),
        None => "Buffering: --   Loaded ahead: --".to_string(),
    };

    let last_event = match args.last_event {
        Some(event) => format!("Last event: {}", event),
        None => "Last event: none".to_string(),
    };

    StatusSnapshot {
        latency,
        severity: args.report.map(|report| report.severity),
        buffer: format!("Buffer: {:.1}s", args.target_buffer_secs),
        text: format!("{}\n{}\n{}", state, buffering, last_event),
    }
}

/// What a key press did to the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyOutcome {
    Ignored,
    BufferChanged(f64),
    Restarted,
    Stopped,
    Quit,
}

pub fn handle_key_event(session: &mut PlaybackSession) -> KeyOutcome {
    if event::poll(Duration::from_millis(100)).unwrap_or(false) {
        if let Ok(Event::Key(key)) = event::read() {
            if key.kind != KeyEventKind::Press {
                return KeyOutcome::Ignored;
            }
            return apply_key(session, key.code);
        }
    }

    KeyOutcome::Ignored
}

pub fn apply_key(session: &mut PlaybackSession, code: KeyCode) -> KeyOutcome {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => {
            session.stop();
            KeyOutcome::Quit
        }
        KeyCode::Char('s') | KeyCode::Char('S') | KeyCode::Enter => {
            // Load failures are already on the session state.
            if let Err(err) = session.start() {
                warn!("restart failed: {}", err);
            }
            KeyOutcome::Restarted
        }
        KeyCode::Char('x') | KeyCode::Char('X') => {
            session.stop();
            KeyOutcome::Stopped
        }
        KeyCode::Left | KeyCode::Char('-') => {
            let next = session.target_buffer_secs() - BUFFER_STEP_SECS;
            KeyOutcome::BufferChanged(session.set_target_buffer(next))
        }
        KeyCode::Right | KeyCode::Char('=') | KeyCode::Char('+') => {
            let next = session.target_buffer_secs() + BUFFER_STEP_SECS;
            KeyOutcome::BufferChanged(session.set_target_buffer(next))
        }
        _ => KeyOutcome::Ignored,
    }
}
