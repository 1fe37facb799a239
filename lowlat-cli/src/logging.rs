use log::{LevelFilter, Log, Metadata, Record};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, OnceLock};

const LOG_CAPACITY: usize = 500;

/// Target prefix shared by the viewer's own crates.
const OWN_TARGET: &str = "lowlat";

pub type LogBuffer = Arc<Mutex<VecDeque<String>>>;

/// Levels for our crates and for everything else.
///
/// The HTTP stack (reqwest, hyper, rustls) is chatty at debug level, so
/// dependencies default to `warn` unless `RUST_LOG` names a bare level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LevelFilters {
    own: LevelFilter,
    deps: LevelFilter,
}

impl Default for LevelFilters {
    fn default() -> Self {
        Self {
            own: LevelFilter::Info,
            deps: LevelFilter::Warn,
        }
    }
}

impl LevelFilters {
    fn for_target(&self, target: &str) -> LevelFilter {
        if target.starts_with(OWN_TARGET) {
            self.own
        } else {
            self.deps
        }
    }

    fn max(&self) -> LevelFilter {
        self.own.max(self.deps)
    }
}

struct SharedLogger {
    filters: LevelFilters,
    buffer: LogBuffer,
    echo_stderr: bool,
}

impl Log for SharedLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.filters.for_target(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = format_line(record.level(), record.target(), &record.args().to_string());
        if self.echo_stderr {
            eprintln!("{}", line);
        }

        push_line(&self.buffer, line);
    }

    fn flush(&self) {}
}

static LOG_BUFFER: OnceLock<LogBuffer> = OnceLock::new();
static LOGGER: OnceLock<SharedLogger> = OnceLock::new();

/// Install the shared logger and return its line buffer.
pub fn init(headless: bool) -> LogBuffer {
    let buffer = LOG_BUFFER
        .get_or_init(|| Arc::new(Mutex::new(VecDeque::with_capacity(LOG_CAPACITY))))
        .clone();

    let filters = parse_filters(std::env::var("RUST_LOG").ok().as_deref());
    let echo_stderr = echo_to_stderr(std::env::var("LOWLAT_LOG_STDERR").ok().as_deref(), headless);

    let logger = SharedLogger {
        filters,
        buffer: buffer.clone(),
        echo_stderr,
    };

    let logger_ref = LOGGER.get_or_init(|| logger);
    if log::set_logger(logger_ref).is_ok() {
        log::set_max_level(filters.max());
    }

    buffer
}

pub fn snapshot(buffer: &LogBuffer) -> Vec<String> {
    buffer
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .iter()
        .cloned()
        .collect()
}

/// Headless runs print reports on stdout and have no log panel, so their
/// logs go to stderr unless `LOWLAT_LOG_STDERR=0`. The TUI only echoes when
/// the variable is set to something else.
fn echo_to_stderr(setting: Option<&str>, headless: bool) -> bool {
    match setting.map(str::trim) {
        Some("0") | Some("false") | Some("off") => false,
        Some(_) => true,
        None => headless,
    }
}

/// Parse a `RUST_LOG` value such as `debug` or `warn,lowlat_lib=trace`.
///
/// A bare level applies to every target. `target=level` entries only matter
/// for our own crates; directives for other crates are ignored.
fn parse_filters(value: Option<&str>) -> LevelFilters {
    let mut filters = LevelFilters::default();
    let Some(value) = value else {
        return filters;
    };

    let mut own_override = None;
    for directive in value.split(',').map(str::trim).filter(|d| !d.is_empty()) {
        match directive.split_once('=') {
            Some((target, level)) if target.trim().starts_with(OWN_TARGET) => {
                if let Some(level) = parse_level(level) {
                    own_override = Some(level);
                }
            }
            Some(_) => {}
            None => {
                if let Some(level) = parse_level(directive) {
                    filters.own = level;
                    filters.deps = level;
                }
            }
        }
    }

    if let Some(level) = own_override {
        filters.own = level;
    }
    filters
}

fn parse_level(value: &str) -> Option<LevelFilter> {
    match value.trim().to_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

/// Our own lines stay short; dependency lines are tagged with their target.
fn format_line(level: log::Level, target: &str, message: &str) -> String {
    if target.starts_with(OWN_TARGET) {
        format!("[{}] {}", level, message)
    } else {
        format!("[{} {}] {}", level, target, message)
    }
}

fn push_line(buffer: &LogBuffer, line: String) {
    let mut buffer = buffer.lock().unwrap_or_else(|e| e.into_inner());
    if buffer.len() >= LOG_CAPACITY {
        buffer.pop_front();
    }
    buffer.push_back(line);
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    #[test]
    fn dependencies_are_quieter_by_default() {
        let filters = parse_filters(None);
        assert_eq!(filters.for_target("lowlat_lib::hls::loader"), LevelFilter::Info);
        assert_eq!(filters.for_target("reqwest::connect"), LevelFilter::Warn);
        assert_eq!(filters.max(), LevelFilter::Info);
    }

    #[test]
    fn bare_level_applies_everywhere() {
        let filters = parse_filters(Some("DEBUG"));
        assert_eq!(filters.own, LevelFilter::Debug);
        assert_eq!(filters.deps, LevelFilter::Debug);
    }

    #[test]
    fn own_directive_overrides_bare_level() {
        let filters = parse_filters(Some("lowlat_lib=trace, error, hyper=debug"));
        assert_eq!(filters.own, LevelFilter::Trace);
        assert_eq!(filters.deps, LevelFilter::Error);
        assert_eq!(filters.max(), LevelFilter::Trace);
    }

    #[test]
    fn unknown_levels_keep_defaults() {
        assert_eq!(parse_filters(Some("loud")), LevelFilters::default());
        assert_eq!(parse_filters(Some("lowlat=loud")), LevelFilters::default());
    }

    #[test]
    fn headless_echoes_unless_disabled() {
        assert!(echo_to_stderr(None, true));
        assert!(!echo_to_stderr(None, false));
        assert!(!echo_to_stderr(Some("0"), true));
        assert!(!echo_to_stderr(Some("off"), true));
        assert!(echo_to_stderr(Some("1"), false));
    }

    #[test]
    fn dependency_lines_carry_their_target() {
        assert_eq!(format_line(Level::Warn, "lowlat_lib::hls", "retrying"), "[WARN] retrying");
        assert_eq!(
            format_line(Level::Debug, "rustls::client", "handshake"),
            "[DEBUG rustls::client] handshake"
        );
    }

    #[test]
    fn buffer_keeps_most_recent_lines() {
        let buffer: LogBuffer = Arc::new(Mutex::new(VecDeque::new()));
        for i in 0..(LOG_CAPACITY + 3) {
            push_line(&buffer, format!("line {}", i));
        }
        let lines = snapshot(&buffer);
        assert_eq!(lines.len(), LOG_CAPACITY);
        assert_eq!(lines.first().map(String::as_str), Some("line 3"));
        assert_eq!(
            lines.last().cloned(),
            Some(format!("line {}", LOG_CAPACITY + 2))
        );
    }
}
