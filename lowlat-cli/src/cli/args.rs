//! CLI argument definitions for `lowlat`.

use clap::{value_parser, Arg, ArgAction, Command};

/// Build the CLI argument parser.
pub fn build_cli() -> Command {
    Command::new("lowlat")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Play an HLS stream and show its estimated playback latency")
        .arg(
            Arg::new("buffer")
                .long("buffer")
                .short('b')
                .value_name("SECONDS")
                .default_value("3.0")
                .value_parser(value_parser!(f64))
                .help("Initial target forward buffer in seconds (0.5-10.0)"),
        )
        .arg(
            Arg::new("simulate")
                .long("simulate")
                .action(ArgAction::SetTrue)
                .help("Use a simulated network instead of fetching the stream"),
        )
        .arg(
            Arg::new("simulate-segments")
                .long("simulate-segments")
                .value_name("COUNT")
                .value_parser(value_parser!(usize))
                .requires("simulate")
                .hide(true)
                .help("End the simulated stream after this many segments"),
        )
        .arg(
            Arg::new("simulate-fail-after")
                .long("simulate-fail-after")
                .value_name("COUNT")
                .value_parser(value_parser!(usize))
                .requires("simulate")
                .hide(true)
                .help("Fail the simulated stream after this many segments"),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .action(ArgAction::SetTrue)
                .help("No terminal UI; print one line per latency update"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .requires("quiet")
                .help("With --quiet, print each update as a JSON line"),
        )
        .arg(
            Arg::new("exit-after")
                .long("exit-after")
                .value_name("SECONDS")
                .value_parser(value_parser!(f64))
                .help("Stop playback and exit after this many seconds"),
        )
}
