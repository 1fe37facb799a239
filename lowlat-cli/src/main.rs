//! # Lowlat
//!
//! A terminal HLS viewer that shows an estimated playback latency.

use log::error;

mod cli;
mod controls;
mod logging;
mod runner;
mod ui;

fn main() {
    // A missing .env file is fine.
    let _ = dotenv::dotenv();

    let args = cli::args::build_cli().get_matches();
    let log_buffer = logging::init(args.get_flag("quiet"));

    let code = match runner::run(&args, log_buffer) {
        Ok(code) => code,
        Err(err) => {
            error!("{}", err.to_string().to_lowercase());
            eprintln!("lowlat: {}", err);
            -1
        }
    };

    std::process::exit(code)
}
