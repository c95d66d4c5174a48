//! `a11y` command-line host
//!
//! Reports and repairs accessibility defects in HTML documents. Results go
//! to stdout, logs to stderr. Exit status:
//!
//! - `0` run completed within the threshold
//! - `1` run completed with more filtered issues than the threshold
//! - `2` configuration or input error
//! - `3` scanner failure
//! - `4` generation failure
//! - `5` any other fatal error

mod cli;
mod commands;
mod input;

use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli::build().get_matches();
    init_tracing(matches.get_flag("log-json"));

    match commands::run(&matches).await {
        Ok(status) => status,
        Err(err) => {
            let status = commands::failure_status(&err);
            error!(status, error = %format!("{err:#}"), "command failed");
            eprintln!("error: {err:#}");
            ExitCode::from(status)
        }
    }
}
