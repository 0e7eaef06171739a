#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

mod application;
mod configuration;
mod domain;
mod infrastructure;

use std::env;
use std::process;

use anyhow::Error;
use yansi::Paint;

use crate::application::cli;

fn handle_error(err: Error) {
    eprintln!("{}", Paint::red(format!("Error: {err}")));

    let backtrace = err.backtrace();
    if backtrace.to_string() != "disabled backtrace" {
        eprintln!("\n{}", backtrace);
        return;
    }

    if env::var("RUST_LOG").is_err() {
        let args = env::args().collect::<Vec<String>>().join(" ");
        eprintln!(
            "\nVersion: {} ({})\nRunning the following can help explain further what the issue is:",
            env!("CARGO_PKG_VERSION"),
            env!("VERGEN_GIT_DESCRIBE")
        );
        eprintln!("\nRUST_LOG=vicnotes RUST_BACKTRACE=1 {args}");
    }
}

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let file_appender = tracing_appender::rolling::never(cli::log_dir(), "debug.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    if env::var("RUST_LOG")
        .unwrap_or_else(|_| return "".to_string())
        .contains("vicnotes")
    {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(writer)
            .init();
    }

    let mut exit_code = 0;
    if let Err(err) = cli::parse().await {
        handle_error(err);
        exit_code = 1;
    }

    // Flush pending log lines before exiting.
    drop(guard);
    process::exit(exit_code);
}
