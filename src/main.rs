use std::process::ExitCode;

use askcmd::cli;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool) {
    // Warnings stay visible by default; stdout is reserved for the answer
    let filter_level = if verbose { Level::DEBUG } else { Level::WARN };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(filter_level.into()))
        .with_writer(std::io::stderr)
        .with_target(true) // Show module path
        .with_level(true) // Show log level
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::time())
        .init();
}

fn main() -> ExitCode {
    let cli = match cli::Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            use clap::error::ErrorKind;

            e.print().ok();
            return match e.kind() {
                ErrorKind::DisplayVersion | ErrorKind::DisplayHelp => ExitCode::SUCCESS,
                _ => ExitCode::from(2),
            };
        }
    };

    init_logging(cli.verbose);
    tracing::debug!("Starting askcmd v{}", env!("CARGO_PKG_VERSION"));

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(cli::run(cli)) {
        Ok(code) => code,
        Err(e) => {
            tracing::debug!(error = ?e, "Invocation failed");
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
