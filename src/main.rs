// ABOUTME: Entry point for the ncdeploy CLI application.
// ABOUTME: Parses arguments, sets up logging, and runs the orchestrator under a signal finalizer.

mod cli;

use clap::Parser;
use cli::Cli;
use ncdeploy::config::{Flags, Mode, Settings};
use ncdeploy::error::{Error, Result};
use ncdeploy::marker::RunMarker;
use ncdeploy::orchestrator::{Finalizer, Orchestrator};
use ncdeploy::output::Output;
use ncdeploy::runner::SystemRunner;
use ncdeploy::signal::wait_for_shutdown;
use ncdeploy::state::new_deployment_id;
use std::env;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let mode = cli.mode();
    let flags = cli.flags();

    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let code = {
        let _guard = match ncdeploy::logging::init(&settings, flags.verbose) {
            Ok(guard) => guard,
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        };
        run(mode, flags, settings).await
    };

    std::process::exit(code);
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let project_dir = match cli.project_dir {
        Some(ref dir) => dir.clone(),
        None => env::current_dir()?,
    };
    let settings = Settings::load(&project_dir)?;
    settings.ensure_dirs()?;
    Ok(settings)
}

/// Run one invocation and return the process exit code.
async fn run(mode: Mode, flags: Flags, settings: Settings) -> i32 {
    let output = Output::new(flags.verbose);
    let deployment_id = new_deployment_id();
    let finalizer = Finalizer::new(&settings, &deployment_id);

    let marker = match RunMarker::create(&settings.pid_file, &deployment_id) {
        Ok(marker) => marker,
        Err(e) => {
            output.error(&format!("cannot write run marker: {e}"));
            return 1;
        }
    };
    tracing::info!(pid = std::process::id(), "Run marker at {}", marker.path().display());

    let runner = if flags.verbose {
        SystemRunner::inherit()
    } else {
        SystemRunner::with_transcript(&settings.log_file)
    };
    let mut orchestrator = Orchestrator::new(settings, flags, runner, deployment_id);

    let result = tokio::select! {
        result = orchestrator.run(mode) => result,
        shutdown = wait_for_shutdown() => {
            let code = shutdown.exit_code();
            output.error(&format!("interrupted ({shutdown:?}), exiting with code {code}"));
            if let Err(e) = finalizer.interrupted(code) {
                eprintln!("Error: failed to record interruption: {e}");
            }
            return code;
        }
    };

    match result {
        Ok(_) => {
            release(&finalizer, &output);
            0
        }
        Err(e) => {
            report_error(&e, &output);
            if e.is_abnormal() {
                if let Err(fe) = finalizer.interrupted(1) {
                    eprintln!("Error: failed to record failure: {fe}");
                }
            } else {
                release(&finalizer, &output);
            }
            1
        }
    }
}

fn report_error(e: &Error, output: &Output) {
    match e {
        Error::Prerequisites(count) => {
            output.error(&format!("{count} prerequisite(s) not met, aborting before any changes"));
        }
        other => output.error(&other.to_string()),
    }
}

fn release(finalizer: &Finalizer, output: &Output) {
    if let Err(e) = finalizer.release() {
        tracing::warn!("Failed to remove run marker: {}", e);
        output.warning(&format!("failed to remove run marker: {e}"));
    }
}
