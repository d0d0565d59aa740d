use std::process::ExitCode;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;

use node_onboarding::builder::Stage1;
use node_onboarding::config::WizardConfig;
use node_onboarding::orchestrator::{Orchestrator, RunOutcome};

const LOG_FILE_NAME: &str = "onboarding.log";

/// Log to a file in the output directory; the terminal belongs to the dialogs.
fn init_tracing(config: &WizardConfig) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            config.output_dir.display()
        )
    })?;
    let appender = tracing_appender::rolling::never(&config.output_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Ok(guard)
}

async fn run(config: WizardConfig) -> anyhow::Result<RunOutcome> {
    let stage1 = Stage1::from_config(&config)
        .await
        .context("Failed to prepare the wizard")?;
    let orchestrator = Orchestrator::new(stage1, config.max_gateway_failures);
    Ok(orchestrator.run().await?)
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match WizardConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(1);
        }
    };
    let log_guard = match init_tracing(&config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::from(1);
        }
    };
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Onboarding wizard starting");

    let code: u8 = tokio::select! {
        result = run(config) => match result {
            Ok(RunOutcome::Quit) => {
                tracing::info!("Wizard finished");
                0
            }
            Ok(RunOutcome::Halted(reason)) => {
                tracing::info!(%reason, "Wizard halted");
                2
            }
            Err(e) => {
                tracing::error!(error = %format!("{e:#}"), "Wizard failed");
                eprintln!("Error: {e:#}");
                1
            }
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted");
            eprintln!();
            130
        }
    };

    // The stdin reader may still be parked on a blocking read; exit without
    // waiting for the runtime to wind it down.
    drop(log_guard);
    std::process::exit(code.into());
}
