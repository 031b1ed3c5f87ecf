use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing::info;
use waypoint_ai::OpenAiClient;
use waypoint_gateway::run_chat_server;
use waypoint_specialist::{Specialist, SpecialistHealth};
use waypoint_supervisor::{
    ActionRegistry, ProgressEvent, ProgressSink, SpecialistDirectory, Supervisor,
};

use crate::cli_args::{chat_server_config, Cli, CliCommand};

pub(crate) async fn run_cli(cli: Cli) -> Result<ExitCode> {
    match &cli.command {
        CliCommand::Serve { bind, static_dir } => {
            let supervisor = Arc::new(build_supervisor(&cli)?);
            run_chat_server(supervisor, chat_server_config(bind, static_dir.clone())).await?;
            Ok(ExitCode::SUCCESS)
        }
        CliCommand::Ask { message } => {
            let supervisor = build_supervisor(&cli)?;
            run_ask(&supervisor, message, &mut std::io::stdout()).await
        }
        CliCommand::Probe => {
            let directory = build_directory(&cli, &ActionRegistry::travel())?;
            run_probe(&directory, &mut std::io::stdout()).await
        }
    }
}

fn build_directory(cli: &Cli, registry: &ActionRegistry) -> Result<SpecialistDirectory> {
    SpecialistDirectory::from_configs(cli.specialist_configs(registry))
        .context("failed to build specialist clients")
}

fn build_supervisor(cli: &Cli) -> Result<Supervisor> {
    let openai = cli.openai_config().map_err(|error| anyhow!(error))?;
    let api_base = openai.api_base.clone();
    let client = OpenAiClient::new(openai).context("failed to build reasoning endpoint client")?;
    let registry = ActionRegistry::travel();
    let directory = build_directory(cli, &registry)?;
    info!(
        api_base = api_base.as_str(),
        model = cli.model.as_str(),
        specialists = directory.len(),
        "supervisor configured"
    );
    Ok(Supervisor::new(
        Arc::new(client),
        registry,
        directory,
        cli.supervisor_config(),
    ))
}

/// Runs one request and writes each event as a JSON line. Exit code 1 when
/// the run ended in an error.
pub(crate) async fn run_ask(
    supervisor: &Supervisor,
    message: &str,
    out: &mut impl Write,
) -> Result<ExitCode> {
    let (sink, mut receiver) = ProgressSink::channel();
    let run = supervisor.execute(message, &sink);
    tokio::pin!(run);

    let mut finished = false;
    let mut answered = false;
    loop {
        tokio::select! {
            _ = &mut run, if !finished => {
                finished = true;
            }
            event = receiver.recv() => {
                let Some(event) = event else { break };
                if matches!(event, ProgressEvent::Response { .. }) {
                    answered = true;
                }
                let line = serde_json::to_string(&event).context("failed to encode event")?;
                writeln!(out, "{line}").context("failed to write event")?;
                out.flush().context("failed to flush stdout")?;
                if event.is_terminal() {
                    break;
                }
            }
        }
    }

    if !finished {
        run.await;
    }
    Ok(if answered {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Probes every specialist and writes one line each. Exit code 1 when any is
/// unhealthy.
pub(crate) async fn run_probe(
    directory: &SpecialistDirectory,
    out: &mut impl Write,
) -> Result<ExitCode> {
    let mut all_healthy = true;
    for specialist in directory.specialists() {
        let health = specialist.health().await;
        all_healthy &= health.healthy;
        writeln!(out, "{}", render_health_line(specialist.as_ref(), &health))
            .context("failed to write probe result")?;
    }
    Ok(if all_healthy {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn render_health_line(specialist: &dyn Specialist, health: &SpecialistHealth) -> String {
    let status = if health.healthy { "healthy" } else { "unhealthy" };
    let detail = match (&health.agent, &health.detail) {
        (_, Some(detail)) => detail.as_str(),
        (Some(agent), None) => agent.as_str(),
        (None, None) => "-",
    };
    format!(
        "{} ({}) {status} {detail}",
        health.key,
        specialist.display_name()
    )
}
