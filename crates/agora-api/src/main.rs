//! Agora CLI and REST API entry point.
//!
//! Binary name: `agora`
//!
//! Parses CLI arguments, loads configuration and wires services, then
//! dispatches to the appropriate command handler or starts the REST API
//! server. Command failures are split into user errors (shown as a
//! failure notice) and unexpected failures (reported, then shown as a
//! generic notice).

mod cli;
mod failure;
mod http;
mod state;

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use clap_complete::generate;

use agora_infra::report::FailureContext;
use agora_types::conversation::SimulationRequest;
use agora_types::llm::SamplingUpdate;

use cli::{AgentCommand, Cli, Commands, GlobalCommand, ParametersCommand};
use state::AppState;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let filter = agora_observe::verbosity_filter(cli.verbose, cli.quiet);
    if let Err(err) = agora_observe::init_tracing(filter, cli.otel) {
        eprintln!("Failed to initialize logging: {err}");
    }

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "agora", &mut std::io::stdout());
        return ExitCode::SUCCESS;
    }

    let state = match AppState::init(cli.test).await {
        Ok(state) => state,
        Err(err) => {
            eprintln!("  {} {err:#}", console::style("✗").red().bold());
            agora_observe::shutdown_tracing();
            return ExitCode::FAILURE;
        }
    };

    let code = match run(&state, &cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let notice = match failure::user_notice(&err) {
                Some(notice) => notice,
                None => {
                    let context = failure_context(&cli);
                    state.reporter.report(&context, &*err).await;
                    failure::unexpected_notice(state.reporter.support_url())
                }
            };
            if let Err(print_err) = cli::output::print_notice(&notice, cli.json) {
                eprintln!("{print_err}");
            }
            ExitCode::FAILURE
        }
    };

    agora_observe::shutdown_tracing();
    code
}

async fn run(state: &AppState, cli: &Cli) -> anyhow::Result<()> {
    let user = cli.user_key();
    let json = cli.json;

    match &cli.command {
        Commands::Agent { action } => match action {
            AgentCommand::List => cli::agent::list(state, &user, json).await,
            AgentCommand::Create {
                name,
                personality,
                avatar_url,
            } => {
                cli::agent::create(state, &user, name, personality, avatar_url.clone(), json).await
            }
            AgentCommand::Delete { name } => cli::agent::delete(state, &user, name, json).await,
            AgentCommand::DeleteAll { force } => {
                cli::agent::delete_all(state, &user, *force, json).await
            }
            AgentCommand::Toggle { name } => cli::agent::toggle(state, &user, name, json).await,
            AgentCommand::Default => cli::agent::load_defaults(state, &user, json).await,
            AgentCommand::Simulation {
                agents,
                topic,
                turns,
                random_order,
                channel,
            } => {
                let request = SimulationRequest {
                    agent_count: *agents,
                    topic: topic.clone(),
                    turns: *turns,
                    random_order: *random_order,
                    channel_id: *channel,
                };
                cli::agent::simulation(state, &user, request, json).await
            }
            AgentCommand::Ask {
                persona,
                question,
                channel,
            } => cli::agent::ask(state, &user, persona, question, *channel, json).await,
        },

        Commands::Global { action } => match action {
            GlobalCommand::Cleanup { channel } => cli::global::cleanup(state, *channel, json).await,
            GlobalCommand::SetSystemPrompt { prompt } => {
                cli::global::set_system_prompt(state, &user, prompt.clone(), json).await
            }
            GlobalCommand::Parameters { action } => match action {
                ParametersCommand::Set {
                    temperature,
                    num_ctx,
                    top_k,
                    top_p,
                    repeat_penalty,
                    num_predict,
                } => {
                    let update = SamplingUpdate {
                        temperature: *temperature,
                        num_ctx: *num_ctx,
                        top_k: *top_k,
                        top_p: *top_p,
                        repeat_penalty: *repeat_penalty,
                        num_predict: *num_predict,
                    };
                    cli::global::set_parameters(state, &user, update, json).await
                }
                ParametersCommand::List => cli::global::list_parameters(state, &user, json).await,
                ParametersCommand::Model { name } => {
                    cli::global::set_model(state, &user, name, json).await
                }
            },
        },

        Commands::Serve { port, host } => serve(state.clone(), host, *port).await,

        Commands::Completions { .. } => Ok(()),
    }
}

async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!(
        "  {} Agora API listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    if state.api_key.is_none() {
        println!(
            "  {}",
            console::style("No AGORA_API_KEY set: the API is unauthenticated").yellow()
        );
    }
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    let reconciler = spawn_reconciler(&state);
    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(task) = reconciler {
        task.abort();
    }
    println!("\n  Server stopped.");
    Ok(())
}

/// Periodically delete identities idle longer than `binding_idle_secs`.
fn spawn_reconciler(state: &AppState) -> Option<tokio::task::JoinHandle<()>> {
    let max_idle = state.config.binding_idle_secs;
    if max_idle == 0 {
        return None;
    }
    let service = state.conversation_service.clone();
    let period = Duration::from_secs(max_idle.clamp(30, 3600));
    tracing::info!(max_idle, period_secs = period.as_secs(), "Identity reconciliation enabled");

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = service.reconcile(max_idle).await;
            if removed > 0 {
                tracing::info!(removed, "Removed idle identities");
            }
        }
    }))
}

/// Command path and options recorded with an unexpected failure.
fn failure_context(cli: &Cli) -> FailureContext {
    let context = |command: &str| FailureContext::new(command).user(cli.user.clone());
    match &cli.command {
        Commands::Agent { action } => match action {
            AgentCommand::List => context("agent list"),
            AgentCommand::Create { name, .. } => context("agent create").option("name", name),
            AgentCommand::Delete { name } => context("agent delete").option("name", name),
            AgentCommand::DeleteAll { .. } => context("agent delete-all"),
            AgentCommand::Toggle { name } => context("agent toggle").option("name", name),
            AgentCommand::Default => context("agent default"),
            AgentCommand::Simulation {
                agents,
                topic,
                turns,
                random_order,
                channel,
            } => context("agent simulation")
                .option("agents", agents)
                .option("topic", topic.as_deref().unwrap_or("(default)"))
                .option("turns", turns)
                .option("random_order", random_order)
                .option("channel", channel),
            AgentCommand::Ask {
                persona, channel, ..
            } => context("agent ask")
                .option("persona", persona)
                .option("channel", channel),
        },
        Commands::Global { action } => match action {
            GlobalCommand::Cleanup { channel } => {
                context("global cleanup").option("channel", channel)
            }
            GlobalCommand::SetSystemPrompt { .. } => context("global set-system-prompt"),
            GlobalCommand::Parameters { action } => match action {
                ParametersCommand::Set { .. } => context("global parameters set"),
                ParametersCommand::List => context("global parameters list"),
                ParametersCommand::Model { name } => {
                    context("global parameters model").option("name", name)
                }
            },
        },
        Commands::Serve { port, host } => context("serve")
            .option("host", host)
            .option("port", port),
        Commands::Completions { .. } => context("completions"),
    }
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
