/*
 * SPDX-FileCopyrightText: 2025 Wavelens UG <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use connector::HydraConnection;
use hydra_provider::config::{ConfigFile, ProviderArgs};
use hydra_provider::diagnostics::{Operation, summary};
use hydra_provider::reconcile;
use hydra_provider::resources::{ResourceData, ResourceKind, jobset, project};
use hydra_provider::state::{StateConfiguration, StateFile};
use hydra_provider::{Diagnostics, ProviderResult};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::process::exit;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(name = "hydra-provider", display_name = "hydra-provider", bin_name = "hydra-provider", author = "Wavelens", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Option<MainCommands>,
    #[arg(long, value_enum)]
    generate_completions: Option<Shell>,
    #[arg(long, global = true, env = "HYDRA_LOG_LEVEL", default_value = "info")]
    log_level: String,
    #[command(flatten)]
    provider: ProviderArgs,
}

#[derive(Subcommand, Debug)]
enum MainCommands {
    /// Check the desired state without contacting Hydra.
    Validate {
        #[arg(short, long, default_value = "hydra.toml")]
        file: PathBuf,
    },
    Plan {
        #[arg(short, long, default_value = "hydra.toml")]
        file: PathBuf,
        #[arg(long, env = "HYDRA_STATE_FILE", default_value = "hydra-state.json")]
        state: PathBuf,
    },
    Apply {
        #[arg(short, long, default_value = "hydra.toml")]
        file: PathBuf,
        #[arg(long, env = "HYDRA_STATE_FILE", default_value = "hydra-state.json")]
        state: PathBuf,
    },
    /// Delete every resource recorded in the state file.
    Destroy {
        #[arg(long, env = "HYDRA_STATE_FILE", default_value = "hydra-state.json")]
        state: PathBuf,
    },
    /// Track an existing project (`name`) or jobset (`project/jobset`).
    Import {
        kind: ResourceKind,
        address: String,
        id: String,
        #[arg(long, env = "HYDRA_STATE_FILE", default_value = "hydra-state.json")]
        state: PathBuf,
    },
    Show {
        kind: ResourceKind,
        id: String,
    },
}

fn setup_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

fn report(diagnostics: &Diagnostics) {
    if !diagnostics.is_empty() {
        eprintln!("{}", diagnostics);
    }

    if diagnostics.has_errors() {
        exit(1);
    }
}

fn load_desired(path: &Path) -> Result<StateConfiguration> {
    let config = StateConfiguration::from_file(path)?;

    let validation = config.validate();
    if !validation.is_valid {
        let error_messages = validation
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<String>>();

        return Err(anyhow::anyhow!(
            "State configuration validation failed:\n{}",
            error_messages.join("\n")
        ));
    }

    Ok(config)
}

async fn connect(args: &ProviderArgs, cancel: CancellationToken) -> Result<HydraConnection> {
    let file = ConfigFile::discover(args.config.as_deref())?;
    let config = args.request_config(&file)?;

    let connection = HydraConnection::new(&config)?.with_cancellation(cancel);
    connection
        .login(&config.username, &config.password)
        .await
        .with_context(|| format!("Failed to log in to {}", config.server_url))?;

    tracing::debug!("Logged in to {} as {}", config.server_url, config.username);
    Ok(connection)
}

fn persist_to(path: &Path) -> impl FnMut(&StateFile) -> Result<()> + '_ {
    move |state: &StateFile| state.save(path)
}

fn render<T: Serialize>(result: ProviderResult<ResourceData<T>>, kind: ResourceKind) -> Result<()> {
    match result {
        Ok(data) => println!("{}", serde_json::to_string_pretty(&data)?),
        Err(err) => report(&err.into_diagnostics(&summary(Operation::Read, kind))),
    }

    Ok(())
}

async fn run(cli: Cli, cancel: CancellationToken) -> Result<()> {
    let Some(cmd) = cli.cmd else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match cmd {
        MainCommands::Validate { file } => {
            load_desired(&file)?;
            println!("State configuration validated successfully");
        }

        MainCommands::Plan { file, state } => {
            let desired = load_desired(&file)?;
            let mut current = StateFile::load(&state)?;
            let connection = connect(&cli.provider, cancel).await?;

            let diagnostics = reconcile::refresh(&connection, &mut current).await;
            report(&diagnostics);

            println!("{}", reconcile::plan(&desired, &current));
        }

        MainCommands::Apply { file, state } => {
            let desired = load_desired(&file)?;
            let mut current = StateFile::load(&state)?;
            let connection = connect(&cli.provider, cancel).await?;

            let mut diagnostics = reconcile::refresh(&connection, &mut current).await;
            if diagnostics.has_errors() {
                report(&diagnostics);
            }

            let plan = reconcile::plan(&desired, &current);
            println!("{}", plan);

            current.save(&state)?;
            diagnostics.extend(reconcile::apply(&connection, &mut current, &plan, persist_to(&state)).await);
            report(&diagnostics);
        }

        MainCommands::Destroy { state } => {
            let mut current = StateFile::load(&state)?;
            if current.is_empty() {
                println!("Nothing to destroy.");
                return Ok(());
            }

            let connection = connect(&cli.provider, cancel).await?;
            let diagnostics = reconcile::destroy(&connection, &mut current, persist_to(&state)).await;
            report(&diagnostics);
        }

        MainCommands::Import {
            kind,
            address,
            id,
            state,
        } => {
            let mut current = StateFile::load(&state)?;
            let connection = connect(&cli.provider, cancel).await?;

            let diagnostics =
                reconcile::import(&connection, &mut current, kind, &address, &id).await;
            report(&diagnostics);

            current.save(&state)?;
            println!("Imported {} {} as {}", kind, id, address);
        }

        MainCommands::Show { kind, id } => {
            let connection = connect(&cli.provider, cancel).await?;
            match kind {
                ResourceKind::Project => render(project::import(&connection, &id).await, kind)?,
                ResourceKind::Jobset => render(jobset::import(&connection, &id).await, kind)?,
            }
        }
    }

    Ok(())
}

#[tokio::main]
pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(shell) = cli.generate_completions {
        let mut app = Cli::command();
        let bin_name = app.get_name().to_string();
        generate(shell, &mut app, bin_name, &mut io::stdout());
        return Ok(());
    }

    setup_logging(&cli.log_level);

    let cancel = CancellationToken::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling outstanding requests");
            watcher.cancel();
        }
    });

    if let Err(e) = run(cli, cancel).await {
        eprintln!("Error: {:#}", e);
        exit(1);
    }

    Ok(())
}
