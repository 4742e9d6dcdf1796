//! Drover CLI
//!
//! Loads an agent profile, builds the connection registry from its
//! provider blocks, and exposes the runtime's operations as
//! subcommands: the autonomous loop, one-shot actions (through the
//! same dispatch path the loop uses), connection listings, and
//! credential setup.

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use colored::Colorize;
use drover_common::AgentProfile;
use drover_common::constants::providers;
use drover_core::connections::OpenAiConnection;
use drover_core::{AgentLoop, ConnectionRegistry};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the Drover CLI
#[derive(Parser)]
#[command(
    name = "drover",
    about = "Drover - autonomous agent runtime with pluggable providers"
)]
struct Args {
    /// Path to the agent profile JSON file
    #[clap(short, long, default_value = "agents/default.json")]
    agent: PathBuf,

    /// Enable debug logging
    #[clap(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the agent's autonomous behavior loop (Ctrl+C to stop)
    Run,
    /// Run a single agent action and print its result
    Action {
        /// Connection that handles the action
        connection: String,
        /// Action name
        action: String,
        /// Arguments as key=value pairs; values are parsed as JSON
        /// where possible, otherwise taken as strings
        args: Vec<String>,
    },
    /// List connections with their configured status
    ListConnections,
    /// List the actions one connection supports
    ListActions {
        connection: String,
    },
    /// Interactively set up a connection's credentials
    Configure {
        connection: String,
    },
}

/// Build the registry from the profile's provider blocks. Blocks for
/// providers this build does not ship are skipped with a warning so a
/// shared profile still works.
fn build_registry(profile: &AgentProfile) -> Result<ConnectionRegistry> {
    let mut registry = ConnectionRegistry::new();
    for settings in &profile.connections {
        match settings.name.as_str() {
            providers::OPENAI => {
                registry.register(Box::new(OpenAiConnection::with_options(&settings.options)))?;
            }
            other => {
                warn!("no provider implementation for '{}'; block skipped", other);
            }
        }
    }
    Ok(registry)
}

/// Parse one `key=value` argument; the value side is JSON when it
/// parses as JSON, a plain string otherwise
fn parse_kv(raw: &str) -> Result<(String, Value)> {
    let (key, value) = raw
        .split_once('=')
        .with_context(|| format!("argument '{}' is not of the form key=value", raw))?;
    if key.is_empty() {
        bail!("argument '{}' has an empty key", raw);
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn parse_action_args(raw: &[String]) -> Result<Map<String, Value>> {
    let mut args = Map::new();
    for entry in raw {
        let (key, value) = parse_kv(entry)?;
        args.insert(key, value);
    }
    Ok(args)
}

async fn run_loop(profile: AgentProfile, registry: Arc<ConnectionRegistry>) {
    let token = CancellationToken::new();
    let stopper = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received, stopping after the current iteration");
            stopper.cancel();
        }
    });

    println!(
        "{} {} at {}",
        "Starting agent".bright_cyan(),
        profile.name.bright_green().bold(),
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    AgentLoop::new(&profile, registry).run(token).await;
}

async fn list_connections(registry: &ConnectionRegistry) {
    println!("{}", "Available connections:".bright_cyan().bold());
    for status in registry.list().await {
        let state = if status.configured {
            "configured".green()
        } else {
            "not configured".red()
        };
        let kind = if status.is_llm_provider { " (llm)" } else { "" };
        println!("- {}{} : {}", status.name.bright_green(), kind, state);
    }
}

async fn list_actions(registry: &ConnectionRegistry, name: &str) -> Result<()> {
    let connection = registry.get(name)?;
    if connection.is_configured(false).await {
        println!(
            "{} is configured. You can use any of its actions.",
            name.bright_green()
        );
    } else {
        println!(
            "{} is {}. Configure it before using its actions.",
            name.bright_green(),
            "not configured".red()
        );
    }
    println!("{}", "Available actions:".bright_cyan().bold());
    for action in connection.actions() {
        let usage = action.usage();
        if usage.is_empty() {
            println!("- {}: {}", action.name.bright_yellow(), action.description);
        } else {
            println!(
                "- {} {}: {}",
                action.name.bright_yellow(),
                usage,
                action.description
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Pick up credentials from a local .env, if present
    dotenvy::dotenv().ok();

    let profile = AgentProfile::load(&args.agent)?;
    let registry = build_registry(&profile)?;

    match args.command {
        Command::Run => {
            run_loop(profile, Arc::new(registry)).await;
        }
        Command::Action {
            connection,
            action,
            args,
        } => {
            let action_args = parse_action_args(&args)?;
            let result = registry.perform(&connection, &action, &action_args).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::ListConnections => {
            list_connections(&registry).await;
        }
        Command::ListActions { connection } => {
            list_actions(&registry, &connection).await?;
        }
        Command::Configure { connection } => {
            let target = registry.get(&connection)?;
            if target.configure().await? {
                println!("{} successfully configured", connection.bright_green());
            } else {
                println!("{} left unchanged", connection);
            }
        }
    }
    Ok(())
}
