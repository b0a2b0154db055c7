//! Adjutant CLI
//!
//! REPL front-end for the agent core: reads user input, submits turns to a
//! session, and prints the messages each turn produces. The session is
//! restartable; rerunning with the same --session id resumes from the
//! durable checkpoint.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use dialoguer::Input;
use tokio::signal;
use tokio::sync::watch;

use adjutant::agent::agent_loop::{Session, SessionOptions};
use adjutant::config::{self, AgentConfig};
use adjutant::gateway::OpenAiGateway;
use adjutant::host::LocalHost;
use adjutant::state::SqliteStore;
use adjutant::types::{AgentError, Message, Role};

const VERSION: &str = "0.1.0";

/// Adjutant -- Conversational Tool-Using Agent
#[derive(Parser, Debug)]
#[command(
    name = "adjutant",
    version = VERSION,
    about = "Conversational agent with checkpointed, resumable sessions"
)]
struct Cli {
    /// Session id to resume or create
    #[arg(long, default_value = "default")]
    session: String,

    /// Show the current configuration and exit
    #[arg(long)]
    status: bool,
}

fn show_status(config: &AgentConfig) {
    println!(
        r#"
=== ADJUTANT STATUS ===
Model:      {}
API URL:    {}
DB Path:    {}
Allowlist:  {}
Version:    {}
=======================
"#,
        config.model,
        config.api_url,
        config::resolve_path(&config.db_path),
        config.safe_prefixes.join(", "),
        VERSION,
    );
}

/// Truncate to at most `max` bytes without splitting a UTF-8 character.
fn truncate_preview(content: &str, max: usize) -> &str {
    if content.len() <= max {
        return content;
    }
    let mut end = max;
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    &content[..end]
}

fn print_message(message: &Message) {
    match message.role {
        Role::ToolResult => {
            let truncated = truncate_preview(&message.content, 400);
            let preview = if truncated.len() < message.content.len() {
                format!("{}...", truncated)
            } else {
                truncated.to_string()
            };
            println!("{} {}", "[tool]".dimmed(), preview.dimmed());
        }
        Role::Assistant => {
            println!("{} {}", "Adjutant:".green().bold(), message.content);
        }
        Role::User => {}
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::load_config().unwrap_or_else(|| {
        let mut defaults = AgentConfig::default();
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            defaults.api_key = key;
        }
        defaults
    });

    if cli.status {
        show_status(&config);
        return Ok(());
    }

    if config.api_key.is_empty() {
        eprintln!("No API key configured. Set OPENAI_API_KEY or edit ~/.adjutant/adjutant.json");
        std::process::exit(1);
    }

    let db_path = config::resolve_path(&config.db_path);
    let store = Arc::new(SqliteStore::open(&db_path).context("Failed to open checkpoint store")?);
    let gateway = Arc::new(OpenAiGateway::new(&config));
    let host = Arc::new(LocalHost);

    // Ctrl+C mid-turn abandons the turn at the next suspension point.
    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        loop {
            if signal::ctrl_c().await.is_err() {
                break;
            }
            let _ = stop_tx.send(true);
        }
    });

    let mut session = Session::open(
        &cli.session,
        SessionOptions {
            config,
            store,
            gateway,
            host,
            on_message: Some(Box::new(print_message)),
            stop: Some(stop_rx),
        },
    )
    .map_err(|e| anyhow::anyhow!("failed to open session: {e}"))?;

    println!(
        "{} session '{}' ({} prior messages). Type 'exit' to quit.",
        "Adjutant".green().bold(),
        session.session_id(),
        session.messages().len(),
    );

    loop {
        let user_input: String = Input::new().with_prompt("You").interact_text()?;
        let trimmed = user_input.trim();

        if trimmed.is_empty() {
            continue;
        }
        if matches!(trimmed.to_lowercase().as_str(), "exit" | "quit") {
            println!("Exiting...");
            break;
        }

        match session.submit(trimmed).await {
            Ok(_produced) => {}
            Err(AgentError::Interrupted) => {
                println!("{}", "Turn interrupted; nothing was saved.".yellow());
            }
            Err(err) => {
                eprintln!("{} {}", "Turn failed:".red(), err);
                eprintln!("The session is unchanged; you can resubmit.");
            }
        }
    }

    Ok(())
}


#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Fatal: {}", e);
        std::process::exit(1);
    }
}
