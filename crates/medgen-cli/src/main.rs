use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::MedgenConfig;

use medgen_core::lookup::format_results;
use medgen_core::{
    AgentOrchestrator, AgentRegistry, ClassifierConfig, ConversationSession, DispatchOutcome,
    DispatchPolicy, Dispatcher, OllamaClient, ProductLookupClient, Router, Sender,
    SessionContext,
};
use medgen_scheduler::{ConsoleSink, ReminderHandle, ReminderScheduler, SchedulerConfig};

#[derive(Parser)]
#[command(name = "medgen")]
#[command(version)]
#[command(about = "MedGen — a healthcare assistant with specialized agents")]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive chat session (the default)
    Chat,

    /// Send a one-shot message to the router
    Ask {
        /// The message to send
        message: String,
    },

    /// Initialize config directory and default config
    Init,

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Init => cmd_init().await,
        Commands::Config => cmd_config(&cli.config).await,
        Commands::Chat => cmd_chat(&cli.config).await,
        Commands::Ask { message } => cmd_ask(&cli.config, &message).await,
    }
}

async fn cmd_init() -> Result<()> {
    let config_dir = config::config_dir();
    tokio::fs::create_dir_all(&config_dir).await?;

    let config_path = config_dir.join("config.toml");
    if config_path.exists() {
        warn!("Config already exists at {}", config_path.display());
    } else {
        let default_config = include_str!("../../../config/default.toml");
        tokio::fs::write(&config_path, default_config).await?;
        info!("Created default config at {}", config_path.display());
    }

    println!("MedGen initialized at {}", config_dir.display());
    println!(
        "Edit {} to configure Ollama and the product search API key.",
        config_path.display()
    );
    Ok(())
}

async fn cmd_config(config_path: &Option<PathBuf>) -> Result<()> {
    let cfg = MedgenConfig::load(config_path)?;
    println!("{}", toml::to_string_pretty(&cfg)?);
    Ok(())
}

/// Wire the orchestrator, scheduler and dispatcher from config
fn build_runtime(
    cfg: &MedgenConfig,
) -> (AgentOrchestrator, Dispatcher, Arc<ReminderScheduler>) {
    let ollama = OllamaClient::new(cfg.ollama.base_url.clone(), cfg.ollama.model.clone())
        .with_max_tokens(cfg.ollama.max_tokens);

    let orchestrator = AgentOrchestrator::new(ollama, AgentRegistry::default())
        .with_classifier_config(ClassifierConfig {
            use_llm: cfg.classifier.use_llm,
            enabled: true,
        });

    let scheduler = Arc::new(ReminderScheduler::with_config(
        Arc::new(ConsoleSink),
        SchedulerConfig {
            poll_interval: Duration::from_secs(cfg.scheduler.poll_interval_secs),
        },
    ));

    let lookup =
        ProductLookupClient::with_host(cfg.lookup.api_key.clone(), cfg.lookup.host.clone());

    let mut dispatcher = Dispatcher::new(scheduler.clone(), lookup);
    if cfg.lookup.api_key.is_empty() {
        warn!("Lookup API key not set - product lookup disabled");
        dispatcher = dispatcher.with_policy(
            DispatchPolicy::default().with_product_trigger(Box::new(|_| false)),
        );
    }

    (orchestrator, dispatcher, scheduler)
}

/// Chunk callback for streaming display of agent replies
fn print_chunk(chunk: &str) {
    print!("{}", chunk);
    let _ = std::io::stdout().flush();
}

async fn cmd_chat(config_path: &Option<PathBuf>) -> Result<()> {
    let cfg = MedgenConfig::load(config_path)?;
    let (orchestrator, dispatcher, scheduler) = build_runtime(&cfg);

    let context = SessionContext::new(cfg.agent.user.clone());
    let mut session =
        ConversationSession::new(context).with_context_turns(cfg.agent.context_turns);
    // Appended only from this loop; process exit is the other termination path
    let mut active_reminders: Vec<ReminderHandle> = Vec::new();

    println!("Welcome to MedGen! (Type 'exit' to quit)");
    println!("You can ask about:");
    println!("1. Healthcare and home remedies");
    println!("2. Products related to the discussion");
    println!("3. Setting a reminder for your medicine intake");
    println!("{}", "-".repeat(50));

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("\nYou: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let user_message = line.trim().to_string();
        if user_message.is_empty() {
            continue;
        }

        if user_message.eq_ignore_ascii_case("exit") {
            println!("\nGoodbye!");
            print!("{}", session.render_transcript());
            scheduler.stop_all().await;
            break;
        }

        session.record(Sender::User, user_message.clone());
        let enriched = session.enrich(&user_message);

        print!("\nAssistant: ");
        std::io::stdout().flush()?;

        let on_chunk: &(dyn Fn(&str) + Send + Sync) = &print_chunk;
        let reply = match orchestrator
            .orchestrate(session.session_id(), &enriched, Some(on_chunk))
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                eprintln!("\nError: {:#}", e);
                continue;
            }
        };
        println!();

        for outcome in dispatcher.dispatch(&reply).await {
            render_outcome(outcome, &mut active_reminders);
        }

        session.record(Sender::Agent, reply.text);
    }

    Ok(())
}

async fn cmd_ask(config_path: &Option<PathBuf>, message: &str) -> Result<()> {
    let cfg = MedgenConfig::load(config_path)?;
    let (orchestrator, dispatcher, _scheduler) = build_runtime(&cfg);

    let context = SessionContext::new(cfg.agent.user.clone());
    let reply = orchestrator
        .orchestrate(&context.session_id, message, None)
        .await?;

    println!("{}: {}", reply.agent_name, reply.text);

    let mut active_reminders = Vec::new();
    for outcome in dispatcher.dispatch(&reply).await {
        if matches!(outcome, DispatchOutcome::ReminderSet(_)) {
            println!("\nNote: reminders only persist for the duration of an interactive chat session.");
        }
        render_outcome(outcome, &mut active_reminders);
    }

    Ok(())
}

fn render_outcome(outcome: DispatchOutcome, active_reminders: &mut Vec<ReminderHandle>) {
    match outcome {
        DispatchOutcome::ReminderSet(handle) => {
            println!(
                "\nReminder has been set successfully ({})! You can continue with your next query.",
                handle.description()
            );
            active_reminders.push(handle);
        }
        DispatchOutcome::ReminderFailed(e) => {
            println!("\nFailed to set reminder ({}). Please try again.", e);
        }
        DispatchOutcome::ProductResults { candidate, results } => {
            println!("\nSearching for: {}", candidate);
            if results.is_empty() {
                println!("No results found for {}", candidate);
            } else {
                println!("{}", format_results(&results));
            }
        }
        DispatchOutcome::ProductLookupFailed { candidate, error } => {
            println!("\nError searching for {}: {}", candidate, error);
        }
    }
}
