//! Construct CLI — one-shot commands driving the reply engine.
//!
//! Transport, debouncing, and scheduling live outside this binary; each
//! `reply` run is exactly one pipeline invocation over the stored
//! conversation state.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use construct::config::{config_path, load_config, runtime_paths, Config, RuntimePaths};
use construct::credentials::load_credentials;
use construct::engine::chainlog::{ChainSink, ConsoleChainSink, FileChainSink};
use construct::engine::context::ContextAssembler;
use construct::engine::pipeline::ReplyPipeline;
use construct::engine::prompts::PromptSet;
use construct::engine::ReplyOutcome;
use construct::providers::router::ModelRouter;
use construct::providers::vision::{describe_images, ImageInput};
use construct::store::history::SqliteHistoryStore;
use construct::store::profile::SqliteStyleStore;

#[derive(Parser)]
#[command(name = "construct", about = "Ghostwrites chat replies in a real person's texting voice")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a reply to an incoming message.
    Reply {
        /// Counterpart identifier (phone number, handle, ...).
        #[arg(long)]
        counterpart: String,
        /// Display name of the counterpart. Defaults to the identifier.
        #[arg(long)]
        counterpart_name: Option<String>,
        /// The incoming message text. Rapid-fire messages can be joined
        /// with newlines by the caller.
        #[arg(long)]
        text: String,
        /// Attached image files, described via the vision model.
        #[arg(long)]
        image: Vec<PathBuf>,
        /// Run the pipeline without persisting the exchange to history.
        #[arg(long)]
        dry_run: bool,
    },
    /// Inspect or seed the conversation history.
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },
    /// Manage style profiles.
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },
    /// Manage relationship Q&A notes.
    Notes {
        #[command(subcommand)]
        command: NotesCommand,
    },
}

#[derive(Subcommand)]
enum HistoryCommand {
    /// Append one message to a conversation.
    Add {
        /// Counterpart identifier.
        #[arg(long)]
        counterpart: String,
        /// Who sent the message.
        #[arg(long)]
        speaker: String,
        /// The message text.
        #[arg(long)]
        text: String,
        /// Tag the line as machine-generated.
        #[arg(long)]
        generated: bool,
    },
    /// Print recent messages for a conversation.
    List {
        /// Counterpart identifier.
        #[arg(long)]
        counterpart: String,
        /// Maximum lines to print.
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
}

#[derive(Subcommand)]
enum ProfileCommand {
    /// Store a style document from a file.
    Set {
        /// Counterpart identifier.
        #[arg(long)]
        counterpart: String,
        /// Path to the style document.
        #[arg(long)]
        file: PathBuf,
    },
    /// Print the stored style document.
    Show {
        /// Counterpart identifier.
        #[arg(long)]
        counterpart: String,
    },
}

#[derive(Subcommand)]
enum NotesCommand {
    /// Store relationship notes.
    Set {
        /// Counterpart identifier.
        #[arg(long)]
        counterpart: String,
        /// The notes text.
        #[arg(long)]
        text: String,
    },
    /// Print the stored notes.
    Show {
        /// Counterpart identifier.
        #[arg(long)]
        counterpart: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(&config_path()?).context("failed to load configuration")?;
    let paths = runtime_paths(&config.storage)?;

    // The reply path is the operational one — it gets the rotated JSON log
    // alongside the console. Everything else is a one-shot admin command.
    let _guard = match cli.command {
        Command::Reply { .. } => Some(construct::logging::init_production(&paths.logs_dir)?),
        _ => {
            construct::logging::init_cli();
            None
        }
    };

    match cli.command {
        Command::Reply {
            counterpart,
            counterpart_name,
            text,
            image,
            dry_run,
        } => {
            run_reply(
                &config,
                &paths,
                &counterpart,
                counterpart_name.as_deref(),
                &text,
                &image,
                dry_run,
            )
            .await
        }
        Command::History { command } => run_history(&paths, command).await,
        Command::Profile { command } => run_profile(&paths, command).await,
        Command::Notes { command } => run_notes(&paths, command).await,
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_reply(
    config: &Config,
    paths: &RuntimePaths,
    counterpart: &str,
    counterpart_name: Option<&str>,
    text: &str,
    images: &[PathBuf],
    dry_run: bool,
) -> Result<()> {
    let credentials = load_credentials(&paths.env_file)?;
    let router = Arc::new(
        ModelRouter::from_config(&config.models, &credentials)
            .context("failed to build model router")?,
    );

    let pool = construct::store::open(&paths.db_file).await?;
    let history = Arc::new(SqliteHistoryStore::new(pool.clone()));
    let style = Arc::new(SqliteStyleStore::new(pool));

    let prompts = PromptSet::default();
    let policy = config.reply.to_policy();

    // Describe attachments up front; the pipeline itself never sees bytes.
    let image_descriptions = if images.is_empty() {
        Vec::new()
    } else {
        let provider = router
            .resolve(Some("describe"))
            .context("no provider available for image description")?;
        let inputs = images
            .iter()
            .map(|p| ImageInput::from_path(p))
            .collect::<Result<Vec<_>>>()?;
        describe_images(provider.as_ref(), &prompts.describe, &inputs)
            .await
            .context("image description failed")?
    };

    let assembler = ContextAssembler::new(history.clone(), style, policy.clone());
    let pipeline = ReplyPipeline::new(Arc::clone(&router), assembler, prompts, policy);

    let sinks: Vec<Box<dyn ChainSink>> = vec![
        Box::new(ConsoleChainSink),
        Box::new(FileChainSink::create(&paths.chains_dir, counterpart)?),
    ];

    let counterpart_name = counterpart_name.unwrap_or(counterpart);
    let outcome = pipeline
        .respond(
            &config.subject.name,
            counterpart,
            counterpart_name,
            text,
            image_descriptions,
            sinks,
        )
        .await
        .context("reply pipeline failed")?;

    info!(outcome = outcome.label(), "invocation finished");

    match outcome {
        ReplyOutcome::Sent { text: ref reply, .. }
        | ReplyOutcome::SentUnverified { text: ref reply, .. }
        | ReplyOutcome::SentSuggestion { text: ref reply, .. } => {
            if !dry_run {
                // Record both sides so the next invocation sees this
                // exchange; the outgoing line is tagged machine-generated.
                history
                    .append(counterpart, counterpart_name, false, text)
                    .await
                    .context("failed to record incoming message")?;
                history
                    .append(counterpart, &config.subject.name, true, reply)
                    .await
                    .context("failed to record outgoing reply")?;
            }
            println!("{reply}");
        }
        ReplyOutcome::Skipped { .. } => {
            if !dry_run {
                history
                    .append(counterpart, counterpart_name, false, text)
                    .await
                    .context("failed to record incoming message")?;
            }
            println!("(no reply)");
        }
    }

    Ok(())
}

async fn run_history(paths: &RuntimePaths, command: HistoryCommand) -> Result<()> {
    let pool = construct::store::open(&paths.db_file).await?;
    let history = SqliteHistoryStore::new(pool);

    match command {
        HistoryCommand::Add {
            counterpart,
            speaker,
            text,
            generated,
        } => {
            history.append(&counterpart, &speaker, generated, &text).await?;
            println!("added");
        }
        HistoryCommand::List { counterpart, limit } => {
            let lines = history.fetch_recent(&counterpart, limit).await?;
            for line in lines {
                let tag = if line.is_generated { " [auto]" } else { "" };
                println!("[{}] {}{}: {}", line.timestamp_label, line.speaker, tag, line.text);
            }
        }
    }
    Ok(())
}

async fn run_profile(paths: &RuntimePaths, command: ProfileCommand) -> Result<()> {
    let pool = construct::store::open(&paths.db_file).await?;
    let style = SqliteStyleStore::new(pool);

    match command {
        ProfileCommand::Set { counterpart, file } => {
            let document = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            style.set_profile(&counterpart, &document).await?;
            println!("profile stored");
        }
        ProfileCommand::Show { counterpart } => match style.fetch_profile(&counterpart).await? {
            Some(document) => println!("{document}"),
            None => println!("(no profile)"),
        },
    }
    Ok(())
}

async fn run_notes(paths: &RuntimePaths, command: NotesCommand) -> Result<()> {
    let pool = construct::store::open(&paths.db_file).await?;
    let style = SqliteStyleStore::new(pool);

    match command {
        NotesCommand::Set { counterpart, text } => {
            style.set_notes(&counterpart, &text).await?;
            println!("notes stored");
        }
        NotesCommand::Show { counterpart } => match style.fetch_notes(&counterpart).await? {
            Some(notes) => println!("{notes}"),
            None => println!("(no notes)"),
        },
    }
    Ok(())
}
