use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use mailsorter::config::{default_settings_path, JsonFileStore, Settings, SettingsStore};
use mailsorter::db::Database;
use mailsorter::email::{FolderNode, ImapMailHost, MailHost, MessageTracker};
use mailsorter::folder::serialize;
use mailsorter::logging::{init_logging, LogFormat, DEFAULT_FILTER};
use mailsorter::pipeline::BatchRunner;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Command,

    /// Path to the settings document
    #[clap(long, env = "MAILSORTER_SETTINGS")]
    settings: Option<PathBuf>,

    /// Path to the state database
    #[clap(long, env = "MAILSORTER_DATABASE")]
    database: Option<PathBuf>,

    /// Log output format: text or json
    #[clap(long, default_value = "text")]
    log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify and move every new message of the source folders
    Run,

    /// Print the folder token of every folder of every account
    Folders,

    /// Ask the model for importance, urgency and actions of one message
    Analyze { message_id: String },

    /// Ask the model for a short summary of one message
    Summarize { message_id: String },

    /// Show or edit the processed message set
    Processed {
        /// Remove one message id so the next run picks it up again
        #[clap(long, conflicts_with = "reset")]
        forget: Option<String>,

        /// Remove every message id
        #[clap(long)]
        reset: bool,
    },

    /// Show the latest runs
    History {
        #[clap(long, default_value_t = 20)]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.log_format, DEFAULT_FILTER).context("failed to set up logging")?;

    match &args.command {
        Command::Run => run(&args).await,
        Command::Folders => folders(&args).await.map(|_| ExitCode::SUCCESS),
        Command::Analyze { message_id } => {
            let answer = assist(&args, message_id, true).await?;
            println!("{}", answer);
            Ok(ExitCode::SUCCESS)
        }
        Command::Summarize { message_id } => {
            let answer = assist(&args, message_id, false).await?;
            println!("{}", answer);
            Ok(ExitCode::SUCCESS)
        }
        Command::Processed { forget, reset } => {
            processed(&args, forget.as_deref(), *reset).map(|_| ExitCode::SUCCESS)
        }
        Command::History { limit } => history(&args, *limit).map(|_| ExitCode::SUCCESS),
    }
}

fn settings_store(args: &Args) -> Result<JsonFileStore> {
    let path = match &args.settings {
        Some(path) => path.clone(),
        None => default_settings_path().context("could not determine home directory")?,
    };
    Ok(JsonFileStore::new(path))
}

fn load_settings(args: &Args) -> Result<Settings> {
    let store = settings_store(args)?;
    store
        .load()
        .with_context(|| format!("failed to load settings from {}", store.path().display()))
}

fn tracker(args: &Args) -> Result<MessageTracker> {
    let db = match &args.database {
        Some(path) => Database::open(path)
            .with_context(|| format!("failed to open database {}", path.display()))?,
        None => Database::open_default().context("failed to open the default database")?,
    };
    Ok(MessageTracker::new(db))
}

async fn run(args: &Args) -> Result<ExitCode> {
    let settings = load_settings(args)?;
    let tracker = tracker(args)?;
    let host = Arc::new(ImapMailHost::new(settings.accounts.clone()));

    let runner = BatchRunner::from_settings(settings, host.clone(), tracker)
        .context("failed to set up model backend")?;
    let result = runner.run().await;
    host.disconnect_all().await;
    let report = result.context("batch run failed")?;

    println!("{}", serde_json::to_string_pretty(&report.outcome)?);
    for error in &report.errors {
        eprintln!("- {}", error);
    }

    Ok(if report.outcome.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

async fn folders(args: &Args) -> Result<()> {
    let settings = load_settings(args)?;
    let host = ImapMailHost::new(settings.accounts.clone());

    let result = async {
        for account in host.list_accounts().await? {
            println!("{}", account.name);
            let tree = host.folder_tree(&account).await?;
            print_tree(&account.id, &tree, 1);
        }
        Ok::<_, mailsorter::email::EmailError>(())
    }
    .await;

    host.disconnect_all().await;
    result.context("failed to list folders")
}

fn print_tree(account_id: &str, nodes: &[FolderNode], depth: usize) {
    for node in nodes {
        println!("{}{}", "  ".repeat(depth), serialize(account_id, &node.path));
        print_tree(account_id, &node.sub_folders, depth + 1);
    }
}

async fn assist(args: &Args, message_id: &str, analyze: bool) -> Result<String> {
    let settings = load_settings(args)?;
    let backend = mailsorter::backend_from_settings(&settings)?;
    let host = ImapMailHost::new(settings.accounts.clone());

    let result = if analyze {
        mailsorter::analyze_message(&host, backend.as_ref(), message_id).await
    } else {
        mailsorter::summarize_message(&host, backend.as_ref(), message_id).await
    };
    host.disconnect_all().await;
    Ok(result?)
}

fn processed(args: &Args, forget: Option<&str>, reset: bool) -> Result<()> {
    let tracker = tracker(args)?;

    if let Some(id) = forget {
        if tracker.forget(id)? {
            println!("Forgot {}", id);
        } else {
            println!("{} was not in the processed set", id);
        }
        return Ok(());
    }

    if reset {
        let removed = tracker.reset()?;
        println!("Removed {} processed message ids", removed);
        return Ok(());
    }

    let stats = tracker.stats()?;
    println!(
        "{} processed messages, last at {}",
        stats.total_processed,
        stats.last_processed_at.as_deref().unwrap_or("-")
    );
    for row in tracker.recent(20)? {
        println!(
            "{}  {}  {} -> {}",
            row.processed_at,
            row.id,
            row.subject.as_deref().unwrap_or(""),
            row.target_folder.as_deref().unwrap_or("?")
        );
    }
    Ok(())
}

fn history(args: &Args, limit: u32) -> Result<()> {
    for run in tracker(args)?.recent_runs(limit)? {
        println!(
            "{}  {}  processed={} errors={} {}",
            run.started_at,
            run.id,
            run.processed_count,
            run.error_count,
            if run.success { "ok" } else { "failed" }
        );
    }
    Ok(())
}
