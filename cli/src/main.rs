use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use sandbox::SandboxCore;
use sandbox::export::{EXPORT_FILE_NAME, export_document};
use serde_json::{Value, json};
use studio::config::ConfigError;
use studio::net::{ApiError, HttpClient};
use studio::services::generation::NoticeLevel;
use studio::{GenerationError, GenerationOutcome, Orchestrator, StudioConfig, StudioEvent};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid API URL: {0}")]
    InvalidApiUrl(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error("another generation is already running for this session")]
    Rejected,
    #[error("version {0} has no code yet")]
    NoArtifact(String),
    #[error("writing {} failed: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "studio-cli", about = "Prompt-to-UI studio: generate, version, and export web artifacts")]
struct Cli {
    /// Collaborator base URL. Overrides the studio configuration.
    #[arg(long, env = "STUDIO_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Project(ProjectCommand),
    /// Send a prompt to an existing project version.
    Generate {
        #[command(flatten)]
        session: SessionArgs,
        prompt: String,
        /// Also export the resulting artifact to this file.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    Version(VersionCommand),
}

#[derive(Args, Debug)]
struct ProjectCommand {
    #[command(subcommand)]
    command: ProjectSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProjectSubcommand {
    /// Create a project from a prompt and generate its first version.
    Create {
        prompt: String,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct VersionCommand {
    #[command(subcommand)]
    command: VersionSubcommand,
}

#[derive(Subcommand, Debug)]
enum VersionSubcommand {
    List {
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Print the version's markup as the preview renders it.
    Show {
        #[command(flatten)]
        session: SessionArgs,
    },
    Delete {
        #[command(flatten)]
        session: SessionArgs,
        version_id: String,
    },
    /// Write the version as a standalone HTML page.
    Export {
        #[command(flatten)]
        session: SessionArgs,
        #[arg(long, default_value = EXPORT_FILE_NAME)]
        output: PathBuf,
    },
}

/// Opening a session resumes a pending placeholder version, as the studio does.
#[derive(Args, Debug, Clone)]
struct SessionArgs {
    #[arg(long, env = "STUDIO_PROJECT_ID")]
    project_id: String,
    #[arg(long, env = "STUDIO_FRAME_ID")]
    frame_id: String,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    if let Err(error) = dotenvy::dotenv() {
        if !error.not_found() {
            eprintln!("ignoring unreadable .env: {error}");
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = StudioConfig::from_env()?;
    if let Some(url) = cli.api_url.as_deref() {
        config.api_url = normalize_api_url(url)?;
    }

    let client = Arc::new(HttpClient::new(&config)?);
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let orchestrator = Orchestrator::new(client.clone(), client, config, events_tx);
    let printer = spawn_event_printer(events_rx);
    let progress = spawn_progress_logger(&orchestrator);

    let result = run(&orchestrator, cli.command).await;

    orchestrator.flush_chat().await;
    drop(orchestrator);
    for task in [printer, progress] {
        if let Err(error) = task.await {
            warn!(%error, "output task ended abnormally");
        }
    }
    result
}

async fn run(orchestrator: &Orchestrator, command: Command) -> Result<(), CliError> {
    match command {
        Command::Project(project) => match project.command {
            ProjectSubcommand::Create { prompt, output } => run_project_create(orchestrator, &prompt, output).await,
        },
        Command::Generate { session, prompt, output } => run_generate(orchestrator, &session, &prompt, output).await,
        Command::Version(version) => run_version(orchestrator, version).await,
    }
}

async fn run_project_create(orchestrator: &Orchestrator, prompt: &str, output: Option<PathBuf>) -> Result<(), CliError> {
    let (project_id, frame_id) = orchestrator.start_project(prompt).await?;
    eprintln!("created project {project_id} (version {frame_id})");
    let resumed = orchestrator.load_session(&project_id, &frame_id).await?;
    match resumed {
        Some(outcome) => report_outcome(outcome, output.as_deref()),
        None => Ok(()),
    }
}

async fn run_generate(
    orchestrator: &Orchestrator,
    session: &SessionArgs,
    prompt: &str,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    if let Some(outcome) = orchestrator.load_session(&session.project_id, &session.frame_id).await? {
        report_outcome(outcome, None)?;
    }
    let outcome = orchestrator.generate(prompt, false).await?;
    report_outcome(outcome, output.as_deref())
}

async fn run_version(orchestrator: &Orchestrator, version: VersionCommand) -> Result<(), CliError> {
    match version.command {
        VersionSubcommand::List { session } => {
            open(orchestrator, &session).await?;
            let active = orchestrator.session().await.frame_id;
            let versions = orchestrator.versions().await;
            let listing: Vec<Value> = versions
                .sorted()
                .into_iter()
                .map(|frame| {
                    json!({
                        "frameId": frame.frame_id,
                        "name": versions.display_name(frame),
                        "hasCode": frame.has_code(),
                        "active": frame.frame_id == active,
                    })
                })
                .collect();
            print_json(&Value::Array(listing))
        }
        VersionSubcommand::Show { session } => {
            open(orchestrator, &session).await?;
            let artifact = current_artifact(orchestrator, &session.frame_id).await?;
            let mut preview = SandboxCore::new();
            preview.initialize();
            preview.apply_artifact(&artifact);
            println!("{}", preview.mount_html());
            Ok(())
        }
        VersionSubcommand::Delete { session, version_id } => {
            open(orchestrator, &session).await?;
            orchestrator.delete_version(&version_id).await?;
            let active = orchestrator.session().await.frame_id;
            eprintln!("deleted version {version_id}; active version is now {}", display_id(&active));
            Ok(())
        }
        VersionSubcommand::Export { session, output } => {
            open(orchestrator, &session).await?;
            let artifact = current_artifact(orchestrator, &session.frame_id).await?;
            write_export(&artifact, &output)
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn open(orchestrator: &Orchestrator, session: &SessionArgs) -> Result<(), CliError> {
    if let Some(outcome) = orchestrator.load_session(&session.project_id, &session.frame_id).await? {
        report_outcome(outcome, None)?;
    }
    Ok(())
}

async fn current_artifact(orchestrator: &Orchestrator, frame_id: &str) -> Result<String, CliError> {
    orchestrator
        .current_artifact()
        .await
        .filter(|code| !code.trim().is_empty())
        .ok_or_else(|| CliError::NoArtifact(frame_id.to_owned()))
}

fn report_outcome(outcome: GenerationOutcome, output: Option<&Path>) -> Result<(), CliError> {
    match outcome {
        GenerationOutcome::Rejected => Err(CliError::Rejected),
        GenerationOutcome::Code { frame_id, artifact, upgraded } => {
            let verb = if upgraded { "completed" } else { "created" };
            eprintln!("{verb} version {frame_id} ({} bytes)", artifact.len());
            match output {
                Some(path) => write_export(&artifact, path),
                None => {
                    println!("{artifact}");
                    Ok(())
                }
            }
        }
        GenerationOutcome::Conversation { text } => {
            println!("{text}");
            Ok(())
        }
    }
}

fn write_export(artifact: &str, path: &Path) -> Result<(), CliError> {
    std::fs::write(path, export_document(artifact)).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    eprintln!("exported {}", path.display());
    Ok(())
}

fn spawn_event_printer(mut events: mpsc::UnboundedReceiver<StudioEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                StudioEvent::Notice { level: NoticeLevel::Success, text } => eprintln!("{text}"),
                StudioEvent::Notice { level: NoticeLevel::Error, text } => eprintln!("error: {text}"),
                other => debug!(event = ?other, "studio event"),
            }
        }
    })
}

fn spawn_progress_logger(orchestrator: &Orchestrator) -> JoinHandle<()> {
    let mut artifacts = orchestrator.subscribe();
    tokio::spawn(async move {
        while artifacts.changed().await.is_ok() {
            let bytes = artifacts.borrow_and_update().len();
            debug!(bytes, "preview updated");
        }
    })
}

fn normalize_api_url(raw: &str) -> Result<String, CliError> {
    let url = raw.trim().trim_end_matches('/');
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url.to_owned())
    } else {
        Err(CliError::InvalidApiUrl(raw.to_owned()))
    }
}

fn display_id(frame_id: &str) -> &str {
    if frame_id.is_empty() { "(none)" } else { frame_id }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
