//! Command-line interface for braindump.
//!
//! Provides commands for recording and transcribing brain dumps,
//! browsing and editing the persisted history, and managing the
//! account.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::capture::{clip_from_file, AudioClip, MicrophoneSource, RecordingSession, Tick};
use crate::config;
use crate::core::{TaskExtractionPipeline, TranscriptionPipeline};
use crate::providers::OpenAiClient;
use crate::store::{FileStore, KeyValueStore};

pub mod account;
pub mod tasks;

/// braindump - record, transcribe, and turn speech into tasks
#[derive(Parser, Debug)]
#[command(name = "braindump")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record a brain dump and transcribe it
    Record {
        /// Use the quick ceiling (10s by default) instead of the full one
        #[arg(long)]
        quick: bool,

        /// Override the recording ceiling in seconds
        #[arg(short, long)]
        limit_secs: Option<u32>,

        /// Input device name (see `braindump devices`)
        #[arg(short, long)]
        device: Option<String>,

        /// Also extract tasks from the transcript
        #[arg(short, long)]
        tasks: bool,
    },

    /// Transcribe an existing audio file
    Transcribe {
        /// Audio file (wav, m4a, mp3, ogg)
        file: PathBuf,

        /// Also extract tasks from the transcript
        #[arg(short, long)]
        tasks: bool,
    },

    /// Browse and clear saved transcripts
    Transcripts {
        #[command(subcommand)]
        command: TranscriptCommands,
    },

    /// Browse and edit saved tasks
    Tasks {
        #[command(subcommand)]
        command: tasks::TaskCommands,
    },

    /// Manage the account
    Account {
        #[command(subcommand)]
        command: account::AccountCommands,
    },

    /// List audio input devices
    Devices,

    /// Show resolved configuration
    Config,
}

#[derive(Subcommand, Debug)]
pub enum TranscriptCommands {
    /// List saved transcripts, most recent first
    List {
        /// Maximum number of transcripts to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Delete all saved transcripts (tasks are untouched)
    Clear,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Record {
                quick,
                limit_secs,
                device,
                tasks,
            } => execute_record(quick, limit_secs, device, tasks).await,
            Commands::Transcribe { file, tasks } => execute_transcribe(&file, tasks).await,
            Commands::Transcripts { command } => match command {
                TranscriptCommands::List { limit } => execute_transcripts_list(limit).await,
                TranscriptCommands::Clear => execute_transcripts_clear().await,
            },
            Commands::Tasks { command } => tasks::execute(command).await,
            Commands::Account { command } => account::execute(command).await,
            Commands::Devices => execute_devices(),
            Commands::Config => execute_config(),
        }
    }
}

/// Open the persistent store at the configured location
pub(crate) async fn open_store() -> Result<Arc<dyn KeyValueStore>> {
    let dir = config::store_dir()?;
    let store = FileStore::open(&dir)
        .await
        .with_context(|| format!("Failed to open store at {}", dir.display()))?;
    Ok(Arc::new(store))
}

/// Build the OpenAI client, failing early when no key is configured
pub(crate) fn openai_client() -> Result<Arc<OpenAiClient>> {
    let cfg = config::config()?;
    if cfg.openai.api_key.is_empty() {
        anyhow::bail!(
            "OPENAI_API_KEY is not set (export it or add openai.api_key to .braindump/config.yaml)"
        );
    }
    Ok(Arc::new(OpenAiClient::new(&cfg.openai)))
}

/// Record until the countdown expires or Ctrl-C, then run the pipeline
async fn execute_record(
    quick: bool,
    limit_secs: Option<u32>,
    device: Option<String>,
    with_tasks: bool,
) -> Result<()> {
    let cfg = config::config()?;
    let limit = limit_secs.unwrap_or(if quick {
        cfg.recording.quick_limit_secs
    } else {
        cfg.recording.limit_secs
    });

    let source = MicrophoneSource::new(device.as_deref())?;
    let mut session = RecordingSession::new(Box::new(source), limit, cfg.recordings_dir());
    session.start()?;

    println!("Recording ({}s limit) - press Ctrl-C to stop early", limit);

    let mut interval = tokio::time::interval(Duration::from_secs(1));
    interval.tick().await; // first tick completes immediately

    let clip = loop {
        tokio::select! {
            _ = interval.tick() => {
                match session.tick()? {
                    Tick::Running { remaining_secs } => {
                        print!("\r  {:>3}s left ", remaining_secs);
                        std::io::stdout().flush().ok();
                    }
                    Tick::Finished(clip) => {
                        println!("\rTime limit reached");
                        break clip;
                    }
                    Tick::Idle => continue,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                match session.stop()? {
                    Some(clip) => break clip,
                    None => anyhow::bail!("No active recording to stop"),
                }
            }
        }
    };

    println!("Saved recording: {}", clip.path.display());
    transcribe_and_report(&clip, with_tasks).await
}

/// Transcribe an audio file that already exists on disk
async fn execute_transcribe(file: &Path, with_tasks: bool) -> Result<()> {
    let clip = clip_from_file(file)?;
    transcribe_and_report(&clip, with_tasks).await
}

/// Run transcription (and optionally extraction) for one clip
async fn transcribe_and_report(clip: &AudioClip, with_tasks: bool) -> Result<()> {
    let store = open_store().await?;
    let client = openai_client()?;

    let transcription = TranscriptionPipeline::new(client.clone(), store.clone());
    println!("Transcribing...");
    let transcript = transcription.run(clip).await?;

    println!();
    println!("Transcript ({})", transcript.timestamp.format("%Y-%m-%d %H:%M:%S"));
    println!("══════════════════════════════════════════════════════════════");
    println!("{}", transcript.text);

    if with_tasks {
        let extraction = TaskExtractionPipeline::new(client, store);
        println!();
        println!("Extracting tasks...");
        let batch = extraction.run(&transcript.text).await?;

        if batch.is_empty() {
            println!("No actionable tasks found");
        } else {
            for task in &batch {
                println!("  [ ] {} - {}", task.title, task.description);
            }
        }
    }

    Ok(())
}

/// List saved transcripts
async fn execute_transcripts_list(limit: usize) -> Result<()> {
    let store = open_store().await?;
    let history = crate::core::HistoryStore::new(store);
    let transcripts = history.list_transcripts().await?;

    if transcripts.is_empty() {
        println!("No transcripts saved yet");
        return Ok(());
    }

    println!();
    println!("Saved Transcripts ({} total)", transcripts.len());
    println!("══════════════════════════════════════════════════════════════");
    for transcript in transcripts.iter().take(limit) {
        println!();
        println!("[{}]", transcript.timestamp.format("%Y-%m-%d %H:%M:%S"));
        println!("{}", transcript.text);
    }

    Ok(())
}

/// Clear all saved transcripts
async fn execute_transcripts_clear() -> Result<()> {
    let store = open_store().await?;
    let history = crate::core::HistoryStore::new(store);
    history
        .clear_transcripts()
        .await
        .context("Failed to clear transcripts")?;

    println!("All transcripts cleared");
    Ok(())
}

/// List input devices
fn execute_devices() -> Result<()> {
    let devices = MicrophoneSource::list_devices()?;

    if devices.is_empty() {
        println!("No audio input devices found");
        return Ok(());
    }

    println!("Audio input devices:");
    for name in devices {
        println!("  {}", name);
    }

    Ok(())
}

/// Show resolved configuration (secrets redacted)
fn execute_config() -> Result<()> {
    let cfg = config::config()?;

    println!("Braindump Configuration");
    println!("══════════════════════════════════════════════════════════════");
    println!("Home:            {}", cfg.home.display());
    println!("Store:           {}", cfg.store_dir().display());
    println!("Recordings:      {}", cfg.recordings_dir().display());
    match &cfg.config_file {
        Some(path) => println!("Config file:     {}", path.display()),
        None => println!("Config file:     (none found)"),
    }
    println!();
    println!("OpenAI base:     {}", cfg.openai.api_base);
    println!(
        "OpenAI key:      {}",
        if cfg.openai.api_key.is_empty() { "(not set)" } else { "(set)" }
    );
    println!("Transcription:   {}", cfg.openai.transcription_model);
    println!("Tasks model:     {}", cfg.openai.tasks_model);
    println!();
    println!(
        "Supabase url:    {}",
        if cfg.supabase.url.is_empty() { "(not set)" } else { &cfg.supabase.url }
    );
    println!(
        "Supabase key:    {}",
        if cfg.supabase.anon_key.is_empty() { "(not set)" } else { "(set)" }
    );
    println!();
    println!("Record limit:    {}s", cfg.recording.limit_secs);
    println!("Quick limit:     {}s", cfg.recording.quick_limit_secs);

    Ok(())
}
