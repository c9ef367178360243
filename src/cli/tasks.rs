//! Task CLI commands.
//!
//! Commands for browsing and editing the saved task collection:
//! - `braindump tasks list` / `search <query>`
//! - `braindump tasks toggle <index>` / `edit <index>` / `delete <index>`
//! - `braindump tasks extract <text>` / `extract --file notes.txt`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;

use crate::core::{HistoryStore, TaskExtractionPipeline};
use crate::domain::Task;

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// List all saved tasks
    List,

    /// Search tasks by title or description (case-insensitive)
    Search {
        query: String,
    },

    /// Toggle a task's completion
    Toggle {
        /// Task index as shown by `tasks list`
        index: usize,
    },

    /// Edit a task's title and/or description
    Edit {
        /// Task index as shown by `tasks list`
        index: usize,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a task
    Delete {
        /// Task index as shown by `tasks list`
        index: usize,
    },

    /// Derive tasks from text instead of a recording
    Extract {
        /// Text to transform into tasks
        text: Option<String>,

        /// Read the text from a file instead
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,
    },
}

/// Execute a task command
pub async fn execute(command: TaskCommands) -> Result<()> {
    match command {
        TaskCommands::List => execute_list().await,
        TaskCommands::Search { query } => execute_search(&query).await,
        TaskCommands::Toggle { index } => execute_toggle(index).await,
        TaskCommands::Edit {
            index,
            title,
            description,
        } => execute_edit(index, title, description).await,
        TaskCommands::Delete { index } => execute_delete(index).await,
        TaskCommands::Extract { text, file } => execute_extract(text, file).await,
    }
}

fn print_task(index: usize, task: &Task) {
    let check = if task.completed { "x" } else { " " };
    println!("  {:>3} [{}] {} - {}", index, check, task.title, task.description);
}

async fn history() -> Result<HistoryStore> {
    Ok(HistoryStore::new(super::open_store().await?))
}

async fn execute_list() -> Result<()> {
    let tasks = history().await?.list_tasks().await?;

    if tasks.is_empty() {
        println!("No tasks saved yet");
        return Ok(());
    }

    println!();
    println!("Tasks ({} total)", tasks.len());
    println!("══════════════════════════════════════════════════════════════");
    for (index, task) in tasks.iter().enumerate() {
        print_task(index, task);
    }

    Ok(())
}

async fn execute_search(query: &str) -> Result<()> {
    let matches = history().await?.search_tasks(query).await?;

    if matches.is_empty() {
        println!("No tasks matching '{}'", query);
        return Ok(());
    }

    for (index, task) in matches.iter().enumerate() {
        print_task(index, task);
    }

    Ok(())
}

async fn execute_toggle(index: usize) -> Result<()> {
    let task = history().await?.toggle_task(index).await?;

    let state = if task.completed { "done" } else { "open" };
    println!("Task '{}' is now {}", task.title, state);
    Ok(())
}

async fn execute_edit(
    index: usize,
    title: Option<String>,
    description: Option<String>,
) -> Result<()> {
    if title.is_none() && description.is_none() {
        anyhow::bail!("Nothing to change. Pass --title and/or --description");
    }

    let history = history().await?;

    // Fill the unchanged field from the current task
    let tasks = history.list_tasks().await?;
    let current = tasks
        .get(index)
        .with_context(|| format!("No task at index {}", index))?;

    let title = title.unwrap_or_else(|| current.title.clone());
    let description = description.unwrap_or_else(|| current.description.clone());

    let task = history.update_task(index, title, description).await?;
    println!("Updated: {} - {}", task.title, task.description);
    Ok(())
}

async fn execute_delete(index: usize) -> Result<()> {
    let task = history().await?.delete_task(index).await?;

    println!("Deleted task '{}'", task.title);
    Ok(())
}

async fn execute_extract(text: Option<String>, file: Option<PathBuf>) -> Result<()> {
    let text = match (text, file) {
        (Some(text), None) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        _ => anyhow::bail!("Provide the text inline or via --file"),
    };

    if text.trim().is_empty() {
        anyhow::bail!("Input text is empty");
    }

    let store = super::open_store().await?;
    let client = super::openai_client()?;
    let pipeline = TaskExtractionPipeline::new(client, store);

    println!("Extracting tasks...");
    let batch = pipeline.run(&text).await?;

    if batch.is_empty() {
        println!("No actionable tasks found");
        return Ok(());
    }

    println!("Saved {} task(s):", batch.len());
    for (index, task) in batch.iter().enumerate() {
        print_task(index, task);
    }

    Ok(())
}
