use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use scorm_core::import_package;
use scorm_player::{HeadlessHost, Player, ViewerConfig};
use scorm_store::{CourseStore, DiskBackend};
use tracing_subscriber::{EnvFilter, fmt};

const CONFIG_FILE: &str = "scorm.toml";

#[derive(Parser)]
#[command(name = "scorm", about = "SCORM course player: import, inspect and play course packages")]
struct Cli {
    /// Path to a scorm.toml config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import a course archive (.zip)
    Import {
        /// Path to the archive
        archive: PathBuf,
    },
    /// List imported courses
    List,
    /// Show a course's record and stored runtime data
    Show { course_id: String },
    /// Delete a course with its files and runtime data
    Delete { course_id: String },
    /// Prepare a course for playback and run a headless session
    Launch {
        course_id: String,

        /// Write the prepared entry document to this file
        #[arg(long)]
        out: Option<PathBuf>,

        /// Data element to set during the session, as KEY=VALUE
        #[arg(long = "set", value_parser = parse_assignment)]
        assignments: Vec<(String, String)>,
    },
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got `{s}`")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries command output
    fmt()
        .with_env_filter(EnvFilter::from_env("SCORM_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let store = config
        .build_store()
        .await
        .context("Failed to open course store")?;

    match cli.command {
        Command::Import { archive } => import(&store, &archive).await,
        Command::List => list(&store).await,
        Command::Show { course_id } => show(&store, &course_id).await,
        Command::Delete { course_id } => delete(&store, &course_id).await,
        Command::Launch {
            course_id,
            out,
            assignments,
        } => launch(store, &config, &course_id, out.as_deref(), &assignments).await,
    }
}

/// An explicit `--config` must exist; otherwise `~/.scorm-player/scorm.toml`
/// is used when present, else built-in defaults.
fn load_config(explicit: Option<&Path>) -> Result<ViewerConfig> {
    if let Some(path) = explicit {
        return ViewerConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }

    let default_path = DiskBackend::default_path().join(CONFIG_FILE);
    if default_path.is_file() {
        tracing::debug!(path = %default_path.display(), "Using default config");
        return ViewerConfig::from_file(&default_path)
            .with_context(|| format!("Failed to load config {}", default_path.display()));
    }
    Ok(ViewerConfig::default())
}

async fn import(store: &CourseStore, archive: &Path) -> Result<()> {
    let bytes = tokio::fs::read(archive)
        .await
        .with_context(|| format!("Failed to read {}", archive.display()))?;
    let file_name = archive
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let package = import_package(&bytes, &file_name)
        .with_context(|| format!("Failed to import {}", archive.display()))?;
    store.save(&package.record, &package.files).await?;

    if package.record.entry_path.is_none() {
        eprintln!("Warning: no launchable document found; the course cannot be played.");
    }
    println!("{}", package.record.id);
    Ok(())
}

async fn list(store: &CourseStore) -> Result<()> {
    let courses = store.list().await?;
    if courses.is_empty() {
        eprintln!("No courses imported.");
        return Ok(());
    }
    for course in courses {
        println!(
            "{}\t{}\t{}\t{}",
            course.id, course.progress.status, course.progress.total_time, course.title
        );
    }
    Ok(())
}

async fn show(store: &CourseStore, course_id: &str) -> Result<()> {
    let Some(record) = store.record(course_id).await? else {
        bail!("course not found: {course_id}");
    };
    let runtime_data = store.runtime_data(course_id).await?;
    let view = serde_json::json!({
        "course": record,
        "runtime_data": runtime_data,
    });
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

async fn delete(store: &CourseStore, course_id: &str) -> Result<()> {
    if !store.delete(course_id).await? {
        bail!("course not found: {course_id}");
    }
    eprintln!("Deleted {course_id}");
    Ok(())
}

async fn launch(
    store: CourseStore,
    config: &ViewerConfig,
    course_id: &str,
    out: Option<&Path>,
    assignments: &[(String, String)],
) -> Result<()> {
    let host = Arc::new(HeadlessHost::new());
    let mut player = Player::new(store, host.clone(), config.learner.clone());
    let shim = player.load(course_id).await?;

    if let Some(document) = host.document() {
        eprintln!(
            "Prepared {} ({} references rewritten, sandbox: {})",
            document.entry_path, document.rewritten, document.sandbox
        );
        if let Some(out) = out {
            tokio::fs::write(out, &document.html)
                .await
                .with_context(|| format!("Failed to write {}", out.display()))?;
            eprintln!("Wrote entry document to {}", out.display());
        }
    }

    if !assignments.is_empty() {
        shim.initialize().await;
        for (key, value) in assignments {
            shim.set_value(key, value).await;
        }
        if shim.finish().await != "true" {
            bail!("failed to commit session data for {course_id}");
        }
    }

    if let Some(progress) = player.stop().await? {
        println!("status: {}", progress.status);
        if let Some(raw) = progress.score.raw {
            println!("score: {raw}");
        }
        println!("total time: {}", progress.total_time);
    }
    Ok(())
}
