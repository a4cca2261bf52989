mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

use weekly_manager::app::{Command, Session, Startup};
use weekly_manager::config::WeeklyConfig;
use weekly_manager::progress::project_progress;
use weekly_manager::storage::{DocumentFile, FsStore};
use weekly_manager::todos::{open_todos, TodoScope};
use weekly_manager::views::{open_todo_line, progress_label, project_summary, Snapshot};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "weekly_manager=info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Summary);

    if let Commands::ConfigPath = command {
        let path = WeeklyConfig::config_path()?;
        if !path.exists() {
            WeeklyConfig::default().save()?;
            eprintln!("Created default config.");
        }
        println!("{}", path.display());
        return Ok(());
    }

    let config = WeeklyConfig::load()?;
    let path = cli.file.unwrap_or_else(|| config.data_file());
    let autosave = config.autosave && !cli.no_autosave;

    let mut session = Session::new(DocumentFile::new(FsStore::new(), path), autosave);
    match session
        .start()
        .with_context(|| format!("Failed to open {}", session.path().display()))?
    {
        Startup::Loaded => {}
        Startup::Created { save_error: None } => {
            tracing::info!(path = %session.path().display(), "created new document");
        }
        Startup::Created {
            save_error: Some(e),
        } => {
            tracing::warn!("new document could not be saved yet: {e}");
        }
    }

    match command {
        Commands::Summary => print_summary(&session),
        Commands::Todos => print_todos(&session),
        Commands::Migrate => {
            session.save().context("Failed to write migrated document")?;
            println!("Migrated {}", session.path().display());
        }
        Commands::Run => {
            run_commands(&mut session)?;
            session.close().context("Failed to save on exit")?;
        }
        Commands::ConfigPath => {}
    }
    Ok(())
}

fn print_summary(session: &Session) {
    let document = session.document();
    if document.students.is_empty() {
        println!("Keine Studierenden");
        return;
    }
    for name in document.sorted_student_names() {
        let projects = &document.students[name].projects;
        println!("{}", project_summary(name, projects));
        for project in projects {
            let progress = project_progress(project, session.today());
            println!(
                "  {}: {} Weekly(s), {}",
                project.display_name(),
                project.weeklies.len(),
                progress_label(Some(project), Some(progress))
            );
        }
    }
}

fn print_todos(session: &Session) {
    let rows = open_todos(session.document(), TodoScope::Document);
    if rows.is_empty() {
        println!("Keine offenen TODOs");
    }
    for row in &rows {
        println!("{}", open_todo_line(row));
    }
}

#[derive(Serialize)]
struct Reply {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    state: Snapshot,
}

/// One JSON command per stdin line, one JSON reply per stdout line.
fn run_commands(session: &mut Session) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line.context("Failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        let outcome = serde_json::from_str::<Command>(&line)
            .map_err(|e| format!("invalid command: {e}"))
            .and_then(|command| session.dispatch(command).map_err(|e| e.to_string()));
        if let Err(e) = &outcome {
            tracing::warn!("{e}");
        }

        let reply = Reply {
            ok: outcome.is_ok(),
            error: outcome.err(),
            state: Snapshot::capture(session),
        };
        serde_json::to_writer(&mut stdout, &reply)?;
        writeln!(stdout)?;
        stdout.flush()?;
    }
    Ok(())
}
