//! # tasklist
//!
//! A small task list: add, edit, complete, delete and filter short-lived tasks,
//! with approaching due dates highlighted.
//!
//! ## Key Features
//!
//! - **One list, one key**: the whole list is stored as a JSON array under a
//!   single storage key and rewritten after every change.
//! - **Filters**: all / pending / completed, applied at render time only.
//! - **Due soon**: tasks due within the next 48 hours are flagged.
//! - **Two front ends**: an interactive terminal UI and a scriptable CLI.
//!
//! ## Quick Start
//!
//! ```bash
//! # Launch the terminal UI
//! tasklist
//!
//! # Add a task via CLI
//! tasklist add "Renew passport" --due "in 3d" --category personal
//!
//! # List pending tasks
//! tasklist list --filter pending
//! ```
//!
//! Data is stored in the platform data directory (`tasklist/tasks.json`)
//! unless `--data-dir` or the `data_dir` config key says otherwise.

use std::ffi::OsString;
use std::io;

use anyhow::Context;
use clap::Parser;
use tracing::info;

pub mod cli;
pub mod clock;
pub mod cmd;
pub mod config;
pub mod controller;
pub mod due;
pub mod error;
pub mod fields;
pub mod html;
pub mod scheduler;
pub mod storage;
pub mod task;
pub mod view;
pub mod tui {
    pub mod app;
    pub mod enums;
    pub mod input;
    pub mod run;
    pub mod task_form;
    pub mod theme;
    pub mod utils;
}

use clock::SystemClock;
use cmd::*;
use controller::TaskList;
use storage::FileStorage;

/// File the terminal UI logs to, inside the data directory.
pub const UI_LOG_FILE: &str = "tasklist.log";

pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let cli = cli::Cli::parse_from(raw_args);
    let command = cli.command.unwrap_or(Commands::Ui);

    if let Commands::Completions { shell } = command {
        cmd_completions(shell);
        return Ok(());
    }

    let cfg = config::Config::load(cli.config.as_deref())?;
    let data_dir = config::resolve_data_dir(&cfg, cli.data_dir.as_deref()).context("failed to resolve data directory")?;
    let storage = FileStorage::open(&data_dir).with_context(|| format!("failed to open storage at {}", data_dir.display()))?;

    let log_file = matches!(command, Commands::Ui).then(|| data_dir.join(UI_LOG_FILE));
    cli::init_tracing(cli.verbose, cli.quiet, log_file.as_deref())?;
    info!(data_dir = %data_dir.display(), config = ?cfg.loaded_from, "starting tasklist");

    let mut list = TaskList::load(storage, SystemClock, cfg.settings())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match command {
        Commands::Ui => {
            drop(out);
            tui::run::run_tui(&mut list, cfg.theme())?
        }
        Commands::Add { text, due, category } => cmd_add(&mut list, &mut out, &text, due.as_deref(), category.as_deref())?,
        Commands::List { filter } => cmd_list(&mut list, &mut out, filter)?,
        Commands::Toggle { id } => cmd_toggle(&mut list, &mut out, id)?,
        Commands::Edit { id, text } => cmd_edit(&mut list, &mut out, id, &text)?,
        Commands::Delete { id } => cmd_delete(&mut list, &mut out, id)?,
        Commands::Export { html, filter } => cmd_export(&mut list, &mut out, &html, filter, cfg.theme())?,
        Commands::Completions { shell } => cmd_completions(shell),
    }

    info!("done");
    Ok(())
}
