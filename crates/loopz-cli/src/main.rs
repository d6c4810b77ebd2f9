//! Loopz CLI Application
//!
//! Command-line shell for Loopz: loop and task management plus an
//! interactive assistant chat.

mod args;
mod chat;
mod cli;
mod renderer;

use std::sync::Arc;

use anyhow::{Context, Result};
use args::{Args, Commands};
use chat::ChatSession;
use clap::Parser;
use cli::Cli;
use log::info;
use loopz_core::{
    models::{LoopFilter, LoopStatus},
    StaticSession, WorkspaceBuilder,
};
use renderer::TerminalRenderer;
use Commands::*;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        database_file,
        in_memory,
        user,
        no_color,
        command,
    } = Args::parse();

    let session = Arc::new(StaticSession::signed_in(user.as_str()));
    let workspace = WorkspaceBuilder::new()
        .with_database_path(database_file)
        .in_memory(in_memory)
        .with_session(session.clone())
        .with_greeting(true)
        .build()
        .await
        .context("Failed to initialize workspace")?;
    workspace
        .refresh()
        .await
        .context("Failed to load loops")?;

    let renderer = TerminalRenderer::new(!no_color);

    info!("Loopz started for {user}");

    match command {
        Some(Loop { command }) => {
            Cli::new(workspace, renderer)
                .handle_loop_command(command)
                .await
        }
        Some(Task { command }) => {
            Cli::new(workspace, renderer)
                .handle_task_command(command)
                .await
        }
        Some(Chat) => {
            let _watcher = workspace.spawn_change_watcher();
            ChatSession::new(workspace, renderer, session, user)
                .run()
                .await
        }
        None => {
            Cli::new(workspace, renderer)
                .list_loops(&LoopFilter::with_status(LoopStatus::Active))
                .await
        }
    }
}
