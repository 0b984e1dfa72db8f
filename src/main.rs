//! CLI entry point for the GoPro cloud sync tool.

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use gopro_sync::credential::{self, TOKEN_ENV_VAR};
use gopro_sync::{
    CancelFlag, ClientConfig, PageLimit, ProgressSender, RetryPolicy, SyncEngine, SyncOptions,
};
use tracing::{debug, error, info, warn};

mod cli;
mod progress_ui;
mod terminal;

use cli::Args;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let no_color = terminal::no_color_env_requested() || terminal::is_dumb_terminal();
    terminal::init_tracing(terminal::default_log_level(args.quiet, args.verbose), no_color);

    debug!(
        folder = ?args.folder,
        token_given = args.token.is_some(),
        max_pages = ?args.max_pages,
        page_size = args.page_size,
        retries = args.retries,
        "CLI arguments parsed"
    );

    let Some(token) = credential::resolve_token(args.token.as_deref()) else {
        error!("No auth token found. Pass --token or set {TOKEN_ENV_VAR}.");
        return Ok(ExitCode::FAILURE);
    };

    if args.save_token {
        match credential::store_token(&token) {
            Ok(()) => info!("Token saved to system keychain"),
            Err(e) => warn!(error = %e, "Could not save token"),
        }
    }

    let folder = match args.folder.clone() {
        Some(folder) => folder,
        None => {
            let cwd = std::env::current_dir().context("cannot determine current directory")?;
            info!(folder = %cwd.display(), "No --folder given, syncing into the current directory");
            cwd
        }
    };

    let options = SyncOptions {
        page_size: args.page_size,
        max_pages: PageLimit::from_option(args.max_pages),
        retry: RetryPolicy::with_max_attempts(u32::from(args.retries)),
        unwrap_containers: !args.no_unwrap,
    };
    let engine = SyncEngine::connect(token, ClientConfig::with_base_url(&args.api_base), options)
        .context("failed to set up the catalog client")?;

    run_sync(&engine, folder, &args).await
}

async fn run_sync(engine: &SyncEngine, folder: PathBuf, args: &Args) -> Result<ExitCode> {
    let cancel = CancelFlag::new();
    let cancel_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current item");
            cancel_signal.cancel();
        }
    });

    let show_bar = terminal::should_use_progress_bar(
        io::stderr().is_terminal(),
        args.quiet,
        terminal::is_dumb_terminal(),
    );
    let (progress, events) = ProgressSender::channel();
    let progress_handle = progress_ui::spawn_progress_ui(show_bar, events);

    info!(folder = %folder.display(), "Starting sync");
    let outcome = engine.run(&folder, Some(&progress), Some(&cancel)).await;

    drop(progress);
    let _ = progress_handle.await;

    let result = outcome.with_context(|| format!("cannot sync into {}", folder.display()))?;

    info!(
        total = result.total,
        downloaded = result.downloaded,
        skipped = result.skipped,
        failed = result.failed,
        "Sync finished"
    );

    if result.cancelled {
        warn!(
            processed = result.processed,
            total = result.total,
            "Interrupted. Run again to pick up the remaining items."
        );
    } else if !result.success {
        error!("Token was rejected. Pass a fresh --token or update {TOKEN_ENV_VAR}.");
    }

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
