//! Mindsheet - launcher for the mind-map persistence layer
//!
//! Opens local storage, treats a file given on the command line as an "open with"
//! launch, and prints the sheets the editor would show.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use mindsheet::core::config::AppConfig;
use mindsheet::core::file_system::FileHandle;
use mindsheet::launch::{load_launch_file, LaunchOutcome, LaunchParams, LaunchQueue};
use mindsheet::session::{Session, DEFAULT_LANGUAGE};
use mindsheet::storage::FileStorage;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::filter::LevelFilter::INFO)
        .init();

    tracing::info!("Starting Mindsheet...");

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!("Using default config: {:#}", e);
        AppConfig::default()
    });

    let storage = FileStorage::open_in(&config.data_dir(), config.quota())
        .context("Failed to open local storage")?;
    let default_language = config
        .default_language
        .clone()
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
    let mut session = Session::new(storage).with_default_language(default_language);

    let (tx, queue) = LaunchQueue::channel();
    if let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) {
        tx.send(LaunchParams::with_file(FileHandle::new(path)))
            .await
            .context("Failed to queue launch file")?;
    }
    drop(tx);

    let timeout = Duration::from_millis(config.launch.timeout_ms);
    let outcome = load_launch_file(&mut session, Some(queue), timeout).await;
    if outcome == LaunchOutcome::Opened {
        if let Some(handle) = session.local_file_handle() {
            config.add_recent_file(handle.path().to_path_buf());
            if let Err(e) = config.save() {
                tracing::warn!("Failed to save config: {:#}", e);
            }
        }
    }

    let lang = session.get_lang();
    let sheets = session.get_sheets();
    println!("{} storage, language {}", session.backend_kind(), lang);
    for (index, sheet) in sheets.sheets.iter().enumerate() {
        let marker = if index == sheets.active_index { '*' } else { ' ' };
        println!("{marker} {} [{}]", sheet.name, sheet.id);
    }

    Ok(())
}
