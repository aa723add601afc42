//! Opening a file handed to the app at launch ("open with")

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use crate::core::document::SheetCollection;
use crate::core::envelope;
use crate::core::file_system::{FileHandle, MIND_MAP_EXTENSION};
use crate::session::Session;

/// How long startup waits for launch parameters by default
pub const DEFAULT_LAUNCH_TIMEOUT: Duration = Duration::from_millis(120);

/// What the platform passes when the app is launched to open files
#[derive(Debug, Clone, Default)]
pub struct LaunchParams {
    pub files: Vec<FileHandle>,
}

impl LaunchParams {
    pub fn with_file(handle: FileHandle) -> Self {
        Self {
            files: vec![handle],
        }
    }
}

/// Receiving end of the platform's launch queue
#[derive(Debug)]
pub struct LaunchQueue {
    rx: mpsc::Receiver<LaunchParams>,
}

impl LaunchQueue {
    /// Create a queue and the sender the platform side delivers through
    pub fn channel() -> (mpsc::Sender<LaunchParams>, Self) {
        let (tx, rx) = mpsc::channel(1);
        (tx, Self { rx })
    }
}

/// How the launch step ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// The platform has no launch queue
    Unsupported,
    /// Nothing arrived before the timeout
    TimedOut,
    /// Launch parameters arrived without a file
    NoFiles,
    /// The file was opened and the session is in local-file mode
    Opened,
    /// The file could not be read or parsed; the session is unchanged
    Failed,
}

/// Wait briefly for a launch file and, if one arrives, open it in `session`.
///
/// Never fails: a missing queue, a timeout, or an unreadable file all leave the
/// session as it was so startup can continue.
pub async fn load_launch_file(
    session: &mut Session,
    queue: Option<LaunchQueue>,
    timeout: Duration,
) -> LaunchOutcome {
    let Some(mut queue) = queue else {
        tracing::debug!("No launch queue on this platform");
        return LaunchOutcome::Unsupported;
    };

    let params = match tokio::time::timeout(timeout, queue.rx.recv()).await {
        Ok(Some(params)) => params,
        Ok(None) => {
            tracing::debug!("Launch queue closed without parameters");
            return LaunchOutcome::NoFiles;
        }
        Err(_) => {
            tracing::debug!("No launch parameters within {:?}", timeout);
            return LaunchOutcome::TimedOut;
        }
    };

    let Some(handle) = params.files.into_iter().next() else {
        return LaunchOutcome::NoFiles;
    };

    tracing::info!("Opening launch file {}", handle.name());
    if !handle.is_mind_map() {
        tracing::debug!(
            "{} has no .{} extension, trying it anyway",
            handle.name(),
            MIND_MAP_EXTENSION
        );
    }
    match read_sheets(&handle).await {
        Ok(collection) => {
            session.open_local_file(collection, Some(handle));
            LaunchOutcome::Opened
        }
        Err(e) => {
            tracing::warn!("Ignoring launch file {}: {:#}", handle.name(), e);
            LaunchOutcome::Failed
        }
    }
}

async fn read_sheets(handle: &FileHandle) -> Result<SheetCollection> {
    let text = handle.read_text().await?;
    envelope::parse(&text).context("Not a mind-map file")
}
