//! Progress bar fed from the sync progress channel.

use gopro_sync::SyncProgress;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

/// Consumes progress events until every sender is dropped.
///
/// With `show_bar` false the events are only traced at debug level.
pub(crate) fn spawn_progress_ui(
    show_bar: bool,
    mut events: UnboundedReceiver<SyncProgress>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let bar = show_bar.then(|| {
            let bar = ProgressBar::new(100);
            bar.set_style(
                ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>3}% {wide_msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        });

        while let Some(event) = events.recv().await {
            debug!(percent = ?event.percent, message = %event.message, "progress");
            if let Some(bar) = &bar {
                if let Some(percent) = event.percent {
                    bar.set_position(u64::from(percent));
                }
                bar.set_message(event.message);
            }
        }

        if let Some(bar) = bar {
            bar.finish_and_clear();
        }
    })
}
