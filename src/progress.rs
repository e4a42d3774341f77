use std::sync::Arc;

use tracing::{info, warn};

use crate::retention::RetentionPass;

/// Events emitted during a sync run for progress reporting
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Playlist membership is being fetched
    LoadingSnapshot { playlist_id: String },

    /// Playlist membership has been fetched and normalized
    SnapshotLoaded {
        entries: usize,
        /// Items dropped because they are not usable episodes
        skipped: usize,
    },

    /// Newest episodes of a show are being looked up
    CheckingShow { show_name: String },

    /// A show lookup failed; the show is skipped for this run
    ShowFailed { show_name: String, error: String },

    /// An episode was added to the playlist
    EpisodeAdded {
        show_name: String,
        episode_name: String,
    },

    /// Adding an episode failed; it will be retried on the next run
    EpisodeAddFailed {
        show_name: String,
        episode_name: String,
        error: String,
    },

    /// A retention pass finished
    CleanupCompleted { pass: RetentionPass, removed: usize },

    /// A retention pass failed, entirely or for part of its selection
    CleanupFailed { pass: RetentionPass, error: String },

    /// The run completed
    JobCompleted {
        added_count: usize,
        removed_count: usize,
        failed_shows: usize,
    },
}

/// Trait for reporting progress events during a sync run.
///
/// Implementations can use this to display progress, log messages,
/// or collect statistics.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event
    fn report(&self, event: ProgressEvent);
}

/// A shared reference to a progress reporter
pub type SharedProgressReporter = Arc<dyn ProgressReporter>;

/// A no-op progress reporter that silently ignores all events.
/// Useful for tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: ProgressEvent) {
        // Intentionally empty
    }
}

impl NoopReporter {
    /// Create a new NoopReporter wrapped in an Arc
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}

/// Forwards every event to `tracing` as a structured log line.
/// This is what unattended (scheduled) runs use.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl LogReporter {
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}

impl ProgressReporter for LogReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::LoadingSnapshot { playlist_id } => {
                info!(playlist_id = %playlist_id, "Loading playlist");
            }
            ProgressEvent::SnapshotLoaded { entries, skipped } => {
                info!(entries, skipped, "Playlist loaded");
            }
            ProgressEvent::CheckingShow { show_name } => {
                info!(show = %show_name, "Checking show for new episodes");
            }
            ProgressEvent::ShowFailed { show_name, error } => {
                warn!(show = %show_name, error = %error, "Show lookup failed");
            }
            ProgressEvent::EpisodeAdded {
                show_name,
                episode_name,
            } => {
                info!(show = %show_name, episode = %episode_name, "Episode added");
            }
            ProgressEvent::EpisodeAddFailed {
                show_name,
                episode_name,
                error,
            } => {
                warn!(
                    show = %show_name,
                    episode = %episode_name,
                    error = %error,
                    "Failed to add episode"
                );
            }
            ProgressEvent::CleanupCompleted { pass, removed } => {
                info!(pass = %pass, removed, "Cleanup pass completed");
            }
            ProgressEvent::CleanupFailed { pass, error } => {
                warn!(pass = %pass, error = %error, "Cleanup pass failed");
            }
            ProgressEvent::JobCompleted {
                added_count,
                removed_count,
                failed_shows,
            } => {
                info!(
                    added = added_count,
                    removed = removed_count,
                    failed_shows,
                    "Sync completed"
                );
            }
        }
    }
}
