// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::refresh_access_token;
use crate::config::{Config, JobSettings};
use crate::error::{ErrorKind, JobError};
use crate::http::HttpClient;
use crate::progress::{ProgressEvent, SharedProgressReporter};
use crate::retention::{PassReport, cap_entries_per_show, expire_old_entries, purge_completed};
use crate::snapshot::load_snapshot;
use crate::spotify::SpotifyClient;
use crate::sync::{ShowResult, admit_episodes, discover_shows};
use crate::track_client::TrackClient;

/// Result of a run that got past loading the playlist
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOutcome {
    pub success: bool,
    pub new_episodes_added: usize,
    /// One record per configured show, in configuration order
    pub results: Vec<ShowResult>,
    /// One record per cleanup pass, in execution order
    pub cleanup: Vec<PassReport>,
}

impl JobOutcome {
    /// Entries removed across all cleanup passes
    pub fn removed(&self) -> usize {
        self.cleanup.iter().map(|pass| pass.removed).sum()
    }

    pub fn failed_shows(&self) -> usize {
        self.results.iter().filter(|result| !result.success).count()
    }
}

/// Serializable form of a fatal run failure
#[derive(Debug, Clone, Serialize)]
pub struct JobFailure {
    pub success: bool,
    pub error: ErrorKind,
    pub message: String,
}

impl From<&JobError> for JobFailure {
    fn from(error: &JobError) -> Self {
        Self {
            success: false,
            error: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Synchronize the playlist against the configured shows, then prune it
///
/// The playlist is read once. New episodes are looked up per show and added,
/// then age expiry, the per-show cap and the completed purge run in that
/// order against the playlist as it was read. Only a failure to read the
/// playlist aborts the run; every later failure is recorded in the outcome.
pub async fn run_job<T: TrackClient>(
    client: &T,
    settings: &JobSettings,
    now: DateTime<Utc>,
    reporter: SharedProgressReporter,
) -> Result<JobOutcome, JobError> {
    let playlist_id = settings.playlist_id.as_str();
    let retention = &settings.retention;

    reporter.report(ProgressEvent::LoadingSnapshot {
        playlist_id: playlist_id.to_string(),
    });

    let snapshot =
        load_snapshot(client, playlist_id)
            .await
            .map_err(|source| JobError::Snapshot {
                playlist_id: playlist_id.to_string(),
                source,
            })?;

    reporter.report(ProgressEvent::SnapshotLoaded {
        entries: snapshot.len(),
        skipped: snapshot.skipped,
    });

    let discoveries = discover_shows(
        client,
        &settings.shows,
        &snapshot,
        retention.new_episodes_per_show,
        settings.discovery_concurrency,
        &reporter,
    )
    .await;
    let results = admit_episodes(client, playlist_id, discoveries, &reporter).await;
    let new_episodes_added = results.iter().map(|result| result.episodes_added).sum();

    let mut cleanup = Vec::with_capacity(3);

    let expired =
        expire_old_entries(client, playlist_id, &snapshot, now, retention.max_age_days).await;
    report_pass(&reporter, &expired);
    cleanup.push(expired);

    let capped =
        cap_entries_per_show(client, playlist_id, &snapshot, retention.max_per_show).await;
    report_pass(&reporter, &capped);
    cleanup.push(capped);

    let purged = purge_completed(client, playlist_id, &snapshot).await;
    report_pass(&reporter, &purged);
    cleanup.push(purged);

    let outcome = JobOutcome {
        success: true,
        new_episodes_added,
        results,
        cleanup,
    };

    reporter.report(ProgressEvent::JobCompleted {
        added_count: outcome.new_episodes_added,
        removed_count: outcome.removed(),
        failed_shows: outcome.failed_shows(),
    });

    Ok(outcome)
}

fn report_pass(reporter: &SharedProgressReporter, report: &PassReport) {
    match &report.error {
        None => reporter.report(ProgressEvent::CleanupCompleted {
            pass: report.pass,
            removed: report.removed,
        }),
        Some(error) => reporter.report(ProgressEvent::CleanupFailed {
            pass: report.pass,
            error: error.clone(),
        }),
    }
}

/// Authenticate and run one job against the Web API
///
/// A fresh access token is obtained first. The client built from it lives
/// exactly as long as this run.
pub async fn execute<C: HttpClient>(
    http: C,
    config: &Config,
    now: DateTime<Utc>,
    reporter: SharedProgressReporter,
) -> Result<JobOutcome, JobError> {
    let token = refresh_access_token(&http, &config.credentials).await?;

    let client = SpotifyClient::new(http, token)
        .with_api_base(config.api_base.clone())
        .with_market(config.market.clone());

    run_job(&client, &config.job, now, reporter).await
}
