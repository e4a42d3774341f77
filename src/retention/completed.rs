// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::HashSet;

use super::{PassReport, RetentionPass, remove_entries};
use crate::model::{EpisodeProgress, PlaylistEntry};
use crate::snapshot::PlaylistSnapshot;
use crate::track_client::TrackClient;

/// Entries whose episode is reported as fully played
pub fn select_completed<'a>(
    entries: &'a [PlaylistEntry],
    progress: &[EpisodeProgress],
) -> Vec<&'a PlaylistEntry> {
    let played: HashSet<&str> = progress
        .iter()
        .filter(|p| p.fully_played)
        .map(|p| p.id.as_str())
        .collect();

    entries
        .iter()
        .filter(|entry| entry.id.as_deref().is_some_and(|id| played.contains(id)))
        .collect()
}

/// Remove every fully played episode in one batched call
///
/// Any failure, including a malformed progress response, aborts this pass
/// only. Nothing is removed in that case.
pub async fn purge_completed<T: TrackClient>(
    client: &T,
    playlist_id: &str,
    snapshot: &PlaylistSnapshot,
) -> PassReport {
    let mut seen = HashSet::new();
    let ids: Vec<String> = snapshot
        .entries
        .iter()
        .filter_map(|entry| entry.id.as_deref())
        .filter(|id| !id.is_empty() && seen.insert(*id))
        .map(String::from)
        .collect();

    if ids.is_empty() {
        return PassReport::completed(RetentionPass::CompletedPurge, 0);
    }

    let progress = match client.episode_progress(&ids).await {
        Ok(progress) => progress,
        Err(e) => return PassReport::failed(RetentionPass::CompletedPurge, 0, e.to_string()),
    };

    let completed = select_completed(&snapshot.entries, &progress);
    match remove_entries(client, playlist_id, &completed).await {
        Ok(removed) => PassReport::completed(RetentionPass::CompletedPurge, removed),
        Err(e) => PassReport::failed(RetentionPass::CompletedPurge, e.applied(), e.to_string()),
    }
}
