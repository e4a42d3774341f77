// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, Duration, Utc};

use super::{PassReport, RetentionPass, remove_entries};
use crate::model::PlaylistEntry;
use crate::snapshot::PlaylistSnapshot;
use crate::track_client::TrackClient;

/// Entries added strictly before `now - max_age_days`
pub fn select_expired(
    entries: &[PlaylistEntry],
    now: DateTime<Utc>,
    max_age_days: u32,
) -> Vec<&PlaylistEntry> {
    let cutoff = now - Duration::days(i64::from(max_age_days));
    entries
        .iter()
        .filter(|entry| entry.added_at < cutoff)
        .collect()
}

/// Remove every expired entry in one batched call
pub async fn expire_old_entries<T: TrackClient>(
    client: &T,
    playlist_id: &str,
    snapshot: &PlaylistSnapshot,
    now: DateTime<Utc>,
    max_age_days: u32,
) -> PassReport {
    let expired = select_expired(&snapshot.entries, now, max_age_days);

    match remove_entries(client, playlist_id, &expired).await {
        Ok(removed) => PassReport::completed(RetentionPass::AgeExpiry, removed),
        Err(e) => PassReport::failed(RetentionPass::AgeExpiry, e.applied(), e.to_string()),
    }
}
