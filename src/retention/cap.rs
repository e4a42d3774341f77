// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::HashMap;

use super::{PassReport, RetentionPass, remove_entries};
use crate::model::PlaylistEntry;
use crate::snapshot::PlaylistSnapshot;
use crate::track_client::TrackClient;

/// The entries of one show that exceed the cap, oldest first
#[derive(Debug)]
pub struct ShowExcess<'a> {
    pub show_id: &'a str,
    pub entries: Vec<&'a PlaylistEntry>,
}

/// For every show holding more than `max_per_show` entries, pick its oldest ones
///
/// Ties on `added_at` keep playlist order. Shows are returned in the order
/// they first appear in the playlist. Entries without a show are never capped.
pub fn select_over_cap(entries: &[PlaylistEntry], max_per_show: u32) -> Vec<ShowExcess<'_>> {
    let mut groups: Vec<(&str, Vec<&PlaylistEntry>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for entry in entries {
        let Some(show_id) = entry.show_id.as_deref() else {
            continue;
        };
        let slot = *index.entry(show_id).or_insert_with(|| {
            groups.push((show_id, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(entry);
    }

    let cap = max_per_show as usize;
    groups
        .into_iter()
        .filter(|(_, members)| members.len() > cap)
        .map(|(show_id, mut members)| {
            let excess = members.len() - cap;
            members.sort_by_key(|entry| entry.added_at);
            members.truncate(excess);
            ShowExcess {
                show_id,
                entries: members,
            }
        })
        .collect()
}

/// Trim every over-cap show down to `max_per_show` entries
///
/// One removal call is made per show. A failure for one show is recorded
/// and the remaining shows are still trimmed.
pub async fn cap_entries_per_show<T: TrackClient>(
    client: &T,
    playlist_id: &str,
    snapshot: &PlaylistSnapshot,
    max_per_show: u32,
) -> PassReport {
    let mut removed = 0;
    let mut errors = Vec::new();

    for excess in select_over_cap(&snapshot.entries, max_per_show) {
        match remove_entries(client, playlist_id, &excess.entries).await {
            Ok(count) => removed += count,
            Err(e) => {
                removed += e.applied();
                errors.push(format!("{}: {}", excess.show_id, e));
            }
        }
    }

    if errors.is_empty() {
        PassReport::completed(RetentionPass::PerShowCap, removed)
    } else {
        PassReport::failed(RetentionPass::PerShowCap, removed, errors.join("; "))
    }
}
