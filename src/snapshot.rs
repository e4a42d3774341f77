use std::collections::HashSet;

use crate::error::ClientError;
use crate::model::{PlaylistEntry, PlaylistItem};
use crate::track_client::TrackClient;

/// Playlist membership as read once at the start of a run
///
/// Every decision of a run (what to add, what to expire, what to cap, what
/// to purge) is made against the same snapshot.
#[derive(Debug, Clone, Default)]
pub struct PlaylistSnapshot {
    /// Usable entries, in playlist order
    pub entries: Vec<PlaylistEntry>,
    /// Number of raw items dropped during normalization
    pub skipped: usize,
    uris: HashSet<String>,
}

impl PlaylistSnapshot {
    /// Normalize raw playlist items into a snapshot
    ///
    /// Items without a track, a URI or an added-at timestamp are dropped.
    pub fn from_items(items: Vec<PlaylistItem>) -> Self {
        let total = items.len();
        let entries: Vec<PlaylistEntry> = items.into_iter().filter_map(normalize).collect();
        let uris = entries.iter().map(|entry| entry.uri.clone()).collect();

        Self {
            skipped: total - entries.len(),
            entries,
            uris,
        }
    }

    /// Whether an entry with this URI was in the playlist when the snapshot was taken
    pub fn contains_uri(&self, uri: &str) -> bool {
        self.uris.contains(uri)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize(item: PlaylistItem) -> Option<PlaylistEntry> {
    let track = item.track?;
    let uri = track.uri.filter(|uri| !uri.is_empty())?;
    let added_at = item.added_at?;

    // Episodes name their show; anything else falls back to its primary artist
    let show_id = track
        .show_id
        .or_else(|| track.artist_ids.into_iter().next());

    Some(PlaylistEntry {
        id: track.id,
        uri,
        added_at,
        show_id,
    })
}

/// Fetch and normalize the current membership of a playlist
pub async fn load_snapshot<T: TrackClient>(
    client: &T,
    playlist_id: &str,
) -> Result<PlaylistSnapshot, ClientError> {
    let items = client.list_playlist_items(playlist_id).await?;
    Ok(PlaylistSnapshot::from_items(items))
}
