// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A show whose newest episodes are mirrored into the playlist
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ShowConfig {
    #[serde(alias = "showId")]
    pub id: String,
    /// Only used for diagnostics
    #[serde(alias = "displayName")]
    pub name: String,
}

/// Track reference of a raw playlist item as returned by the remote service
#[derive(Debug, Clone, Default)]
pub struct TrackRef {
    pub id: Option<String>,
    pub uri: Option<String>,
    /// Owning show, set for podcast episodes
    pub show_id: Option<String>,
    /// Artist ids in credit order
    pub artist_ids: Vec<String>,
}

/// One raw playlist item before normalization
#[derive(Debug, Clone, Default)]
pub struct PlaylistItem {
    pub added_at: Option<DateTime<Utc>>,
    /// `None` for removed or unavailable tracks
    pub track: Option<TrackRef>,
}

/// One track currently in the playlist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub id: Option<String>,
    /// Identity key for membership checks
    pub uri: String,
    pub added_at: DateTime<Utc>,
    pub show_id: Option<String>,
}

/// An episode returned by a show lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateEpisode {
    pub uri: String,
    pub name: String,
    pub show_id: String,
}

/// Play state of a single episode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeProgress {
    pub id: String,
    pub fully_played: bool,
}

/// Retention parameters, constant for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Entries added more than this many days ago are expired
    pub max_age_days: u32,
    /// Maximum number of entries kept per show
    pub max_per_show: u32,
    /// Number of newest episodes fetched per show and run
    pub new_episodes_per_show: u32,
}
