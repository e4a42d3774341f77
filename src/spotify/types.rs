// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Web API response shapes, reduced to the fields the sync engine reads

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One page of `GET /playlists/{id}/tracks`
#[derive(Debug, Deserialize)]
pub struct PlaylistItemsPage {
    pub items: Vec<Option<PlaylistItemObject>>,
    /// Absolute URL of the next page
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistItemObject {
    #[serde(default)]
    pub added_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub track: Option<TrackObject>,
}

/// A track or episode inside a playlist
#[derive(Debug, Deserialize)]
pub struct TrackObject {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    /// Present on episodes
    #[serde(default)]
    pub show: Option<IdRef>,
    #[serde(default)]
    pub artists: Vec<IdRef>,
}

#[derive(Debug, Deserialize)]
pub struct IdRef {
    #[serde(default)]
    pub id: Option<String>,
}

/// One page of `GET /shows/{id}/episodes`, newest first
#[derive(Debug, Deserialize)]
pub struct ShowEpisodesPage {
    pub items: Vec<Option<SimplifiedEpisode>>,
}

#[derive(Debug, Deserialize)]
pub struct SimplifiedEpisode {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Response of `GET /episodes?ids=...`; unknown ids come back as `null`
#[derive(Debug, Deserialize)]
pub struct EpisodesResponse {
    pub episodes: Vec<Option<EpisodeObject>>,
}

#[derive(Debug, Deserialize)]
pub struct EpisodeObject {
    pub id: String,
    /// Only present for user-authorized requests
    #[serde(default)]
    pub resume_point: Option<ResumePoint>,
}

#[derive(Debug, Deserialize)]
pub struct ResumePoint {
    pub fully_played: bool,
}
