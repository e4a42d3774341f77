// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory playlist service shared by the engine's unit tests

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::error::ClientError;
use crate::model::{CandidateEpisode, EpisodeProgress, PlaylistItem, TrackRef};
use crate::track_client::TrackClient;

pub fn days_ago(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now - Duration::days(days)
}

pub fn transport_error(url: &str) -> ClientError {
    ClientError::HttpStatus {
        url: url.to_string(),
        status: 503,
        message: "Service Unavailable".to_string(),
    }
}

pub fn malformed_error(url: &str) -> ClientError {
    ClientError::MalformedResponse {
        url: url.to_string(),
        reason: "missing field `resume_point`".to_string(),
    }
}

/// Build a playlist item for an episode of `show_id`
pub fn episode_item(uri: &str, show_id: &str, added_at: DateTime<Utc>) -> PlaylistItem {
    PlaylistItem {
        added_at: Some(added_at),
        track: Some(TrackRef {
            id: Some(format!("id-{uri}")),
            uri: Some(uri.to_string()),
            show_id: Some(show_id.to_string()),
            artist_ids: Vec::new(),
        }),
    }
}

#[derive(Default)]
struct FakeState {
    playlist: Vec<PlaylistItem>,
    adds: Vec<Vec<String>>,
    removals: Vec<Vec<String>>,
    progress_requests: Vec<Vec<String>>,
}

/// A fake remote service holding one playlist in memory
///
/// Mutations are applied to the in-memory playlist so that consecutive runs
/// observe each other's effects. Removals of absent URIs succeed.
#[derive(Default)]
pub struct FakeTrackClient {
    state: Mutex<FakeState>,
    episodes: HashMap<String, Vec<CandidateEpisode>>,
    failing_shows: HashSet<String>,
    failing_adds: HashSet<String>,
    failing_removals: HashSet<String>,
    fully_played: HashSet<String>,
    removal_batch_limit: Option<usize>,
    fail_listing: bool,
    malformed_progress: bool,
}

impl FakeTrackClient {
    pub fn new(playlist: Vec<PlaylistItem>) -> Self {
        Self {
            state: Mutex::new(FakeState {
                playlist,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn with_episodes(mut self, show_id: &str, uris: &[&str]) -> Self {
        let episodes = uris
            .iter()
            .map(|uri| CandidateEpisode {
                uri: uri.to_string(),
                name: format!("Episode {uri}"),
                show_id: show_id.to_string(),
            })
            .collect();
        self.episodes.insert(show_id.to_string(), episodes);
        self
    }

    pub fn with_failing_show(mut self, show_id: &str) -> Self {
        self.failing_shows.insert(show_id.to_string());
        self
    }

    pub fn with_failing_add(mut self, uri: &str) -> Self {
        self.failing_adds.insert(uri.to_string());
        self
    }

    /// Any removal batch containing `uri` fails
    pub fn with_failing_removal(mut self, uri: &str) -> Self {
        self.failing_removals.insert(uri.to_string());
        self
    }

    /// Removal calls apply their first `limit` URIs, then fail on the rest
    pub fn with_removal_batch_limit(mut self, limit: usize) -> Self {
        self.removal_batch_limit = Some(limit);
        self
    }

    pub fn with_fully_played(mut self, id: &str) -> Self {
        self.fully_played.insert(id.to_string());
        self
    }

    pub fn with_failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn with_malformed_progress(mut self) -> Self {
        self.malformed_progress = true;
        self
    }

    pub fn adds(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().adds.clone()
    }

    pub fn removals(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().removals.clone()
    }

    pub fn progress_requests(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().progress_requests.clone()
    }

    pub fn playlist_uris(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .playlist
            .iter()
            .filter_map(|item| item.track.as_ref().and_then(|track| track.uri.clone()))
            .collect()
    }
}

#[async_trait]
impl TrackClient for FakeTrackClient {
    async fn list_playlist_items(
        &self,
        playlist_id: &str,
    ) -> Result<Vec<PlaylistItem>, ClientError> {
        if self.fail_listing {
            return Err(transport_error(playlist_id));
        }
        Ok(self.state.lock().unwrap().playlist.clone())
    }

    async fn list_newest_episodes(
        &self,
        show_id: &str,
        limit: u32,
    ) -> Result<Vec<CandidateEpisode>, ClientError> {
        if self.failing_shows.contains(show_id) {
            return Err(transport_error(show_id));
        }
        Ok(self
            .episodes
            .get(show_id)
            .map(|episodes| episodes.iter().take(limit as usize).cloned().collect())
            .unwrap_or_default())
    }

    async fn add_to_playlist(&self, _playlist_id: &str, uris: &[String]) -> Result<(), ClientError> {
        if let Some(uri) = uris.iter().find(|uri| self.failing_adds.contains(*uri)) {
            return Err(transport_error(uri));
        }

        let mut state = self.state.lock().unwrap();
        state.adds.push(uris.to_vec());
        for uri in uris {
            let show_id = self
                .episodes
                .iter()
                .find(|(_, episodes)| episodes.iter().any(|e| &e.uri == uri))
                .map(|(show_id, _)| show_id.clone())
                .unwrap_or_default();
            state.playlist.push(episode_item(uri, &show_id, Utc::now()));
        }
        Ok(())
    }

    async fn remove_from_playlist(
        &self,
        _playlist_id: &str,
        uris: &[String],
    ) -> Result<(), ClientError> {
        if let Some(uri) = uris.iter().find(|uri| self.failing_removals.contains(*uri)) {
            return Err(transport_error(uri));
        }

        let limit = self.removal_batch_limit.unwrap_or(usize::MAX);
        let applied = &uris[..uris.len().min(limit)];

        let mut state = self.state.lock().unwrap();
        state.removals.push(applied.to_vec());
        state.playlist.retain(|item| {
            item.track
                .as_ref()
                .and_then(|track| track.uri.as_ref())
                .is_none_or(|uri| !applied.contains(uri))
        });

        if applied.len() < uris.len() {
            return Err(ClientError::PartiallyApplied {
                applied: applied.len(),
                source: Box::new(transport_error(&uris[applied.len()])),
            });
        }
        Ok(())
    }

    async fn episode_progress(&self, ids: &[String]) -> Result<Vec<EpisodeProgress>, ClientError> {
        self.state
            .lock()
            .unwrap()
            .progress_requests
            .push(ids.to_vec());

        if self.malformed_progress {
            return Err(malformed_error("episodes"));
        }

        Ok(ids
            .iter()
            .map(|id| EpisodeProgress {
                id: id.clone(),
                fully_played: self.fully_played.contains(id),
            })
            .collect())
    }
}
