// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};

use super::types::{EpisodesResponse, PlaylistItemsPage, ShowEpisodesPage};
use crate::auth::AccessToken;
use crate::config::DEFAULT_API_BASE;
use crate::error::ClientError;
use crate::http::{HttpClient, HttpRequest, HttpResponse};
use crate::model::{CandidateEpisode, EpisodeProgress, PlaylistItem, TrackRef};
use crate::track_client::TrackClient;

/// Largest number of URIs accepted by one playlist mutation
const PLAYLIST_BATCH_SIZE: usize = 100;
/// Largest number of ids accepted by one episode lookup
const EPISODES_BATCH_SIZE: usize = 50;
/// Page size for playlist listings
const PLAYLIST_PAGE_SIZE: &str = "100";
const PLAYLIST_FIELDS: &str = "next,items(added_at,track(id,uri,show(id),artists(id)))";
/// Error bodies are cut to this many characters
const MAX_ERROR_BODY: usize = 240;

/// Web API client bound to one access token
///
/// Built once per run after the token refresh and handed to every step of
/// the run, so no authenticated state outlives it.
pub struct SpotifyClient<C> {
    http: C,
    token: AccessToken,
    api_base: String,
    market: Option<String>,
}

impl<C: HttpClient> SpotifyClient<C> {
    pub fn new(http: C, token: AccessToken) -> Self {
        Self {
            http,
            token,
            api_base: DEFAULT_API_BASE.to_string(),
            market: None,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_market(mut self, market: Option<String>) -> Self {
        self.market = market;
        self
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        serializer.extend_pairs(query);
        if let Some(market) = &self.market {
            serializer.append_pair("market", market);
        }
        let query = serializer.finish();

        if query.is_empty() {
            format!("{}{}", self.api_base, path)
        } else {
            format!("{}{}?{}", self.api_base, path, query)
        }
    }

    fn playlist_url(&self, playlist_id: &str) -> String {
        format!("{}/playlists/{}/tracks", self.api_base, playlist_id)
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        let url = request.url.clone();
        let response = self
            .http
            .execute(request.bearer(self.token.secret()))
            .await
            .map_err(|e| ClientError::Transport {
                url: url.clone(),
                source: e,
            })?;

        if !response.is_success() {
            let body = response.text();
            let message = body.trim().chars().take(MAX_ERROR_BODY).collect();
            return Err(ClientError::HttpStatus {
                url,
                status: response.status,
                message,
            });
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ClientError> {
        let response = self.send(HttpRequest::get(url)).await?;
        serde_json::from_slice(&response.body).map_err(|e| ClientError::MalformedResponse {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Attach the number of already accepted items to an error from a later batch
fn partially_applied(applied: usize, error: ClientError) -> ClientError {
    if applied == 0 {
        error
    } else {
        ClientError::PartiallyApplied {
            applied,
            source: Box::new(error),
        }
    }
}

impl From<super::types::PlaylistItemObject> for PlaylistItem {
    fn from(item: super::types::PlaylistItemObject) -> Self {
        let track = item.track.map(|track| TrackRef {
            id: track.id,
            uri: track.uri,
            show_id: track.show.and_then(|show| show.id),
            artist_ids: track.artists.into_iter().filter_map(|a| a.id).collect(),
        });

        PlaylistItem {
            added_at: item.added_at,
            track,
        }
    }
}

#[async_trait]
impl<C: HttpClient> TrackClient for SpotifyClient<C> {
    #[instrument(skip(self))]
    async fn list_playlist_items(
        &self,
        playlist_id: &str,
    ) -> Result<Vec<PlaylistItem>, ClientError> {
        let mut items = Vec::new();
        let mut next = Some(format!(
            "{}?{}",
            self.playlist_url(playlist_id),
            url::form_urlencoded::Serializer::new(String::new())
                .append_pair("limit", PLAYLIST_PAGE_SIZE)
                .append_pair("additional_types", "episode")
                .append_pair("fields", PLAYLIST_FIELDS)
                .finish()
        ));

        while let Some(url) = next {
            let page: PlaylistItemsPage = self.get_json(&url).await?;
            items.extend(page.items.into_iter().flatten().map(PlaylistItem::from));
            next = page.next;
        }

        debug!(count = items.len(), "Fetched playlist items");
        Ok(items)
    }

    #[instrument(skip(self))]
    async fn list_newest_episodes(
        &self,
        show_id: &str,
        limit: u32,
    ) -> Result<Vec<CandidateEpisode>, ClientError> {
        let limit = limit.to_string();
        let url = self.url(
            &format!("/shows/{show_id}/episodes"),
            &[("limit", limit.as_str())],
        );
        let page: ShowEpisodesPage = self.get_json(&url).await?;

        Ok(page
            .items
            .into_iter()
            .flatten()
            .filter_map(|episode| {
                let uri = episode.uri.filter(|uri| !uri.is_empty())?;
                Some(CandidateEpisode {
                    uri,
                    name: episode.name.unwrap_or_default(),
                    show_id: show_id.to_string(),
                })
            })
            .collect())
    }

    #[instrument(skip(self, uris), fields(count = uris.len()))]
    async fn add_to_playlist(&self, playlist_id: &str, uris: &[String]) -> Result<(), ClientError> {
        let mut applied = 0;
        for chunk in uris.chunks(PLAYLIST_BATCH_SIZE) {
            let request =
                HttpRequest::post(self.playlist_url(playlist_id)).json(&json!({ "uris": chunk }));
            self.send(request)
                .await
                .map_err(|e| partially_applied(applied, e))?;
            applied += chunk.len();
        }
        Ok(())
    }

    #[instrument(skip(self, uris), fields(count = uris.len()))]
    async fn remove_from_playlist(
        &self,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<(), ClientError> {
        let mut applied = 0;
        for chunk in uris.chunks(PLAYLIST_BATCH_SIZE) {
            let tracks: Vec<_> = chunk.iter().map(|uri| json!({ "uri": uri })).collect();
            let request = HttpRequest::delete(self.playlist_url(playlist_id))
                .json(&json!({ "tracks": tracks }));
            self.send(request)
                .await
                .map_err(|e| partially_applied(applied, e))?;
            applied += chunk.len();
        }
        Ok(())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn episode_progress(&self, ids: &[String]) -> Result<Vec<EpisodeProgress>, ClientError> {
        let mut progress = Vec::with_capacity(ids.len());

        for chunk in ids.chunks(EPISODES_BATCH_SIZE) {
            let joined = chunk.join(",");
            let url = self.url("/episodes", &[("ids", joined.as_str())]);
            let response: EpisodesResponse = self.get_json(&url).await?;

            for episode in response.episodes.into_iter().flatten() {
                let resume_point =
                    episode
                        .resume_point
                        .ok_or_else(|| ClientError::MalformedResponse {
                            url: url.clone(),
                            reason: format!("episode {} has no resume_point", episode.id),
                        })?;
                progress.push(EpisodeProgress {
                    id: episode.id,
                    fully_played: resume_point.fully_played,
                });
            }
        }

        Ok(progress)
    }
}
