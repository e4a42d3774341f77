// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;

use crate::error::ClientError;
use crate::model::{CandidateEpisode, EpisodeProgress, PlaylistItem};

/// Operations the sync engine needs from the remote playlist service
///
/// Every call is atomic from the engine's point of view: it either succeeds
/// or fails after the transport's own bounded retries.
#[async_trait]
pub trait TrackClient: Send + Sync {
    /// All items of a playlist, in playlist order
    async fn list_playlist_items(&self, playlist_id: &str)
    -> Result<Vec<PlaylistItem>, ClientError>;

    /// Up to `limit` of a show's newest episodes, newest first.
    /// Episodes without a URI are dropped.
    async fn list_newest_episodes(
        &self,
        show_id: &str,
        limit: u32,
    ) -> Result<Vec<CandidateEpisode>, ClientError>;

    async fn add_to_playlist(&self, playlist_id: &str, uris: &[String])
    -> Result<(), ClientError>;

    /// Removing a URI that is not in the playlist succeeds. When a call fails
    /// after part of `uris` was removed, the error is
    /// [`ClientError::PartiallyApplied`] carrying that count.
    async fn remove_from_playlist(
        &self,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<(), ClientError>;

    /// Play state for the given episode ids. Unknown ids are omitted.
    async fn episode_progress(&self, ids: &[String]) -> Result<Vec<EpisodeProgress>, ClientError>;
}
