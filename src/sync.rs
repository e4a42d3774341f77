// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::HashSet;

use futures::StreamExt;
use serde::Serialize;

use crate::error::ClientError;
use crate::model::{CandidateEpisode, ShowConfig};
use crate::progress::{ProgressEvent, SharedProgressReporter};
use crate::snapshot::PlaylistSnapshot;
use crate::track_client::TrackClient;

/// Outcome of looking up one show's newest episodes
#[derive(Debug)]
pub struct ShowDiscovery {
    pub show: ShowConfig,
    /// Episodes missing from the playlist, newest first, or the lookup error
    pub missing: Result<Vec<CandidateEpisode>, ClientError>,
}

/// An episode that could not be added in this run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedEpisode {
    pub uri: String,
    pub name: String,
    pub error: String,
}

/// Per-show record of a sync run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowResult {
    pub show_id: String,
    pub show_name: String,
    /// False when the show lookup itself failed
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub episodes_added: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_episodes: Vec<FailedEpisode>,
}

/// Look up the newest episodes of a show and keep those not in the playlist
pub async fn discover_show<T: TrackClient>(
    client: &T,
    show: &ShowConfig,
    snapshot: &PlaylistSnapshot,
    limit: u32,
) -> Result<Vec<CandidateEpisode>, ClientError> {
    let episodes = client.list_newest_episodes(&show.id, limit).await?;

    Ok(episodes
        .into_iter()
        .filter(|episode| !episode.uri.is_empty() && !snapshot.contains_uri(&episode.uri))
        .collect())
}

/// Run [`discover_show`] for every show with bounded concurrency
///
/// Results come back in the order of `shows`. A failing lookup only affects
/// its own show.
pub async fn discover_shows<T: TrackClient>(
    client: &T,
    shows: &[ShowConfig],
    snapshot: &PlaylistSnapshot,
    limit: u32,
    concurrency: usize,
    reporter: &SharedProgressReporter,
) -> Vec<ShowDiscovery> {
    futures::stream::iter(shows)
        .map(|show| async move {
            reporter.report(ProgressEvent::CheckingShow {
                show_name: show.name.clone(),
            });

            let missing = discover_show(client, show, snapshot, limit).await;
            if let Err(e) = &missing {
                reporter.report(ProgressEvent::ShowFailed {
                    show_name: show.name.clone(),
                    error: e.to_string(),
                });
            }

            ShowDiscovery {
                show: show.clone(),
                missing,
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}

/// Add every discovered episode to the playlist, one at a time
///
/// Episodes are added in show order, then newest first within a show. A
/// failed add is recorded against its show and the next episode is tried.
/// A URI is added at most once per run even if several shows return it.
pub async fn admit_episodes<T: TrackClient>(
    client: &T,
    playlist_id: &str,
    discoveries: Vec<ShowDiscovery>,
    reporter: &SharedProgressReporter,
) -> Vec<ShowResult> {
    let mut admitted: HashSet<String> = HashSet::new();
    let mut results = Vec::with_capacity(discoveries.len());

    for ShowDiscovery { show, missing } in discoveries {
        let episodes = match missing {
            Ok(episodes) => episodes,
            Err(e) => {
                results.push(ShowResult {
                    show_id: show.id,
                    show_name: show.name,
                    success: false,
                    error: Some(e.to_string()),
                    episodes_added: 0,
                    failed_episodes: Vec::new(),
                });
                continue;
            }
        };

        let mut episodes_added = 0;
        let mut failed_episodes = Vec::new();

        for episode in episodes {
            if admitted.contains(&episode.uri) {
                continue;
            }

            match client
                .add_to_playlist(playlist_id, std::slice::from_ref(&episode.uri))
                .await
            {
                Ok(()) => {
                    reporter.report(ProgressEvent::EpisodeAdded {
                        show_name: show.name.clone(),
                        episode_name: episode.name.clone(),
                    });
                    admitted.insert(episode.uri);
                    episodes_added += 1;
                }
                Err(e) => {
                    reporter.report(ProgressEvent::EpisodeAddFailed {
                        show_name: show.name.clone(),
                        episode_name: episode.name.clone(),
                        error: e.to_string(),
                    });
                    failed_episodes.push(FailedEpisode {
                        uri: episode.uri,
                        name: episode.name,
                        error: e.to_string(),
                    });
                }
            }
        }

        results.push(ShowResult {
            show_id: show.id,
            show_name: show.name,
            success: true,
            error: None,
            episodes_added,
            failed_episodes,
        });
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;

    use crate::progress::NoopReporter;
    use crate::testing::{FakeTrackClient, days_ago, episode_item};

    fn show(id: &str) -> ShowConfig {
        ShowConfig {
            id: id.to_string(),
            name: format!("Show {id}"),
        }
    }

    async fn sync(client: &FakeTrackClient, shows: &[ShowConfig], limit: u32) -> Vec<ShowResult> {
        let items = client.list_playlist_items("playlist").await.unwrap();
        let snapshot = PlaylistSnapshot::from_items(items);
        let reporter = NoopReporter::shared();
        let discoveries = discover_shows(client, shows, &snapshot, limit, 2, &reporter).await;
        admit_episodes(client, "playlist", discoveries, &reporter).await
    }

    #[tokio::test]
    async fn adds_only_episodes_missing_from_playlist() {
        let now = Utc::now();
        let client = FakeTrackClient::new(vec![episode_item("E1", "X", days_ago(now, 1))])
            .with_episodes("X", &["E2", "E1"]);

        let results = sync(&client, &[show("X")], 2).await;

        assert_eq!(client.adds(), vec![vec!["E2".to_string()]]);
        assert_eq!(results[0].episodes_added, 1);
        assert!(results[0].success);
    }

    #[tokio::test]
    async fn second_run_adds_nothing() {
        let client = FakeTrackClient::new(vec![])
            .with_episodes("A", &["A1", "A2"])
            .with_episodes("B", &["B1"]);
        let shows = [show("A"), show("B")];

        let first = sync(&client, &shows, 2).await;
        let second = sync(&client, &shows, 2).await;

        let added = |results: &[ShowResult]| results.iter().map(|r| r.episodes_added).sum::<usize>();
        assert_eq!(added(&first), 3);
        assert_eq!(added(&second), 0);
        assert_eq!(client.adds().len(), 3);
    }

    #[tokio::test]
    async fn respects_per_show_limit() {
        let client = FakeTrackClient::new(vec![]).with_episodes("A", &["A3", "A2", "A1"]);

        let results = sync(&client, &[show("A")], 1).await;

        assert_eq!(results[0].episodes_added, 1);
        assert_eq!(client.playlist_uris(), vec!["A3".to_string()]);
    }

    #[tokio::test]
    async fn failing_show_does_not_block_others() {
        let client = FakeTrackClient::new(vec![])
            .with_episodes("A", &["A1"])
            .with_failing_show("B")
            .with_episodes("C", &["C1"]);

        let results = sync(&client, &[show("A"), show("B"), show("C")], 1).await;

        let ids: Vec<_> = results.iter().map(|r| r.show_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        assert!(results[0].success);
        assert!(!results[1].success);
        assert!(results[1].error.is_some());
        assert!(results[2].success);
        assert_eq!(
            client.playlist_uris(),
            vec!["A1".to_string(), "C1".to_string()]
        );
    }

    #[tokio::test]
    async fn failed_add_is_recorded_and_skipped() {
        let client = FakeTrackClient::new(vec![])
            .with_episodes("A", &["A2", "A1"])
            .with_failing_add("A2");

        let results = sync(&client, &[show("A")], 2).await;

        assert!(results[0].success);
        assert_eq!(results[0].episodes_added, 1);
        assert_eq!(results[0].failed_episodes.len(), 1);
        assert_eq!(results[0].failed_episodes[0].uri, "A2");
        assert_eq!(client.playlist_uris(), vec!["A1".to_string()]);
    }

    #[tokio::test]
    async fn episode_shared_by_two_shows_is_added_once() {
        let client = FakeTrackClient::new(vec![])
            .with_episodes("A", &["shared"])
            .with_episodes("B", &["shared"]);

        let results = sync(&client, &[show("A"), show("B")], 1).await;

        assert_eq!(results[0].episodes_added, 1);
        assert_eq!(results[1].episodes_added, 0);
        assert_eq!(client.adds().len(), 1);
    }

    #[tokio::test]
    async fn empty_lookup_is_a_success() {
        let client = FakeTrackClient::new(vec![]);

        let results = sync(&client, &[show("quiet")], 2).await;

        assert!(results[0].success);
        assert_eq!(results[0].episodes_added, 0);
        assert!(client.adds().is_empty());
    }

    #[test]
    fn show_result_serializes_camel_case() {
        let result = ShowResult {
            show_id: "X".to_string(),
            show_name: "Show X".to_string(),
            success: false,
            error: Some("boom".to_string()),
            episodes_added: 0,
            failed_episodes: vec![],
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["showId"], "X");
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "boom");
        assert!(json.get("failedEpisodes").is_none());
    }
}
