// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cleanup policies applied to the playlist snapshot
//!
//! Each pass selects entries from the snapshot taken at the start of the
//! run, so episodes added during the run are never removed by it. Passes do
//! not see each other's removals: an entry can be selected by more than one
//! pass, and the second removal is a no-op on the remote side.

mod age;
mod cap;
mod completed;

use std::fmt;

use serde::Serialize;

pub use age::{expire_old_entries, select_expired};
pub use cap::{ShowExcess, cap_entries_per_show, select_over_cap};
pub use completed::{purge_completed, select_completed};

use crate::error::ClientError;
use crate::model::PlaylistEntry;
use crate::track_client::TrackClient;

/// The three cleanup passes, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RetentionPass {
    AgeExpiry,
    PerShowCap,
    CompletedPurge,
}

impl fmt::Display for RetentionPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RetentionPass::AgeExpiry => "age expiry",
            RetentionPass::PerShowCap => "per-show cap",
            RetentionPass::CompletedPurge => "completed purge",
        };
        f.write_str(name)
    }
}

/// Result of one cleanup pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub pass: RetentionPass,
    pub success: bool,
    /// Entries whose removal call succeeded
    pub removed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PassReport {
    fn completed(pass: RetentionPass, removed: usize) -> Self {
        Self {
            pass,
            success: true,
            removed,
            error: None,
        }
    }

    fn failed(pass: RetentionPass, removed: usize, error: String) -> Self {
        Self {
            pass,
            success: false,
            removed,
            error: Some(error),
        }
    }
}

/// Remove the given entries in a single call. No call is made for an empty selection.
///
/// On failure, [`ClientError::applied`] tells how many entries are already gone.
async fn remove_entries<T: TrackClient>(
    client: &T,
    playlist_id: &str,
    entries: &[&PlaylistEntry],
) -> Result<usize, ClientError> {
    if entries.is_empty() {
        return Ok(0);
    }

    let uris: Vec<String> = entries.iter().map(|entry| entry.uri.clone()).collect();
    client.remove_from_playlist(playlist_id, &uris).await?;
    Ok(uris.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_report_serializes_pass_name() {
        let report = PassReport::failed(RetentionPass::PerShowCap, 2, "boom".to_string());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["pass"], "perShowCap");
        assert_eq!(json["success"], false);
        assert_eq!(json["removed"], 2);
        assert_eq!(json["error"], "boom");
    }

    #[test]
    fn completed_report_omits_error() {
        let report = PassReport::completed(RetentionPass::AgeExpiry, 0);

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(RetentionPass::AgeExpiry.to_string(), "age expiry");
    }
}
