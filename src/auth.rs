// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Credentials;
use crate::error::AuthError;
use crate::http::{HttpClient, HttpRequest};

/// Short-lived bearer token for the playlist service
#[derive(Clone)]
pub struct AccessToken {
    token: String,
    /// Lifetime in seconds as reported by the token endpoint
    pub expires_in: u64,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_in: u64) -> Self {
        Self {
            token: token.into(),
            expires_in,
        }
    }

    pub fn secret(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

/// Exchange the configured refresh token for a fresh access token
pub async fn refresh_access_token<C: HttpClient>(
    client: &C,
    credentials: &Credentials,
) -> Result<AccessToken, AuthError> {
    let request = HttpRequest::post(&credentials.token_url).form(&[
        ("grant_type", "refresh_token"),
        ("refresh_token", credentials.refresh_token.as_str()),
        ("client_id", credentials.client_id.as_str()),
        ("client_secret", credentials.client_secret.as_str()),
    ]);

    debug!(url = %credentials.token_url, "Refreshing access token");

    let response = client
        .execute(request)
        .await
        .map_err(|e| AuthError::RequestFailed {
            url: credentials.token_url.clone(),
            source: e,
        })?;

    if !response.is_success() {
        let message = response.text();
        warn!(status = response.status, error = %message, "Token refresh rejected");
        return Err(AuthError::Rejected {
            status: response.status,
            message,
        });
    }

    let token: TokenResponse =
        serde_json::from_slice(&response.body).map_err(AuthError::MalformedTokenResponse)?;

    debug!(expires_in = token.expires_in, "Access token refreshed");

    Ok(AccessToken::new(token.access_token, token.expires_in))
}
