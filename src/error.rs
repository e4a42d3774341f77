use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Coarse classification of every failure the job can surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    ConfigError,
    AuthError,
    TransportError,
    MalformedResponse,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::ConfigError => "ConfigError",
            ErrorKind::AuthError => "AuthError",
            ErrorKind::TransportError => "TransportError",
            ErrorKind::MalformedResponse => "MalformedResponse",
        };
        f.write_str(name)
    }
}

/// Errors raised while reading the job configuration from the environment
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required setting {var}")]
    Missing { var: &'static str },

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("Failed to read show list file {path}: {source}")]
    ShowsFileReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse show list: {0}")]
    ShowsParseFailed(#[source] serde_json::Error),
}

/// Errors raised while exchanging the refresh token for an access token
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Token request to {url} failed: {source}")]
    RequestFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Token endpoint rejected the refresh token (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Failed to parse token response: {0}")]
    MalformedTokenResponse(#[source] serde_json::Error),
}

/// Errors raised by a single call against the remote playlist service
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} for {url}: {message}")]
    HttpStatus {
        url: String,
        status: u16,
        message: String,
    },

    #[error("Malformed response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },

    /// A batched mutation failed after some of its batches went through
    #[error("{applied} item(s) applied before failure: {source}")]
    PartiallyApplied {
        applied: usize,
        #[source]
        source: Box<ClientError>,
    },
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Transport { .. } | ClientError::HttpStatus { .. } => {
                ErrorKind::TransportError
            }
            ClientError::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            ClientError::PartiallyApplied { source, .. } => source.kind(),
        }
    }

    /// Items the remote side accepted before the call failed
    pub fn applied(&self) -> usize {
        match self {
            ClientError::PartiallyApplied { applied, .. } => *applied,
            _ => 0,
        }
    }
}

/// Fatal errors that abort a run before any cleanup happens
#[derive(Error, Debug)]
pub enum JobError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Failed to load playlist {playlist_id}: {source}")]
    Snapshot {
        playlist_id: String,
        #[source]
        source: ClientError,
    },
}

impl JobError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            JobError::Config(_) => ErrorKind::ConfigError,
            JobError::Auth(_) => ErrorKind::AuthError,
            JobError::Snapshot { source, .. } => source.kind(),
        }
    }
}
