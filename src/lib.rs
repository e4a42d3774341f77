pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod job;
pub mod logging;
pub mod model;
pub mod progress;
pub mod retention;
pub mod snapshot;
pub mod spotify;
pub mod sync;
pub mod track_client;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use auth::{AccessToken, refresh_access_token};
pub use config::{Config, Credentials, HttpSettings, JobSettings};
pub use error::{AuthError, ClientError, ConfigError, ErrorKind, JobError};
pub use http::{HttpClient, HttpResponse, ReqwestClient, RetryPolicy, RetryingClient};
pub use job::{JobFailure, JobOutcome, execute, run_job};
pub use logging::{LogFormat, LoggingError, init_logging};
pub use model::{CandidateEpisode, PlaylistEntry, RetentionPolicy, ShowConfig};
pub use progress::{
    LogReporter, NoopReporter, ProgressEvent, ProgressReporter, SharedProgressReporter,
};
pub use retention::{PassReport, RetentionPass};
pub use snapshot::{PlaylistSnapshot, load_snapshot};
pub use spotify::SpotifyClient;
pub use sync::{FailedEpisode, ShowResult};
pub use track_client::TrackClient;
