// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::model::{RetentionPolicy, ShowConfig};

pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

const DEFAULT_DISCOVERY_CONCURRENCY: usize = 4;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_HTTP_MAX_RETRIES: u32 = 3;
/// Largest page the show episode listing accepts
const MAX_NEW_EPISODES_PER_SHOW: u32 = 50;

/// OAuth client credentials and the long-lived refresh token
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub token_url: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("token_url", &self.token_url)
            .finish()
    }
}

/// Everything the sync engine needs for one run
#[derive(Debug, Clone)]
pub struct JobSettings {
    pub playlist_id: String,
    pub shows: Vec<ShowConfig>,
    pub retention: RetentionPolicy,
    /// Maximum number of show lookups in flight
    pub discovery_concurrency: usize,
}

/// Transport limits applied to every remote call
#[derive(Debug, Clone, Copy)]
pub struct HttpSettings {
    pub timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
}

/// Complete job configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub job: JobSettings,
    pub http: HttpSettings,
    pub api_base: String,
    /// Market code passed to show and episode lookups
    pub market: Option<String>,
}

impl Config {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name to its value
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let credentials = Credentials {
            client_id: env.required("SPOTIFY_CLIENT_ID")?,
            client_secret: env.required("SPOTIFY_CLIENT_SECRET")?,
            refresh_token: env.required("SPOTIFY_REFRESH_TOKEN")?,
            token_url: env
                .optional("SPOTIFY_TOKEN_URL")
                .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
        };

        let new_episodes_per_show: u32 = env.required_parsed("NEW_EPISODES_PER_SHOW")?;
        if !(1..=MAX_NEW_EPISODES_PER_SHOW).contains(&new_episodes_per_show) {
            return Err(ConfigError::Invalid {
                var: "NEW_EPISODES_PER_SHOW",
                reason: format!("must be between 1 and {MAX_NEW_EPISODES_PER_SHOW}"),
            });
        }

        let retention = RetentionPolicy {
            max_age_days: env.required_parsed("MAX_AGE_DAYS")?,
            max_per_show: env.required_parsed("MAX_PER_SHOW")?,
            new_episodes_per_show,
        };

        let discovery_concurrency = env
            .optional_parsed("DISCOVERY_CONCURRENCY")?
            .unwrap_or(DEFAULT_DISCOVERY_CONCURRENCY);
        if discovery_concurrency == 0 {
            return Err(ConfigError::Invalid {
                var: "DISCOVERY_CONCURRENCY",
                reason: "must be at least 1".to_string(),
            });
        }

        let job = JobSettings {
            playlist_id: env.required("PLAYLIST_ID")?,
            shows: load_shows(&env)?,
            retention,
            discovery_concurrency,
        };

        let timeout_secs = env
            .optional_parsed("HTTP_TIMEOUT_SECS")?
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "HTTP_TIMEOUT_SECS",
                reason: "must be at least 1".to_string(),
            });
        }

        let http = HttpSettings {
            timeout: Duration::from_secs(timeout_secs),
            max_retries: env
                .optional_parsed("HTTP_MAX_RETRIES")?
                .unwrap_or(DEFAULT_HTTP_MAX_RETRIES),
        };

        Ok(Self {
            credentials,
            job,
            http,
            api_base: env
                .optional("SPOTIFY_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            market: env.optional("SPOTIFY_MARKET"),
        })
    }
}

struct Env<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Trimmed value; blank counts as unset
    fn optional(&self, var: &'static str) -> Option<String> {
        (self.lookup)(var)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, var: &'static str) -> Result<String, ConfigError> {
        self.optional(var).ok_or(ConfigError::Missing { var })
    }

    fn optional_parsed<T>(&self, var: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.optional(var)
            .map(|value| {
                value.parse().map_err(|e: T::Err| ConfigError::Invalid {
                    var,
                    reason: format!("'{value}': {e}"),
                })
            })
            .transpose()
    }

    fn required_parsed<T>(&self, var: &'static str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.optional_parsed(var)?
            .ok_or(ConfigError::Missing { var })
    }
}

/// Read the show list from `SHOWS` (inline JSON) or `SHOWS_FILE` (path to JSON)
fn load_shows<F: Fn(&str) -> Option<String>>(env: &Env<F>) -> Result<Vec<ShowConfig>, ConfigError> {
    let json = match (env.optional("SHOWS"), env.optional("SHOWS_FILE")) {
        (Some(_), Some(_)) => {
            return Err(ConfigError::Invalid {
                var: "SHOWS_FILE",
                reason: "set either SHOWS or SHOWS_FILE, not both".to_string(),
            });
        }
        (Some(inline), None) => inline,
        (None, Some(path)) => {
            let path = PathBuf::from(path);
            std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ShowsFileReadFailed { path, source: e })?
        }
        (None, None) => return Err(ConfigError::Missing { var: "SHOWS" }),
    };

    let shows: Vec<ShowConfig> =
        serde_json::from_str(&json).map_err(ConfigError::ShowsParseFailed)?;
    validate_shows(&shows)?;
    Ok(shows)
}

fn validate_shows(shows: &[ShowConfig]) -> Result<(), ConfigError> {
    if shows.is_empty() {
        return Err(ConfigError::Invalid {
            var: "SHOWS",
            reason: "at least one show is required".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for show in shows {
        if show.id.trim().is_empty() {
            return Err(ConfigError::Invalid {
                var: "SHOWS",
                reason: format!("show '{}' has an empty id", show.name),
            });
        }
        if !seen.insert(show.id.as_str()) {
            return Err(ConfigError::Invalid {
                var: "SHOWS",
                reason: format!("show id '{}' is listed twice", show.id),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use tempfile::tempdir;

    const SHOWS_JSON: &str = r#"[
        {"id": "4rOoJ6Egrf8K2IrywzwOMk", "name": "The Daily Show"},
        {"showId": "2mTUnDkuKUkhiueKcVWoP0", "displayName": "Up First"}
    ]"#;

    fn base_env() -> HashMap<&'static str, String> {
        HashMap::from([
            ("SPOTIFY_CLIENT_ID", "client".to_string()),
            ("SPOTIFY_CLIENT_SECRET", "secret".to_string()),
            ("SPOTIFY_REFRESH_TOKEN", "refresh".to_string()),
            ("PLAYLIST_ID", "37i9dQZF1DXcBWIGoYBM5M".to_string()),
            ("SHOWS", SHOWS_JSON.to_string()),
            ("MAX_AGE_DAYS", "30".to_string()),
            ("MAX_PER_SHOW", "3".to_string()),
            ("NEW_EPISODES_PER_SHOW", "2".to_string()),
        ])
    }

    fn load(env: &HashMap<&'static str, String>) -> Result<Config, ConfigError> {
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn loads_complete_configuration() {
        let config = load(&base_env()).unwrap();

        assert_eq!(config.job.playlist_id, "37i9dQZF1DXcBWIGoYBM5M");
        assert_eq!(config.job.shows.len(), 2);
        assert_eq!(config.job.shows[1].id, "2mTUnDkuKUkhiueKcVWoP0");
        assert_eq!(config.job.shows[1].name, "Up First");
        assert_eq!(
            config.job.retention,
            RetentionPolicy {
                max_age_days: 30,
                max_per_show: 3,
                new_episodes_per_show: 2,
            }
        );
        assert_eq!(config.job.discovery_concurrency, 4);
        assert_eq!(config.http.timeout, Duration::from_secs(30));
        assert_eq!(config.http.max_retries, 3);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.credentials.token_url, DEFAULT_TOKEN_URL);
        assert!(config.market.is_none());
    }

    #[test]
    fn missing_required_setting_is_named() {
        for var in [
            "SPOTIFY_CLIENT_ID",
            "SPOTIFY_REFRESH_TOKEN",
            "PLAYLIST_ID",
            "MAX_AGE_DAYS",
            "MAX_PER_SHOW",
            "NEW_EPISODES_PER_SHOW",
        ] {
            let mut env = base_env();
            env.remove(var);

            match load(&env) {
                Err(ConfigError::Missing { var: missing }) => assert_eq!(missing, var),
                other => panic!("expected missing {var}, got {other:?}"),
            }
        }
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let mut env = base_env();
        env.insert("PLAYLIST_ID", "   ".to_string());

        assert!(matches!(
            load(&env),
            Err(ConfigError::Missing { var: "PLAYLIST_ID" })
        ));
    }

    #[test]
    fn unparsable_number_is_invalid() {
        let mut env = base_env();
        env.insert("MAX_AGE_DAYS", "thirty".to_string());

        assert!(matches!(
            load(&env),
            Err(ConfigError::Invalid {
                var: "MAX_AGE_DAYS",
                ..
            })
        ));
    }

    #[test]
    fn new_episode_limit_is_bounded() {
        for value in ["0", "51"] {
            let mut env = base_env();
            env.insert("NEW_EPISODES_PER_SHOW", value.to_string());

            assert!(matches!(
                load(&env),
                Err(ConfigError::Invalid {
                    var: "NEW_EPISODES_PER_SHOW",
                    ..
                })
            ));
        }
    }

    #[test]
    fn optional_settings_override_defaults() {
        let mut env = base_env();
        env.insert("DISCOVERY_CONCURRENCY", "8".to_string());
        env.insert("HTTP_TIMEOUT_SECS", "5".to_string());
        env.insert("HTTP_MAX_RETRIES", "0".to_string());
        env.insert("SPOTIFY_MARKET", "DE".to_string());
        env.insert("SPOTIFY_API_BASE", "http://localhost:9000/v1/".to_string());

        let config = load(&env).unwrap();

        assert_eq!(config.job.discovery_concurrency, 8);
        assert_eq!(config.http.timeout, Duration::from_secs(5));
        assert_eq!(config.http.max_retries, 0);
        assert_eq!(config.market.as_deref(), Some("DE"));
        assert_eq!(config.api_base, "http://localhost:9000/v1");
    }

    #[test]
    fn shows_can_come_from_a_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shows.json");
        std::fs::write(&path, SHOWS_JSON).unwrap();

        let mut env = base_env();
        env.remove("SHOWS");
        env.insert("SHOWS_FILE", path.display().to_string());

        let config = load(&env).unwrap();
        assert_eq!(config.job.shows[0].name, "The Daily Show");
    }

    #[test]
    fn unreadable_shows_file_is_reported() {
        let dir = tempdir().unwrap();

        let mut env = base_env();
        env.remove("SHOWS");
        env.insert(
            "SHOWS_FILE",
            dir.path().join("missing.json").display().to_string(),
        );

        assert!(matches!(
            load(&env),
            Err(ConfigError::ShowsFileReadFailed { .. })
        ));
    }

    #[test]
    fn both_show_sources_are_rejected() {
        let mut env = base_env();
        env.insert("SHOWS_FILE", "/tmp/shows.json".to_string());

        assert!(matches!(
            load(&env),
            Err(ConfigError::Invalid {
                var: "SHOWS_FILE",
                ..
            })
        ));
    }

    #[test]
    fn invalid_show_lists_are_rejected() {
        for shows in [
            "[]",
            r#"[{"id": "", "name": "Blank"}]"#,
            r#"[{"id": "a", "name": "One"}, {"id": "a", "name": "Two"}]"#,
        ] {
            let mut env = base_env();
            env.insert("SHOWS", shows.to_string());

            assert!(
                matches!(load(&env), Err(ConfigError::Invalid { var: "SHOWS", .. })),
                "accepted {shows}"
            );
        }

        let mut env = base_env();
        env.insert("SHOWS", "not json".to_string());
        assert!(matches!(load(&env), Err(ConfigError::ShowsParseFailed(_))));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = load(&base_env()).unwrap();
        let debug = format!("{:?}", config.credentials);

        assert!(debug.contains("client"));
        assert!(!debug.contains("secret\""));
        assert!(!debug.contains("\"refresh\""));
        assert!(debug.contains("<redacted>"));
    }
}
