//! Project Configuration
//!
//! Connection settings for one Supabase project, baked in at build time.

use crate::error::Error;

/// Connection settings for one Supabase project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Project base URL, e.g. `https://abcdefgh.supabase.co`
    pub url: String,
    /// Public anon key, sent as the `apikey` header on every request
    pub anon_key: String,
}

impl Config {
    pub fn new(url: &str, anon_key: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        }
    }

    /// Read `SUPABASE_URL` / `SUPABASE_ANON_KEY` captured at compile time.
    ///
    /// A CSR bundle has no runtime environment, so the credentials have to be
    /// present when the crate is built.
    pub fn from_build_env() -> Result<Self, Error> {
        match (option_env!("SUPABASE_URL"), option_env!("SUPABASE_ANON_KEY")) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => Ok(Self::new(url, key)),
            _ => Err(Error::Config(
                "SUPABASE_URL and SUPABASE_ANON_KEY must be set when building".to_string(),
            )),
        }
    }

    pub(crate) fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }

    pub(crate) fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.url, path)
    }

    /// Realtime endpoint with the HTTP scheme swapped for its WebSocket twin.
    pub(crate) fn realtime_url(&self) -> String {
        let ws_base = self
            .url
            .replacen("https://", "wss://", 1)
            .replacen("http://", "ws://", 1);
        format!("{}/realtime/v1/websocket?apikey={}&vsn=1.0.0", ws_base, self.anon_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let config = Config::new("https://proj.supabase.co/", "anon");
        assert_eq!(config.rest_url("tasks"), "https://proj.supabase.co/rest/v1/tasks");
        assert_eq!(config.auth_url("signup"), "https://proj.supabase.co/auth/v1/signup");
    }

    #[test]
    fn test_realtime_url_swaps_scheme() {
        let config = Config::new("https://proj.supabase.co", "anon");
        assert_eq!(
            config.realtime_url(),
            "wss://proj.supabase.co/realtime/v1/websocket?apikey=anon&vsn=1.0.0"
        );

        let local = Config::new("http://localhost:54321", "anon");
        assert!(local.realtime_url().starts_with("ws://localhost:54321/"));
    }
}
