//! Supabase Client
//!
//! Thin WASM binding to the three hosted surfaces this app consumes:
//! GoTrue auth, PostgREST table CRUD, and the realtime change feed.
//! Identity, persistence, query execution, and row-level security all stay
//! backend-side; this crate only moves typed requests and responses.

mod auth;
mod config;
mod error;
mod postgrest;
mod realtime;

pub use auth::{Auth, AuthEvent, AuthSubscription, OAuthProvider, Session, SignUpOutcome, User};
pub use config::Config;
pub use error::{Error, FALLBACK_MESSAGE};
pub use postgrest::{Order, TableQuery};
pub use realtime::{ChannelHandle, PostgresChanges};

/// Handle to one Supabase project.
///
/// Constructed once at application start and passed down explicitly (Leptos
/// context in the UI); cloning shares the same auth state.
#[derive(Clone)]
pub struct Supabase {
    config: Config,
    auth: Auth,
}

impl Supabase {
    pub fn new(config: Config) -> Self {
        let auth = Auth::new(config.clone());
        Self { config, auth }
    }

    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// Start a query against `table`, authorized as the current session
    /// (or the anon key when signed out).
    pub fn from(&self, table: &str) -> TableQuery {
        TableQuery::new(self.config.clone(), self.auth.bearer_token(), table)
    }

    /// Open a change-feed channel; every matching row change invokes
    /// `on_change`. Tear down with [`ChannelHandle::unsubscribe`].
    pub fn subscribe_changes(
        &self,
        channel_name: &str,
        changes: PostgresChanges,
        on_change: impl Fn() + 'static,
    ) -> Result<ChannelHandle, Error> {
        realtime::subscribe(
            &self.config,
            channel_name,
            changes,
            self.auth.access_token(),
            on_change,
        )
    }
}
