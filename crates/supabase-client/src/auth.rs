//! Auth Surface
//!
//! GoTrue binding: password sign-in/sign-up, the GitHub OAuth redirect,
//! sign-out, and session persistence in `localStorage` so a page reload
//! restores the signed-in state. State-change listeners let the UI mirror
//! the session into its own reactive state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use gloo_net::http::Request;
use percent_encoding::utf8_percent_encode;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Error;
use crate::postgrest::QUERY_VALUE;

const STORAGE_KEY: &str = "taskhub-auth";

/// Tokens are treated as stale this long before their actual expiry, so a
/// request started right at the boundary still carries a valid token.
const EXPIRY_MARGIN_SECS: i64 = 30;

/// Access-token lifetime to assume when the token endpoint omits both
/// `expires_at` and `expires_in` (GoTrue's default is one hour).
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Signed-in identity as reported by GoTrue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// One signed-in session, mirrored into local view state by the session gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds after which `access_token` is no longer valid
    pub expires_at: i64,
    pub user: User,
}

impl Session {
    pub fn is_expired(&self, now_secs: i64) -> bool {
        self.expires_at <= now_secs + EXPIRY_MARGIN_SECS
    }
}

/// Session lifecycle notifications delivered to state-change listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// Result of a sign-up request. Deployments with email confirmation enabled
/// answer with a user but no tokens; auto-confirm deployments sign straight in.
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    SignedIn(Session),
    ConfirmationRequired,
}

/// Third-party identity providers offered by the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Github,
}

impl OAuthProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            OAuthProvider::Github => "github",
        }
    }
}

type Listener = Arc<dyn Fn(AuthEvent, Option<Session>) + Send + Sync>;

#[derive(Default)]
struct AuthState {
    session: Option<Session>,
    listeners: Vec<(u64, Listener)>,
    next_listener_id: u64,
}

/// Registration handle returned by [`Auth::on_auth_state_change`]
pub struct AuthSubscription {
    id: u64,
    state: Arc<Mutex<AuthState>>,
}

impl AuthSubscription {
    pub fn unsubscribe(self) {
        lock(&self.state).listeners.retain(|(id, _)| *id != self.id);
    }
}

/// Auth handle, shared by cloning the owning [`crate::Supabase`]
#[derive(Clone)]
pub struct Auth {
    config: Config,
    state: Arc<Mutex<AuthState>>,
}

impl Auth {
    pub(crate) fn new(config: Config) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(AuthState::default())),
        }
    }

    /// Session currently held in memory, if any.
    pub fn current_session(&self) -> Option<Session> {
        lock(&self.state).session.clone()
    }

    /// Token for `Authorization: Bearer` headers; the anon key stands in
    /// while nobody is signed in, as the hosted SDK does.
    pub(crate) fn bearer_token(&self) -> String {
        lock(&self.state)
            .session
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.config.anon_key.clone())
    }

    pub(crate) fn access_token(&self) -> Option<String> {
        lock(&self.state).session.as_ref().map(|s| s.access_token.clone())
    }

    /// Restore the persisted session, refreshing an expired token once.
    /// Resolves to `None` when there is nothing to restore; no retry.
    pub async fn restore_session(&self) -> Option<Session> {
        if let Some(session) = self.current_session() {
            if !session.is_expired(now_secs()) {
                return Some(session);
            }
        }
        let stored = read_stored_session()?;
        if stored.is_expired(now_secs()) {
            match self.refresh(&stored.refresh_token).await {
                Ok(session) => Some(session),
                Err(err) => {
                    log::warn!("session refresh failed: {}", err.message());
                    clear_stored_session();
                    None
                }
            }
        } else {
            lock(&self.state).session = Some(stored.clone());
            Some(stored)
        }
    }

    /// Register a new account. See [`SignUpOutcome`] for the two success shapes.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, Error> {
        let body = self
            .post_auth("signup", &Credentials { email, password }, None)
            .await?;
        let outcome = sign_up_outcome_from_json(&body, now_secs())?;
        if let SignUpOutcome::SignedIn(session) = &outcome {
            self.apply_session(session.clone(), AuthEvent::SignedIn);
        }
        Ok(outcome)
    }

    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, Error> {
        let body = self
            .post_auth("token?grant_type=password", &Credentials { email, password }, None)
            .await?;
        let session = session_from_token_json(&body, now_secs())?;
        self.apply_session(session.clone(), AuthEvent::SignedIn);
        Ok(session)
    }

    /// Kick off the OAuth redirect flow. On success the browser navigates
    /// away and comes back to `redirect_to` with tokens in the fragment.
    pub fn sign_in_with_oauth(&self, provider: OAuthProvider, redirect_to: &str) -> Result<(), Error> {
        let url = authorize_url(&self.config, provider, redirect_to);
        let window = web_sys::window()
            .ok_or_else(|| Error::Config("no browser window to redirect".to_string()))?;
        window
            .location()
            .assign(&url)
            .map_err(|_| Error::Network("browser refused the redirect".to_string()))
    }

    /// Revoke the session backend-side (best effort), then clear local state
    /// and notify listeners. The session gate flips back to the auth view.
    pub async fn sign_out(&self) {
        let previous = lock(&self.state).session.take();
        if let Some(session) = &previous {
            let result = Request::post(&self.config.auth_url("logout"))
                .header("apikey", &self.config.anon_key)
                .header("Authorization", &format!("Bearer {}", session.access_token))
                .send()
                .await;
            match result {
                Ok(response) if !(200..300).contains(&response.status()) => {
                    log::warn!("sign-out revoke answered {}", response.status());
                }
                Err(err) => log::warn!("sign-out revoke failed: {err}"),
                Ok(_) => {}
            }
        }
        clear_stored_session();
        self.emit(AuthEvent::SignedOut, None);
    }

    /// Register a listener for session-change events. The callback fires
    /// synchronously when a sign-in, sign-out, or refresh lands.
    pub fn on_auth_state_change(
        &self,
        callback: impl Fn(AuthEvent, Option<Session>) + Send + Sync + 'static,
    ) -> AuthSubscription {
        let mut state = lock(&self.state);
        let id = state.next_listener_id;
        state.next_listener_id += 1;
        state.listeners.push((id, Arc::new(callback)));
        AuthSubscription {
            id,
            state: Arc::clone(&self.state),
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, Error> {
        let body = self
            .post_auth(
                "token?grant_type=refresh_token",
                &RefreshRequest { refresh_token },
                None,
            )
            .await?;
        let session = session_from_token_json(&body, now_secs())?;
        self.apply_session(session.clone(), AuthEvent::TokenRefreshed);
        Ok(session)
    }

    fn apply_session(&self, session: Session, event: AuthEvent) {
        lock(&self.state).session = Some(session.clone());
        persist_session(&session);
        self.emit(event, Some(session));
    }

    pub(crate) fn emit(&self, event: AuthEvent, session: Option<Session>) {
        // Listeners are invoked outside the lock; they may re-enter the auth
        // handle (e.g. to read the current session).
        let listeners: Vec<Listener> = lock(&self.state)
            .listeners
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(event, session.clone());
        }
    }

    async fn post_auth<T: Serialize>(
        &self,
        path_and_query: &str,
        payload: &T,
        bearer: Option<&str>,
    ) -> Result<String, Error> {
        let mut request = Request::post(&self.config.auth_url(path_and_query))
            .header("apikey", &self.config.anon_key);
        if let Some(token) = bearer {
            request = request.header("Authorization", &format!("Bearer {token}"));
        }
        let response = request.json(payload)?.send().await?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !(200..300).contains(&status) {
            return Err(Error::from_response(status, &text));
        }
        Ok(text)
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: User,
}

pub(crate) fn session_from_token_json(body: &str, now_secs: i64) -> Result<Session, Error> {
    let token: TokenResponse = serde_json::from_str(body).map_err(|e| Error::Decode(e.to_string()))?;
    let expires_at = token
        .expires_at
        .unwrap_or_else(|| now_secs + token.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS));
    Ok(Session {
        access_token: token.access_token,
        refresh_token: token.refresh_token,
        expires_at,
        user: token.user,
    })
}

pub(crate) fn sign_up_outcome_from_json(body: &str, now_secs: i64) -> Result<SignUpOutcome, Error> {
    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| Error::Decode(e.to_string()))?;
    if value.get("access_token").is_some() {
        Ok(SignUpOutcome::SignedIn(session_from_token_json(body, now_secs)?))
    } else {
        Ok(SignUpOutcome::ConfirmationRequired)
    }
}

pub(crate) fn authorize_url(config: &Config, provider: OAuthProvider, redirect_to: &str) -> String {
    format!(
        "{}?provider={}&redirect_to={}",
        config.auth_url("authorize"),
        provider.as_str(),
        utf8_percent_encode(redirect_to, QUERY_VALUE)
    )
}

fn lock(state: &Mutex<AuthState>) -> MutexGuard<'_, AuthState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn now_secs() -> i64 {
    (js_sys::Date::now() / 1000.0) as i64
}

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

fn read_stored_session() -> Option<Session> {
    let raw = local_storage()?.get_item(STORAGE_KEY).ok().flatten()?;
    serde_json::from_str(&raw).ok()
}

fn persist_session(session: &Session) {
    if let (Some(storage), Ok(raw)) = (local_storage(), serde_json::to_string(session)) {
        let _ = storage.set_item(STORAGE_KEY, &raw);
    }
}

fn clear_stored_session() {
    if let Some(storage) = local_storage() {
        let _ = storage.remove_item(STORAGE_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_body(expires: &str) -> String {
        format!(
            r#"{{"access_token":"at-1","refresh_token":"rt-1",{expires},"user":{{"id":"user-1","email":"a@b.c"}}}}"#
        )
    }

    #[test]
    fn test_session_from_expires_in() {
        let session = session_from_token_json(&token_body(r#""expires_in":3600"#), 1_000).expect("parse");
        assert_eq!(session.expires_at, 4_600);
        assert_eq!(session.user.id, "user-1");
    }

    #[test]
    fn test_session_prefers_explicit_expires_at() {
        let body = token_body(r#""expires_in":3600,"expires_at":9999"#);
        let session = session_from_token_json(&body, 1_000).expect("parse");
        assert_eq!(session.expires_at, 9_999);
    }

    #[test]
    fn test_expiry_includes_margin() {
        let session = session_from_token_json(&token_body(r#""expires_in":3600"#), 0).expect("parse");
        assert!(!session.is_expired(3_569));
        assert!(session.is_expired(3_570));
    }

    #[test]
    fn test_sign_up_without_tokens_needs_confirmation() {
        let body = r#"{"id":"user-1","email":"a@b.c","confirmation_sent_at":"2024-01-01T00:00:00Z"}"#;
        match sign_up_outcome_from_json(body, 0).expect("parse") {
            SignUpOutcome::ConfirmationRequired => {}
            other => panic!("expected ConfirmationRequired, got {other:?}"),
        }
    }

    #[test]
    fn test_sign_up_with_tokens_signs_in() {
        let body = token_body(r#""expires_in":60"#);
        assert!(matches!(
            sign_up_outcome_from_json(&body, 0).expect("parse"),
            SignUpOutcome::SignedIn(_)
        ));
    }

    #[test]
    fn test_listeners_fire_until_unsubscribed() {
        let auth = Auth::new(Config::new("https://proj.supabase.co", "anon"));
        let seen: Arc<Mutex<Vec<AuthEvent>>> = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let subscription = auth.on_auth_state_change(move |event, _| {
            sink.lock().expect("sink lock").push(event);
        });

        auth.emit(AuthEvent::SignedOut, None);
        assert_eq!(seen.lock().expect("sink lock").as_slice(), &[AuthEvent::SignedOut]);

        subscription.unsubscribe();
        auth.emit(AuthEvent::SignedOut, None);
        assert_eq!(seen.lock().expect("sink lock").len(), 1);
    }

    #[test]
    fn test_authorize_url_encodes_redirect() {
        let config = Config::new("https://proj.supabase.co", "anon");
        let url = authorize_url(&config, OAuthProvider::Github, "http://localhost:8080/app?tab=1");
        assert!(url.starts_with("https://proj.supabase.co/auth/v1/authorize?provider=github&redirect_to="));
        assert!(url.contains("http%3A%2F%2Flocalhost%3A8080%2Fapp%3Ftab%3D1"));
    }
}
