//! TaskHub Frontend App
//!
//! Top-level session gate: the auth form until a session exists, the
//! signed-in dashboard afterwards. The gate mirrors the client's session
//! state into a signal via a state-change listener.

use leptos::prelude::*;
use leptos::task::spawn_local;

use supabase_client::{Config, Session, Supabase};

use crate::components::{AuthForm, Dashboard};

#[component]
pub fn App() -> impl IntoView {
    let config = match Config::from_build_env() {
        Ok(config) => config,
        Err(err) => {
            return view! {
                <div class="app">
                    <div class="error">{err.message()}</div>
                </div>
            }
            .into_any();
        }
    };
    let supabase = Supabase::new(config);
    provide_context(supabase.clone());

    let (session, set_session) = signal(None::<Session>);

    // Keep the gate in sync with sign-in/sign-out/refresh events. The
    // listener replaces the local session synchronously when one fires.
    let subscription = supabase
        .auth()
        .on_auth_state_change(move |_event, new_session| {
            set_session.set(new_session);
        });
    on_cleanup(move || subscription.unsubscribe());

    // Restore a persisted session on startup; failure just leaves the auth
    // form showing.
    let restore_client = supabase.clone();
    Effect::new(move |_| {
        let supabase = restore_client.clone();
        spawn_local(async move {
            if let Some(restored) = supabase.auth().restore_session().await {
                web_sys::console::log_1(
                    &format!("[SESSION] Restored session for {}", restored.user.id).into(),
                );
                set_session.try_set(Some(restored));
            }
        });
    });

    // The dashboard is keyed by the user id, not the whole session, so a
    // token refresh does not remount the signed-in view.
    let current_user = Memo::new(move |_| session.get().map(|s| s.user.id));

    view! {
        <div class="app">
            <div class="header">
                <div>
                    <h1 class="h1">"TaskHub"</h1>
                    <p class="sub">"Tasks, synced through Supabase"</p>
                </div>
            </div>

            {move || match current_user.get() {
                None => view! { <AuthForm /> }.into_any(),
                Some(user_id) => view! { <Dashboard user_id=user_id /> }.into_any(),
            }}
        </div>
    }
    .into_any()
}
