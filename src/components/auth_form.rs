//! Auth Form Component
//!
//! Email/password sign-in and sign-up with a mode toggle, plus the GitHub
//! OAuth redirect. All real credential validation is backend-side; failures
//! surface here as the backend's message text.

use leptos::prelude::*;
use leptos::task::spawn_local;
use wasm_bindgen::JsCast;

use supabase_client::{OAuthProvider, SignUpOutcome, Supabase};

#[derive(Clone, Copy, PartialEq, Eq)]
enum AuthMode {
    Login,
    Signup,
}

#[component]
pub fn AuthForm() -> impl IntoView {
    let supabase = expect_context::<Supabase>();

    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (mode, set_mode) = signal(AuthMode::Login);
    let (loading, set_loading) = signal(false);
    let (error, set_error) = signal(String::new());
    let (notice, set_notice) = signal(String::new());

    let submit_client = supabase.clone();
    let submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        set_error.set(String::new());
        set_notice.set(String::new());
        set_loading.set(true);

        let supabase = submit_client.clone();
        let email_value = email.get_untracked();
        let password_value = password.get_untracked();
        let current_mode = mode.get_untracked();

        // Writes after the await points use the try_ setters: a successful
        // sign-in swaps this view out while the task is still finishing.
        spawn_local(async move {
            match current_mode {
                AuthMode::Signup => {
                    match supabase.auth().sign_up(&email_value, &password_value).await {
                        Ok(SignUpOutcome::ConfirmationRequired) => {
                            set_notice.try_set(
                                "Account created. If email confirmation is on, confirm the mail, then log in."
                                    .to_string(),
                            );
                        }
                        // The gate switches to the dashboard via its listener
                        Ok(SignUpOutcome::SignedIn(_)) => {}
                        Err(err) => {
                            set_error.try_set(err.message());
                        }
                    }
                }
                AuthMode::Login => {
                    if let Err(err) = supabase
                        .auth()
                        .sign_in_with_password(&email_value, &password_value)
                        .await
                    {
                        set_error.try_set(err.message());
                    }
                }
            }
            // Cleared on success and failure alike
            set_loading.try_set(false);
        });
    };

    let github_client = supabase.clone();
    let login_with_github = move |_| {
        set_error.set(String::new());
        let origin = web_sys::window()
            .and_then(|w| w.location().origin().ok())
            .unwrap_or_default();
        if let Err(err) = github_client
            .auth()
            .sign_in_with_oauth(OAuthProvider::Github, &origin)
        {
            set_error.set(err.message());
        }
    };

    view! {
        <div class="card">
            <h2 class="card-title">
                {move || if mode.get() == AuthMode::Login { "Login" } else { "Sign up" }}
            </h2>

            <form class="form-grid" on:submit=submit>
                <label class="label">
                    "Email"
                    <input
                        class="input"
                        type="email"
                        required
                        autocomplete="email"
                        prop:value=move || email.get()
                        on:input=move |ev| {
                            let target = ev.target().unwrap();
                            let input = target.dyn_ref::<web_sys::HtmlInputElement>().unwrap();
                            set_email.set(input.value());
                        }
                    />
                </label>

                <label class="label">
                    "Password"
                    <input
                        class="input"
                        type="password"
                        required
                        autocomplete=move || {
                            if mode.get() == AuthMode::Login { "current-password" } else { "new-password" }
                        }
                        prop:value=move || password.get()
                        on:input=move |ev| {
                            let target = ev.target().unwrap();
                            let input = target.dyn_ref::<web_sys::HtmlInputElement>().unwrap();
                            set_password.set(input.value());
                        }
                    />
                </label>

                <Show when=move || !error.get().is_empty()>
                    <div class="error">{move || error.get()}</div>
                </Show>
                <Show when=move || !notice.get().is_empty()>
                    <div class="notice">{move || notice.get()}</div>
                </Show>

                <div class="row">
                    <button class="btn" disabled=move || loading.get()>
                        {move || {
                            if loading.get() {
                                "…"
                            } else if mode.get() == AuthMode::Login {
                                "Log in"
                            } else {
                                "Create account"
                            }
                        }}
                    </button>

                    <button type="button" class="btn btn-secondary" on:click=login_with_github>
                        "Log in with GitHub"
                    </button>
                </div>

                <button
                    type="button"
                    class="link-btn"
                    on:click=move |_| {
                        set_mode.update(|m| {
                            *m = if *m == AuthMode::Login { AuthMode::Signup } else { AuthMode::Login }
                        })
                    }
                >
                    {move || {
                        if mode.get() == AuthMode::Login {
                            "No account yet? Sign up"
                        } else {
                            "Already have an account? Log in"
                        }
                    }}
                </button>
            </form>
        </div>
    }
}
