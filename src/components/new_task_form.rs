//! New Task Form Component
//!
//! Single-line draft; whitespace-only drafts are not submitted. The draft
//! clears and the list reloads whether or not the insert succeeded, so the
//! visible rows always carry backend-assigned ids and timestamps.

use leptos::prelude::*;
use leptos::task::spawn_local;
use wasm_bindgen::JsCast;

use supabase_client::Supabase;

use crate::context::DashboardContext;
use crate::filter::normalized_title;
use crate::models::NewTask;

#[component]
pub fn NewTaskForm(user_id: String) -> impl IntoView {
    let supabase = expect_context::<Supabase>();
    let ctx = use_context::<DashboardContext>().expect("DashboardContext should be provided");

    let (title, set_title) = signal(String::new());

    let add_task = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let Some(trimmed) = normalized_title(&title.get_untracked()) else {
            return;
        };
        let supabase = supabase.clone();
        let uid = user_id.clone();
        spawn_local(async move {
            let row = NewTask {
                user_id: &uid,
                title: &trimmed,
                done: false,
            };
            let result = supabase.from("tasks").insert(&row).await;
            set_title.try_set(String::new());
            ctx.finish_mutation(result);
        });
    };

    view! {
        <form class="row" on:submit=add_task>
            <input
                class="input"
                type="text"
                placeholder="New task…"
                prop:value=move || title.get()
                on:input=move |ev| {
                    let target = ev.target().unwrap();
                    let input = target.dyn_ref::<web_sys::HtmlInputElement>().unwrap();
                    set_title.set(input.value());
                }
            />
            <button type="submit" class="btn">"Add"</button>
        </form>
    }
}
