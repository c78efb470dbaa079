//! Dashboard Component
//!
//! Task list for the signed-in user: load-on-trigger with a stale-response
//! guard, a realtime change feed that triggers reloads, and logout.
//! Mutations live in the child components and finish through the shared
//! context, so every one of them is followed by exactly one reload.

use leptos::prelude::*;
use leptos::task::spawn_local;

use supabase_client::{Order, PostgresChanges, Supabase};

use crate::components::{FilterBar, NewTaskForm, TaskList};
use crate::context::DashboardContext;
use crate::filter::{filter_tasks, TaskFilter};
use crate::models::Task;

#[component]
pub fn Dashboard(user_id: String) -> impl IntoView {
    let supabase = expect_context::<Supabase>();

    let (tasks, set_tasks) = signal(Vec::<Task>::new());
    let (filter, set_filter) = signal(TaskFilter::All);
    let (loading, set_loading) = signal(true);
    let (error, set_error) = signal(String::new());
    let (reload_trigger, set_reload_trigger) = signal(0u32);

    let ctx = DashboardContext::new((reload_trigger, set_reload_trigger), set_error);
    provide_context(ctx);

    let filtered = Memo::new(move |_| filter_tasks(&tasks.get(), filter.get()));

    // Load tasks whenever the trigger changes. The trigger value is the load
    // sequence number: a response that resolves after a newer trigger was
    // issued is dropped instead of overwriting fresher data.
    let load_client = supabase.clone();
    let load_user = user_id.clone();
    Effect::new(move |_| {
        let seq = reload_trigger.get();
        let supabase = load_client.clone();
        let uid = load_user.clone();
        set_error.set(String::new());
        set_loading.set(true);
        spawn_local(async move {
            let result = supabase
                .from("tasks")
                .select("*")
                .eq("user_id", &uid)
                .order("created_at", Order::Descending)
                .fetch::<Task>()
                .await;
            if reload_trigger.try_get_untracked() != Some(seq) {
                web_sys::console::log_1(&format!("[DASH] Dropping stale load #{}", seq).into());
                return;
            }
            match result {
                Ok(rows) => {
                    set_tasks.try_set(rows);
                }
                Err(err) => {
                    set_error.try_set(err.message());
                    set_tasks.try_set(Vec::new());
                }
            }
            set_loading.try_set(false);
        });
    });

    // Change feed: any insert/update/delete on this user's rows reloads the
    // list. Torn down with the component.
    let feed_client = supabase.clone();
    let feed_user = user_id.clone();
    Effect::new(move |_| {
        let changes = PostgresChanges::on_table("tasks")
            .with_filter(format!("user_id=eq.{}", feed_user));
        match feed_client.subscribe_changes("tasks-realtime", changes, move || ctx.reload()) {
            Ok(handle) => on_cleanup(move || handle.unsubscribe()),
            Err(err) => {
                web_sys::console::warn_1(
                    &format!("[DASH] Change feed unavailable: {}", err.message()).into(),
                );
            }
        }
    });

    let logout_client = supabase.clone();
    let logout = move |_| {
        let supabase = logout_client.clone();
        spawn_local(async move {
            supabase.auth().sign_out().await;
        });
    };

    view! {
        <div class="card">
            <div class="header">
                <h2 class="card-title">"Your tasks"</h2>
                <button class="btn" on:click=logout>"Logout"</button>
            </div>

            <NewTaskForm user_id=user_id.clone() />

            <FilterBar filter=filter set_filter=set_filter />

            <Show when=move || !error.get().is_empty()>
                <div class="error">{move || error.get()}</div>
            </Show>

            <Show
                when=move || !loading.get()
                fallback=|| view! { <p class="muted">"Loading…"</p> }
            >
                <TaskList tasks=filtered />
            </Show>

            <p class="task-count">{move || format!("{} tasks", tasks.get().len())}</p>
        </div>
    }
}
