//! Task List Component
//!
//! Checkbox rows with a completion toggle and confirmation-gated delete.
//! Both mutations finish through the dashboard context, which records the
//! error (if any) and triggers the reload.

use leptos::prelude::*;
use leptos::task::spawn_local;

use supabase_client::Supabase;

use crate::components::DeleteConfirmButton;
use crate::context::DashboardContext;
use crate::models::{Task, TaskPatch};

#[component]
pub fn TaskList(tasks: Memo<Vec<Task>>) -> impl IntoView {
    let supabase = expect_context::<Supabase>();
    let ctx = use_context::<DashboardContext>().expect("DashboardContext should be provided");

    view! {
        <ul class="task-list">
            <For
                each=move || tasks.get()
                key=|task| (task.id, task.done, task.title.clone())
                children=move |task| {
                    let id = task.id;
                    let done = task.done;

                    let toggle_client = supabase.clone();
                    let toggle = move |_| {
                        let supabase = toggle_client.clone();
                        spawn_local(async move {
                            let result = supabase
                                .from("tasks")
                                .eq("id", id)
                                .update(&TaskPatch { done: !done })
                                .await;
                            ctx.finish_mutation(result);
                        });
                    };

                    let remove_client = supabase.clone();
                    let remove = Callback::new(move |_| {
                        let supabase = remove_client.clone();
                        spawn_local(async move {
                            let result = supabase.from("tasks").eq("id", id).delete().await;
                            ctx.finish_mutation(result);
                        });
                    });

                    view! {
                        <li class="task-item">
                            <div class="item-row">
                                <label class="check-row">
                                    <input type="checkbox" prop:checked=done on:change=toggle />
                                    <span class=if done { "task-title task-done" } else { "task-title" }>
                                        {task.title.clone()}
                                    </span>
                                </label>
                                <DeleteConfirmButton button_class="delete-btn" on_confirm=remove />
                            </div>
                        </li>
                    }
                }
            />
            <Show when=move || tasks.get().is_empty()>
                <li class="muted">"No tasks."</li>
            </Show>
        </ul>
    }
}
