//! Filter Bar Component
//!
//! All/Open/Done pills over the already-loaded list; pure view state.

use leptos::prelude::*;

use crate::filter::TaskFilter;

#[component]
pub fn FilterBar(
    filter: ReadSignal<TaskFilter>,
    set_filter: WriteSignal<TaskFilter>,
) -> impl IntoView {
    view! {
        <div class="filters">
            {TaskFilter::ALL
                .iter()
                .map(|&option| {
                    let is_active = move || filter.get() == option;
                    view! {
                        <button
                            type="button"
                            class=move || if is_active() { "pill pill-active" } else { "pill" }
                            on:click=move |_| set_filter.set(option)
                        >
                            {option.label()}
                        </button>
                    }
                })
                .collect_view()}
        </div>
    }
}
