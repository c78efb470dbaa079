//! Dashboard Context
//!
//! Shared dashboard signals provided via Leptos Context API.

use leptos::prelude::*;
use supabase_client::Error;

/// Dashboard-wide signals provided via context
#[derive(Clone, Copy)]
pub struct DashboardContext {
    /// Reload counter; doubles as the load sequence number - read
    pub reload_trigger: ReadSignal<u32>,
    /// Reload counter - write
    set_reload_trigger: WriteSignal<u32>,
    /// Last load/mutation failure shown to the user - write
    set_error: WriteSignal<String>,
}

impl DashboardContext {
    pub fn new(
        reload_trigger: (ReadSignal<u32>, WriteSignal<u32>),
        set_error: WriteSignal<String>,
    ) -> Self {
        Self {
            reload_trigger: reload_trigger.0,
            set_reload_trigger: reload_trigger.1,
            set_error,
        }
    }

    /// Trigger a reload of tasks
    pub fn reload(&self) {
        self.set_reload_trigger.try_update(|v| *v += 1);
    }

    /// Record a mutation result, then reload so the list reflects the
    /// server-assigned state. Every mutation finishes through here.
    pub fn finish_mutation(&self, result: Result<(), Error>) {
        if let Err(err) = result {
            self.set_error.try_set(err.message());
        }
        self.reload();
    }
}
