//! Frontend Models
//!
//! Data structures matching backend rows and write payloads.

use serde::{Deserialize, Serialize};

/// One row of the `tasks` table (matches backend)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub user_id: String,
    pub title: String,
    pub done: bool,
    pub created_at: String,
}

/// Insert payload; id and created_at are backend-assigned
#[derive(Debug, Clone, Serialize)]
pub struct NewTask<'a> {
    pub user_id: &'a str,
    pub title: &'a str,
    pub done: bool,
}

/// Update payload for the completion toggle
#[derive(Debug, Clone, Serialize)]
pub struct TaskPatch {
    pub done: bool,
}
