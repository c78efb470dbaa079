//! List Filtering Utilities
//!
//! Pure helpers for the dashboard's client-side view filter and the
//! new-task draft normalization.

use crate::models::Task;

/// Client-side view filter over the loaded task list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    #[default]
    All,
    Open,
    Done,
}

impl TaskFilter {
    /// Display order of the filter pills
    pub const ALL: [TaskFilter; 3] = [TaskFilter::All, TaskFilter::Open, TaskFilter::Done];

    pub fn label(self) -> &'static str {
        match self {
            TaskFilter::All => "All",
            TaskFilter::Open => "Open",
            TaskFilter::Done => "Done",
        }
    }
}

/// Apply the view filter; keeps the source order, never mutates the source
pub fn filter_tasks(tasks: &[Task], filter: TaskFilter) -> Vec<Task> {
    match filter {
        TaskFilter::All => tasks.to_vec(),
        TaskFilter::Open => tasks.iter().filter(|t| !t.done).cloned().collect(),
        TaskFilter::Done => tasks.iter().filter(|t| t.done).cloned().collect(),
    }
}

/// Trim the draft title; `None` means "nothing to submit"
pub fn normalized_title(draft: &str) -> Option<String> {
    let trimmed = draft.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_task(id: i64, done: bool) -> Task {
        Task {
            id,
            user_id: "user-1".to_string(),
            title: format!("Task {}", id),
            done,
            created_at: format!("2024-01-0{}T00:00:00Z", id),
        }
    }

    #[test]
    fn test_filters_are_order_preserving_subsets() {
        let tasks = vec![make_task(1, false), make_task(2, true), make_task(3, false)];

        for filter in TaskFilter::ALL {
            let filtered = filter_tasks(&tasks, filter);
            // Subset of the source, in source order
            let mut cursor = tasks.iter();
            for task in &filtered {
                assert!(cursor.any(|t| t == task), "{:?} broke subset/order", filter);
            }
        }

        assert_eq!(filter_tasks(&tasks, TaskFilter::All), tasks);
        assert_eq!(filter_tasks(&tasks, TaskFilter::Open).len(), 2);
        assert_eq!(filter_tasks(&tasks, TaskFilter::Done).len(), 1);
    }

    #[test]
    fn test_open_and_done_partition_the_list() {
        let tasks = vec![
            make_task(1, true),
            make_task(2, false),
            make_task(3, true),
            make_task(4, false),
        ];

        let open = filter_tasks(&tasks, TaskFilter::Open);
        let done = filter_tasks(&tasks, TaskFilter::Done);

        assert_eq!(open.len() + done.len(), tasks.len());
        for task in &tasks {
            let in_open = open.contains(task);
            let in_done = done.contains(task);
            assert!(in_open != in_done, "task {} must be in exactly one half", task.id);
        }
    }

    #[test]
    fn test_empty_list_stays_empty() {
        for filter in TaskFilter::ALL {
            assert!(filter_tasks(&[], filter).is_empty());
        }
    }

    #[test]
    fn test_normalized_title() {
        assert_eq!(normalized_title("  Buy milk  "), Some("Buy milk".to_string()));
        assert_eq!(normalized_title(""), None);
        assert_eq!(normalized_title("   \t  "), None);
    }
}
