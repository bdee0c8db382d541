use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::error::{LoadError, ValidationError};
use crate::task::Task;

/// In-memory holder of the current session's tasks.
///
/// Newest local insertions sit at the front; loaded batches keep the order
/// the source gave them.
#[derive(Debug, Clone)]
pub struct TaskStore {
    tasks: Vec<Task>,
    loading: bool,
    error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    /// An empty store waiting on its startup fetch.
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            loading: true,
            error: None,
        }
    }

    pub fn begin_load(&mut self) {
        self.loading = true;
        self.error = None;
    }

    #[tracing::instrument(skip(self, records), fields(count = records.len()))]
    pub fn load(&mut self, records: Vec<Task>) {
        let mut seen = HashSet::with_capacity(records.len());
        let mut kept = Vec::with_capacity(records.len());

        for task in records {
            if seen.insert(task.id) {
                kept.push(task);
            } else {
                warn!(id = task.id, "dropping duplicate id from loaded batch");
            }
        }

        info!(count = kept.len(), "loaded tasks");
        self.tasks = kept;
        self.loading = false;
        self.error = None;
    }

    #[tracing::instrument(skip(self, error))]
    pub fn fail_load(&mut self, error: impl Into<String>) {
        let error = error.into();
        warn!(error = %error, "task load failed");
        self.tasks.clear();
        self.loading = false;
        self.error = Some(error);
    }

    pub fn apply(&mut self, result: Result<Vec<Task>, LoadError>) {
        match result {
            Ok(records) => self.load(records),
            Err(err) => self.fail_load(err.to_string()),
        }
    }

    /// Validates the form values and prepends a new task with a synthesized id.
    ///
    /// `owner` is the raw form value; it must parse as a positive integer.
    #[tracing::instrument(skip(self, text), fields(text_len = text.len()))]
    pub fn insert(
        &mut self,
        text: &str,
        completed: bool,
        owner: &str,
    ) -> Result<&Task, ValidationError> {
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyText);
        }
        let owner_id = parse_owner(owner)?;
        let id = self.next_id().ok_or(ValidationError::IdSpaceExhausted)?;

        let task = Task::new(id, text, completed, owner_id);
        debug!(id = task.id, owner_id, completed, "inserting task");
        self.tasks.insert(0, task);

        Ok(&self.tasks[0])
    }

    /// `None` once the largest id is `u64::MAX`.
    pub fn next_id(&self) -> Option<u64> {
        self.tasks.iter().map(|t| t.id).max().unwrap_or(0).checked_add(1)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn stats(&self) -> Stats {
        let completed = self.tasks.iter().filter(|t| t.completed).count();
        Stats {
            total: self.tasks.len(),
            completed,
            pending: self.tasks.len() - completed,
        }
    }
}

fn parse_owner(raw: &str) -> Result<u64, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingOwner);
    }
    match trimmed.parse::<u64>() {
        Ok(0) | Err(_) => Err(ValidationError::InvalidOwner(trimmed.to_string())),
        Ok(id) => Ok(id),
    }
}

#[cfg(test)]
mod tests {
    use super::{Stats, TaskStore};
    use crate::error::{LoadError, ValidationError};
    use crate::task::Task;

    fn sample() -> Vec<Task> {
        vec![
            Task::new(1, "Buy milk", false, 2),
            Task::new(2, "Walk dog", true, 3),
        ]
    }

    #[test]
    fn new_store_starts_loading_and_empty() {
        let store = TaskStore::new();
        assert!(store.is_loading());
        assert!(store.is_empty());
        assert_eq!(store.error(), None);
    }

    #[test]
    fn load_keeps_given_order() {
        let mut store = TaskStore::new();
        let batch = vec![
            Task::new(9, "c", false, 1),
            Task::new(3, "a", true, 1),
            Task::new(5, "b", false, 2),
        ];
        store.load(batch.clone());
        assert_eq!(store.tasks(), batch.as_slice());
        assert!(!store.is_loading());
    }

    #[test]
    fn load_clears_previous_error() {
        let mut store = TaskStore::new();
        store.fail_load("boom");
        store.begin_load();
        assert!(store.is_loading());
        assert_eq!(store.error(), None);
        store.load(sample());
        assert_eq!(store.error(), None);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn load_drops_repeated_ids() {
        let mut store = TaskStore::new();
        store.load(vec![
            Task::new(1, "first", false, 1),
            Task::new(1, "again", true, 1),
            Task::new(2, "second", false, 1),
        ]);
        let texts: Vec<&str> = store.tasks().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn failed_load_leaves_store_empty_with_error() {
        let mut store = TaskStore::new();
        store.apply(Err(LoadError::Status {
            url: "http://localhost/todos".to_string(),
            status: 503,
        }));
        assert!(store.is_empty());
        assert!(!store.is_loading());
        let error = store.error().expect("error should be recorded");
        assert!(error.contains("503"));
    }

    #[test]
    fn insert_on_empty_store_gets_id_one() {
        let mut store = TaskStore::new();
        store.load(vec![]);
        let task = store.insert("First", false, "1").expect("insert");
        assert_eq!(task.id, 1);
    }

    #[test]
    fn insert_uses_max_id_plus_one() {
        let mut store = TaskStore::new();
        store.load(vec![Task::new(4, "x", false, 1), Task::new(17, "y", false, 1)]);
        let task = store.insert("z", true, "5").expect("insert");
        assert_eq!(task.id, 18);
        assert_eq!(task.owner_id, 5);
        assert!(task.completed);
    }

    #[test]
    fn insert_fails_when_max_id_is_exhausted() {
        let mut store = TaskStore::new();
        store.load(vec![Task::new(u64::MAX, "huge id from source", false, 1)]);
        let before = store.tasks().to_vec();

        assert_eq!(store.next_id(), None);
        assert_eq!(
            store.insert("after huge", false, "1").err(),
            Some(ValidationError::IdSpaceExhausted)
        );
        assert_eq!(store.tasks(), before.as_slice());
    }

    #[test]
    fn inserts_are_listed_newest_first() {
        let mut store = TaskStore::new();
        store.load(sample());
        store.insert("one", false, "1").expect("insert one");
        store.insert("two", false, "1").expect("insert two");
        store.insert("three", false, "1").expect("insert three");

        let ids: Vec<u64> = store.tasks().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![5, 4, 3, 1, 2]);
    }

    #[test]
    fn insert_keeps_text_as_given() {
        let mut store = TaskStore::new();
        store.load(vec![]);
        let task = store.insert("  padded  ", false, " 7 ").expect("insert");
        assert_eq!(task.text, "  padded  ");
        assert_eq!(task.owner_id, 7);
    }

    #[test]
    fn empty_text_is_rejected_without_mutation() {
        let mut store = TaskStore::new();
        store.load(sample());
        let before = store.tasks().to_vec();

        assert_eq!(store.insert("", true, "3").err(), Some(ValidationError::EmptyText));
        assert_eq!(store.insert("   \t", true, "3").err(), Some(ValidationError::EmptyText));
        assert_eq!(store.tasks(), before.as_slice());
    }

    #[test]
    fn missing_or_bad_owner_is_rejected_without_mutation() {
        let mut store = TaskStore::new();
        store.load(sample());
        let before = store.tasks().to_vec();

        assert_eq!(
            store.insert("Buy milk", false, "").err(),
            Some(ValidationError::MissingOwner)
        );
        assert!(matches!(
            store.insert("Buy milk", false, "abc"),
            Err(ValidationError::InvalidOwner(_))
        ));
        assert!(matches!(
            store.insert("Buy milk", false, "0"),
            Err(ValidationError::InvalidOwner(_))
        ));
        assert!(matches!(
            store.insert("Buy milk", false, "-2"),
            Err(ValidationError::InvalidOwner(_))
        ));
        assert_eq!(store.tasks(), before.as_slice());
    }

    #[test]
    fn stats_split_by_completion() {
        let mut store = TaskStore::new();
        store.load(sample());
        store.insert("more", false, "1").expect("insert");
        assert_eq!(
            store.stats(),
            Stats {
                total: 3,
                completed: 1,
                pending: 2
            }
        );
    }
}
