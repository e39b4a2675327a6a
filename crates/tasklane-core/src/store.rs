use tracing::{debug, warn};

use crate::model::Task;

/// Sequence number handed out when a refresh is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

impl RefreshTicket {
    pub fn seq(self) -> u64 {
        self.0
    }
}

/// In-memory copy of the server's task list.
///
/// The collection is only ever swapped whole. A refresh response is applied
/// only when its ticket is newer than the last one applied, so a slow
/// response cannot overwrite a later one.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
    issued: u64,
    applied: u64,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconditionally swaps the collection, counting as the newest refresh.
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        let ticket = self.begin_refresh();
        self.apply(ticket, tasks);
    }

    pub fn all(&self) -> &[Task] {
        &self.tasks
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Task> {
        self.tasks
            .iter()
            .find(|task| task.id.as_deref() == Some(id))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|task| task.completed).count()
    }

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.issued += 1;
        RefreshTicket(self.issued)
    }

    #[tracing::instrument(skip(self, tasks), fields(seq = ticket.0, count = tasks.len()))]
    pub fn apply(&mut self, ticket: RefreshTicket, tasks: Vec<Task>) -> bool {
        if ticket.0 <= self.applied {
            warn!(
                applied = self.applied,
                "discarding refresh response older than the applied one"
            );
            return false;
        }

        self.applied = ticket.0;
        self.tasks = tasks;
        debug!("task store replaced");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::TaskStore;
    use crate::model::{Priority, Task};

    fn task(id: &str, title: &str) -> Task {
        let mut task = Task::new(title, Priority::Medium);
        task.id = Some(id.to_string());
        task
    }

    #[test]
    fn replace_all_swaps_whole_collection() {
        let mut store = TaskStore::new();
        store.replace_all(vec![task("1", "a"), task("2", "b")]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.find_by_id("2").map(|t| t.title.as_str()), Some("b"));

        store.replace_all(vec![task("3", "c")]);
        assert_eq!(store.len(), 1);
        assert!(store.find_by_id("1").is_none());
    }

    #[test]
    fn late_response_for_older_ticket_is_discarded() {
        let mut store = TaskStore::new();
        let first = store.begin_refresh();
        let second = store.begin_refresh();

        assert!(store.apply(second, vec![task("new", "fresh")]));
        assert!(!store.apply(first, vec![task("old", "stale")]));
        assert_eq!(store.all()[0].title, "fresh");
    }

    #[test]
    fn responses_in_issue_order_all_apply() {
        let mut store = TaskStore::new();
        let first = store.begin_refresh();
        assert!(store.apply(first, vec![task("1", "a")]));
        let second = store.begin_refresh();
        assert!(store.apply(second, vec![]));
        assert!(store.is_empty());
        assert!(second.seq() > first.seq());
    }
}
