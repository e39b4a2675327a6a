use std::cell::{Cell, RefCell};
use std::rc::Rc;

use chrono::NaiveDate;
use tasklane_core::controller::{ActionController, ActionOutcome, FormState, ValidationError};
use tasklane_core::derive::Card;
use tasklane_core::model::{Priority, Task};
use tasklane_core::notify::{Notifier, NotifyLevel};
use tasklane_core::prefs::PreferenceStore;
use tasklane_core::remote::{RemoteError, RemoteStore};
use tasklane_core::session::Session;
use tasklane_core::sink::{Counter, RenderSink, Surface};
use tasklane_core::view_state::Theme;

fn fixed_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).expect("valid date")
}

fn refused(method: &'static str) -> RemoteError {
    RemoteError::Transport {
        method,
        url: "http://fake/api/tasks".to_string(),
        message: "connection refused".to_string(),
    }
}

/// In-memory task server recording every call it receives.
#[derive(Default)]
struct FakeRemote {
    tasks: RefCell<Vec<Task>>,
    calls: RefCell<Vec<String>>,
    next_id: Cell<u32>,
    fail_writes: Cell<bool>,
    fail_list: Cell<bool>,
}

impl FakeRemote {
    fn seeded(tasks: Vec<Task>) -> Self {
        let remote = Self::default();
        for task in tasks {
            remote.insert(task);
        }
        remote
    }

    fn insert(&self, mut task: Task) -> Task {
        let n = self.next_id.get() + 1;
        self.next_id.set(n);
        task.id = Some(format!("t{n}"));
        self.tasks.borrow_mut().push(task.clone());
        task
    }

    fn log(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn check_write(&self, method: &'static str) -> Result<(), RemoteError> {
        if self.fail_writes.get() {
            return Err(refused(method));
        }
        Ok(())
    }
}

impl RemoteStore for FakeRemote {
    async fn list(&self) -> Result<Vec<Task>, RemoteError> {
        self.log("list");
        if self.fail_list.get() {
            return Err(refused("GET"));
        }
        Ok(self.tasks.borrow().clone())
    }

    async fn create(&self, task: &Task) -> Result<Option<Task>, RemoteError> {
        self.log("create");
        self.check_write("POST")?;
        Ok(Some(self.insert(task.clone())))
    }

    async fn update(&self, id: &str, task: &Task) -> Result<Option<Task>, RemoteError> {
        self.log(format!("update {id}"));
        self.check_write("PUT")?;
        let mut tasks = self.tasks.borrow_mut();
        let Some(slot) = tasks.iter_mut().find(|t| t.id.as_deref() == Some(id)) else {
            return Err(RemoteError::Status {
                method: "PUT",
                url: format!("http://fake/api/tasks/{id}"),
                status: 404,
            });
        };
        *slot = Task {
            id: Some(id.to_string()),
            ..task.clone()
        };
        Ok(Some(slot.clone()))
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        self.log(format!("delete {id}"));
        self.check_write("DELETE")?;
        self.tasks.borrow_mut().retain(|t| t.id.as_deref() != Some(id));
        Ok(())
    }

    async fn delete_completed(&self) -> Result<(), RemoteError> {
        self.log("delete completed");
        self.check_write("DELETE")?;
        self.tasks.borrow_mut().retain(|t| !t.completed);
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), RemoteError> {
        self.log("delete all");
        self.check_write("DELETE")?;
        self.tasks.borrow_mut().clear();
        Ok(())
    }
}

#[derive(Clone, Default)]
struct Recorder {
    notes: Rc<RefCell<Vec<(String, NotifyLevel)>>>,
    counts: Rc<RefCell<Vec<(Counter, usize)>>>,
    sidebar: Rc<RefCell<Vec<String>>>,
    saved_theme: Rc<RefCell<Option<Theme>>>,
}

impl Recorder {
    fn last_note(&self) -> Option<(String, NotifyLevel)> {
        self.notes.borrow().last().cloned()
    }

    fn last_count(&self, counter: Counter) -> Option<usize> {
        self.counts
            .borrow()
            .iter()
            .rev()
            .find(|(c, _)| *c == counter)
            .map(|(_, n)| *n)
    }
}

impl Notifier for Recorder {
    fn notify(&mut self, message: &str, level: NotifyLevel) {
        self.notes.borrow_mut().push((message.to_string(), level));
    }
}

impl RenderSink for Recorder {
    fn paint(&mut self, surface: Surface, items: &[Card]) {
        if surface == Surface::SidebarTasks {
            *self.sidebar.borrow_mut() = items.iter().map(|card| card.task.title.clone()).collect();
        }
    }

    fn set_count(&mut self, counter: Counter, n: usize) {
        self.counts.borrow_mut().push((counter, n));
    }
}

impl PreferenceStore for Recorder {
    fn load_theme(&self) -> anyhow::Result<Option<Theme>> {
        Ok(*self.saved_theme.borrow())
    }

    fn save_theme(&mut self, theme: Theme) -> anyhow::Result<()> {
        *self.saved_theme.borrow_mut() = Some(theme);
        Ok(())
    }
}

fn session(recorder: &Recorder) -> Session {
    Session::new(
        Box::new(recorder.clone()),
        Box::new(recorder.clone()),
        Box::new(recorder.clone()),
    )
    .with_clock(fixed_today)
}

fn controller(remote: FakeRemote, approve: bool) -> ActionController<FakeRemote> {
    ActionController::new(remote, Box::new(move |_: &str| approve))
}

fn task(title: &str, completed: bool) -> Task {
    let mut task = Task::new(title, Priority::Low);
    task.completed = completed;
    task
}

#[tokio::test]
async fn add_then_list_round_trip() {
    let rec = Recorder::default();
    let mut session = session(&rec);
    let mut actions = controller(FakeRemote::default(), true);

    let mut form = actions.start_add(&session);
    assert_eq!(form.due_date, Some(fixed_today()));
    assert_eq!(form.priority, Priority::Medium);
    form.title = "  Buy milk ".to_string();

    let outcome = actions.submit(&mut session, form).await;

    assert_eq!(outcome, ActionOutcome::Applied);
    assert_eq!(actions.remote().calls(), vec!["create", "list"]);
    assert_eq!(session.tasks().len(), 1);
    assert_eq!(session.tasks()[0].title, "Buy milk");
    assert_eq!(*rec.sidebar.borrow(), vec!["Buy milk"]);
    assert_eq!(rec.last_count(Counter::TodoCount), Some(1));
    assert_eq!(
        rec.last_note(),
        Some(("Task added successfully!".to_string(), NotifyLevel::Success))
    );
    assert_eq!(actions.form_state(), &FormState::Idle);
}

#[tokio::test]
async fn empty_title_is_rejected_without_a_request() {
    let rec = Recorder::default();
    let mut session = session(&rec);
    let mut actions = controller(FakeRemote::default(), true);

    let mut form = actions.start_add(&session);
    form.title = "   ".to_string();
    let outcome = actions.submit(&mut session, form).await;

    assert_eq!(outcome, ActionOutcome::Invalid(ValidationError::EmptyTitle));
    assert!(actions.remote().calls().is_empty());
    assert_eq!(
        rec.last_note(),
        Some(("Please enter a task title".to_string(), NotifyLevel::Warning))
    );
    assert_eq!(actions.form_state(), &FormState::Adding);
}

#[tokio::test]
async fn clear_completed_with_nothing_completed_sends_nothing() {
    let rec = Recorder::default();
    let mut session = session(&rec);
    let mut actions = controller(FakeRemote::seeded(vec![task("Buy milk", false)]), true);
    assert!(actions.load(&mut session).await.is_applied());

    let outcome = actions.clear_completed(&mut session).await;

    assert_eq!(outcome, ActionOutcome::NothingToClear);
    assert_eq!(actions.remote().calls(), vec!["list"]);
    assert_eq!(
        rec.last_note(),
        Some(("No completed tasks to clear".to_string(), NotifyLevel::Info))
    );
}

#[tokio::test]
async fn clear_completed_reports_how_many_were_removed() {
    let rec = Recorder::default();
    let mut session = session(&rec);
    let remote = FakeRemote::seeded(vec![task("a", true), task("b", true), task("c", false)]);
    let mut actions = controller(remote, true);
    actions.load(&mut session).await;

    let outcome = actions.clear_completed(&mut session).await;

    assert!(outcome.is_applied());
    assert_eq!(session.tasks().len(), 1);
    assert_eq!(
        rec.last_note(),
        Some(("2 completed task(s) deleted".to_string(), NotifyLevel::Success))
    );
}

#[tokio::test]
async fn clear_all_on_empty_store_is_a_no_op() {
    let rec = Recorder::default();
    let mut session = session(&rec);
    let mut actions = controller(FakeRemote::default(), true);
    actions.load(&mut session).await;

    assert_eq!(actions.clear_all(&mut session).await, ActionOutcome::NothingToClear);
    assert_eq!(actions.remote().calls(), vec!["list"]);
    assert_eq!(
        rec.last_note(),
        Some(("No tasks to clear".to_string(), NotifyLevel::Info))
    );
}

#[tokio::test]
async fn theme_toggle_persists_and_switches_greeting() {
    let rec = Recorder::default();
    let mut session = session(&rec).with_user_name(Some("Sam".to_string()));
    assert_eq!(session.view().theme(), Theme::Light);
    assert_eq!(session.header().greeting, "Good Morning, Sam!");

    assert_eq!(session.toggle_theme(), Theme::Dark);

    assert_eq!(*rec.saved_theme.borrow(), Some(Theme::Dark));
    assert_eq!(session.header().greeting, "Good Evening, Sam!");

    let reopened = self::session(&rec);
    assert_eq!(reopened.view().theme(), Theme::Dark);
}

#[tokio::test]
async fn toggling_twice_restores_completion() {
    let rec = Recorder::default();
    let mut session = session(&rec);
    let mut actions = controller(FakeRemote::seeded(vec![task("Buy milk", false)]), true);
    actions.load(&mut session).await;

    actions.toggle_complete(&mut session, "t1").await;
    assert!(session.tasks()[0].completed);
    assert_eq!(
        rec.last_note(),
        Some(("Task completed!".to_string(), NotifyLevel::Success))
    );

    actions.toggle_complete(&mut session, "t1").await;
    assert!(!session.tasks()[0].completed);
    assert_eq!(
        rec.last_note(),
        Some(("Task marked incomplete!".to_string(), NotifyLevel::Success))
    );
    assert_eq!(rec.last_count(Counter::CompletedCount), Some(0));
}

#[tokio::test]
async fn transport_failure_leaves_store_and_form_untouched() {
    let rec = Recorder::default();
    let mut session = session(&rec);
    let mut actions = controller(FakeRemote::seeded(vec![task("Buy milk", false)]), true);
    actions.load(&mut session).await;
    let before = session.tasks().to_vec();

    let form = actions.start_edit(&mut session, "t1").expect("task is loaded");
    actions.remote().fail_writes.set(true);
    let outcome = actions.submit(&mut session, form).await;

    assert!(matches!(outcome, ActionOutcome::Failed(RemoteError::Transport { .. })));
    assert_eq!(session.tasks(), before.as_slice());
    assert_eq!(actions.form_state(), &FormState::Editing("t1".to_string()));
    assert_eq!(
        rec.last_note(),
        Some(("Error updating task".to_string(), NotifyLevel::Error))
    );
}

#[tokio::test]
async fn declined_confirmation_sends_no_delete() {
    let rec = Recorder::default();
    let mut session = session(&rec);
    let mut actions = controller(FakeRemote::seeded(vec![task("Buy milk", false)]), false);
    actions.load(&mut session).await;

    assert_eq!(actions.delete(&mut session, "t1").await, ActionOutcome::Cancelled);
    assert_eq!(actions.clear_all(&mut session).await, ActionOutcome::Cancelled);
    assert_eq!(actions.remote().calls(), vec!["list"]);
    assert_eq!(session.tasks().len(), 1);
}

#[tokio::test]
async fn unknown_ids_are_ignored() {
    let rec = Recorder::default();
    let mut session = session(&rec);
    let mut actions = controller(FakeRemote::default(), true);
    actions.load(&mut session).await;

    assert_eq!(actions.toggle_complete(&mut session, "gone").await, ActionOutcome::NotFound);
    assert_eq!(actions.delete(&mut session, "gone").await, ActionOutcome::NotFound);
    assert!(actions.start_edit(&mut session, "gone").is_none());
    assert_eq!(actions.remote().calls(), vec!["list"]);
}

#[tokio::test]
async fn a_second_edit_replaces_the_first() {
    let rec = Recorder::default();
    let mut session = session(&rec);
    let remote = FakeRemote::seeded(vec![task("first", false), task("second", false)]);
    let mut actions = controller(remote, true);
    actions.load(&mut session).await;

    actions.start_edit(&mut session, "t1").expect("first task");
    let mut form = actions.start_edit(&mut session, "t2").expect("second task");
    assert_eq!(actions.form_state(), &FormState::Editing("t2".to_string()));
    assert_eq!(
        rec.last_note(),
        Some(("Task loaded for editing".to_string(), NotifyLevel::Info))
    );

    form.priority = Priority::High;
    assert!(actions.submit(&mut session, form).await.is_applied());
    assert!(actions.remote().calls().contains(&"update t2".to_string()));
    let second = session.store().find_by_id("t2").expect("still there");
    assert_eq!(second.priority, Priority::High);
    assert_eq!(session.store().find_by_id("t1").expect("untouched").priority, Priority::Low);
}

#[tokio::test]
async fn deleting_the_edited_task_closes_the_form() {
    let rec = Recorder::default();
    let mut session = session(&rec);
    let mut actions = controller(FakeRemote::seeded(vec![task("Buy milk", false)]), true);
    actions.load(&mut session).await;

    actions.start_edit(&mut session, "t1").expect("task is loaded");
    assert!(actions.delete(&mut session, "t1").await.is_applied());

    assert_eq!(actions.form_state(), &FormState::Idle);
    assert!(session.tasks().is_empty());
    assert_eq!(
        rec.last_note(),
        Some(("Task deleted".to_string(), NotifyLevel::Success))
    );
}

#[tokio::test]
async fn failed_refetch_after_write_reports_load_error() {
    let rec = Recorder::default();
    let mut session = session(&rec);
    let mut actions = controller(FakeRemote::default(), true);
    actions.load(&mut session).await;
    actions.remote().fail_list.set(true);

    let mut form = actions.start_add(&session);
    form.title = "Buy milk".to_string();
    let outcome = actions.submit(&mut session, form).await;

    assert_eq!(outcome, ActionOutcome::Applied);
    assert!(session.tasks().is_empty());
    assert_eq!(
        rec.last_note(),
        Some(("Error loading tasks".to_string(), NotifyLevel::Error))
    );
    assert!(
        rec.notes
            .borrow()
            .iter()
            .all(|(message, _)| message != "Task added successfully!")
    );
}

#[tokio::test]
async fn failed_initial_load_keeps_store_empty() {
    let rec = Recorder::default();
    let mut session = session(&rec);
    let remote = FakeRemote::seeded(vec![task("Buy milk", false)]);
    remote.fail_list.set(true);
    let mut actions = controller(remote, true);

    assert!(matches!(actions.load(&mut session).await, ActionOutcome::Failed(_)));
    assert!(session.tasks().is_empty());
    assert_eq!(
        rec.last_note(),
        Some(("Error loading tasks".to_string(), NotifyLevel::Error))
    );
}

struct UnwritablePrefs;

impl PreferenceStore for UnwritablePrefs {
    fn load_theme(&self) -> anyhow::Result<Option<Theme>> {
        Ok(None)
    }

    fn save_theme(&mut self, _theme: Theme) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("preferences file is read-only"))
    }
}

#[tokio::test]
async fn theme_still_switches_when_saving_it_fails() {
    let rec = Recorder::default();
    let mut session = Session::new(
        Box::new(UnwritablePrefs),
        Box::new(rec.clone()),
        Box::new(rec.clone()),
    )
    .with_clock(fixed_today);

    assert_eq!(session.toggle_theme(), Theme::Dark);

    assert_eq!(session.view().theme(), Theme::Dark);
    assert_eq!(session.header().greeting, "Good Evening");
    assert!(rec.notes.borrow().is_empty());
}

#[tokio::test]
async fn editing_keeps_lane_status_and_completion() {
    let rec = Recorder::default();
    let mut session = session(&rec);
    let mut doing = task("Write report", false);
    doing.status = Some("doing".to_string());
    let mut actions = controller(FakeRemote::seeded(vec![doing]), true);
    actions.load(&mut session).await;

    let mut form = actions.start_edit(&mut session, "t1").expect("task is loaded");
    form.title = "Write final report".to_string();
    assert!(actions.submit(&mut session, form).await.is_applied());

    let edited = session.store().find_by_id("t1").expect("still there");
    assert_eq!(edited.title, "Write final report");
    assert_eq!(edited.status.as_deref(), Some("doing"));
    assert!(!edited.completed);

    let derived = session.derive();
    assert_eq!(derived.kanban_doing.len(), 1);
    assert!(derived.kanban_todo.is_empty());
    assert_eq!(rec.last_count(Counter::DoingCount), Some(1));
}
