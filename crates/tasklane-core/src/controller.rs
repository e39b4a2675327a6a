use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::model::{Priority, Task};
use crate::notify::NotifyLevel;
use crate::remote::{RemoteError, RemoteStore};
use crate::session::Session;

const EMPTY_TITLE_MESSAGE: &str = "Please enter a task title";
const LOAD_ERROR_MESSAGE: &str = "Error loading tasks";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("task title must not be empty")]
    EmptyTitle,
}

/// Asks the user to approve a destructive action.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormState {
    #[default]
    Idle,
    Adding,
    Editing(String),
}

/// Field values of the add/edit form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskForm {
    pub title: String,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub description: String,
}

impl TaskForm {
    pub fn blank(today: NaiveDate) -> Self {
        Self {
            title: String::new(),
            due_date: Some(today),
            priority: Priority::Medium,
            description: String::new(),
        }
    }

    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            due_date: task.due_date,
            priority: task.priority,
            description: task.description.clone(),
        }
    }

    /// Trims text fields and rejects an empty title.
    pub fn validate(&self) -> Result<Self, ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        Ok(Self {
            title: title.to_string(),
            due_date: self.due_date,
            priority: self.priority,
            description: self.description.trim().to_string(),
        })
    }

    /// Overlays the form onto `base`, keeping its id, completion and status.
    fn apply_to(self, base: Option<&Task>) -> Task {
        let mut task = base
            .cloned()
            .unwrap_or_else(|| Task::new(String::new(), self.priority));
        task.title = self.title;
        task.due_date = self.due_date;
        task.priority = self.priority;
        task.description = self.description;
        task
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The server accepted the change.
    Applied,
    /// The id is not in the local store; nothing was sent.
    NotFound,
    /// The user declined the confirmation.
    Cancelled,
    NothingToClear,
    Invalid(ValidationError),
    /// Store and form are unchanged.
    Failed(RemoteError),
}

impl ActionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Runs every mutating user action as validate, remote call, re-fetch,
/// repaint. The local store is never patched directly.
pub struct ActionController<R> {
    remote: R,
    form: FormState,
    confirm: Box<dyn Confirm>,
}

impl<R: RemoteStore> ActionController<R> {
    pub fn new(remote: R, confirm: Box<dyn Confirm>) -> Self {
        Self {
            remote,
            form: FormState::Idle,
            confirm,
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn form_state(&self) -> &FormState {
        &self.form
    }

    /// Initial load or manual reload.
    pub async fn load(&mut self, session: &mut Session) -> ActionOutcome {
        match session.refresh(&self.remote).await {
            Ok(()) => ActionOutcome::Applied,
            Err(err) => {
                error!(error = %err, "failed loading tasks");
                session.notify(LOAD_ERROR_MESSAGE, NotifyLevel::Error);
                ActionOutcome::Failed(err)
            }
        }
    }

    pub fn start_add(&mut self, session: &Session) -> TaskForm {
        if self.form != FormState::Idle {
            debug!(previous = ?self.form, "discarding open form for a new task");
        }
        self.form = FormState::Adding;
        TaskForm::blank(session.today())
    }

    /// Opening an edit while another form is open replaces that form.
    pub fn start_edit(&mut self, session: &mut Session, id: &str) -> Option<TaskForm> {
        let form = TaskForm::from_task(session.store().find_by_id(id)?);
        if self.form != FormState::Idle {
            debug!(previous = ?self.form, task_id = id, "replacing open form with edit");
        }
        self.form = FormState::Editing(id.to_string());
        session.notify("Task loaded for editing", NotifyLevel::Info);
        Some(form)
    }

    pub fn cancel(&mut self) {
        self.form = FormState::Idle;
    }

    /// Dispatches on the open form: an edit updates, anything else creates.
    pub async fn submit(&mut self, session: &mut Session, form: TaskForm) -> ActionOutcome {
        match self.form.clone() {
            FormState::Editing(id) => self.submit_edit(session, &id, form).await,
            FormState::Adding | FormState::Idle => self.submit_add(session, form).await,
        }
    }

    #[instrument(skip_all)]
    pub async fn submit_add(&mut self, session: &mut Session, form: TaskForm) -> ActionOutcome {
        let form = match self.validated(session, &form) {
            Ok(form) => form,
            Err(outcome) => return outcome,
        };

        let task = form.apply_to(None);
        if let Err(err) = self.remote.create(&task).await {
            return self.fail(session, err, "Error adding task");
        }

        info!(title = %task.title, "task created");
        self.finish(session, "Task added successfully!").await
    }

    #[instrument(skip(self, session, form), fields(task_id = %id))]
    pub async fn submit_edit(&mut self, session: &mut Session, id: &str, form: TaskForm) -> ActionOutcome {
        let form = match self.validated(session, &form) {
            Ok(form) => form,
            Err(outcome) => return outcome,
        };

        let Some(existing) = session.store().find_by_id(id).cloned() else {
            debug!("edited task no longer in store; closing form");
            self.form = FormState::Idle;
            return ActionOutcome::NotFound;
        };

        let task = form.apply_to(Some(&existing));
        if let Err(err) = self.remote.update(id, &task).await {
            return self.fail(session, err, "Error updating task");
        }

        self.finish(session, "Task updated successfully!").await
    }

    #[instrument(skip(self, session), fields(task_id = %id))]
    pub async fn toggle_complete(&mut self, session: &mut Session, id: &str) -> ActionOutcome {
        let Some(mut task) = session.store().find_by_id(id).cloned() else {
            debug!("toggle requested for unknown task");
            return ActionOutcome::NotFound;
        };
        task.completed = !task.completed;

        if let Err(err) = self.remote.update(id, &task).await {
            return self.fail(session, err, "Error updating task");
        }

        let message = if task.completed {
            "Task completed!"
        } else {
            "Task marked incomplete!"
        };
        self.refresh_then_notify(session, message).await
    }

    #[instrument(skip(self, session), fields(task_id = %id))]
    pub async fn delete(&mut self, session: &mut Session, id: &str) -> ActionOutcome {
        if session.store().find_by_id(id).is_none() {
            debug!("delete requested for unknown task");
            return ActionOutcome::NotFound;
        }
        if !self.confirm.confirm("Are you sure you want to delete this task?") {
            return ActionOutcome::Cancelled;
        }

        if let Err(err) = self.remote.delete(id).await {
            return self.fail(session, err, "Error deleting task");
        }

        if self.form == FormState::Editing(id.to_string()) {
            self.form = FormState::Idle;
        }
        self.refresh_then_notify(session, "Task deleted").await
    }

    #[instrument(skip_all)]
    pub async fn clear_completed(&mut self, session: &mut Session) -> ActionOutcome {
        let count = session.store().completed_count();
        if count == 0 {
            session.notify("No completed tasks to clear", NotifyLevel::Info);
            return ActionOutcome::NothingToClear;
        }
        let prompt = format!("Are you sure you want to delete {count} completed task(s)?");
        if !self.confirm.confirm(&prompt) {
            return ActionOutcome::Cancelled;
        }

        if let Err(err) = self.remote.delete_completed().await {
            return self.fail(session, err, "Error clearing completed tasks");
        }

        info!(count, "cleared completed tasks");
        self.refresh_then_notify(session, &format!("{count} completed task(s) deleted"))
            .await
    }

    #[instrument(skip_all)]
    pub async fn clear_all(&mut self, session: &mut Session) -> ActionOutcome {
        let count = session.store().len();
        if count == 0 {
            session.notify("No tasks to clear", NotifyLevel::Info);
            return ActionOutcome::NothingToClear;
        }
        let prompt = format!("Are you sure you want to delete all {count} task(s)?");
        if !self.confirm.confirm(&prompt) {
            return ActionOutcome::Cancelled;
        }

        if let Err(err) = self.remote.delete_all().await {
            return self.fail(session, err, "Error clearing all tasks");
        }

        info!(count, "cleared all tasks");
        self.form = FormState::Idle;
        self.refresh_then_notify(session, "All tasks deleted").await
    }

    fn validated(&self, session: &mut Session, form: &TaskForm) -> Result<TaskForm, ActionOutcome> {
        form.validate().map_err(|err| {
            warn!(error = %err, "rejected task form");
            session.notify(EMPTY_TITLE_MESSAGE, NotifyLevel::Warning);
            ActionOutcome::Invalid(err)
        })
    }

    fn fail(&self, session: &mut Session, err: RemoteError, message: &str) -> ActionOutcome {
        error!(error = %err, "{message}");
        session.notify(message, NotifyLevel::Error);
        ActionOutcome::Failed(err)
    }

    /// Form submissions close the form once the write has landed.
    async fn finish(&mut self, session: &mut Session, message: &str) -> ActionOutcome {
        let refreshed = self.refresh_after_write(session).await;
        self.form = FormState::Idle;
        if refreshed {
            session.notify(message, NotifyLevel::Success);
        }
        ActionOutcome::Applied
    }

    async fn refresh_then_notify(&mut self, session: &mut Session, message: &str) -> ActionOutcome {
        if self.refresh_after_write(session).await {
            session.notify(message, NotifyLevel::Success);
        }
        ActionOutcome::Applied
    }

    /// The write already landed, so a failed re-fetch is reported but does not
    /// turn the action into a failure.
    async fn refresh_after_write(&mut self, session: &mut Session) -> bool {
        match session.refresh(&self.remote).await {
            Ok(()) => true,
            Err(err) => {
                error!(error = %err, "re-fetch after write failed; view may be stale");
                session.notify(LOAD_ERROR_MESSAGE, NotifyLevel::Error);
                false
            }
        }
    }
}
