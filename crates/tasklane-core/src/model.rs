use chrono::NaiveDate;
use tasklane_shared::TaskDto;
use thiserror::Error;
use tracing::warn;

pub use tasklane_shared::TaskPriority as Priority;

/// Status value that places an open task in the "doing" lane.
pub const DOING_STATUS: &str = "doing";

const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: Option<String>,
    pub title: String,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub description: String,
    pub completed: bool,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("task {id:?} has an invalid due date {value:?}")]
    InvalidDueDate { id: Option<String>, value: String },
}

impl Task {
    pub fn new(title: impl Into<String>, priority: Priority) -> Self {
        Self {
            id: None,
            title: title.into(),
            due_date: None,
            priority,
            description: String::new(),
            completed: false,
            status: None,
        }
    }

    pub fn is_doing(&self) -> bool {
        self.status.as_deref() == Some(DOING_STATUS)
    }

    /// Open tasks whose due date lies strictly before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due < today)
    }

    /// `needle` must already be lowercased.
    pub fn matches_search(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }
}

impl TryFrom<TaskDto> for Task {
    type Error = ModelError;

    fn try_from(dto: TaskDto) -> Result<Self, Self::Error> {
        let due_date = match dto.due_date.as_deref() {
            Some(raw) => parse_due_date(raw).ok_or_else(|| ModelError::InvalidDueDate {
                id: dto.id.clone(),
                value: raw.to_string(),
            })?,
            None => None,
        };

        Ok(Self {
            due_date,
            ..Self::from_dto_without_due_date(dto)
        })
    }
}

impl Task {
    fn from_dto_without_due_date(dto: TaskDto) -> Self {
        Self {
            id: dto.id,
            title: dto.title,
            due_date: None,
            priority: dto.priority,
            description: dto.description,
            completed: dto.completed,
            status: dto.status.filter(|status| !status.is_empty()),
        }
    }
}

impl From<&Task> for TaskDto {
    fn from(task: &Task) -> Self {
        TaskDto {
            id: task.id.clone(),
            title: task.title.clone(),
            due_date: task
                .due_date
                .map(|date| date.format(DUE_DATE_FORMAT).to_string()),
            priority: task.priority,
            description: task.description.clone(),
            completed: task.completed,
            status: task.status.clone(),
        }
    }
}

/// Accepts `YYYY-MM-DD` or a full ISO timestamp; only the date part is kept.
///
/// Returns `Some(None)` for an empty value and `None` when the date is malformed.
pub fn parse_due_date(raw: &str) -> Option<Option<NaiveDate>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(None);
    }
    let date_part = trimmed.split('T').next().unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, DUE_DATE_FORMAT)
        .ok()
        .map(Some)
}

/// A task whose due date cannot be read is kept without one, so a single bad
/// document never hides the rest of the list.
pub fn tasks_from_dtos(dtos: Vec<TaskDto>) -> Vec<Task> {
    dtos.into_iter()
        .map(|dto| {
            Task::try_from(dto.clone()).unwrap_or_else(|error| {
                warn!(error = %error, "dropping unreadable due date");
                Task::from_dto_without_due_date(dto)
            })
        })
        .collect()
}
