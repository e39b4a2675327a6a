//! Pure mapping from the task store and view-state to the render partitions.

use chrono::NaiveDate;

use crate::model::Task;
use crate::view_state::ViewState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    Todo,
    Doing,
    Done,
}

impl Lane {
    /// Completed wins over any status; only `"doing"` leaves the todo lane.
    pub fn for_task(task: &Task) -> Self {
        if task.completed {
            Self::Done
        } else if task.is_doing() {
            Self::Doing
        } else {
            Self::Todo
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Todo => "To Do",
            Self::Doing => "Doing",
            Self::Done => "Done",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardAction {
    Complete,
    Edit,
    Undo,
    Delete,
}

impl CardAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::Complete => "Complete",
            Self::Edit => "Edit",
            Self::Undo => "Undo",
            Self::Delete => "Delete",
        }
    }
}

/// A task plus the presentation flags computed for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub task: Task,
    pub overdue: bool,
    pub visible: bool,
}

impl Card {
    fn new(task: &Task, today: NaiveDate) -> Self {
        Self {
            task: task.clone(),
            overdue: task.is_overdue(today),
            visible: true,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.task.id.as_deref()
    }

    /// `"Oct 16"`, or `"Oct 16 (Overdue)"`.
    pub fn due_label(&self) -> Option<String> {
        self.task.due_date.map(|due| {
            let label = due.format("%b %-d").to_string();
            if self.overdue {
                format!("{label} (Overdue)")
            } else {
                label
            }
        })
    }

    pub fn actions(&self) -> &'static [CardAction] {
        if self.task.completed {
            &[CardAction::Undo, CardAction::Delete]
        } else {
            &[CardAction::Complete, CardAction::Edit, CardAction::Delete]
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub todo: usize,
    pub doing: usize,
    pub done: usize,
}

impl Counts {
    /// Always taken over the whole store, never the filtered view.
    pub fn of(tasks: &[Task]) -> Self {
        tasks
            .iter()
            .fold(Self::default(), |mut counts, task| {
                match Lane::for_task(task) {
                    Lane::Todo => counts.todo += 1,
                    Lane::Doing => counts.doing += 1,
                    Lane::Done => counts.done += 1,
                }
                counts
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Derived {
    pub sidebar_incomplete: Vec<Card>,
    pub sidebar_completed: Vec<Card>,
    pub kanban_todo: Vec<Card>,
    pub kanban_doing: Vec<Card>,
    pub kanban_done: Vec<Card>,
    pub counts: Counts,
}

impl Derived {
    pub fn lane(&self, lane: Lane) -> &[Card] {
        match lane {
            Lane::Todo => &self.kanban_todo,
            Lane::Doing => &self.kanban_doing,
            Lane::Done => &self.kanban_done,
        }
    }

    /// Size of the filtered completed section, shown as `(n)` in the sidebar.
    pub fn completed_count(&self) -> usize {
        self.sidebar_completed.len()
    }

    fn kanban_cards_mut(&mut self) -> impl Iterator<Item = &mut Card> {
        self.kanban_todo
            .iter_mut()
            .chain(self.kanban_doing.iter_mut())
            .chain(self.kanban_done.iter_mut())
    }
}

pub fn derive(tasks: &[Task], view: &ViewState, today: NaiveDate) -> Derived {
    let filter = view.filter();
    let mut derived = Derived {
        counts: Counts::of(tasks),
        ..Derived::default()
    };

    for task in tasks.iter().filter(|task| filter.matches(task)) {
        let card = Card::new(task, today);

        if task.completed {
            derived.sidebar_completed.push(card.clone());
        } else {
            derived.sidebar_incomplete.push(card.clone());
        }

        match Lane::for_task(task) {
            Lane::Todo => derived.kanban_todo.push(card),
            Lane::Doing => derived.kanban_doing.push(card),
            Lane::Done => derived.kanban_done.push(card),
        }
    }

    apply_search(&mut derived, view.search_term());
    derived
}

/// Hides kanban cards that do not match `term`; partitions and counts stay put.
pub fn apply_search(derived: &mut Derived, term: &str) {
    let needle = term.trim().to_lowercase();
    for card in derived.kanban_cards_mut() {
        card.visible = card.task.matches_search(&needle);
    }
}
