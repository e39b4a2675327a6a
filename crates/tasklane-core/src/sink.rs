use crate::derive::{Card, Derived};
use crate::view_state::{Theme, ViewMode, ViewState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    SidebarTasks,
    CompletedTasks,
    TodoTasks,
    DoingTasks,
    DoneTasks,
}

impl Surface {
    pub fn id(self) -> &'static str {
        match self {
            Self::SidebarTasks => "sidebarTasks",
            Self::CompletedTasks => "completedTasks",
            Self::TodoTasks => "todoTasks",
            Self::DoingTasks => "doingTasks",
            Self::DoneTasks => "doneTasks",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    TodoCount,
    DoingCount,
    DoneCount,
    CompletedCount,
}

impl Counter {
    pub fn id(self) -> &'static str {
        match self {
            Self::TodoCount => "todoCount",
            Self::DoingCount => "doingCount",
            Self::DoneCount => "doneCount",
            Self::CompletedCount => "completedCount",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub greeting: String,
    pub month_line: String,
    pub day_line: String,
    pub theme: Theme,
    pub view: ViewMode,
}

/// Stateless consumer of derived partitions.
pub trait RenderSink {
    fn paint(&mut self, surface: Surface, items: &[Card]);

    fn set_count(&mut self, counter: Counter, n: usize);

    fn set_section_visible(&mut self, _surface: Surface, _visible: bool) {}

    fn set_header(&mut self, _header: &Header) {}

    /// Called once every surface of a frame has been painted.
    fn flush(&mut self) {}
}

#[tracing::instrument(skip_all, fields(view = %view.view(), filter = %view.filter()))]
pub fn paint_all(sink: &mut dyn RenderSink, derived: &Derived, view: &ViewState, header: &Header) {
    sink.set_header(header);

    sink.paint(Surface::SidebarTasks, &derived.sidebar_incomplete);
    sink.paint(Surface::CompletedTasks, &derived.sidebar_completed);
    sink.set_section_visible(Surface::CompletedTasks, view.show_completed());
    sink.set_count(Counter::CompletedCount, derived.completed_count());

    sink.paint(Surface::TodoTasks, &derived.kanban_todo);
    sink.paint(Surface::DoingTasks, &derived.kanban_doing);
    sink.paint(Surface::DoneTasks, &derived.kanban_done);

    sink.set_count(Counter::TodoCount, derived.counts.todo);
    sink.set_count(Counter::DoingCount, derived.counts.doing);
    sink.set_count(Counter::DoneCount, derived.counts.done);

    sink.flush();
}
