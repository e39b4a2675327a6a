use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, BufRead, IsTerminal, Write};
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::debug;
use unicode_width::UnicodeWidthStr;

use crate::controller::Confirm;
use crate::derive::{Card, Lane};
use crate::notify::{NotificationSlot, Notifier, NotifyLevel};
use crate::sink::{Counter, Header, RenderSink, Surface};
use crate::view_state::ViewMode;

/// Last complete set of painted surfaces.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub header: Option<Header>,
    pub surfaces: HashMap<Surface, Vec<Card>>,
    pub counts: HashMap<Counter, usize>,
    pub completed_visible: bool,
    pub painted: bool,
}

impl Frame {
    pub fn surface(&self, surface: Surface) -> &[Card] {
        self.surfaces.get(&surface).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, counter: Counter) -> usize {
        self.counts.get(&counter).copied().unwrap_or(0)
    }
}

/// Render sink that fills a shared `Frame` for the terminal to print.
#[derive(Debug, Clone, Default)]
pub struct FrameSink {
    pending: Frame,
    shared: Rc<RefCell<Frame>>,
}

impl FrameSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame(&self) -> Rc<RefCell<Frame>> {
        Rc::clone(&self.shared)
    }
}

impl RenderSink for FrameSink {
    fn paint(&mut self, surface: Surface, items: &[Card]) {
        self.pending.surfaces.insert(surface, items.to_vec());
    }

    fn set_count(&mut self, counter: Counter, n: usize) {
        self.pending.counts.insert(counter, n);
    }

    fn set_section_visible(&mut self, surface: Surface, visible: bool) {
        if surface == Surface::CompletedTasks {
            self.pending.completed_visible = visible;
        }
    }

    fn set_header(&mut self, header: &Header) {
        self.pending.header = Some(header.clone());
    }

    fn flush(&mut self) {
        let mut frame = std::mem::take(&mut self.pending);
        frame.painted = true;
        *self.shared.borrow_mut() = frame;
    }
}

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self {
            color: color && io::stdout().is_terminal(),
        }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip_all)]
    pub fn write_frame<W: Write>(&self, mut out: W, frame: &Frame) -> anyhow::Result<()> {
        if !frame.painted {
            writeln!(out, "(no tasks loaded)")?;
            return Ok(());
        }

        let view = frame
            .header
            .as_ref()
            .map(|header| header.view)
            .unwrap_or_default();

        if let Some(header) = frame.header.as_ref() {
            writeln!(out, "{}", self.paint(&header.greeting, "1"))?;
            writeln!(
                out,
                "{}  {}  [{} theme, {} view]",
                header.month_line, header.day_line, header.theme, header.view
            )?;
            writeln!(out)?;
        }

        self.write_sidebar(&mut out, frame)?;
        writeln!(out)?;

        match view {
            ViewMode::Kanban => self.write_board(&mut out, frame)?,
            ViewMode::Calendar => self.write_list(&mut out, frame)?,
        }

        Ok(())
    }

    fn write_sidebar<W: Write>(&self, out: &mut W, frame: &Frame) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint("Tasks", "1"))?;
        let open = frame.surface(Surface::SidebarTasks);
        if open.is_empty() {
            writeln!(out, "  (nothing to do)")?;
        }
        for card in open {
            writeln!(out, "  [ ] {} {}", card.task.title, self.paint(&id_label(card), "33"))?;
        }

        let completed_count = frame.count(Counter::CompletedCount);
        let arrow = if frame.completed_visible { "v" } else { ">" };
        writeln!(out, "{arrow} Completed ({completed_count})")?;
        if frame.completed_visible {
            for card in frame.surface(Surface::CompletedTasks) {
                writeln!(out, "  [x] {} {}", self.paint(&card.task.title, "2"), self.paint(&id_label(card), "33"))?;
            }
        }
        Ok(())
    }

    fn write_board<W: Write>(&self, out: &mut W, frame: &Frame) -> anyhow::Result<()> {
        let lanes = [
            (Lane::Todo, Surface::TodoTasks, Counter::TodoCount),
            (Lane::Doing, Surface::DoingTasks, Counter::DoingCount),
            (Lane::Done, Surface::DoneTasks, Counter::DoneCount),
        ];

        for (lane, surface, counter) in lanes {
            writeln!(out, "{} ({})", self.paint(lane.label(), "1"), frame.count(counter))?;
            let rows: Vec<Vec<String>> = frame
                .surface(surface)
                .iter()
                .filter(|card| card.visible)
                .map(|card| self.card_row(card))
                .collect();
            if rows.is_empty() {
                writeln!(out, "  -")?;
            } else {
                write_table(&mut *out, card_headers(), rows)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    fn write_list<W: Write>(&self, out: &mut W, frame: &Frame) -> anyhow::Result<()> {
        let rows: Vec<Vec<String>> = [Surface::TodoTasks, Surface::DoingTasks, Surface::DoneTasks]
            .into_iter()
            .flat_map(|surface| frame.surface(surface).iter())
            .filter(|card| card.visible)
            .map(|card| self.card_row(card))
            .collect();

        if rows.is_empty() {
            writeln!(out, "No tasks match the current filter.")?;
            return Ok(());
        }
        write_table(&mut *out, card_headers(), rows)
    }

    fn card_row(&self, card: &Card) -> Vec<String> {
        let due = card.due_label().unwrap_or_default();
        let due = if card.overdue { self.paint(&due, "31") } else { due };
        let priority_code = match card.task.priority.as_str() {
            "High" => "31",
            "Medium" => "33",
            _ => "32",
        };
        let actions = card
            .actions()
            .iter()
            .map(|action| action.label())
            .collect::<Vec<_>>()
            .join("/");

        vec![
            self.paint(card.id().unwrap_or("-"), "33"),
            card.task.title.clone(),
            due,
            self.paint(card.task.priority.as_str(), priority_code),
            card.task.description.clone(),
            actions,
        ]
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn id_label(card: &Card) -> String {
    format!("({})", card.id().unwrap_or("-"))
}

fn card_headers() -> Vec<String> {
    ["ID", "Title", "Due", "Priority", "Description", "Actions"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn write_table<W: Write>(mut writer: W, headers: Vec<String>, rows: Vec<Vec<String>>) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

/// Prints each notification to stderr as it replaces the previous one.
#[derive(Debug, Clone)]
pub struct TerminalNotifier {
    slot: NotificationSlot,
    color: bool,
}

impl TerminalNotifier {
    pub fn new(ttl: Duration, color: bool) -> Self {
        Self {
            slot: NotificationSlot::new(ttl),
            color: color && io::stderr().is_terminal(),
        }
    }
}

impl TerminalNotifier {
    /// Records the notification and reports whether it needs printing. The
    /// same message at the same level is not repeated while it is still
    /// showing.
    fn admit(&mut self, message: &str, level: NotifyLevel, now: Instant) -> bool {
        let repeat = self
            .slot
            .visible_at(now)
            .is_some_and(|shown| shown.message == message && shown.level == level);
        self.slot.show(message, level, now);
        if repeat {
            debug!(text = message, "notification already showing");
        }
        !repeat
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&mut self, message: &str, level: NotifyLevel) {
        if !self.admit(message, level, Instant::now()) {
            return;
        }
        let code = match level {
            NotifyLevel::Info => "34",
            NotifyLevel::Success => "32",
            NotifyLevel::Warning => "33",
            NotifyLevel::Error => "31",
        };
        let tag = format!("[{level}]");
        let tag = if self.color {
            format!("\x1b[{code}m{tag}\x1b[0m")
        } else {
            tag
        };
        eprintln!("{tag} {message}");
    }
}

/// Reads `y`/`yes` from stdin; `assume_yes` skips the prompt entirely.
#[derive(Debug, Clone, Copy)]
pub struct StdinConfirm {
    assume_yes: bool,
}

impl StdinConfirm {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Confirm for StdinConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        if self.assume_yes {
            debug!(prompt, "auto-confirmed");
            return true;
        }

        eprint!("{prompt} [y/N] ");
        let _ = io::stderr().flush();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}
