use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::NaiveDate;

use crate::model::{
  Priority,
  Task
};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
)]
pub enum Filter {
  #[default]
  All,
  Completed,
  Incomplete,
  High,
  Medium,
  Low
}

impl Filter {
  pub fn all() -> [Self; 6] {
    [
      Self::All,
      Self::Completed,
      Self::Incomplete,
      Self::High,
      Self::Medium,
      Self::Low
    ]
  }

  pub fn as_key(self) -> &'static str {
    match self {
      | Self::All => "all",
      | Self::Completed => "completed",
      | Self::Incomplete => {
        "incomplete"
      }
      | Self::High => "high",
      | Self::Medium => "medium",
      | Self::Low => "low"
    }
  }

  pub fn matches(
    self,
    task: &Task
  ) -> bool {
    match self {
      | Self::All => true,
      | Self::Completed => {
        task.completed
      }
      | Self::Incomplete => {
        !task.completed
      }
      | Self::High => {
        task.priority == Priority::High
      }
      | Self::Medium => {
        task.priority
          == Priority::Medium
      }
      | Self::Low => {
        task.priority == Priority::Low
      }
    }
  }
}

impl FromStr for Filter {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    Self::all()
      .into_iter()
      .find(|filter| {
        filter.as_key() == s
      })
      .ok_or_else(|| {
        anyhow!(
          "unknown filter {s:?}; \
           expected one of all, \
           completed, incomplete, \
           high, medium, low"
        )
      })
  }
}

impl fmt::Display for Filter {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_key())
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
)]
pub enum ViewMode {
  #[default]
  Calendar,
  Kanban
}

impl ViewMode {
  pub fn as_key(self) -> &'static str {
    match self {
      | Self::Calendar => "calendar",
      | Self::Kanban => "kanban"
    }
  }
}

impl FromStr for ViewMode {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s {
      | "calendar" | "list" => {
        Ok(Self::Calendar)
      }
      | "kanban" => Ok(Self::Kanban),
      | other => {
        Err(anyhow!(
          "unknown view {other:?}; \
           expected calendar, list \
           or kanban"
        ))
      }
    }
  }
}

impl fmt::Display for ViewMode {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_key())
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
)]
pub enum Theme {
  #[default]
  Light,
  Dark
}

impl Theme {
  pub fn next(self) -> Self {
    match self {
      | Self::Light => Self::Dark,
      | Self::Dark => Self::Light
    }
  }

  pub fn storage_value(
    self
  ) -> &'static str {
    match self {
      | Self::Light => "light",
      | Self::Dark => "dark"
    }
  }

  pub fn greeting(
    self
  ) -> &'static str {
    match self {
      | Self::Light => "Good Morning",
      | Self::Dark => "Good Evening"
    }
  }
}

impl FromStr for Theme {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s {
      | "light" => Ok(Self::Light),
      | "dark" => Ok(Self::Dark),
      | other => {
        Err(anyhow!(
          "unknown theme {other:?}; \
           expected light or dark"
        ))
      }
    }
  }
}

impl fmt::Display for Theme {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.storage_value())
  }
}

/// UI-only modes, independent of the
/// task data. Setters report whether
/// anything changed so the caller
/// knows to re-derive.
#[derive(
  Debug, Clone, PartialEq, Eq, Default,
)]
pub struct ViewState {
  filter:         Filter,
  search_term:    String,
  show_completed: bool,
  view:           ViewMode,
  theme:          Theme
}

impl ViewState {
  pub fn with_theme(
    theme: Theme
  ) -> Self {
    Self {
      theme,
      ..Self::default()
    }
  }

  pub fn filter(&self) -> Filter {
    self.filter
  }

  pub fn search_term(&self) -> &str {
    &self.search_term
  }

  pub fn show_completed(
    &self
  ) -> bool {
    self.show_completed
  }

  pub fn view(&self) -> ViewMode {
    self.view
  }

  pub fn theme(&self) -> Theme {
    self.theme
  }

  pub fn set_filter(
    &mut self,
    filter: Filter
  ) -> bool {
    replace_if_changed(
      &mut self.filter,
      filter
    )
  }

  pub fn set_search_term(
    &mut self,
    term: impl Into<String>
  ) -> bool {
    replace_if_changed(
      &mut self.search_term,
      term.into()
    )
  }

  pub fn set_show_completed(
    &mut self,
    show: bool
  ) -> bool {
    replace_if_changed(
      &mut self.show_completed,
      show
    )
  }

  pub fn toggle_show_completed(
    &mut self
  ) -> bool {
    self.show_completed =
      !self.show_completed;
    self.show_completed
  }

  pub fn set_view(
    &mut self,
    view: ViewMode
  ) -> bool {
    replace_if_changed(
      &mut self.view,
      view
    )
  }

  pub fn set_theme(
    &mut self,
    theme: Theme
  ) -> bool {
    replace_if_changed(
      &mut self.theme,
      theme
    )
  }
}

fn replace_if_changed<T: PartialEq>(
  slot: &mut T,
  value: T
) -> bool {
  if *slot == value {
    return false;
  }
  *slot = value;
  true
}

/// Greeting shown in the header,
/// e.g. `Good Evening, Sam!`.
pub fn greeting(
  theme: Theme,
  user_name: Option<&str>
) -> String {
  match user_name
    .map(str::trim)
    .filter(|name| !name.is_empty())
  {
    | Some(name) => {
      format!(
        "{}, {name}!",
        theme.greeting()
      )
    }
    | None => {
      theme.greeting().to_string()
    }
  }
}

/// `("October 2026", "16,Fri")`
pub fn header_date_lines(
  today: NaiveDate
) -> (String, String) {
  (
    today.format("%B %Y").to_string(),
    today.format("%-d,%a").to_string()
  )
}
