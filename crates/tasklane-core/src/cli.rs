use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::model::{Priority, parse_due_date};
use crate::view_state::{Filter, ViewMode};

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "tasklane",
    version,
    about = "Tasklane: task list and kanban board for a remote task API"
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Answer yes to every confirmation prompt.
    #[arg(short = 'y', long = "yes", global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show the sidebar and board (default).
    List(ListArgs),
    /// Create a task.
    Add(AddArgs),
    /// Change fields of an existing task.
    Edit(EditArgs),
    /// Toggle a task between open and completed.
    Done { id: String },
    /// Delete a task.
    #[command(alias = "rm")]
    Delete { id: String },
    /// Delete every completed task.
    ClearCompleted,
    /// Delete every task.
    ClearAll,
    /// Show, set or toggle the persisted theme.
    Theme { mode: Option<ThemeArg> },
    /// Interactive session keeping filter, search and view between commands.
    Shell,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    #[arg(long, value_parser = parse_filter)]
    pub filter: Option<Filter>,

    #[arg(long)]
    pub search: Option<String>,

    #[arg(long, value_parser = parse_view)]
    pub view: Option<ViewMode>,

    #[arg(long = "show-completed")]
    pub show_completed: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    #[arg(required = true, num_args = 1..)]
    pub title: Vec<String>,

    #[arg(long, value_parser = parse_due)]
    pub due: Option<DueArg>,

    #[arg(long, value_enum)]
    pub priority: Option<PriorityArg>,

    #[arg(long, short = 'd')]
    pub description: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    /// `YYYY-MM-DD`, or an empty value to clear the date.
    #[arg(long, value_parser = parse_due)]
    pub due: Option<DueArg>,

    #[arg(long, value_enum)]
    pub priority: Option<PriorityArg>,

    #[arg(long, short = 'd')]
    pub description: Option<String>,
}

/// `--due` value; empty means "no due date".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueArg(pub Option<NaiveDate>);

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityArg {
    Low,
    Medium,
    High,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Low => Priority::Low,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::High => Priority::High,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeArg {
    Light,
    Dark,
    Toggle,
}

/// One line typed into `tasklane shell`.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "tasklane>",
    no_binary_name = true,
    disable_version_flag = true,
    help_template = "{subcommands}"
)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: ShellCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ShellCommand {
    #[command(alias = "ls")]
    List,
    Add(AddArgs),
    Edit(EditArgs),
    Done { id: String },
    #[command(alias = "rm")]
    Delete { id: String },
    ClearCompleted,
    ClearAll,
    Theme { mode: Option<ThemeArg> },
    /// all, completed, incomplete, high, medium, low
    Filter {
        #[arg(value_parser = parse_filter)]
        filter: Filter,
    },
    /// Hide board cards not matching the term; no term clears the search.
    Search { term: Vec<String> },
    /// calendar (or list) / kanban
    View {
        #[arg(value_parser = parse_view)]
        view: ViewMode,
    },
    /// Show or hide the completed section of the sidebar.
    Completed,
    /// Close the add/edit form without saving.
    Cancel,
    /// Fetch the task list again.
    Reload,
    #[command(alias = "exit")]
    Quit,
}

fn parse_filter(s: &str) -> anyhow::Result<Filter> {
    s.parse()
}

fn parse_view(s: &str) -> anyhow::Result<ViewMode> {
    s.parse()
}

fn parse_due(s: &str) -> anyhow::Result<DueArg> {
    parse_due_date(s)
        .map(DueArg)
        .ok_or_else(|| anyhow!("expected YYYY-MM-DD, got: {s}"))
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Splits a shell line on whitespace, keeping double-quoted runs together.
pub fn tokenize(line: &str) -> anyhow::Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }

    if in_quotes {
        return Err(anyhow!("unterminated quote"));
    }
    if has_token {
        tokens.push(current);
    }
    Ok(tokens)
}
