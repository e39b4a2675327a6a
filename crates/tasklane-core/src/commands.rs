use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info, instrument, warn};

use crate::cli::{AddArgs, Command, DueArg, EditArgs, ListArgs, ShellCommand, ShellLine, ThemeArg, tokenize};
use crate::config::Config;
use crate::controller::{ActionController, ActionOutcome};
use crate::http::HttpRemoteStore;
use crate::prefs::FilePreferenceStore;
use crate::render::{Frame, FrameSink, Renderer, StdinConfirm, TerminalNotifier};
use crate::session::Session;
use crate::view_state::Theme;

enum Step {
    Outcome(ActionOutcome),
    Shown,
    Quit,
}

/// Terminal front end: one session, one controller, one frame to print.
struct App {
    session: Session,
    controller: ActionController<HttpRemoteStore>,
    frame: Rc<RefCell<Frame>>,
    renderer: Renderer,
}

impl App {
    fn build(cfg: &Config, assume_yes: bool) -> anyhow::Result<Self> {
        match cfg.loaded_file.as_ref() {
            Some(path) => info!(config = %path.display(), api_url = %cfg.api_url, "using config file"),
            None => info!(api_url = %cfg.api_url, "using built-in config defaults"),
        }
        let remote = HttpRemoteStore::new(&cfg.api_url, cfg.request_timeout())?;
        let prefs_path = cfg
            .resolve_preferences_path()
            .context("failed to resolve preferences path")?;
        debug!(prefs = %prefs_path.display(), "using preferences file");

        let sink = FrameSink::new();
        let frame = sink.frame();
        let session = Session::new(
            Box::new(FilePreferenceStore::new(prefs_path)),
            Box::new(sink),
            Box::new(TerminalNotifier::new(cfg.notification_ttl(), cfg.color)),
        )
        .with_user_name(cfg.user_name.clone());

        Ok(Self {
            session,
            controller: ActionController::new(remote, Box::new(StdinConfirm::new(assume_yes))),
            frame,
            renderer: Renderer::new(cfg.color),
        })
    }

    fn print_frame(&self) -> anyhow::Result<()> {
        let out = io::stdout().lock();
        self.renderer.write_frame(out, &self.frame.borrow())
    }

    fn apply_list_args(&mut self, args: ListArgs) {
        if let Some(filter) = args.filter {
            self.session.set_filter(filter);
        }
        if let Some(term) = args.search {
            self.session.set_search_term(term);
        }
        if let Some(view) = args.view {
            self.session.set_view(view);
        }
        if args.show_completed {
            self.session.set_show_completed(true);
        }
    }

    fn apply_theme(&mut self, mode: Option<ThemeArg>) -> Theme {
        match mode {
            Some(ThemeArg::Light) => self.session.set_theme(Theme::Light),
            Some(ThemeArg::Dark) => self.session.set_theme(Theme::Dark),
            Some(ThemeArg::Toggle) => {
                self.session.toggle_theme();
            }
            None => {}
        }
        self.session.view().theme()
    }

    async fn add(&mut self, args: AddArgs) -> ActionOutcome {
        let mut form = self.controller.start_add(&self.session);
        form.title = args.title.join(" ");
        if let Some(DueArg(due)) = args.due {
            form.due_date = due;
        }
        if let Some(priority) = args.priority {
            form.priority = priority.into();
        }
        if let Some(description) = args.description {
            form.description = description;
        }
        self.controller.submit(&mut self.session, form).await
    }

    async fn edit(&mut self, args: EditArgs) -> ActionOutcome {
        let Some(mut form) = self.controller.start_edit(&mut self.session, &args.id) else {
            warn!(task_id = %args.id, "no task with this id");
            return ActionOutcome::NotFound;
        };
        if let Some(title) = args.title {
            form.title = title;
        }
        if let Some(DueArg(due)) = args.due {
            form.due_date = due;
        }
        if let Some(priority) = args.priority {
            form.priority = priority.into();
        }
        if let Some(description) = args.description {
            form.description = description;
        }
        self.controller.submit(&mut self.session, form).await
    }

    #[instrument(skip(self))]
    async fn execute(&mut self, command: ShellCommand) -> Step {
        let outcome = match command {
            ShellCommand::List => return Step::Shown,
            ShellCommand::Add(args) => self.add(args).await,
            ShellCommand::Edit(args) => self.edit(args).await,
            ShellCommand::Done { id } => self.controller.toggle_complete(&mut self.session, &id).await,
            ShellCommand::Delete { id } => self.controller.delete(&mut self.session, &id).await,
            ShellCommand::ClearCompleted => self.controller.clear_completed(&mut self.session).await,
            ShellCommand::ClearAll => self.controller.clear_all(&mut self.session).await,
            ShellCommand::Reload => self.controller.load(&mut self.session).await,
            ShellCommand::Theme { mode } => {
                let theme = self.apply_theme(mode);
                println!("theme: {theme}");
                return Step::Shown;
            }
            ShellCommand::Filter { filter } => {
                self.session.set_filter(filter);
                return Step::Shown;
            }
            ShellCommand::Search { term } => {
                self.session.set_search_term(term.join(" "));
                return Step::Shown;
            }
            ShellCommand::View { view } => {
                self.session.set_view(view);
                return Step::Shown;
            }
            ShellCommand::Completed => {
                self.session.toggle_show_completed();
                return Step::Shown;
            }
            ShellCommand::Cancel => {
                self.controller.cancel();
                return Step::Shown;
            }
            ShellCommand::Quit => return Step::Quit,
        };
        Step::Outcome(outcome)
    }

    async fn shell(&mut self) -> anyhow::Result<()> {
        self.print_frame()?;
        let stdin = io::stdin();
        let mut lines = stdin.lock().lines();

        loop {
            print!("tasklane> ");
            io::stdout().flush()?;

            let Some(line) = lines.next() else {
                break;
            };
            let tokens = match tokenize(&line?) {
                Ok(tokens) if tokens.is_empty() => continue,
                Ok(tokens) => tokens,
                Err(err) => {
                    eprintln!("{err}");
                    continue;
                }
            };

            let parsed = match ShellLine::try_parse_from(tokens) {
                Ok(parsed) => parsed,
                Err(err) => {
                    let _ = err.print();
                    continue;
                }
            };

            // Stdin stays free for confirmation prompts while the action runs.
            drop(lines);
            let step = self.execute(parsed.command).await;
            lines = stdin.lock().lines();

            match step {
                Step::Quit => break,
                Step::Outcome(_) | Step::Shown => self.print_frame()?,
            }
        }

        info!("shell closed");
        Ok(())
    }
}

fn outcome_to_result(outcome: ActionOutcome) -> anyhow::Result<()> {
    match outcome {
        ActionOutcome::Failed(err) => Err(err.into()),
        ActionOutcome::Invalid(err) => Err(err.into()),
        ActionOutcome::Applied
        | ActionOutcome::NotFound
        | ActionOutcome::Cancelled
        | ActionOutcome::NothingToClear => Ok(()),
    }
}

#[instrument(skip_all)]
pub async fn dispatch(cfg: &Config, assume_yes: bool, command: Command) -> anyhow::Result<()> {
    let mut app = App::build(cfg, assume_yes)?;

    if let Command::Theme { mode } = command {
        let theme = app.apply_theme(mode);
        println!("theme: {theme} ({})", theme.greeting());
        return Ok(());
    }

    let loaded = app.controller.load(&mut app.session).await;
    if let ActionOutcome::Failed(err) = loaded {
        if matches!(command, Command::Shell) {
            warn!(error = %err, "starting shell without tasks; use `reload` to retry");
        } else {
            return Err(err).with_context(|| format!("could not load tasks from {}", cfg.api_url));
        }
    }

    let shell_command = match command {
        Command::Shell => return app.shell().await,
        Command::List(args) => {
            app.apply_list_args(args);
            ShellCommand::List
        }
        Command::Add(args) => ShellCommand::Add(args),
        Command::Edit(args) => ShellCommand::Edit(args),
        Command::Done { id } => ShellCommand::Done { id },
        Command::Delete { id } => ShellCommand::Delete { id },
        Command::ClearCompleted => ShellCommand::ClearCompleted,
        Command::ClearAll => ShellCommand::ClearAll,
        Command::Theme { mode } => ShellCommand::Theme { mode },
    };

    match app.execute(shell_command).await {
        Step::Outcome(outcome) => {
            app.print_frame()?;
            outcome_to_result(outcome)
        }
        Step::Shown => app.print_frame(),
        Step::Quit => Ok(()),
    }
}

/// Parses a line the way `tasklane shell` does.
pub fn parse_shell_line(line: &str) -> anyhow::Result<ShellCommand> {
    let tokens = tokenize(line)?;
    Ok(ShellLine::try_parse_from(tokens)?.command)
}

#[cfg(test)]
mod tests {
    use super::parse_shell_line;
    use crate::cli::{ShellCommand, ThemeArg};
    use crate::view_state::ViewMode;

    #[test]
    fn shell_lines_map_to_commands() {
        match parse_shell_line(r#"add "Buy milk" --priority low"#).unwrap() {
            ShellCommand::Add(args) => assert_eq!(args.title, vec!["Buy milk"]),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            parse_shell_line("view kanban").unwrap(),
            ShellCommand::View {
                view: ViewMode::Kanban
            }
        ));
        assert!(matches!(
            parse_shell_line("theme toggle").unwrap(),
            ShellCommand::Theme {
                mode: Some(ThemeArg::Toggle)
            }
        ));
        assert!(matches!(
            parse_shell_line("search").unwrap(),
            ShellCommand::Search { term } if term.is_empty()
        ));
        assert!(parse_shell_line("frobnicate").is_err());
    }
}
