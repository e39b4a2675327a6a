use chrono::{Local, NaiveDate};
use tracing::{debug, info, instrument, warn};

use crate::derive::{Derived, derive};
use crate::model::Task;
use crate::notify::{Notifier, NotifyLevel};
use crate::prefs::PreferenceStore;
use crate::remote::{RemoteError, RemoteStore};
use crate::sink::{Header, RenderSink, paint_all};
use crate::store::TaskStore;
use crate::view_state::{Filter, Theme, ViewMode, ViewState, greeting, header_date_lines};

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Application context: owns the task store and view-state for the whole
/// process and the collaborators every repaint goes through.
pub struct Session {
    store: TaskStore,
    view: ViewState,
    prefs: Box<dyn PreferenceStore>,
    sink: Box<dyn RenderSink>,
    notifier: Box<dyn Notifier>,
    user_name: Option<String>,
    today: fn() -> NaiveDate,
}

impl Session {
    /// Reads the persisted theme; a missing or unreadable preference falls
    /// back to light.
    pub fn new(
        prefs: Box<dyn PreferenceStore>,
        sink: Box<dyn RenderSink>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        let theme = match prefs.load_theme() {
            Ok(theme) => theme.unwrap_or_default(),
            Err(error) => {
                warn!(error = %error, "failed loading theme preference; using default");
                Theme::default()
            }
        };
        debug!(theme = %theme, "session starting");

        Self {
            store: TaskStore::new(),
            view: ViewState::with_theme(theme),
            prefs,
            sink,
            notifier,
            user_name: None,
            today: local_today,
        }
    }

    pub fn with_user_name(mut self, user_name: Option<String>) -> Self {
        self.user_name = user_name;
        self
    }

    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn tasks(&self) -> &[Task] {
        self.store.all()
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn today(&self) -> NaiveDate {
        (self.today)()
    }

    pub fn derive(&self) -> Derived {
        derive(self.store.all(), &self.view, self.today())
    }

    pub fn header(&self) -> Header {
        let (month_line, day_line) = header_date_lines(self.today());
        Header {
            greeting: greeting(self.view.theme(), self.user_name.as_deref()),
            month_line,
            day_line,
            theme: self.view.theme(),
            view: self.view.view(),
        }
    }

    pub fn repaint(&mut self) {
        let derived = self.derive();
        let header = self.header();
        paint_all(self.sink.as_mut(), &derived, &self.view, &header);
    }

    pub fn notify(&mut self, message: &str, level: NotifyLevel) {
        debug!(level = %level, text = message, "notification raised");
        self.notifier.notify(message, level);
    }

    /// Fetches the full list and swaps it in. On failure the store is left
    /// exactly as it was.
    #[instrument(skip_all)]
    pub async fn refresh<R: RemoteStore>(&mut self, remote: &R) -> Result<(), RemoteError> {
        let ticket = self.store.begin_refresh();
        let tasks = remote.list().await?;
        if self.store.apply(ticket, tasks) {
            info!(count = self.store.len(), seq = ticket.seq(), "task store refreshed");
            self.repaint();
        }
        Ok(())
    }

    pub fn set_filter(&mut self, filter: Filter) {
        if self.view.set_filter(filter) {
            self.repaint();
        }
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        if self.view.set_search_term(term) {
            self.repaint();
        }
    }

    pub fn set_show_completed(&mut self, show: bool) {
        if self.view.set_show_completed(show) {
            self.repaint();
        }
    }

    pub fn toggle_show_completed(&mut self) -> bool {
        let shown = self.view.toggle_show_completed();
        self.repaint();
        shown
    }

    pub fn set_view(&mut self, view: ViewMode) {
        if self.view.set_view(view) {
            self.repaint();
        }
        self.notify(&format!("Switched to {view} view"), NotifyLevel::Info);
    }

    /// Persisting is best-effort: a write failure is logged and otherwise
    /// ignored.
    pub fn set_theme(&mut self, theme: Theme) {
        let changed = self.view.set_theme(theme);
        if let Err(error) = self.prefs.save_theme(theme) {
            warn!(error = %error, theme = %theme, "failed persisting theme preference");
        }
        if changed {
            self.repaint();
        }
    }

    pub fn toggle_theme(&mut self) -> Theme {
        let next = self.view.theme().next();
        self.set_theme(next);
        next
    }
}
