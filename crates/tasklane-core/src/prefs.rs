use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::view_state::Theme;

/// Durable store for the single persisted preference.
pub trait PreferenceStore {
    fn load_theme(&self) -> anyhow::Result<Option<Theme>>;

    fn save_theme(&mut self, theme: Theme) -> anyhow::Result<()>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    theme: Option<String>,
}

/// `theme = "dark"` kept in a small TOML file, replaced atomically on write.
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FilePreferenceStore {
    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    fn load_theme(&self) -> anyhow::Result<Option<Theme>> {
        if !self.path.exists() {
            debug!("no preferences file yet");
            return Ok(None);
        }

        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let prefs: Preferences = toml::from_str(&text)
            .with_context(|| format!("failed parsing {}", self.path.display()))?;

        prefs.theme.as_deref().map(str::parse::<Theme>).transpose()
    }

    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    fn save_theme(&mut self, theme: Theme) -> anyhow::Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

        let prefs = Preferences {
            theme: Some(theme.storage_value().to_string()),
        };
        let serialized = toml::to_string(&prefs).context("failed serializing preferences")?;

        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(serialized.as_bytes())?;
        temp.flush()?;
        temp.persist(&self.path)
            .map_err(|err| anyhow!("failed to persist {}: {}", self.path.display(), err))?;

        info!(theme = %theme, "saved theme preference");
        Ok(())
    }
}
