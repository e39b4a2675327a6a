use std::fs;
use std::path::{
  Path,
  PathBuf
};
use std::time::Duration;

use anyhow::{
  Context,
  anyhow
};
use serde::Deserialize;
use tracing::{
  debug,
  info,
  warn
};

const APP_DIR: &str = "tasklane";
const CONFIG_FILE: &str =
  "config.toml";
const PREFERENCES_FILE: &str =
  "preferences.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  pub api_url:              String,
  pub request_timeout_secs: u64,
  pub notification_secs:    u64,
  pub preferences_path:
    Option<PathBuf>,
  pub user_name: Option<String>,
  pub color:                bool,
  #[serde(skip)]
  pub loaded_file:
    Option<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    Self {
      api_url:              "http://127.0.0.1:5000"
        .to_string(),
      request_timeout_secs: 30,
      notification_secs:    3,
      preferences_path:     None,
      user_name:            None,
      color:                true,
      loaded_file:          None
    }
  }
}

impl Config {
  /// Explicit path first, then the
  /// per-user config file, then the
  /// built-in defaults.
  #[tracing::instrument(skip(
    config_override
  ))]
  pub fn load(
    config_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let path = match config_override {
      | Some(path) => {
        Some(expand_tilde(path))
      }
      | None => default_config_path()
        .filter(|path| path.exists())
    };

    let Some(path) = path else {
      warn!(
        "no config file found; using \
         defaults"
      );
      return Ok(Self::default());
    };

    info!(config = %path.display(), "loading config");
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;
    let mut cfg: Config =
      toml::from_str(&text)
        .with_context(|| {
          format!(
            "failed parsing {}",
            path.display()
          )
        })?;
    cfg.loaded_file = Some(path);
    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) -> anyhow::Result<()>
  where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");

      match key.as_str() {
        | "api_url" => {
          self.api_url = v
        }
        | "request_timeout_secs" => {
          self.request_timeout_secs =
            parse_number(&key, &v)?
        }
        | "notification_secs" => {
          self.notification_secs =
            parse_number(&key, &v)?
        }
        | "preferences_path" => {
          self.preferences_path =
            Some(expand_tilde(
              Path::new(&v)
            ))
        }
        | "user_name" => {
          self.user_name =
            Some(v).filter(|name| {
              !name.trim().is_empty()
            })
        }
        | "color" => {
          self.color = parse_bool(&v)
        }
        | other => {
          return Err(anyhow!(
            "unknown config key \
             {other:?}"
          ));
        }
      }
    }

    Ok(())
  }

  pub fn request_timeout(
    &self
  ) -> Duration {
    Duration::from_secs(
      self.request_timeout_secs
    )
  }

  pub fn notification_ttl(
    &self
  ) -> Duration {
    Duration::from_secs(
      self.notification_secs
    )
  }

  pub fn resolve_preferences_path(
    &self
  ) -> anyhow::Result<PathBuf> {
    if let Some(path) =
      self.preferences_path.as_ref()
    {
      return Ok(expand_tilde(path));
    }

    let dir = dirs::config_dir()
      .ok_or_else(|| {
        anyhow!(
          "cannot determine config \
           directory"
        )
      })?;
    Ok(
      dir
        .join(APP_DIR)
        .join(PREFERENCES_FILE)
    )
  }
}

fn default_config_path()
-> Option<PathBuf> {
  dirs::config_dir().map(|dir| {
    dir.join(APP_DIR).join(CONFIG_FILE)
  })
}

fn parse_number(
  key: &str,
  value: &str
) -> anyhow::Result<u64> {
  value.trim().parse().with_context(
    || {
      format!(
        "invalid number for {key}: \
         {value}"
      )
    }
  )
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> bool {
  matches!(
    s.trim()
      .to_ascii_lowercase()
      .as_str(),
    "1" | "y" | "yes" | "on" | "true"
  )
}
