use std::collections::HashMap;
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
use tracing::{
  debug,
  info,
  trace
};

use crate::filter::FilterMode;
use crate::source::DEFAULT_TODOS_URL;

const RC_ENV: &str = "TODOFLOWRC";
const RC_FILE_NAME: &str =
  ".todoflowrc";

#[derive(Debug, Clone)]
pub struct Config {
  map: HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

/// Typed view over [`Config`] with
/// every key resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
  pub api_url:        String,
  pub api_timeout:    Duration,
  pub api_limit:      Option<u64>,
  pub color:          bool,
  pub default_filter: FilterMode
}

impl Config {
  pub fn defaults() -> Self {
    let mut map = HashMap::new();
    map.insert(
      "api.url".to_string(),
      DEFAULT_TODOS_URL.to_string()
    );
    map.insert(
      "api.timeout".to_string(),
      "30".to_string()
    );
    map.insert(
      "color".to_string(),
      "on".to_string()
    );
    map.insert(
      "default.filter".to_string(),
      "all".to_string()
    );

    Config {
      map,
      loaded_files: vec![]
    }
  }

  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Self::defaults();

    match resolve_rc_path(rc_override)?
    {
      | Some(path) => {
        info!(rc = %path.display(), "loading rc file");
        cfg.load_file(&path)?;
      }
      | None => {
        debug!(
          "no rc file found; using \
           defaults"
        );
      }
    }

    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
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
      self.map.insert(key, v);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<&str> {
    self.map.get(key).map(String::as_str)
  }

  pub fn settings(
    &self
  ) -> anyhow::Result<Settings> {
    let api_url = self
      .get("api.url")
      .map(str::trim)
      .filter(|url| !url.is_empty())
      .ok_or_else(|| {
        anyhow!("api.url cannot be empty")
      })?
      .to_string();

    let timeout_secs =
      self.parse_u64("api.timeout")?
        .unwrap_or(30);
    if timeout_secs == 0 {
      return Err(anyhow!(
        "invalid api.timeout: must be \
         at least 1 second"
      ));
    }
    let api_limit =
      self.parse_u64("api.limit")?;

    let color = match self.get("color")
    {
      | Some(raw) => {
        parse_bool(raw).ok_or_else(
          || {
            anyhow!(
              "invalid color setting: \
               {raw}"
            )
          }
        )?
      }
      | None => true
    };

    let default_filter = match self
      .get("default.filter")
    {
      | Some(raw) => {
        raw.parse::<FilterMode>().map_err(
          |bad| {
            anyhow!(
              "invalid default.filter: \
               {bad}"
            )
          }
        )?
      }
      | None => FilterMode::All
    };

    Ok(Settings {
      api_url,
      api_timeout: Duration::from_secs(
        timeout_secs
      ),
      api_limit,
      color,
      default_filter
    })
  }

  fn parse_u64(
    &self,
    key: &str
  ) -> anyhow::Result<Option<u64>> {
    match self.get(key) {
      | None => Ok(None),
      | Some(raw)
        if raw.trim().is_empty() =>
      {
        Ok(None)
      }
      | Some(raw) => {
        raw
          .trim()
          .parse::<u64>()
          .map(Some)
          .with_context(|| {
            format!(
              "invalid {key}: {raw}"
            )
          })
      }
    }
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    self
      .loaded_files
      .push(path.clone());

    let base_dir = path
      .parent()
      .map(Path::to_path_buf)
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });

    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let line =
        strip_comment(raw_line).trim();
      if line.is_empty() {
        continue;
      }

      if let Some(include_rest) =
        line.strip_prefix("include ")
      {
        let include_path =
          resolve_include_path(
            &base_dir,
            include_rest.trim()
          )?;
        debug!(
            file = %path.display(),
            include = %include_path.display(),
            line = line_num + 1,
            "processing include"
        );
        self.load_file(&include_path)?;
        continue;
      }

      let (k, v) = line
        .split_once('=')
        .ok_or_else(|| {
          anyhow!(
            "invalid config line \
             {}:{}: {}",
            path.display(),
            line_num + 1,
            raw_line
          )
        })?;

      let key = k.trim().to_string();
      let value = v.trim().to_string();
      trace!(key = %key, value = %value, "loaded config key");
      self.map.insert(key, value);
    }

    Ok(())
  }
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_rc_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(from_env) =
    std::env::var(RC_ENV)
  {
    if from_env == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      from_env
    )));
  }

  let Some(home) = dirs::home_dir()
  else {
    return Ok(None);
  };
  let candidate =
    home.join(RC_FILE_NAME);
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn resolve_include_path(
  base_dir: &Path,
  include: &str
) -> anyhow::Result<PathBuf> {
  if include.is_empty() {
    return Err(anyhow!(
      "include path cannot be empty"
    ));
  }

  let expanded =
    expand_tilde(Path::new(include));
  if expanded.is_absolute() {
    Ok(expanded)
  } else {
    Ok(base_dir.join(expanded))
  }
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

/// A `#` opens a comment only at the
/// start of a line or after
/// whitespace, so URL fragments stay
/// intact.
fn strip_comment(line: &str) -> &str {
  let mut prev_blank = true;
  for (idx, ch) in line.char_indices()
  {
    if ch == '#' && prev_blank {
      return &line[..idx];
    }
    prev_blank = ch.is_whitespace();
  }
  line
}

fn parse_bool(s: &str) -> Option<bool> {
  match s
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "1" | "y" | "yes" | "on"
    | "true" => Some(true),
    | "0" | "n" | "no" | "off"
    | "false" => Some(false),
    | _ => None
  }
}

#[cfg(test)]
mod tests {
  use std::fs;
  use std::time::Duration;

  use tempfile::tempdir;

  use super::Config;
  use crate::filter::FilterMode;
  use crate::source::DEFAULT_TODOS_URL;

  #[test]
  fn defaults_resolve_to_public_api() {
    let settings = Config::defaults()
      .settings()
      .expect("defaults are valid");
    assert_eq!(
      settings.api_url,
      DEFAULT_TODOS_URL
    );
    assert_eq!(
      settings.api_timeout,
      Duration::from_secs(30)
    );
    assert_eq!(settings.api_limit, None);
    assert!(settings.color);
    assert_eq!(
      settings.default_filter,
      FilterMode::All
    );
  }

  #[test]
  fn rc_file_with_include_and_comments()
  {
    let dir = tempdir().expect("tempdir");
    let extra = dir.path().join("extra.rc");
    fs::write(
      &extra,
      "color = off\napi.limit = 0\n"
    )
    .expect("write include");

    let main = dir.path().join("main.rc");
    fs::write(
      &main,
      "# todoflow settings\n\
       api.url = http://localhost:9/todos  # local\n\
       include extra.rc\n\
       default.filter = pending\n"
    )
    .expect("write rc");

    let cfg = Config::load(Some(&main))
      .expect("load rc");
    assert_eq!(cfg.loaded_files.len(), 2);

    let settings =
      cfg.settings().expect("settings");
    assert_eq!(
      settings.api_url,
      "http://localhost:9/todos"
    );
    assert!(!settings.color);
    assert_eq!(settings.api_limit, Some(0));
    assert_eq!(
      settings.default_filter,
      FilterMode::Pending
    );
  }

  #[test]
  fn overrides_win_over_file_values() {
    let dir = tempdir().expect("tempdir");
    let rc = dir.path().join("rc");
    fs::write(&rc, "api.timeout = 10\n")
      .expect("write rc");

    let mut cfg = Config::load(Some(&rc))
      .expect("load rc");
    cfg.apply_overrides(vec![
      (
        "rc.api.timeout".to_string(),
        "3".to_string()
      ),
      (
        "color".to_string(),
        "no".to_string()
      ),
    ]);

    let settings =
      cfg.settings().expect("settings");
    assert_eq!(
      settings.api_timeout,
      Duration::from_secs(3)
    );
    assert!(!settings.color);
  }

  #[test]
  fn hash_inside_value_is_not_a_comment()
  {
    let dir = tempdir().expect("tempdir");
    let rc = dir.path().join("rc");
    fs::write(
      &rc,
      "api.url = http://host/todos#x # trailing note\n\
       #color = off\n"
    )
    .expect("write rc");

    let settings = Config::load(Some(&rc))
      .expect("load rc")
      .settings()
      .expect("settings");
    assert_eq!(
      settings.api_url,
      "http://host/todos#x"
    );
    assert!(settings.color);
  }

  #[test]
  fn zero_timeout_is_rejected() {
    let mut cfg = Config::defaults();
    cfg.apply_overrides(vec![(
      "api.timeout".to_string(),
      "0".to_string()
    )]);
    let err = cfg
      .settings()
      .expect_err("zero timeout");
    assert!(
      err.to_string().contains("api.timeout")
    );
  }

  #[test]
  fn malformed_line_is_reported() {
    let dir = tempdir().expect("tempdir");
    let rc = dir.path().join("rc");
    fs::write(&rc, "api.url\n")
      .expect("write rc");

    let err = Config::load(Some(&rc))
      .expect_err("should fail");
    assert!(
      err
        .to_string()
        .contains("invalid config line")
    );
  }

  #[test]
  fn bad_typed_values_are_rejected() {
    let mut cfg = Config::defaults();
    cfg.apply_overrides(vec![(
      "api.timeout".to_string(),
      "soon".to_string()
    )]);
    assert!(cfg.settings().is_err());

    let mut cfg = Config::defaults();
    cfg.apply_overrides(vec![(
      "default.filter".to_string(),
      "done".to_string()
    )]);
    assert!(cfg.settings().is_err());
  }
}
