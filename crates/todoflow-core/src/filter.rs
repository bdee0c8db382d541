use std::fmt;
use std::str::FromStr;

use tracing::trace;

use crate::task::Task;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  clap::ValueEnum,
)]
pub enum FilterMode {
  #[default]
  All,
  Completed,
  #[value(alias = "in-progress")]
  Pending
}

impl FilterMode {
  pub fn as_str(&self) -> &'static str {
    match self {
      | FilterMode::All => "all",
      | FilterMode::Completed => {
        "completed"
      }
      | FilterMode::Pending => "pending"
    }
  }

  pub fn admits(
    &self,
    task: &Task
  ) -> bool {
    match self {
      | FilterMode::All => true,
      | FilterMode::Completed => {
        task.completed
      }
      | FilterMode::Pending => {
        !task.completed
      }
    }
  }
}

impl fmt::Display for FilterMode {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for FilterMode {
  type Err = String;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "all" => Ok(FilterMode::All),
      | "completed" => {
        Ok(FilterMode::Completed)
      }
      | "pending" | "in-progress" => {
        Ok(FilterMode::Pending)
      }
      | other => Err(other.to_string())
    }
  }
}

/// Search term plus status filter, as
/// picked on the dashboard.
#[derive(Debug, Clone, Default)]
pub struct ViewQuery {
  search: String,
  needle: String,
  mode:   FilterMode
}

impl ViewQuery {
  pub fn new(
    search: impl Into<String>,
    mode: FilterMode
  ) -> Self {
    let search = search.into();
    let needle = search.to_lowercase();
    Self {
      search,
      needle,
      mode
    }
  }

  pub fn search(&self) -> &str {
    &self.search
  }

  pub fn mode(&self) -> FilterMode {
    self.mode
  }

  pub fn set_search(
    &mut self,
    search: impl Into<String>
  ) {
    *self =
      Self::new(search, self.mode);
  }

  pub fn set_mode(
    &mut self,
    mode: FilterMode
  ) {
    self.mode = mode;
  }

  /// True when the query can hide
  /// tasks.
  pub fn is_narrowed(&self) -> bool {
    !self.search.is_empty()
      || self.mode != FilterMode::All
  }

  pub fn matches(
    &self,
    task: &Task
  ) -> bool {
    let text_ok = self.needle.is_empty()
      || task
        .text
        .to_lowercase()
        .contains(&self.needle);
    let ok =
      text_ok && self.mode.admits(task);
    trace!(id = task.id, ok, "view match");
    ok
  }

  pub fn apply<'a>(
    &self,
    tasks: &'a [Task]
  ) -> Vec<&'a Task> {
    tasks
      .iter()
      .filter(|task| self.matches(task))
      .collect()
  }
}

/// Ordered subsequence of `tasks` whose
/// text contains `search`
/// (case-insensitive) and whose status
/// passes `mode`.
pub fn view<'a>(
  tasks: &'a [Task],
  search: &str,
  mode: FilterMode
) -> Vec<&'a Task> {
  ViewQuery::new(search, mode)
    .apply(tasks)
}
