/// The remote source could not produce a task list.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),
    #[error("failed to fetch todos from {url}: {reason}")]
    Transport { url: String, reason: String },
    #[error("failed to fetch todos: {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("failed to decode todos from {url}: {reason}")]
    Decode { url: String, reason: String },
}

/// Rejected input for a new task. The store is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("task description is required")]
    EmptyText,
    #[error("user ID is required")]
    MissingOwner,
    #[error("user ID must be a positive integer, got {0:?}")]
    InvalidOwner(String),
    #[error("no task id left above the current maximum")]
    IdSpaceExhausted,
}

/// A session command that could not be carried out.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("unknown command: {0} (try 'help')")]
    UnknownCommand(String),
    #[error("{command} needs an argument: {hint}")]
    MissingArgument {
        command: &'static str,
        hint: &'static str,
    },
    #[error("invalid filter: {0} (expected all, completed or pending)")]
    InvalidFilter(String),
    #[error("'{0}' is only available on the add page (use 'new' first)")]
    NotOnAddPage(&'static str),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
