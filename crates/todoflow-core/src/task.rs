use serde::{Deserialize, Serialize};

/// One todo item as the remote API describes it.
///
/// Field names follow the wire format (`todo`, `userId`) so payloads decode
/// without an intermediate DTO.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: u64,

    #[serde(rename = "todo")]
    pub text: String,

    #[serde(default)]
    pub completed: bool,

    #[serde(rename = "userId")]
    pub owner_id: u64,
}

impl Task {
    pub fn new(id: u64, text: impl Into<String>, completed: bool, owner_id: u64) -> Self {
        Self {
            id,
            text: text.into(),
            completed,
            owner_id,
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.completed {
            "Completed"
        } else {
            "In Progress"
        }
    }
}

/// Envelope returned by the todos endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TodoPage {
    pub todos: Vec<Task>,

    #[serde(default)]
    pub total: Option<u64>,

    #[serde(default)]
    pub skip: Option<u64>,

    #[serde(default)]
    pub limit: Option<u64>,
}
