use serde::{
  Deserialize,
  Serialize
};

/// Collection endpoint served by
/// the task API.
pub const TASKS_PATH: &str =
  "/api/tasks";

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Hash,
)]
pub enum TaskPriority {
  Low,
  Medium,
  High
}

impl TaskPriority {
  pub fn as_str(self) -> &'static str {
    match self {
      | Self::Low => "Low",
      | Self::Medium => "Medium",
      | Self::High => "High"
    }
  }
}

/// Task as it travels over the wire.
///
/// `_id` is assigned by the server
/// and left out of create bodies.
/// Unknown fields returned by the
/// server (timestamps, version keys)
/// are ignored.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
#[serde(rename_all = "camelCase")]
pub struct TaskDto {
  #[serde(
    rename = "_id",
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub id:          Option<String>,
  pub title:       String,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub due_date:    Option<String>,
  pub priority:    TaskPriority,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub completed:   bool,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub status:      Option<String>
}
