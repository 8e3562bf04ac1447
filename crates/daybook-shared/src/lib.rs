use serde::{
  Deserialize,
  Serialize
};

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
  Pending,
  Completed,
  #[serde(rename = "in-progress")]
  InProgress
}

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
  #[default]
  Sod,
  Eod
}

/// A task record as the API returns it.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct TaskDto {
  pub id:           u64,
  pub task:         String,
  #[serde(default)]
  pub description:  Option<String>,
  #[serde(default = "default_status")]
  pub status:       TaskStatus,
  #[serde(rename = "type", default)]
  pub kind:         TaskType,
  #[serde(default)]
  pub date:         Option<String>,
  #[serde(default)]
  pub created_at:   Option<String>,
  #[serde(default)]
  pub completed_at: Option<String>
}

fn default_status() -> TaskStatus {
  TaskStatus::Pending
}

/// One `{task, description}` pair as
/// sent to the create and SOD email
/// endpoints.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
pub struct TaskInput {
  pub task:        String,
  #[serde(default)]
  pub description: String
}

#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
pub struct CreateTasksRequest {
  pub tasks: Vec<TaskInput>,
  #[serde(rename = "type")]
  pub kind:  TaskType,
  pub date:  Option<String>
}

#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
pub struct StatusUpdate {
  pub status: TaskStatus
}

#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
pub struct SodEmailRequest {
  pub tasks: Vec<TaskInput>
}

#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
pub struct EodEmailRequest {
  #[serde(default)]
  pub date: Option<String>
}
