use anyhow::anyhow;
use chrono::NaiveDate;
use daybook_shared::{TaskDto, TaskInput, TaskStatus};
use serde::{Deserialize, Serialize};

pub use daybook_shared::TaskType;

use crate::date::{day_of_timestamp, parse_iso_day};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Completed,
}

impl Status {
    pub fn from_completed(completed: bool) -> Self {
        if completed {
            Status::Completed
        } else {
            Status::Pending
        }
    }

    pub fn is_completed(self) -> bool {
        self == Status::Completed
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Completed => "completed",
        }
    }

    pub fn to_wire(self) -> TaskStatus {
        match self {
            Status::Pending => TaskStatus::Pending,
            Status::Completed => TaskStatus::Completed,
        }
    }
}

impl From<TaskStatus> for Status {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Completed => Status::Completed,
            TaskStatus::Pending | TaskStatus::InProgress => Status::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: u64,

    pub task: String,

    #[serde(default)]
    pub description: Option<String>,

    pub status: Status,

    pub date: NaiveDate,

    #[serde(rename = "type", default)]
    pub kind: TaskType,

    #[serde(default)]
    pub created_at: Option<String>,

    #[serde(default)]
    pub completed_at: Option<String>,
}

impl Task {
    /// `fallback_date` is the day the caller queried for; it is used when the
    /// record carries neither `date` nor `created_at`.
    pub fn from_dto(dto: TaskDto, fallback_date: Option<NaiveDate>) -> anyhow::Result<Self> {
        let date = match dto.date.as_deref() {
            Some(raw) => Some(parse_iso_day(raw)?),
            None => dto.created_at.as_deref().and_then(day_of_timestamp),
        }
        .or(fallback_date)
        .ok_or_else(|| anyhow!("task {} has no date", dto.id))?;

        Ok(Self {
            id: dto.id,
            task: dto.task,
            description: dto.description.filter(|d| !d.trim().is_empty()),
            status: dto.status.into(),
            date,
            kind: dto.kind,
            created_at: dto.created_at,
            completed_at: dto.completed_at,
        })
    }

    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }
}

pub fn tasks_from_dtos(
    dtos: Vec<TaskDto>,
    fallback_date: Option<NaiveDate>,
) -> anyhow::Result<Vec<Task>> {
    dtos.into_iter()
        .map(|dto| Task::from_dto(dto, fallback_date))
        .collect()
}

/// An unsaved task row, identified only by its position until persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub task: String,
    pub description: String,
}

impl TaskDraft {
    pub fn new(task: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            description: description.into(),
        }
    }

    /// Accepts `TITLE` or `TITLE::NOTE`.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once("::") {
            Some((task, note)) => Self::new(task.trim(), note.trim()),
            None => Self::new(raw.trim(), ""),
        }
    }

    pub fn from_task(task: &Task) -> Self {
        Self::new(task.task.clone(), task.description.clone().unwrap_or_default())
    }

    pub fn is_blank(&self) -> bool {
        self.task.trim().is_empty()
    }

    pub fn to_input(&self) -> TaskInput {
        TaskInput {
            task: self.task.clone(),
            description: self.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Task,
    Description,
}

#[derive(Debug, Default)]
pub struct Partition<'a> {
    pub completed: Vec<&'a Task>,
    pub incomplete: Vec<&'a Task>,
}

pub fn partition(tasks: &[Task]) -> Partition<'_> {
    let (completed, incomplete): (Vec<&Task>, Vec<&Task>) =
        tasks.iter().partition(|task| task.is_completed());
    Partition {
        completed,
        incomplete,
    }
}

pub fn visible(tasks: &[Task], hide_completed: bool) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|task| !hide_completed || !task.is_completed())
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use daybook_shared::{TaskDto, TaskStatus, TaskType};

    use super::{Status, Task, TaskDraft, partition, visible};

    fn dto(id: u64, status: TaskStatus) -> TaskDto {
        TaskDto {
            id,
            task: format!("task {id}"),
            description: Some(String::new()),
            status,
            kind: TaskType::Sod,
            date: None,
            created_at: Some("2024-01-15T08:00:00".to_string()),
            completed_at: None,
        }
    }

    #[test]
    fn dto_date_falls_back_to_created_at() {
        let task = Task::from_dto(dto(1, TaskStatus::InProgress), None).expect("convert");
        assert_eq!(task.date, NaiveDate::from_ymd_opt(2024, 1, 15).expect("date"));
        assert_eq!(task.status, Status::Pending);
        assert_eq!(task.description, None);
    }

    #[test]
    fn dto_without_any_date_needs_fallback() {
        let mut raw = dto(2, TaskStatus::Pending);
        raw.created_at = None;
        assert!(Task::from_dto(raw.clone(), None).is_err());

        let fallback = NaiveDate::from_ymd_opt(2024, 2, 1).expect("date");
        let task = Task::from_dto(raw, Some(fallback)).expect("convert");
        assert_eq!(task.date, fallback);
    }

    #[test]
    fn partition_covers_every_task() {
        let tasks: Vec<Task> = [
            TaskStatus::Pending,
            TaskStatus::Completed,
            TaskStatus::Completed,
            TaskStatus::InProgress,
        ]
        .into_iter()
        .enumerate()
        .map(|(idx, status)| Task::from_dto(dto(idx as u64 + 1, status), None).expect("convert"))
        .collect();

        let parts = partition(&tasks);
        assert_eq!(parts.completed.len(), 2);
        assert_eq!(parts.incomplete.len(), 2);
        assert_eq!(parts.completed.len() + parts.incomplete.len(), tasks.len());

        let shown = visible(&tasks, true);
        assert_eq!(shown, parts.incomplete);
        assert_eq!(visible(&tasks, false).len(), tasks.len());
    }

    #[test]
    fn draft_parses_note_suffix() {
        assert_eq!(
            TaskDraft::parse("Write report :: for Q1"),
            TaskDraft::new("Write report", "for Q1")
        );
        assert_eq!(TaskDraft::parse("Review PR"), TaskDraft::new("Review PR", ""));
        assert!(TaskDraft::parse("   ").is_blank());
    }
}
