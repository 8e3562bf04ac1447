use tracing::{error, info, instrument, warn};

use super::{Outcome, Route};
use crate::api::TaskApi;
use crate::date::DaySelection;
use crate::task::{Partition, Status, Task, TaskDraft, TaskType, partition, visible};

pub const TOGGLE_FAILED: &str = "Failed to update task status. Please try again.";
pub const ADD_FAILED: &str = "Failed to add unplanned task.";
pub const SEND_OK: &str = "EOD email sent successfully!";
pub const SEND_FAILED: &str = "Failed to send EOD email. Please try again.";

/// End-of-day review of the selected day's tasks.
#[derive(Debug, Clone)]
pub struct EodView {
    tasks: Vec<Task>,
    loading: bool,
    sending: bool,
    new_task: TaskDraft,
    adding: bool,
    hide_completed: bool,
    loaded_revision: Option<u64>,
}

impl Default for EodView {
    fn default() -> Self {
        Self::new()
    }
}

impl EodView {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            loading: true,
            sending: false,
            new_task: TaskDraft::default(),
            adding: false,
            hide_completed: false,
            loaded_revision: None,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    pub fn is_adding(&self) -> bool {
        self.adding
    }

    pub fn hides_completed(&self) -> bool {
        self.hide_completed
    }

    pub fn new_task(&self) -> &TaskDraft {
        &self.new_task
    }

    pub fn new_task_mut(&mut self) -> &mut TaskDraft {
        &mut self.new_task
    }

    /// Fetches the selected day's tasks. A failed fetch leaves the list empty.
    #[instrument(skip(self, api, selection), fields(date = %selection.as_string()))]
    pub fn load(&mut self, api: &dyn TaskApi, selection: &DaySelection) {
        self.loading = true;
        match api.tasks_by_date(selection.get()) {
            Ok(tasks) => {
                info!(count = tasks.len(), "loaded tasks");
                self.tasks = tasks;
            }
            Err(err) => {
                warn!(error = %format!("{err:#}"), "failed fetching tasks");
                self.tasks.clear();
            }
        }
        self.loading = false;
        self.loaded_revision = Some(selection.revision());
    }

    /// Reloads when the selected day changed since the last load.
    pub fn sync(&mut self, api: &dyn TaskApi, selection: &DaySelection) -> bool {
        if self.loaded_revision == Some(selection.revision()) {
            return false;
        }
        self.load(api, selection);
        true
    }

    /// Local state follows only after the backend confirms.
    #[instrument(skip(self, api))]
    pub fn toggle(&mut self, api: &dyn TaskApi, id: u64, completed: bool) -> Outcome {
        let status = Status::from_completed(completed);
        match api.update_status(id, status) {
            Ok(_) => {
                if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
                    task.status = status;
                }
                Outcome::none()
            }
            Err(err) => {
                error!(id, error = %format!("{err:#}"), "failed updating task");
                Outcome::failure(TOGGLE_FAILED)
            }
        }
    }

    /// Creates the draft as an `eod` task and shows it first, marked completed.
    /// The completed mark is local; the store keeps its default status.
    #[instrument(skip(self, api, selection), fields(date = %selection.as_string()))]
    pub fn add_unplanned(&mut self, api: &dyn TaskApi, selection: &DaySelection) -> Outcome {
        if self.adding || self.new_task.is_blank() {
            return Outcome::none();
        }

        self.adding = true;
        let draft = self.new_task.clone();
        let result = api.create_tasks(std::slice::from_ref(&draft), TaskType::Eod, selection.get());
        self.adding = false;

        let created = match result {
            Ok(created) => created,
            Err(err) => {
                error!(error = %format!("{err:#}"), "failed adding unplanned task");
                return Outcome::failure(ADD_FAILED);
            }
        };

        if created.len() != 1 {
            warn!(returned = created.len(), "expected exactly one created task");
        }
        let Some(mut task) = created.into_iter().next() else {
            return Outcome::failure(ADD_FAILED);
        };

        task.status = Status::Completed;
        info!(id = task.id, "unplanned task added");
        self.tasks.insert(0, task);
        self.new_task = TaskDraft::default();
        Outcome::none()
    }

    pub fn can_hide_completed(&self) -> bool {
        !self.hide_completed && self.tasks.iter().any(Task::is_completed)
    }

    /// Hides completed rows for the rest of the session. Nothing is deleted.
    pub fn hide_completed(&mut self) {
        self.hide_completed = true;
    }

    #[instrument(skip(self, api, selection), fields(date = %selection.as_string()))]
    pub fn send_eod(&mut self, api: &dyn TaskApi, selection: &DaySelection) -> Outcome {
        if self.sending {
            return Outcome::none();
        }

        self.sending = true;
        let result = api.send_eod_email(Some(selection.get()));
        self.sending = false;

        match result {
            Ok(()) => Outcome::alert(SEND_OK).then_navigate(Route::Root),
            Err(err) => {
                error!(error = %format!("{err:#}"), "failed sending eod email");
                Outcome::failure(SEND_FAILED)
            }
        }
    }

    pub fn partition(&self) -> Partition<'_> {
        partition(&self.tasks)
    }

    pub fn completed_tasks(&self) -> Vec<&Task> {
        self.partition().completed
    }

    pub fn incomplete_tasks(&self) -> Vec<&Task> {
        self.partition().incomplete
    }

    pub fn visible_tasks(&self) -> Vec<&Task> {
        visible(&self.tasks, self.hide_completed)
    }
}
