use tracing::{error, info, instrument, warn};

use super::{Outcome, Route};
use crate::api::TaskApi;
use crate::date::DaySelection;
use crate::task::{DraftField, Task, TaskDraft, TaskType};

pub const SUBMIT_OK: &str = "SOD tasks saved and email sent successfully!";
pub const SUBMIT_FAILED: &str = "Failed to save tasks or send email. Please try again.";
pub const BLANK_TASK: &str = "Every task needs a title before saving.";

/// Start-of-day planning form.
#[derive(Debug, Clone)]
pub struct SodView {
    drafts: Vec<TaskDraft>,
    submitting: bool,
    pending: Vec<Task>,
    show_pending: bool,
}

impl Default for SodView {
    fn default() -> Self {
        Self::new()
    }
}

impl SodView {
    pub fn new() -> Self {
        Self {
            drafts: vec![TaskDraft::default()],
            submitting: false,
            pending: Vec::new(),
            show_pending: false,
        }
    }

    pub fn drafts(&self) -> &[TaskDraft] {
        &self.drafts
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Yesterday's pending tasks, when the banner is up.
    pub fn pending_banner(&self) -> Option<&[Task]> {
        self.show_pending.then_some(self.pending.as_slice())
    }

    /// Looks up yesterday's pending tasks. Failures only hide the banner.
    #[instrument(skip(self, api))]
    pub fn mount(&mut self, api: &dyn TaskApi) {
        match api.yesterday_pending() {
            Ok(tasks) if !tasks.is_empty() => {
                info!(count = tasks.len(), "pending tasks from yesterday");
                self.pending = tasks;
                self.show_pending = true;
            }
            Ok(_) => {}
            Err(err) => {
                warn!(error = %format!("{err:#}"), "failed fetching yesterday's pending tasks");
            }
        }
    }

    pub fn append_draft(&mut self) {
        self.drafts.push(TaskDraft::default());
    }

    pub fn can_remove(&self) -> bool {
        self.drafts.len() > 1
    }

    /// Refuses to drop the last remaining row or an out-of-range index.
    pub fn remove_draft(&mut self, index: usize) -> bool {
        if !self.can_remove() || index >= self.drafts.len() {
            return false;
        }
        self.drafts.remove(index);
        true
    }

    pub fn edit(&mut self, index: usize, field: DraftField, value: impl Into<String>) -> bool {
        let Some(draft) = self.drafts.get_mut(index) else {
            return false;
        };
        match field {
            DraftField::Task => draft.task = value.into(),
            DraftField::Description => draft.description = value.into(),
        }
        true
    }

    /// Appends yesterday's pending tasks as fresh drafts and dismisses the
    /// banner. Returns how many rows were added.
    pub fn include_pending(&mut self) -> usize {
        if !self.show_pending {
            return 0;
        }
        self.drafts
            .extend(self.pending.iter().map(TaskDraft::from_task));
        self.show_pending = false;
        info!(count = self.pending.len(), "included pending tasks");
        self.pending.len()
    }

    /// Creates the drafts for the selected day, then sends the SOD email.
    #[instrument(skip(self, api, selection), fields(date = %selection.as_string(), count = self.drafts.len()))]
    pub fn submit(&mut self, api: &dyn TaskApi, selection: &DaySelection) -> Outcome {
        if self.submitting {
            return Outcome::none();
        }
        if self.drafts.iter().any(TaskDraft::is_blank) {
            return Outcome::failure(BLANK_TASK);
        }

        self.submitting = true;
        let result = api
            .create_tasks(&self.drafts, TaskType::Sod, selection.get())
            .and_then(|_| api.send_sod_email(&self.drafts));
        self.submitting = false;

        match result {
            Ok(()) => {
                info!("sod submitted");
                Outcome::alert(SUBMIT_OK).then_navigate(Route::Root)
            }
            Err(err) => {
                error!(error = %format!("{err:#}"), "sod submit failed");
                Outcome::failure(SUBMIT_FAILED)
            }
        }
    }
}
