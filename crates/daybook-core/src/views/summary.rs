use tracing::{instrument, warn};

use super::Route;
use crate::api::TaskApi;
use crate::task::{Partition, Task, partition};

/// Read-only recap of today's tasks, independent of the selected day.
#[derive(Debug, Clone)]
pub struct SummaryView {
    tasks: Vec<Task>,
    loading: bool,
}

impl Default for SummaryView {
    fn default() -> Self {
        Self::new()
    }
}

impl SummaryView {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            loading: true,
        }
    }

    #[instrument(skip(self, api))]
    pub fn mount(&mut self, api: &dyn TaskApi) {
        match api.today() {
            Ok(tasks) => self.tasks = tasks,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "failed fetching today's tasks");
            }
        }
        self.loading = false;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn partition(&self) -> Partition<'_> {
        partition(&self.tasks)
    }

    pub fn back(&self) -> Route {
        Route::Eod
    }

    pub fn new_day(&self) -> Route {
        Route::Root
    }
}
