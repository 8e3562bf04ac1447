use std::path::{Path, PathBuf};

use anyhow::anyhow;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::{debug, info, instrument};

use super::TaskApi;
use crate::date::{format_day, previous_day, today_in};
use crate::mail::{MailSettings, compose_eod, compose_sod};
use crate::store::{TaskStore, sort_newest_first};
use crate::task::{Status, Task, TaskDraft, TaskType};

/// Serves the task api from a local [`TaskStore`]; emails land in its outbox.
#[derive(Debug)]
pub struct LocalTaskApi {
    store: TaskStore,
    timezone: Tz,
    mail: MailSettings,
    today_override: Option<NaiveDate>,
}

impl LocalTaskApi {
    pub fn open(data_dir: &Path, timezone: Tz, mail: MailSettings) -> anyhow::Result<Self> {
        Ok(Self {
            store: TaskStore::open(data_dir)?,
            timezone,
            mail,
            today_override: None,
        })
    }

    /// Pins "today"; yesterday-pending, today and dateless EOD sends follow it.
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today_override = Some(today);
        self
    }

    pub fn outbox_dir(&self) -> &PathBuf {
        &self.store.outbox_dir
    }

    fn current_day(&self) -> NaiveDate {
        self.today_override
            .unwrap_or_else(|| today_in(self.timezone))
    }

    fn query<F>(&self, keep: F) -> anyhow::Result<Vec<Task>>
    where
        F: Fn(&Task) -> bool,
    {
        let mut tasks: Vec<Task> = self.store.load()?.into_iter().filter(|t| keep(t)).collect();
        sort_newest_first(&mut tasks);
        debug!(count = tasks.len(), "local query matched");
        Ok(tasks)
    }
}

fn timestamp_for(date: NaiveDate) -> String {
    let now = Utc::now();
    format!("{}T{}", format_day(date), now.format("%H:%M:%S%.6f"))
}

impl TaskApi for LocalTaskApi {
    #[instrument(skip(self), fields(date = %date))]
    fn tasks_by_date(&self, date: NaiveDate) -> anyhow::Result<Vec<Task>> {
        self.query(|t| t.date == date)
    }

    #[instrument(skip(self))]
    fn yesterday_pending(&self) -> anyhow::Result<Vec<Task>> {
        let yesterday = previous_day(self.current_day());
        self.query(|t| t.date == yesterday && t.status == Status::Pending)
    }

    #[instrument(skip(self))]
    fn today(&self) -> anyhow::Result<Vec<Task>> {
        let today = self.current_day();
        self.query(|t| t.date == today)
    }

    #[instrument(skip(self))]
    fn task(&self, id: u64) -> anyhow::Result<Task> {
        self.store
            .load()?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| anyhow!("task not found: {id}"))
    }

    #[instrument(skip(self, drafts), fields(count = drafts.len(), date = %date))]
    fn create_tasks(
        &self,
        drafts: &[TaskDraft],
        kind: TaskType,
        date: NaiveDate,
    ) -> anyhow::Result<Vec<Task>> {
        let mut tasks = self.store.load()?;
        let mut created = Vec::with_capacity(drafts.len());

        for draft in drafts {
            if draft.is_blank() {
                return Err(anyhow!("task title cannot be empty"));
            }
            let description = draft.description.trim();
            let task = Task {
                id: self.store.next_id(&tasks),
                task: draft.task.clone(),
                description: (!description.is_empty()).then(|| description.to_string()),
                status: Status::Pending,
                date,
                kind,
                created_at: Some(timestamp_for(date)),
                completed_at: None,
            };
            tasks.push(task.clone());
            created.push(task);
        }

        self.store.save(&tasks)?;
        info!(created = created.len(), "tasks created");
        Ok(created)
    }

    #[instrument(skip(self))]
    fn update_status(&self, id: u64, status: Status) -> anyhow::Result<()> {
        let mut tasks = self.store.load()?;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| anyhow!("task not found: {id}"))?;

        task.status = status;
        task.completed_at = status
            .is_completed()
            .then(|| Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string());

        self.store.save(&tasks)?;
        info!(id, status = status.as_str(), "task status updated");
        Ok(())
    }

    #[instrument(skip(self, drafts), fields(count = drafts.len()))]
    fn send_sod_email(&self, drafts: &[TaskDraft]) -> anyhow::Result<()> {
        let today = self.current_day();
        let email = compose_sod(&self.mail, drafts, today);
        self.store.write_outbox("sod", today, &email)?;
        Ok(())
    }

    #[instrument(skip(self))]
    fn send_eod_email(&self, date: Option<NaiveDate>) -> anyhow::Result<()> {
        let date = date.unwrap_or_else(|| self.current_day());
        let tasks = self.tasks_by_date(date)?;
        let email = compose_eod(&self.mail, &tasks, date);
        self.store.write_outbox("eod", date, &email)?;
        Ok(())
    }
}
