mod http;
mod local;

use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::info;

pub use self::http::HttpTaskApi;
pub use self::local::LocalTaskApi;

use crate::config::{self, Backend, Config};
use crate::mail::MailSettings;
use crate::task::{Status, Task, TaskDraft, TaskType};

/// The backend the views talk to. Transport failures and non-2xx responses
/// both surface as plain errors.
pub trait TaskApi {
    /// `GET /api/tasks/by-date?date=YYYY-MM-DD`
    fn tasks_by_date(&self, date: NaiveDate) -> anyhow::Result<Vec<Task>>;

    /// `GET /api/tasks/yesterday-pending`
    fn yesterday_pending(&self) -> anyhow::Result<Vec<Task>>;

    /// `GET /api/tasks/today`
    fn today(&self) -> anyhow::Result<Vec<Task>>;

    /// `GET /api/tasks/:id`
    fn task(&self, id: u64) -> anyhow::Result<Task>;

    /// `POST /api/tasks`; returns the created records.
    fn create_tasks(
        &self,
        drafts: &[TaskDraft],
        kind: TaskType,
        date: NaiveDate,
    ) -> anyhow::Result<Vec<Task>>;

    /// `PUT /api/tasks/:id`. Only the status code matters; the response body
    /// is not read.
    fn update_status(&self, id: u64, status: Status) -> anyhow::Result<()>;

    /// `POST /api/send-sod-email`
    fn send_sod_email(&self, drafts: &[TaskDraft]) -> anyhow::Result<()>;

    /// `POST /api/send-eod-email`; `None` lets the backend pick today.
    fn send_eod_email(&self, date: Option<NaiveDate>) -> anyhow::Result<()>;
}

/// Builds the backend selected by `api.backend`.
#[tracing::instrument(skip(cfg, data_override))]
pub fn open_backend(
    cfg: &Config,
    data_override: Option<&Path>,
) -> anyhow::Result<Box<dyn TaskApi>> {
    match cfg.backend()? {
        Backend::Http => {
            let url = cfg
                .get("api.url")
                .unwrap_or_else(|| config::DEFAULT_API_URL.to_string());
            let timeout = cfg
                .get_u64("api.timeout")?
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs);
            info!(url = %url, ?timeout, "using http backend");
            Ok(Box::new(
                HttpTaskApi::new(&url, timeout)?.with_timezone(cfg.timezone()?),
            ))
        }
        Backend::Local => {
            let data_dir = config::resolve_data_dir(cfg, data_override)?;
            info!(data_dir = %data_dir.display(), "using local backend");
            Ok(Box::new(LocalTaskApi::open(
                &data_dir,
                cfg.timezone()?,
                MailSettings::from_config(cfg),
            )?))
        }
    }
}
