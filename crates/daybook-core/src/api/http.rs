use std::time::Duration;

use anyhow::{Context, anyhow};
use chrono::NaiveDate;
use daybook_shared::{
    CreateTasksRequest, EodEmailRequest, SodEmailRequest, StatusUpdate, TaskDto,
};
use chrono_tz::Tz;
use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::TaskApi;
use crate::date::{format_day, previous_day, today_in};
use crate::task::{Status, Task, TaskDraft, TaskType, tasks_from_dtos};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// REST client for the task tracker API.
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    client: Client,
    base: Url,
    timezone: Tz,
    today_override: Option<NaiveDate>,
}

impl HttpTaskApi {
    /// `timeout` of `None` waits indefinitely.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let trimmed = base_url.trim();
        if trimmed.is_empty() {
            anyhow::bail!("api base URL is empty");
        }
        let normalized = if trimmed.ends_with('/') {
            trimmed.to_string()
        } else {
            format!("{trimmed}/")
        };
        let base =
            Url::parse(&normalized).with_context(|| format!("invalid api base URL {trimmed}"))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed building HTTP client for task api")?;

        Ok(Self {
            client,
            base,
            timezone: chrono_tz::UTC,
            today_override: None,
        })
    }

    /// Zone used to date records that come back without `date` or `created_at`.
    #[must_use]
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today_override = Some(today);
        self
    }

    fn current_day(&self) -> NaiveDate {
        self.today_override
            .unwrap_or_else(|| today_in(self.timezone))
    }

    pub fn endpoint(&self, path: &str) -> anyhow::Result<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .with_context(|| format!("invalid endpoint path {path}"))
    }

    fn send(&self, request: RequestBuilder, what: &str) -> anyhow::Result<Response> {
        let request_id = Uuid::new_v4();
        let response = request
            .header(REQUEST_ID_HEADER, request_id.to_string())
            .send()
            .map_err(|err| {
                warn!(request_id = %request_id, endpoint = what, error = %err, "request failed");
                anyhow::Error::new(err).context(format!("failed requesting {what}"))
            })?;

        let status = response.status();
        debug!(request_id = %request_id, endpoint = what, status = %status, "response received");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        let snippet: String = body.chars().take(200).collect();
        warn!(
            request_id = %request_id,
            endpoint = what,
            status = %status,
            body = %snippet,
            "api returned non-success status"
        );
        Err(anyhow!("{what} returned HTTP {status}: {snippet}"))
    }

    fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> anyhow::Result<T> {
        self.send(request, what)?
            .json::<T>()
            .with_context(|| format!("failed decoding {what} response"))
    }

    fn fetch_tasks(
        &self,
        url: Url,
        what: &str,
        fallback_date: Option<NaiveDate>,
    ) -> anyhow::Result<Vec<Task>> {
        let dtos: Vec<TaskDto> = self.fetch(self.client.get(url), what)?;
        debug!(endpoint = what, count = dtos.len(), "decoded task list");
        tasks_from_dtos(dtos, fallback_date)
    }
}

impl TaskApi for HttpTaskApi {
    #[instrument(skip(self), fields(date = %date))]
    fn tasks_by_date(&self, date: NaiveDate) -> anyhow::Result<Vec<Task>> {
        let mut url = self.endpoint("api/tasks/by-date")?;
        url.query_pairs_mut().append_pair("date", &format_day(date));
        self.fetch_tasks(url, "GET /api/tasks/by-date", Some(date))
    }

    #[instrument(skip(self))]
    fn yesterday_pending(&self) -> anyhow::Result<Vec<Task>> {
        let url = self.endpoint("api/tasks/yesterday-pending")?;
        let yesterday = previous_day(self.current_day());
        self.fetch_tasks(url, "GET /api/tasks/yesterday-pending", Some(yesterday))
    }

    #[instrument(skip(self))]
    fn today(&self) -> anyhow::Result<Vec<Task>> {
        let url = self.endpoint("api/tasks/today")?;
        self.fetch_tasks(url, "GET /api/tasks/today", Some(self.current_day()))
    }

    #[instrument(skip(self))]
    fn task(&self, id: u64) -> anyhow::Result<Task> {
        let url = self.endpoint(&format!("api/tasks/{id}"))?;
        let dto: TaskDto = self.fetch(self.client.get(url), "GET /api/tasks/:id")?;
        Task::from_dto(dto, None)
    }

    #[instrument(skip(self, drafts), fields(count = drafts.len(), date = %date))]
    fn create_tasks(
        &self,
        drafts: &[TaskDraft],
        kind: TaskType,
        date: NaiveDate,
    ) -> anyhow::Result<Vec<Task>> {
        let body = CreateTasksRequest {
            tasks: drafts.iter().map(TaskDraft::to_input).collect(),
            kind,
            date: Some(format_day(date)),
        };
        let url = self.endpoint("api/tasks")?;
        let dtos: Vec<TaskDto> =
            self.fetch(self.client.post(url).json(&body), "POST /api/tasks")?;
        info!(requested = drafts.len(), created = dtos.len(), "tasks created");
        tasks_from_dtos(dtos, Some(date))
    }

    #[instrument(skip(self))]
    fn update_status(&self, id: u64, status: Status) -> anyhow::Result<()> {
        let url = self.endpoint(&format!("api/tasks/{id}"))?;
        let body = StatusUpdate {
            status: status.to_wire(),
        };
        self.send(self.client.put(url).json(&body), "PUT /api/tasks/:id")?;
        info!(id, status = status.as_str(), "task status updated");
        Ok(())
    }

    #[instrument(skip(self, drafts), fields(count = drafts.len()))]
    fn send_sod_email(&self, drafts: &[TaskDraft]) -> anyhow::Result<()> {
        let body = SodEmailRequest {
            tasks: drafts.iter().map(TaskDraft::to_input).collect(),
        };
        let url = self.endpoint("api/send-sod-email")?;
        self.send(self.client.post(url).json(&body), "POST /api/send-sod-email")?;
        info!("sod email requested");
        Ok(())
    }

    #[instrument(skip(self))]
    fn send_eod_email(&self, date: Option<NaiveDate>) -> anyhow::Result<()> {
        let body = EodEmailRequest {
            date: date.map(format_day),
        };
        let url = self.endpoint("api/send-eod-email")?;
        self.send(self.client.post(url).json(&body), "POST /api/send-eod-email")?;
        info!("eod email requested");
        Ok(())
    }
}
