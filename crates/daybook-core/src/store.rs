use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use chrono::NaiveDate;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::date::format_day;
use crate::mail::Email;
use crate::task::Task;

/// JSONL task file plus a mail outbox, rooted in one data directory.
#[derive(Debug)]
pub struct TaskStore {
    pub data_dir: PathBuf,
    pub tasks_path: PathBuf,
    pub outbox_dir: PathBuf,
}

impl TaskStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let tasks_path = data_dir.join("tasks.data");
        let outbox_dir = data_dir.join("outbox");

        if !tasks_path.exists() {
            fs::write(&tasks_path, "")?;
        }
        fs::create_dir_all(&outbox_dir)
            .with_context(|| format!("failed to create {}", outbox_dir.display()))?;

        info!(
            data_dir = %data_dir.display(),
            tasks = %tasks_path.display(),
            outbox = %outbox_dir.display(),
            "opened task store"
        );

        Ok(Self {
            data_dir,
            tasks_path,
            outbox_dir,
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn load(&self) -> anyhow::Result<Vec<Task>> {
        load_jsonl(&self.tasks_path).context("failed to load tasks.data")
    }

    #[tracing::instrument(skip(self, tasks))]
    pub fn save(&self, tasks: &[Task]) -> anyhow::Result<()> {
        save_jsonl_atomic(&self.tasks_path, tasks).context("failed to save tasks.data")
    }

    pub fn next_id(&self, tasks: &[Task]) -> u64 {
        tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1
    }

    /// Writes `{date}-{label}-{n}.txt`, picking the first free `n`.
    #[tracing::instrument(skip(self, email), fields(subject = %email.subject))]
    pub fn write_outbox(
        &self,
        label: &str,
        date: NaiveDate,
        email: &Email,
    ) -> anyhow::Result<PathBuf> {
        let stem = format!("{}-{label}", format_day(date));
        let mut n = 1_u32;
        let path = loop {
            let candidate = self.outbox_dir.join(format!("{stem}-{n}.txt"));
            if !candidate.exists() {
                break candidate;
            }
            n += 1;
        };

        fs::write(&path, email.render())
            .with_context(|| format!("failed writing {}", path.display()))?;
        info!(file = %path.display(), "queued email in outbox");
        Ok(path)
    }
}

/// Newest first: `created_at` descending, ties broken by id descending.
pub fn sort_newest_first(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

#[tracing::instrument(skip(path))]
fn load_jsonl(path: &Path) -> anyhow::Result<Vec<Task>> {
    debug!(file = %path.display(), "loading jsonl");
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let task: Task = serde_json::from_str(trimmed)
            .with_context(|| format!("failed parsing {} line {}", path.display(), idx + 1))?;
        out.push(task);
    }

    debug!(count = out.len(), "loaded tasks from jsonl");
    Ok(out)
}

#[tracing::instrument(skip(path, tasks))]
fn save_jsonl_atomic(path: &Path, tasks: &[Task]) -> anyhow::Result<()> {
    debug!(file = %path.display(), count = tasks.len(), "saving jsonl atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    for task in tasks {
        let serialized = serde_json::to_string(task)?;
        writeln!(temp, "{serialized}")?;
    }
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}
