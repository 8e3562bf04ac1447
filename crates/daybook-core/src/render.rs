use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::date::DaySelection;
use crate::mail::Email;
use crate::task::{Task, TaskType};
use crate::views::{EodView, SodView, SummaryView};

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip_all)]
    pub fn print_home<W: Write>(&self, out: &mut W, selection: &DaySelection) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint("Task Tracker", "1"))?;
        writeln!(out, "Selected date: {}", selection.as_string())?;
        writeln!(out, "Choose `sod` (Start of Day) or `eod` (End of Day).")?;
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    pub fn print_sod<W: Write>(
        &self,
        out: &mut W,
        view: &SodView,
        selection: &DaySelection,
    ) -> anyhow::Result<()> {
        writeln!(
            out,
            "{} for {}",
            self.paint("Start of Day Tasks", "1"),
            selection.as_string()
        )?;

        if let Some(pending) = view.pending_banner() {
            writeln!(
                out,
                "{}",
                self.paint(
                    &format!(
                        "You have {} pending tasks from yesterday. Type `include` to add them.",
                        pending.len()
                    ),
                    "33"
                )
            )?;
        }

        let headers = vec!["#".to_string(), "Task".to_string(), "Note".to_string()];
        let rows = view
            .drafts()
            .iter()
            .enumerate()
            .map(|(idx, draft)| {
                let title = if draft.is_blank() {
                    self.paint("(empty)", "2")
                } else {
                    draft.task.clone()
                };
                vec![(idx + 1).to_string(), title, draft.description.clone()]
            })
            .collect();
        write_table(&mut *out, headers, rows)?;

        if view.is_submitting() {
            writeln!(out, "Saving...")?;
        }
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    pub fn print_eod<W: Write>(
        &self,
        out: &mut W,
        view: &EodView,
        selection: &DaySelection,
    ) -> anyhow::Result<()> {
        writeln!(
            out,
            "{} for {}",
            self.paint("End of Day Review", "1"),
            selection.as_string()
        )?;

        if view.is_loading() {
            writeln!(out, "Loading...")?;
            return Ok(());
        }

        if view.tasks().is_empty() {
            writeln!(out, "No tasks found for this date.")?;
            return Ok(());
        }

        self.print_task_table(&mut *out, &view.visible_tasks())?;

        let parts = view.partition();
        writeln!(
            out,
            "{} completed, {} pending",
            self.paint(&parts.completed.len().to_string(), "32"),
            parts.incomplete.len()
        )?;
        if view.can_hide_completed() {
            writeln!(out, "Type `hide` to clear completed tasks from the list.")?;
        }
        if view.is_adding() {
            writeln!(out, "Adding...")?;
        }
        if view.is_sending() {
            writeln!(out, "Sending...")?;
        }
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    pub fn print_summary<W: Write>(&self, out: &mut W, view: &SummaryView) -> anyhow::Result<()> {
        if view.is_loading() {
            writeln!(out, "Loading summary...")?;
            return Ok(());
        }

        let parts = view.partition();
        writeln!(out, "{}", self.paint("EOD Summary", "1"))?;
        writeln!(out)?;
        writeln!(out, "{}", self.paint("Completed Tasks", "32"))?;
        self.print_bullets(&mut *out, &parts.completed, "No completed tasks")?;
        writeln!(out)?;
        writeln!(out, "{}", self.paint("Incomplete Tasks", "31"))?;
        self.print_bullets(&mut *out, &parts.incomplete, "No incomplete tasks")?;
        Ok(())
    }

    #[tracing::instrument(skip(self, out, tasks), fields(count = tasks.len()))]
    pub fn print_task_table<W: Write>(&self, out: &mut W, tasks: &[&Task]) -> anyhow::Result<()> {
        let headers = vec![
            "ID".to_string(),
            "Done".to_string(),
            "Task".to_string(),
            "Note".to_string(),
            "Type".to_string(),
        ];

        let rows = tasks
            .iter()
            .map(|task| {
                let done = if task.is_completed() {
                    self.paint("[x]", "32")
                } else {
                    "[ ]".to_string()
                };
                vec![
                    self.paint(&task.id.to_string(), "33"),
                    done,
                    task.task.clone(),
                    task.description.clone().unwrap_or_default(),
                    kind_label(task).to_string(),
                ]
            })
            .collect();

        write_table(out, headers, rows)
    }

    #[tracing::instrument(skip(self, out, task), fields(id = task.id))]
    pub fn print_task_info<W: Write>(&self, out: &mut W, task: &Task) -> anyhow::Result<()> {
        writeln!(out, "id          {}", task.id)?;
        writeln!(out, "task        {}", task.task)?;
        writeln!(
            out,
            "note        {}",
            task.description.clone().unwrap_or_default()
        )?;
        writeln!(out, "status      {}", task.status.as_str())?;
        writeln!(out, "date        {}", task.date)?;
        writeln!(out, "type        {}", kind_label(task))?;
        if let Some(created) = &task.created_at {
            writeln!(out, "created     {created}")?;
        }
        if let Some(completed) = &task.completed_at {
            writeln!(out, "completed   {completed}")?;
        }
        Ok(())
    }

    pub fn print_email<W: Write>(&self, out: &mut W, email: &Email) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(&format!("Subject: {}", email.subject), "1"))?;
        writeln!(out)?;
        write!(out, "{}", email.body)?;
        Ok(())
    }

    fn print_bullets<W: Write>(&self, out: &mut W, tasks: &[&Task], empty: &str) -> anyhow::Result<()> {
        if tasks.is_empty() {
            writeln!(out, "  {empty}")?;
            return Ok(());
        }
        for task in tasks {
            match &task.description {
                Some(note) => writeln!(out, "  - {} ({note})", task.task)?,
                None => writeln!(out, "  - {}", task.task)?,
            }
        }
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn kind_label(task: &Task) -> &'static str {
    match task.kind {
        TaskType::Sod => "sod",
        TaskType::Eod => "eod",
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
