use chrono::NaiveDate;

use crate::config::Config;
use crate::date::format_day;
use crate::task::{Task, TaskDraft, partition};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailSettings {
    pub name: String,
    pub greeting: String,
    pub signature: String,
}

impl MailSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            name: cfg.get("mail.name").unwrap_or_default(),
            greeting: cfg.get("mail.greeting").unwrap_or_else(|| "Hello,".to_string()),
            signature: cfg
                .get("mail.signature")
                .unwrap_or_else(|| "Best regards,".to_string()),
        }
    }

    fn subject(&self, label: &str, date: NaiveDate) -> String {
        if self.name.trim().is_empty() {
            format!("{label} Update – {}", format_day(date))
        } else {
            format!("{label} Update – {} – {}", self.name.trim(), format_day(date))
        }
    }

    fn sign_off(&self) -> String {
        let mut out = self.signature.clone();
        if !self.name.trim().is_empty() {
            out.push('\n');
            out.push_str(self.name.trim());
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub subject: String,
    pub body: String,
}

impl Email {
    pub fn render(&self) -> String {
        format!("Subject: {}\n\n{}", self.subject, self.body)
    }
}

/// One `- task` or `- task: note` line per entry, or `- None` when empty.
pub fn format_task_lines<'a, I>(entries: I) -> String
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    let lines: Vec<String> = entries
        .into_iter()
        .map(|(task, note)| match note.map(str::trim).filter(|n| !n.is_empty()) {
            Some(note) => format!("- {task}: {note}"),
            None => format!("- {task}"),
        })
        .collect();

    if lines.is_empty() {
        "- None".to_string()
    } else {
        lines.join("\n")
    }
}

pub fn compose_sod(settings: &MailSettings, drafts: &[TaskDraft], date: NaiveDate) -> Email {
    let tasks = format_task_lines(
        drafts
            .iter()
            .map(|d| (d.task.as_str(), Some(d.description.as_str()))),
    );

    let body = format!(
        "{}\n\nPlanned Tasks for the Day:\n{tasks}\n\n{}\n",
        settings.greeting,
        settings.sign_off()
    );

    Email {
        subject: settings.subject("SOD", date),
        body,
    }
}

pub fn compose_eod(settings: &MailSettings, tasks: &[Task], date: NaiveDate) -> Email {
    let parts = partition(tasks);
    let completed = format_task_lines(
        parts
            .completed
            .iter()
            .map(|t| (t.task.as_str(), t.description.as_deref())),
    );
    let pending = format_task_lines(
        parts
            .incomplete
            .iter()
            .map(|t| (t.task.as_str(), t.description.as_deref())),
    );

    let body = format!(
        "{}\n\nHere is my End of Day (EOD) update for {}\n\nTasks Completed:\n{completed}\n\nPending:\n{pending}\n\n{}\n",
        settings.greeting,
        format_day(date),
        settings.sign_off()
    );

    Email {
        subject: settings.subject("EOD", date),
        body,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{MailSettings, compose_eod, compose_sod, format_task_lines};
    use crate::task::{Status, Task, TaskDraft, TaskType};

    fn settings() -> MailSettings {
        MailSettings {
            name: "Ada".to_string(),
            greeting: "Good morning.".to_string(),
            signature: "Best regards,".to_string(),
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).expect("date")
    }

    #[test]
    fn empty_list_renders_none() {
        assert_eq!(format_task_lines(Vec::<(&str, Option<&str>)>::new()), "- None");
        assert_eq!(
            format_task_lines(vec![("Ship", Some("  ")), ("Test", Some("unit"))]),
            "- Ship\n- Test: unit"
        );
    }

    #[test]
    fn sod_mail_lists_planned_tasks() {
        let drafts = vec![
            TaskDraft::new("Write report", "Q1 numbers"),
            TaskDraft::new("Review PR", ""),
        ];
        let email = compose_sod(&settings(), &drafts, day());
        assert_eq!(email.subject, "SOD Update – Ada – 2024-01-15");
        assert!(email.body.starts_with("Good morning.\n\nPlanned Tasks for the Day:\n"));
        assert!(email.body.contains("- Write report: Q1 numbers\n- Review PR\n"));
        assert!(email.body.ends_with("Best regards,\nAda\n"));
    }

    #[test]
    fn eod_mail_splits_completed_and_pending() {
        let task = |id: u64, status: Status| Task {
            id,
            task: format!("task {id}"),
            description: None,
            status,
            date: day(),
            kind: TaskType::Sod,
            created_at: None,
            completed_at: None,
        };
        let tasks = vec![task(1, Status::Completed), task(2, Status::Pending)];

        let mut anonymous = settings();
        anonymous.name = String::new();
        let email = compose_eod(&anonymous, &tasks, day());
        assert_eq!(email.subject, "EOD Update – 2024-01-15");
        assert!(email.body.contains("update for 2024-01-15"));
        assert!(email.body.contains("Tasks Completed:\n- task 1\n\nPending:\n- task 2\n"));
    }
}
