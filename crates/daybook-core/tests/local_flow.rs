use std::fs;

use chrono::NaiveDate;
use daybook_core::api::{LocalTaskApi, TaskApi};
use daybook_core::mail::MailSettings;
use daybook_core::task::{Status, TaskDraft, TaskType};
use tempfile::tempdir;

fn day(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid day")
}

fn mail() -> MailSettings {
    MailSettings {
        name: "Ada".to_string(),
        greeting: "Hello,".to_string(),
        signature: "Best regards,".to_string(),
    }
}

#[test]
fn local_backend_tracks_a_day() {
    let temp = tempdir().expect("tempdir");
    let api = LocalTaskApi::open(temp.path(), chrono_tz::UTC, mail())
        .expect("open local backend")
        .with_today(day("2024-01-16"));

    let monday = api
        .create_tasks(
            &[
                TaskDraft::new("Write report", ""),
                TaskDraft::new("Review PR", "  #42  "),
            ],
            TaskType::Sod,
            day("2024-01-15"),
        )
        .expect("create monday tasks");
    assert_eq!(monday.len(), 2);
    assert_eq!(monday[0].id, 1);
    assert_eq!(monday[1].id, 2);
    assert_eq!(monday[0].description, None);
    assert_eq!(monday[1].description.as_deref(), Some("#42"));

    api.create_tasks(
        &[TaskDraft::new("Plan sprint", "")],
        TaskType::Sod,
        day("2024-01-16"),
    )
    .expect("create tuesday task");

    let by_date = api.tasks_by_date(day("2024-01-15")).expect("by date");
    let ids: Vec<u64> = by_date.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![2, 1]);

    api.update_status(1, Status::Completed)
        .expect("complete task");
    let updated = api.task(1).expect("fetch task");
    assert_eq!(updated.status, Status::Completed);
    assert!(updated.completed_at.is_some());

    let pending = api.yesterday_pending().expect("yesterday pending");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].task, "Review PR");

    let today = api.today().expect("today");
    assert_eq!(today.len(), 1);
    assert_eq!(today[0].task, "Plan sprint");

    api.update_status(1, Status::Pending).expect("reopen task");
    let reopened = api.task(1).expect("fetch task");
    assert_eq!(reopened.status, Status::Pending);
    assert_eq!(reopened.completed_at, None);
}

#[test]
fn local_backend_rejects_unknown_ids_and_blank_titles() {
    let temp = tempdir().expect("tempdir");
    let api = LocalTaskApi::open(temp.path(), chrono_tz::UTC, mail()).expect("open local backend");

    let err = api
        .update_status(99, Status::Completed)
        .expect_err("unknown id");
    assert!(err.to_string().contains("task not found: 99"));
    assert!(api.task(99).is_err());

    assert!(
        api.create_tasks(&[TaskDraft::new("   ", "")], TaskType::Eod, day("2024-01-15"))
            .is_err()
    );
    assert!(api.tasks_by_date(day("2024-01-15")).expect("by date").is_empty());
}

#[test]
fn local_backend_writes_emails_to_outbox() {
    let temp = tempdir().expect("tempdir");
    let api = LocalTaskApi::open(temp.path(), chrono_tz::UTC, mail())
        .expect("open local backend")
        .with_today(day("2024-01-15"));

    api.create_tasks(
        &[TaskDraft::new("Write report", "")],
        TaskType::Sod,
        day("2024-01-15"),
    )
    .expect("create");
    api.update_status(1, Status::Completed).expect("complete");

    api.send_sod_email(&[TaskDraft::new("Write report", "")])
        .expect("sod email");
    api.send_eod_email(None).expect("eod email");
    api.send_eod_email(Some(day("2024-01-15")))
        .expect("second eod email");

    let outbox = api.outbox_dir();
    let sod = fs::read_to_string(outbox.join("2024-01-15-sod-1.txt")).expect("sod file");
    assert!(sod.starts_with("Subject: SOD Update – Ada – 2024-01-15"));
    assert!(sod.contains("- Write report"));

    let eod = fs::read_to_string(outbox.join("2024-01-15-eod-1.txt")).expect("eod file");
    assert!(eod.contains("Tasks Completed:\n- Write report"));
    assert!(eod.contains("Pending:\n- None"));
    assert!(outbox.join("2024-01-15-eod-2.txt").exists());
}
