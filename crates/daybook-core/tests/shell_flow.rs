use std::io::Cursor;

use chrono::NaiveDate;
use daybook_core::api::LocalTaskApi;
use daybook_core::date::DaySelection;
use daybook_core::mail::MailSettings;
use daybook_core::render::Renderer;
use daybook_core::shell::{Flow, Shell};
use daybook_core::task::Status;
use daybook_core::views::Route;
use tempfile::tempdir;

fn day(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid day")
}

fn mail() -> MailSettings {
    MailSettings {
        name: String::new(),
        greeting: "Hello,".to_string(),
        signature: "Best regards,".to_string(),
    }
}

fn run(shell: &mut Shell<'_>, out: &mut Vec<u8>, lines: &[&str]) {
    for line in lines {
        assert_eq!(shell.execute(line, out).expect("execute"), Flow::Continue);
    }
}

#[test]
fn plan_then_review_a_day() {
    let temp = tempdir().expect("tempdir");
    let today = day("2024-01-15");
    let api = LocalTaskApi::open(temp.path(), chrono_tz::UTC, mail())
        .expect("open local backend")
        .with_today(today);
    let renderer = Renderer::plain();
    let mut shell = Shell::new(&api, &renderer, today, DaySelection::new(today));
    let mut out = Vec::new();

    assert_eq!(shell.route(), None);
    run(
        &mut shell,
        &mut out,
        &["sod", "task 1 Write report", "add Review PR::#42", "submit"],
    );
    assert_eq!(shell.route(), Some(Route::Root));
    assert_eq!(shell.sod().drafts().len(), 1);
    assert!(shell.sod().drafts()[0].is_blank());

    run(&mut shell, &mut out, &["go /eod", "done 1"]);
    assert_eq!(shell.route(), Some(Route::Eod));
    let ids: Vec<u64> = shell.eod().tasks().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![2, 1]);

    run(&mut shell, &mut out, &["new Hotfix::prod", "hide"]);
    let visible: Vec<&str> = shell
        .eod()
        .visible_tasks()
        .iter()
        .map(|t| t.task.as_str())
        .collect();
    assert_eq!(visible, vec!["Review PR"]);
    assert_eq!(shell.eod().tasks()[0].task, "Hotfix");
    assert_eq!(shell.eod().tasks()[0].status, Status::Completed);

    run(&mut shell, &mut out, &["summary"]);
    assert_eq!(shell.route(), Some(Route::Summary));
    let split = shell.summary().partition();
    assert_eq!(split.completed.len(), 1);
    assert_eq!(split.incomplete.len(), 2);

    run(&mut shell, &mut out, &["back"]);
    assert_eq!(shell.route(), Some(Route::Eod));
    assert!(!shell.eod().hides_completed());

    let text = String::from_utf8(out).expect("utf8");
    assert!(text.contains("! SOD tasks saved and email sent successfully!"));
    assert!(temp.path().join("outbox").join("2024-01-15-sod-1.txt").exists());
}

#[test]
fn date_change_reloads_review() {
    let temp = tempdir().expect("tempdir");
    let today = day("2024-01-15");
    let api = LocalTaskApi::open(temp.path(), chrono_tz::UTC, mail())
        .expect("open local backend")
        .with_today(today);
    let renderer = Renderer::plain();
    let mut shell = Shell::new(&api, &renderer, today, DaySelection::new(today));
    let mut out = Vec::new();

    run(&mut shell, &mut out, &["eod", "new Unplanned"]);
    assert_eq!(shell.eod().tasks().len(), 1);

    run(&mut shell, &mut out, &["date tomorrow"]);
    assert_eq!(shell.selection().get(), day("2024-01-16"));
    assert!(shell.eod().tasks().is_empty());

    run(&mut shell, &mut out, &["date 2024-01-15"]);
    assert_eq!(shell.eod().tasks().len(), 1);

    let text = String::from_utf8(out).expect("utf8");
    assert!(text.contains("No tasks found for this date."));
}

#[test]
fn bad_input_is_reported_not_fatal() {
    let temp = tempdir().expect("tempdir");
    let today = day("2024-01-15");
    let api = LocalTaskApi::open(temp.path(), chrono_tz::UTC, mail())
        .expect("open local backend")
        .with_today(today);
    let renderer = Renderer::plain();
    let mut shell = Shell::new(&api, &renderer, today, DaySelection::new(today));
    let mut out = Vec::new();

    run(
        &mut shell,
        &mut out,
        &["done 1", "sod", "rm 1", "submit", "date 2024-02-30", "go /calendar"],
    );
    assert_eq!(shell.route(), Some(Route::Root));
    assert_eq!(shell.selection().get(), today);

    let text = String::from_utf8(out).expect("utf8");
    assert!(text.contains("! `done` is not available on home"));
    assert!(text.contains("! at least one task row is required"));
    assert!(text.contains("! Every task needs a title before saving."));
    assert!(text.contains("! unknown route: /calendar"));
}

#[test]
fn scripted_session_ends_on_quit() {
    let temp = tempdir().expect("tempdir");
    let today = day("2024-01-15");
    let api = LocalTaskApi::open(temp.path(), chrono_tz::UTC, mail())
        .expect("open local backend")
        .with_today(today);
    let renderer = Renderer::plain();
    let mut shell = Shell::new(&api, &renderer, today, DaySelection::new(today));
    let mut out = Vec::new();

    shell
        .run(Cursor::new("sod\nquit\nsubmit\n"), &mut out)
        .expect("run");

    let text = String::from_utf8(out).expect("utf8");
    assert!(text.starts_with("Task Tracker"));
    assert!(text.contains("daybook home> "));
    assert!(text.contains("daybook /> "));
    assert!(!text.contains("Every task needs a title"));
}
