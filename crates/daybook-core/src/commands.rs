use std::io::{self, Write};

use anyhow::{Context, anyhow, bail};
use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use crate::api::TaskApi;
use crate::cli::{Command, EodAction, ModeArg, PreviewKind};
use crate::config::Config;
use crate::date::DaySelection;
use crate::mail::{MailSettings, compose_eod, compose_sod};
use crate::render::Renderer;
use crate::shell::Shell;
use crate::task::{DraftField, TaskDraft};
use crate::views::{EodView, Mode, Outcome, SodView, SummaryView};

/// Everything a command needs from the invocation.
pub struct Session<'a> {
    pub api: &'a dyn TaskApi,
    pub cfg: &'a Config,
    pub renderer: &'a Renderer,
    pub today: NaiveDate,
    pub selection: DaySelection,
}

#[instrument(skip(session))]
pub fn dispatch(session: &mut Session<'_>, command: Command) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(session, command, &mut out)
}

/// Runs one command against `out`. A view operation that reports a failure
/// becomes an error so the process exits non-zero.
pub fn execute<W: Write>(
    session: &mut Session<'_>,
    command: Command,
    out: &mut W,
) -> anyhow::Result<()> {
    debug!(?command, date = %session.selection.as_string(), "dispatching");
    match command {
        Command::Sod {
            tasks,
            include_pending,
        } => cmd_sod(session, &tasks, include_pending, out),
        Command::Eod { action } => cmd_eod(session, action.unwrap_or(EodAction::List), out),
        Command::Summary => cmd_summary(session, out),
        Command::Show { id } => cmd_show(session, id, out),
        Command::Preview { kind, tasks } => cmd_preview(session, kind, &tasks, out),
        Command::Shell { mode } => cmd_shell(session, mode, out),
    }
}

fn cmd_sod<W: Write>(
    session: &Session<'_>,
    tasks: &[String],
    include_pending: bool,
    out: &mut W,
) -> anyhow::Result<()> {
    let mut view = SodView::new();
    if include_pending {
        view.mount(session.api);
    }

    for (idx, raw) in tasks.iter().enumerate() {
        let draft = TaskDraft::parse(raw);
        if idx > 0 {
            view.append_draft();
        }
        view.edit(idx, DraftField::Task, draft.task);
        view.edit(idx, DraftField::Description, draft.description);
    }

    if include_pending {
        let added = view.include_pending();
        info!(added, "carried over pending tasks");
        if tasks.is_empty() && added > 0 {
            view.remove_draft(0);
        }
    }

    if view.drafts().iter().all(TaskDraft::is_blank) {
        bail!("nothing to submit: pass at least one task");
    }

    session
        .renderer
        .print_sod(out, &view, &session.selection)?;
    let outcome = view.submit(session.api, &session.selection);
    report(out, outcome)
}

fn cmd_eod<W: Write>(
    session: &Session<'_>,
    action: EodAction,
    out: &mut W,
) -> anyhow::Result<()> {
    let mut view = EodView::new();

    if let EodAction::Send = action {
        let outcome = view.send_eod(session.api, &session.selection);
        return report(out, outcome);
    }

    view.load(session.api, &session.selection);
    let outcome = match action {
        EodAction::List | EodAction::Send => Outcome::none(),
        EodAction::Done { id } => view.toggle(session.api, id, true),
        EodAction::Undo { id } => view.toggle(session.api, id, false),
        EodAction::Add { text, note } => {
            let draft = TaskDraft::new(text, note.unwrap_or_default());
            if draft.is_blank() {
                bail!("unplanned task needs a title");
            }
            *view.new_task_mut() = draft;
            view.add_unplanned(session.api, &session.selection)
        }
    };

    report(out, outcome)?;
    session
        .renderer
        .print_eod(out, &view, &session.selection)
}

fn cmd_summary<W: Write>(session: &Session<'_>, out: &mut W) -> anyhow::Result<()> {
    let mut view = SummaryView::new();
    view.mount(session.api);
    session.renderer.print_summary(out, &view)
}

fn cmd_show<W: Write>(session: &Session<'_>, id: u64, out: &mut W) -> anyhow::Result<()> {
    let task = session
        .api
        .task(id)
        .with_context(|| format!("failed to fetch task {id}"))?;
    session.renderer.print_task_info(out, &task)
}

fn cmd_preview<W: Write>(
    session: &Session<'_>,
    kind: PreviewKind,
    tasks: &[String],
    out: &mut W,
) -> anyhow::Result<()> {
    let settings = MailSettings::from_config(session.cfg);
    let day = session.selection.get();

    let email = match kind {
        PreviewKind::Sod => {
            let drafts: Vec<TaskDraft> = tasks.iter().map(|raw| TaskDraft::parse(raw)).collect();
            compose_sod(&settings, &drafts, day)
        }
        PreviewKind::Eod => {
            if !tasks.is_empty() {
                return Err(anyhow!("`preview eod` takes no task arguments"));
            }
            let day_tasks = session
                .api
                .tasks_by_date(day)
                .with_context(|| format!("failed to fetch tasks for {day}"))?;
            compose_eod(&settings, &day_tasks, day)
        }
    };

    session.renderer.print_email(out, &email)
}

fn cmd_shell<W: Write>(
    session: &mut Session<'_>,
    mode: Option<ModeArg>,
    out: &mut W,
) -> anyhow::Result<()> {
    let mut shell = Shell::new(
        session.api,
        session.renderer,
        session.today,
        session.selection.clone(),
    );
    if let Some(mode) = mode {
        shell.choose_mode(match mode {
            ModeArg::Sod => Mode::Sod,
            ModeArg::Eod => Mode::Eod,
        });
    }

    let stdin = io::stdin();
    shell.run(stdin.lock(), out)?;
    session.selection = shell.selection().clone();
    Ok(())
}

/// Prints a successful alert; a failed one becomes the command's error.
fn report<W: Write>(out: &mut W, outcome: Outcome) -> anyhow::Result<()> {
    match outcome.alert {
        Some(message) if outcome.failed => Err(anyhow!(message)),
        Some(message) => {
            writeln!(out, "{message}")?;
            Ok(())
        }
        None => Ok(()),
    }
}
