use std::io::{BufRead, Write};

use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use crate::api::TaskApi;
use crate::date::{DaySelection, parse_day_expr};
use crate::render::Renderer;
use crate::task::{DraftField, TaskDraft};
use crate::views::{EodView, Mode, Outcome, Route, SodView, SummaryView};

const HELP: &str = "\
anywhere:  date [DAY]  go /|/eod|/summary  list  help  quit
home:      sod  eod
/:         add [TITLE[::NOTE]]  task N TEXT  note N TEXT  rm N  include  submit
/eod:      done ID  undo ID  new TITLE[::NOTE]  hide  send  summary
/summary:  back  newday";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Interactive session over the three views. `route` is `None` while the
/// home screen is up.
pub struct Shell<'a> {
    api: &'a dyn TaskApi,
    renderer: &'a Renderer,
    today: NaiveDate,
    selection: DaySelection,
    route: Option<Route>,
    sod: SodView,
    eod: EodView,
    summary: SummaryView,
}

impl<'a> Shell<'a> {
    pub fn new(
        api: &'a dyn TaskApi,
        renderer: &'a Renderer,
        today: NaiveDate,
        selection: DaySelection,
    ) -> Self {
        Self {
            api,
            renderer,
            today,
            selection,
            route: None,
            sod: SodView::new(),
            eod: EodView::new(),
            summary: SummaryView::new(),
        }
    }

    pub fn route(&self) -> Option<Route> {
        self.route
    }

    pub fn selection(&self) -> &DaySelection {
        &self.selection
    }

    pub fn sod(&self) -> &SodView {
        &self.sod
    }

    pub fn eod(&self) -> &EodView {
        &self.eod
    }

    pub fn summary(&self) -> &SummaryView {
        &self.summary
    }

    pub fn choose_mode(&mut self, mode: Mode) {
        info!(?mode, "mode selected");
        self.navigate(mode.route());
    }

    /// Every navigation mounts a fresh copy of the target view.
    #[instrument(skip(self))]
    pub fn navigate(&mut self, route: Route) {
        match route {
            Route::Root => {
                self.sod = SodView::new();
                self.sod.mount(self.api);
            }
            Route::Eod => {
                self.eod = EodView::new();
                self.eod.load(self.api, &self.selection);
            }
            Route::Summary => {
                self.summary = SummaryView::new();
                self.summary.mount(self.api);
            }
        }
        self.route = Some(route);
    }

    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> anyhow::Result<()> {
        self.render(out)?;
        self.prompt(out)?;

        for line in input.lines() {
            let line = line?;
            if self.execute(&line, out)? == Flow::Quit {
                return Ok(());
            }
            self.prompt(out)?;
        }

        writeln!(out)?;
        Ok(())
    }

    /// Runs one command line. Errors are output failures only; bad input is
    /// reported to `out`.
    #[instrument(skip(self, out))]
    pub fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> anyhow::Result<Flow> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Flow::Continue);
        }

        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };
        debug!(command, rest, route = ?self.route, "shell command");

        match command {
            "quit" | "exit" | "q" => return Ok(Flow::Quit),
            "help" | "?" => {
                writeln!(out, "{HELP}")?;
                return Ok(Flow::Continue);
            }
            "list" | "ls" => {}
            "date" => self.cmd_date(rest, out)?,
            "go" => match Route::from_path(rest) {
                Some(route) => self.navigate(route),
                None => writeln!(out, "! unknown route: {rest}")?,
            },
            _ => {
                if !self.route_command(command, rest, out)? {
                    let place = self.route.map(Route::path).unwrap_or("home");
                    writeln!(out, "! `{command}` is not available on {place}; type `help`")?;
                    return Ok(Flow::Continue);
                }
            }
        }

        self.render(out)?;
        Ok(Flow::Continue)
    }

    fn route_command<W: Write>(
        &mut self,
        command: &str,
        rest: &str,
        out: &mut W,
    ) -> anyhow::Result<bool> {
        match (self.route, command) {
            (None, "sod") => self.choose_mode(Mode::Sod),
            (None, "eod") => self.choose_mode(Mode::Eod),

            (Some(Route::Root), "add") => {
                self.sod.append_draft();
                if !rest.is_empty() {
                    let draft = TaskDraft::parse(rest);
                    let idx = self.sod.drafts().len() - 1;
                    self.sod.edit(idx, DraftField::Task, draft.task);
                    self.sod.edit(idx, DraftField::Description, draft.description);
                }
            }
            (Some(Route::Root), "task") => self.edit_draft(DraftField::Task, rest, out)?,
            (Some(Route::Root), "note") => self.edit_draft(DraftField::Description, rest, out)?,
            (Some(Route::Root), "rm") => match parse_position(rest) {
                Some(idx) if self.sod.remove_draft(idx) => {}
                Some(_) if !self.sod.can_remove() => {
                    writeln!(out, "! at least one task row is required")?
                }
                _ => writeln!(out, "! no task row {rest}")?,
            },
            (Some(Route::Root), "include") => {
                let added = self.sod.include_pending();
                if added == 0 {
                    writeln!(out, "! no pending tasks to include")?;
                }
            }
            (Some(Route::Root), "submit") => {
                let outcome = self.sod.submit(self.api, &self.selection);
                self.apply(outcome, out)?;
            }

            (Some(Route::Eod), "done" | "undo") => match rest.parse::<u64>() {
                Ok(id) => {
                    let outcome = self.eod.toggle(self.api, id, command == "done");
                    self.apply(outcome, out)?;
                }
                Err(_) => writeln!(out, "! expected a task id, got {rest:?}")?,
            },
            (Some(Route::Eod), "new") => {
                let draft = TaskDraft::parse(rest);
                if draft.is_blank() {
                    writeln!(out, "! unplanned task needs a title")?;
                } else {
                    *self.eod.new_task_mut() = draft;
                    let outcome = self.eod.add_unplanned(self.api, &self.selection);
                    self.apply(outcome, out)?;
                }
            }
            (Some(Route::Eod), "hide") => {
                if self.eod.can_hide_completed() {
                    self.eod.hide_completed();
                } else {
                    writeln!(out, "! nothing to clear")?;
                }
            }
            (Some(Route::Eod), "send") => {
                let outcome = self.eod.send_eod(self.api, &self.selection);
                self.apply(outcome, out)?;
            }
            (Some(Route::Eod), "summary") => self.navigate(Route::Summary),

            (Some(Route::Summary), "back") => {
                let route = self.summary.back();
                self.navigate(route);
            }
            (Some(Route::Summary), "newday") => {
                let route = self.summary.new_day();
                self.navigate(route);
            }

            _ => return Ok(false),
        }
        Ok(true)
    }

    fn cmd_date<W: Write>(&mut self, rest: &str, out: &mut W) -> anyhow::Result<()> {
        if rest.is_empty() {
            return Ok(());
        }
        match parse_day_expr(rest, self.today) {
            Ok(day) => {
                if self.selection.set(day) && self.route == Some(Route::Eod) {
                    self.eod.sync(self.api, &self.selection);
                }
            }
            Err(err) => writeln!(out, "! {err}")?,
        }
        Ok(())
    }

    fn edit_draft<W: Write>(
        &mut self,
        field: DraftField,
        rest: &str,
        out: &mut W,
    ) -> anyhow::Result<()> {
        let (position, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        let edited = parse_position(position)
            .map(|idx| self.sod.edit(idx, field, text.trim()))
            .unwrap_or(false);
        if !edited {
            writeln!(out, "! no task row {position}")?;
        }
        Ok(())
    }

    fn apply<W: Write>(&mut self, outcome: Outcome, out: &mut W) -> anyhow::Result<()> {
        if let Some(message) = &outcome.alert {
            writeln!(out, "! {message}")?;
        }
        if let Some(route) = outcome.navigate {
            self.navigate(route);
        }
        Ok(())
    }

    fn prompt<W: Write>(&self, out: &mut W) -> anyhow::Result<()> {
        let place = self.route.map(Route::path).unwrap_or("home");
        write!(out, "daybook {place}> ")?;
        out.flush()?;
        Ok(())
    }

    fn render<W: Write>(&self, out: &mut W) -> anyhow::Result<()> {
        match self.route {
            None => self.renderer.print_home(out, &self.selection),
            Some(Route::Root) => self.renderer.print_sod(out, &self.sod, &self.selection),
            Some(Route::Eod) => self.renderer.print_eod(out, &self.eod, &self.selection),
            Some(Route::Summary) => self.renderer.print_summary(out, &self.summary),
        }
    }
}

/// 1-based row number to index.
fn parse_position(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok()?.checked_sub(1)
}
