use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::stdout;

use crate::api::JobStore;
use crate::dashboard::{
    description_snippet, optimize_label, optimized_on_local, ChangesView, Dashboard, Panel,
    CONFIRM_DELETE, CONFIRM_OPTIMIZE, EMPTY_DASHBOARD, REOPTIMIZE_NOTICE,
};
use crate::export::{ExportOutcome, SaveTarget};
use crate::models::{Job, JobStatus};
use crate::notify::{Notice, StatusLine};

enum Pending {
    Delete(String),
    Optimize(String),
}

impl Pending {
    fn prompt(&self) -> &'static str {
        match self {
            Pending::Delete(_) => CONFIRM_DELETE,
            Pending::Optimize(_) => CONFIRM_OPTIMIZE,
        }
    }
}

enum Mode {
    Browse,
    Confirm(Pending),
    Changes(Box<ChangesView>),
}

struct AppState<'a> {
    dashboard: Dashboard<'a>,
    status: &'a StatusLine,
    target: Option<&'a dyn SaveTarget>,
    selected: usize,
    scroll_offset: u16,
    mode: Mode,
    busy: Option<&'static str>,
}

impl<'a> AppState<'a> {
    fn current_job(&self) -> Option<&Job> {
        self.dashboard.jobs().get(self.selected)
    }

    fn current_id(&self) -> Option<String> {
        self.current_job().map(|j| j.id.clone())
    }

    fn next(&mut self) {
        let len = self.dashboard.jobs().len();
        if len > 0 && self.selected < len - 1 {
            self.selected += 1;
            self.scroll_offset = 0;
        }
    }

    fn prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.scroll_offset = 0;
        }
    }

    fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(3);
    }

    fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(3);
    }

    // Keep the cursor in range after the list shrinks.
    fn clamp_selection(&mut self) {
        let len = self.dashboard.jobs().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }
}

type Term = Terminal<CrosstermBackend<std::io::Stdout>>;

pub fn run_dashboard(store: &dyn JobStore, target: Option<&dyn SaveTarget>) -> Result<()> {
    let status = StatusLine::default();
    let mut dashboard = Dashboard::new(store, &status);
    // Failure lands on the status line.
    let _ = dashboard.refresh();

    let mut state = AppState {
        dashboard,
        status: &status,
        target,
        selected: 0,
        scroll_offset: 0,
        mode: Mode::Browse,
        busy: None,
    };

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

/// Draw a loading frame, then run a blocking request.
fn with_busy<'a, T>(
    terminal: &mut Term,
    state: &mut AppState<'a>,
    label: &'static str,
    list_state: &mut ListState,
    work: impl FnOnce(&mut AppState<'a>) -> T,
) -> Result<T> {
    state.busy = Some(label);
    terminal.draw(|frame| draw(frame, state, list_state))?;
    let out = work(state);
    state.busy = None;
    Ok(out)
}

fn run_loop(terminal: &mut Term, state: &mut AppState) -> Result<()> {
    let mut list_state = ListState::default();
    list_state.select(Some(0));

    loop {
        terminal.draw(|frame| draw(frame, state, &mut list_state))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let mode = std::mem::replace(&mut state.mode, Mode::Browse);
        state.mode = match mode {
            Mode::Confirm(pending) => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    state.status.clear();
                    match pending {
                        Pending::Delete(id) => {
                            with_busy(terminal, state, "Deleting...", &mut list_state, |s| {
                                let _ = s.dashboard.delete_job(&id);
                            })?;
                        }
                        Pending::Optimize(id) => {
                            with_busy(terminal, state, "Optimizing...", &mut list_state, |s| {
                                let _ = s.dashboard.optimize(&id);
                            })?;
                        }
                    }
                    state.clamp_selection();
                    Mode::Browse
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Mode::Browse,
                _ => Mode::Confirm(pending),
            },

            Mode::Changes(view) => match key.code {
                KeyCode::Esc | KeyCode::Char('q') => {
                    state.scroll_offset = 0;
                    Mode::Browse
                }
                KeyCode::Char('J') | KeyCode::PageDown | KeyCode::Down | KeyCode::Char('j') => {
                    state.scroll_down();
                    Mode::Changes(view)
                }
                KeyCode::Char('K') | KeyCode::PageUp | KeyCode::Up | KeyCode::Char('k') => {
                    state.scroll_up();
                    Mode::Changes(view)
                }
                KeyCode::Char('b') => {
                    export_panel(state, &view, Panel::Original);
                    Mode::Changes(view)
                }
                KeyCode::Char('p') => {
                    export_panel(state, &view, Panel::Optimized);
                    Mode::Changes(view)
                }
                _ => Mode::Changes(view),
            },

            Mode::Browse => {
                let prev_selected = state.selected;
                let next_mode = match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    KeyCode::Down | KeyCode::Char('j') => {
                        state.next();
                        Mode::Browse
                    }
                    KeyCode::Up | KeyCode::Char('k') => {
                        state.prev();
                        Mode::Browse
                    }
                    KeyCode::Char('J') | KeyCode::PageDown => {
                        state.scroll_down();
                        Mode::Browse
                    }
                    KeyCode::Char('K') | KeyCode::PageUp => {
                        state.scroll_up();
                        Mode::Browse
                    }
                    KeyCode::Char('o') => match state.current_id() {
                        Some(id) => Mode::Confirm(Pending::Optimize(id)),
                        None => Mode::Browse,
                    },
                    KeyCode::Char('d') => match state.current_id() {
                        Some(id) => Mode::Confirm(Pending::Delete(id)),
                        None => Mode::Browse,
                    },
                    KeyCode::Char('r') => {
                        state.status.clear();
                        with_busy(terminal, state, "Loading jobs...", &mut list_state, |s| {
                            let _ = s.dashboard.refresh();
                        })?;
                        state.clamp_selection();
                        Mode::Browse
                    }
                    KeyCode::Char('v') | KeyCode::Enter => {
                        match state.current_job().filter(|j| j.is_optimized()).cloned() {
                            Some(job) => {
                                let view = with_busy(
                                    terminal,
                                    state,
                                    "Loading resumes...",
                                    &mut list_state,
                                    |s| ChangesView::load(s.dashboard.store(), &job),
                                )?;
                                state.scroll_offset = 0;
                                Mode::Changes(Box::new(view))
                            }
                            None => Mode::Browse,
                        }
                    }
                    _ => Mode::Browse,
                };
                if state.selected != prev_selected {
                    list_state.select(Some(state.selected));
                }
                next_mode
            }
        };
        list_state.select(Some(state.selected));
    }
    Ok(())
}

fn export_panel(state: &AppState, view: &ChangesView, panel: Panel) {
    let notifier = state.dashboard.notifier();
    if let ExportOutcome::Saved(path) = view.export(panel, state.target, notifier) {
        notifier.notify(Notice::Success(format!("Saved {}", path.display())));
    }
}

fn status_style(status: JobStatus) -> Style {
    match status {
        JobStatus::Optimized => Style::default().fg(Color::Green),
        JobStatus::InProgress => Style::default().fg(Color::Yellow),
        JobStatus::Pending => Style::default().fg(Color::DarkGray),
    }
}

fn draw(frame: &mut Frame, state: &AppState, list_state: &mut ListState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1), Constraint::Length(1)])
        .split(frame.area());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(rows[0]);

    // Left panel: job list
    let items: Vec<ListItem> = state
        .dashboard
        .jobs()
        .iter()
        .map(|job| {
            let status_icon = match job.status {
                JobStatus::Optimized => "+",
                JobStatus::InProgress => "*",
                JobStatus::Pending => " ",
            };
            let stale = if state.dashboard.flags(&job.id).needs_reoptimization { "!" } else { " " };
            ListItem::new(format!(
                "{}{} {} | {}",
                status_icon,
                stale,
                truncate(&job.position, 28),
                truncate(&job.company_name, 20)
            ))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(format!(
            " Job Dashboard ({}) ",
            state.dashboard.jobs().len()
        )))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, chunks[0], list_state);

    // Right panel: card or changes
    match &state.mode {
        Mode::Changes(view) => draw_changes(frame, chunks[1], state, view),
        _ => {
            let detail = Paragraph::new(build_card(state))
                .block(Block::default().borders(Borders::ALL).title(" Job Card "))
                .wrap(Wrap { trim: false })
                .scroll((state.scroll_offset, 0));
            frame.render_widget(detail, chunks[1]);
        }
    }

    // Status line
    let status = match (state.busy, state.status.current()) {
        (Some(label), _) => Paragraph::new(format!(" {}", label))
            .style(Style::default().fg(Color::Yellow)),
        (None, Some(notice)) => {
            let color = if notice.is_error() { Color::Red } else { Color::Green };
            Paragraph::new(format!(" {}", notice.message())).style(Style::default().fg(color))
        }
        (None, None) => Paragraph::new(""),
    };
    frame.render_widget(status, rows[1]);

    // Footer help
    let help = match state.mode {
        Mode::Changes(_) => " j/k:scroll  b:download original  p:download optimized  esc:back",
        _ => " j/k:navigate  J/K:scroll  o:optimize  v:view changes  d:delete  r:refresh  q:quit",
    };
    frame.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        rows[2],
    );

    if let Mode::Confirm(pending) = &state.mode {
        draw_confirm(frame, pending.prompt());
    }
}

fn draw_confirm(frame: &mut Frame, prompt: &str) {
    let area = frame.area();
    let width = (prompt.len() as u16 + 6).min(area.width);
    let popup = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + area.height.saturating_sub(5) / 2,
        width,
        height: 5.min(area.height),
    };
    let text = Text::from(vec![
        Line::from(prompt.to_string()),
        Line::from(""),
        Line::from(Span::styled("y: yes   n: no", Style::default().fg(Color::DarkGray))),
    ]);
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(" Confirm ")),
        popup,
    );
}

fn build_card<'a>(state: &'a AppState) -> Text<'a> {
    let Some(job) = state.current_job() else {
        return Text::raw(EMPTY_DASHBOARD);
    };
    let flags = state.dashboard.flags(&job.id);

    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(Span::styled(
        &job.position,
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(Span::styled(
        format!("Status: {}", job.status),
        status_style(job.status),
    )));
    lines.push(Line::from(""));
    lines.push(Line::from(format!("Client: {}", job.client_name)));
    lines.push(Line::from(format!("Company: {}", job.company_name)));
    if let Some(link) = &job.job_link {
        lines.push(Line::from(format!("Link: {}", link)));
    }
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled(
        "Job Description",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for line in textwrap::fill(&description_snippet(&job.job_description), 70).lines() {
        lines.push(Line::from(format!("  {}", line)));
    }
    lines.push(Line::from(""));

    if let Some(when) = optimized_on_local(job) {
        lines.push(Line::from(Span::styled(
            format!("Optimized On: {}", when),
            Style::default().fg(Color::DarkGray),
        )));
    }

    if let Some(err) = &flags.optimize_error {
        lines.push(Line::from(Span::styled(err.clone(), Style::default().fg(Color::Red))));
    }

    if flags.needs_reoptimization && job.is_optimized() {
        lines.push(Line::from(Span::styled(
            REOPTIMIZE_NOTICE,
            Style::default().fg(Color::Yellow),
        )));
    }

    lines.push(Line::from(""));
    let mut actions = format!("[o] {}", optimize_label(job, &flags));
    if job.is_optimized() {
        actions.push_str("  [v] View Changes");
    }
    actions.push_str("  [d] Delete");
    lines.push(Line::from(Span::styled(actions, Style::default().fg(Color::Cyan))));

    Text::from(lines)
}

fn draw_changes(frame: &mut Frame, area: Rect, state: &AppState, view: &ChangesView) {
    let has_comparison = view.has_comparison();
    let constraints = if has_comparison {
        [Constraint::Percentage(35), Constraint::Percentage(65)]
    } else {
        [Constraint::Percentage(100), Constraint::Percentage(0)]
    };
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let mut lines: Vec<Line> = Vec::new();
    match view.placeholder() {
        Some(placeholder) => lines.push(Line::from(placeholder)),
        None => {
            for category in &view.categories {
                lines.push(Line::from(Span::styled(
                    category.title.clone(),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                for line in textwrap::fill(&category.description, 70).lines() {
                    lines.push(Line::from(format!("  {}", line)));
                }
                lines.push(Line::from(""));
            }
        }
    }
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .block(Block::default().borders(Borders::ALL).title(" Summary of Changes "))
            .wrap(Wrap { trim: false }),
        parts[0],
    );

    if !has_comparison {
        return;
    }

    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(parts[1]);

    for (panel, key, rect) in [
        (Panel::Original, 'b', panels[0]),
        (Panel::Optimized, 'p', panels[1]),
    ] {
        let text = view.panel(panel).unwrap_or_default();
        frame.render_widget(
            Paragraph::new(text)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(format!(" {} [{}] Download PDF ", panel.title(), key)),
                )
                .wrap(Wrap { trim: false })
                .scroll((state.scroll_offset, 0)),
            rect,
        );
    }
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
