use anyhow::Result;
use chrono::NaiveDate;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Span, Spans},
    widgets::{BarChart, Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use payment_tracker::Tracker;
use payment_tracker::ledger::{self, COLUMNS, ChartData, ProjectRow, Summary};
use payment_tracker::models::{PaymentStatus, ProjectId, StatusFilter, Theme};
use payment_tracker::store::KeyValueStore;

use crate::ui::{Palette, centered_rect};

/// Bar chart inputs. Created from a summary and replaced wholesale on refresh.
pub struct DashboardCharts {
    status: Vec<(&'static str, u64)>,
    amounts: Vec<(&'static str, u64)>,
}

impl DashboardCharts {
    pub fn new(summary: &Summary) -> Self {
        let ChartData { status_counts, amounts } = ledger::chart_data(summary);
        Self {
            status: status_counts.to_vec(),
            // Bars are whole dollars; the summary line carries the cents
            amounts: amounts
                .iter()
                .map(|&(label, value)| (label, value.max(0.0).round() as u64))
                .collect(),
        }
    }
}

pub enum DashboardAction {
    Quit,
    NewProject,
    EditProject(ProjectId),
    DeleteProject(ProjectId),
    ViewPayments(ProjectId),
    ExportCsv,
    ExportPdf,
    ToggleTheme,
}

pub struct DashboardState {
    filter: StatusFilter,
    rows: Vec<ProjectRow>,
    summary: Summary,
    charts: DashboardCharts,
    theme: Theme,
    table_state: TableState,
    show_delete_confirmation: bool,
    message: Option<String>,
}

impl DashboardState {
    pub fn new<S: KeyValueStore>(tracker: &Tracker<S>, as_of: NaiveDate) -> Self {
        let summary = tracker.summary(as_of);
        let mut state = Self {
            filter: StatusFilter::All,
            rows: Vec::new(),
            summary,
            charts: DashboardCharts::new(&summary),
            theme: tracker.theme(),
            table_state: TableState::default(),
            show_delete_confirmation: false,
            message: None,
        };
        state.refresh(tracker, as_of);
        state
    }

    /// Recompute rows, totals and charts from the tracker
    pub fn refresh<S: KeyValueStore>(&mut self, tracker: &Tracker<S>, as_of: NaiveDate) {
        self.rows = tracker.rows(self.filter, as_of);
        self.summary = tracker.summary(as_of);
        self.charts = DashboardCharts::new(&self.summary);
        self.theme = tracker.theme();

        let selected = match self.table_state.selected() {
            _ if self.rows.is_empty() => None,
            Some(i) => Some(i.min(self.rows.len() - 1)),
            None => Some(0),
        };
        self.table_state.select(selected);
    }

    pub fn cycle_filter<S: KeyValueStore>(&mut self, tracker: &Tracker<S>, as_of: NaiveDate) {
        self.filter = self.filter.next();
        self.table_state.select(None);
        self.refresh(tracker, as_of);
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn next(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) if i + 1 < self.rows.len() => i + 1,
            _ => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let i = match self.table_state.selected() {
            Some(0) | None => self.rows.len() - 1,
            Some(i) => i - 1,
        };
        self.table_state.select(Some(i));
    }

    pub fn selected_id(&self) -> Option<ProjectId> {
        self.table_state
            .selected()
            .and_then(|i| self.rows.get(i))
            .map(|row| row.id)
    }
}

pub fn render_dashboard<B: Backend>(frame: &mut Frame<B>, state: &mut DashboardState) {
    let palette = Palette::for_theme(state.theme);
    let size = frame.size();
    frame.render_widget(Block::default().style(palette.base()), size);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(12),
            Constraint::Length(3),
        ])
        .split(size);

    render_totals(frame, state, chunks[0], palette);
    render_table(frame, state, chunks[1], palette);
    render_charts(frame, state, chunks[2], palette);

    let help = "<N> New | <E> Edit | <D> Delete | <Enter> Payments | <F> Filter | <C> CSV | <X> PDF | <T> Theme | <Q> Quit";
    let footer = Paragraph::new(vec![
        Spans::from(Span::styled(state.message.clone().unwrap_or_default(), palette.base().fg(palette.accent))),
        Spans::from(Span::styled(help, palette.base().fg(palette.muted))),
    ])
    .style(palette.base())
    .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[3]);

    if state.show_delete_confirmation {
        render_delete_confirmation(frame, size, palette);
    }
}

fn render_totals<B: Backend>(frame: &mut Frame<B>, state: &DashboardState, area: Rect, palette: Palette) {
    let bold = palette.base().add_modifier(Modifier::BOLD);
    let totals = Paragraph::new(Spans::from(vec![
        Span::styled("Total Due: ", palette.base()),
        Span::styled(ledger::money(state.summary.total_due), bold),
        Span::raw("   "),
        Span::styled("Total Paid: ", palette.base()),
        Span::styled(ledger::money(state.summary.total_paid), bold.fg(palette.status_color(PaymentStatus::FullyPaid))),
        Span::raw("   "),
        Span::styled("Total Overdue: ", palette.base()),
        Span::styled(ledger::money(state.summary.total_overdue), bold.fg(palette.status_color(PaymentStatus::Overdue))),
    ]))
    .style(palette.base())
    .block(Block::default().borders(Borders::ALL).title("Freelancer Tracker"));
    frame.render_widget(totals, area);
}

fn render_table<B: Backend>(frame: &mut Frame<B>, state: &mut DashboardState, area: Rect, palette: Palette) {
    let header = Row::new(COLUMNS.map(|h| Cell::from(h).style(Style::default().fg(palette.accent))))
        .height(1)
        .bottom_margin(1);

    let rows = state.rows.iter().map(|row| {
        let cells = row.table_cells();
        let status_style = Style::default().fg(palette.status_color(row.status));
        let [client, project, total, paid, remaining, due, status] = cells;
        Row::new(vec![
            Cell::from(client),
            Cell::from(project),
            Cell::from(total),
            Cell::from(paid),
            Cell::from(remaining),
            Cell::from(due),
            Cell::from(status).style(status_style),
        ])
    });

    let title = format!("Projects ({})", state.filter.label());
    let table = Table::new(rows)
        .header(header)
        .style(palette.base())
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(palette.highlight_bg)
                .fg(palette.highlight_fg)
                .add_modifier(Modifier::BOLD),
        )
        .widths(&[
            Constraint::Percentage(17),
            Constraint::Percentage(19),
            Constraint::Percentage(12),
            Constraint::Percentage(12),
            Constraint::Percentage(12),
            Constraint::Percentage(13),
            Constraint::Percentage(15),
        ]);

    frame.render_stateful_widget(table, area, &mut state.table_state);
}

fn render_charts<B: Backend>(frame: &mut Frame<B>, state: &DashboardState, area: Rect, palette: Palette) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let status_chart = BarChart::default()
        .block(Block::default().title("Projects by Status").borders(Borders::ALL))
        .data(&state.charts.status)
        .bar_width(10)
        .bar_gap(2)
        .style(palette.base())
        .bar_style(Style::default().fg(palette.accent))
        .value_style(Style::default().fg(palette.highlight_fg).bg(palette.accent))
        .label_style(palette.base());
    frame.render_widget(status_chart, halves[0]);

    let amounts_chart = BarChart::default()
        .block(Block::default().title("Amount ($)").borders(Borders::ALL))
        .data(&state.charts.amounts)
        .bar_width(10)
        .bar_gap(2)
        .style(palette.base())
        .bar_style(Style::default().fg(palette.status_color(PaymentStatus::FullyPaid)))
        .value_style(Style::default().fg(palette.background).bg(palette.text))
        .label_style(palette.base());
    frame.render_widget(amounts_chart, halves[1]);
}

fn render_delete_confirmation<B: Backend>(frame: &mut Frame<B>, size: Rect, palette: Palette) {
    let popup_area = centered_rect(50, 20, size);

    let popup = Paragraph::new(vec![
        Spans::from(""),
        Spans::from("Delete this project and its payment history?"),
        Spans::from(""),
        Spans::from("<Y> Yes  <N> No"),
    ])
    .block(Block::default().title("Confirm Delete").borders(Borders::ALL))
    .style(palette.base());

    frame.render_widget(tui::widgets::Clear, popup_area);
    frame.render_widget(popup, popup_area);
}

pub fn handle_input<S: KeyValueStore>(
    state: &mut DashboardState,
    tracker: &Tracker<S>,
    as_of: NaiveDate,
) -> Result<Option<DashboardAction>> {
    let Event::Key(key) = event::read()? else {
        return Ok(None);
    };

    if state.show_delete_confirmation {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                state.show_delete_confirmation = false;
                if let Some(id) = state.selected_id() {
                    return Ok(Some(DashboardAction::DeleteProject(id)));
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                state.show_delete_confirmation = false;
            }
            _ => {}
        }
        return Ok(None);
    }

    let action = match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Some(DashboardAction::Quit),
        KeyCode::Char('n') => Some(DashboardAction::NewProject),
        KeyCode::Char('e') => state.selected_id().map(DashboardAction::EditProject),
        KeyCode::Char('p') | KeyCode::Enter => state.selected_id().map(DashboardAction::ViewPayments),
        KeyCode::Char('d') => {
            if state.selected_id().is_some() {
                state.show_delete_confirmation = true;
            }
            None
        }
        KeyCode::Char('f') => {
            state.cycle_filter(tracker, as_of);
            None
        }
        KeyCode::Char('c') => Some(DashboardAction::ExportCsv),
        KeyCode::Char('x') => Some(DashboardAction::ExportPdf),
        KeyCode::Char('t') => Some(DashboardAction::ToggleTheme),
        KeyCode::Down => {
            state.next();
            None
        }
        KeyCode::Up => {
            state.previous();
            None
        }
        _ => None,
    };

    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use payment_tracker::dates;
    use payment_tracker::models::ProjectDetails;
    use payment_tracker::store::MemoryStore;

    fn date(s: &str) -> NaiveDate {
        dates::parse_iso(s).unwrap()
    }

    fn tracker() -> Tracker<MemoryStore> {
        let mut tracker = Tracker::open(MemoryStore::default(), date("2025-06-01")).unwrap();
        for (client, due) in [("A", "2099-01-01"), ("B", "2000-01-01"), ("C", "2099-01-01")] {
            tracker
                .add_project(ProjectDetails {
                    client: client.into(),
                    project: "Work".into(),
                    amount: 100.0,
                    due_date: date(due),
                })
                .unwrap();
        }
        tracker
    }

    #[test]
    fn selection_wraps_and_tracks_ids() {
        let tracker = tracker();
        let mut state = DashboardState::new(&tracker, date("2025-06-01"));
        assert_eq!(state.selected_id(), Some(tracker.projects()[0].id()));

        state.previous();
        assert_eq!(state.selected_id(), Some(tracker.projects()[2].id()));
        state.next();
        assert_eq!(state.selected_id(), Some(tracker.projects()[0].id()));
    }

    #[test]
    fn filter_narrows_rows() {
        let tracker = tracker();
        let as_of = date("2025-06-01");
        let mut state = DashboardState::new(&tracker, as_of);

        // All -> Fully Paid -> Partial -> Unpaid -> Overdue
        for _ in 0..4 {
            state.cycle_filter(&tracker, as_of);
        }
        assert_eq!(state.filter, StatusFilter::Only(PaymentStatus::Overdue));
        assert_eq!(state.rows.len(), 1);
        assert_eq!(state.selected_id(), Some(tracker.projects()[1].id()));
    }

    #[test]
    fn refresh_clamps_selection_after_delete() {
        let mut tracker = tracker();
        let as_of = date("2025-06-01");
        let mut state = DashboardState::new(&tracker, as_of);
        state.previous();

        let last = tracker.projects()[2].id();
        tracker.delete_project(last).unwrap();
        state.refresh(&tracker, as_of);

        assert_eq!(state.selected_id(), Some(tracker.projects()[1].id()));
    }

    #[test]
    fn charts_follow_summary() {
        let tracker = tracker();
        let state = DashboardState::new(&tracker, date("2025-06-01"));
        assert_eq!(state.charts.status[2], ("Unpaid", 2));
        assert_eq!(state.charts.status[3], ("Overdue", 1));
        assert_eq!(state.charts.amounts[1], ("Remaining", 300));
    }
}
