use anyhow::Result;
use chrono::NaiveDate;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};

use payment_tracker::models::{Project, ProjectId};
use payment_tracker::{TrackerError, dates, ledger};

use crate::ui::components::date_input::DateInputState;
use crate::ui::{Palette, centered_rect};

pub enum PaymentsAction {
    Close,
    AddPayment {
        project_id: ProjectId,
        date: NaiveDate,
        amount: f64,
    },
}

#[derive(Clone, Copy, PartialEq, Debug)]
enum PaymentField {
    Date,
    Amount,
}

/// Payment history of one project plus the add-payment form
pub struct PaymentsState {
    project_id: ProjectId,
    project_name: String,
    history: Vec<(String, String)>,
    summary: String,
    date: DateInputState,
    amount: String,
    field: PaymentField,
    editing: bool,
    error: Option<String>,
}

impl PaymentsState {
    pub fn new(project: &Project, today: NaiveDate) -> Self {
        let history = project
            .payments()
            .iter()
            .map(|p| (dates::format_iso(p.date()), ledger::money(p.amount())))
            .collect();
        let summary = format!(
            "Total {} | Paid {} | Remaining {}",
            ledger::money(project.amount()),
            ledger::money(ledger::total_paid(project)),
            ledger::money(ledger::remaining(project)),
        );

        Self {
            project_id: project.id(),
            project_name: project.name().to_string(),
            history,
            summary,
            date: DateInputState::new(today),
            amount: String::new(),
            field: PaymentField::Amount,
            editing: false,
            error: None,
        }
    }

    pub fn set_error(&mut self, error: &TrackerError) {
        self.error = Some(error.to_string());
    }

    fn toggle_editing(&mut self) {
        self.editing = !self.editing;
        self.date.set_editing(self.editing && self.field == PaymentField::Date);
    }

    fn switch_field(&mut self) {
        self.field = match self.field {
            PaymentField::Date => PaymentField::Amount,
            PaymentField::Amount => PaymentField::Date,
        };
    }

    fn submit(&mut self) -> Option<PaymentsAction> {
        match self.amount.trim().parse::<f64>() {
            Ok(amount) => Some(PaymentsAction::AddPayment {
                project_id: self.project_id,
                date: self.date.date(),
                amount,
            }),
            Err(_) => {
                self.set_error(&TrackerError::validation(
                    "payment amount",
                    format!("`{}` is not a number", self.amount.trim()),
                ));
                None
            }
        }
    }
}

pub fn render_payments<B: Backend>(frame: &mut Frame<B>, state: &PaymentsState, palette: Palette) {
    let area = centered_rect(70, 70, frame.size());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(format!("Payments for Project: {}", state.project_name))
        .borders(Borders::ALL)
        .style(palette.base());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(4),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    frame.render_widget(
        Paragraph::new(state.summary.as_str()).style(palette.base().fg(palette.accent)),
        chunks[0],
    );

    let header = Row::new(["Date", "Amount"].map(|h| Cell::from(h).style(Style::default().fg(palette.accent))))
        .bottom_margin(1);
    let rows = state
        .history
        .iter()
        .map(|(date, amount)| Row::new(vec![Cell::from(date.as_str()), Cell::from(amount.as_str())]));
    let table = Table::new(rows)
        .header(header)
        .style(palette.base())
        .block(Block::default().borders(Borders::TOP).title("History"))
        .widths(&[Constraint::Percentage(50), Constraint::Percentage(50)]);
    frame.render_widget(table, chunks[1]);

    let field_line = |field: PaymentField, label: &str, value: String| {
        let active = field == state.field;
        let mut value = value;
        if active && state.editing && field == PaymentField::Amount {
            value.push('|');
        }
        Spans::from(vec![
            Span::styled(
                format!("{label}: "),
                if active { palette.base().fg(palette.accent) } else { palette.base() },
            ),
            Span::styled(
                value,
                if active && state.editing {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                },
            ),
        ])
    };
    let form = Paragraph::new(vec![
        field_line(PaymentField::Date, "Date", state.date.display()),
        field_line(PaymentField::Amount, "Amount", state.amount.clone()),
    ])
    .style(palette.base())
    .block(Block::default().borders(Borders::TOP).title("Add Payment"));
    frame.render_widget(form, chunks[2]);

    frame.render_widget(
        Paragraph::new(state.error.clone().unwrap_or_default()).style(palette.base().fg(Color::Red)),
        chunks[3],
    );

    let help = if state.editing {
        "Enter/Esc - Done"
    } else {
        "Tab - Switch field | Enter - Edit | A - Add payment | Esc - Close"
    };
    frame.render_widget(Paragraph::new(help).style(palette.base().fg(palette.muted)), chunks[4]);
}

pub fn handle_input(state: &mut PaymentsState) -> Result<Option<PaymentsAction>> {
    if let Event::Key(key) = event::read()? {
        match key.code {
            KeyCode::Esc | KeyCode::Enter if state.editing => state.toggle_editing(),
            KeyCode::Esc | KeyCode::Char('q') if !state.editing => return Ok(Some(PaymentsAction::Close)),
            KeyCode::Enter => state.toggle_editing(),
            KeyCode::Tab | KeyCode::Up | KeyCode::Down if !state.editing => state.switch_field(),
            KeyCode::Char('a') | KeyCode::Char('A') if !state.editing => return Ok(state.submit()),
            code if state.editing => match state.field {
                PaymentField::Date => state.date.handle_input(code),
                PaymentField::Amount => match code {
                    KeyCode::Char(c) if c.is_ascii_digit() || c == '.' => state.amount.push(c),
                    KeyCode::Backspace => {
                        state.amount.pop();
                    }
                    _ => {}
                },
            },
            _ => {}
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use payment_tracker::models::{Payment, ProjectDetails};

    fn project() -> Project {
        let mut project = Project::new(ProjectDetails {
            client: "Acme".into(),
            project: "Site".into(),
            amount: 100.0,
            due_date: dates::parse_iso("2025-07-01").unwrap(),
        })
        .unwrap();
        project.add_payment(Payment::new(dates::parse_iso("2025-05-01").unwrap(), 30.0).unwrap());
        project
    }

    #[test]
    fn lists_history_and_totals() {
        let state = PaymentsState::new(&project(), dates::parse_iso("2025-06-01").unwrap());
        assert_eq!(state.history, vec![("2025-05-01".to_string(), "$30.00".to_string())]);
        assert_eq!(state.summary, "Total $100.00 | Paid $30.00 | Remaining $70.00");
    }

    #[test]
    fn submit_uses_form_values() {
        let today = dates::parse_iso("2025-06-01").unwrap();
        let mut state = PaymentsState::new(&project(), today);
        state.amount = "25.5".into();

        match state.submit() {
            Some(PaymentsAction::AddPayment { project_id, date, amount }) => {
                assert_eq!(project_id, state.project_id);
                assert_eq!(date, today);
                assert_eq!(amount, 25.5);
            }
            _ => panic!("expected a payment"),
        }
    }

    #[test]
    fn submit_with_empty_amount_reports_error() {
        let mut state = PaymentsState::new(&project(), dates::parse_iso("2025-06-01").unwrap());
        assert!(state.submit().is_none());
        assert!(state.error.is_some());
    }
}
