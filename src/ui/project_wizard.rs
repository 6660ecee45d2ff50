use anyhow::Result;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use payment_tracker::TrackerError;
use payment_tracker::models::{Project, ProjectDetails, ProjectId};

use crate::ui::Palette;
use crate::ui::components::date_input::DateInputState;

pub enum ProjectWizardAction {
    Cancel,
    /// `None` creates a project, `Some` edits that one
    Save(Option<ProjectId>, ProjectDetails),
}

#[derive(Clone, PartialEq, Copy, Debug)]
pub enum ProjectField {
    Client,
    Project,
    Amount,
    DueDate,
}

const FIELDS: [ProjectField; 4] = [
    ProjectField::Client,
    ProjectField::Project,
    ProjectField::Amount,
    ProjectField::DueDate,
];

impl ProjectField {
    fn label(self) -> &'static str {
        match self {
            ProjectField::Client => "Client",
            ProjectField::Project => "Project",
            ProjectField::Amount => "Amount ($)",
            ProjectField::DueDate => "Due Date",
        }
    }
}

pub struct ProjectWizardState {
    project_id: Option<ProjectId>,
    client: String,
    project: String,
    amount: String,
    due_date: DateInputState,
    current_field: ProjectField,
    editing: bool,
    error: Option<String>,
}

impl ProjectWizardState {
    pub fn new(today: chrono::NaiveDate) -> Self {
        Self {
            project_id: None,
            client: String::new(),
            project: String::new(),
            amount: String::new(),
            due_date: DateInputState::new(today),
            current_field: ProjectField::Client,
            editing: false,
            error: None,
        }
    }

    pub fn from_existing(project: &Project) -> Self {
        Self {
            project_id: Some(project.id()),
            client: project.client().to_string(),
            project: project.name().to_string(),
            amount: project.amount().to_string(),
            due_date: DateInputState::new(project.due_date()),
            current_field: ProjectField::Client,
            editing: false,
            error: None,
        }
    }

    pub fn is_new(&self) -> bool {
        self.project_id.is_none()
    }

    pub fn set_error(&mut self, error: &TrackerError) {
        self.error = Some(error.to_string());
    }

    pub fn toggle_editing(&mut self) {
        self.editing = !self.editing;
        let date_editing = self.editing && self.current_field == ProjectField::DueDate;
        self.due_date.set_editing(date_editing);
    }

    fn field_index(&self) -> usize {
        FIELDS.iter().position(|f| *f == self.current_field).unwrap_or(0)
    }

    pub fn next_field(&mut self) {
        self.current_field = FIELDS[(self.field_index() + 1) % FIELDS.len()];
    }

    pub fn previous_field(&mut self) {
        self.current_field = FIELDS[(self.field_index() + FIELDS.len() - 1) % FIELDS.len()];
    }

    pub fn edit_current_field(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }

        let text = match self.current_field {
            ProjectField::Client => &mut self.client,
            ProjectField::Project => &mut self.project,
            ProjectField::Amount => &mut self.amount,
            ProjectField::DueDate => {
                self.due_date.handle_input(key);
                return;
            }
        };

        match key {
            KeyCode::Char(c) => text.push(c),
            KeyCode::Backspace => {
                text.pop();
            }
            _ => {}
        }
    }

    /// Parse the form into project details, validating them
    pub fn to_details(&self) -> Result<ProjectDetails, TrackerError> {
        let amount = self.amount.trim().parse::<f64>().map_err(|_| {
            TrackerError::validation("amount", format!("`{}` is not a number", self.amount.trim()))
        })?;

        let details = ProjectDetails {
            client: self.client.trim().to_string(),
            project: self.project.trim().to_string(),
            amount,
            due_date: self.due_date.date(),
        };
        details.validate()?;
        Ok(details)
    }

    fn value(&self, field: ProjectField) -> String {
        match field {
            ProjectField::Client => self.client.clone(),
            ProjectField::Project => self.project.clone(),
            ProjectField::Amount => self.amount.clone(),
            ProjectField::DueDate => self.due_date.display(),
        }
    }
}

pub fn render_project_wizard<B: Backend>(f: &mut Frame<B>, state: &ProjectWizardState, palette: Palette) {
    f.render_widget(Block::default().style(palette.base()), f.size());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(f.size());

    let title_text = if state.is_new() { "New Project" } else { "Edit Project" };
    let title = Paragraph::new(title_text)
        .style(palette.base().fg(palette.accent))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    render_form(f, state, chunks[1], palette);

    let error = Paragraph::new(state.error.clone().unwrap_or_default())
        .style(palette.base().fg(Color::Red))
        .block(Block::default().borders(Borders::ALL).title("Problems"));
    f.render_widget(error, chunks[2]);

    let help_text = if state.editing {
        match state.current_field {
            ProjectField::DueDate => "Type digits | Left/Right - Switch date part | Enter/Esc - Done",
            _ => "Type to edit | Enter/Esc - Done",
        }
    } else {
        "Enter - Edit field | Up/Down - Navigate | S - Save project | Esc - Cancel"
    };
    let help = Paragraph::new(help_text)
        .style(palette.base().fg(palette.muted))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[3]);
}

fn render_form<B: Backend>(f: &mut Frame<B>, state: &ProjectWizardState, area: Rect, palette: Palette) {
    let items: Vec<ListItem> = FIELDS
        .iter()
        .map(|&field| {
            let selected = field == state.current_field;
            let label_style = if selected {
                palette.base().fg(palette.accent)
            } else {
                palette.base()
            };

            let mut value = state.value(field);
            let value_style = if selected && state.editing {
                if field != ProjectField::DueDate {
                    value.push('|');
                }
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            ListItem::new(Spans::from(vec![
                Span::styled(format!("{}: ", field.label()), label_style),
                Span::styled(value, value_style),
            ]))
        })
        .collect();

    let form = List::new(items)
        .style(palette.base())
        .block(Block::default().borders(Borders::ALL).title("Project Details"));
    f.render_widget(form, area);
}

pub fn handle_input(state: &mut ProjectWizardState) -> Result<Option<ProjectWizardAction>> {
    if let Event::Key(key) = event::read()? {
        match key.code {
            KeyCode::Esc | KeyCode::Enter if state.editing => {
                state.toggle_editing();
            }
            KeyCode::Esc => {
                return Ok(Some(ProjectWizardAction::Cancel));
            }
            KeyCode::Enter => {
                state.toggle_editing();
            }
            KeyCode::Up | KeyCode::BackTab if !state.editing => {
                state.previous_field();
            }
            KeyCode::Down | KeyCode::Tab if !state.editing => {
                state.next_field();
            }
            KeyCode::Char('s') | KeyCode::Char('S') if !state.editing => match state.to_details() {
                Ok(details) => return Ok(Some(ProjectWizardAction::Save(state.project_id, details))),
                Err(err) => state.set_error(&err),
            },
            _ if state.editing => {
                state.edit_current_field(key.code);
            }
            _ => {}
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use payment_tracker::dates;

    fn type_into(state: &mut ProjectWizardState, field: ProjectField, text: &str) {
        while state.current_field != field {
            state.next_field();
        }
        state.toggle_editing();
        for c in text.chars() {
            state.edit_current_field(KeyCode::Char(c));
        }
        state.toggle_editing();
    }

    #[test]
    fn filled_form_produces_details() {
        let mut state = ProjectWizardState::new(dates::parse_iso("2025-06-01").unwrap());
        type_into(&mut state, ProjectField::Client, "Acme");
        type_into(&mut state, ProjectField::Project, "Rebrand");
        type_into(&mut state, ProjectField::Amount, "1500.50");

        let details = state.to_details().unwrap();
        assert_eq!(details.client, "Acme");
        assert_eq!(details.amount, 1500.5);
        assert_eq!(dates::format_iso(details.due_date), "2025-06-01");
    }

    #[test]
    fn unparseable_amount_is_a_validation_error() {
        let mut state = ProjectWizardState::new(dates::parse_iso("2025-06-01").unwrap());
        type_into(&mut state, ProjectField::Client, "Acme");
        type_into(&mut state, ProjectField::Project, "Rebrand");
        type_into(&mut state, ProjectField::Amount, "lots");

        assert!(matches!(
            state.to_details(),
            Err(TrackerError::Validation { field: "amount", .. })
        ));
    }

    #[test]
    fn fields_wrap_around() {
        let mut state = ProjectWizardState::new(dates::parse_iso("2025-06-01").unwrap());
        state.previous_field();
        assert_eq!(state.current_field, ProjectField::DueDate);
        state.next_field();
        assert_eq!(state.current_field, ProjectField::Client);
    }
}
