pub mod components;
pub mod dashboard;
pub mod payments;
pub mod project_wizard;

use tui::layout::{Constraint, Direction, Layout, Rect};
use tui::style::{Color, Style};

use payment_tracker::models::{PaymentStatus, Theme};

/// Colors for the current theme
#[derive(Clone, Copy)]
pub struct Palette {
    pub text: Color,
    pub background: Color,
    pub accent: Color,
    pub muted: Color,
    pub highlight_bg: Color,
    pub highlight_fg: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                text: Color::Black,
                background: Color::White,
                accent: Color::Blue,
                muted: Color::DarkGray,
                highlight_bg: Color::Blue,
                highlight_fg: Color::White,
            },
            Theme::Dark => Self {
                text: Color::White,
                background: Color::Black,
                accent: Color::Yellow,
                muted: Color::Gray,
                highlight_bg: Color::Blue,
                highlight_fg: Color::White,
            },
        }
    }

    pub fn base(&self) -> Style {
        Style::default().fg(self.text).bg(self.background)
    }

    pub fn status_color(&self, status: PaymentStatus) -> Color {
        match status {
            PaymentStatus::FullyPaid => Color::Green,
            PaymentStatus::Partial => Color::Cyan,
            PaymentStatus::Unpaid => Color::Yellow,
            PaymentStatus::Overdue => Color::Red,
        }
    }
}

/// A rect centered in `r`, sized as a percentage of it
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
