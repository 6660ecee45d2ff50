use chrono::{Datelike, NaiveDate};
use crossterm::event::KeyCode;

use payment_tracker::dates;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum DatePart {
    Year,
    Month,
    Day,
}

impl DatePart {
    fn width(self) -> usize {
        match self {
            DatePart::Year => 4,
            DatePart::Month | DatePart::Day => 2,
        }
    }

    fn next(self) -> Self {
        match self {
            DatePart::Year => DatePart::Month,
            DatePart::Month => DatePart::Day,
            DatePart::Day => DatePart::Year,
        }
    }

    fn previous(self) -> Self {
        match self {
            DatePart::Year => DatePart::Day,
            DatePart::Month => DatePart::Year,
            DatePart::Day => DatePart::Month,
        }
    }
}

/// A date field edited one part at a time by typing digits
pub struct DateInputState {
    date: NaiveDate,
    editing: bool,
    part: DatePart,
    digits: String,
}

impl DateInputState {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            editing: false,
            part: DatePart::Year,
            digits: String::new(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn set_editing(&mut self, editing: bool) {
        self.editing = editing;
        self.part = DatePart::Year;
        self.digits.clear();
    }

    pub fn handle_input(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }

        match key {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                self.digits.push(c);
                if self.digits.len() == self.part.width() {
                    self.commit_digits();
                    self.part = self.part.next();
                }
            }
            KeyCode::Backspace => {
                self.digits.pop();
            }
            KeyCode::Right => {
                self.digits.clear();
                self.part = self.part.next();
            }
            KeyCode::Left => {
                self.digits.clear();
                self.part = self.part.previous();
            }
            _ => {}
        }
    }

    /// Apply the typed digits to the current part. A year or month change
    /// clamps the day to the new month's length; other impossible values are
    /// ignored.
    fn commit_digits(&mut self) {
        let Ok(value) = self.digits.parse::<u32>() else {
            self.digits.clear();
            return;
        };
        self.digits.clear();

        let updated = match self.part {
            DatePart::Year => i32::try_from(value)
                .ok()
                .and_then(|y| clamped(y, self.date.month(), self.date.day())),
            DatePart::Month => clamped(self.date.year(), value, self.date.day()),
            DatePart::Day => self.date.with_day(value),
        };
        if let Some(date) = updated {
            self.date = date;
        }
    }

    pub fn display(&self) -> String {
        let iso = dates::format_iso(self.date);
        if !self.editing {
            return iso;
        }

        let marker = if self.digits.is_empty() {
            match self.part {
                DatePart::Year => "[YYYY]".to_string(),
                DatePart::Month => "[MM]".to_string(),
                DatePart::Day => "[DD]".to_string(),
            }
        } else {
            format!("[{}]", self.digits)
        };

        let (year, month, day) = (self.date.year(), self.date.month(), self.date.day());
        match self.part {
            DatePart::Year => format!("{year:04}{marker}-{month:02}-{day:02}"),
            DatePart::Month => format!("{year:04}-{month:02}{marker}-{day:02}"),
            DatePart::Day => format!("{year:04}-{month:02}-{day:02}{marker}"),
        }
    }
}

/// The date, or the last valid day of that month when `day` overflows it
fn clamped(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    (1..=day).rev().find_map(|d| NaiveDate::from_ymd_opt(year, month, d))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(start: &str, keys: &str) -> NaiveDate {
        let mut state = DateInputState::new(dates::parse_iso(start).unwrap());
        state.set_editing(true);
        for c in keys.chars() {
            state.handle_input(KeyCode::Char(c));
        }
        state.date()
    }

    #[test]
    fn typing_a_full_date_replaces_it() {
        assert_eq!(dates::format_iso(typed("2025-01-01", "20260315")), "2026-03-15");
    }

    #[test]
    fn month_change_clamps_the_day() {
        assert_eq!(dates::format_iso(typed("2025-01-31", "202502")), "2025-02-28");
        assert_eq!(dates::format_iso(typed("2025-01-31", "20250215")), "2025-02-15");
        assert_eq!(dates::format_iso(typed("2024-02-29", "2025")), "2025-02-28");
    }

    #[test]
    fn impossible_day_is_ignored() {
        assert_eq!(dates::format_iso(typed("2025-02-10", "20250231")), "2025-02-10");
        assert_eq!(dates::format_iso(typed("2025-02-10", "202513")), "2025-02-10");
    }

    #[test]
    fn ignores_keys_when_not_editing() {
        let mut state = DateInputState::new(dates::parse_iso("2025-01-01").unwrap());
        state.handle_input(KeyCode::Char('9'));
        assert_eq!(state.display(), "2025-01-01");
    }

    #[test]
    fn display_marks_the_active_part() {
        let mut state = DateInputState::new(dates::parse_iso("2025-01-01").unwrap());
        state.set_editing(true);
        state.handle_input(KeyCode::Right);
        assert_eq!(state.display(), "2025-01[MM]-01");
        state.handle_input(KeyCode::Char('1'));
        assert_eq!(state.display(), "2025-01[1]-01");
    }
}
