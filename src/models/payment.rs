use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{Result, TrackerError};

/// One settlement recorded against a project
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payment {
    #[serde(with = "crate::dates::iso")]
    date: NaiveDate,
    amount: f64,
}

impl Payment {
    pub fn new(date: NaiveDate, amount: f64) -> Result<Self> {
        if !amount.is_finite() {
            return Err(TrackerError::validation(
                "payment amount",
                format!("{amount} is not a finite number"),
            ));
        }
        if amount < 0.0 {
            return Err(TrackerError::validation(
                "payment amount",
                format!("{amount} must not be negative"),
            ));
        }
        Ok(Self { date, amount })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }
}
