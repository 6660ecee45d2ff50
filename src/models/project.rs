use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Payment;
use crate::error::{Result, TrackerError};

/// Stable identifier of a project, independent of its display position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(Uuid);

impl ProjectId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ProjectId {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|err| TrackerError::validation("id", err.to_string()))
    }
}

/// The scalar fields of a project; an edit replaces all of them at once
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetails {
    pub client: String,
    pub project: String,
    /// Fixed total owed; never changed by payment activity
    pub amount: f64,
    #[serde(with = "crate::dates::iso")]
    pub due_date: NaiveDate,
}

impl ProjectDetails {
    /// Checks applied to user input before a project is created or edited
    pub fn validate(&self) -> Result<()> {
        if self.client.trim().is_empty() {
            return Err(TrackerError::validation("client", "must not be empty"));
        }
        if self.project.trim().is_empty() {
            return Err(TrackerError::validation("project", "must not be empty"));
        }
        check_amount(self.amount)
    }
}

pub(crate) fn check_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() {
        return Err(TrackerError::validation("amount", format!("{amount} is not a finite number")));
    }
    if amount <= 0.0 {
        return Err(TrackerError::validation("amount", format!("{amount} must be greater than zero")));
    }
    Ok(())
}

/// A billable engagement and the payments received against it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    id: ProjectId,
    #[serde(flatten)]
    details: ProjectDetails,
    payments: Vec<Payment>,
}

impl Project {
    /// Create a fresh project with no payments
    pub fn new(details: ProjectDetails) -> Result<Self> {
        details.validate()?;
        Ok(Self {
            id: ProjectId::generate(),
            details,
            payments: Vec::new(),
        })
    }

    /// Rebuild a stored project. Names are taken as stored; amounts are checked.
    pub(crate) fn restore(id: ProjectId, details: ProjectDetails, payments: Vec<Payment>) -> Result<Self> {
        check_amount(details.amount)?;
        Ok(Self { id, details, payments })
    }

    pub fn id(&self) -> ProjectId {
        self.id
    }

    pub fn details(&self) -> &ProjectDetails {
        &self.details
    }

    pub fn client(&self) -> &str {
        &self.details.client
    }

    pub fn name(&self) -> &str {
        &self.details.project
    }

    pub fn amount(&self) -> f64 {
        self.details.amount
    }

    pub fn due_date(&self) -> NaiveDate {
        self.details.due_date
    }

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    /// Overwrite the scalar fields, leaving the payment history alone
    pub fn update(&mut self, details: ProjectDetails) -> Result<()> {
        details.validate()?;
        self.details = details;
        Ok(())
    }

    pub fn add_payment(&mut self, payment: Payment) {
        self.payments.push(payment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(amount: f64) -> ProjectDetails {
        ProjectDetails {
            client: "Acme".into(),
            project: "Website".into(),
            amount,
            due_date: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
        }
    }

    #[test]
    fn new_project_starts_without_payments() {
        let project = Project::new(details(500.0)).unwrap();
        assert!(project.payments().is_empty());
        assert_eq!(project.amount(), 500.0);
    }

    #[test]
    fn rejects_non_positive_and_non_finite_amounts() {
        for amount in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                Project::new(details(amount)),
                Err(TrackerError::Validation { field: "amount", .. })
            ));
        }
    }

    #[test]
    fn rejects_blank_names() {
        let mut input = details(10.0);
        input.client = "  ".into();
        assert!(matches!(
            Project::new(input),
            Err(TrackerError::Validation { field: "client", .. })
        ));
    }

    #[test]
    fn update_keeps_id_and_payments() {
        let mut project = Project::new(details(100.0)).unwrap();
        let id = project.id();
        let paid_on = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        project.add_payment(Payment::new(paid_on, 40.0).unwrap());

        project.update(details(250.0)).unwrap();

        assert_eq!(project.id(), id);
        assert_eq!(project.amount(), 250.0);
        assert_eq!(project.payments().len(), 1);
    }

    #[test]
    fn failed_update_leaves_project_untouched() {
        let mut project = Project::new(details(100.0)).unwrap();
        assert!(project.update(details(-5.0)).is_err());
        assert_eq!(project.amount(), 100.0);
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let project = Project::new(details(100.0)).unwrap();
        let value = serde_json::to_value(&project).unwrap();
        assert_eq!(value["client"], "Acme");
        assert_eq!(value["project"], "Website");
        assert_eq!(value["dueDate"], "2025-06-30");
        assert_eq!(value["payments"], serde_json::json!([]));
        assert_eq!(value["id"], project.id().to_string());
    }

    #[test]
    fn project_id_parses_its_display_form() {
        let id = ProjectId::generate();
        assert_eq!(id.to_string().parse::<ProjectId>().unwrap(), id);
        assert!("not-an-id".parse::<ProjectId>().is_err());
    }
}
