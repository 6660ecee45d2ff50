//! Ingestion of stored project records.
//!
//! Older versions stored a single running `paidAmount` per project instead of a
//! payment history. Those records are migrated into the payment-list shape here,
//! and every record is validated before it reaches the ledger.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::dates;
use crate::error::{Result, TrackerError};
use crate::models::{Payment, Project, ProjectDetails, ProjectId};

/// A project record as found in the store, before validation.
///
/// Every field is kept as loosely typed JSON so one badly typed record is
/// rejected on its own instead of failing the whole collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default)]
    pub client: Option<Value>,
    #[serde(default)]
    pub project: Option<Value>,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub due_date: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payments: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_amount: Option<Value>,
}

impl From<&Project> for RawRecord {
    fn from(project: &Project) -> Self {
        let payments = project
            .payments()
            .iter()
            .map(|payment| {
                json!({
                    "date": dates::format_iso(payment.date()),
                    "amount": payment.amount(),
                })
            })
            .collect();

        Self {
            id: Some(Value::from(project.id().to_string())),
            client: Some(Value::from(project.client())),
            project: Some(Value::from(project.name())),
            amount: Some(Value::from(project.amount())),
            due_date: Some(Value::from(dates::format_iso(project.due_date()))),
            payments: Some(Value::Array(payments)),
            paid_amount: None,
        }
    }
}

/// A record that failed validation, by its position in the input
#[derive(Debug)]
pub struct Rejected {
    pub index: usize,
    pub error: TrackerError,
}

#[derive(Debug, Default)]
pub struct Normalized {
    pub projects: Vec<Project>,
    pub rejected: Vec<Rejected>,
    /// Number of legacy `paidAmount` records converted
    pub migrated: usize,
}

/// Migrate and validate raw records. `today` dates the payment synthesized
/// from a legacy `paidAmount`.
pub fn normalize(records: Vec<RawRecord>, today: NaiveDate) -> Normalized {
    collect(records.into_iter().map(Ok), today)
}

/// Like [`normalize`], for stored JSON values. An element that is not a
/// record object is rejected at its index.
pub fn normalize_values(values: &[Value], today: NaiveDate) -> Normalized {
    let records = values.iter().map(|value| {
        RawRecord::deserialize(value)
            .map_err(|_| TrackerError::validation("record", format!("{value} is not a project object")))
    });
    collect(records, today)
}

fn collect(records: impl Iterator<Item = Result<RawRecord>>, today: NaiveDate) -> Normalized {
    let mut normalized = Normalized::default();

    for (index, record) in records.enumerate() {
        let mut legacy = false;
        let project = record.and_then(|record| {
            legacy = record.payments.is_none() && record.paid_amount.is_some();
            normalize_record(record, today)
        });
        match project {
            Ok(project) => {
                if legacy {
                    debug!(id = %project.id(), "migrated legacy paidAmount record");
                    normalized.migrated += 1;
                }
                normalized.projects.push(project);
            }
            Err(error) => {
                warn!(index, %error, "rejected stored project record");
                normalized.rejected.push(Rejected { index, error });
            }
        }
    }

    normalized
}

fn normalize_record(record: RawRecord, today: NaiveDate) -> Result<Project> {
    let client = text(record.client.as_ref(), "client")?;
    let project = text(record.project.as_ref(), "project")?;
    let amount = number(record.amount.as_ref(), "amount")?;
    let due_date = date(record.due_date.as_ref(), "dueDate")?;

    let payments = match (record.payments, record.paid_amount) {
        (Some(Value::Array(payments)), _) => payments
            .iter()
            .map(raw_payment)
            .collect::<Result<Vec<_>>>()?,
        (Some(other), _) => {
            return Err(TrackerError::validation("payments", format!("{other} is not a list")));
        }
        (None, Some(paid)) => {
            let paid = number(Some(&paid), "paidAmount")?;
            if paid < 0.0 {
                return Err(TrackerError::validation("paidAmount", format!("{paid} must not be negative")));
            }
            if paid > 0.0 {
                vec![Payment::new(today, paid)?]
            } else {
                Vec::new()
            }
        }
        (None, None) => Vec::new(),
    };

    let id = match record.id {
        Some(Value::String(raw)) => raw.parse::<ProjectId>().unwrap_or_else(|error| {
            warn!(%error, "replacing unreadable project id");
            ProjectId::generate()
        }),
        Some(other) => {
            warn!(id = %other, "replacing non-string project id");
            ProjectId::generate()
        }
        None => ProjectId::generate(),
    };

    let details = ProjectDetails {
        client,
        project,
        amount,
        due_date,
    };
    Project::restore(id, details, payments)
}

fn raw_payment(raw: &Value) -> Result<Payment> {
    let Value::Object(fields) = raw else {
        return Err(TrackerError::validation("payment", format!("{raw} is not a payment object")));
    };
    let amount = number(fields.get("amount"), "payment amount")?;
    let date = date(fields.get("date"), "payment date")?;
    Payment::new(date, amount)
}

/// Read an optional string; missing and null read as empty
fn text(value: Option<&Value>, field: &'static str) -> Result<String> {
    match value {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(TrackerError::validation(field, format!("{other} is not text"))),
    }
}

fn date(value: Option<&Value>, field: &'static str) -> Result<NaiveDate> {
    match value {
        None | Some(Value::Null) => Err(TrackerError::validation(field, "missing")),
        Some(Value::String(raw)) => dates::parse_iso(raw).map_err(|_| {
            TrackerError::validation(field, format!("`{raw}` is not a YYYY-MM-DD date"))
        }),
        Some(other) => Err(TrackerError::validation(field, format!("{other} is not a YYYY-MM-DD date"))),
    }
}

/// Read a finite number, accepting numeric strings as older forms stored them
fn number(value: Option<&Value>, field: &'static str) -> Result<f64> {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(TrackerError::validation(
            field,
            match value {
                None | Some(Value::Null) => "missing".to_string(),
                Some(other) => format!("{other} is not a number"),
            },
        )),
    }
}
