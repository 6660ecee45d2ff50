use std::fmt;
use std::str::FromStr;

use crate::error::TrackerError;

/// Payment status of a project on a given day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentStatus {
    FullyPaid,
    Partial,
    Unpaid,
    Overdue,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 4] = [
        PaymentStatus::FullyPaid,
        PaymentStatus::Partial,
        PaymentStatus::Unpaid,
        PaymentStatus::Overdue,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PaymentStatus::FullyPaid => "Fully Paid",
            PaymentStatus::Partial => "Partial",
            PaymentStatus::Unpaid => "Unpaid",
            PaymentStatus::Overdue => "Overdue",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Table filter: everything, or one status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(PaymentStatus),
}

impl StatusFilter {
    pub fn matches(self, status: PaymentStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => wanted == status,
        }
    }

    /// The filter after this one, in dropdown order
    pub fn next(self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::Only(PaymentStatus::FullyPaid),
            StatusFilter::Only(PaymentStatus::FullyPaid) => StatusFilter::Only(PaymentStatus::Partial),
            StatusFilter::Only(PaymentStatus::Partial) => StatusFilter::Only(PaymentStatus::Unpaid),
            StatusFilter::Only(PaymentStatus::Unpaid) => StatusFilter::Only(PaymentStatus::Overdue),
            StatusFilter::Only(PaymentStatus::Overdue) => StatusFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Only(status) => status.label(),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        match key.as_str() {
            "" | "all" => Ok(StatusFilter::All),
            "fullypaid" | "paid" => Ok(StatusFilter::Only(PaymentStatus::FullyPaid)),
            "partial" => Ok(StatusFilter::Only(PaymentStatus::Partial)),
            "unpaid" => Ok(StatusFilter::Only(PaymentStatus::Unpaid)),
            "overdue" => Ok(StatusFilter::Only(PaymentStatus::Overdue)),
            _ => Err(TrackerError::validation(
                "status filter",
                format!("`{s}` is not one of all, fullyPaid, partial, unpaid, overdue"),
            )),
        }
    }
}
