//! Payment totals, status classification and dashboard aggregates.
//!
//! Everything here is a pure function of the project list and an explicit
//! as-of date, so the table, the charts and both exporters agree on figures.

use chrono::NaiveDate;

use crate::dates;
use crate::models::{PaymentStatus, Project, ProjectId, StatusFilter};

pub fn total_paid(project: &Project) -> f64 {
    project.payments().iter().map(|p| p.amount()).sum()
}

/// Amount still owed; negative after an overpayment
pub fn remaining(project: &Project) -> f64 {
    project.amount() - total_paid(project)
}

fn is_overdue(remaining: f64, due_date: NaiveDate, as_of: NaiveDate) -> bool {
    remaining > 0.0 && due_date < as_of
}

pub fn classify(project: &Project, as_of: NaiveDate) -> PaymentStatus {
    let remaining = remaining(project);

    let status = if remaining <= 0.0 {
        PaymentStatus::FullyPaid
    } else if remaining < project.amount() {
        PaymentStatus::Partial
    } else {
        PaymentStatus::Unpaid
    };

    // Overdue overrides partial/unpaid, never fully paid
    if is_overdue(remaining, project.due_date(), as_of) {
        PaymentStatus::Overdue
    } else {
        status
    }
}

/// Number of projects in each status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub fully_paid: usize,
    pub partial: usize,
    pub unpaid: usize,
    pub overdue: usize,
}

impl StatusCounts {
    pub fn get(&self, status: PaymentStatus) -> usize {
        match status {
            PaymentStatus::FullyPaid => self.fully_paid,
            PaymentStatus::Partial => self.partial,
            PaymentStatus::Unpaid => self.unpaid,
            PaymentStatus::Overdue => self.overdue,
        }
    }

    fn record(&mut self, status: PaymentStatus) {
        match status {
            PaymentStatus::FullyPaid => self.fully_paid += 1,
            PaymentStatus::Partial => self.partial += 1,
            PaymentStatus::Unpaid => self.unpaid += 1,
            PaymentStatus::Overdue => self.overdue += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.fully_paid + self.partial + self.unpaid + self.overdue
    }
}

/// Dashboard figures across the whole collection
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Summary {
    pub total_paid: f64,
    /// Sum of positive remainders; overpayments do not reduce it
    pub total_due: f64,
    pub total_overdue: f64,
    pub counts: StatusCounts,
}

pub fn aggregate(projects: &[Project], as_of: NaiveDate) -> Summary {
    let mut summary = Summary::default();

    for project in projects {
        let paid = total_paid(project);
        let remaining = project.amount() - paid;

        summary.total_paid += paid;
        summary.total_due += remaining.max(0.0);
        if is_overdue(remaining, project.due_date(), as_of) {
            summary.total_overdue += remaining;
        }
        summary.counts.record(classify(project, as_of));
    }

    summary
}

/// Projects matching `filter`, in collection order
pub fn filter_by_status<'a>(
    projects: &'a [Project],
    filter: StatusFilter,
    as_of: NaiveDate,
) -> Vec<&'a Project> {
    projects
        .iter()
        .filter(|p| filter.matches(classify(p, as_of)))
        .collect()
}

/// One project with its derived figures, as the table renderer shows it
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRow {
    pub id: ProjectId,
    pub client: String,
    pub project: String,
    pub total: f64,
    pub paid: f64,
    pub remaining: f64,
    pub due_date: NaiveDate,
    pub status: PaymentStatus,
}

impl ProjectRow {
    pub fn new(project: &Project, as_of: NaiveDate) -> Self {
        let paid = total_paid(project);
        Self {
            id: project.id(),
            client: project.client().to_string(),
            project: project.name().to_string(),
            total: project.amount(),
            paid,
            remaining: project.amount() - paid,
            due_date: project.due_date(),
            status: classify(project, as_of),
        }
    }

    /// Table cells; money fixed to two decimals
    pub fn table_cells(&self) -> [String; 7] {
        [
            self.client.clone(),
            self.project.clone(),
            money(self.total),
            money(self.paid),
            money(self.remaining),
            dates::format_iso(self.due_date),
            self.status.label().to_string(),
        ]
    }

    /// Export fields; money as raw numbers
    pub fn export_fields(&self) -> [String; 7] {
        [
            self.client.clone(),
            self.project.clone(),
            self.total.to_string(),
            self.paid.to_string(),
            self.remaining.to_string(),
            dates::format_iso(self.due_date),
            self.status.label().to_string(),
        ]
    }
}

pub const COLUMNS: [&str; 7] = ["Client", "Project", "Total", "Paid", "Remaining", "Due", "Status"];

pub fn money(amount: f64) -> String {
    format!("${amount:.2}")
}

pub fn rows<'a, I>(projects: I, as_of: NaiveDate) -> Vec<ProjectRow>
where
    I: IntoIterator<Item = &'a Project>,
{
    projects
        .into_iter()
        .map(|p| ProjectRow::new(p, as_of))
        .collect()
}

/// CSV records: header first, then one per project
pub fn to_csv_rows(projects: &[Project], as_of: NaiveDate) -> Vec<[String; 7]> {
    let header = COLUMNS.map(String::from);
    std::iter::once(header)
        .chain(rows(projects, as_of).iter().map(ProjectRow::export_fields))
        .collect()
}

/// Report lines for the printable export: header line, then one per project
pub fn to_report_lines(projects: &[Project], as_of: NaiveDate) -> Vec<String> {
    let header = COLUMNS.join(" | ");
    let body = rows(projects, as_of).into_iter().map(|row| {
        format!(
            "{} | {} | ${} | ${} | ${} | {} | {}",
            row.client,
            row.project,
            row.total,
            row.paid,
            row.remaining,
            dates::format_iso(row.due_date),
            row.status
        )
    });
    std::iter::once(header).chain(body).collect()
}

/// Chart inputs derived from a summary
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    /// Projects per status, in [`PaymentStatus::ALL`] order
    pub status_counts: [(&'static str, u64); 4],
    /// Paid, remaining and overdue amounts
    pub amounts: [(&'static str, f64); 3],
}

pub fn chart_data(summary: &Summary) -> ChartData {
    ChartData {
        status_counts: PaymentStatus::ALL.map(|s| (s.label(), summary.counts.get(s) as u64)),
        amounts: [
            ("Total Paid", summary.total_paid),
            ("Remaining", summary.total_due),
            ("Overdue", summary.total_overdue),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Payment, ProjectDetails};
    use proptest::prelude::*;

    fn date(s: &str) -> NaiveDate {
        dates::parse_iso(s).unwrap()
    }

    fn project(amount: f64, paid: &[f64], due: &str) -> Project {
        let mut project = Project::new(ProjectDetails {
            client: "Client".into(),
            project: "Work".into(),
            amount,
            due_date: date(due),
        })
        .unwrap();
        for &p in paid {
            project.add_payment(Payment::new(date("2024-01-15"), p).unwrap());
        }
        project
    }

    #[test]
    fn total_paid_of_empty_history_is_zero() {
        assert_eq!(total_paid(&project(100.0, &[], "2099-01-01")), 0.0);
    }

    #[test]
    fn total_paid_sums_payments() {
        assert_eq!(total_paid(&project(100.0, &[10.0, 15.5, 4.5], "2099-01-01")), 30.0);
    }

    #[test]
    fn overpayment_is_fully_paid_and_not_due() {
        let p = project(100.0, &[60.0, 60.0], "2020-01-01");
        assert_eq!(remaining(&p), -20.0);
        assert_eq!(classify(&p, date("2025-01-01")), PaymentStatus::FullyPaid);

        let summary = aggregate(&[p], date("2025-01-01"));
        assert_eq!(summary.total_due, 0.0);
        assert_eq!(summary.total_overdue, 0.0);
    }

    #[test]
    fn overpayment_does_not_offset_other_projects() {
        let projects = vec![
            project(100.0, &[120.0], "2099-01-01"),
            project(50.0, &[], "2099-01-01"),
        ];
        let summary = aggregate(&projects, date("2025-01-01"));
        assert_eq!(summary.total_paid, 120.0);
        assert_eq!(summary.total_due, 50.0);
    }

    #[test]
    fn overdue_supersedes_partial() {
        let p = project(100.0, &[50.0], "2020-01-01");
        assert_eq!(classify(&p, date("2025-01-01")), PaymentStatus::Overdue);
    }

    #[test]
    fn due_today_is_not_overdue() {
        let p = project(100.0, &[], "2025-01-01");
        assert_eq!(classify(&p, date("2025-01-01")), PaymentStatus::Unpaid);
        assert_eq!(classify(&p, date("2025-01-02")), PaymentStatus::Overdue);
    }

    #[test]
    fn partial_and_unpaid() {
        let as_of = date("2025-01-01");
        assert_eq!(classify(&project(100.0, &[1.0], "2099-01-01"), as_of), PaymentStatus::Partial);
        assert_eq!(classify(&project(100.0, &[], "2099-01-01"), as_of), PaymentStatus::Unpaid);
        assert_eq!(classify(&project(100.0, &[0.0], "2099-01-01"), as_of), PaymentStatus::Unpaid);
    }

    #[test]
    fn dashboard_scenario() {
        let projects = vec![
            project(200.0, &[200.0], "2099-01-01"),
            project(100.0, &[], "2000-01-01"),
        ];
        let as_of = date("2025-06-01");

        let statuses: Vec<_> = projects.iter().map(|p| classify(p, as_of)).collect();
        assert_eq!(statuses, vec![PaymentStatus::FullyPaid, PaymentStatus::Overdue]);

        let summary = aggregate(&projects, as_of);
        assert_eq!(summary.total_paid, 200.0);
        assert_eq!(summary.total_due, 100.0);
        assert_eq!(summary.total_overdue, 100.0);
        assert_eq!(
            summary.counts,
            StatusCounts { fully_paid: 1, partial: 0, unpaid: 0, overdue: 1 }
        );
    }

    #[test]
    fn csv_rows_use_raw_numbers_in_column_order() {
        let projects = vec![project(100.0, &[33.3], "2000-01-01")];
        let rows = to_csv_rows(&projects, date("2025-06-01"));

        assert_eq!(rows[0], COLUMNS.map(String::from));
        assert_eq!(
            rows[1],
            ["Client", "Work", "100", "33.3", "66.7", "2000-01-01", "Overdue"].map(String::from)
        );
    }

    #[test]
    fn table_cells_fix_two_decimals() {
        let row = ProjectRow::new(&project(100.0, &[33.333], "2099-01-01"), date("2025-06-01"));
        let cells = row.table_cells();
        assert_eq!(cells[2], "$100.00");
        assert_eq!(cells[3], "$33.33");
        assert_eq!(cells[4], "$66.67");
        assert_eq!(cells[6], "Partial");
    }

    #[test]
    fn report_lines_follow_header() {
        let lines = to_report_lines(&[project(50.0, &[50.0], "2099-01-01")], date("2025-06-01"));
        assert_eq!(lines[0], "Client | Project | Total | Paid | Remaining | Due | Status");
        assert_eq!(lines[1], "Client | Work | $50 | $50 | $0 | 2099-01-01 | Fully Paid");
    }

    #[test]
    fn chart_data_mirrors_summary() {
        let projects = vec![
            project(200.0, &[200.0], "2099-01-01"),
            project(100.0, &[40.0], "2000-01-01"),
        ];
        let charts = chart_data(&aggregate(&projects, date("2025-06-01")));
        assert_eq!(charts.status_counts[0], ("Fully Paid", 1));
        assert_eq!(charts.status_counts[3], ("Overdue", 1));
        assert_eq!(charts.amounts, [("Total Paid", 240.0), ("Remaining", 60.0), ("Overdue", 60.0)]);
    }

    fn arb_project() -> impl Strategy<Value = Project> {
        (
            1u32..10_000,
            prop::collection::vec(0u32..6_000, 0..5),
            2000i32..2030,
        )
            .prop_map(|(amount, paid, year)| {
                let paid: Vec<f64> = paid.into_iter().map(f64::from).collect();
                project(f64::from(amount), &paid, &format!("{year}-06-15"))
            })
    }

    proptest! {
        #[test]
        fn total_paid_matches_payment_sum(p in arb_project()) {
            let expected: f64 = p.payments().iter().map(|x| x.amount()).sum();
            prop_assert_eq!(total_paid(&p), expected);
        }

        #[test]
        fn histogram_counts_every_project_once(
            projects in prop::collection::vec(arb_project(), 0..12),
            year in 2000i32..2030,
        ) {
            let as_of = date(&format!("{year}-01-01"));
            let summary = aggregate(&projects, as_of);
            prop_assert_eq!(summary.counts.total(), projects.len());
            prop_assert!(summary.total_due >= 0.0);
            prop_assert!(summary.total_overdue <= summary.total_due);
        }

        #[test]
        fn fully_paid_is_never_overdue(p in arb_project(), year in 2000i32..2040) {
            let status = classify(&p, date(&format!("{year}-01-01")));
            if remaining(&p) <= 0.0 {
                prop_assert_eq!(status, PaymentStatus::FullyPaid);
            } else {
                prop_assert_ne!(status, PaymentStatus::FullyPaid);
            }
        }

        #[test]
        fn filter_keeps_matching_projects_in_order(
            projects in prop::collection::vec(arb_project(), 0..12),
            which in 0usize..5,
        ) {
            let as_of = date("2015-01-01");
            let filter = match which {
                0 => StatusFilter::All,
                n => StatusFilter::Only(PaymentStatus::ALL[n - 1]),
            };

            let kept = filter_by_status(&projects, filter, as_of);
            prop_assert!(kept.iter().all(|p| filter.matches(classify(p, as_of))));

            let expected: Vec<ProjectId> = projects
                .iter()
                .filter(|p| filter.matches(classify(p, as_of)))
                .map(Project::id)
                .collect();
            let actual: Vec<ProjectId> = kept.iter().map(|p| p.id()).collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
