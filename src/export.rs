use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::dates;
use crate::error::{Result, TrackerError};
use crate::ledger;
use crate::models::Project;

pub const REPORT_TITLE: &str = "Freelancer Tracker";

/// Writes the project list as CSV and as a printable report
pub struct ReportGenerator {
    output_dir: PathBuf,
    pdf_command: String,
}

impl ReportGenerator {
    pub fn new(output_dir: impl AsRef<Path>, pdf_command: &str) -> Result<Self> {
        let path = output_dir.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        Ok(Self {
            output_dir: path.to_path_buf(),
            pdf_command: pdf_command.to_string(),
        })
    }

    /// Write `projects.csv` with every field quoted
    pub fn export_csv(&self, projects: &[Project], as_of: NaiveDate) -> Result<PathBuf> {
        let path = self.output_dir.join("projects.csv");
        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .from_path(&path)?;

        for record in ledger::to_csv_rows(projects, as_of) {
            writer.write_record(&record)?;
        }
        writer.flush()?;

        info!(path = %path.display(), rows = projects.len(), "exported CSV");
        Ok(path)
    }

    /// Write `projects.md` and convert it to `projects.pdf`.
    ///
    /// The Markdown file is kept either way. If the converter is missing or
    /// fails, the result is [`TrackerError::DependencyUnavailable`].
    pub fn export_pdf(&self, projects: &[Project], as_of: NaiveDate) -> Result<PathBuf> {
        let md_path = self.output_dir.join("projects.md");
        let pdf_path = self.output_dir.join("projects.pdf");

        let mut file = File::create(&md_path)?;
        file.write_all(self.generate_markdown(projects, as_of).as_bytes())?;

        let output = Command::new(&self.pdf_command)
            .arg(&md_path)
            .arg("-o")
            .arg(&pdf_path)
            .output();

        match output {
            Ok(output) if output.status.success() => {
                info!(path = %pdf_path.display(), rows = projects.len(), "exported PDF");
                Ok(pdf_path)
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                warn!(command = %self.pdf_command, %stderr, "PDF conversion failed");
                Err(TrackerError::DependencyUnavailable {
                    name: self.pdf_command.clone(),
                    reason: if stderr.is_empty() {
                        format!("exited with {}", output.status)
                    } else {
                        stderr
                    },
                })
            }
            Err(err) => {
                warn!(command = %self.pdf_command, error = %err, "could not run PDF converter");
                Err(TrackerError::DependencyUnavailable {
                    name: self.pdf_command.clone(),
                    reason: err.to_string(),
                })
            }
        }
    }

    fn generate_markdown(&self, projects: &[Project], as_of: NaiveDate) -> String {
        let mut content = String::new();

        content.push_str(&format!("# {REPORT_TITLE}\n\n"));
        content.push_str(&format!("_As of {}_\n\n", dates::format_iso(as_of)));

        // Hard line breaks keep one project per line in the PDF
        for line in ledger::to_report_lines(projects, as_of) {
            content.push_str(&line);
            content.push_str("  \n");
        }

        content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Payment, ProjectDetails};

    fn sample() -> Vec<Project> {
        let mut paid = Project::new(ProjectDetails {
            client: "Acme, Inc".into(),
            project: "Site \"v2\"".into(),
            amount: 200.0,
            due_date: dates::parse_iso("2099-01-01").unwrap(),
        })
        .unwrap();
        paid.add_payment(Payment::new(dates::parse_iso("2025-01-01").unwrap(), 200.0).unwrap());

        let late = Project::new(ProjectDetails {
            client: "Bob".into(),
            project: "Logo".into(),
            amount: 100.0,
            due_date: dates::parse_iso("2000-01-01").unwrap(),
        })
        .unwrap();

        vec![paid, late]
    }

    fn as_of() -> NaiveDate {
        dates::parse_iso("2025-06-01").unwrap()
    }

    #[test]
    fn csv_quotes_every_field() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ReportGenerator::new(dir.path(), "pandoc").unwrap();

        let path = generator.export_csv(&sample(), as_of()).unwrap();
        let text = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            r#""Client","Project","Total","Paid","Remaining","Due","Status""#
        );
        assert_eq!(
            lines[1],
            r#""Acme, Inc","Site ""v2""","200","200","0","2099-01-01","Fully Paid""#
        );
        assert_eq!(
            lines[2],
            r#""Bob","Logo","100","0","100","2000-01-01","Overdue""#
        );
    }

    #[test]
    fn missing_converter_is_dependency_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let generator =
            ReportGenerator::new(dir.path(), "definitely-not-an-installed-converter").unwrap();

        let result = generator.export_pdf(&sample(), as_of());
        assert!(matches!(
            result,
            Err(TrackerError::DependencyUnavailable { .. })
        ));

        let markdown = fs::read_to_string(dir.path().join("projects.md")).unwrap();
        assert!(markdown.starts_with("# Freelancer Tracker"));
        assert!(markdown.contains("Bob | Logo | $100 | $0 | $100 | 2000-01-01 | Overdue"));
    }

    #[test]
    fn creates_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("exports");
        ReportGenerator::new(&out, "pandoc").unwrap();
        assert!(out.is_dir());
    }
}
