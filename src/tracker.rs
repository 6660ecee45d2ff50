use chrono::NaiveDate;
use tracing::{error, info};

use crate::error::{Result, TrackerError};
use crate::ledger::{self, ProjectRow, Summary};
use crate::models::{Payment, Project, ProjectDetails, ProjectId, StatusFilter, Theme};
use crate::store::{KeyValueStore, ProjectStore};

/// What happened while reading the stored collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub migrated: usize,
    pub rejected: usize,
    /// The stored collection could not be parsed and was replaced by an empty one
    pub corrupt: bool,
}

/// Application state: the project collection, the theme and their store.
///
/// Every mutation writes the whole collection back before returning.
pub struct Tracker<S> {
    store: ProjectStore<S>,
    projects: Vec<Project>,
    theme: Theme,
    load_report: LoadReport,
}

impl<S: KeyValueStore> Tracker<S> {
    pub fn open(kv: S, today: NaiveDate) -> Result<Self> {
        let mut store = ProjectStore::new(kv);
        let mut load_report = LoadReport::default();

        let projects = match store.load_projects(today) {
            Ok(normalized) => {
                load_report.migrated = normalized.migrated;
                load_report.rejected = normalized.rejected.len();
                normalized.projects
            }
            Err(err @ TrackerError::CorruptStore { .. }) => {
                error!(error = %err, "starting with an empty project list");
                store.preserve_corrupt()?;
                load_report.corrupt = true;
                Vec::new()
            }
            Err(err) => return Err(err),
        };

        let theme = store.load_theme()?;

        Ok(Self {
            store,
            projects,
            theme,
            load_report,
        })
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn load_report(&self) -> LoadReport {
        self.load_report
    }

    pub fn project(&self, id: ProjectId) -> Result<&Project> {
        self.projects
            .iter()
            .find(|p| p.id() == id)
            .ok_or(TrackerError::UnknownProject(id))
    }

    fn project_mut(&mut self, id: ProjectId) -> Result<&mut Project> {
        self.projects
            .iter_mut()
            .find(|p| p.id() == id)
            .ok_or(TrackerError::UnknownProject(id))
    }

    /// Id of the project at a 0-based display position
    pub fn id_at(&self, index: usize) -> Result<ProjectId> {
        self.projects
            .get(index)
            .map(Project::id)
            .ok_or(TrackerError::IndexOutOfRange {
                index,
                len: self.projects.len(),
            })
    }

    /// 0-based display position of a project
    pub fn position(&self, id: ProjectId) -> Option<usize> {
        self.projects.iter().position(|p| p.id() == id)
    }

    pub fn add_project(&mut self, details: ProjectDetails) -> Result<ProjectId> {
        let project = Project::new(details)?;
        let id = project.id();
        info!(%id, client = project.client(), project = project.name(), "added project");
        self.projects.push(project);
        self.persist()?;
        Ok(id)
    }

    pub fn edit_project(&mut self, id: ProjectId, details: ProjectDetails) -> Result<()> {
        self.project_mut(id)?.update(details)?;
        info!(%id, "edited project");
        self.persist()
    }

    pub fn delete_project(&mut self, id: ProjectId) -> Result<Project> {
        let index = self.position(id).ok_or(TrackerError::UnknownProject(id))?;
        let removed = self.projects.remove(index);
        info!(%id, "deleted project");
        self.persist()?;
        Ok(removed)
    }

    pub fn add_payment(&mut self, id: ProjectId, date: NaiveDate, amount: f64) -> Result<()> {
        let payment = Payment::new(date, amount)?;
        self.project_mut(id)?.add_payment(payment);
        info!(%id, amount, "recorded payment");
        self.persist()
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<()> {
        self.theme = theme;
        self.store.save_theme(theme)
    }

    pub fn toggle_theme(&mut self) -> Result<Theme> {
        let theme = self.theme.toggled();
        self.set_theme(theme)?;
        Ok(theme)
    }

    pub fn summary(&self, as_of: NaiveDate) -> Summary {
        ledger::aggregate(&self.projects, as_of)
    }

    pub fn rows(&self, filter: StatusFilter, as_of: NaiveDate) -> Vec<ProjectRow> {
        ledger::rows(ledger::filter_by_status(&self.projects, filter, as_of), as_of)
    }

    /// Write the whole collection. On failure the in-memory change stays.
    fn persist(&mut self) -> Result<()> {
        self.store.save_projects(&self.projects).inspect_err(|err| {
            error!(error = %err, "failed to save projects; memory and store now differ");
        })
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &ProjectStore<S> {
        &self.store
    }
}
