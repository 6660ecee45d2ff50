mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::error::{Result, TrackerError};
use crate::models::{Project, Theme};
use serde_json::Value;

use crate::normalize::{self, Normalized};

pub const PROJECTS_KEY: &str = "projects";
pub const THEME_KEY: &str = "theme";
/// JSON array of unreadable collections, as raw text, oldest first
pub const CORRUPT_KEY: &str = "projects.corrupt";
/// JSON array of records that failed validation, oldest first
pub const REJECTED_KEY: &str = "projects.rejected";

/// String-valued key-value persistence
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Project collection and preferences on top of a key-value store
pub struct ProjectStore<S> {
    kv: S,
}

impl<S: KeyValueStore> ProjectStore<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    /// Read and normalize the stored collection.
    ///
    /// Fails with [`TrackerError::CorruptStore`] when the stored text is not a
    /// JSON array. Elements that fail validation, including ones of the wrong
    /// JSON type, are appended under [`REJECTED_KEY`] so the next save does not
    /// lose them.
    pub fn load_projects(&mut self, today: NaiveDate) -> Result<Normalized> {
        let Some(raw) = self.kv.get(PROJECTS_KEY)? else {
            return Ok(Normalized::default());
        };

        let records: Vec<Value> =
            serde_json::from_str(&raw).map_err(|source| TrackerError::CorruptStore {
                key: PROJECTS_KEY.to_string(),
                source,
            })?;

        let normalized = normalize::normalize_values(&records, today);
        if !normalized.rejected.is_empty() {
            let rejected = normalized.rejected.iter().map(|r| records[r.index].clone()).collect();
            self.append_parked(REJECTED_KEY, rejected)?;
            warn!(
                count = normalized.rejected.len(),
                key = REJECTED_KEY,
                "set aside invalid project records"
            );
        }

        info!(
            projects = normalized.projects.len(),
            migrated = normalized.migrated,
            "loaded projects"
        );
        Ok(normalized)
    }

    /// Copy whatever is under the projects key aside, as an untouched string
    pub fn preserve_corrupt(&mut self) -> Result<()> {
        if let Some(raw) = self.kv.get(PROJECTS_KEY)? {
            self.append_parked(CORRUPT_KEY, vec![Value::String(raw)])?;
            warn!(key = CORRUPT_KEY, "kept unreadable project data");
        }
        Ok(())
    }

    /// Add entries to the JSON array under `key`, keeping earlier ones.
    /// Text there that is not an array is kept as the first entry.
    fn append_parked(&mut self, key: &str, entries: Vec<Value>) -> Result<()> {
        let mut parked = match self.kv.get(key)? {
            Some(existing) => match serde_json::from_str::<Value>(&existing) {
                Ok(Value::Array(items)) => items,
                _ => vec![Value::String(existing)],
            },
            None => Vec::new(),
        };
        parked.extend(entries);
        self.kv.set(key, &serde_json::to_string(&parked)?)
    }

    /// Overwrite the whole stored collection
    pub fn save_projects(&mut self, projects: &[Project]) -> Result<()> {
        let json = serde_json::to_string(projects)?;
        self.kv.set(PROJECTS_KEY, &json)
    }

    /// Stored theme, a JSON string. Bare `light`/`dark` text is read too;
    /// anything else falls back to light.
    pub fn load_theme(&self) -> Result<Theme> {
        let Some(raw) = self.kv.get(THEME_KEY)? else {
            return Ok(Theme::default());
        };
        let text = serde_json::from_str::<String>(&raw).unwrap_or(raw);
        Ok(text.parse().unwrap_or_else(|error| {
            warn!(%error, "ignoring stored theme");
            Theme::default()
        }))
    }

    pub fn save_theme(&mut self, theme: Theme) -> Result<()> {
        self.kv.set(THEME_KEY, &serde_json::to_string(theme.as_str())?)
    }

    pub fn kv(&self) -> &S {
        &self.kv
    }
}
