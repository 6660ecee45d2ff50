use std::path::PathBuf;

use anyhow::Result;
use dotenvy::dotenv;
use serde::Deserialize;

/// Configuration for the application, read from `TRACKER_*` variables
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Directory holding the key-value store files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Directory exports are written to
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
    /// Markdown to PDF converter
    #[serde(default = "default_pdf_command")]
    pub pdf_command: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_export_dir() -> PathBuf {
    PathBuf::from("exports")
}

fn default_pdf_command() -> String {
    "pandoc".to_string()
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Loads `.env` first if it exists, then deserializes the `TRACKER_`
    /// prefixed variables into Config.
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let config = envy::prefixed("TRACKER_").from_env::<Config>()?;

        Ok(config)
    }

    /// Where the dashboard writes its log
    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("tracker.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let vars: Vec<(String, String)> = Vec::new();
        let config: Config = envy::prefixed("TRACKER_").from_iter(vars).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("."));
        assert_eq!(config.export_dir, PathBuf::from("exports"));
        assert_eq!(config.pdf_command, "pandoc");
    }

    #[test]
    fn reads_prefixed_variables() {
        let vars = vec![
            ("TRACKER_DATA_DIR".to_string(), "/tmp/tracker".to_string()),
            ("TRACKER_PDF_COMMAND".to_string(), "md2pdf".to_string()),
        ];
        let config: Config = envy::prefixed("TRACKER_").from_iter(vars).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/tracker"));
        assert_eq!(config.pdf_command, "md2pdf");
        assert_eq!(config.log_file(), PathBuf::from("/tmp/tracker/tracker.log"));
    }
}
