// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{Result, WorkflowError};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

pub const ENV_PREFIX: &str = "NEURO_WORKFLOW";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub recon: ReconConfig,
    pub longitudinal: LongitudinalConfig,
    pub tables: TablesConfig,
    pub metadata: MetadataConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReconConfig {
    /// Executable invoked for every reconstruction stage.
    pub binary: String,
    #[serde(default)]
    pub extra_args: Vec<String>,
    /// Path, relative to an output folder, whose presence marks a finished run.
    pub completion_marker: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LongitudinalConfig {
    pub parallel_workers: usize,
    pub min_sessions: usize,
    pub session_prefix: String,
    pub derivatives_dir: String,
    pub longitudinal_dir: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TablesConfig {
    pub delimiter: String,
    pub key_columns: Vec<String>,
    pub merged_file_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetadataConfig {
    pub output_file: String,
    pub scan_pattern: String,
    pub strict: bool,
}

impl TablesConfig {
    pub fn delimiter_byte(&self) -> Result<u8> {
        match self.delimiter.as_bytes() {
            [byte] => Ok(*byte),
            _ => Err(WorkflowError::Config(format!(
                "tables.delimiter must be a single byte, got {:?}",
                self.delimiter
            ))),
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let defaults = config::Config::try_from(&Self::default_config())
            .map_err(|e| WorkflowError::Config(e.to_string()))?;

        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("recon.extra_args")
                .with_list_parse_key("tables.key_columns")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| WorkflowError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| WorkflowError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// A missing file is not an error: defaults and the environment still apply.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from: {}", path.display());
            return Self::load(Some(path));
        }

        warn!(
            "Config file {} not found, using default configuration",
            path.display()
        );
        Ok(Self::load(None).unwrap_or_else(|e| {
            warn!("Falling back to built-in defaults: {}", e);
            Self::default_config()
        }))
    }

    pub fn default_config() -> Self {
        Self {
            recon: ReconConfig {
                binary: "recon-all".to_string(),
                extra_args: vec![],
                completion_marker: "scripts/recon-all.done".to_string(),
            },
            longitudinal: LongitudinalConfig {
                parallel_workers: 1,
                min_sessions: 2,
                session_prefix: "ses-".to_string(),
                derivatives_dir: "derivatives".to_string(),
                longitudinal_dir: "longitudinal".to_string(),
            },
            tables: TablesConfig {
                delimiter: "\t".to_string(),
                key_columns: vec!["sub".to_string(), "ses".to_string(), "pipeline".to_string()],
                merged_file_name: "all_measures.csv".to_string(),
            },
            metadata: MetadataConfig {
                output_file: "T1_metadata.csv".to_string(),
                scan_pattern: "T1w".to_string(),
                strict: false,
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.longitudinal.parallel_workers == 0 {
            return Err(WorkflowError::Config(
                "parallel_workers must be greater than 0".to_string(),
            ));
        }

        if self.longitudinal.min_sessions == 0 {
            return Err(WorkflowError::Config(
                "min_sessions must be at least 1".to_string(),
            ));
        }

        if self.recon.binary.trim().is_empty() {
            return Err(WorkflowError::Config(
                "recon.binary must not be empty".to_string(),
            ));
        }

        if self.tables.key_columns.is_empty() {
            return Err(WorkflowError::Config(
                "tables.key_columns must name at least one column".to_string(),
            ));
        }

        self.tables.delimiter_byte()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // loading reads process-wide environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.tables.delimiter_byte().unwrap(), b'\t');
        assert_eq!(config.tables.key_columns, vec!["sub", "ses", "pipeline"]);
    }

    #[test]
    fn test_load_overrides_from_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("workflow.toml");
        fs::write(
            &path,
            r#"
[recon]
binary = "/opt/freesurfer/bin/recon-all"
extra_args = ["-openmp", "4"]

[longitudinal]
parallel_workers = 3
"#,
        )
        .unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.recon.binary, "/opt/freesurfer/bin/recon-all");
        assert_eq!(config.recon.extra_args, vec!["-openmp", "4"]);
        assert_eq!(config.longitudinal.parallel_workers, 3);
        assert_eq!(config.longitudinal.min_sessions, 2);
        assert_eq!(config.metadata.output_file, "T1_metadata.csv");
    }

    #[test]
    fn test_environment_overrides_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let vars = [
            ("NEURO_WORKFLOW__RECON__BINARY", "/opt/fs/bin/recon-all"),
            ("NEURO_WORKFLOW__RECON__EXTRA_ARGS", "-openmp,4"),
            ("NEURO_WORKFLOW__LONGITUDINAL__PARALLEL_WORKERS", "3"),
            ("NEURO_WORKFLOW__TABLES__KEY_COLUMNS", "sub,ses"),
        ];
        for (key, value) in vars {
            unsafe { std::env::set_var(key, value) };
        }

        let loaded = Config::load(None);

        for (key, _) in vars {
            unsafe { std::env::remove_var(key) };
        }

        let config = loaded.unwrap();
        assert_eq!(config.recon.binary, "/opt/fs/bin/recon-all");
        assert_eq!(config.recon.extra_args, vec!["-openmp", "4"]);
        assert_eq!(config.longitudinal.parallel_workers, 3);
        assert_eq!(config.tables.key_columns, vec!["sub", "ses"]);
        assert_eq!(config.longitudinal.min_sessions, 2);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let temp = TempDir::new().unwrap();

        let config = Config::load_or_default(&temp.path().join("absent.toml")).unwrap();

        assert_eq!(config.recon.binary, "recon-all");
        assert_eq!(config.tables.merged_file_name, "all_measures.csv");
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("workflow.toml");
        fs::write(&path, "[longitudinal]\nparallel_workers = 0\n").unwrap();

        assert!(Config::load_or_default(&path).is_err());
    }

    #[test]
    fn test_rejects_zero_workers() {
        let mut config = Config::default_config();
        config.longitudinal.parallel_workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_multibyte_delimiter() {
        let mut config = Config::default_config();
        config.tables.delimiter = "::".to_string();
        assert!(config.validate().is_err());
    }
}
