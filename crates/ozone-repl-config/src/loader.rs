//! Configuration loader with multi-source merging.

use std::path::{Path, PathBuf};

use crate::{ReplicationConfig, Result};

/// Configuration loader with builder pattern.
pub struct ConfigLoader {
    config_file: Option<PathBuf>,
    env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a new loader with no project config file and the
    /// `OZONE_REPL` environment prefix.
    pub fn new() -> Self {
        Self {
            config_file: None,
            env_prefix: "OZONE_REPL".to_string(),
        }
    }

    /// Points the loader at a project config file (`ozone-repl.toml`);
    /// missing files are silently skipped rather than erroring.
    pub fn with_config_file(mut self, path: impl AsRef<Path>) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Loads configuration with precedence: built-in defaults <
    /// project config file < environment variables.
    pub fn load(self) -> Result<ReplicationConfig> {
        let mut builder = config::Config::builder();

        let defaults = ReplicationConfig::default();
        builder = builder.add_source(config::Config::try_from(&defaults)?);

        if let Some(path) = &self.config_file {
            if path.exists() {
                builder = builder.add_source(
                    config::File::from(path.clone())
                        .required(false)
                        .format(config::FileFormat::Toml),
                );
            }
        }

        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .separator("_")
                .try_parsing(true),
        );

        let built = builder.build()?;
        let cfg: ReplicationConfig = built.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_defaults_with_no_sources() {
        let cfg = ConfigLoader::new().load().unwrap();
        assert_eq!(cfg, ReplicationConfig::default());
    }

    #[test]
    fn project_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ozone-repl.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "min_healthy_for_maintenance = 3").unwrap();

        let cfg = ConfigLoader::new().with_config_file(&path).load().unwrap();
        assert_eq!(cfg.min_healthy_for_maintenance, 3);
        assert_eq!(cfg.interval_ms, ReplicationConfig::default().interval_ms);
    }

    #[test]
    fn env_overrides_project_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ozone-repl.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "min_healthy_for_maintenance = 3").unwrap();

        std::env::set_var("OZONE_REPL_TEST_MIN_HEALTHY_FOR_MAINTENANCE", "5");
        let cfg = ConfigLoader::new()
            .with_config_file(&path)
            .with_env_prefix("OZONE_REPL_TEST")
            .load()
            .unwrap();
        std::env::remove_var("OZONE_REPL_TEST_MIN_HEALTHY_FOR_MAINTENANCE");
        assert_eq!(cfg.min_healthy_for_maintenance, 5);
    }
}
