//! CLI configuration management

use anyhow::{Context as _, Result};
use bidding_ab_core::AnalysisConfig;
use config::{Config, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Configuration file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "bidding-ab.toml";

/// Prefix for environment overrides, e.g. `BIDDING_AB__ANALYSIS__ALPHA=0.01`
pub const ENV_PREFIX: &str = "BIDDING_AB";

const ENV_SEPARATOR: &str = "__";

/// One file layer and whether it was found
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ConfigLayer {
    pub name: &'static str,
    pub path: PathBuf,
    pub exists: bool,
}

/// Locations consulted when loading configuration, lowest priority first
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    pub user: Option<PathBuf>,
    pub local: Option<PathBuf>,
    pub explicit: Option<PathBuf>,
}

impl ConfigPaths {
    /// Default locations plus an optional `--config` file
    pub fn discover(explicit: Option<&Path>) -> Self {
        Self {
            user: user_config_path(),
            local: Some(PathBuf::from(LOCAL_CONFIG_FILE)),
            explicit: explicit.map(Path::to_path_buf),
        }
    }

    pub fn layers(&self) -> Vec<ConfigLayer> {
        [
            ("user", self.user.as_ref()),
            ("local", self.local.as_ref()),
            ("explicit", self.explicit.as_ref()),
        ]
        .into_iter()
        .filter_map(|(name, path)| {
            path.map(|p| ConfigLayer {
                name,
                path: p.clone(),
                exists: p.exists(),
            })
        })
        .collect()
    }

    /// Layers the files and the environment over the built-in defaults.
    ///
    /// Only the explicit file is required to exist.
    pub fn load(&self) -> Result<AnalysisConfig> {
        let mut builder = Config::builder();

        for path in [&self.user, &self.local].into_iter().flatten() {
            builder = builder.add_source(File::from(path.as_path()).format(FileFormat::Toml).required(false));
        }
        if let Some(path) = &self.explicit {
            if !path.exists() {
                anyhow::bail!("Config file {:?} does not exist", path);
            }
            builder = builder.add_source(File::from(path.as_path()).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .try_parsing(true),
        );

        let config: AnalysisConfig = builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Failed to parse configuration")?;

        tracing::debug!(?config, "Configuration loaded");
        Ok(config)
    }
}

/// The per-user configuration file
pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "bidding-ab", "bidding-ab")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Effective configuration rendered as TOML
pub fn to_toml(config: &AnalysisConfig) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize config")
}

#[cfg(test)]
mod tests {
    use super::*;
    use bidding_ab_core::{LeveneCenter, Metric};
    use pretty_assertions::assert_eq;
    use std::fs;

    fn isolated(explicit: Option<PathBuf>) -> ConfigPaths {
        ConfigPaths {
            user: None,
            local: None,
            explicit,
        }
    }

    #[test]
    fn test_defaults_without_files() {
        let config = isolated(None).load().unwrap();
        assert_eq!(config.analysis.metric, Metric::Purchase);
        assert_eq!(config.data.control_sheet, "Control Group");
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(
            &path,
            "[analysis]\nmetric = \"earning\"\nlevene_center = \"mean\"\n\n[data]\ntest_sheet = \"Average\"\n",
        )
        .unwrap();

        let config = isolated(Some(path)).load().unwrap();
        assert_eq!(config.analysis.metric, Metric::Earning);
        assert_eq!(config.analysis.levene_center, LeveneCenter::Mean);
        assert_eq!(config.data.test_sheet, "Average");
        assert_eq!(config.data.control_sheet, "Control Group");
    }

    #[test]
    fn test_later_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        let user = dir.path().join("user.toml");
        let local = dir.path().join("local.toml");
        fs::write(&user, "[outliers]\ncap = true\nmultiplier = 3.0\n").unwrap();
        fs::write(&local, "[outliers]\nmultiplier = 2.0\n").unwrap();

        let paths = ConfigPaths {
            user: Some(user),
            local: Some(local),
            explicit: None,
        };
        let config = paths.load().unwrap();
        assert!(config.outliers.cap);
        assert_eq!(config.outliers.multiplier, 2.0);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = isolated(Some(PathBuf::from("/nonexistent/bidding-ab.toml"))).load();
        assert!(result.is_err());
    }

    #[test]
    fn test_layers_report_existence() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("bidding-ab.toml");
        fs::write(&local, "").unwrap();

        let paths = ConfigPaths {
            user: None,
            local: Some(local.clone()),
            explicit: Some(dir.path().join("missing.toml")),
        };
        let layers = paths.layers();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].name, "local");
        assert!(layers[0].exists);
        assert!(!layers[1].exists);
    }

    #[test]
    fn test_to_toml_round_trips() {
        let config = AnalysisConfig::default();
        let text = to_toml(&config).unwrap();
        assert!(text.contains("[analysis]"));
        let parsed: AnalysisConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
