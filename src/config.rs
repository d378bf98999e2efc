use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::color::Theme;
use crate::data::aggregate::TOP_N;
use crate::data::table::DEFAULT_PAGE_SIZE;

/// Default location of the optional config file.
pub const DEFAULT_CONFIG_PATH: &str = "./config/dashboard.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DashboardConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub table: TableConfig,
    #[serde(default)]
    pub dashboard: ChartsConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    #[serde(default = "default_data_path")]
    pub path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            path: default_data_path(),
        }
    }
}

fn default_data_path() -> PathBuf {
    PathBuf::from("Electric_Vehicle_Population_Data.csv")
}

#[derive(Debug, Deserialize, Clone)]
pub struct TableConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig {
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChartsConfig {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        ChartsConfig {
            top_n: default_top_n(),
        }
    }
}

fn default_top_n() -> usize {
    TOP_N
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct UiConfig {
    #[serde(default)]
    pub theme: Theme,
}

/// Parse and validate a config file.
pub fn load_config(path: &Path) -> Result<DashboardConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<DashboardConfig> {
    let config: DashboardConfig =
        toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.table.page_size == 0 {
        anyhow::bail!("table.page_size must be > 0");
    }
    if config.dashboard.top_n == 0 {
        anyhow::bail!("dashboard.top_n must be > 0");
    }
    Ok(config)
}

/// Load the config at `path`. The default path may be absent, in which case
/// every setting takes its default; an explicit path must exist.
pub fn resolve_config(path: Option<&Path>) -> Result<DashboardConfig> {
    match path {
        Some(p) => load_config(p),
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            if default.exists() {
                load_config(default)
            } else {
                log::debug!("No config at {DEFAULT_CONFIG_PATH}, using defaults");
                Ok(DashboardConfig::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.table.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.dashboard.top_n, TOP_N);
        assert_eq!(config.ui.theme, Theme::Light);
        assert_eq!(
            config.data.path,
            PathBuf::from("Electric_Vehicle_Population_Data.csv")
        );
    }

    #[test]
    fn sections_override_defaults() {
        let config = parse_config(
            r#"
[data]
path = "data/ev.csv"

[table]
page_size = 25

[ui]
theme = "dark"
"#,
        )
        .unwrap();
        assert_eq!(config.data.path, PathBuf::from("data/ev.csv"));
        assert_eq!(config.table.page_size, 25);
        assert_eq!(config.ui.theme, Theme::Dark);
    }

    #[test]
    fn zero_sizes_are_rejected() {
        assert!(parse_config("[table]\npage_size = 0\n").is_err());
        assert!(parse_config("[dashboard]\ntop_n = 0\n").is_err());
        assert!(parse_config("[ui]\ntheme = \"sepia\"\n").is_err());
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(resolve_config(Some(&dir.path().join("nope.toml"))).is_err());

        let path = dir.path().join("dashboard.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"[table]\npage_size = 5\n").unwrap();
        assert_eq!(resolve_config(Some(&path)).unwrap().table.page_size, 5);
    }
}
