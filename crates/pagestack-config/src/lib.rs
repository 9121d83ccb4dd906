use pagestack_engine::LayoutMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const MIN_GRID_COLUMNS: u8 = 1;
pub const MAX_GRID_COLUMNS: u8 = 8;
pub const DEFAULT_GRID_COLUMNS: u8 = 3;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Everything pagestack remembers between runs. The document itself is never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub theme: Theme,
    pub layout: LayoutMode,
    pub grid_columns: u8,
    /// Scale every exported page to the size of the first one
    pub resize_to_fit: bool,
    /// Leave groups open when keyboard navigation moves out of them
    pub keep_expanded: bool,
    /// Where exports go when no output is given
    pub export_dir: Option<PathBuf>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            layout: LayoutMode::default(),
            grid_columns: DEFAULT_GRID_COLUMNS,
            resize_to_fit: false,
            keep_expanded: true,
            export_dir: None,
        }
    }
}

impl Preferences {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut prefs: Preferences =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        prefs.grid_columns = prefs.grid_columns.clamp(MIN_GRID_COLUMNS, MAX_GRID_COLUMNS);
        prefs.export_dir = prefs
            .export_dir
            .map(|dir| Self::expand_path(&dir).unwrap_or(dir));

        Ok(Some(prefs))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_dir() -> PathBuf {
        PathBuf::from(shellexpand::tilde("~/.config/pagestack").as_ref())
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("preferences.toml")
    }

    pub fn toggle_layout(&mut self) -> LayoutMode {
        self.layout = match self.layout {
            LayoutMode::Grid => LayoutMode::List,
            LayoutMode::List => LayoutMode::Grid,
        };
        self.layout
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
