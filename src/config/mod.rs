//! Configuration management.
//!
//! Settings come from defaults, then an optional TOML file, then `ROLEFORGE_*`
//! environment variables.
//!
//! ```toml
//! lineage_cache_capacity = 256
//! lineage_display_depth = 4
//! min_name_length = 3
//! default_min_level = 10
//! default_max_level = 100
//!
//! [logging]
//! format = "json"
//! level = "info"
//! ```

use crate::models::{HierarchyConstraints, RoleDuplicationContext};
use crate::services::{CloneValidator, DEFAULT_DISPLAY_DEPTH};
use crate::storage::{DEFAULT_LINEAGE_CACHE_CAPACITY, LineageCache};
use crate::{Error, Result};
use serde::Deserialize;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Number of lineage snapshots kept in the LRU cache.
    pub lineage_cache_capacity: NonZeroUsize,
    /// Depth used when rendering lineage trees.
    pub lineage_display_depth: usize,
    /// Minimum role name length.
    pub min_name_length: usize,
    /// Lowest level allowed when the caller supplies no constraints.
    pub default_min_level: u32,
    /// Highest level allowed when the caller supplies no constraints.
    pub default_max_level: u32,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Logging settings as read from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoggingSettings {
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: Option<String>,
    /// Optional log file path.
    pub file: Option<PathBuf>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Lineage cache capacity.
    pub lineage_cache_capacity: Option<usize>,
    /// Lineage display depth.
    pub lineage_display_depth: Option<usize>,
    /// Minimum name length.
    pub min_name_length: Option<usize>,
    /// Default minimum level.
    pub default_min_level: Option<u32>,
    /// Default maximum level.
    pub default_max_level: Option<u32>,
    /// Logging section.
    pub logging: Option<LoggingSettings>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let bounds = HierarchyConstraints::default();
        Self {
            lineage_cache_capacity: NonZeroUsize::new(DEFAULT_LINEAGE_CACHE_CAPACITY)
                .unwrap_or(NonZeroUsize::MIN),
            lineage_display_depth: DEFAULT_DISPLAY_DEPTH,
            min_name_length: crate::services::validation::DEFAULT_MIN_NAME_LENGTH,
            default_min_level: bounds.min_level,
            default_max_level: bounds.max_level,
            logging: LoggingSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses configuration from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the TOML is malformed or a value is
    /// out of range.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents)
            .map_err(|e| Error::InvalidInput(format!("invalid config file: {e}")))?;
        Self::from_config_file(file)
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        Self::from_toml(&contents)
    }

    /// Loads configuration from the default location.
    ///
    /// Checks `<config dir>/roleforge/config.toml`, then
    /// `~/.config/roleforge/config.toml`. Returns defaults if neither exists or
    /// loads.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let candidates = [
            base_dirs.config_dir().join("roleforge").join("config.toml"),
            base_dirs
                .home_dir()
                .join(".config")
                .join("roleforge")
                .join("config.toml"),
        ];
        for path in candidates.iter().filter(|p| p.exists()) {
            match Self::load_from_file(path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Ignoring unreadable config file"
                    );
                },
            }
        }

        Self::default()
    }

    /// Applies `ROLEFORGE_*` environment variables.
    ///
    /// Unparseable values are ignored.
    #[must_use]
    pub fn apply_env_overrides(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides looked up by variable name.
    #[must_use]
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<usize>().ok());

        if let Some(capacity) =
            parsed("ROLEFORGE_LINEAGE_CACHE_CAPACITY").and_then(NonZeroUsize::new)
        {
            self.lineage_cache_capacity = capacity;
        }
        if let Some(depth) = parsed("ROLEFORGE_LINEAGE_DISPLAY_DEPTH") {
            self.lineage_display_depth = depth;
        }
        if let Some(length) = parsed("ROLEFORGE_MIN_NAME_LENGTH") {
            self.min_name_length = length;
        }
        if let Some(level) =
            lookup("ROLEFORGE_DEFAULT_MIN_LEVEL").and_then(|v| v.trim().parse().ok())
        {
            self.default_min_level = level;
        }
        if let Some(level) =
            lookup("ROLEFORGE_DEFAULT_MAX_LEVEL").and_then(|v| v.trim().parse().ok())
        {
            self.default_max_level = level;
        }
        if let Some(format) = lookup("ROLEFORGE_LOG_FORMAT") {
            self.logging.format = Some(format);
        }
        if let Some(level) = lookup("ROLEFORGE_LOG_LEVEL") {
            self.logging.level = Some(level);
        }
        self
    }

    /// Validator using the configured name length.
    #[must_use]
    pub const fn validator(&self) -> CloneValidator {
        CloneValidator::new(self.min_name_length)
    }

    /// Duplication context with the configured default level bounds.
    #[must_use]
    pub fn duplication_context<I, S>(&self, existing_names: I) -> RoleDuplicationContext
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RoleDuplicationContext {
            existing_names: existing_names.into_iter().map(Into::into).collect(),
            hierarchy_constraints: HierarchyConstraints::new(
                self.default_min_level,
                self.default_max_level,
            ),
        }
    }

    /// Creates an empty lineage cache of the configured capacity.
    #[must_use]
    pub fn lineage_cache(&self) -> LineageCache {
        LineageCache::new(self.lineage_cache_capacity)
    }

    fn from_config_file(file: ConfigFile) -> Result<Self> {
        let mut config = Self::default();

        if let Some(capacity) = file.lineage_cache_capacity {
            config.lineage_cache_capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
                Error::InvalidInput("lineage_cache_capacity must be greater than 0".to_string())
            })?;
        }
        if let Some(depth) = file.lineage_display_depth {
            config.lineage_display_depth = depth;
        }
        if let Some(length) = file.min_name_length {
            config.min_name_length = length;
        }
        if let Some(level) = file.default_min_level {
            config.default_min_level = level;
        }
        if let Some(level) = file.default_max_level {
            config.default_max_level = level;
        }
        if config.default_min_level > config.default_max_level {
            return Err(Error::InvalidInput(format!(
                "default_min_level {} exceeds default_max_level {}",
                config.default_min_level, config.default_max_level
            )));
        }
        if let Some(logging) = file.logging {
            config.logging = logging;
        }

        Ok(config)
    }
}
