use crate::error::ConfigError;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_PENALTY_MS: u64 = 1500;
pub const DEFAULT_QUESTIONS: [u32; 4] = [10, 25, 50, 99];
/// largest question count a round may have
pub const MAX_QUESTION_COUNT: u32 = 999;

/// Game rules, fixed for the lifetime of a session
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GameConfig {
    /// milliseconds added per misjudged equation
    pub penalty: u64,
    /// question counts offered to the player
    pub questions: Vec<u32>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            penalty: DEFAULT_PENALTY_MS,
            questions: DEFAULT_QUESTIONS.to_vec(),
        }
    }
}

impl GameConfig {
    /// Defaults with `overrides` applied on top; any key set in the overrides wins.
    pub fn merged(overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            penalty: overrides.penalty.unwrap_or(defaults.penalty),
            questions: overrides
                .questions
                .clone()
                .unwrap_or(defaults.questions),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.questions.is_empty() {
            return Err(ConfigError::EmptyQuestions);
        }
        if self.questions.contains(&0) {
            return Err(ConfigError::ZeroQuestionCount);
        }
        if let Some(&count) = self.questions.iter().find(|&&c| c > MAX_QUESTION_COUNT) {
            return Err(ConfigError::QuestionCountTooLarge {
                count,
                max: MAX_QUESTION_COUNT,
            });
        }
        Ok(())
    }
}

/// Optional per-key settings from a config file or the command line
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penalty: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questions: Option<Vec<u32>>,
}

impl ConfigOverrides {
    /// Layer `other` over `self`, keys set in `other` win.
    pub fn layered(self, other: ConfigOverrides) -> Self {
        Self {
            penalty: other.penalty.or(self.penalty),
            questions: other.questions.or(self.questions),
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Result<ConfigOverrides, ConfigError>;
    fn save(&self, overrides: &ConfigOverrides) -> Result<(), ConfigError>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "mathsprint") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("mathsprint_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// A missing file means no overrides.
    fn load(&self) -> Result<ConfigOverrides, ConfigError> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no config file, using defaults");
            return Ok(ConfigOverrides::default());
        }

        let bytes = fs::read(&self.path)?;
        let overrides = serde_json::from_slice::<ConfigOverrides>(&bytes)?;
        tracing::info!(path = %self.path.display(), ?overrides, "loaded config file");
        Ok(overrides)
    }

    fn save(&self, overrides: &ConfigOverrides) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(overrides)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
