//! Subscriber settings.

use std::path::{Path, PathBuf};

use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

/// General settings that apply to any subscriber.
#[derive(Debug, PartialEq, Eq)]
pub struct Settings {
    /// The environment variable used to set the [`LevelFilter`].
    ///
    /// When the environment variable is set, it will override what is set by
    /// [`Self::default_level`].
    pub environment_variable: &'static str,

    /// The [`LevelFilter`] to fallback to if [`Self::environment_variable`] has not been set.
    pub default_level: LevelFilter,
}

impl Settings {
    /// Turns these settings into [`FileLogSettings`] writing into `directory`.
    pub fn file_log_settings<P>(self, directory: P, rotation_period: Rotation) -> FileLogSettings
    where
        P: AsRef<Path>,
    {
        FileLogSettings {
            common_settings: self,
            file_log_dir: directory.as_ref().to_path_buf(),
            rotation_period,
        }
    }
}

impl From<(&'static str, LevelFilter)> for Settings {
    fn from((environment_variable, default_level): (&'static str, LevelFilter)) -> Self {
        Self {
            environment_variable,
            default_level,
        }
    }
}

/// Settings of the subscriber writing JSON logs into rolling files.
#[derive(Debug, PartialEq, Eq)]
pub struct FileLogSettings {
    pub common_settings: Settings,

    /// Directory the log files are created in.
    pub file_log_dir: PathBuf,

    pub rotation_period: Rotation,
}
