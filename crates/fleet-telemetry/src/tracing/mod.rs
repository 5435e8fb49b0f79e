//! This module contains functionality to initialise tracing subscribers for console output and
//! file output.
//!
//! To get started, see [`Tracing`].

use std::path::PathBuf;

use snafu::{ResultExt as _, Snafu};
use tracing::{level_filters::LevelFilter, subscriber::SetGlobalDefaultError};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{InitError, RollingFileAppender},
};
use tracing_subscriber::{EnvFilter, Layer, Registry, filter::Directive, layer::SubscriberExt};

use crate::tracing::settings::{FileLogSettings, Rotation, Settings};

pub mod settings;

type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors which can be encountered when initialising [`Tracing`].
#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to initialize rolling file appender"))]
    InitRollingFileAppender { source: InitError },

    #[snafu(display("unable to set the global default subscriber"))]
    SetGlobalDefaultSubscriber { source: SetGlobalDefaultError },
}

/// Easily initialize a set of pre-configured [`Subscriber`][1] layers.
///
/// Console logs are written to stderr, so that stdout stays free for the output of tools. File
/// logs are written as JSON lines into rolling files by a background worker. Buffered lines are
/// flushed when the value returned by [`Tracing::init`] is dropped.
///
/// <div class="warning">
/// Name the guard variable returned by [`Tracing::init`] appropriately, do not just use
/// <code>let _ =</code>, as that will drop immediately and stop the file log worker.
/// </div>
///
/// ```
/// # use fleet_telemetry::tracing::{Tracing, Error};
/// use tracing::level_filters::LevelFilter;
///
/// # fn main() -> Result<(), Error> {
/// let _tracing_guard = Tracing::builder("fleet-tool")
///     .with_console_output(("FLEET_CONSOLE_LOG", LevelFilter::INFO))
///     .build()
///     .init()?;
///
/// tracing::info!("log a message");
/// # Ok(())
/// # }
/// ```
///
/// [1]: tracing::Subscriber
#[derive(Debug)]
pub struct Tracing {
    service_name: &'static str,
    console_log_settings: Option<Settings>,
    file_log_settings: Option<FileLogSettings>,
    file_log_guard: Option<WorkerGuard>,
}

impl Tracing {
    /// The environment variable used to configure the level of the console log subscriber.
    pub const CONSOLE_LOG_LEVEL: &str = "CONSOLE_LOG_LEVEL";
    /// The environment variable used to configure the level of the file log subscriber.
    pub const FILE_LOG_LEVEL: &str = "FILE_LOG_LEVEL";
    /// The filename suffix of rolled log files.
    pub const FILE_LOG_SUFFIX: &str = "tracing-rs.json";

    pub fn builder(service_name: &'static str) -> TracingBuilder {
        TracingBuilder {
            service_name,
            console_log_settings: None,
            file_log_settings: None,
        }
    }

    /// Creates an instance with opinionated defaults, configured by `options`.
    ///
    /// | Subscriber | Environment variable | Default level | Enabled by |
    /// | ---------- | -------------------- | ------------- | ---------- |
    /// | Console    | `CONSOLE_LOG_LEVEL`  | `INFO`        | `--console-log-disabled` (inverted) |
    /// | File       | `FILE_LOG_LEVEL`     | `INFO`        | `--file-log-directory` |
    pub fn pre_configured(service_name: &'static str, options: TelemetryOptions) -> Self {
        let TelemetryOptions {
            console_log_disabled,
            file_log_directory,
            file_log_rotation_period,
        } = options;

        let rotation_period = file_log_rotation_period.unwrap_or_default();

        Self::builder(service_name)
            .with_console_output::<(&'static str, LevelFilter)>(
                (!console_log_disabled).then_some((Self::CONSOLE_LOG_LEVEL, LevelFilter::INFO)),
            )
            .with_file_output(file_log_directory.map(|directory| {
                Settings::from((Self::FILE_LOG_LEVEL, LevelFilter::INFO))
                    .file_log_settings(directory, rotation_period.into())
            }))
            .build()
    }

    /// Initialize the configured tracing subscribers and install them as the global default.
    ///
    /// The returned value must be kept alive until the application exits, dropping it flushes and
    /// stops the file log worker.
    pub fn init(mut self) -> Result<Self> {
        let mut layers: Vec<Box<dyn Layer<Registry> + Sync + Send>> = Vec::new();

        if let Some(settings) = &self.console_log_settings {
            let env_filter_layer =
                env_filter_builder(settings.environment_variable, settings.default_level);

            layers.push(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_filter(env_filter_layer)
                    .boxed(),
            );
        }

        if let Some(FileLogSettings {
            common_settings,
            file_log_dir,
            rotation_period,
        }) = &self.file_log_settings
        {
            let env_filter_layer = env_filter_builder(
                common_settings.environment_variable,
                common_settings.default_level,
            );

            let file_appender = RollingFileAppender::builder()
                .rotation(rotation_period.clone())
                .filename_prefix(self.service_name)
                .filename_suffix(Self::FILE_LOG_SUFFIX)
                .build(file_log_dir)
                .context(InitRollingFileAppenderSnafu)?;
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            self.file_log_guard = Some(guard);

            layers.push(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(file_writer)
                    .with_filter(env_filter_layer)
                    .boxed(),
            );
        }

        if !layers.is_empty() {
            tracing::subscriber::set_global_default(tracing_subscriber::registry().with(layers))
                .context(SetGlobalDefaultSubscriberSnafu)?;
        }

        tracing::debug!(service_name = self.service_name, "initialized tracing subscribers");

        Ok(self)
    }
}

/// Builds a [`Tracing`] instance. Subscribers which are not configured stay disabled.
pub struct TracingBuilder {
    service_name: &'static str,
    console_log_settings: Option<Settings>,
    file_log_settings: Option<FileLogSettings>,
}

impl TracingBuilder {
    /// Enables the console subscriber. `None` disables it again.
    pub fn with_console_output<S>(mut self, settings: impl Into<Option<S>>) -> Self
    where
        S: Into<Settings>,
    {
        self.console_log_settings = settings.into().map(Into::into);
        self
    }

    /// Enables the rolling file subscriber. `None` disables it again.
    pub fn with_file_output(mut self, settings: impl Into<Option<FileLogSettings>>) -> Self {
        self.file_log_settings = settings.into();
        self
    }

    pub fn build(self) -> Tracing {
        Tracing {
            service_name: self.service_name,
            console_log_settings: self.console_log_settings,
            file_log_settings: self.file_log_settings,
            file_log_guard: None,
        }
    }
}

/// Create an [`EnvFilter`] configured with the given environment variable and default
/// [`Directive`].
fn env_filter_builder(env_var: &str, default_directive: impl Into<Directive>) -> EnvFilter {
    EnvFilter::builder()
        .with_env_var(env_var)
        .with_default_directive(default_directive.into())
        .from_env_lossy()
}

/// Contains options which can be passed to [`Tracing::pre_configured()`].
///
/// Additionally, this struct can be used as CLI arguments if the feature `clap` is enabled.
#[cfg_attr(feature = "clap", derive(clap::Args, PartialEq, Eq))]
#[derive(Debug, Default)]
pub struct TelemetryOptions {
    /// Disable console logs.
    #[cfg_attr(feature = "clap", arg(long, env))]
    pub console_log_disabled: bool,

    /// Enable logging to files located in the specified DIRECTORY.
    #[cfg_attr(
        feature = "clap",
        arg(long, env, value_name = "DIRECTORY", group = "file_log")
    )]
    pub file_log_directory: Option<PathBuf>,

    /// Time PERIOD after which log files are rolled over.
    #[cfg_attr(
        feature = "clap",
        arg(long, env, value_name = "PERIOD", requires = "file_log")
    )]
    pub file_log_rotation_period: Option<RotationPeriod>,
}

/// Supported periods when the log file is rolled over.
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "PascalCase")]
pub enum RotationPeriod {
    Minutely,
    Hourly,
    Daily,

    #[default]
    Never,
}

impl From<RotationPeriod> for Rotation {
    fn from(value: RotationPeriod) -> Self {
        match value {
            RotationPeriod::Minutely => Self::MINUTELY,
            RotationPeriod::Hourly => Self::HOURLY,
            RotationPeriod::Daily => Self::DAILY,
            RotationPeriod::Never => Self::NEVER,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use rstest::rstest;

    use super::*;

    #[test]
    fn builder_disables_everything_by_default() {
        let tracing = Tracing::builder("test").build();

        assert_eq!(tracing.service_name, "test");
        assert!(tracing.console_log_settings.is_none());
        assert!(tracing.file_log_settings.is_none());
        assert!(tracing.file_log_guard.is_none());
    }

    #[test]
    fn builder_last_console_output_wins() {
        let tracing = Tracing::builder("test")
            .with_console_output(("ABC_A", LevelFilter::TRACE))
            .with_console_output(("ABC_B", LevelFilter::DEBUG))
            .build();

        assert_eq!(
            tracing.console_log_settings,
            Some(Settings {
                environment_variable: "ABC_B",
                default_level: LevelFilter::DEBUG,
            })
        );
    }

    #[rstest]
    #[case(false, None, true, false)]
    #[case(true, None, false, false)]
    #[case(false, Some("/var/log/fleet"), true, true)]
    fn pre_configured(
        #[case] console_log_disabled: bool,
        #[case] file_log_directory: Option<&str>,
        #[case] console: bool,
        #[case] file: bool,
    ) {
        let tracing = Tracing::pre_configured("test", TelemetryOptions {
            console_log_disabled,
            file_log_directory: file_log_directory.map(PathBuf::from),
            file_log_rotation_period: Some(RotationPeriod::Daily),
        });

        assert_eq!(tracing.console_log_settings.is_some(), console);
        assert_eq!(tracing.file_log_settings.is_some(), file);

        if let Some(settings) = tracing.file_log_settings {
            assert_eq!(settings.rotation_period, Rotation::DAILY);
            assert_eq!(settings.common_settings.environment_variable, "FILE_LOG_LEVEL");
        }
    }

    // This is the only test installing a global subscriber, which can be done once per process.
    #[test]
    fn init_writes_log_file() {
        let directory = tempfile::tempdir().expect("temporary directory");

        let tracing_guard = Tracing::builder("init-test")
            .with_file_output(
                Settings::from(("INIT_TEST_FILE_LOG", LevelFilter::INFO))
                    .file_log_settings(directory.path(), Rotation::NEVER),
            )
            .build()
            .init()
            .expect("subscriber is installed");

        assert!(tracing_guard.file_log_guard.is_some());
        tracing::info!("written to file");
        drop(tracing_guard);

        let files: Vec<_> = std::fs::read_dir(directory.path())
            .expect("readable directory")
            .filter_map(Result::ok)
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();

        assert_eq!(files, ["init-test.tracing-rs.json"]);

        let content = std::fs::read_to_string(directory.path().join("init-test.tracing-rs.json"))
            .expect("readable log file");
        assert!(content.contains("written to file"));
    }

    #[test]
    fn rotation_period_from_str() {
        assert_eq!(
            "Hourly".parse::<RotationPeriod>().expect("valid period"),
            RotationPeriod::Hourly
        );
        assert_eq!(RotationPeriod::default().to_string(), "Never");
    }
}
