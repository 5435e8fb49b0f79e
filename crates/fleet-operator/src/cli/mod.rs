//! Common CLI options of tools working with fleet resources, using the `clap` crate.
//!
//! Every option can also be set through the environment variable named after the flag, e.g.
//! `--override-label-key` through `OVERRIDE_LABEL_KEY`.
//!
//! ```
//! use clap::Parser;
//! use fleet_operator::cli::{CommonOptions, ConversionOptions};
//!
//! #[derive(clap::Parser)]
//! struct Opts {
//!     #[command(flatten)]
//!     conversion: ConversionOptions,
//!
//!     #[command(flatten)]
//!     common: CommonOptions,
//! }
//!
//! let opts = Opts::parse_from(["fleet-tool", "--override-label-key", "example.com/exclude"]);
//! assert_eq!(opts.conversion.override_label_key, "example.com/exclude");
//! ```
use clap::Args;
use fleet_telemetry::tracing::TelemetryOptions;

use crate::crd::workload::{
    EXCLUDE_PREPARING_DELETE_LABEL, WorkloadPrecedenceRules, precedence_rules,
};

/// Options of the `Workload` version conversion.
#[derive(Debug, PartialEq, Eq, Args)]
pub struct ConversionOptions {
    /// Label which forces `excludePreparingDelete` when set to "true" on objects converted to
    /// v1beta1.
    #[arg(long, env, value_name = "KEY", default_value = EXCLUDE_PREPARING_DELETE_LABEL)]
    pub override_label_key: String,
}

impl ConversionOptions {
    pub fn precedence_rules(&self) -> WorkloadPrecedenceRules {
        precedence_rules(self.override_label_key.clone())
    }
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            override_label_key: EXCLUDE_PREPARING_DELETE_LABEL.to_owned(),
        }
    }
}

/// Options of the fleet job status aggregation.
#[derive(Debug, Default, PartialEq, Eq, Args)]
pub struct AggregationOptions {
    /// Name used to reference the job from failed item statuses. Defaults to the name of the job.
    #[arg(long, env, value_name = "NAME")]
    pub job_name: Option<String>,
}

/// A set of CLI arguments every fleet tool takes.
#[derive(Debug, PartialEq, Eq, Args)]
pub struct CommonOptions {
    #[command(flatten)]
    pub telemetry: TelemetryOptions,
}
