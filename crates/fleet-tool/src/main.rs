//! Command-line tooling for fleet workloads and fleet jobs.
//!
//! Everything is computed locally from files. Results are written to stdout, logs go to stderr.
use clap::{Parser, Subcommand};
use fleet_operator::cli::CommonOptions;
use fleet_telemetry::tracing::Tracing;
use snafu::{ResultExt as _, Snafu};

use crate::{
    aggregate::AggregateArguments,
    convert::{ConvertArguments, ReviewArguments},
};

mod aggregate;
mod convert;
mod crd;
mod yaml;

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to initialize tracing"))]
    InitTracing {
        source: fleet_telemetry::tracing::Error,
    },

    #[snafu(display("failed to print CRDs"))]
    Crd { source: crd::Error },

    #[snafu(display("failed to convert workloads"))]
    Convert { source: convert::Error },

    #[snafu(display("failed to answer conversion review"))]
    Review { source: convert::Error },

    #[snafu(display("failed to aggregate fleet job status"))]
    Aggregate { source: aggregate::Error },
}

#[derive(Debug, Parser)]
#[command(name = "fleet-tool", author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    common: CommonOptions,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
enum Command {
    /// Print the CRDs of all fleet resources.
    Crd,

    /// Convert Workload documents into another API version.
    Convert(ConvertArguments),

    /// Answer a ConversionReview the way the conversion webhook does.
    Review(ReviewArguments),

    /// Compute the status of a FleetJob from the NodeReports of the fleet.
    Aggregate(AggregateArguments),
}

#[snafu::report]
fn main() -> Result<(), Error> {
    let cli = Cli::parse();

    let _tracing_guard = Tracing::pre_configured(env!("CARGO_PKG_NAME"), cli.common.telemetry)
        .init()
        .context(InitTracingSnafu)?;

    let stdout = std::io::stdout().lock();

    match cli.command {
        Command::Crd => crd::print_crds(stdout).context(CrdSnafu),
        Command::Convert(arguments) => convert::convert(arguments, stdout).context(ConvertSnafu),
        Command::Review(arguments) => convert::review(arguments, stdout).context(ReviewSnafu),
        Command::Aggregate(arguments) => {
            aggregate::aggregate(arguments, stdout, jiff::Timestamp::now()).context(AggregateSnafu)
        }
    }
}
