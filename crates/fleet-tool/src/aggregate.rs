use std::{io::Write, path::PathBuf};

use clap::Args;
use fleet_operator::{
    cli::AggregationOptions,
    crd::{fleet_job::v1beta1::FleetJob, node_report::v1beta1::NodeReport},
    status::{apply_aggregate, gc_eligible_at, is_gc_eligible},
};
use jiff::Timestamp;
use snafu::{ResultExt as _, Snafu};

use crate::yaml;

type Result<T, E = Error> = std::result::Result<T, E>;

/// Message of the failed statuses of nodes passed with `--timed-out-node`.
const TIMED_OUT_MESSAGE: &str = "node agent timed out";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to read fleet job"))]
    ReadJob { source: yaml::Error },

    #[snafu(display("failed to read node reports"))]
    ReadReports { source: yaml::Error },

    #[snafu(display("failed to write fleet job"))]
    WriteJob { source: yaml::Error },
}

#[derive(Debug, PartialEq, Eq, Args)]
pub struct AggregateArguments {
    /// File containing the FleetJob, "-" reads from stdin.
    #[arg(long, value_name = "FILE")]
    pub job: PathBuf,

    /// Files containing the NodeReports of the fleet. Every file may contain multiple documents.
    #[arg(long, value_name = "FILE", num_args = 1.., required = true)]
    pub reports: Vec<PathBuf>,

    /// Treats every pull of NODE as failed, as if its agent stopped responding.
    #[arg(long = "timed-out-node", value_name = "NODE")]
    pub timed_out_nodes: Vec<String>,

    #[command(flatten)]
    pub aggregation: AggregationOptions,
}

/// Recomputes the status of the job from the node reports and writes the updated job as YAML.
pub fn aggregate<W: Write>(
    arguments: AggregateArguments,
    writer: W,
    now: Timestamp,
) -> Result<()> {
    let AggregateArguments {
        job,
        reports,
        timed_out_nodes,
        aggregation,
    } = arguments;

    let mut job: FleetJob = yaml::read_document(&job).context(ReadJobSnafu)?;

    let mut node_reports = Vec::new();
    for path in &reports {
        // A malformed report contributes nothing instead of failing the whole job.
        let reports = yaml::read_valid_documents::<NodeReport>(path).context(ReadReportsSnafu)?;
        node_reports.extend(reports);
    }

    for report in &mut node_reports {
        let timed_out = report
            .metadata
            .name
            .as_ref()
            .is_some_and(|name| timed_out_nodes.contains(name));

        if timed_out {
            tracing::info!(
                node = ?report.metadata.name,
                "marking pulls of timed out node as failed"
            );
            report.mark_all_failed(TIMED_OUT_MESSAGE, now);
        }
    }

    let mut status = apply_aggregate(&job, &node_reports, now);

    if let Some(job_name) = aggregation.job_name {
        for failed in &mut status.failed_item_statuses {
            failed.job_ref = Some(job_name.clone());
        }
    }

    let policy = &job.spec.template.completion_policy;
    if let Some(at) = gc_eligible_at(policy, &status) {
        let eligible = is_gc_eligible(policy, &status, now);
        tracing::info!(%at, eligible, "fleet job may be garbage collected");
    }

    job.status = Some(status);
    yaml::serialize(&job, writer).context(WriteJobSnafu)
}
