use std::io::Write;

use fleet_operator::{
    crd::{
        fleet_job::v1beta1::FleetJob,
        node_report::v1beta1::NodeReport,
        workload::{WorkloadVersion, merged_crd},
    },
    kube::{CustomResourceExt as _, core::crd::MergeError},
};
use snafu::{ResultExt as _, Snafu};

use crate::yaml;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to merge {crd_name:?} CRD"))]
    MergeCrd {
        source: MergeError,
        crd_name: &'static str,
    },

    #[snafu(display("failed to write {crd_name:?} CRD"))]
    WriteCrd {
        source: yaml::Error,
        crd_name: &'static str,
    },
}

/// Writes the CRDs of all fleet resources as YAML documents. The `Workload` CRD contains every
/// served version, with the hub version stored.
pub fn print_crds<W: Write>(mut writer: W) -> Result<()> {
    let workload = merged_crd(WorkloadVersion::HUB).context(MergeCrdSnafu {
        crd_name: "Workload",
    })?;

    for (crd_name, crd) in [
        ("Workload", workload),
        ("FleetJob", FleetJob::crd()),
        ("NodeReport", NodeReport::crd()),
    ] {
        yaml::serialize(&crd, &mut writer).context(WriteCrdSnafu { crd_name })?;
    }

    Ok(())
}
