//! Computes the status of [`FleetJob`][fj]s from the [`NodeReport`][nr]s of the fleet.
//!
//! Node reports are updated independently by the agents on every node, so the set of reports
//! handed to the aggregation is never a consistent snapshot. Missing or stale reports are
//! expected and count as pending work instead of failing the aggregation.
//!
//! [fj]: crate::crd::fleet_job::v1beta1::FleetJob
//! [nr]: crate::crd::node_report::v1beta1::NodeReport

mod aggregate;
mod completion;

pub use aggregate::*;
pub use completion::*;
