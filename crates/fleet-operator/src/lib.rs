//! Custom resources of the fleet operator together with the logic that operates on them:
//!
//! - [`crd::workload`] keeps the `v1alpha1` and `v1beta1` versions of a [`Workload`][wl]
//!   mutually convertible.
//! - [`status`] rolls per-node [`NodeReport`][nr]s up into the status of a
//!   [`FleetJob`][fj] and decides when the job is finished.
//! - [`retry`] re-runs read-modify-write cycles which lost an optimistic-concurrency race.
//!
//! [wl]: crd::workload::v1beta1::Workload
//! [nr]: crd::node_report::v1beta1::NodeReport
//! [fj]: crd::fleet_job::v1beta1::FleetJob

pub mod cli;
pub mod crd;
pub mod retry;
pub mod status;

// External re-exports
pub use fleet_versioned as versioned;
pub use k8s_openapi;
pub use kube;
pub use schemars;
