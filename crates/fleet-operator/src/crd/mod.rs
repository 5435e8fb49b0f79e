//! Custom resources of the `apps.fleet.dev` API group.
//!
//! # Custom Resources
//!
//! ## [`Workload`][wl]
//!
//! A set of identical pods with in-place update support. Served in `v1alpha1` and `v1beta1`,
//! stored as `v1beta1`.
//!
//! ## [`FleetJob`][fj]
//!
//! Pulls a list of images on every node of the cluster.
//!
//! ## [`NodeReport`][nr]
//!
//! Per-node observation of the images a node should pull and their progress. Written by the agent
//! running on the node and named after it.
//!
//! [wl]: workload::v1beta1::Workload
//! [fj]: fleet_job::v1beta1::FleetJob
//! [nr]: node_report::v1beta1::NodeReport

pub mod fleet_job;
pub mod node_report;
pub mod workload;

/// The API group all custom resources of this crate belong to.
pub const GROUP: &str = "apps.fleet.dev";
