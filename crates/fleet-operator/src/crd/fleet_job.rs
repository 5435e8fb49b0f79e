//! The [`FleetJob`](v1beta1::FleetJob) custom resource.
//!
//! A fleet job pulls a list of images on every selected node. The nodes report their progress
//! through [`NodeReport`][nr]s, which are aggregated into the
//! [`FleetJobStatus`](v1beta1::FleetJobStatus) by [`crate::status::aggregate`].
//!
//! [nr]: crate::crd::node_report::v1beta1::NodeReport

pub mod v1beta1 {
    use k8s_openapi::apimachinery::pkg::{
        apis::meta::v1::{LabelSelector, Time},
        util::intstr::IntOrString,
    };
    use kube::CustomResource;
    use schemars::JsonSchema;
    use serde::{Deserialize, Serialize};

    /// Pulls a list of images on every selected node of the cluster.
    #[derive(Clone, CustomResource, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
    #[kube(
        group = "apps.fleet.dev",
        version = "v1beta1",
        kind = "FleetJob",
        status = "FleetJobStatus",
        shortname = "fj",
        derive = "PartialEq",
        namespaced
    )]
    #[serde(rename_all = "camelCase")]
    pub struct FleetJobSpec {
        /// The images to pull, in order. Duplicates are ignored.
        pub items: Vec<String>,

        #[serde(flatten)]
        pub template: JobTemplate,
    }

    /// Describes how the items of a [`FleetJob`] are pulled. Opaque to the status aggregation.
    #[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct JobTemplate {
        /// Names of secrets in the namespace of the job used to authenticate against registries.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub pull_secrets: Option<Vec<String>>,

        /// Selects the nodes to pull on. All nodes if unset.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub selector: Option<LabelSelector>,

        /// Maximum number of nodes pulling at the same time.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub parallelism: Option<IntOrString>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub pull_policy: Option<PullPolicy>,

        #[serde(default)]
        pub completion_policy: CompletionPolicy,
    }

    #[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PullPolicy {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub timeout_seconds: Option<i32>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub back_off_limit: Option<i32>,
    }

    /// Decides when a [`FleetJob`] is finished and when it may be garbage collected.
    #[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CompletionPolicy {
        #[serde(default, rename = "type")]
        pub type_: CompletionPolicyType,

        /// Seconds after the job finished until it becomes eligible for garbage collection.
        /// Only applies to [`CompletionPolicyType::Always`].
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub ttl_seconds_after_finished: Option<i32>,

        /// Seconds after the start of the job after which it is finished, even if nodes are
        /// still pulling. Only applies to [`CompletionPolicyType::Always`].
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub active_deadline_seconds: Option<i64>,
    }

    #[derive(
        Clone,
        Copy,
        Debug,
        Default,
        Deserialize,
        Eq,
        JsonSchema,
        PartialEq,
        Serialize,
        strum::Display,
    )]
    pub enum CompletionPolicyType {
        /// The job is finished once no pull is active anymore, regardless of the outcome.
        #[default]
        Always,

        /// The job is never finished and keeps pulling on nodes joining the fleet.
        Never,
    }

    #[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct FleetJobStatus {
        /// When the job was first observed by the controller.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub start_time: Option<Time>,

        /// When the job finished. Set once and never moved afterwards.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub completion_time: Option<Time>,

        /// Number of (node, image, tag) pulls the job consists of.
        #[serde(default)]
        pub desired: i32,

        /// Pulls which have not reached a terminal phase yet.
        #[serde(default)]
        pub active: i32,

        /// Pulls which either succeeded or failed.
        #[serde(default)]
        pub completed: i32,

        #[serde(default)]
        pub succeeded: i32,

        /// One entry per image which failed on at least one node, in the order of `spec.items`.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub failed_item_statuses: Vec<FailedItemStatus>,
    }

    #[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct FailedItemStatus {
        /// Name of the job the failure belongs to.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub job_ref: Option<String>,

        pub item_name: String,

        /// Summary of the failed pulls, sorted by node and tag.
        pub message: String,
    }
}
