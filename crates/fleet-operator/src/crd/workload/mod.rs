//! The [`Workload`][wl] custom resource in all of its versions.
//!
//! `v1beta1` is the hub (storage) version. [`VersionedWorkload`] tags an object with its version
//! and routes every conversion through the hub, see [`convert_up`] and [`convert_down`] for the
//! field mappings.
//!
//! [wl]: v1beta1::Workload

use fleet_versioned::{
    ConversionError, Convertible, DeserializeSnafu, SerializeSnafu, UnsupportedVersionSnafu,
    review::{VersionedObject, object_api_version},
};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::{
    CustomResourceExt as _,
    core::crd::{MergeError, merge_crds},
};
use snafu::ResultExt as _;

mod conversion;

pub mod common;
pub mod v1alpha1;
pub mod v1beta1;

pub use conversion::*;

pub const KIND: &str = "Workload";

/// All served versions of a [`Workload`](v1beta1::Workload).
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::Display, strum::VariantArray)]
pub enum WorkloadVersion {
    #[strum(to_string = "v1alpha1")]
    V1Alpha1,

    #[strum(to_string = "v1beta1")]
    V1Beta1,
}

impl WorkloadVersion {
    /// The version objects are stored in and every conversion is routed through.
    pub const HUB: Self = Self::V1Beta1;

    pub fn from_api_version(api_version: &str) -> Result<Self, ConversionError> {
        match api_version {
            "apps.fleet.dev/v1alpha1" => Ok(Self::V1Alpha1),
            "apps.fleet.dev/v1beta1" => Ok(Self::V1Beta1),
            _ => UnsupportedVersionSnafu {
                api_version,
                kind: KIND,
            }
            .fail(),
        }
    }

    pub fn as_api_version(&self) -> &'static str {
        match self {
            Self::V1Alpha1 => "apps.fleet.dev/v1alpha1",
            Self::V1Beta1 => "apps.fleet.dev/v1beta1",
        }
    }
}

/// Returns a single CRD containing every version of a [`Workload`](v1beta1::Workload), with
/// `stored_version` marked as the storage version.
pub fn merged_crd(stored_version: WorkloadVersion) -> Result<CustomResourceDefinition, MergeError> {
    merge_crds(
        vec![v1alpha1::Workload::crd(), v1beta1::Workload::crd()],
        &stored_version.to_string(),
    )
}

/// A [`Workload`](v1beta1::Workload) in any of its versions.
#[derive(Clone, Debug, PartialEq)]
pub enum VersionedWorkload {
    V1Alpha1(v1alpha1::Workload),
    V1Beta1(v1beta1::Workload),
}

impl VersionedWorkload {
    pub fn into_hub(
        self,
        rules: &WorkloadPrecedenceRules,
    ) -> Result<v1beta1::Workload, ConversionError> {
        match self {
            Self::V1Alpha1(workload) => workload.to_hub(rules),
            Self::V1Beta1(workload) => Ok(workload),
        }
    }

    pub fn from_hub(
        hub: v1beta1::Workload,
        desired: WorkloadVersion,
        rules: &WorkloadPrecedenceRules,
    ) -> Result<Self, ConversionError> {
        match desired {
            WorkloadVersion::V1Alpha1 => {
                v1alpha1::Workload::from_hub(hub, rules).map(Self::V1Alpha1)
            }
            WorkloadVersion::V1Beta1 => Ok(Self::V1Beta1(hub)),
        }
    }
}

impl VersionedObject for VersionedWorkload {
    type Options = WorkloadPrecedenceRules;
    type Version = WorkloadVersion;

    const KIND: &'static str = KIND;

    fn parse_version(api_version: &str) -> Result<Self::Version, ConversionError> {
        WorkloadVersion::from_api_version(api_version)
    }

    fn version(&self) -> Self::Version {
        match self {
            Self::V1Alpha1(_) => WorkloadVersion::V1Alpha1,
            Self::V1Beta1(_) => WorkloadVersion::V1Beta1,
        }
    }

    fn from_json_value(value: serde_json::Value) -> Result<Self, ConversionError> {
        let version = WorkloadVersion::from_api_version(object_api_version(&value, KIND)?)?;

        let object = match version {
            WorkloadVersion::V1Alpha1 => Self::V1Alpha1(
                serde_json::from_value(value).context(DeserializeSnafu { kind: KIND })?,
            ),
            WorkloadVersion::V1Beta1 => Self::V1Beta1(
                serde_json::from_value(value).context(DeserializeSnafu { kind: KIND })?,
            ),
        };

        Ok(object)
    }

    fn into_json_value(self) -> Result<serde_json::Value, ConversionError> {
        match self {
            Self::V1Alpha1(workload) => serde_json::to_value(workload),
            Self::V1Beta1(workload) => serde_json::to_value(workload),
        }
        .context(SerializeSnafu { kind: KIND })
    }

    fn convert(
        self,
        desired: Self::Version,
        rules: &Self::Options,
    ) -> Result<Self, ConversionError> {
        if self.version() == desired {
            return Ok(self);
        }

        let hub = self.into_hub(rules)?;
        Self::from_hub(hub, desired, rules)
    }
}
