//! Serves Kubernetes [`ConversionReview`]s with any [`VersionedObject`].
//!
//! The API server sends a list of objects together with the desired API version. Either all of
//! them are converted, or the response carries a failure status and no objects at all.

use std::fmt::Display;

use kube::{
    core::{
        conversion::{ConversionRequest, ConversionResponse, ConversionReview},
        response::{Status, StatusSummary},
    },
};
use serde_json::Value;
use snafu::{OptionExt as _, ensure};

use crate::{ConversionError, FieldNotPresentSnafu, FieldNotStrSnafu, UnexpectedKindSnafu};

/// A closed set of versions of one kind, where every value is tagged with its version.
pub trait VersionedObject: Sized {
    type Version: Copy + PartialEq + Display;
    type Options: ?Sized;

    const KIND: &'static str;

    /// Parses a full `group/version` string into a known version.
    fn parse_version(api_version: &str) -> Result<Self::Version, ConversionError>;

    fn version(&self) -> Self::Version;

    fn from_json_value(value: Value) -> Result<Self, ConversionError>;

    fn into_json_value(self) -> Result<Value, ConversionError>;

    /// Converts this object into the `desired` version.
    ///
    /// Converting into the current version returns the object unchanged.
    fn convert(
        self,
        desired: Self::Version,
        options: &Self::Options,
    ) -> Result<Self, ConversionError>;
}

/// Returns the `apiVersion` of a raw object after checking that its `kind` is `expected_kind`.
pub fn object_api_version<'a>(
    value: &'a Value,
    expected_kind: &'static str,
) -> Result<&'a str, ConversionError> {
    let kind = string_field(value, "kind")?;
    ensure!(kind == expected_kind, UnexpectedKindSnafu {
        kind,
        expected: expected_kind,
    });

    string_field(value, "apiVersion")
}

fn string_field<'a>(value: &'a Value, field: &'static str) -> Result<&'a str, ConversionError> {
    value
        .get(field)
        .context(FieldNotPresentSnafu { field })?
        .as_str()
        .context(FieldNotStrSnafu { field })
}

/// Tries to convert all objects of the [`ConversionReview`] to the desired API version.
///
/// The returned [`ConversionReview`] either indicates a success or a failure, which is handed
/// back to the Kubernetes API server.
#[tracing::instrument(
    skip_all,
    fields(
        k8s.crd.conversion.api_version = review.types.api_version,
        k8s.crd.conversion.kind = review.types.kind,
    )
)]
pub fn try_convert<T>(review: ConversionReview, options: &T::Options) -> ConversionReview
where
    T: VersionedObject,
{
    let request = match ConversionRequest::from_review(review) {
        Ok(request) => request,
        Err(err) => {
            tracing::warn!(?err, "received invalid conversion review");

            return ConversionResponse::invalid(Status {
                status: Some(StatusSummary::Failure),
                message: err.to_string(),
                reason: err.to_string(),
                details: None,
                metadata: None,
                code: 400,
            })
            .into_review();
        }
    };

    let response =
        match convert_objects::<T>(request.objects, &request.desired_api_version, options) {
            Ok(converted_objects) => {
                tracing::debug!(
                    k8s.crd.conversion.converted_object_count = converted_objects.len(),
                    k8s.crd.kind = T::KIND,
                    "Successfully converted objects"
                );

                ConversionResponse {
                    result: Status::success(),
                    types: request.types,
                    uid: request.uid,
                    converted_objects,
                }
            }
            Err(err) => {
                let code = err.http_status_code();
                let message = err.join_errors();

                tracing::warn!(code, error = %message, "failed to convert objects");

                ConversionResponse {
                    result: Status {
                        status: Some(StatusSummary::Failure),
                        message: message.clone(),
                        reason: message,
                        details: None,
                        metadata: None,
                        code,
                    },
                    types: request.types,
                    uid: request.uid,
                    converted_objects: vec![],
                }
            }
        };

    response.into_review()
}

/// Converts every object into `desired_api_version`, stopping at the first failure.
#[tracing::instrument(
    skip_all,
    fields(k8s.crd.conversion.desired_api_version = desired_api_version),
    err
)]
pub fn convert_objects<T>(
    objects: Vec<Value>,
    desired_api_version: &str,
    options: &T::Options,
) -> Result<Vec<Value>, ConversionError>
where
    T: VersionedObject,
{
    let desired = T::parse_version(desired_api_version)?;
    let mut converted_objects = Vec::with_capacity(objects.len());

    for object in objects {
        let object = T::from_json_value(object)?;
        let current = object.version();

        let converted = object.convert(desired, options)?.into_json_value()?;

        tracing::trace!(
            k8s.crd.conversion.current_api_version = %current,
            k8s.crd.conversion.desired_api_version = %desired,
            k8s.crd.kind = T::KIND,
            "Successfully converted object"
        );

        converted_objects.push(converted);
    }

    Ok(converted_objects)
}
