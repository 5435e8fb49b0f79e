use std::{io::Write, path::PathBuf};

use clap::Args;
use fleet_operator::{
    cli::ConversionOptions,
    crd::workload::VersionedWorkload,
    kube::core::conversion::ConversionReview,
    versioned::{
        ConversionError,
        review::{convert_objects, try_convert},
    },
};
use snafu::{ResultExt as _, Snafu};

use crate::yaml;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to read input"))]
    ReadInput { source: yaml::Error },

    #[snafu(display("failed to convert objects into {desired_api_version:?}"))]
    ConvertObjects {
        source: ConversionError,
        desired_api_version: String,
    },

    #[snafu(display("failed to write converted objects"))]
    WriteObjects { source: yaml::Error },

    #[snafu(display("failed to write conversion review"))]
    WriteReview { source: serde_json::Error },

    #[snafu(display("failed to write output"))]
    WriteOutput { source: std::io::Error },
}

#[derive(Debug, PartialEq, Eq, Args)]
pub struct ConvertArguments {
    /// API version to convert into, for example apps.fleet.dev/v1alpha1.
    #[arg(long, value_name = "API_VERSION")]
    pub to: String,

    /// File containing one or more Workload documents, "-" reads from stdin.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[command(flatten)]
    pub conversion: ConversionOptions,
}

#[derive(Debug, PartialEq, Eq, Args)]
pub struct ReviewArguments {
    /// File containing a ConversionReview as JSON or YAML, "-" reads from stdin.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[command(flatten)]
    pub conversion: ConversionOptions,
}

/// Converts every `Workload` of the input file and writes them as YAML documents.
///
/// Nothing is written if any of the objects fails to convert.
pub fn convert<W: Write>(arguments: ConvertArguments, writer: W) -> Result<()> {
    let ConvertArguments {
        to,
        file,
        conversion,
    } = arguments;

    let objects = yaml::read_documents(&file).context(ReadInputSnafu)?;
    let rules = conversion.precedence_rules();

    let converted = convert_objects::<VersionedWorkload>(objects, &to, &rules)
        .context(ConvertObjectsSnafu {
            desired_api_version: to,
        })?;

    yaml::serialize_all(&converted, writer).context(WriteObjectsSnafu)
}

/// Answers the `ConversionReview` of the input file the same way a conversion webhook would and
/// writes the response as JSON.
pub fn review<W: Write>(arguments: ReviewArguments, mut writer: W) -> Result<()> {
    let review: ConversionReview = yaml::read_document(&arguments.file).context(ReadInputSnafu)?;
    let rules = arguments.conversion.precedence_rules();

    let response = try_convert::<VersionedWorkload>(review, &rules);

    serde_json::to_writer_pretty(&mut writer, &response).context(WriteReviewSnafu)?;
    writeln!(writer).context(WriteOutputSnafu)
}

#[cfg(test)]
mod tests {
    use std::{io::Write as _, path::Path};

    use fleet_operator::crd::workload::v1beta1;
    use indoc::indoc;
    use serde_json::Value;
    use tempfile::NamedTempFile;

    use super::*;

    const WORKLOADS: &str = indoc! {"
        ---
        apiVersion: apps.fleet.dev/v1alpha1
        kind: Workload
        metadata:
          name: web
          namespace: default
          labels:
            apps.fleet.dev/scaling-exclude-preparing-delete: \"true\"
        spec:
          replicas: 3
          selector:
            matchLabels:
              app: web
          template:
            metadata:
              labels:
                app: web
          scaleStrategy:
            maxUnavailable: 1
          updateStrategy:
            type: InPlaceIfPossible
            partition: 1
        ---
        apiVersion: apps.fleet.dev/v1beta1
        kind: Workload
        metadata:
          name: api
          namespace: default
        spec:
          selector:
            matchLabels:
              app: api
          template:
            metadata:
              labels:
                app: api
          scaleStrategy: {}
          updateStrategy: {}
    "};

    fn input_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temporary file");
        file.write_all(content.as_bytes()).expect("writable file");
        file
    }

    fn conversion_options() -> ConversionOptions {
        ConversionOptions::default()
    }

    #[test]
    fn convert_to_hub() {
        let file = input_file(WORKLOADS);
        let mut buffer = Vec::new();

        convert(
            ConvertArguments {
                to: "apps.fleet.dev/v1beta1".to_owned(),
                file: file.path().to_owned(),
                conversion: conversion_options(),
            },
            &mut buffer,
        )
        .expect("objects are convertible");

        let output = String::from_utf8(buffer).expect("valid UTF-8");
        let workloads: Vec<v1beta1::Workload> =
            yaml::from_documents(&output, Path::new("stdout")).expect("valid workloads");

        assert_eq!(workloads.len(), 2);
        assert!(workloads[0].spec.scale_strategy.exclude_preparing_delete);
        assert_eq!(workloads[0].spec.replicas, Some(3));
        assert!(!workloads[1].spec.scale_strategy.exclude_preparing_delete);
    }

    #[test]
    fn convert_to_unknown_version_writes_nothing() {
        let file = input_file(WORKLOADS);
        let mut buffer = Vec::new();

        let err = convert(
            ConvertArguments {
                to: "apps.fleet.dev/v2".to_owned(),
                file: file.path().to_owned(),
                conversion: conversion_options(),
            },
            &mut buffer,
        )
        .expect_err("version is unknown");

        assert!(matches!(err, Error::ConvertObjects {
            source: ConversionError::UnsupportedVersion { .. },
            ..
        }));
        assert!(buffer.is_empty());
    }

    #[test]
    fn review_answers_with_converted_objects() {
        let file = input_file(indoc! {r#"
            {
              "apiVersion": "apiextensions.k8s.io/v1",
              "kind": "ConversionReview",
              "request": {
                "uid": "0b6a3c3d-0c6e-4b8e-9d7a-3f4b5d1e2a10",
                "desiredAPIVersion": "apps.fleet.dev/v1alpha1",
                "objects": [
                  {
                    "apiVersion": "apps.fleet.dev/v1beta1",
                    "kind": "Workload",
                    "metadata": { "name": "api", "namespace": "default" },
                    "spec": {
                      "selector": { "matchLabels": { "app": "api" } },
                      "template": { "metadata": { "labels": { "app": "api" } } },
                      "scaleStrategy": {},
                      "updateStrategy": {}
                    }
                  }
                ]
              }
            }
        "#});
        let mut buffer = Vec::new();

        review(
            ReviewArguments {
                file: file.path().to_owned(),
                conversion: conversion_options(),
            },
            &mut buffer,
        )
        .expect("review is answered");

        let response: Value = serde_json::from_slice(&buffer).expect("valid JSON");

        assert_eq!(
            response["response"]["uid"],
            "0b6a3c3d-0c6e-4b8e-9d7a-3f4b5d1e2a10"
        );
        assert_eq!(response["response"]["result"]["status"], "Success");
        assert_eq!(
            response["response"]["convertedObjects"][0]["apiVersion"],
            "apps.fleet.dev/v1alpha1"
        );
    }
}
