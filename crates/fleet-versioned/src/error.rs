use std::error::Error as _;

use snafu::Snafu;

use crate::EnumRemapError;

/// Errors which can occur while converting an object between two versions.
///
/// Every variant aborts the whole conversion. No partially converted object is ever returned
/// alongside one of these errors.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConversionError {
    #[snafu(display("the api version {api_version:?} of kind {kind} is not supported"))]
    UnsupportedVersion {
        api_version: String,
        kind: &'static str,
    },

    #[snafu(display("failed to convert object into {target_version}"))]
    UnmappableEnumValue {
        source: EnumRemapError,
        target_version: String,
    },

    #[snafu(display("the object doesn't contain the {field:?} field"))]
    FieldNotPresent { field: &'static str },

    #[snafu(display("the {field:?} field of the object must be a string"))]
    FieldNotStr { field: &'static str },

    #[snafu(display("the object is of kind {kind:?}, expected {expected}"))]
    UnexpectedKind { kind: String, expected: &'static str },

    #[snafu(display("failed to deserialize object of kind {kind}"))]
    Deserialize {
        source: serde_json::Error,
        kind: &'static str,
    },

    #[snafu(display("failed to serialize object of kind {kind}"))]
    Serialize {
        source: serde_json::Error,
        kind: &'static str,
    },
}

impl ConversionError {
    /// Returns the HTTP status code which is reported back to the API server for this error.
    ///
    /// Problems with the submitted objects are client errors (`400`), objects which are
    /// well-formed but can't be expressed in the desired version are unprocessable (`422`) and
    /// failing to serialize the converted object is an internal error (`500`).
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::UnsupportedVersion { .. }
            | Self::FieldNotPresent { .. }
            | Self::FieldNotStr { .. }
            | Self::UnexpectedKind { .. }
            | Self::Deserialize { .. } => 400,
            Self::UnmappableEnumValue { .. } => 422,
            Self::Serialize { .. } => 500,
        }
    }

    /// Joins the messages of this error and all of its sources into a single line.
    pub fn join_errors(&self) -> String {
        let mut message = self.to_string();
        let mut source = self.source();

        while let Some(err) = source {
            message.push_str(": ");
            message.push_str(&err.to_string());
            source = err.source();
        }

        message
    }
}
