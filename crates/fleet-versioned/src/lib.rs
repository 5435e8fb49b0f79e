//! This crate contains the version-agnostic building blocks used to keep multiple schema versions
//! of the same custom resource mutually convertible.
//!
//! A versioned resource designates exactly one version as its [hub](Convertible). Every other
//! version (a spoke) knows how to convert itself into the hub and back. Conversions between two
//! spokes are always routed through the hub, so the number of hand-written conversions grows
//! linearly with the number of versions.
//!
//! The individual field conversions are assembled from a small set of helpers:
//!
//! - [`EnumRemap`] describes a fixed, explicit table between the value spaces of an enum in an
//!   older and a newer version. Values which only exist in the newer version surface as
//!   [`EnumRemapError::Unmappable`] when converting down.
//! - [`convert_list`] and [`try_convert_list`] convert ordered sequences element by element,
//!   keeping the order and the distinction between an absent (`None`) and an empty list.
//! - [`PrecedenceRules`] force fields of the converted object based on labels of the source
//!   object.
//!
//! The [`review`] module plugs these conversions into Kubernetes [`ConversionReview`][cr]s.
//!
//! [cr]: kube::core::conversion::ConversionReview

mod enum_remap;
mod error;
mod hub;
mod ordered;
mod precedence;

pub mod review;

pub use enum_remap::*;
pub use error::*;
pub use hub::*;
pub use ordered::*;
pub use precedence::*;
