//! This crate contains functionality to initialise tracing subscribers for console and rolling
//! file output.
//!
//! To get started, see [`Tracing`][tracing::Tracing].

pub mod tracing;
