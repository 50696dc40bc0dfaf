//! Client code for fieldmap.
//!
//! This crate provides the HTTP implementation of the core
//! [`RecordSource`](fieldmap_core::RecordSource) against the remote report API.

pub mod report;

pub use report::{ReportClient, ReportConfig, ReportError};
