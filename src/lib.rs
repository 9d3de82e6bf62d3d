//! Point-in-time snapshots of a Kubernetes namespace and the cluster around
//! it, normalized into one JSON document.
//!
//! [`aggregator::Aggregator`] fans out one list call per
//! [`kind::ResourceKind`] through an [`api::ClusterApi`], runs every result
//! through its extractor in [`extract`] and merges the sections into a
//! [`model::Snapshot`]. A kind that fails or is missing from the cluster only
//! affects its own section.

pub mod aggregator;
pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod extract;
pub mod kind;
pub mod model;
pub mod server;
mod utils;
