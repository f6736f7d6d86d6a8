//! Drone survey DCIM processing pipeline.
//!
//! This crate provides tools for:
//! - Discovering flight routes in a DCIM directory of DJI captures
//! - Classifying RGB frames and multispectral band files by filename
//! - Grouping sibling band files into synchronized multi-band captures
//! - Validating per-route ground-control-point (GCP) marker files
//! - Preparing versioned output project directories with job manifests
//!
//! The heavy photogrammetry (matching, alignment, dense reconstruction)
//! belongs to the external application; this crate owns everything up to
//! the hand-off: discovery, grouping, validation, and naming.
//!
//! # Example
//!
//! ```no_run
//! use survey_pipeline::{scanner::scan_routes, scanner::ScanMode, PipelineConfig};
//! use std::path::Path;
//!
//! let config = PipelineConfig::default();
//! let routes = scan_routes(Path::new("DCIM"), ScanMode::Multispectral, &config).unwrap();
//! for route in &routes {
//!     println!("Route {}: {} complete captures", route.number, route.complete_captures());
//! }
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod project;
pub mod scanner;

pub use config::{NamingConfig, PipelineConfig, ScanConfig};
pub use crate::core::capture::{Band, CaptureFile, Channel, MultiBandCapture};
pub use scanner::routes::{Route, ScanMode};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
