//! Ground-control-point file association.
//!
//! GCP marker files are authored externally, one per route, and imported
//! verbatim by the reconstruction application. This crate only resolves
//! their expected names and checks they exist; the georeferencing content
//! is never parsed or generated here.

use std::path::{Path, PathBuf};

use log::warn;
use thiserror::Error;

use crate::scanner::routes::{Route, ScanMode};

/// Errors that can occur during GCP validation.
#[derive(Debug, Error)]
pub enum GcpError {
    #[error("GCP directory not found: {0}")]
    DirectoryNotFound(PathBuf),
}

/// Result type for GCP operations.
pub type Result<T> = std::result::Result<T, GcpError>;

/// Expected GCP marker filename for a route.
///
/// Multispectral routes use a separate marker set (`_MS` suffix); RGB and
/// combined projects share the plain per-route file.
pub fn gcp_file_name(route_number: &str, mode: ScanMode) -> String {
    match mode {
        ScanMode::Multispectral => format!("gcp_route_{}_MS.xml", route_number),
        ScanMode::Rgb | ScanMode::Combined => format!("gcp_route_{}.xml", route_number),
    }
}

/// Full path of the expected GCP marker file for a route.
pub fn gcp_file_path(gcp_dir: &Path, route_number: &str, mode: ScanMode) -> PathBuf {
    gcp_dir.join(gcp_file_name(route_number, mode))
}

/// A route paired with its existing GCP marker file.
#[derive(Debug)]
pub struct ValidatedRoute<'a> {
    pub route: &'a Route,
    pub gcp_path: PathBuf,
}

/// Outcome of pairing routes with GCP files.
#[derive(Debug)]
pub struct Validation<'a> {
    /// Routes whose GCP file exists.
    pub valid: Vec<ValidatedRoute<'a>>,
    /// Route numbers whose expected GCP file is missing, with the path
    /// that was checked.
    pub missing: Vec<(String, PathBuf)>,
}

/// Pair each route with its GCP marker file.
///
/// A missing GCP directory fails fast. A missing individual file is a
/// recoverable condition: the route is reported in `missing` with a logged
/// warning, and the caller decides whether to proceed with the rest.
pub fn validate_routes<'a>(
    routes: &[&'a Route],
    gcp_dir: &Path,
    mode: ScanMode,
) -> Result<Validation<'a>> {
    if !gcp_dir.is_dir() {
        return Err(GcpError::DirectoryNotFound(gcp_dir.to_path_buf()));
    }

    let mut valid = Vec::new();
    let mut missing = Vec::new();

    for route in routes {
        let gcp_path = gcp_file_path(gcp_dir, &route.number, mode);
        if gcp_path.is_file() {
            valid.push(ValidatedRoute { route, gcp_path });
        } else {
            warn!(
                "Route {}: GCP file not found: {}",
                route.number,
                gcp_path.display()
            );
            missing.push((route.number.clone(), gcp_path));
        }
    }

    Ok(Validation { valid, missing })
}
