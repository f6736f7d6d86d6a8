//! Output project layout: versioned directories and job manifests.
//!
//! Prepared projects land under the output base as one directory per route
//! (or one combined directory for multi-route jobs). Name collisions are
//! resolved by appending `_v2`, `_v3`, ... so an earlier run is never
//! overwritten. Each project receives a YAML manifest naming the images
//! and GCP file the downstream reconstruction job should consume.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::capture::Band;
use crate::scanner::routes::{Route, ScanMode};

/// Errors that can occur while building the project structure.
#[derive(Debug, Error)]
pub enum StructureError {
    #[error("failed to create project directory '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to inspect directory '{path}': {source}")]
    InspectDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize manifest for '{path}': {source}")]
    SerializeManifest {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to write manifest '{path}': {source}")]
    WriteManifest {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for structure operations.
pub type Result<T> = std::result::Result<T, StructureError>;

/// Base name for a single-route project, e.g. `route_001_MS`.
pub fn route_project_name(route_number: &str, mode: ScanMode) -> String {
    format!("route_{}_{}", route_number, mode.tag())
}

/// Base name for a combined multi-route project,
/// e.g. `combined_routes_001_003_RGB_MS`.
pub fn combined_project_name(route_numbers: &[String], mode: ScanMode) -> String {
    format!("combined_routes_{}_{}", route_numbers.join("_"), mode.tag())
}

/// Create a project directory under `output_base`, versioning on collision.
///
/// If the base name exists and holds files, `_v2`, `_v3`, ... are tried in
/// turn. An existing empty directory is reused as-is.
///
/// # Returns
///
/// The created (or reused) directory path and its final name.
pub fn create_versioned_dir(output_base: &Path, base_name: &str) -> Result<(PathBuf, String)> {
    let mut version = 1;

    loop {
        let name = if version == 1 {
            base_name.to_string()
        } else {
            format!("{}_v{}", base_name, version)
        };
        let path = output_base.join(&name);

        if path.exists() {
            let mut entries = fs::read_dir(&path).map_err(|e| StructureError::InspectDirectory {
                path: path.display().to_string(),
                source: e,
            })?;
            if entries.next().is_some() {
                version += 1;
                continue;
            }
            // Empty directory from an aborted run, reuse it.
            return Ok((path, name));
        }

        fs::create_dir_all(&path).map_err(|e| StructureError::CreateDirectory {
            path: path.display().to_string(),
            source: e,
        })?;

        if version > 1 {
            info!("Created versioned project directory: {}", name);
        }
        return Ok((path, name));
    }
}

/// Per-route section of a project manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteManifest {
    /// Route identifier.
    pub route: String,
    /// Source DCIM folder.
    pub source_folder: PathBuf,
    /// Flight date (YYYY-MM-DD).
    pub capture_date: String,
    /// GCP marker file for the route, when validated.
    pub gcp_file: Option<PathBuf>,
    /// RGB frames in filename order.
    pub rgb_images: Vec<PathBuf>,
    /// Multispectral images in capture order, bands in canonical order
    /// (G, NIR, R, RE) within each capture.
    pub ms_images: Vec<PathBuf>,
    /// Complete multi-band captures included.
    pub complete_captures: usize,
    /// Incomplete captures included (zero when they are excluded).
    pub incomplete_captures: usize,
}

impl RouteManifest {
    /// Build the manifest section for one route.
    ///
    /// Incomplete captures are included only when `include_incomplete` is
    /// set; they are counted either way so the operator sees the gap.
    pub fn from_route(route: &Route, gcp_file: Option<PathBuf>, include_incomplete: bool) -> Self {
        let mut ms_images: Vec<PathBuf> = Vec::new();
        let mut included_incomplete = 0;

        for capture in &route.captures {
            if !capture.is_complete() {
                if !include_incomplete {
                    continue;
                }
                included_incomplete += 1;
            }
            for band in Band::ALL {
                if let Some(path) = capture.get(band) {
                    ms_images.push(path.clone());
                }
            }
        }

        Self {
            route: route.number.clone(),
            source_folder: route.folder_path.clone(),
            capture_date: route.capture_date.to_string(),
            gcp_file,
            rgb_images: route.rgb_files.iter().map(|f| f.path.clone()).collect(),
            ms_images,
            complete_captures: route.complete_captures(),
            incomplete_captures: included_incomplete,
        }
    }
}

/// Manifest handed to the downstream reconstruction job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectManifest {
    /// Final project directory name (after versioning).
    pub project: String,
    /// Processing mode tag (RGB, MS, RGB_MS).
    pub mode: String,
    /// Member routes.
    pub routes: Vec<RouteManifest>,
}

/// Manifest filename within each project directory.
pub const MANIFEST_FILE: &str = "manifest.yaml";

/// Write a project manifest into its project directory.
///
/// # Returns
///
/// The path of the written manifest file.
pub fn write_manifest(project_dir: &Path, manifest: &ProjectManifest) -> Result<PathBuf> {
    let path = project_dir.join(MANIFEST_FILE);

    let content =
        serde_yaml::to_string(manifest).map_err(|e| StructureError::SerializeManifest {
            path: path.display().to_string(),
            source: e,
        })?;

    fs::write(&path, content).map_err(|e| StructureError::WriteManifest {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::capture::MultiBandCapture;
    use chrono::NaiveDate;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_project_names() {
        assert_eq!(route_project_name("001", ScanMode::Multispectral), "route_001_MS");
        assert_eq!(route_project_name("002", ScanMode::Rgb), "route_002_RGB");
        assert_eq!(
            combined_project_name(&["001".to_string(), "003".to_string()], ScanMode::Combined),
            "combined_routes_001_003_RGB_MS"
        );
    }

    #[test]
    fn test_versioning_on_nonempty_collision() {
        let dir = tempdir().unwrap();

        let (first, name) = create_versioned_dir(dir.path(), "route_001_RGB").unwrap();
        assert_eq!(name, "route_001_RGB");
        File::create(first.join("occupied.txt")).unwrap();

        let (second, name) = create_versioned_dir(dir.path(), "route_001_RGB").unwrap();
        assert_eq!(name, "route_001_RGB_v2");
        assert!(second.ends_with("route_001_RGB_v2"));
        File::create(second.join("occupied.txt")).unwrap();

        let (_, name) = create_versioned_dir(dir.path(), "route_001_RGB").unwrap();
        assert_eq!(name, "route_001_RGB_v3");
    }

    #[test]
    fn test_empty_directory_is_reused() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("route_001_RGB")).unwrap();

        let (path, name) = create_versioned_dir(dir.path(), "route_001_RGB").unwrap();
        assert_eq!(name, "route_001_RGB");
        assert!(path.exists());
    }

    fn test_route() -> Route {
        let ts = NaiveDate::from_ymd_opt(2024, 5, 15)
            .unwrap()
            .and_hms_opt(12, 0, 1)
            .unwrap();

        let mut complete = MultiBandCapture::new(ts, 1);
        for band in Band::ALL {
            complete.insert(band, PathBuf::from(format!("c1_{}.TIF", band.token())));
        }
        let mut partial = MultiBandCapture::new(ts + chrono::Duration::seconds(5), 2);
        partial.insert(Band::Green, PathBuf::from("c2_G.TIF"));

        Route {
            number: "001".to_string(),
            folder_name: "DJI_202405151200_001_x".to_string(),
            folder_path: PathBuf::from("/dcim/DJI_202405151200_001_x"),
            capture_date: NaiveDate::from_ymd_opt(2024, 5, 15).unwrap(),
            rgb_files: Vec::new(),
            captures: vec![complete, partial],
            band_counts: [2, 1, 1, 1],
            unrecognized: Vec::new(),
        }
    }

    #[test]
    fn test_manifest_orders_bands_canonically() {
        let manifest = RouteManifest::from_route(&test_route(), None, true);

        assert_eq!(manifest.complete_captures, 1);
        assert_eq!(manifest.incomplete_captures, 1);
        assert_eq!(
            manifest.ms_images,
            vec![
                PathBuf::from("c1_G.TIF"),
                PathBuf::from("c1_NIR.TIF"),
                PathBuf::from("c1_R.TIF"),
                PathBuf::from("c1_RE.TIF"),
                PathBuf::from("c2_G.TIF"),
            ]
        );
    }

    #[test]
    fn test_manifest_can_exclude_incomplete_captures() {
        let manifest = RouteManifest::from_route(&test_route(), None, false);

        assert_eq!(manifest.incomplete_captures, 0);
        assert_eq!(manifest.ms_images.len(), 4);
    }

    #[test]
    fn test_write_and_reload_manifest() {
        let dir = tempdir().unwrap();
        let manifest = ProjectManifest {
            project: "route_001_MS".to_string(),
            mode: "MS".to_string(),
            routes: vec![RouteManifest::from_route(&test_route(), None, true)],
        };

        let path = write_manifest(dir.path(), &manifest).unwrap();
        assert!(path.ends_with(MANIFEST_FILE));

        let content = fs::read_to_string(&path).unwrap();
        let reloaded: ProjectManifest = serde_yaml::from_str(&content).unwrap();
        assert_eq!(reloaded.project, "route_001_MS");
        assert_eq!(reloaded.routes.len(), 1);
        assert_eq!(reloaded.routes[0].route, "001");
    }
}
