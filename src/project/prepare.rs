//! End-to-end project preparation.
//!
//! Ties the route scanner, GCP validation, and output structure together:
//! scan the DCIM tree, keep the routes whose GCP file exists, then create
//! one versioned project directory per route (or a single combined
//! directory) and write its job manifest.

use std::path::{Path, PathBuf};

use log::{info, warn};
use thiserror::Error;

use crate::config::PipelineConfig;
use crate::project::gcp::{self, GcpError};
use crate::project::structure::{self, ProjectManifest, RouteManifest, StructureError};
use crate::scanner::diagnostics::diagnose_routes;
use crate::scanner::routes::{scan_routes, select_routes, Route, ScanError, ScanMode};

/// Errors that can occur during project preparation.
#[derive(Debug, Error)]
pub enum PrepareError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Gcp(#[from] GcpError),

    #[error(transparent)]
    Structure(#[from] StructureError),

    #[error("no routes left to prepare after validation")]
    NoRoutes,

    #[error("combined projects need at least 2 routes, found {found}")]
    NotEnoughRoutes { found: usize },
}

/// Result type for preparation operations.
pub type Result<T> = std::result::Result<T, PrepareError>;

/// Knobs for one preparation run.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrepareOptions {
    /// Merge all selected routes into a single combined project.
    pub combined: bool,
    /// Report what would be prepared without touching the filesystem.
    /// Versioned names are not resolved in this mode.
    pub dry_run: bool,
}

/// One prepared (or planned, under dry run) project directory.
#[derive(Debug)]
pub struct PreparedProject {
    /// Final directory name, after versioning.
    pub name: String,
    /// Project directory path.
    pub path: PathBuf,
    /// Written manifest path; `None` under dry run.
    pub manifest_path: Option<PathBuf>,
    /// Member route identifiers.
    pub route_numbers: Vec<String>,
}

/// Prepare output projects for the routes under a DCIM root.
///
/// # Arguments
///
/// * `dcim_dir` - DCIM root to scan
/// * `output_dir` - Base directory for project folders
/// * `gcp_dir` - Directory holding per-route GCP marker files
/// * `mode` - Processing mode (RGB / MS / combined channels)
/// * `selection` - Route identifiers to prepare; `None` prepares all
/// * `options` - Combined/dry-run switches
/// * `config` - Scan configuration
///
/// # Errors
///
/// Fails fast on a missing DCIM or GCP directory. Routes with a missing
/// GCP file are skipped with a warning; if nothing survives validation the
/// run fails with [`PrepareError::NoRoutes`].
pub fn prepare_projects(
    dcim_dir: &Path,
    output_dir: &Path,
    gcp_dir: &Path,
    mode: ScanMode,
    selection: Option<&[String]>,
    options: PrepareOptions,
    config: &PipelineConfig,
) -> Result<Vec<PreparedProject>> {
    let routes = scan_routes(dcim_dir, mode, config)?;

    let selected: Vec<&Route> = match selection {
        Some(numbers) => {
            let (selected, missing) = select_routes(&routes, numbers);
            for number in &missing {
                warn!("Route {} not found under {}", number, dcim_dir.display());
            }
            selected
        }
        None => routes.iter().collect(),
    };

    if selected.is_empty() {
        return Err(PrepareError::NoRoutes);
    }

    let validation = gcp::validate_routes(&selected, gcp_dir, mode)?;
    if validation.valid.is_empty() {
        return Err(PrepareError::NoRoutes);
    }

    let valid_routes: Vec<&Route> = validation.valid.iter().map(|v| v.route).collect();
    diagnose_routes(&valid_routes);

    if options.combined {
        if validation.valid.len() < 2 {
            return Err(PrepareError::NotEnoughRoutes {
                found: validation.valid.len(),
            });
        }
        let project = prepare_one(
            output_dir,
            structure::combined_project_name(
                &valid_routes.iter().map(|r| r.number.clone()).collect::<Vec<_>>(),
                mode,
            ),
            &validation.valid,
            mode,
            options,
            config,
        )?;
        return Ok(vec![project]);
    }

    let mut prepared = Vec::with_capacity(validation.valid.len());
    for validated in &validation.valid {
        let project = prepare_one(
            output_dir,
            structure::route_project_name(&validated.route.number, mode),
            std::slice::from_ref(validated),
            mode,
            options,
            config,
        )?;
        prepared.push(project);
    }
    Ok(prepared)
}

fn prepare_one(
    output_dir: &Path,
    base_name: String,
    members: &[gcp::ValidatedRoute<'_>],
    mode: ScanMode,
    options: PrepareOptions,
    config: &PipelineConfig,
) -> Result<PreparedProject> {
    let route_numbers: Vec<String> = members.iter().map(|v| v.route.number.clone()).collect();

    if options.dry_run {
        info!("Would prepare project {} for route(s) {:?}", base_name, route_numbers);
        return Ok(PreparedProject {
            path: output_dir.join(&base_name),
            name: base_name,
            manifest_path: None,
            route_numbers,
        });
    }

    let (path, name) = structure::create_versioned_dir(output_dir, &base_name)?;

    let manifest = ProjectManifest {
        project: name.clone(),
        mode: mode.tag().to_string(),
        routes: members
            .iter()
            .map(|v| {
                RouteManifest::from_route(
                    v.route,
                    Some(v.gcp_path.clone()),
                    config.scan.include_incomplete,
                )
            })
            .collect(),
    };

    let manifest_path = structure::write_manifest(&path, &manifest)?;
    info!("Prepared project {} ({} route(s))", name, members.len());

    Ok(PreparedProject {
        name,
        path,
        manifest_path: Some(manifest_path),
        route_numbers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::TempDir;

    struct Fixture {
        dcim: TempDir,
        gcp: TempDir,
        output: TempDir,
    }

    fn fixture(route_numbers: &[&str]) -> Fixture {
        let dcim = TempDir::new().unwrap();
        let gcp = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();

        for number in route_numbers {
            let folder = dcim
                .path()
                .join(format!("DJI_202405151200_{}_survey", number));
            fs::create_dir_all(&folder).unwrap();
            File::create(folder.join("DJI_20240515120001_0001_D.JPG")).unwrap();
            File::create(gcp.path().join(format!("gcp_route_{}.xml", number))).unwrap();
        }

        Fixture { dcim, gcp, output }
    }

    fn prepare(
        fix: &Fixture,
        selection: Option<&[String]>,
        options: PrepareOptions,
    ) -> Result<Vec<PreparedProject>> {
        prepare_projects(
            fix.dcim.path(),
            fix.output.path(),
            fix.gcp.path(),
            ScanMode::Rgb,
            selection,
            options,
            &PipelineConfig::default(),
        )
    }

    #[test]
    fn test_prepare_all_routes() {
        let fix = fixture(&["001", "002"]);
        let prepared = prepare(&fix, None, PrepareOptions::default()).unwrap();

        assert_eq!(prepared.len(), 2);
        assert_eq!(prepared[0].name, "route_001_RGB");
        assert!(prepared[0].path.join("manifest.yaml").exists());

        let content =
            fs::read_to_string(prepared[0].manifest_path.as_ref().unwrap()).unwrap();
        let manifest: ProjectManifest = serde_yaml::from_str(&content).unwrap();
        assert_eq!(manifest.routes[0].rgb_images.len(), 1);
        assert!(manifest.routes[0].gcp_file.is_some());
    }

    #[test]
    fn test_prepare_skips_routes_without_gcp() {
        let fix = fixture(&["001", "002"]);
        fs::remove_file(fix.gcp.path().join("gcp_route_002.xml")).unwrap();

        let prepared = prepare(&fix, None, PrepareOptions::default()).unwrap();
        assert_eq!(prepared.len(), 1);
        assert_eq!(prepared[0].route_numbers, vec!["001".to_string()]);
    }

    #[test]
    fn test_prepare_fails_when_nothing_validates() {
        let fix = fixture(&["001"]);
        fs::remove_file(fix.gcp.path().join("gcp_route_001.xml")).unwrap();

        let result = prepare(&fix, None, PrepareOptions::default());
        assert!(matches!(result, Err(PrepareError::NoRoutes)));
    }

    #[test]
    fn test_combined_requires_two_routes() {
        let fix = fixture(&["001"]);
        let result = prepare(
            &fix,
            None,
            PrepareOptions {
                combined: true,
                dry_run: false,
            },
        );
        assert!(matches!(
            result,
            Err(PrepareError::NotEnoughRoutes { found: 1 })
        ));
    }

    #[test]
    fn test_combined_builds_single_project() {
        let fix = fixture(&["001", "003"]);
        let prepared = prepare(
            &fix,
            None,
            PrepareOptions {
                combined: true,
                dry_run: false,
            },
        )
        .unwrap();

        assert_eq!(prepared.len(), 1);
        assert_eq!(prepared[0].name, "combined_routes_001_003_RGB");
        assert_eq!(prepared[0].route_numbers.len(), 2);
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let fix = fixture(&["001"]);
        let prepared = prepare(
            &fix,
            None,
            PrepareOptions {
                combined: false,
                dry_run: true,
            },
        )
        .unwrap();

        assert_eq!(prepared.len(), 1);
        assert!(prepared[0].manifest_path.is_none());
        assert!(!prepared[0].path.exists());
    }

    #[test]
    fn test_selection_prepares_requested_routes_only() {
        let fix = fixture(&["001", "002", "003"]);
        let selection = vec!["003".to_string(), "001".to_string()];
        let prepared = prepare(&fix, Some(&selection), PrepareOptions::default()).unwrap();

        let names: Vec<&str> = prepared.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["route_003_RGB", "route_001_RGB"]);
    }

    #[test]
    fn test_repeat_prepare_versions_directories() {
        let fix = fixture(&["001"]);
        prepare(&fix, None, PrepareOptions::default()).unwrap();
        let second = prepare(&fix, None, PrepareOptions::default()).unwrap();

        assert_eq!(second[0].name, "route_001_RGB_v2");
    }
}
