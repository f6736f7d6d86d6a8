//! Route discovery over a DCIM directory tree.
//!
//! Route folders are named `DJI_<timestamp>_<route>_<suffix>` where the
//! timestamp carries 12 or 14 digits and the route identifier is a 3-digit
//! code. Each scan rebuilds all route data from the filesystem; nothing is
//! cached between invocations.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate};
use log::{debug, warn};
use regex::Regex;
use thiserror::Error;

use crate::config::PipelineConfig;
use crate::core::capture::{CaptureFile, Channel, MultiBandCapture};
use crate::scanner::bands::{
    band_distribution, classify_file_name, group_band_captures, FilePatterns,
};

/// Errors that can occur during route scanning.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("DCIM directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for scan operations.
pub type Result<T> = std::result::Result<T, ScanError>;

/// Which capture channels a scan is interested in.
///
/// A route is listed only when it carries imagery for the requested mode;
/// classification itself always records both channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Routes with RGB frames.
    Rgb,
    /// Routes with multispectral captures.
    Multispectral,
    /// Routes carrying both RGB frames and multispectral captures.
    Combined,
}

impl ScanMode {
    /// Short tag used in project folder names.
    pub fn tag(&self) -> &'static str {
        match self {
            ScanMode::Rgb => "RGB",
            ScanMode::Multispectral => "MS",
            ScanMode::Combined => "RGB_MS",
        }
    }
}

/// One logical flight route discovered under the DCIM root.
///
/// Built fresh on every scan and never persisted.
#[derive(Debug, Clone)]
pub struct Route {
    /// 3-digit route identifier from the folder name.
    pub number: String,
    /// Name of the route folder.
    pub folder_name: String,
    /// Absolute path of the route folder.
    pub folder_path: PathBuf,
    /// Flight date from the folder timestamp.
    pub capture_date: NaiveDate,
    /// RGB frames in filename order.
    pub rgb_files: Vec<CaptureFile>,
    /// Multi-band captures, complete and incomplete, in capture order.
    pub captures: Vec<MultiBandCapture>,
    /// Band file counts in canonical band order (G, NIR, R, RE).
    pub band_counts: [usize; 4],
    /// Files in the route folder that failed the naming grammar.
    pub unrecognized: Vec<PathBuf>,
}

impl Route {
    /// Number of multi-band captures with all four bands present.
    pub fn complete_captures(&self) -> usize {
        self.captures.iter().filter(|c| c.is_complete()).count()
    }

    /// Number of multi-band captures missing at least one band.
    pub fn incomplete_captures(&self) -> usize {
        self.captures.len() - self.complete_captures()
    }

    /// Total multispectral band files in the route.
    pub fn ms_file_count(&self) -> usize {
        self.band_counts.iter().sum()
    }

    /// Total recognized image files in the route.
    pub fn total_images(&self) -> usize {
        self.rgb_files.len() + self.ms_file_count()
    }

    /// Rough size bucket for listings: Small < 50 captures, Medium < 100,
    /// Large otherwise.
    pub fn size_category(&self) -> &'static str {
        let captures = self.rgb_files.len().max(self.complete_captures());
        if captures < 50 {
            "Small"
        } else if captures < 100 {
            "Medium"
        } else {
            "Large"
        }
    }

    fn matches_mode(&self, mode: ScanMode) -> bool {
        match mode {
            ScanMode::Rgb => !self.rgb_files.is_empty(),
            ScanMode::Multispectral => !self.captures.is_empty(),
            ScanMode::Combined => !self.rgb_files.is_empty() && !self.captures.is_empty(),
        }
    }
}

/// Scan a DCIM root for route folders and classify their contents.
///
/// The scan is a pure read of filesystem metadata and is deterministic:
/// directory entries are sorted before classification, so rescanning an
/// unmodified tree yields identical results.
///
/// # Arguments
///
/// * `root` - DCIM directory containing route folders
/// * `mode` - Channels a route must carry to be listed
/// * `config` - Naming conventions and grouping tolerance
///
/// # Returns
///
/// Routes ordered by route identifier. An existing root with no matching
/// folders yields an empty vector, not an error.
///
/// # Errors
///
/// Fails fast with [`ScanError::DirectoryNotFound`] when the root is
/// missing, before any classification starts.
pub fn scan_routes(root: &Path, mode: ScanMode, config: &PipelineConfig) -> Result<Vec<Route>> {
    if !root.is_dir() {
        return Err(ScanError::DirectoryNotFound(root.to_path_buf()));
    }

    let folder_pattern = Regex::new(r"^DJI_(\d{12,14})_(\d{3})_.*").unwrap();
    let patterns = FilePatterns::compile(&config.naming);
    let tolerance = Duration::seconds(config.scan.timestamp_tolerance_secs);

    let mut folders: Vec<PathBuf> = fs::read_dir(root)
        .map_err(|e| ScanError::ReadDir {
            path: root.to_path_buf(),
            source: e,
        })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();

    folders.sort();

    let mut routes: Vec<Route> = Vec::new();

    for folder_path in folders {
        let folder_name = match folder_path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };

        let caps = match folder_pattern.captures(&folder_name) {
            Some(caps) => caps,
            None => {
                debug!("Skipping non-route folder: {}", folder_name);
                continue;
            }
        };

        let digits = &caps[1];
        let capture_date = match NaiveDate::parse_from_str(&digits[..8], "%Y%m%d") {
            Ok(date) => date,
            Err(_) => {
                warn!("Route folder has invalid date digits, skipping: {}", folder_name);
                continue;
            }
        };
        let number = caps[2].to_string();

        let route = classify_route_folder(
            &folder_path,
            &folder_name,
            number,
            capture_date,
            &patterns,
            tolerance,
        )?;

        if route.matches_mode(mode) {
            routes.push(route);
        } else {
            debug!(
                "Route {} has no {} imagery, skipping",
                route.number,
                mode.tag()
            );
        }
    }

    routes.sort_by(|a, b| a.number.cmp(&b.number));
    Ok(routes)
}

/// Classify the files of a single route folder.
fn classify_route_folder(
    folder_path: &Path,
    folder_name: &str,
    number: String,
    capture_date: NaiveDate,
    patterns: &FilePatterns,
    tolerance: Duration,
) -> Result<Route> {
    let mut files: Vec<PathBuf> = fs::read_dir(folder_path)
        .map_err(|e| ScanError::ReadDir {
            path: folder_path.to_path_buf(),
            source: e,
        })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();

    files.sort();

    let mut rgb_files: Vec<CaptureFile> = Vec::new();
    let mut band_files: Vec<CaptureFile> = Vec::new();
    let mut unrecognized: Vec<PathBuf> = Vec::new();

    for path in files {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => {
                unrecognized.push(path);
                continue;
            }
        };

        match classify_file_name(name, patterns) {
            Some(parsed) => {
                let capture = CaptureFile {
                    path: path.clone(),
                    route: number.clone(),
                    timestamp: parsed.timestamp,
                    index: parsed.index,
                    channel: parsed.channel,
                };
                match parsed.channel {
                    Channel::Rgb => rgb_files.push(capture),
                    Channel::Multispectral(_) => band_files.push(capture),
                }
            }
            None => unrecognized.push(path),
        }
    }

    let band_counts = band_distribution(&band_files);
    let captures = group_band_captures(&band_files, tolerance);

    if !unrecognized.is_empty() {
        warn!(
            "Route {}: {} unrecognized file(s) in {}",
            number,
            unrecognized.len(),
            folder_name
        );
    }

    Ok(Route {
        number,
        folder_name: folder_name.to_string(),
        folder_path: folder_path.to_path_buf(),
        capture_date,
        rgb_files,
        captures,
        band_counts,
        unrecognized,
    })
}

/// Select routes by identifier, preserving the requested order.
///
/// Returns the matched routes and the identifiers that were not found.
pub fn select_routes<'a>(
    routes: &'a [Route],
    numbers: &[String],
) -> (Vec<&'a Route>, Vec<String>) {
    let mut selected = Vec::new();
    let mut missing = Vec::new();

    for number in numbers {
        match routes.iter().find(|r| &r.number == number) {
            Some(route) => selected.push(route),
            None => missing.push(number.clone()),
        }
    }

    (selected, missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn make_route_folder(root: &Path, name: &str) -> PathBuf {
        let path = root.join(name);
        fs::create_dir_all(&path).unwrap();
        path
    }

    fn touch(dir: &Path, name: &str) {
        File::create(dir.join(name)).unwrap();
    }

    fn config() -> PipelineConfig {
        PipelineConfig::default()
    }

    #[test]
    fn test_missing_root_fails_fast() {
        let result = scan_routes(Path::new("/nonexistent/dcim"), ScanMode::Rgb, &config());
        assert!(matches!(result, Err(ScanError::DirectoryNotFound(_))));
    }

    #[test]
    fn test_empty_root_yields_no_routes() {
        let temp_dir = TempDir::new().unwrap();
        let routes = scan_routes(temp_dir.path(), ScanMode::Rgb, &config()).unwrap();
        assert!(routes.is_empty());
    }

    #[test]
    fn test_single_rgb_file_yields_one_route() {
        let temp_dir = TempDir::new().unwrap();
        let folder = make_route_folder(temp_dir.path(), "DJI_202405151200_001_survey");
        touch(&folder, "DJI_20240515120001_0001_D.JPG");

        let routes = scan_routes(temp_dir.path(), ScanMode::Rgb, &config()).unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].number, "001");
        assert_eq!(routes[0].rgb_files.len(), 1);
        assert_eq!(routes[0].capture_date.to_string(), "2024-05-15");
    }

    #[test]
    fn test_missing_band_is_flagged_not_dropped() {
        let temp_dir = TempDir::new().unwrap();
        let folder = make_route_folder(temp_dir.path(), "DJI_202405151200_002_field");
        touch(&folder, "DJI_20240515120001_0001_MS_G.TIF");
        touch(&folder, "DJI_20240515120001_0001_MS_NIR.TIF");
        touch(&folder, "DJI_20240515120001_0001_MS_R.TIF");

        let routes = scan_routes(temp_dir.path(), ScanMode::Multispectral, &config()).unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].captures.len(), 1);
        assert_eq!(routes[0].complete_captures(), 0);
        assert_eq!(routes[0].incomplete_captures(), 1);
        assert_eq!(
            routes[0].captures[0].missing_bands(),
            vec![crate::core::Band::RedEdge]
        );
    }

    #[test]
    fn test_unrecognized_files_never_classified() {
        let temp_dir = TempDir::new().unwrap();
        let folder = make_route_folder(temp_dir.path(), "DJI_202405151200_003_x");
        touch(&folder, "DJI_20240515120001_0001_D.JPG");
        touch(&folder, "IMG_0001.JPG");
        touch(&folder, "flight_log.txt");

        let routes = scan_routes(temp_dir.path(), ScanMode::Rgb, &config()).unwrap();
        assert_eq!(routes[0].rgb_files.len(), 1);
        assert!(routes[0].captures.is_empty());
        assert_eq!(routes[0].unrecognized.len(), 2);
    }

    #[test]
    fn test_non_route_folders_ignored() {
        let temp_dir = TempDir::new().unwrap();
        make_route_folder(temp_dir.path(), "MISC");
        make_route_folder(temp_dir.path(), "DJI_notadate_001_x");

        let routes = scan_routes(temp_dir.path(), ScanMode::Rgb, &config()).unwrap();
        assert!(routes.is_empty());
    }

    #[test]
    fn test_mode_filters_routes() {
        let temp_dir = TempDir::new().unwrap();
        let rgb_only = make_route_folder(temp_dir.path(), "DJI_202405151200_001_a");
        touch(&rgb_only, "DJI_20240515120001_0001_D.JPG");
        let ms_only = make_route_folder(temp_dir.path(), "DJI_202405151210_002_b");
        touch(&ms_only, "DJI_20240515121001_0001_MS_G.TIF");

        let rgb = scan_routes(temp_dir.path(), ScanMode::Rgb, &config()).unwrap();
        assert_eq!(rgb.len(), 1);
        assert_eq!(rgb[0].number, "001");

        let ms = scan_routes(temp_dir.path(), ScanMode::Multispectral, &config()).unwrap();
        assert_eq!(ms.len(), 1);
        assert_eq!(ms[0].number, "002");

        let combined = scan_routes(temp_dir.path(), ScanMode::Combined, &config()).unwrap();
        assert!(combined.is_empty());
    }

    #[test]
    fn test_scan_is_deterministic() {
        let temp_dir = TempDir::new().unwrap();
        let folder = make_route_folder(temp_dir.path(), "DJI_202405151200_004_z");
        for index in 1..=3 {
            touch(&folder, &format!("DJI_2024051512000{}_000{}_D.JPG", index, index));
            touch(&folder, &format!("DJI_2024051512000{}_000{}_MS_G.TIF", index, index));
        }

        let first = scan_routes(temp_dir.path(), ScanMode::Combined, &config()).unwrap();
        let second = scan_routes(temp_dir.path(), ScanMode::Combined, &config()).unwrap();

        assert_eq!(first.len(), second.len());
        let paths = |routes: &[Route]| -> Vec<PathBuf> {
            routes
                .iter()
                .flat_map(|r| r.rgb_files.iter().map(|f| f.path.clone()))
                .collect()
        };
        assert_eq!(paths(&first), paths(&second));
        assert_eq!(first[0].band_counts, second[0].band_counts);
    }

    #[test]
    fn test_select_routes_reports_missing() {
        let temp_dir = TempDir::new().unwrap();
        let folder = make_route_folder(temp_dir.path(), "DJI_202405151200_001_a");
        touch(&folder, "DJI_20240515120001_0001_D.JPG");

        let routes = scan_routes(temp_dir.path(), ScanMode::Rgb, &config()).unwrap();
        let (selected, missing) =
            select_routes(&routes, &["001".to_string(), "007".to_string()]);

        assert_eq!(selected.len(), 1);
        assert_eq!(missing, vec!["007".to_string()]);
    }
}
