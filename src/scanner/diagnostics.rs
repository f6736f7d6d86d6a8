//! Dataset compatibility checks before multi-route processing.

use chrono::NaiveDate;
use log::warn;

use crate::scanner::routes::Route;

/// Aggregated health report over a set of routes.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    /// Total RGB frames across all routes.
    pub total_rgb: usize,
    /// Total multispectral band files across all routes.
    pub total_ms: usize,
    /// Complete multi-band captures across all routes.
    pub total_complete: usize,
    /// Incomplete multi-band captures across all routes.
    pub total_incomplete: usize,
    /// Unrecognized files across all routes.
    pub total_unrecognized: usize,
    /// Distinct flight dates, sorted.
    pub capture_dates: Vec<NaiveDate>,
}

impl Diagnostics {
    /// True when the routes span more than one flight date. Mixing dates
    /// tends to break photo matching downstream.
    pub fn mixed_dates(&self) -> bool {
        self.capture_dates.len() > 1
    }
}

/// Summarize a set of routes and warn about cross-route inconsistencies.
pub fn diagnose_routes(routes: &[&Route]) -> Diagnostics {
    let mut capture_dates: Vec<NaiveDate> = routes.iter().map(|r| r.capture_date).collect();
    capture_dates.sort();
    capture_dates.dedup();

    let report = Diagnostics {
        total_rgb: routes.iter().map(|r| r.rgb_files.len()).sum(),
        total_ms: routes.iter().map(|r| r.ms_file_count()).sum(),
        total_complete: routes.iter().map(|r| r.complete_captures()).sum(),
        total_incomplete: routes.iter().map(|r| r.incomplete_captures()).sum(),
        total_unrecognized: routes.iter().map(|r| r.unrecognized.len()).sum(),
        capture_dates,
    };

    if report.mixed_dates() {
        warn!(
            "Routes span {} flight dates; photo matching across dates may fail",
            report.capture_dates.len()
        );
    }

    for route in routes {
        if route.incomplete_captures() > 0 {
            warn!(
                "Route {}: {} incomplete multi-band capture(s)",
                route.number,
                route.incomplete_captures()
            );
        }
    }

    report
}
