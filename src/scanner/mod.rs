//! Route and band classification over DCIM capture trees.

pub mod bands;
pub mod diagnostics;
pub mod routes;

// Re-export key types for convenience
pub use bands::{band_distribution, classify_file_name, format_distribution, group_band_captures};
pub use diagnostics::diagnose_routes;
pub use routes::{scan_routes, select_routes, Route, ScanError, ScanMode};
