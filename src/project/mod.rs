//! Output project preparation: GCP validation, versioned directories,
//! and job manifests.

pub mod gcp;
pub mod prepare;
pub mod structure;

pub use gcp::{gcp_file_path, validate_routes, GcpError, Validation};
pub use prepare::{prepare_projects, PrepareError, PrepareOptions, PreparedProject};
pub use structure::{
    combined_project_name, create_versioned_dir, route_project_name, write_manifest,
    ProjectManifest, RouteManifest, StructureError,
};
