//! Command-line interface for the survey pipeline.

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::PathBuf;
use std::time::Instant;

use crate::project::prepare::{prepare_projects, PrepareOptions};
use crate::project::{gcp, structure};
use crate::scanner::bands::format_distribution;
use crate::scanner::diagnostics::diagnose_routes;
use crate::scanner::routes::{scan_routes, select_routes, Route, ScanMode};
use crate::PipelineConfig;

#[derive(Parser)]
#[command(name = "survey-pipeline")]
#[command(about = "Drone survey DCIM scanner and project preparer", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Processing mode selecting which capture channels a route must carry.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    /// RGB frames only
    Rgb,
    /// Multispectral band captures only
    Ms,
    /// Both RGB and multispectral imagery
    Combined,
}

impl From<ModeArg> for ScanMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Rgb => ScanMode::Rgb,
            ModeArg::Ms => ScanMode::Multispectral,
            ModeArg::Combined => ScanMode::Combined,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List routes found under a DCIM directory
    Scan {
        /// DCIM directory containing DJI route folders
        dcim_dir: PathBuf,
        /// Processing mode
        #[arg(short, long, value_enum, default_value = "rgb")]
        mode: ModeArg,
    },

    /// Validate routes against their GCP marker files
    Validate {
        /// DCIM directory containing DJI route folders
        dcim_dir: PathBuf,
        /// Directory holding per-route GCP XML files
        #[arg(short, long)]
        gcp_dir: PathBuf,
        /// Processing mode
        #[arg(short, long, value_enum, default_value = "rgb")]
        mode: ModeArg,
        /// Route identifiers to validate (all when omitted)
        #[arg(short, long)]
        routes: Vec<String>,
    },

    /// Create versioned project directories with job manifests
    Prepare {
        /// DCIM directory containing DJI route folders
        dcim_dir: PathBuf,
        /// Base directory for prepared project folders
        #[arg(short, long)]
        output_dir: PathBuf,
        /// Directory holding per-route GCP XML files
        #[arg(short, long)]
        gcp_dir: PathBuf,
        /// Processing mode
        #[arg(short, long, value_enum, default_value = "rgb")]
        mode: ModeArg,
        /// Route identifiers to prepare (all when omitted)
        #[arg(short, long)]
        routes: Vec<String>,
        /// Merge all selected routes into one combined project
        #[arg(long)]
        combined: bool,
        /// Preview changes without creating directories or manifests
        #[arg(long)]
        dry_run: bool,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<62} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.len() > 39 {
            format!("{}...", &value[..36])
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<39} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    // Load config
    let config = match &cli.config {
        Some(path) => match PipelineConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}, using defaults",
                    path.display(),
                    e
                );
                PipelineConfig::default()
            }
        },
        None => PipelineConfig::default(),
    };

    // Dispatch to subcommands
    match cli.command {
        Commands::Scan { dcim_dir, mode } => {
            cmd_scan(&dcim_dir, mode.into(), &config);
        }
        Commands::Validate {
            dcim_dir,
            gcp_dir,
            mode,
            routes,
        } => {
            cmd_validate(&dcim_dir, &gcp_dir, mode.into(), &routes, &config);
        }
        Commands::Prepare {
            dcim_dir,
            output_dir,
            gcp_dir,
            mode,
            routes,
            combined,
            dry_run,
        } => {
            cmd_prepare(
                &dcim_dir,
                &output_dir,
                &gcp_dir,
                mode.into(),
                &routes,
                combined,
                dry_run,
                &config,
            );
        }
    }
}

fn print_route_line(route: &Route, mode: ScanMode) {
    match mode {
        ScanMode::Rgb => {
            println!(
                "  Route {}: {} RGB frames ({})",
                route.number,
                route.rgb_files.len(),
                route.size_category()
            );
        }
        ScanMode::Multispectral => {
            println!(
                "  Route {}: {} complete + {} incomplete MS captures ({})",
                route.number,
                route.complete_captures(),
                route.incomplete_captures(),
                route.size_category()
            );
            println!(
                "    Band counts: {}",
                format_distribution(&route.band_counts)
            );
        }
        ScanMode::Combined => {
            println!(
                "  Route {}: {} RGB + {} MS = {} images ({})",
                route.number,
                route.rgb_files.len(),
                route.ms_file_count(),
                route.total_images(),
                route.size_category()
            );
        }
    }
    if !route.unrecognized.is_empty() {
        println!("    Unrecognized files: {}", route.unrecognized.len());
    }
}

fn cmd_scan(dcim_dir: &PathBuf, mode: ScanMode, config: &PipelineConfig) {
    let start = Instant::now();

    let spinner = create_spinner("Scanning DCIM directory for route folders...");
    let result = scan_routes(dcim_dir, mode, config);
    spinner.finish_and_clear();

    let routes = match result {
        Ok(routes) => routes,
        Err(e) => {
            error!("Scan failed: {}", e);
            std::process::exit(1);
        }
    };

    if routes.is_empty() {
        println!("No {} routes found in {}", mode.tag(), dcim_dir.display());
        println!("Expected folder naming pattern: DJI_YYYYMMDDHHMM_###_*");
        return;
    }

    println!("Available {} routes in: {}", mode.tag(), dcim_dir.display());
    for route in &routes {
        print_route_line(route, mode);
    }

    let total_complete: usize = routes.iter().map(|r| r.complete_captures()).sum();
    let total_rgb: usize = routes.iter().map(|r| r.rgb_files.len()).sum();

    print_summary(
        "Scan Complete",
        &[
            ("Directory", dcim_dir.display().to_string()),
            ("Mode", mode.tag().to_string()),
            ("Routes", routes.len().to_string()),
            ("RGB frames", total_rgb.to_string()),
            ("Complete captures", total_complete.to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );
}

fn cmd_validate(
    dcim_dir: &PathBuf,
    gcp_dir: &PathBuf,
    mode: ScanMode,
    route_numbers: &[String],
    config: &PipelineConfig,
) {
    let start = Instant::now();

    let spinner = create_spinner("Scanning and validating routes...");
    let routes = match scan_routes(dcim_dir, mode, config) {
        Ok(routes) => routes,
        Err(e) => {
            spinner.finish_and_clear();
            error!("Scan failed: {}", e);
            std::process::exit(1);
        }
    };

    let selected: Vec<&Route> = if route_numbers.is_empty() {
        routes.iter().collect()
    } else {
        let (selected, missing) = select_routes(&routes, route_numbers);
        for number in &missing {
            warn!("Route {} not found!", number);
        }
        selected
    };

    let validation = match gcp::validate_routes(&selected, gcp_dir, mode) {
        Ok(validation) => validation,
        Err(e) => {
            spinner.finish_and_clear();
            error!("GCP validation failed: {}", e);
            std::process::exit(1);
        }
    };

    let valid_routes: Vec<&Route> = validation.valid.iter().map(|v| v.route).collect();
    let report = diagnose_routes(&valid_routes);
    spinner.finish_and_clear();

    for validated in &validation.valid {
        println!(
            "  Route {}: OK ({})",
            validated.route.number,
            validated.gcp_path.display()
        );
    }
    for (number, path) in &validation.missing {
        println!("  Route {}: missing GCP file {}", number, path.display());
    }

    print_summary(
        "Validation Complete",
        &[
            ("Routes checked", selected.len().to_string()),
            ("Valid", validation.valid.len().to_string()),
            ("Missing GCP", validation.missing.len().to_string()),
            ("RGB frames", report.total_rgb.to_string()),
            ("MS files", report.total_ms.to_string()),
            ("Incomplete captures", report.total_incomplete.to_string()),
            (
                "Flight dates",
                if report.mixed_dates() {
                    format!("{} (MIXED!)", report.capture_dates.len())
                } else {
                    "1".to_string()
                },
            ),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );
}

#[allow(clippy::too_many_arguments)]
fn cmd_prepare(
    dcim_dir: &PathBuf,
    output_dir: &PathBuf,
    gcp_dir: &PathBuf,
    mode: ScanMode,
    route_numbers: &[String],
    combined: bool,
    dry_run: bool,
    config: &PipelineConfig,
) {
    let start = Instant::now();

    if dry_run {
        println!("DRY RUN: No directories or manifests will be created");
    }

    let selection = if route_numbers.is_empty() {
        None
    } else {
        Some(route_numbers)
    };

    let spinner = create_spinner("Preparing project directories...");

    let result = prepare_projects(
        dcim_dir,
        output_dir,
        gcp_dir,
        mode,
        selection,
        PrepareOptions { combined, dry_run },
        config,
    );

    spinner.finish_and_clear();

    match result {
        Ok(prepared) => {
            for project in &prepared {
                match &project.manifest_path {
                    Some(manifest) => {
                        println!("  {} -> {}", project.name, manifest.display());
                    }
                    None => {
                        println!(
                            "  Would prepare {} (routes {:?})",
                            project.name, project.route_numbers
                        );
                    }
                }
            }

            print_summary(
                "Prepare Complete",
                &[
                    ("Output directory", output_dir.display().to_string()),
                    ("Mode", mode.tag().to_string()),
                    ("Projects", prepared.len().to_string()),
                    ("Manifest file", structure::MANIFEST_FILE.to_string()),
                    ("Dry run", dry_run.to_string()),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );
        }
        Err(e) => {
            error!("Prepare failed: {}", e);
            std::process::exit(1);
        }
    }
}
