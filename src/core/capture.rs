//! Capture data model for drone survey imagery.
//!
//! This module provides the typed representation of discovered files:
//! - Spectral band roles and their fixed filename token vocabulary
//! - Individual capture files (RGB frames or single band exposures)
//! - Synchronized multi-band captures grouped from sibling band files

use std::path::PathBuf;

use chrono::NaiveDateTime;

/// One spectral channel of the multispectral sensor array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Band {
    Green,
    Nir,
    Red,
    RedEdge,
}

impl Band {
    /// All band roles in canonical order (G, NIR, R, RE).
    ///
    /// Manifests and grouped captures list band files in this order so the
    /// downstream reconstruction job sees a stable layout.
    pub const ALL: [Band; 4] = [Band::Green, Band::Nir, Band::Red, Band::RedEdge];

    /// Map a filename band token to its role.
    ///
    /// The vocabulary is fixed: `G`, `NIR`, `R`, `RE` (case-insensitive).
    /// Any other token is not a recognized band.
    pub fn from_token(token: &str) -> Option<Band> {
        match token.to_ascii_uppercase().as_str() {
            "G" => Some(Band::Green),
            "NIR" => Some(Band::Nir),
            "R" => Some(Band::Red),
            "RE" => Some(Band::RedEdge),
            _ => None,
        }
    }

    /// The filename token for this band.
    pub fn token(&self) -> &'static str {
        match self {
            Band::Green => "G",
            Band::Nir => "NIR",
            Band::Red => "R",
            Band::RedEdge => "RE",
        }
    }

    /// Human-readable band name for logs and summaries.
    pub fn name(&self) -> &'static str {
        match self {
            Band::Green => "Green",
            Band::Nir => "NIR",
            Band::Red => "Red",
            Band::RedEdge => "RedEdge",
        }
    }

    /// Position of this band in [`Band::ALL`].
    #[inline]
    pub fn index(&self) -> usize {
        match self {
            Band::Green => 0,
            Band::Nir => 1,
            Band::Red => 2,
            Band::RedEdge => 3,
        }
    }
}

/// Classification of a capture file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Visible-light frame (trailing `_D` marker in the filename).
    Rgb,
    /// Single spectral band of a multispectral exposure.
    Multispectral(Band),
}

/// A single discovered image file. Immutable once built by the scanner.
#[derive(Debug, Clone)]
pub struct CaptureFile {
    /// Absolute path to the file.
    pub path: PathBuf,
    /// Route identifier this file belongs to (e.g. "001").
    pub route: String,
    /// Capture instant parsed from the 14-digit filename timestamp.
    pub timestamp: NaiveDateTime,
    /// Sequential image index from the filename.
    pub index: u32,
    /// RGB frame or spectral band.
    pub channel: Channel,
}

/// A synchronized group of band files treated as one logical exposure.
///
/// Members share an image index and their timestamps fall within the
/// configured tolerance window. A capture missing one or more of the four
/// band roles is kept and flagged, never silently discarded.
#[derive(Debug, Clone)]
pub struct MultiBandCapture {
    /// Capture instant of the first member file.
    pub timestamp: NaiveDateTime,
    /// Image index shared by all member files.
    pub index: u32,
    bands: [Option<PathBuf>; 4],
}

impl MultiBandCapture {
    /// Create an empty capture anchored at the given instant and index.
    pub fn new(timestamp: NaiveDateTime, index: u32) -> Self {
        Self {
            timestamp,
            index,
            bands: [None, None, None, None],
        }
    }

    /// Record the file for a band role. Returns the previous path if the
    /// band was already present (a duplicate exposure).
    pub fn insert(&mut self, band: Band, path: PathBuf) -> Option<PathBuf> {
        self.bands[band.index()].replace(path)
    }

    /// The file registered for a band role, if any.
    pub fn get(&self, band: Band) -> Option<&PathBuf> {
        self.bands[band.index()].as_ref()
    }

    /// Number of band files present.
    pub fn band_count(&self) -> usize {
        self.bands.iter().filter(|b| b.is_some()).count()
    }

    /// True when all four band roles are present.
    pub fn is_complete(&self) -> bool {
        self.bands.iter().all(|b| b.is_some())
    }

    /// Band roles with no file, in canonical order.
    pub fn missing_bands(&self) -> Vec<Band> {
        Band::ALL
            .iter()
            .copied()
            .filter(|b| self.bands[b.index()].is_none())
            .collect()
    }

    /// Member files in canonical band order (G, NIR, R, RE), skipping
    /// missing bands.
    pub fn files(&self) -> Vec<&PathBuf> {
        self.bands.iter().filter_map(|b| b.as_ref()).collect()
    }
}
