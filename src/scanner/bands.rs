//! Filename classification and multi-band capture grouping.
//!
//! Capture files follow a fixed naming grammar:
//! - RGB frames: `DJI_<YYYYMMDDHHMMSS>_<index>_D.JPG`
//! - Spectral bands: `DJI_<YYYYMMDDHHMMSS>_<index>_MS_<BAND>.TIF`
//!
//! Files that fail the grammar are excluded from classification and
//! reported as unrecognized by the route scanner.

use chrono::{Duration, NaiveDateTime};
use log::warn;
use regex::Regex;

use crate::config::NamingConfig;
use crate::core::capture::{Band, CaptureFile, Channel, MultiBandCapture};

/// Timestamp format embedded in capture filenames (14 digits).
const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Compiled filename patterns for one scan invocation.
pub struct FilePatterns {
    rgb: Regex,
    ms: Regex,
}

impl FilePatterns {
    /// Compile the capture filename patterns from the naming configuration.
    ///
    /// The configured RGB marker and extensions are escaped before they are
    /// embedded, so compilation cannot fail on user input.
    pub fn compile(naming: &NamingConfig) -> Self {
        let rgb = Regex::new(&format!(
            r"(?i)^DJI_(\d{{14}})_(\d+){}\.{}$",
            regex::escape(&naming.rgb_marker),
            regex::escape(&naming.rgb_extension),
        ))
        .unwrap();

        let ms = Regex::new(&format!(
            r"(?i)^DJI_(\d{{14}})_(\d+){}([A-Za-z]+)\.{}$",
            regex::escape(&naming.ms_marker),
            regex::escape(&naming.ms_extension),
        ))
        .unwrap();

        Self { rgb, ms }
    }
}

/// Outcome of parsing a single capture filename.
#[derive(Debug, Clone)]
pub struct ParsedName {
    pub timestamp: NaiveDateTime,
    pub index: u32,
    pub channel: Channel,
}

/// Classify a filename against the capture grammar.
///
/// Returns `None` for files outside the grammar: wrong prefix or extension,
/// an unknown band token, or an impossible timestamp (e.g. month 13).
pub fn classify_file_name(name: &str, patterns: &FilePatterns) -> Option<ParsedName> {
    if let Some(caps) = patterns.rgb.captures(name) {
        let timestamp = parse_timestamp(caps.get(1)?.as_str())?;
        let index: u32 = caps.get(2)?.as_str().parse().ok()?;
        return Some(ParsedName {
            timestamp,
            index,
            channel: Channel::Rgb,
        });
    }

    if let Some(caps) = patterns.ms.captures(name) {
        let timestamp = parse_timestamp(caps.get(1)?.as_str())?;
        let index: u32 = caps.get(2)?.as_str().parse().ok()?;
        let band = Band::from_token(caps.get(3)?.as_str())?;
        return Some(ParsedName {
            timestamp,
            index,
            channel: Channel::Multispectral(band),
        });
    }

    None
}

fn parse_timestamp(digits: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(digits, FILE_TIMESTAMP_FORMAT).ok()
}

/// Group band files of one route into synchronized multi-band captures.
///
/// Files are keyed by image index; within one index, member timestamps must
/// fall within `tolerance` of the first file's timestamp, otherwise a new
/// capture is started. With the default zero tolerance this reduces to
/// exact timestamp equality, matching how the capture firmware stamps all
/// four bands of one exposure.
///
/// Incomplete captures (fewer than four bands) are returned and flagged via
/// [`MultiBandCapture::missing_bands`], never dropped. The output is ordered
/// by timestamp, then image index.
pub fn group_band_captures(files: &[CaptureFile], tolerance: Duration) -> Vec<MultiBandCapture> {
    let mut band_files: Vec<&CaptureFile> = files
        .iter()
        .filter(|f| matches!(f.channel, Channel::Multispectral(_)))
        .collect();
    band_files.sort_by(|a, b| (a.index, a.timestamp).cmp(&(b.index, b.timestamp)));

    let mut captures: Vec<MultiBandCapture> = Vec::new();

    for file in band_files {
        let band = match file.channel {
            Channel::Multispectral(band) => band,
            Channel::Rgb => continue,
        };

        let position = captures.iter().position(|c| {
            c.index == file.index && (file.timestamp - c.timestamp).abs() <= tolerance
        });

        let capture = match position {
            Some(i) => &mut captures[i],
            None => {
                captures.push(MultiBandCapture::new(file.timestamp, file.index));
                captures.last_mut().unwrap()
            }
        };

        if let Some(previous) = capture.insert(band, file.path.clone()) {
            warn!(
                "Duplicate {} band for capture {} at {}: replacing {}",
                band.name(),
                file.index,
                file.timestamp,
                previous.display()
            );
        }
    }

    captures.sort_by(|a, b| (a.timestamp, a.index).cmp(&(b.timestamp, b.index)));
    captures
}

/// Count band files per role, in canonical band order.
pub fn band_distribution(files: &[CaptureFile]) -> [usize; 4] {
    let mut counts = [0usize; 4];
    for file in files {
        if let Channel::Multispectral(band) = file.channel {
            counts[band.index()] += 1;
        }
    }
    counts
}

/// Format a band distribution for summaries, e.g. `G=12, NIR=12, R=12, RE=11`.
pub fn format_distribution(counts: &[usize; 4]) -> String {
    Band::ALL
        .iter()
        .map(|b| format!("{}={}", b.token(), counts[b.index()]))
        .collect::<Vec<_>>()
        .join(", ")
}
