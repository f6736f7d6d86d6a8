//! Core data types for discovered survey imagery.

pub mod capture;

pub use capture::{Band, CaptureFile, Channel, MultiBandCapture};
