//! # PixelStitch Library
//!
//! The `pixelstitch` library aligns two overlapping photos whose relative motion is a pure
//! 2D translation and composites them onto a single canvas. Landmarks are found with a
//! cornerness detector, matched across the photos by comparing pixel patches, and the
//! translation is the difference between the mean positions of the matched landmarks.
//!
//! ## Overview of Modules
//!
//! - **`stitch_pipeline`**: Orchestrates the high-level workflow: corner extraction on both
//!   photos, patch matching, offset estimation and compositing.
//!
//! - **`photo`**: Defines a basic `Photo` struct for storing interleaved 8-bit pixel data
//!   with any number of channels, along with grayscale conversion and pixel copying.
//!
//! - **`cornerness`**: The `CornernessDetector` trait, the `ResponseMap` score grid and the
//!   Harris implementation used by default.
//!
//! - **`corner_extractor`**: Thresholds a normalized cornerness response into a list of
//!   `CornerPoint`s.
//!
//! - **`feature_matcher`**: Compares square patches around corners with a sum of squared
//!   differences and keeps only pairs that choose each other, for two photos or a chain of them.
//!
//! - **`translation_estimator`**: Averages matched corners into a `TranslationOffset`.
//!
//! - **`compositor`**: Computes the canvas layout for an offset, rejects layouts it cannot
//!   represent, and pastes both photos onto the canvas.
//!
//! - **`stage_observer`**: Optional hooks called after each pipeline stage, e.g. to draw
//!   debug overlays.
//!
//! - **`config`**: Tuning parameters for every stage, loadable with `serde`.
//!
//! - **`error`**: The `StitchError` type shared by all stages.

pub mod stitch_pipeline;

pub mod photo;
pub mod cornerness;
pub mod corner_extractor;
pub mod feature_matcher;
pub mod translation_estimator;
pub mod compositor;
pub mod stage_observer;
pub mod config;
pub mod error;

pub use compositor::{stitch, CanvasLayout};
pub use config::{AssociationPolicy, CornerConfig, HarrisParams, MatchConfig, StitchConfig};
pub use corner_extractor::{CornerExtractor, CornerPoint};
pub use cornerness::{CornernessDetector, HarrisDetector, ResponseMap};
pub use error::{Result, StitchError};
pub use feature_matcher::{FeatureMatcher, Match, Track};
pub use photo::Photo;
pub use stage_observer::{NoopObserver, StageObserver};
pub use stitch_pipeline::{StitchPipeline, StitchResult};
pub use translation_estimator::{estimate_offset, TranslationOffset};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
