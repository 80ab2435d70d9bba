use tracing::info;

use crate::config::StitchConfig;
use crate::corner_extractor::{CornerExtractor, CornerPoint};
use crate::cornerness::CornernessDetector;
use crate::compositor;
use crate::error::Result;
use crate::feature_matcher::{FeatureMatcher, Match};
use crate::photo::Photo;
use crate::stage_observer::StageObserver;
use crate::translation_estimator::{self, TranslationOffset};

/// Everything the pipeline produced for one pair of photos.
#[derive(Debug, Clone)]
pub struct StitchResult {
    /// Corners of the first and second photo.
    pub corners: [Vec<CornerPoint>; 2],
    /// Mutually confirmed matches, indexing into `corners`.
    pub matches: Vec<Match>,
    pub offset: TranslationOffset,
    pub canvas: Photo,
}

/// Runs the whole two-photo stitching workflow:
///
/// 1. **Corner extraction** on each photo.
/// 2. **Patch matching** with mutual confirmation.
/// 3. **Offset estimation** from the confirmed matches.
/// 4. **Compositing** both photos onto one canvas.
///
/// Stages run strictly one after another; the first failure stops the run.
pub struct StitchPipeline {
    config: StitchConfig,
    extractor: CornerExtractor,
}

impl StitchPipeline {
    /// Builds a pipeline using the Harris detector described by `config`.
    ///
    /// # Errors
    /// Returns [crate::StitchError::InvalidConfig] if `config` does not validate.
    pub fn new(config: StitchConfig) -> Result<Self> {
        config.validate()?;
        Ok(StitchPipeline {
            extractor: CornerExtractor::new(&config.corners)?,
            config,
        })
    }

    /// Builds a pipeline around a custom cornerness detector. The Harris parameters of
    /// `config` are ignored.
    pub fn with_detector(config: StitchConfig, detector: Box<dyn CornernessDetector>) -> Result<Self> {
        config.validate()?;
        Ok(StitchPipeline {
            extractor: CornerExtractor::with_detector(detector, config.corners.threshold),
            config,
        })
    }

    pub fn config(&self) -> &StitchConfig {
        &self.config
    }

    /// Stitches `photo_a` (left/top) and `photo_b` (right/bottom), reporting each stage to
    /// `observer`.
    pub fn run(
        &self,
        photo_a: &Photo,
        photo_b: &Photo,
        observer: &mut dyn StageObserver,
    ) -> Result<StitchResult> {
        let corners_a = self.extractor.extract(photo_a);
        info!("{} corners found in the first photo", corners_a.len());
        observer.corners_extracted(0, photo_a, &corners_a);

        let corners_b = self.extractor.extract(photo_b);
        info!("{} corners found in the second photo", corners_b.len());
        observer.corners_extracted(1, photo_b, &corners_b);

        let matcher = FeatureMatcher::new(self.config.matching);
        let matches = matcher.match_pair([photo_a, photo_b], [&corners_a, &corners_b])?;
        info!(
            "{} matches confirmed after {} patch comparisons",
            matches.len(),
            matcher.get_total_comparisons()
        );
        observer.matches_confirmed([photo_a, photo_b], [&corners_a, &corners_b], &matches);

        let offset =
            translation_estimator::estimate_offset(&matches, [&corners_a, &corners_b], photo_a.width)?;
        info!("estimated offset dx={} dy={}", offset.dx, offset.dy);
        observer.offset_estimated(&offset);

        let canvas = compositor::stitch(photo_a, photo_b, offset)?;
        info!("stitched canvas is {}x{}", canvas.width, canvas.height);
        observer.canvas_composited(&canvas);

        Ok(StitchResult {
            corners: [corners_a, corners_b],
            matches,
            offset,
            canvas,
        })
    }
}
