use crate::corner_extractor::CornerPoint;
use crate::feature_matcher::Match;
use crate::photo::Photo;
use crate::translation_estimator::TranslationOffset;

/// Hooks called by [crate::stitch_pipeline::StitchPipeline] after each stage finishes.
///
/// Observers only get shared references: they can record or draw what they see, but nothing
/// they do flows back into the pipeline. Every hook defaults to doing nothing.
pub trait StageObserver {
    /// Called once per input photo, `photo_index` being 0 or 1.
    fn corners_extracted(&mut self, _photo_index: usize, _photo: &Photo, _corners: &[CornerPoint]) {}

    fn matches_confirmed(
        &mut self,
        _photos: [&Photo; 2],
        _corners: [&[CornerPoint]; 2],
        _matches: &[Match],
    ) {
    }

    fn offset_estimated(&mut self, _offset: &TranslationOffset) {}

    fn canvas_composited(&mut self, _canvas: &Photo) {}
}

/// An observer that ignores every stage.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl StageObserver for NoopObserver {}
