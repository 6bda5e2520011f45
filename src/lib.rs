//! # maskscore - overlap scoring for hand-drawn outlines
//!
//! Compares a trainee's outline (an [`AnnotationLayer`] captured from a
//! drawing canvas) against an expert [`ReferenceMask`] and reports the Dice
//! similarity coefficient.
//!
//! ## Normalization
//!
//! - Colour references are reduced to luminance (BT.601 by default).
//! - Both layers are thresholded at `value > 0`.
//! - Differently sized inputs are rejected, unless the config asks for the
//!   annotation to be resampled onto the reference grid (before
//!   thresholding).
//! - `dice = 2|A∩R| / (|A| + |R| + 1e-7)`, so two empty masks score 0.0.
//!
//! ## Quick Start
//!
//! ```rust
//! use maskscore::{AnnotationLayer, MaskOverlapScorer, ReferenceMask};
//!
//! let mut outline = AnnotationLayer::blank(10, 10);
//! outline.fill_rect(0, 0, 4, 4, 255.0);
//! let mut truth = AnnotationLayer::blank(10, 10);
//! truth.fill_rect(0, 0, 2, 2, 255.0);
//!
//! let scorer = MaskOverlapScorer::default();
//! let dice = scorer.score(&outline, &ReferenceMask::from(truth))?;
//! assert!((dice - 0.4).abs() < 1e-6);
//! # Ok::<(), maskscore::ScoreError>(())
//! ```

// Core modules
mod error;
mod image_impl;
mod preprocess;
mod raster;
mod scorer;
mod session;
mod types;

// FFI module for C bindings
#[cfg(feature = "ffi")]
pub mod ffi;

// Public API exports
pub use crate::error::{Result, ScoreError};
pub use crate::image_impl::{annotation_from_image, imread, overlay_image, reference_from_image};
pub use crate::preprocess::{resize, BinaryMask, MaskPreProcess};
pub use crate::raster::{AnnotationLayer, ChannelLayout, ReferenceMask};
pub use crate::scorer::{dice_coefficient, MaskOverlapScorer, OverlapReport};
pub use crate::session::{Case, Event, Phase, TutorSession, Verdict};
pub use crate::types::{
    LuminanceWeights, ResizeFilter, ScoreConfig, SizePolicy, CANVAS_SIDE, DEFAULT_EPSILON,
};

/// Dice score under the default (reject-on-mismatch) configuration.
pub fn score(annotation: &AnnotationLayer, reference: &ReferenceMask) -> Result<f64> {
    MaskOverlapScorer::default().score(annotation, reference)
}

/// Decodes both files and scores them with `config`.
pub fn score_files<P: AsRef<std::path::Path>>(
    annotation_path: P,
    reference_path: P,
    config: ScoreConfig,
) -> Result<OverlapReport> {
    let scorer = MaskOverlapScorer::new(config)?;
    let annotation = annotation_from_image(&imread(annotation_path)?)?;
    let reference = reference_from_image(&imread(reference_path)?)?;
    scorer.report(&annotation, &reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgba, RgbaImage};

    #[test]
    fn test_score_files_png_pair() {
        let dir = std::env::temp_dir();
        let ann_path = dir.join(format!("maskscore_ann_{}.png", std::process::id()));
        let ref_path = dir.join(format!("maskscore_ref_{}.png", std::process::id()));

        let mut ann = RgbaImage::new(10, 10);
        let mut gt = GrayImage::new(10, 10);
        for y in 0..4 {
            for x in 0..4 {
                ann.put_pixel(x, y, Rgba([255, 255, 0, 255]));
            }
        }
        for y in 1..3 {
            for x in 1..3 {
                gt.put_pixel(x, y, Luma([255]));
            }
        }
        ann.save(&ann_path).unwrap();
        gt.save(&ref_path).unwrap();

        let report = score_files(&ann_path, &ref_path, ScoreConfig::default());
        let _ = std::fs::remove_file(&ann_path);
        let _ = std::fs::remove_file(&ref_path);

        let report = report.unwrap();
        assert_eq!(report.intersection, 4);
        assert!((report.dice - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_score_files_missing_image() {
        let missing = std::env::temp_dir().join("maskscore_does_not_exist.png");
        let err = score_files(&missing, &missing, ScoreConfig::default()).unwrap_err();
        assert!(matches!(err, ScoreError::Image(_) | ScoreError::Io(_)));
    }
}
