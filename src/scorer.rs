use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::preprocess::{BinaryMask, MaskPreProcess};
use crate::raster::{AnnotationLayer, ReferenceMask};
use crate::types::ScoreConfig;

/// Overlap statistics for one annotation/reference pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlapReport {
    /// Dice similarity coefficient in `[0, 1]`.
    pub dice: f64,
    /// Intersection over union in `[0, 1]`; 0.0 when both masks are empty.
    pub jaccard: f64,
    pub intersection: usize,
    pub annotation_area: usize,
    pub reference_area: usize,
    /// Size of the grid the masks were compared on.
    pub width: usize,
    pub height: usize,
}

impl OverlapReport {
    /// Fails with `DimensionMismatch` unless both masks share one grid.
    pub fn from_masks(
        annotation: &BinaryMask,
        reference: &BinaryMask,
        epsilon: f64,
    ) -> Result<Self> {
        let intersection = annotation.intersection(reference)?;
        let annotation_area = annotation.count();
        let reference_area = reference.count();

        let dice = dice_coefficient(intersection, annotation_area, reference_area, epsilon);
        let union = annotation_area + reference_area - intersection;
        let jaccard = if union == 0 {
            0.0
        } else {
            intersection as f64 / union as f64
        };

        Ok(Self {
            dice,
            jaccard,
            intersection,
            annotation_area,
            reference_area,
            width: reference.width(),
            height: reference.height(),
        })
    }
}

/// `2|A∩B| / (|A| + |B| + epsilon)`, clamped to `[0, 1]`.
///
/// A zero, negative or non-finite denominator yields 0.0.
#[inline]
pub fn dice_coefficient(intersection: usize, area_a: usize, area_b: usize, epsilon: f64) -> f64 {
    let num = 2.0 * intersection as f64;
    let den = area_a as f64 + area_b as f64 + epsilon;
    if !den.is_finite() || den <= 0.0 {
        return 0.0;
    }
    (num / den).clamp(0.0, 1.0)
}

/// Scores a user's outline against a ground-truth mask.
///
/// The scorer holds only its configuration, so one instance can be shared
/// across threads and sessions.
pub struct MaskOverlapScorer {
    cfg: ScoreConfig,
    preprocess: MaskPreProcess,
}

impl MaskOverlapScorer {
    pub fn new(cfg: ScoreConfig) -> Result<Self> {
        cfg.validate()?;
        let preprocess = MaskPreProcess::from_config(&cfg);
        Ok(Self { cfg, preprocess })
    }

    pub fn config(&self) -> &ScoreConfig {
        &self.cfg
    }

    /// Dice similarity coefficient between the two layers.
    pub fn score(&self, annotation: &AnnotationLayer, reference: &ReferenceMask) -> Result<f64> {
        self.report(annotation, reference).map(|r| r.dice)
    }

    pub fn report(
        &self,
        annotation: &AnnotationLayer,
        reference: &ReferenceMask,
    ) -> Result<OverlapReport> {
        let (ann, reference) = self.binarize(annotation, reference)?;
        let report = OverlapReport::from_masks(&ann, &reference, self.cfg.epsilon)?;
        log::debug!(
            "dice={:.4} intersection={} |A|={} |R|={} on {}x{}",
            report.dice,
            report.intersection,
            report.annotation_area,
            report.reference_area,
            report.width,
            report.height
        );
        Ok(report)
    }

    /// The normalized masks the score is computed from.
    pub fn binarize(
        &self,
        annotation: &AnnotationLayer,
        reference: &ReferenceMask,
    ) -> Result<(BinaryMask, BinaryMask)> {
        self.preprocess.run(annotation, reference)
    }
}

impl Default for MaskOverlapScorer {
    fn default() -> Self {
        let cfg = ScoreConfig::default();
        let preprocess = MaskPreProcess::from_config(&cfg);
        Self { cfg, preprocess }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScoreError;
    use crate::raster::ChannelLayout;
    use crate::types::{SizePolicy, DEFAULT_EPSILON};
    use ndarray::Array2;

    fn block(w: usize, h: usize, x: usize, y: usize, bw: usize, bh: usize) -> AnnotationLayer {
        let mut layer = AnnotationLayer::blank(w, h);
        layer.fill_rect(x, y, bw, bh, 255.0);
        layer
    }

    #[test]
    fn test_dice_coefficient_formula() {
        assert!((dice_coefficient(4, 16, 4, 1e-7) - 0.4).abs() < 1e-6);
        assert_eq!(dice_coefficient(0, 0, 0, 1e-7), 0.0);
        assert_eq!(dice_coefficient(0, 5, 7, 1e-7), 0.0);
    }

    #[test]
    fn test_dice_coefficient_degenerate_epsilon() {
        assert_eq!(dice_coefficient(0, 0, 0, 0.0), 0.0);
        assert_eq!(dice_coefficient(0, 0, 0, -1.0), 0.0);
        assert_eq!(dice_coefficient(0, 0, 0, f64::NAN), 0.0);
        assert!((dice_coefficient(3, 3, 3, 0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_from_masks_rejects_mismatched_grids() {
        let tall = BinaryMask::from_values(Array2::<f32>::ones((4, 1)).view());
        let square = BinaryMask::from_values(Array2::<f32>::ones((2, 2)).view());
        assert!(matches!(
            OverlapReport::from_masks(&tall, &square, DEFAULT_EPSILON),
            Err(ScoreError::DimensionMismatch { annotation: (1, 4), reference: (2, 2) })
        ));
        let same = OverlapReport::from_masks(&square, &square, DEFAULT_EPSILON).unwrap();
        assert_eq!(same.intersection, 4);
    }

    #[test]
    fn test_partial_overlap_report() {
        let scorer = MaskOverlapScorer::default();
        let a = block(10, 10, 0, 0, 4, 4);
        let b: ReferenceMask = block(10, 10, 2, 2, 4, 4).into();
        let report = scorer.report(&a, &b).unwrap();
        assert_eq!(report.intersection, 4);
        assert_eq!(report.annotation_area, 16);
        assert_eq!(report.reference_area, 16);
        assert!((report.dice - 8.0 / 32.0).abs() < 1e-6);
        assert!((report.jaccard - 4.0 / 28.0).abs() < 1e-9);
        assert_eq!((report.width, report.height), (10, 10));
    }

    #[test]
    fn test_empty_masks_have_zero_jaccard() {
        let scorer = MaskOverlapScorer::default();
        let a = AnnotationLayer::blank(3, 3);
        let b = ReferenceMask::gray(Array2::zeros((3, 3)));
        let report = scorer.report(&a, &b).unwrap();
        assert_eq!(report.dice, 0.0);
        assert_eq!(report.jaccard, 0.0);
    }

    #[test]
    fn test_colour_reference_is_reduced() {
        // red-only ground truth still has positive luminance
        let scorer = MaskOverlapScorer::default();
        let a = block(2, 1, 0, 0, 1, 1);
        let reference =
            ReferenceMask::from_u8(2, 1, ChannelLayout::Rgb, &[200, 0, 0, 0, 0, 0]).unwrap();
        let s = scorer.score(&a, &reference).unwrap();
        assert!((s - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_new_validates_config() {
        let cfg = ScoreConfig {
            epsilon: 0.0,
            ..ScoreConfig::default()
        };
        assert!(matches!(
            MaskOverlapScorer::new(cfg),
            Err(ScoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_resize_policy_scores_canvas_annotation() {
        let scorer = MaskOverlapScorer::new(ScoreConfig::canvas()).unwrap();
        assert_eq!(scorer.config().size_policy, SizePolicy::ResizeAnnotation);
        // 4x4 annotation with top-left quadrant marked, 8x8 reference with the same quadrant
        let a = block(4, 4, 0, 0, 2, 2);
        let b: ReferenceMask = block(8, 8, 0, 0, 4, 4).into();
        let s = scorer.score(&a, &b).unwrap();
        assert!((s - 1.0).abs() < 1e-6);
    }
}
