use ndarray::{Array2, ArrayView2, ArrayView3, Axis};

use crate::error::{Result, ScoreError};
use crate::raster::{AnnotationLayer, ReferenceMask};
use crate::types::{LuminanceWeights, ResizeFilter, ScoreConfig, SizePolicy};

/// Thresholded raster: `true` where the source value was strictly positive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryMask {
    bits: Array2<bool>,
}

impl BinaryMask {
    pub fn from_values(values: ArrayView2<'_, f32>) -> Self {
        Self {
            bits: values.mapv(|v| v > 0.0),
        }
    }

    pub fn view(&self) -> ArrayView2<'_, bool> {
        self.bits.view()
    }

    pub fn width(&self) -> usize {
        self.bits.ncols()
    }

    pub fn height(&self) -> usize {
        self.bits.nrows()
    }

    /// (width, height)
    pub fn dims(&self) -> (usize, usize) {
        (self.width(), self.height())
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Pixels positive in both masks.
    pub fn intersection(&self, other: &BinaryMask) -> Result<usize> {
        if self.dims() != other.dims() {
            return Err(ScoreError::DimensionMismatch {
                annotation: self.dims(),
                reference: other.dims(),
            });
        }
        Ok(self
            .bits
            .iter()
            .zip(other.bits.iter())
            .filter(|&(&a, &b)| a && b)
            .count())
    }
}

fn check_values<'a, I>(what: &str, (w, h): (usize, usize), values: I) -> Result<()>
where
    I: IntoIterator<Item = &'a f32>,
{
    if w == 0 || h == 0 {
        return Err(ScoreError::invalid(format!("{what} is empty ({w}x{h})")));
    }
    for &v in values {
        if !v.is_finite() {
            return Err(ScoreError::invalid(format!("{what} contains non-finite values")));
        }
        if v < 0.0 {
            return Err(ScoreError::invalid(format!("{what} contains negative values")));
        }
    }
    Ok(())
}

/// Collapses `[y, x, channel]` pixels to one luminance value per pixel.
/// Alpha channels are ignored.
pub fn reduce_to_luminance(
    pixels: ArrayView3<'_, f32>,
    has_color: bool,
    weights: LuminanceWeights,
) -> Array2<f32> {
    if has_color {
        pixels.map_axis(Axis(2), |px| weights.luma(px[0], px[1], px[2]))
    } else {
        pixels.index_axis(Axis(2), 0).to_owned()
    }
}

/// Resamples `src` to `width` x `height` using pixel-centre alignment.
pub fn resize(
    src: ArrayView2<'_, f32>,
    width: usize,
    height: usize,
    filter: ResizeFilter,
) -> Result<Array2<f32>> {
    let (src_h, src_w) = src.dim();
    if src_w == 0 || src_h == 0 || width == 0 || height == 0 {
        return Err(ScoreError::invalid(format!(
            "cannot resize {src_w}x{src_h} to {width}x{height}"
        )));
    }
    if (src_w, src_h) == (width, height) {
        return Ok(src.to_owned());
    }
    let sx = src_w as f64 / width as f64;
    let sy = src_h as f64 / height as f64;

    let out = match filter {
        ResizeFilter::Nearest => Array2::from_shape_fn((height, width), |(y, x)| {
            let src_x = (((x as f64 + 0.5) * sx) as usize).min(src_w - 1);
            let src_y = (((y as f64 + 0.5) * sy) as usize).min(src_h - 1);
            src[[src_y, src_x]]
        }),
        ResizeFilter::Bilinear => Array2::from_shape_fn((height, width), |(y, x)| {
            let fx_src = ((x as f64 + 0.5) * sx - 0.5).clamp(0.0, (src_w - 1) as f64);
            let fy_src = ((y as f64 + 0.5) * sy - 0.5).clamp(0.0, (src_h - 1) as f64);
            let x0 = fx_src.floor() as usize;
            let y0 = fy_src.floor() as usize;
            let x1 = (x0 + 1).min(src_w - 1);
            let y1 = (y0 + 1).min(src_h - 1);
            let fx = fx_src - x0 as f64;
            let fy = fy_src - y0 as f64;

            let p00 = src[[y0, x0]] as f64;
            let p10 = src[[y0, x1]] as f64;
            let p01 = src[[y1, x0]] as f64;
            let p11 = src[[y1, x1]] as f64;

            ((1.0 - fx) * (1.0 - fy) * p00
                + fx * (1.0 - fy) * p10
                + (1.0 - fx) * fy * p01
                + fx * fy * p11) as f32
        }),
    };
    Ok(out)
}

/// Brings an annotation and a reference onto one binary grid.
///
/// Order: validate, reduce reference to luminance, apply the size policy to
/// the raw annotation values, then threshold both at `> 0`.
pub struct MaskPreProcess {
    pub size_policy: SizePolicy,
    pub filter: ResizeFilter,
    pub luminance: LuminanceWeights,
}

impl MaskPreProcess {
    pub fn new(size_policy: SizePolicy, filter: ResizeFilter, luminance: LuminanceWeights) -> Self {
        Self {
            size_policy,
            filter,
            luminance,
        }
    }

    pub fn from_config(cfg: &ScoreConfig) -> Self {
        Self::new(cfg.size_policy, cfg.filter, cfg.luminance)
    }

    pub fn run(
        &self,
        annotation: &AnnotationLayer,
        reference: &ReferenceMask,
    ) -> Result<(BinaryMask, BinaryMask)> {
        check_values("annotation", annotation.dims(), annotation.view())?;
        check_values("reference", reference.dims(), reference.view())?;

        let luma = reduce_to_luminance(
            reference.view(),
            reference.layout().has_color(),
            self.luminance,
        );

        let (ref_w, ref_h) = reference.dims();
        let ann_bin = if annotation.dims() == (ref_w, ref_h) {
            BinaryMask::from_values(annotation.view())
        } else {
            match self.size_policy {
                SizePolicy::Reject => {
                    return Err(ScoreError::DimensionMismatch {
                        annotation: annotation.dims(),
                        reference: (ref_w, ref_h),
                    })
                }
                SizePolicy::ResizeAnnotation => {
                    log::debug!(
                        "resizing annotation {:?} -> {}x{} ({:?})",
                        annotation.dims(),
                        ref_w,
                        ref_h,
                        self.filter
                    );
                    let resized = resize(annotation.view(), ref_w, ref_h, self.filter)?;
                    BinaryMask::from_values(resized.view())
                }
            }
        };

        Ok((ann_bin, BinaryMask::from_values(luma.view())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::ChannelLayout;
    use ndarray::{array, Array3};

    #[test]
    fn test_binarize_is_strictly_positive() {
        let m = BinaryMask::from_values(array![[0.0f32, 0.001], [255.0, 0.0]].view());
        assert_eq!(m.count(), 2);
        assert_eq!(m.view(), array![[false, true], [true, false]].view());
    }

    #[test]
    fn test_nearest_upscale_replicates() {
        let src = array![[1.0f32, 0.0], [0.0, 2.0]];
        let out = resize(src.view(), 4, 4, ResizeFilter::Nearest).unwrap();
        let expected = array![
            [1.0f32, 1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 2.0, 2.0],
            [0.0, 0.0, 2.0, 2.0],
        ];
        assert_eq!(out, expected);
    }

    #[test]
    fn test_nearest_downscale_samples_centres() {
        // 4x1 -> 2x1 picks columns 1 and 3
        let src = array![[0.0f32, 5.0, 0.0, 7.0]];
        let out = resize(src.view(), 2, 1, ResizeFilter::Nearest).unwrap();
        assert_eq!(out, array![[5.0f32, 7.0]]);
    }

    #[test]
    fn test_bilinear_midpoint() {
        // 2x1 -> 4x1: x=1 maps to src 0.25, x=2 to 0.75
        let src = array![[0.0f32, 100.0]];
        let out = resize(src.view(), 4, 1, ResizeFilter::Bilinear).unwrap();
        assert_eq!(out[[0, 0]], 0.0);
        assert!((out[[0, 1]] - 25.0).abs() < 1e-4);
        assert!((out[[0, 2]] - 75.0).abs() < 1e-4);
        assert_eq!(out[[0, 3]], 100.0);
    }

    #[test]
    fn test_resize_before_binarize_differs_from_after() {
        // bilinear spreads a single mark into its neighbours
        let src = array![[0.0f32, 1.0], [0.0, 0.0]];
        let out = resize(src.view(), 4, 4, ResizeFilter::Bilinear).unwrap();
        let bin = BinaryMask::from_values(out.view());
        assert!(bin.count() > 4);
    }

    #[test]
    fn test_resize_empty_source_or_target() {
        let empty = Array2::<f32>::zeros((0, 0));
        for filter in [ResizeFilter::Nearest, ResizeFilter::Bilinear] {
            assert!(matches!(
                resize(empty.view(), 2, 2, filter),
                Err(ScoreError::InvalidInput(_))
            ));
        }
        let src = array![[1.0f32, 0.0]];
        assert!(matches!(
            resize(src.view(), 0, 3, ResizeFilter::Nearest),
            Err(ScoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_intersection_requires_same_dims() {
        let tall = BinaryMask::from_values(Array2::<f32>::ones((4, 1)).view());
        let square = BinaryMask::from_values(Array2::<f32>::ones((2, 2)).view());
        match tall.intersection(&square) {
            Err(ScoreError::DimensionMismatch { annotation, reference }) => {
                assert_eq!(annotation, (1, 4));
                assert_eq!(reference, (2, 2));
            }
            other => panic!("expected DimensionMismatch, got {other:?}"),
        }
        assert_eq!(square.intersection(&square).unwrap(), 4);
    }

    #[test]
    fn test_luminance_ignores_alpha() {
        let px = Array3::from_shape_vec((1, 2, 4), vec![0.0, 0.0, 0.0, 255.0, 10.0, 0.0, 0.0, 0.0])
            .unwrap();
        let luma = reduce_to_luminance(px.view(), true, LuminanceWeights::Bt601);
        assert_eq!(luma[[0, 0]], 0.0);
        assert!((luma[[0, 1]] - 2.99).abs() < 1e-4);
    }

    #[test]
    fn test_reject_policy_mismatch() {
        let pre = MaskPreProcess::from_config(&ScoreConfig::strict());
        let ann = AnnotationLayer::blank(10, 10);
        let reference = ReferenceMask::gray(Array2::zeros((20, 20)));
        match pre.run(&ann, &reference) {
            Err(ScoreError::DimensionMismatch { annotation, reference }) => {
                assert_eq!(annotation, (10, 10));
                assert_eq!(reference, (20, 20));
            }
            other => panic!("expected DimensionMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_resize_policy_uses_reference_grid() {
        let pre = MaskPreProcess::from_config(&ScoreConfig::canvas());
        let mut ann = AnnotationLayer::blank(2, 2);
        ann.fill_rect(0, 0, 1, 1, 255.0);
        let reference = ReferenceMask::gray(Array2::zeros((6, 6)));
        let (a, r) = pre.run(&ann, &reference).unwrap();
        assert_eq!(a.dims(), (6, 6));
        assert_eq!(r.dims(), (6, 6));
        assert_eq!(a.count(), 9);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let pre = MaskPreProcess::from_config(&ScoreConfig::default());
        let reference = ReferenceMask::gray(Array2::zeros((2, 2)));

        let nan = AnnotationLayer::new(array![[0.0f32, f32::NAN], [0.0, 0.0]]);
        assert!(matches!(pre.run(&nan, &reference), Err(ScoreError::InvalidInput(_))));

        let neg = AnnotationLayer::new(array![[0.0f32, -1.0], [0.0, 0.0]]);
        assert!(matches!(pre.run(&neg, &reference), Err(ScoreError::InvalidInput(_))));

        let empty = AnnotationLayer::blank(0, 0);
        let empty_ref = ReferenceMask::gray(Array2::zeros((0, 0)));
        assert!(matches!(pre.run(&empty, &empty_ref), Err(ScoreError::InvalidInput(_))));
    }

    #[test]
    fn test_infinite_reference_rejected() {
        let pre = MaskPreProcess::from_config(&ScoreConfig::default());
        let ann = AnnotationLayer::blank(1, 1);
        let reference =
            ReferenceMask::from_vec(1, 1, ChannelLayout::Rgb, vec![0.0, f32::INFINITY, 0.0])
                .unwrap();
        assert!(matches!(pre.run(&ann, &reference), Err(ScoreError::InvalidInput(_))));
    }
}
