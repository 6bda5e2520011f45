//! Dense raster inputs for overlap scoring.
//!
//! Both layers keep their raw per-pixel values; validation, channel reduction
//! and thresholding happen in [`crate::preprocess`] so that a malformed layer
//! is reported at scoring time as `InvalidInput`.

use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis};

use crate::error::{Result, ScoreError};

/// Channel order of an interleaved pixel buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelLayout {
    Gray,
    GrayAlpha,
    Rgb,
    Rgba,
}

impl ChannelLayout {
    pub fn channels(self) -> usize {
        match self {
            ChannelLayout::Gray => 1,
            ChannelLayout::GrayAlpha => 2,
            ChannelLayout::Rgb => 3,
            ChannelLayout::Rgba => 4,
        }
    }

    pub fn alpha_index(self) -> Option<usize> {
        match self {
            ChannelLayout::GrayAlpha => Some(1),
            ChannelLayout::Rgba => Some(3),
            ChannelLayout::Gray | ChannelLayout::Rgb => None,
        }
    }

    pub fn has_color(self) -> bool {
        matches!(self, ChannelLayout::Rgb | ChannelLayout::Rgba)
    }
}

fn shape_from_vec(
    width: usize,
    height: usize,
    layout: ChannelLayout,
    data: Vec<f32>,
) -> Result<Array3<f32>> {
    let expected = width * height * layout.channels();
    if data.len() != expected {
        return Err(ScoreError::invalid(format!(
            "buffer holds {} values, {}x{} {:?} needs {}",
            data.len(),
            width,
            height,
            layout,
            expected
        )));
    }
    Array3::from_shape_vec((height, width, layout.channels()), data)
        .map_err(|e| ScoreError::invalid(e.to_string()))
}

/// Marks made by an annotator: one opacity sample per pixel, indexed `[y, x]`.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotationLayer {
    opacity: Array2<f32>,
}

impl AnnotationLayer {
    pub fn new(opacity: Array2<f32>) -> Self {
        Self { opacity }
    }

    /// Row-major single-channel samples.
    pub fn from_vec(width: usize, height: usize, data: Vec<f32>) -> Result<Self> {
        let px = shape_from_vec(width, height, ChannelLayout::Gray, data)?;
        Ok(Self::new(px.index_axis_move(Axis(2), 0)))
    }

    pub fn from_u8(width: usize, height: usize, data: &[u8]) -> Result<Self> {
        Self::from_vec(width, height, data.iter().map(|&v| v as f32).collect())
    }

    /// Builds the layer from an interleaved capture buffer.
    ///
    /// The alpha channel is the opacity when the layout carries one. Without
    /// alpha a pixel's opacity is its largest channel value, so any coloured
    /// stroke counts as a mark.
    pub fn from_channels(pixels: ArrayView3<'_, f32>, layout: ChannelLayout) -> Result<Self> {
        let (_, _, c) = pixels.dim();
        if c != layout.channels() {
            return Err(ScoreError::invalid(format!(
                "{:?} expects {} channels, got {}",
                layout,
                layout.channels(),
                c
            )));
        }
        // collapsing to one channel drops samples, so check every channel first
        if pixels.iter().any(|v| !v.is_finite()) {
            return Err(ScoreError::invalid("annotation contains non-finite values"));
        }
        if pixels.iter().any(|&v| v < 0.0) {
            return Err(ScoreError::invalid("annotation contains negative values"));
        }
        let opacity = match layout.alpha_index() {
            Some(a) => pixels.index_axis(Axis(2), a).to_owned(),
            None => pixels.map_axis(Axis(2), |px| px.iter().copied().fold(f32::MIN, f32::max)),
        };
        Ok(Self::new(opacity))
    }

    /// Interleaved RGBA, as produced by an HTML canvas.
    pub fn from_rgba(width: usize, height: usize, data: Vec<f32>) -> Result<Self> {
        let px = shape_from_vec(width, height, ChannelLayout::Rgba, data)?;
        Self::from_channels(px.view(), ChannelLayout::Rgba)
    }

    /// An unmarked layer of the given size.
    pub fn blank(width: usize, height: usize) -> Self {
        Self::new(Array2::zeros((height, width)))
    }

    /// Sets every pixel in the half-open rectangle to `value`, clipped to the layer.
    pub fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, value: f32) {
        let (rows, cols) = self.opacity.dim();
        let (x1, y1) = (x.saturating_add(w).min(cols), y.saturating_add(h).min(rows));
        for yy in y.min(rows)..y1 {
            for xx in x.min(cols)..x1 {
                self.opacity[[yy, xx]] = value;
            }
        }
    }

    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.opacity.view()
    }

    pub fn width(&self) -> usize {
        self.opacity.ncols()
    }

    pub fn height(&self) -> usize {
        self.opacity.nrows()
    }

    /// (width, height)
    pub fn dims(&self) -> (usize, usize) {
        (self.width(), self.height())
    }
}

/// Ground-truth label raster. Multi-channel masks keep their channels until
/// the scorer reduces them to luminance.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceMask {
    pixels: Array3<f32>,
    layout: ChannelLayout,
}

impl ReferenceMask {
    pub fn gray(values: Array2<f32>) -> Self {
        Self {
            pixels: values.insert_axis(Axis(2)),
            layout: ChannelLayout::Gray,
        }
    }

    /// `pixels` is indexed `[y, x, channel]`.
    pub fn from_channels(pixels: Array3<f32>, layout: ChannelLayout) -> Result<Self> {
        let (_, _, c) = pixels.dim();
        if c != layout.channels() {
            return Err(ScoreError::invalid(format!(
                "{:?} expects {} channels, got {}",
                layout,
                layout.channels(),
                c
            )));
        }
        Ok(Self { pixels, layout })
    }

    pub fn from_vec(
        width: usize,
        height: usize,
        layout: ChannelLayout,
        data: Vec<f32>,
    ) -> Result<Self> {
        let pixels = shape_from_vec(width, height, layout, data)?;
        Self::from_channels(pixels, layout)
    }

    pub fn from_u8(width: usize, height: usize, layout: ChannelLayout, data: &[u8]) -> Result<Self> {
        Self::from_vec(width, height, layout, data.iter().map(|&v| v as f32).collect())
    }

    pub fn view(&self) -> ArrayView3<'_, f32> {
        self.pixels.view()
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    pub fn width(&self) -> usize {
        self.pixels.dim().1
    }

    pub fn height(&self) -> usize {
        self.pixels.dim().0
    }

    /// (width, height)
    pub fn dims(&self) -> (usize, usize) {
        (self.width(), self.height())
    }
}

impl From<AnnotationLayer> for ReferenceMask {
    fn from(layer: AnnotationLayer) -> Self {
        ReferenceMask::gray(layer.opacity)
    }
}
