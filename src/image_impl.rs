//! Adapters between decoded `image` buffers and the scoring rasters.
//!
//! Every conversion goes through the 32-bit float buffers of the `image`
//! crate and is rescaled to the 0-255 range, so 8-bit, 16-bit and float
//! sources land in the same value domain.

use std::path::Path;

use image::{DynamicImage, GenericImageView, ImageBuffer, Rgb, RgbImage};
use ndarray::Array3;

use crate::error::{Result, ScoreError};
use crate::preprocess::BinaryMask;
use crate::raster::{AnnotationLayer, ChannelLayout, ReferenceMask};

const SCALE: f32 = 255.0;

pub fn imread<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
    let img = image::open(path)?;
    Ok(img)
}

fn to_array(width: u32, height: u32, layout: ChannelLayout, raw: Vec<f32>) -> Result<Array3<f32>> {
    let mut px = Array3::from_shape_vec((height as usize, width as usize, layout.channels()), raw)
        .map_err(|e| ScoreError::invalid(e.to_string()))?;
    px.mapv_inplace(|v| v * SCALE);
    Ok(px)
}

/// Opacity comes from the alpha channel when the image has one; otherwise the
/// brightest channel of each pixel is used.
pub fn annotation_from_image(img: &DynamicImage) -> Result<AnnotationLayer> {
    let (w, h) = img.dimensions();
    if img.color().has_alpha() {
        let px = to_array(w, h, ChannelLayout::Rgba, img.to_rgba32f().into_raw())?;
        AnnotationLayer::from_channels(px.view(), ChannelLayout::Rgba)
    } else {
        let px = to_array(w, h, ChannelLayout::Rgb, img.to_rgb32f().into_raw())?;
        AnnotationLayer::from_channels(px.view(), ChannelLayout::Rgb)
    }
}

/// Grey masks stay single-channel; colour masks keep RGBA and are reduced to
/// luminance by the scorer.
pub fn reference_from_image(img: &DynamicImage) -> Result<ReferenceMask> {
    let (w, h) = img.dimensions();
    if img.color().has_color() {
        let px = to_array(w, h, ChannelLayout::Rgba, img.to_rgba32f().into_raw())?;
        ReferenceMask::from_channels(px, ChannelLayout::Rgba)
    } else {
        let px = to_array(w, h, ChannelLayout::Gray, img.to_luma32f().into_raw())?;
        ReferenceMask::from_channels(px, ChannelLayout::Gray)
    }
}

/// Colour-coded comparison: green where both masks agree, red for
/// annotation-only pixels, blue for missed reference pixels.
pub fn overlay_image(annotation: &BinaryMask, reference: &BinaryMask) -> Result<RgbImage> {
    if annotation.dims() != reference.dims() {
        return Err(ScoreError::DimensionMismatch {
            annotation: annotation.dims(),
            reference: reference.dims(),
        });
    }
    let (w, h) = reference.dims();
    let a = annotation.view();
    let r = reference.view();
    Ok(ImageBuffer::from_fn(w as u32, h as u32, |x, y| {
        let idx = [y as usize, x as usize];
        match (a[idx], r[idx]) {
            (true, true) => Rgb([0, 200, 0]),
            (true, false) => Rgb([220, 0, 0]),
            (false, true) => Rgb([0, 0, 220]),
            (false, false) => Rgb([0, 0, 0]),
        }
    }))
}
