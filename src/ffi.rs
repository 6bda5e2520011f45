// FFI bindings for C/C++/C#
use std::os::raw::{c_char, c_double, c_int};
use std::slice;

use crate::{AnnotationLayer, ChannelLayout, MaskOverlapScorer, ReferenceMask, ScoreError};

pub const MSK_OK: c_int = 0;
pub const MSK_ERR_NULL: c_int = -1;
pub const MSK_ERR_INVALID_INPUT: c_int = -2;
pub const MSK_ERR_DIMENSION_MISMATCH: c_int = -3;
pub const MSK_ERR_OTHER: c_int = -99;

fn status(err: &ScoreError) -> c_int {
    match err {
        ScoreError::InvalidInput(_) => MSK_ERR_INVALID_INPUT,
        ScoreError::DimensionMismatch { .. } => MSK_ERR_DIMENSION_MISMATCH,
        _ => MSK_ERR_OTHER,
    }
}

/// Dice score between two row-major 8-bit grey buffers.
///
/// Sizes must match; mismatched sizes return `MSK_ERR_DIMENSION_MISMATCH`.
/// On success the score is written to `out_score` and `MSK_OK` is returned.
///
/// # Safety
/// - `annotation` must point to `ann_width * ann_height` readable bytes
/// - `reference` must point to `ref_width * ref_height` readable bytes
/// - `out_score` must be a valid writable pointer
#[no_mangle]
pub unsafe extern "C" fn msk_score_gray(
    annotation: *const u8,
    ann_width: usize,
    ann_height: usize,
    reference: *const u8,
    ref_width: usize,
    ref_height: usize,
    out_score: *mut c_double,
) -> c_int {
    if annotation.is_null() || reference.is_null() || out_score.is_null() {
        return MSK_ERR_NULL;
    }

    let ann = slice::from_raw_parts(annotation, ann_width * ann_height);
    let refm = slice::from_raw_parts(reference, ref_width * ref_height);

    let result = AnnotationLayer::from_u8(ann_width, ann_height, ann).and_then(|a| {
        let r = ReferenceMask::from_u8(ref_width, ref_height, ChannelLayout::Gray, refm)?;
        MaskOverlapScorer::default().score(&a, &r)
    });

    match result {
        Ok(score) => {
            *out_score = score;
            MSK_OK
        }
        Err(e) => status(&e),
    }
}

/// Get library version
#[no_mangle]
pub extern "C" fn msk_version() -> *const c_char {
    static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");
    VERSION.as_ptr() as *const c_char
}
