//! Fixed pixel pipeline that turns an image into an engraving-ready
//! grayscale buffer.

use crate::clahe::apply_cubic_clahe;
use crate::error::Result;
use crate::filters::{apply_contrast, apply_gamma, apply_levels, convert_to_grayscale, invert};
use crate::image_processor::ImageData;
use crate::optimizer::ProcessingParameters;
use crate::sharpen::{apply_clarity, apply_unsharp_mask};

/// Run every stage on a copy of `image_data`; the input is never modified.
///
/// Stages: contrast, gamma, CLAHE, levels with shadow/highlight, clarity,
/// unsharp mask, BT.709 grayscale and, when requested, inversion.
pub fn process_image(image_data: &ImageData, params: &ProcessingParameters) -> Result<ImageData> {
    image_data.validate()?;
    let (width, height) = (image_data.width, image_data.height);
    let mut output = image_data.clone();
    let pixels = output.pixels.as_mut_slice();

    log::debug!(
        "processing {}x{}: contrast {}, gamma {:.2}, clahe {:.1}/{}, clarity {}",
        width,
        height,
        params.contrast,
        params.gamma,
        params.clahe_clip_limit,
        params.clahe_tile_size,
        params.clarity
    );

    apply_contrast(pixels, params.contrast);
    apply_gamma(pixels, params.gamma);
    apply_cubic_clahe(
        pixels,
        width,
        height,
        params.clahe_clip_limit,
        params.clahe_tile_size,
    );

    let b = &params.brightness;
    apply_levels(pixels, b.blacks, b.whites, b.highlights, b.shadows);

    apply_clarity(pixels, width, height, params.clarity);
    apply_unsharp_mask(
        pixels,
        width,
        height,
        params.usm.amount as f64 / 100.0,
        params.usm.radius,
        params.usm.threshold,
    );

    convert_to_grayscale(pixels);
    if params.invert {
        invert(pixels);
    }

    Ok(output)
}
