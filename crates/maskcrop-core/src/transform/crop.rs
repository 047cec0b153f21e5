//! Mask clipping operations.
//!
//! The mask is fixed on screen while the image pans, zooms, and rotates
//! underneath it, so the clip region must be derived from the committed
//! transform, not from the raw mask size. [`mask_region_in_image_space`]
//! performs that inversion as a single pure function; the `crop_to_*`
//! functions then clip the region to the requested shape.
//!
//! # Example
//!
//! ```ignore
//! let region = mask_region_in_image_space(mask, scale, offset, angle, natural, fitted);
//! let output = crop_to_circle(&rotated, region, true);
//! ```

use crate::bitmap::{Bitmap, BYTES_PER_PIXEL};
use crate::transform::rotation::compute_rotated_bounds;
use crate::{Size, Vec2};

/// Integer crop region in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CropRegion {
    /// Top-left x coordinate.
    pub x: u32,
    /// Top-left y coordinate.
    pub y: u32,
    /// Width of the crop region.
    pub width: u32,
    /// Height of the crop region.
    pub height: u32,
}

impl CropRegion {
    /// A region no crop operation can produce output for.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Map the on-screen mask bounds into image pixel space.
///
/// Inverts the committed transform: the mask's screen extent is divided by
/// the committed scale (zooming in crops a smaller source region) and
/// converted from screen points to image pixels via the natural / fitted
/// ratio. The committed offset moves the image under the mask, so the
/// region center moves the opposite way.
///
/// When `angle_degrees` is non-zero the region is expressed in the
/// coordinates of the rotation-expanded canvas that [`super::rotate`]
/// produces for the same angle, centered on that canvas.
///
/// # Arguments
///
/// * `mask` - Mask pixel size on screen
/// * `scale` - Committed magnification scale
/// * `offset` - Committed pan offset in screen points
/// * `angle_degrees` - Committed rotation, 0.0 when rotation is disabled
///   or the rotate step fell back to the unrotated image
/// * `natural` - Source image dimensions in pixels
/// * `fitted` - On-screen size of the unrotated image at scale 1.0
///
/// Returns a region clamped to the (rotated) canvas, or an empty region
/// when the geometry is degenerate.
pub fn mask_region_in_image_space(
    mask: Size,
    scale: f64,
    offset: Vec2,
    angle_degrees: f64,
    natural: (u32, u32),
    fitted: Size,
) -> CropRegion {
    let (natural_w, natural_h) = natural;
    if mask.is_degenerate()
        || fitted.is_degenerate()
        || !scale.is_finite()
        || scale <= 0.0
        || natural_w == 0
        || natural_h == 0
    {
        return CropRegion::default();
    }

    let (canvas_w, canvas_h) = compute_rotated_bounds(natural_w, natural_h, angle_degrees);

    // Screen points -> source pixels. Aspect-fit keeps both ratios equal;
    // min() guards against a caller passing a slightly off fitted size.
    let factor = (natural_w as f64 / fitted.width).min(natural_h as f64 / fitted.height);

    let crop_w = mask.width / scale * factor;
    let crop_h = mask.height / scale * factor;

    // The offset pans the image, so the mask sits over the opposite side.
    let center_x = canvas_w as f64 / 2.0 - offset.x * factor / scale;
    let center_y = canvas_h as f64 / 2.0 - offset.y * factor / scale;

    let left = center_x - crop_w / 2.0;
    let top = center_y - crop_h / 2.0;

    // Round to integers and clamp inside the canvas
    let x = left.round().clamp(0.0, (canvas_w - 1) as f64) as u32;
    let y = top.round().clamp(0.0, (canvas_h - 1) as f64) as u32;
    let width = crop_w.round().max(1.0).min((canvas_w - x) as f64) as u32;
    let height = crop_h.round().max(1.0).min((canvas_h - y) as f64) as u32;

    CropRegion {
        x,
        y,
        width,
        height,
    }
}

/// Copy a region out of the image, clamped to its bounds.
///
/// Returns `None` for an empty intersection or when the output buffer
/// cannot be allocated.
fn copy_region(image: &Bitmap, region: CropRegion) -> Option<Bitmap> {
    if region.is_empty() || region.x >= image.width || region.y >= image.height {
        return None;
    }

    let out_width = region.width.min(image.width - region.x);
    let out_height = region.height.min(image.height - region.y);

    let mut output = Bitmap::alloc(out_width, out_height)?;

    // Copy pixel data row by row
    let row_bytes = out_width as usize * BYTES_PER_PIXEL;
    for y in 0..out_height as usize {
        let src_y = region.y as usize + y;
        let src_start = (src_y * image.width as usize + region.x as usize) * BYTES_PER_PIXEL;
        let dst_start = y * row_bytes;

        output.pixels[dst_start..dst_start + row_bytes]
            .copy_from_slice(&image.pixels[src_start..src_start + row_bytes]);
    }

    Some(output)
}

/// Clip the image to a rectangular region.
pub fn crop_to_rectangle(image: &Bitmap, region: CropRegion) -> Option<Bitmap> {
    copy_region(image, region)
}

/// Clip the image to a square centered in the region.
///
/// The side is the lesser of the region's dimensions, so an off-square
/// region (e.g. clamped at an image edge) still produces a square output.
pub fn crop_to_square(image: &Bitmap, region: CropRegion) -> Option<Bitmap> {
    if region.is_empty() {
        return None;
    }
    let side = region.width.min(region.height);
    let square = CropRegion {
        x: region.x + (region.width - side) / 2,
        y: region.y + (region.height - side) / 2,
        width: side,
        height: side,
    };
    copy_region(image, square)
}

/// Clip the image to the disk inscribed in the region's centered square.
///
/// With `keep_alpha` the pixels outside the disk become fully transparent;
/// otherwise they are flattened to opaque black. The output is the disk's
/// bounding square.
pub fn crop_to_circle(image: &Bitmap, region: CropRegion, keep_alpha: bool) -> Option<Bitmap> {
    let mut output = crop_to_square(image, region)?;

    let side = output.width;
    let center = side as f64 / 2.0;
    let radius_sq = center * center;
    let outside: [u8; 4] = if keep_alpha { [0, 0, 0, 0] } else { [0, 0, 0, 255] };

    for y in 0..side {
        for x in 0..side {
            // Test the pixel center against the disk
            let dx = (x as f64 + 0.5) - center;
            let dy = (y as f64 + 0.5) - center;
            if dx * dx + dy * dy > radius_sq {
                let idx = (y as usize * side as usize + x as usize) * BYTES_PER_PIXEL;
                output.pixels[idx..idx + BYTES_PER_PIXEL].copy_from_slice(&outside);
            }
        }
    }

    Some(output)
}


// ============================================================================
// Property-Based Tests
// ============================================================================
