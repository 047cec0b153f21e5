//! Image rotation with canvas expansion.
//!
//! # Algorithm
//!
//! The rotation uses inverse mapping: for each pixel in the output image,
//! we calculate which source pixel(s) contribute to it and interpolate
//! their values bilinearly. Output pixels whose source falls outside the
//! image are fully transparent, so nothing of the source is clipped and
//! the enlarged canvas carries alpha in its corners.
//!
//! For rotation by angle θ, the inverse transform is:
//! ```text
//! src_x = (dst_x - cx) * cos(-θ) - (dst_y - cy) * sin(-θ) + src_cx
//! src_y = (dst_x - cx) * sin(-θ) + (dst_y - cy) * cos(-θ) + src_cy
//! ```

use crate::bitmap::{Bitmap, BYTES_PER_PIXEL};

/// Compute the dimensions of the bounding box for a rotated image.
///
/// When an image is rotated, the corners extend beyond the original bounds.
/// This function calculates the minimum bounding box that contains the
/// entire rotated image.
///
/// # Arguments
///
/// * `width` - Original image width
/// * `height` - Original image height
/// * `angle_degrees` - Rotation angle in degrees (positive = counter-clockwise)
///
/// # Returns
///
/// Tuple of (new_width, new_height) for the rotated bounding box.
pub fn compute_rotated_bounds(width: u32, height: u32, angle_degrees: f64) -> (u32, u32) {
    // Normalize angle to handle 360, 720, etc.
    let angle_normalized = angle_degrees % 360.0;

    // Fast path: no rotation needed (including near-zero and multiples of 360)
    if angle_normalized.abs() < 0.001 || (360.0 - angle_normalized.abs()).abs() < 0.001 {
        return (width, height);
    }

    // Fast path: exact 90/270 degree rotations (swap dimensions)
    let abs_angle = angle_normalized.abs();
    if (abs_angle - 90.0).abs() < 0.001 || (abs_angle - 270.0).abs() < 0.001 {
        return (height, width);
    }

    // Fast path: exact 180 degree rotation (same dimensions)
    if (abs_angle - 180.0).abs() < 0.001 {
        return (width, height);
    }

    let angle_rad = angle_degrees.to_radians();
    let cos = angle_rad.cos().abs();
    let sin = angle_rad.sin().abs();

    let w = width as f64;
    let h = height as f64;

    // The bounding box of a rotated rectangle is:
    // new_w = |w*cos| + |h*sin|
    // new_h = |w*sin| + |h*cos|
    let new_w = (w * cos + h * sin).round() as u32;
    let new_h = (w * sin + h * cos).round() as u32;

    (new_w.max(1), new_h.max(1))
}

/// Compute the largest axis-aligned rectangle with the original aspect ratio
/// that fits entirely inside the rotated rectangle.
///
/// This is the extent actually available for panning under rotation: the
/// rotated image's bounding box is larger than the image, but its corners
/// are empty, so the safe pannable area shrinks rather than grows.
///
/// Returns (inner_width, inner_height) in the same units as the inputs.
pub fn largest_inner_rect(width: f64, height: f64, angle_degrees: f64) -> (f64, f64) {
    if width <= 0.0 || height <= 0.0 {
        return (0.0, 0.0);
    }

    let angle_rad = angle_degrees.to_radians();
    let sin = angle_rad.sin().abs();
    let cos = angle_rad.cos().abs();

    if sin < 1e-9 {
        return (width, height);
    }

    // Scale factor k so that (k*w, k*h) fits inside the rotated (w, h):
    // the inner rectangle's corners touch whichever pair of rotated edges
    // constrains first.
    let k_w = width / (width * cos + height * sin);
    let k_h = height / (width * sin + height * cos);
    let k = k_w.min(k_h);

    (width * k, height * k)
}

/// Rotate an image about its center.
///
/// The output canvas is expanded to the rotated bounding box so no corners
/// are clipped; uncovered canvas pixels are fully transparent. Returns
/// `None` when the output buffer cannot be allocated - callers treat that
/// as a recoverable failure and fall back to the unrotated image.
pub fn rotate(image: &Bitmap, angle_degrees: f64) -> Option<Bitmap> {
    // Fast path: no rotation needed
    if (angle_degrees % 360.0).abs() < 0.001 {
        return Some(image.clone());
    }

    let (src_w, src_h) = (image.width as f64, image.height as f64);
    let (dst_w, dst_h) = compute_rotated_bounds(image.width, image.height, angle_degrees);

    // Negate angle for correct visual rotation direction
    // (positive angle should rotate counter-clockwise visually)
    let angle_rad = -angle_degrees.to_radians();
    let cos = angle_rad.cos();
    let sin = angle_rad.sin();

    // Center of source and destination images
    let src_cx = src_w / 2.0;
    let src_cy = src_h / 2.0;
    let dst_cx = dst_w as f64 / 2.0;
    let dst_cy = dst_h as f64 / 2.0;

    let mut output = Bitmap::alloc(dst_w, dst_h)?;

    for dst_y in 0..dst_h {
        for dst_x in 0..dst_w {
            // Translate destination point to origin at center
            let dx = dst_x as f64 - dst_cx;
            let dy = dst_y as f64 - dst_cy;

            // Apply inverse rotation to find source coordinates
            let src_x = dx * cos - dy * sin + src_cx;
            let src_y = dx * sin + dy * cos + src_cy;

            let pixel = sample_bilinear(image, src_x, src_y);

            let dst_idx = (dst_y as usize * dst_w as usize + dst_x as usize) * BYTES_PER_PIXEL;
            output.pixels[dst_idx..dst_idx + BYTES_PER_PIXEL].copy_from_slice(&pixel);
        }
    }

    Some(output)
}

/// Get a pixel as [f64; 4] from an image at the given coordinates.
#[inline]
fn get_pixel_f64(image: &Bitmap, px: usize, py: usize) -> [f64; 4] {
    let idx = (py * image.width as usize + px) * BYTES_PER_PIXEL;
    [
        image.pixels[idx] as f64,
        image.pixels[idx + 1] as f64,
        image.pixels[idx + 2] as f64,
        image.pixels[idx + 3] as f64,
    ]
}

/// Sample a pixel using bilinear interpolation.
///
/// Considers the 4 nearest pixels and weights their contribution based on
/// distance. Out-of-bounds samples are transparent.
fn sample_bilinear(image: &Bitmap, x: f64, y: f64) -> [u8; 4] {
    let (w, h) = (image.width as i64, image.height as i64);

    if x < 0.0 || x >= (w - 1) as f64 || y < 0.0 || y >= (h - 1) as f64 {
        return [0, 0, 0, 0];
    }

    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = x0 + 1;
    let y1 = y0 + 1;

    // Fractional distances
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = get_pixel_f64(image, x0, y0);
    let p10 = get_pixel_f64(image, x1, y0);
    let p01 = get_pixel_f64(image, x0, y1);
    let p11 = get_pixel_f64(image, x1, y1);

    // Bilinear interpolation formula
    let mut result = [0u8; 4];
    for i in 0..4 {
        let v = p00[i] * (1.0 - fx) * (1.0 - fy)
            + p10[i] * fx * (1.0 - fy)
            + p01[i] * (1.0 - fx) * fy
            + p11[i] * fx * fy;
        result[i] = v.clamp(0.0, 255.0).round() as u8;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Create an opaque test image with a gradient pattern.
    fn test_image(width: u32, height: u32) -> Bitmap {
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                let v = ((x + y) * 8) as u8;
                pixels.push(v); // R
                pixels.push(v); // G
                pixels.push(v); // B
                pixels.push(255); // A
            }
        }
        Bitmap::new(width, height, pixels)
    }

    #[test]
    fn test_no_rotation() {
        let img = test_image(100, 50);
        let result = rotate(&img, 0.0).unwrap();

        assert_eq!(result.width, 100);
        assert_eq!(result.height, 50);
        assert_eq!(result.pixels, img.pixels);
    }

    #[test]
    fn test_tiny_rotation_fast_path() {
        let img = test_image(100, 50);
        let result = rotate(&img, 0.0001).unwrap();

        // Should hit fast path
        assert_eq!(result.width, 100);
        assert_eq!(result.height, 50);
    }

    #[test]
    fn test_90_degree_rotation_bounds() {
        let (w, h) = compute_rotated_bounds(100, 50, 90.0);
        assert_eq!(w, 50);
        assert_eq!(h, 100);
    }

    #[test]
    fn test_180_degree_rotation_bounds() {
        let (w, h) = compute_rotated_bounds(100, 50, 180.0);
        assert_eq!(w, 100);
        assert_eq!(h, 50);
    }

    #[test]
    fn test_45_degree_rotation_bounds() {
        let (w, h) = compute_rotated_bounds(100, 100, 45.0);
        // Diagonal of 100x100 square is ~141.4
        assert!(w > 140 && w < 143, "width was {}", w);
        assert!(h > 140 && h < 143, "height was {}", h);
    }

    #[test]
    fn test_large_rotation_angles() {
        // 720 degrees = 2 full rotations
        let (w, h) = compute_rotated_bounds(100, 50, 720.0);
        assert_eq!(w, 100);
        assert_eq!(h, 50);

        // 450 degrees = 360 + 90
        let (w, h) = compute_rotated_bounds(100, 50, 450.0);
        assert_eq!(w, 50);
        assert_eq!(h, 100);
    }

    #[test]
    fn test_negative_rotation_bounds() {
        // Negative and positive rotations should give same bounds
        let (w1, h1) = compute_rotated_bounds(100, 50, 30.0);
        let (w2, h2) = compute_rotated_bounds(100, 50, -30.0);
        assert_eq!(w1, w2);
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_rotation_expands_canvas() {
        let img = test_image(100, 100);
        let result = rotate(&img, 45.0).unwrap();

        assert!(result.width > img.width);
        assert!(result.height > img.height);
    }

    #[test]
    fn test_rotation_corners_transparent() {
        let img = test_image(100, 100);
        let result = rotate(&img, 45.0).unwrap();

        // The bounding-box corners are not covered by the rotated image
        assert_eq!(result.rgba_at(0, 0)[3], 0);
        assert_eq!(result.rgba_at(result.width - 1, result.height - 1)[3], 0);
    }

    #[test]
    fn test_rotation_center_stays_opaque() {
        let img = test_image(101, 101);
        let result = rotate(&img, 30.0).unwrap();

        let center = result.rgba_at(result.width / 2, result.height / 2);
        assert_eq!(center[3], 255);
    }

    #[test]
    fn test_1x1_image_rotation() {
        // Single pixel image should not panic
        let img = Bitmap::new(1, 1, vec![128, 128, 128, 255]);

        let result = rotate(&img, 45.0).unwrap();
        assert!(result.width >= 1);
        assert!(result.height >= 1);
    }

    #[test]
    fn test_very_thin_image_rotation() {
        let img = test_image(100, 1);
        let result = rotate(&img, 45.0).unwrap();

        assert!(result.width > 0);
        assert!(result.height > 0);
    }

    #[test]
    fn test_inner_rect_zero_angle() {
        let (w, h) = largest_inner_rect(100.0, 50.0, 0.0);
        assert!((w - 100.0).abs() < 1e-9);
        assert!((h - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_inner_rect_180_degrees() {
        // A half-turn leaves the footprint unchanged
        let (w, h) = largest_inner_rect(100.0, 50.0, 180.0);
        assert!((w - 100.0).abs() < 1e-6);
        assert!((h - 50.0).abs() < 1e-6);
    }

    #[test]
    fn test_inner_rect_90_degrees() {
        // 100x50 rotated upright: a 2:1 rect inside a 50x100 box
        let (w, h) = largest_inner_rect(100.0, 50.0, 90.0);
        assert!((w - 50.0).abs() < 1e-6, "width was {}", w);
        assert!((h - 25.0).abs() < 1e-6, "height was {}", h);
    }

    #[test]
    fn test_inner_rect_45_degree_square() {
        // Largest axis-aligned square inside a diamond: side / sqrt(2)
        let (w, h) = largest_inner_rect(100.0, 100.0, 45.0);
        assert!((w - 70.7106).abs() < 1e-3, "width was {}", w);
        assert!((h - 70.7106).abs() < 1e-3, "height was {}", h);
    }

    #[test]
    fn test_inner_rect_never_exceeds_original() {
        for angle in [0.0, 10.0, 45.0, 90.0, 135.0, 180.0, 270.0, 315.0] {
            let (w, h) = largest_inner_rect(200.0, 200.0, angle);
            assert!(w <= 200.0 + 1e-9, "angle {}: width {}", angle, w);
            assert!(h <= 200.0 + 1e-9, "angle {}: height {}", angle, h);
        }
    }

    #[test]
    fn test_inner_rect_degenerate_input() {
        assert_eq!(largest_inner_rect(0.0, 100.0, 30.0), (0.0, 0.0));
    }
}
