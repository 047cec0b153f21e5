//! Image transformation operations: rotation and mask clipping.
//!
//! This is the pure half of the crop control. [`rotate`] expands the canvas
//! to the rotated bounding box, [`mask_region_in_image_space`] inverts the
//! committed screen transform into an image-pixel region, and the three
//! `crop_to_*` functions clip that region to the mask shape.
//!
//! # Coordinate System
//!
//! - Rotation angles are in degrees, positive = counter-clockwise
//! - Crop regions are in image pixels, origin at the top-left corner
//! - Screen offsets are in screen points relative to the mask center

mod crop;
mod rotation;

pub use crop::{
    crop_to_circle, crop_to_rectangle, crop_to_square, mask_region_in_image_space, CropRegion,
};
pub use rotation::{compute_rotated_bounds, largest_inner_rect, rotate};
