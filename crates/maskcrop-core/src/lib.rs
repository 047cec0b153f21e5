//! Maskcrop Core - Interactive crop geometry and clipping
//!
//! This crate provides the core functionality for Maskcrop: a crop session
//! model that constrains pan/zoom/rotation beneath a fixed mask, and the
//! pixel operations that produce the final clipped bitmap.
//!
//! The rendering and gesture layers live outside this crate. They forward
//! raw gesture deltas and layout sizes into [`session::CropSession`] and
//! read back the live transform for preview drawing; on commit they receive
//! the cropped [`bitmap::Bitmap`].

pub mod bitmap;
pub mod session;
pub mod transform;

use thiserror::Error;

pub use bitmap::Bitmap;
pub use session::{AffineState, CropSession, MaskGeometry};
pub use transform::{
    crop_to_circle, crop_to_rectangle, crop_to_square, mask_region_in_image_space, rotate,
    CropRegion,
};

/// Shape of the fixed on-screen mask.
///
/// The set is closed; behavior differs only in the final clip geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskShape {
    /// Circular mask inscribed in a square.
    #[default]
    Circle,
    /// Square mask.
    Square,
    /// Rectangular mask with a configurable aspect ratio.
    Rectangle,
}

/// Error types for crop session configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Mask radius factor must be in (0, 1].
    #[error("mask radius must be in (0, 1], got {0}")]
    InvalidMaskRadius(f64),

    /// Maximum magnification must allow at least the fitted scale.
    #[error("max magnification scale must be >= 1, got {0}")]
    InvalidMaxScale(f64),

    /// Rectangle aspect ratio (width / height) must be positive and finite.
    #[error("rectangle aspect ratio must be positive and finite, got {0}")]
    InvalidAspectRatio(f64),

    /// Zoom sensitivity multiplier must be positive and finite.
    #[error("zoom sensitivity must be positive and finite, got {0}")]
    InvalidZoomSensitivity(f64),
}

/// Immutable per-session crop configuration.
///
/// Fields not present in a deserialized configuration fall back to the
/// defaults, so a presentation layer only specifies what it overrides.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CropConfig {
    /// Shape of the mask the image is cropped to.
    pub shape: MaskShape,
    /// Mask size as a fraction of the margin-inset container (0, 1].
    /// Resolution-independent: the pixel size is derived at layout time.
    pub mask_radius: f64,
    /// Upper bound for the magnification scale (lower bound is always 1.0).
    pub max_magnification_scale: f64,
    /// Aspect ratio (width / height) of the rectangle mask. Ignored for
    /// circle and square masks.
    pub rect_aspect_ratio: f64,
    /// Multiplier softening incoming magnification deltas.
    pub zoom_sensitivity: f64,
    /// Whether the rotation gesture is wired up.
    pub rotate_image: bool,
    /// When cropping to a circle, keep the pixels outside the disk fully
    /// transparent. When false the output is flattened against opaque black.
    pub circular_crop_alpha: bool,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            shape: MaskShape::Circle,
            mask_radius: 1.0,
            max_magnification_scale: 4.0,
            rect_aspect_ratio: 4.0 / 3.0,
            zoom_sensitivity: 1.0,
            rotate_image: false,
            circular_crop_alpha: true,
        }
    }
}

impl CropConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the numeric fields for values the session math cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.mask_radius.is_finite() || self.mask_radius <= 0.0 || self.mask_radius > 1.0 {
            return Err(ConfigError::InvalidMaskRadius(self.mask_radius));
        }
        if !self.max_magnification_scale.is_finite() || self.max_magnification_scale < 1.0 {
            return Err(ConfigError::InvalidMaxScale(self.max_magnification_scale));
        }
        if !self.rect_aspect_ratio.is_finite() || self.rect_aspect_ratio <= 0.0 {
            return Err(ConfigError::InvalidAspectRatio(self.rect_aspect_ratio));
        }
        if !self.zoom_sensitivity.is_finite() || self.zoom_sensitivity <= 0.0 {
            return Err(ConfigError::InvalidZoomSensitivity(self.zoom_sensitivity));
        }
        Ok(())
    }
}

/// A 2D size in screen points.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// A layout size the session cannot derive geometry from.
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn min_dimension(&self) -> f64 {
        self.width.min(self.height)
    }
}

/// A 2D vector in screen points, used for offsets and drag translations.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Clamp each component to `[-max, max]` componentwise.
    /// `max` components are expected to be non-negative.
    pub fn clamp_abs(self, max: Vec2) -> Vec2 {
        Vec2 {
            x: self.x.clamp(-max.x, max.x),
            y: self.y.clamp(-max.y, max.y),
        }
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}
