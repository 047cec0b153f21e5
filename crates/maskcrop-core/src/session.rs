//! Crop session state: the live transform model and its constraints.
//!
//! A [`CropSession`] owns the image being cropped, the mask geometry derived
//! from the container layout, and two snapshots of the affine transform:
//! *live* (updated on every gesture delta) and *committed* (the baseline the
//! next gesture starts from). Gesture end callbacks are the only place
//! committed state advances, with one deliberate exception: magnification
//! updates re-clamp and commit the offset immediately, because zooming
//! changes which offsets are legal.
//!
//! The session is single-threaded and event-driven; every operation is a
//! plain synchronous mutation.

use crate::bitmap::Bitmap;
use crate::transform::{
    crop_to_circle, crop_to_rectangle, crop_to_square, largest_inner_rect,
    mask_region_in_image_space, rotate,
};
use crate::{ConfigError, CropConfig, MaskShape, Size, Vec2};

/// Margin in screen points kept between the mask and the container edge.
pub const MASK_MARGIN: f64 = 16.0;

/// One snapshot of the image's on-screen transform relative to the mask
/// center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineState {
    /// Magnification scale; 1.0 is the fitted size.
    pub scale: f64,
    /// Pan offset in screen points.
    pub offset: Vec2,
    /// Rotation in degrees, positive = counter-clockwise.
    pub angle: f64,
}

impl Default for AffineState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Vec2::ZERO,
            angle: 0.0,
        }
    }
}

/// Mask pixel size derived from configuration plus the measured container.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MaskGeometry {
    /// Mask width in screen points.
    pub width: f64,
    /// Mask height in screen points.
    pub height: f64,
}

impl MaskGeometry {
    /// Whether the geometry can bound anything. False until the first
    /// non-degenerate layout arrives.
    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// State holder and constraint solver for one crop session.
#[derive(Debug, Clone)]
pub struct CropSession {
    config: CropConfig,
    image: Option<Bitmap>,
    container: Size,
    /// On-screen size of the image aspect-fit into the container (scale 1.0).
    fitted: Size,
    mask: MaskGeometry,
    live: AffineState,
    committed: AffineState,
}

impl CropSession {
    /// Create a session with a validated configuration and no image yet.
    pub fn new(config: CropConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            image: None,
            container: Size::default(),
            fitted: Size::default(),
            mask: MaskGeometry::default(),
            live: AffineState::default(),
            committed: AffineState::default(),
        })
    }

    pub fn config(&self) -> &CropConfig {
        &self.config
    }

    /// Set the source image, resetting the transform baseline.
    pub fn set_image(&mut self, image: Bitmap) {
        self.image = Some(image);
        self.live = AffineState::default();
        self.committed = AffineState::default();
        self.update_fitted();
    }

    pub fn image(&self) -> Option<&Bitmap> {
        self.image.as_ref()
    }

    /// Cancel the session: the image is cleared and any later commit
    /// yields nothing.
    pub fn cancel(&mut self) {
        self.image = None;
    }

    // === Layout ===

    /// Recompute mask geometry and fitted size from a measured container.
    ///
    /// A degenerate size leaves the geometry invalid; gesture updates then
    /// pass through unclamped until a valid layout arrives.
    pub fn container_laid_out(&mut self, size: Size) {
        self.container = size;
        self.mask = compute_mask(&self.config, size);
        self.update_fitted();

        if self.clamping_enabled() {
            let clamped = self.committed.offset.clamp_abs(self.drag_bounds());
            self.committed.offset = clamped;
            self.live.offset = clamped;
        }
    }

    fn update_fitted(&mut self) {
        self.fitted = match (&self.image, self.container.is_degenerate()) {
            (Some(image), false) if !image.is_empty() => {
                let ratio = (self.container.width / image.width as f64)
                    .min(self.container.height / image.height as f64);
                Size::new(image.width as f64 * ratio, image.height as f64 * ratio)
            }
            _ => Size::default(),
        };
    }

    fn clamping_enabled(&self) -> bool {
        self.mask.is_valid() && !self.fitted.is_degenerate()
    }

    // === Bounds ===

    /// Legal range for the magnification scale.
    pub fn scale_bounds(&self) -> (f64, f64) {
        (1.0, self.config.max_magnification_scale)
    }

    /// Maximum absolute offset per axis at the current scale and angle.
    ///
    /// Any offset within these bounds keeps the mask fully covered by the
    /// image. Under rotation the pannable extents are those of the largest
    /// axis-aligned rectangle inscribed in the rotated image, which never
    /// exceed the unrotated extents.
    pub fn drag_bounds(&self) -> Vec2 {
        if !self.clamping_enabled() {
            return Vec2::ZERO;
        }

        let (extent_w, extent_h) = if self.config.rotate_image {
            largest_inner_rect(self.fitted.width, self.fitted.height, self.live.angle)
        } else {
            (self.fitted.width, self.fitted.height)
        };

        let scale = self.live.scale;
        Vec2 {
            x: ((extent_w * scale - self.mask.width) / 2.0).max(0.0),
            y: ((extent_h * scale - self.mask.height) / 2.0).max(0.0),
        }
    }

    fn clamp_offset(&self, offset: Vec2) -> Vec2 {
        if !self.clamping_enabled() {
            return offset;
        }
        offset.clamp_abs(self.drag_bounds())
    }

    // === Gesture updates ===

    /// Continuous magnification update with the gesture's cumulative ratio.
    ///
    /// Clamps the live scale, then re-clamps the offset against the new
    /// scale's bounds and writes it to both live and committed state:
    /// zooming snaps the pan into bounds immediately rather than waiting
    /// for a gesture end.
    pub fn magnification_changed(&mut self, delta_ratio: f64) {
        if !delta_ratio.is_finite() {
            return;
        }
        let softened = 1.0 + (delta_ratio - 1.0) * self.config.zoom_sensitivity;
        let (min_scale, max_scale) = self.scale_bounds();
        self.live.scale = (softened * self.committed.scale).clamp(min_scale, max_scale);

        let clamped = self.clamp_offset(self.committed.offset);
        self.live.offset = clamped;
        self.committed.offset = clamped;
    }

    /// End of the magnification gesture: commit the live scale.
    pub fn magnification_ended(&mut self) {
        self.committed.scale = self.live.scale;
    }

    /// Continuous drag update with the gesture's cumulative translation.
    pub fn drag_changed(&mut self, translation: Vec2) {
        self.live.offset = self.clamp_offset(self.committed.offset + translation);
    }

    /// End of the drag gesture: commit the live offset.
    pub fn drag_ended(&mut self) {
        self.committed.offset = self.live.offset;
    }

    /// Continuous rotation update with the gesture's cumulative angle in
    /// degrees. Free rotation, no clamping. Ignored unless rotation is
    /// enabled in the configuration.
    pub fn rotation_changed(&mut self, angle_degrees: f64) {
        if !self.config.rotate_image || !angle_degrees.is_finite() {
            return;
        }
        self.live.angle = angle_degrees;
    }

    /// End of the rotation gesture: commit the live angle and re-clamp the
    /// offset against the rotated extents so the committed state keeps its
    /// invariant.
    pub fn rotation_ended(&mut self) {
        if !self.config.rotate_image {
            return;
        }
        self.committed.angle = self.live.angle;

        let clamped = self.clamp_offset(self.committed.offset);
        self.committed.offset = clamped;
        self.live.offset = clamped;
    }

    // === Outbound surface for the presentation layer ===

    /// Live scale for preview rendering.
    pub fn scale(&self) -> f64 {
        self.live.scale
    }

    /// Live offset for preview rendering.
    pub fn offset(&self) -> Vec2 {
        self.live.offset
    }

    /// Live angle for preview rendering.
    pub fn angle(&self) -> f64 {
        self.live.angle
    }

    /// Mask pixel size for the overlay.
    pub fn mask(&self) -> MaskGeometry {
        self.mask
    }

    /// Committed transform snapshot.
    pub fn committed(&self) -> AffineState {
        self.committed
    }

    // === Commit ===

    /// Produce the cropped bitmap from the committed transform.
    ///
    /// Returns `None` when there is no image (cleared or cancelled), the
    /// layout never produced a valid mask, or the pixel operations fail to
    /// allocate. A failed rotate step degrades to clipping the unrotated
    /// image rather than aborting.
    pub fn commit(&self) -> Option<Bitmap> {
        let image = self.image.as_ref()?;
        if !self.clamping_enabled() {
            return None;
        }

        let state = self.committed;
        let wants_rotation = self.config.rotate_image && state.angle % 360.0 != 0.0;

        let rotated = if wants_rotation {
            rotate(image, state.angle)
        } else {
            None
        };

        let (source, applied_angle) = clip_source(image, rotated.as_ref(), state.angle);

        let region = mask_region_in_image_space(
            Size::new(self.mask.width, self.mask.height),
            state.scale,
            state.offset,
            applied_angle,
            (image.width, image.height),
            self.fitted,
        );

        match self.config.shape {
            MaskShape::Circle => crop_to_circle(source, region, self.config.circular_crop_alpha),
            MaskShape::Square => crop_to_square(source, region),
            MaskShape::Rectangle => crop_to_rectangle(source, region),
        }
    }
}

/// Choose the bitmap and angle the clip step runs on.
///
/// On rotate failure the mapping must match the bitmap actually clipped,
/// so the angle drops back to zero with the fallback image.
fn clip_source<'a>(
    image: &'a Bitmap,
    rotated: Option<&'a Bitmap>,
    angle_degrees: f64,
) -> (&'a Bitmap, f64) {
    match rotated {
        Some(r) => (r, angle_degrees),
        None => (image, 0.0),
    }
}

/// Derive the mask pixel size for a container.
fn compute_mask(config: &CropConfig, container: Size) -> MaskGeometry {
    if container.is_degenerate() {
        return MaskGeometry::default();
    }

    match config.shape {
        MaskShape::Circle | MaskShape::Square => {
            let side = (container.min_dimension() - MASK_MARGIN).max(0.0) * config.mask_radius;
            MaskGeometry {
                width: side,
                height: side,
            }
        }
        MaskShape::Rectangle => {
            let base_w = (container.width - MASK_MARGIN).max(0.0) * config.mask_radius;
            let base_h = (container.height - MASK_MARGIN).max(0.0) * config.mask_radius;

            let mut width = base_w;
            let mut height = width / config.rect_aspect_ratio;
            if height > base_h {
                height = base_h;
                width = height * config.rect_aspect_ratio;
            }
            MaskGeometry { width, height }
        }
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn opaque_image(width: u32, height: u32) -> Bitmap {
        Bitmap::new(
            width,
            height,
            vec![255u8; width as usize * height as usize * 4],
        )
    }

    /// A gesture event for the sequence properties below.
    #[derive(Debug, Clone)]
    enum Event {
        Magnify(f64),
        MagnifyEnd,
        Drag(f64, f64),
        DragEnd,
    }

    fn event_strategy() -> impl Strategy<Value = Event> {
        prop_oneof![
            (-10.0f64..=10.0).prop_map(Event::Magnify),
            Just(Event::MagnifyEnd),
            (-2000.0f64..=2000.0, -2000.0f64..=2000.0).prop_map(|(x, y)| Event::Drag(x, y)),
            Just(Event::DragEnd),
        ]
    }

    fn apply(session: &mut CropSession, events: &[Event]) {
        for event in events {
            match *event {
                Event::Magnify(ratio) => session.magnification_changed(ratio),
                Event::MagnifyEnd => session.magnification_ended(),
                Event::Drag(x, y) => session.drag_changed(Vec2::new(x, y)),
                Event::DragEnd => session.drag_ended(),
            }
        }
    }

    proptest! {
        /// Property: live scale stays within bounds for every event
        /// sequence, including adversarial overshooting deltas.
        #[test]
        fn prop_scale_always_in_bounds(
            events in prop::collection::vec(event_strategy(), 1..40),
            max_scale in 1.5f64..=8.0,
        ) {
            let mut config = CropConfig::new();
            config.max_magnification_scale = max_scale;
            let mut session = CropSession::new(config).unwrap();
            session.set_image(opaque_image(200, 160));
            session.container_laid_out(Size::new(216.0, 176.0));

            for event in &events {
                match *event {
                    Event::Magnify(ratio) => session.magnification_changed(ratio),
                    Event::MagnifyEnd => session.magnification_ended(),
                    Event::Drag(x, y) => session.drag_changed(Vec2::new(x, y)),
                    Event::DragEnd => session.drag_ended(),
                }
                prop_assert!(session.scale() >= 1.0);
                prop_assert!(session.scale() <= max_scale);
            }
        }

        /// Property: committed offsets satisfy the bounds computed from the
        /// current scale after any event sequence ending in commits.
        #[test]
        fn prop_committed_offset_within_bounds(
            events in prop::collection::vec(event_strategy(), 1..40),
        ) {
            let mut session = CropSession::new(CropConfig::new()).unwrap();
            session.set_image(opaque_image(200, 200));
            session.container_laid_out(Size::new(216.0, 216.0));

            apply(&mut session, &events);
            session.magnification_ended();
            session.drag_ended();

            let bounds = session.drag_bounds();
            let offset = session.committed().offset;
            prop_assert!(offset.x.abs() <= bounds.x + 1e-9);
            prop_assert!(offset.y.abs() <= bounds.y + 1e-9);
        }

        /// Property: layout is idempotent for any container size.
        #[test]
        fn prop_layout_idempotent(
            width in 0.0f64..=2000.0,
            height in 0.0f64..=2000.0,
        ) {
            let mut session = CropSession::new(CropConfig::new()).unwrap();
            session.set_image(opaque_image(100, 100));

            session.container_laid_out(Size::new(width, height));
            let first = session.mask();
            session.container_laid_out(Size::new(width, height));
            prop_assert_eq!(session.mask(), first);
        }
    }
}
