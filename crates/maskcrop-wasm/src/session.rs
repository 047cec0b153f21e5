//! WASM bindings for the crop session.
//!
//! The JS presentation layer constructs one `JsCropSession` per crop
//! dialog, forwards gesture deltas and layout sizes into it, renders the
//! preview from the live transform getters, and finally calls `commit` (or
//! `commit_with` for callback-style delivery).

use crate::types::JsBitmap;
use maskcrop_core::{CropConfig, CropSession, Size, Vec2};
use wasm_bindgen::prelude::*;
use web_sys::console;

/// One interactive crop session driven from JavaScript.
#[wasm_bindgen]
pub struct JsCropSession {
    inner: CropSession,
    cancelled: bool,
    completed: bool,
}

#[wasm_bindgen]
impl JsCropSession {
    /// Create a session from a JS configuration object.
    ///
    /// Missing fields use the defaults; `undefined`/`null` means all
    /// defaults. Throws on invalid numeric configuration.
    ///
    /// # Example (TypeScript)
    ///
    /// ```typescript
    /// const session = new JsCropSession({
    ///   shape: 'rectangle',
    ///   rect_aspect_ratio: 16 / 9,
    ///   max_magnification_scale: 5,
    /// });
    /// ```
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<JsCropSession, JsError> {
        let config: CropConfig = if config.is_undefined() || config.is_null() {
            CropConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(|e| JsError::new(&e.to_string()))?
        };

        let inner = CropSession::new(config).map_err(|e| JsError::new(&e.to_string()))?;
        Ok(JsCropSession {
            inner,
            cancelled: false,
            completed: false,
        })
    }

    /// Set the source image for this session.
    ///
    /// Re-arms delivery: a session whose result was already delivered, or
    /// that was cancelled, may crop and deliver again with the fresh image.
    pub fn set_image(&mut self, image: &JsBitmap) {
        self.inner.set_image(image.to_bitmap());
        self.cancelled = false;
        self.completed = false;
    }

    /// Cancel the session: clears the image; any later commit yields
    /// nothing and `commit_with` will not invoke its callback.
    pub fn cancel(&mut self) {
        self.inner.cancel();
        self.cancelled = true;
    }

    /// Report the measured size of the rendering surface.
    pub fn container_laid_out(&mut self, width: f64, height: f64) {
        self.inner.container_laid_out(Size::new(width, height));
    }

    // === Gesture events ===

    pub fn magnification_changed(&mut self, delta_ratio: f64) {
        self.inner.magnification_changed(delta_ratio);
    }

    pub fn magnification_ended(&mut self) {
        self.inner.magnification_ended();
    }

    pub fn drag_changed(&mut self, translation_x: f64, translation_y: f64) {
        self.inner.drag_changed(Vec2::new(translation_x, translation_y));
    }

    pub fn drag_ended(&mut self) {
        self.inner.drag_ended();
    }

    pub fn rotation_changed(&mut self, angle_degrees: f64) {
        self.inner.rotation_changed(angle_degrees);
    }

    pub fn rotation_ended(&mut self) {
        self.inner.rotation_ended();
    }

    // === Live transform for preview rendering ===

    #[wasm_bindgen(getter)]
    pub fn scale(&self) -> f64 {
        self.inner.scale()
    }

    #[wasm_bindgen(getter)]
    pub fn offset_x(&self) -> f64 {
        self.inner.offset().x
    }

    #[wasm_bindgen(getter)]
    pub fn offset_y(&self) -> f64 {
        self.inner.offset().y
    }

    #[wasm_bindgen(getter)]
    pub fn angle(&self) -> f64 {
        self.inner.angle()
    }

    /// Mask width in screen points, for sizing the overlay.
    #[wasm_bindgen(getter)]
    pub fn mask_width(&self) -> f64 {
        self.inner.mask().width
    }

    /// Mask height in screen points, for sizing the overlay.
    #[wasm_bindgen(getter)]
    pub fn mask_height(&self) -> f64 {
        self.inner.mask().height
    }

    // === Commit ===

    /// Crop with the committed transform. Returns `undefined` when there
    /// is nothing to crop (no image, cancelled, or degenerate layout).
    pub fn commit(&self) -> Option<JsBitmap> {
        self.inner.commit().map(JsBitmap::from_bitmap)
    }

    /// Crop and deliver the result through a callback, exactly once.
    ///
    /// The callback receives the `JsBitmap` or `undefined`. It is never
    /// invoked after `cancel`, and repeated calls after the first delivery
    /// are ignored.
    pub fn commit_with(&mut self, on_complete: &js_sys::Function) {
        if self.cancelled {
            console::warn_1(&"maskcrop: commit after cancel ignored".into());
            return;
        }
        if self.completed {
            console::warn_1(&"maskcrop: crop result already delivered".into());
            return;
        }
        self.completed = true;

        let value = match self.commit() {
            Some(bitmap) => JsValue::from(bitmap),
            None => JsValue::UNDEFINED,
        };
        // A throwing callback is the caller's bug; nothing to recover here.
        let _ = on_complete.call1(&JsValue::NULL, &value);
    }
}


/// WASM-specific tests that require JsValue.
///
/// These exercise the JsValue constructor and callback paths the native
/// tests bypass. Use `wasm-pack test` to run these.
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen::JsCast;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn test_bitmap(width: u32, height: u32) -> JsBitmap {
        JsBitmap::new(
            width,
            height,
            vec![255u8; width as usize * height as usize * 4],
        )
    }

    #[wasm_bindgen_test]
    fn test_constructor_defaults() {
        let session = JsCropSession::new(JsValue::UNDEFINED)
            .map_err(JsValue::from)
            .unwrap();
        assert_eq!(session.scale(), 1.0);
    }

    #[wasm_bindgen_test]
    fn test_constructor_from_js_object() {
        let config = js_sys::Object::new();
        js_sys::Reflect::set(&config, &"shape".into(), &"square".into()).unwrap();
        js_sys::Reflect::set(&config, &"max_magnification_scale".into(), &6.0.into()).unwrap();

        let mut session = JsCropSession::new(config.into())
            .map_err(JsValue::from)
            .unwrap();
        session.set_image(&test_bitmap(100, 100));
        session.container_laid_out(216.0, 216.0);

        session.magnification_changed(10.0);
        assert_eq!(session.scale(), 6.0);
    }

    #[wasm_bindgen_test]
    fn test_constructor_rejects_invalid_config() {
        let config = js_sys::Object::new();
        js_sys::Reflect::set(&config, &"mask_radius".into(), &0.0.into()).unwrap();
        assert!(JsCropSession::new(config.into()).is_err());
    }

    #[wasm_bindgen_test]
    fn test_commit_with_delivers_exactly_once() {
        use std::cell::Cell;
        use std::rc::Rc;

        let mut session = JsCropSession::new(JsValue::UNDEFINED)
            .map_err(JsValue::from)
            .unwrap();
        session.set_image(&test_bitmap(100, 100));
        session.container_laid_out(216.0, 216.0);

        let calls = Rc::new(Cell::new(0u32));
        let seen = calls.clone();
        let callback = wasm_bindgen::closure::Closure::wrap(Box::new(move |_value: JsValue| {
            seen.set(seen.get() + 1);
        }) as Box<dyn FnMut(JsValue)>);

        session.commit_with(callback.as_ref().unchecked_ref());
        session.commit_with(callback.as_ref().unchecked_ref());
        assert_eq!(calls.get(), 1);
    }
}
