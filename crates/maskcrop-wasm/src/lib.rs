//! Maskcrop WASM - WebAssembly bindings for Maskcrop
//!
//! This crate exposes the maskcrop-core crop session to JavaScript/
//! TypeScript presentation layers. The JS side owns rendering and gesture
//! recognition; it forwards raw gesture deltas and layout sizes into a
//! [`JsCropSession`] and reads the live transform back for the preview.
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsCropSession, JsBitmap } from '@maskcrop/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const session = new JsCropSession({ shape: 'circle', mask_radius: 0.8 });
//! session.set_image(new JsBitmap(width, height, rgbaPixels));
//! session.container_laid_out(canvas.width, canvas.height);
//!
//! // Gesture recognizers drive the session...
//! session.drag_changed(dx, dy);
//! session.drag_ended();
//!
//! const cropped = session.commit();
//! ```

use wasm_bindgen::prelude::*;

mod session;
mod types;

// Re-export public types
pub use session::JsCropSession;
pub use types::JsBitmap;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    // Future: Set up panic hook for better error messages in browser console
    // when console_error_panic_hook feature is added
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
