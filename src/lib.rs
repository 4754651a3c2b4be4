pub mod charts;
pub mod color;
pub mod core;
pub mod dash;
pub mod error;
pub mod fonts;
pub mod geometry;
pub mod render;
pub mod runtime;
pub mod wasm_api;

pub use error::{FigError, Result};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

pub mod prelude {
    pub use crate::charts::*;
    pub use crate::color::{ColorEntry, ColorSpec};
    pub use crate::core::*;
    pub use crate::dash::*;
    pub use crate::error::{FigError, Result};
    pub use crate::geometry::TimeVector;
    pub use crate::runtime::*;
}
