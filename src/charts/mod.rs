//! The chart helpers.
//!
//! Every helper runs the same pipeline: normalise the input arrays, resolve
//! the color specification, build the per-item geometry and issue draw calls
//! on a fresh canvas, returning the finished [`Figure`](crate::core::Figure).
//!
//! - `bubble`: circles whose radius follows a value vector
//! - `diverging`: groups of points connected to their group centre
//! - `filled_2d`: lines filled down to the x axis
//! - `filled_3d`: per-category ribbons over a time axis

mod bubble;
mod diverging;
mod filled_2d;
mod filled_3d;

pub use bubble::{BubbleOptions, bubble_plot};
pub use diverging::{DivergingOptions, diverging_scatter};
pub use filled_2d::{Filled2dOptions, filled_2d_line};
pub use filled_3d::{Filled3dOptions, filled_3d_line};

use crate::error::{FigError, Result};
use error_stack::Report;

fn check_alpha(arg: &'static str, alpha: f32) -> Result<()> {
    if (0.0..=1.0).contains(&alpha) {
        Ok(())
    } else {
        Err(Report::new(FigError::value(
            arg,
            format!("must lie in [0, 1], got {alpha}"),
        )))
    }
}
