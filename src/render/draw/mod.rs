//! Drawing functions for figure tiles.
//!
//! - `common`: shared utilities (borders, data/world transforms, ticks, dashes)
//! - `charts_2d`: circles, filled polygons, polylines and markers
//! - `charts_3d`: ribbons, 3D lines, panes, projected labels and legends

mod charts_2d;
mod charts_3d;
mod common;

pub use charts_2d::{draw_canvas_2d, style_color, tessellate_polygon};
pub use charts_3d::{PlotBox, data_axes_to_world, draw_canvas_3d};
pub use common::{
    PX_PER_PT, data_to_world, fit_view, format_tick, nice_step, tick_values, world_to_data,
};
