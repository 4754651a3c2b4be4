pub mod components;
pub mod draw;
pub mod resources;
pub mod systems;

pub use components::*;
use draw::*;
pub use resources::*;
use systems::*;

use bevy::prelude::*;

/// Lays out one tile per dashboard figure and draws it with its own cameras.
#[derive(Default)]
pub struct FigureRenderPlugin;

impl Plugin for FigureRenderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TileRegistry>()
            .init_resource::<HoveredTile>()
            .add_systems(
                Startup,
                (
                    setup_global_scene,
                    setup_unit_meshes,
                    load_label_font,
                    size_primary_window,
                ),
            )
            .add_systems(
                Update,
                (
                    sync_figures_to_tiles,
                    update_tile_layout,
                    fit_tiles,
                    sync_tile_cameras,
                    update_hovered_tile,
                    handle_input,
                    draw_dirty_tiles,
                    place_anchored_labels,
                )
                    .chain(),
            );
    }
}
