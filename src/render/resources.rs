use super::components::PlotId;
use bevy::prelude::*;
use bevy_camera::visibility::RenderLayers;
use bevy_camera::ClearColorConfig;
use std::collections::{HashMap, VecDeque};
use tracing::{info, warn};

#[derive(Resource, Clone)]
pub struct DashboardRes(pub crate::core::Dashboard);

impl DashboardRes {
    pub fn new(dashboard: crate::core::Dashboard) -> Self {
        Self(dashboard)
    }

    pub fn figure(&self, index: usize) -> Option<&crate::core::Figure> {
        self.0.figures.get(index)
    }
}

#[derive(Resource, Default)]
pub struct TileRegistry {
    pub by_plot: HashMap<PlotId, Entity>,
    pub camera_of: HashMap<PlotId, Entity>,
    /// Overlay 2D cameras of 3D tiles
    pub overlay_of: HashMap<PlotId, Entity>,
    pub dirty: VecDeque<PlotId>,
}

#[derive(Resource, Default)]
pub struct HoveredTile(pub Option<usize>);

#[derive(Resource)]
pub struct UnitMeshes {
    pub quad: Handle<Mesh>,
    pub circle: Handle<Mesh>,
}

/// Font for every label; the default font when no CJK font was found.
#[derive(Resource, Default, Clone)]
pub struct LabelFont(pub Handle<Font>);

impl LabelFont {
    pub fn text(&self, size: f32) -> TextFont {
        TextFont {
            font: self.0.clone(),
            font_size: size,
            ..default()
        }
    }
}

/// Camera that only clears the window; tiles draw over it with their own
/// cameras.
pub fn setup_global_scene(mut commands: Commands) {
    commands.spawn((
        Camera2d,
        Camera {
            order: -1,
            clear_color: ClearColorConfig::Default,
            ..default()
        },
        RenderLayers::none(),
    ));
}

pub fn setup_unit_meshes(mut commands: Commands, mut meshes: ResMut<Assets<Mesh>>) {
    let quad = meshes.add(Mesh::from(Rectangle::new(1.0, 1.0)));
    let circle = meshes.add(Mesh::from(Circle::new(0.5)));
    commands.insert_resource(UnitMeshes { quad, circle });
}

pub fn load_label_font(mut commands: Commands, mut fonts: ResMut<Assets<Font>>) {
    let handle = crate::fonts::label_font()
        .and_then(|font| {
            let bytes = font.read()?;
            match Font::try_from_bytes(bytes) {
                Ok(f) => {
                    info!(family = %font.family, "label font loaded");
                    Some(fonts.add(f))
                }
                Err(e) => {
                    warn!(family = %font.family, error = ?e, "label font could not be parsed");
                    None
                }
            }
        })
        .unwrap_or_default();
    commands.insert_resource(LabelFont(handle));
}
