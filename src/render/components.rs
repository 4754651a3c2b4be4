use bevy::prelude::*;
use bevy_camera::Viewport;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Component, Clone, Copy, Hash, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct PlotId(pub u64);

impl Default for PlotId {
    fn default() -> Self {
        static CTR: AtomicU32 = AtomicU32::new(1);
        Self(CTR.fetch_add(1, Ordering::Relaxed).into())
    }
}

impl PlotId {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Component)]
pub struct FigureTile {
    pub id: PlotId,
    pub index: usize,
    pub kind: FigureKind,
}

#[derive(Component, Clone, Copy, PartialEq, Eq, Debug)]
pub enum FigureKind {
    TwoD,
    ThreeD,
}

/// Data-to-world mapping of a 2D tile: `world = center + offset + data * scale`.
#[derive(Component, Clone, Copy, Debug)]
pub struct TileView {
    pub offset: Vec2,
    pub scale: Vec2,
    /// Scale that fits the figure limits into the content rect
    pub fit_scale: Vec2,
}

impl Default for TileView {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: Vec2::ONE,
            fit_scale: Vec2::ONE,
        }
    }
}

impl TileView {
    pub const MIN_ZOOM: f32 = 0.5;
    pub const MAX_ZOOM: f32 = 4.0;

    /// Multiply the scale by `factor`, keeping `anchor` (world) fixed.
    pub fn zoom_about(&mut self, factor: f32, anchor: Vec2, center: Vec2) {
        let zoom =
            (self.scale.x / self.fit_scale.x * factor).clamp(Self::MIN_ZOOM, Self::MAX_ZOOM);
        let new_scale = self.fit_scale * zoom;
        let data = (anchor - center - self.offset) / self.scale;
        self.offset = anchor - center - data * new_scale;
        self.scale = new_scale;
    }
}

#[derive(Component)]
pub struct TileRect {
    pub world_center: Vec2,
    pub world_size: Vec2,
    /// Plotting area inside the tile, leaving room for title, ticks and labels
    pub content: Rect,
    pub viewport: Viewport,
}

#[derive(Component)]
pub struct TileRenderRoot;

#[derive(Component)]
pub struct TileCamera;

/// 2D camera drawn over a 3D tile for its title, labels and legend
#[derive(Component)]
pub struct TileOverlayCamera;

/// Set once a 2D tile's view matches its current layout
#[derive(Component)]
pub struct AutoFitted;

/// Orbit camera state of a 3D tile, angles in radians.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct OrbitView {
    pub elevation: f32,
    pub azimuth: f32,
    pub radius: f32,
}

impl OrbitView {
    pub const MIN_RADIUS: f32 = 5.0;
    pub const MAX_RADIUS: f32 = 30.0;

    pub fn from_view(view: &crate::core::View3D) -> Self {
        Self {
            elevation: view.elevation.to_radians(),
            azimuth: view.azimuth.to_radians(),
            radius: 11.0,
        }
    }

    /// Apply a mouse drag in pixels and a wheel delta in lines.
    pub fn orbit(&mut self, drag: Vec2, wheel: f32) {
        let limit = std::f32::consts::FRAC_PI_2 - 0.01;
        self.azimuth -= drag.x * 0.01;
        self.elevation = (self.elevation + drag.y * 0.01).clamp(-limit, limit);
        self.radius = (self.radius * (1.0 - wheel * 0.1)).clamp(Self::MIN_RADIUS, Self::MAX_RADIUS);
    }

    /// Camera position around the origin, in world space.
    pub fn eye(&self) -> Vec3 {
        let (se, ce) = self.elevation.sin_cos();
        let (sa, ca) = self.azimuth.sin_cos();
        super::draw::data_axes_to_world(Vec3::new(ce * ca, ce * sa, se) * self.radius)
    }
}

/// Text positioned each frame at the screen projection of a point in a
/// 3D tile.
#[derive(Component)]
pub struct Anchored3D {
    pub tile: PlotId,
    pub world: Vec3,
    /// Screen-space offset in pixels
    pub nudge: Vec2,
}
