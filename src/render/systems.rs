use super::*;
use crate::core::{Dashboard, Figure};
use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_camera::visibility::RenderLayers;
use bevy_camera::{
    ClearColorConfig, OrthographicProjection, PerspectiveProjection, Projection, ScalingMode,
    Viewport,
};
use bevy_math::UVec2;
use std::collections::HashSet;
use tracing::debug;

/// Logical pixels per inch of figure size
pub const PX_PER_INCH: f32 = 100.0;
/// Upper bound of the initial window size
pub const MAX_WINDOW: Vec2 = Vec2::new(1600.0, 1000.0);

const MARGIN: f32 = 20.0;
const GAP: f32 = 10.0;

/// Room left around the plotting area of 2D tiles for title, ticks and labels
const PAD_LEFT: f32 = 78.0;
const PAD_RIGHT: f32 = 24.0;
const PAD_TOP: f32 = 44.0;
const PAD_BOTTOM: f32 = 58.0;

/// Render layer of a tile; layer 0 is left to untagged entities.
pub fn tile_layers(index: usize) -> RenderLayers {
    RenderLayers::layer(index % 31 + 1)
}

/// Sync dashboard figures to tile entities
pub fn sync_figures_to_tiles(
    mut commands: Commands,
    dash: Res<DashboardRes>,
    mut registry: ResMut<TileRegistry>,
    existing: Query<(Entity, &FigureTile)>,
) {
    let ids: Vec<PlotId> = (0..dash.0.figures.len())
        .map(|i| PlotId(i as u64))
        .collect();

    for (entity, tile) in existing.iter() {
        if !ids.contains(&tile.id) {
            cleanup_tile(&mut commands, &mut registry, entity, tile.id);
        }
    }

    for (i, figure) in dash.0.figures.iter().enumerate() {
        let id = ids[i];
        if !registry.by_plot.contains_key(&id) {
            let tile = spawn_tile(&mut commands, id, i, figure);
            registry.by_plot.insert(id, tile);
            registry.dirty.push_back(id);
        }
    }
}

fn spawn_tile(commands: &mut Commands, id: PlotId, index: usize, figure: &Figure) -> Entity {
    let kind = match figure {
        Figure::TwoD(_) => FigureKind::TwoD,
        Figure::ThreeD(_) => FigureKind::ThreeD,
    };

    let tile = commands
        .spawn((
            FigureTile { id, index, kind },
            kind,
            TileView::default(),
            TileRect {
                world_center: Vec2::ZERO,
                world_size: Vec2::new(100.0, 100.0),
                content: Rect::from_center_size(Vec2::ZERO, Vec2::new(70.0, 70.0)),
                viewport: Viewport {
                    physical_position: UVec2::ZERO,
                    physical_size: UVec2::new(100, 100),
                    depth: 0.0..1.0,
                },
            },
            Transform::default(),
            Visibility::default(),
        ))
        .id();
    if let Figure::ThreeD(canvas) = figure {
        commands
            .entity(tile)
            .insert(OrbitView::from_view(&canvas.view));
    }

    let root = commands
        .spawn((TileRenderRoot, Transform::default(), Visibility::default()))
        .id();
    commands.entity(tile).add_child(root);

    debug!(index, ?kind, title = ?figure.meta().title, "tile spawned");
    tile
}

/// Plotting area of a tile given its world rect.
pub fn content_rect(kind: FigureKind, center: Vec2, size: Vec2) -> Rect {
    let min = center - size * 0.5;
    let max = center + size * 0.5;
    let (pad_min, pad_max) = match kind {
        FigureKind::TwoD => (
            Vec2::new(PAD_LEFT, PAD_BOTTOM),
            Vec2::new(PAD_RIGHT, PAD_TOP),
        ),
        FigureKind::ThreeD => (Vec2::splat(8.0), Vec2::new(8.0, PAD_TOP)),
    };
    let lo = min + pad_min;
    let hi = (max - pad_max).max(lo + Vec2::ONE);
    Rect::from_corners(lo, hi)
}

/// Update tile layout when the window resizes
pub fn update_tile_layout(
    mut commands: Commands,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut registry: ResMut<TileRegistry>,
    mut tiles: Query<(Entity, &FigureTile, &mut TileRect)>,
    dash: Res<DashboardRes>,
) {
    let Ok(window) = windows.single() else {
        return;
    };

    let n = dash.0.figures.len();
    if n == 0 {
        return;
    }

    let (cols, rows) = grid_dims(n, window.width() / window.height(), dash.0.columns);

    let avail_w = window.width() - 2.0 * MARGIN;
    let avail_h = window.height() - 2.0 * MARGIN;

    let tile_w = ((avail_w - (cols - 1) as f32 * GAP) / cols as f32).max(1.0);
    let tile_h = ((avail_h - (rows - 1) as f32 * GAP) / rows as f32).max(1.0);

    for (entity, tile, mut rect) in tiles.iter_mut() {
        let col = tile.index % cols;
        let row = tile.index / cols;

        let vp_x = MARGIN + col as f32 * (tile_w + GAP);
        let vp_y = MARGIN + row as f32 * (tile_h + GAP);

        // viewports are in physical pixels
        let scale = window.resolution.scale_factor();
        let phys_pos = UVec2::new((vp_x * scale).round() as u32, (vp_y * scale).round() as u32);
        let phys_size = UVec2::new(
            (tile_w * scale).round() as u32,
            (tile_h * scale).round() as u32,
        );

        // world origin at the window centre, y up
        let world_center = Vec2::new(
            vp_x + tile_w * 0.5 - window.width() * 0.5,
            window.height() * 0.5 - vp_y - tile_h * 0.5,
        );
        let new_size = Vec2::new(tile_w, tile_h);

        let changed = rect.world_center != world_center
            || rect.world_size != new_size
            || rect.viewport.physical_position != phys_pos
            || rect.viewport.physical_size != phys_size;

        if changed {
            rect.world_center = world_center;
            rect.world_size = new_size;
            rect.content = content_rect(tile.kind, world_center, new_size);
            rect.viewport = Viewport {
                physical_position: phys_pos,
                physical_size: phys_size,
                depth: 0.0..1.0,
            };

            commands.entity(entity).remove::<AutoFitted>();
            registry.dirty.push_back(tile.id);
        }
    }
}

/// Fit 2D tiles to their axis limits after every layout change
pub fn fit_tiles(
    mut commands: Commands,
    mut registry: ResMut<TileRegistry>,
    mut tiles: Query<(Entity, &FigureTile, &TileRect, &mut TileView), Without<AutoFitted>>,
    dash: Res<DashboardRes>,
) {
    for (entity, tile, rect, mut view) in tiles.iter_mut() {
        commands.entity(entity).insert(AutoFitted);

        let Some(canvas) = dash.figure(tile.index).and_then(Figure::as_2d) else {
            continue;
        };
        let Some((min, max)) = canvas.view_bounds() else {
            continue;
        };

        *view = fit_view(rect, min, max, canvas.equal_aspect);
        registry.dirty.push_back(tile.id);
    }
}

/// Create or update the cameras of every tile
pub fn sync_tile_cameras(
    mut commands: Commands,
    mut registry: ResMut<TileRegistry>,
    tiles: Query<(&FigureTile, &TileRect, Option<&OrbitView>)>,
    existing: Query<Entity, Or<(With<TileCamera>, With<TileOverlayCamera>)>>,
) {
    let mut used = HashSet::new();

    for (tile, rect, orbit) in tiles.iter() {
        let layers = tile_layers(tile.index);
        let order = 10 + 2 * tile.index as isize;

        let cam_entity = if let Some(&cam) = registry.camera_of.get(&tile.id) {
            cam
        } else {
            let cam = commands.spawn((TileCamera, Transform::default())).id();
            registry.camera_of.insert(tile.id, cam);
            cam
        };
        used.insert(cam_entity);

        // earlier cameras already cleared the window; a cleared tile would wipe them
        let camera = Camera {
            viewport: Some(rect.viewport.clone()),
            order,
            clear_color: ClearColorConfig::None,
            ..default()
        };

        match (tile.kind, orbit) {
            (FigureKind::ThreeD, Some(orbit)) => {
                commands.entity(cam_entity).insert((
                    Camera3d::default(),
                    camera,
                    Projection::from(PerspectiveProjection::default()),
                    Transform::from_translation(orbit.eye()).looking_at(Vec3::ZERO, Vec3::Y),
                    layers.clone(),
                ));

                let overlay = if let Some(&cam) = registry.overlay_of.get(&tile.id) {
                    cam
                } else {
                    let cam = commands
                        .spawn((TileOverlayCamera, Transform::default()))
                        .id();
                    registry.overlay_of.insert(tile.id, cam);
                    cam
                };
                used.insert(overlay);
                commands.entity(overlay).insert((
                    Camera2d,
                    Camera {
                        viewport: Some(rect.viewport.clone()),
                        order: order + 1,
                        clear_color: ClearColorConfig::None,
                        ..default()
                    },
                    Projection::from(ortho_for(rect)),
                    Transform::from_translation(rect.world_center.extend(1000.0)),
                    layers,
                ));
            }
            _ => {
                commands.entity(cam_entity).insert((
                    Camera2d,
                    camera,
                    Projection::from(ortho_for(rect)),
                    Transform::from_translation(rect.world_center.extend(1000.0)),
                    layers,
                ));
            }
        }
    }

    for cam_entity in existing.iter() {
        if !used.contains(&cam_entity) {
            commands.entity(cam_entity).despawn();
        }
    }
}

fn ortho_for(rect: &TileRect) -> OrthographicProjection {
    let mut ortho = OrthographicProjection::default_2d();
    ortho.scaling_mode = ScalingMode::FixedVertical {
        viewport_height: rect.world_size.y,
    };
    ortho
}

/// Cursor position in world coordinates, origin at the window centre
fn cursor_world(window: &Window) -> Option<Vec2> {
    let cursor = window.cursor_position()?;
    Some(Vec2::new(
        cursor.x - window.width() * 0.5,
        window.height() * 0.5 - cursor.y,
    ))
}

/// Handle hover detection
pub fn update_hovered_tile(
    windows: Query<&Window, With<PrimaryWindow>>,
    tiles: Query<(&FigureTile, &TileRect)>,
    mut hovered: ResMut<HoveredTile>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let Some(world) = cursor_world(window) else {
        hovered.0 = None;
        return;
    };

    hovered.0 = tiles
        .iter()
        .find(|(_, rect)| {
            Rect::from_center_size(rect.world_center, rect.world_size).contains(world)
        })
        .map(|(tile, _)| tile.index);
}

/// Pan and zoom 2D tiles, orbit 3D tiles
pub fn handle_input(
    windows: Query<&Window, With<PrimaryWindow>>,
    mut tiles: Query<(&FigureTile, &TileRect, &mut TileView, Option<&mut OrbitView>)>,
    mut registry: ResMut<TileRegistry>,
    hovered: Res<HoveredTile>,
    mouse: Res<ButtonInput<MouseButton>>,
    mut wheel: MessageReader<MouseWheel>,
    mut motion: MessageReader<MouseMotion>,
) {
    // messages are drained every frame, hovered or not
    let zoom_delta: f32 = wheel.read().map(|e| e.y).sum();
    let drag: Vec2 = motion.read().map(|e| e.delta).sum();

    let Some(hovered_index) = hovered.0 else {
        return;
    };
    let drag = if mouse.pressed(MouseButton::Left) {
        drag
    } else {
        Vec2::ZERO
    };
    if zoom_delta == 0.0 && drag == Vec2::ZERO {
        return;
    }
    let anchor = windows.single().ok().and_then(cursor_world);

    for (tile, rect, mut view, orbit) in tiles.iter_mut() {
        if tile.index != hovered_index {
            continue;
        }

        match orbit {
            Some(mut orbit) => {
                let before = orbit.azimuth.sin_cos();
                orbit.orbit(drag, zoom_delta);
                let after = orbit.azimuth.sin_cos();
                // panes move to the other side when a quadrant is crossed
                if before.0.signum() != after.0.signum() || before.1.signum() != after.1.signum() {
                    registry.dirty.push_back(tile.id);
                }
            }
            None => {
                if zoom_delta != 0.0 {
                    let anchor = anchor.unwrap_or(rect.content.center());
                    view.zoom_about(1.0 + zoom_delta * 0.1, anchor, rect.world_center);
                }
                // offset is in world units
                view.offset += Vec2::new(drag.x, -drag.y);
                registry.dirty.push_back(tile.id);
            }
        }
    }
}

/// Move every projected label to where its anchor lands on screen
pub fn place_anchored_labels(
    registry: Res<TileRegistry>,
    cameras: Query<(&Camera, &GlobalTransform), With<TileCamera>>,
    tiles: Query<&TileRect>,
    mut labels: Query<(&Anchored3D, &mut Transform, &mut Visibility)>,
) {
    for (anchor, mut transform, mut visibility) in labels.iter_mut() {
        let rect = registry
            .by_plot
            .get(&anchor.tile)
            .and_then(|&e| tiles.get(e).ok());
        let camera = registry
            .camera_of
            .get(&anchor.tile)
            .and_then(|&e| cameras.get(e).ok());
        let (Some(rect), Some((camera, cam_transform))) = (rect, camera) else {
            continue;
        };

        let view_from_world = cam_transform.affine().inverse();
        let ndc = camera
            .clip_from_view()
            .project_point3(view_from_world.transform_point3(anchor.world));
        match ndc_to_tile(ndc, rect) {
            Some(pos) => {
                transform.translation = (pos + anchor.nudge).extend(transform.translation.z);
                *visibility = Visibility::Inherited;
            }
            None => *visibility = Visibility::Hidden,
        }
    }
}

/// World position in a tile's overlay of a point in normalized device
/// coordinates, or `None` when it lies behind the camera.
pub fn ndc_to_tile(ndc: Vec3, rect: &TileRect) -> Option<Vec2> {
    // reverse-z: depth in (0, 1] is in front of the camera
    if !ndc.is_finite() || ndc.z <= 0.0 || ndc.z > 1.0 {
        return None;
    }
    Some(rect.world_center + ndc.truncate() * rect.world_size * 0.5)
}

/// Draw only dirty tiles
pub fn draw_dirty_tiles(
    mut commands: Commands,
    mut registry: ResMut<TileRegistry>,
    tiles: Query<(&FigureTile, &TileRect, &TileView, Option<&OrbitView>)>,
    children_q: Query<&Children>,
    is_root_q: Query<(), With<TileRenderRoot>>,
    dash: Res<DashboardRes>,
    unit: Res<UnitMeshes>,
    font: Res<LabelFont>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut color_materials: ResMut<Assets<ColorMaterial>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let mut drawn = HashSet::new();
    while let Some(id) = registry.dirty.pop_front() {
        if !drawn.insert(id) {
            continue;
        }
        let Some(&tile_entity) = registry.by_plot.get(&id) else {
            continue;
        };
        let Ok((tile, rect, view, orbit)) = tiles.get(tile_entity) else {
            continue;
        };

        // replace the render root, keeping the tile
        if let Ok(children) = children_q.get(tile_entity) {
            for child in children.iter() {
                if is_root_q.get(child).is_ok() {
                    commands.entity(child).try_despawn();
                }
            }
        }
        let root = commands
            .spawn((TileRenderRoot, Transform::default(), Visibility::default()))
            .id();
        commands.entity(tile_entity).add_child(root);

        let layers = tile_layers(tile.index);
        match dash.figure(tile.index) {
            Some(Figure::TwoD(canvas)) => draw_canvas_2d(
                &mut commands,
                root,
                canvas,
                rect,
                view,
                &unit,
                &mut meshes,
                &mut color_materials,
                &font,
                layers,
            ),
            Some(Figure::ThreeD(canvas)) => {
                let azimuth = orbit.map_or(canvas.view.azimuth, |o| o.azimuth.to_degrees());
                draw_canvas_3d(
                    &mut commands,
                    root,
                    canvas,
                    azimuth,
                    rect,
                    id,
                    &unit,
                    &mut meshes,
                    &mut color_materials,
                    &mut materials,
                    &font,
                    layers,
                );
            }
            None => {}
        }
    }
}

/// Resize the primary window to fit every figure at its requested size
pub fn size_primary_window(
    dash: Res<DashboardRes>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
) {
    let Ok(mut window) = windows.single_mut() else {
        return;
    };
    let size = preferred_window_size(&dash.0);
    window.resolution.set(size.x, size.y);
    debug!(width = size.x, height = size.y, "window sized for dashboard");
}

/// Logical window size that shows each figure at its requested size in
/// inches, capped at [`MAX_WINDOW`].
pub fn preferred_window_size(dashboard: &Dashboard) -> Vec2 {
    let n = dashboard.figures.len();
    if n == 0 {
        return Vec2::new(800.0, 600.0);
    }
    let tile = dashboard
        .figures
        .iter()
        .map(|f| f.meta().size * PX_PER_INCH)
        .fold(Vec2::ONE, Vec2::max);
    let (cols, rows) = grid_dims(n, tile.x / tile.y, dashboard.columns);
    let grid = Vec2::new(cols as f32, rows as f32);
    (tile * grid + (grid - 1.0) * GAP + 2.0 * MARGIN).min(MAX_WINDOW)
}

/// Columns and rows of the tile grid; `columns` overrides the automatic
/// choice.
pub fn grid_dims(n: usize, aspect: f32, columns: Option<usize>) -> (usize, usize) {
    if n == 0 {
        return (0, 0);
    }
    if let Some(cols) = columns {
        let cols = cols.clamp(1, n);
        return (cols, n.div_ceil(cols));
    }
    match n {
        1 => (1, 1),
        2 if aspect > 1.35 => (2, 1),
        2 => (1, 2),
        3 if aspect > 1.35 => (3, 1),
        3 => (2, 2),
        _ => {
            let cols = (n as f32).sqrt().ceil() as usize;
            (cols, n.div_ceil(cols))
        }
    }
}

fn cleanup_tile(commands: &mut Commands, registry: &mut TileRegistry, entity: Entity, id: PlotId) {
    commands.entity(entity).despawn();
    registry.by_plot.remove(&id);
    for cam in [registry.camera_of.remove(&id), registry.overlay_of.remove(&id)]
        .into_iter()
        .flatten()
    {
        commands.entity(cam).try_despawn();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Canvas2D, Canvas3D, FigureMeta};

    #[test]
    fn grid_follows_window_aspect() {
        assert_eq!(grid_dims(0, 1.0, None), (0, 0));
        assert_eq!(grid_dims(1, 1.0, None), (1, 1));
        assert_eq!(grid_dims(2, 2.0, None), (2, 1));
        assert_eq!(grid_dims(2, 1.0, None), (1, 2));
        assert_eq!(grid_dims(3, 1.0, None), (2, 2));
        assert_eq!(grid_dims(5, 1.0, None), (3, 2));
    }

    #[test]
    fn column_override_is_clamped() {
        assert_eq!(grid_dims(5, 1.0, Some(1)), (1, 5));
        assert_eq!(grid_dims(5, 1.0, Some(2)), (2, 3));
        assert_eq!(grid_dims(3, 1.0, Some(10)), (3, 1));
        assert_eq!(grid_dims(3, 1.0, Some(0)), (1, 3));
    }

    #[test]
    fn window_fits_figure_size() {
        let meta = FigureMeta {
            size: Vec2::new(8.0, 6.0),
            ..FigureMeta::default()
        };
        let one = Dashboard {
            figures: vec![Canvas2D::new().meta(meta.clone()).into()],
            ..Dashboard::default()
        };
        assert_eq!(preferred_window_size(&one), Vec2::new(840.0, 640.0));

        let wide = Dashboard {
            figures: vec![
                Canvas3D::new()
                    .meta(FigureMeta {
                        size: Vec2::new(12.0, 6.0),
                        ..meta
                    })
                    .into(),
                Canvas2D::new().into(),
            ],
            ..Dashboard::default()
        };
        assert_eq!(preferred_window_size(&wide), Vec2::new(1600.0, 640.0));
    }

    #[test]
    fn content_leaves_room_for_labels() {
        let rect = content_rect(FigureKind::TwoD, Vec2::ZERO, Vec2::new(400.0, 300.0));
        assert_eq!(rect.min, Vec2::new(-200.0 + PAD_LEFT, -150.0 + PAD_BOTTOM));
        assert_eq!(rect.max, Vec2::new(200.0 - PAD_RIGHT, 150.0 - PAD_TOP));

        let tiny = content_rect(FigureKind::TwoD, Vec2::ZERO, Vec2::new(50.0, 50.0));
        assert!(tiny.width() >= 1.0 && tiny.height() >= 1.0);
    }

    #[test]
    fn ndc_maps_onto_the_tile() {
        let rect = TileRect {
            world_center: Vec2::new(100.0, -50.0),
            world_size: Vec2::new(200.0, 100.0),
            content: Rect::default(),
            viewport: Viewport::default(),
        };
        assert_eq!(
            ndc_to_tile(Vec3::new(1.0, -1.0, 0.5), &rect),
            Some(Vec2::new(200.0, -100.0))
        );
        assert_eq!(ndc_to_tile(Vec3::new(0.0, 0.0, -0.2), &rect), None);
    }
}
