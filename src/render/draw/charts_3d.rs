//! 3D figure rendering: ribbons, lines, panes and projected tick labels.

#![allow(clippy::too_many_arguments)]

use super::charts_2d::style_color;
use super::common::{
    FRAME, INK, LABEL_SIZE, TICK_SIZE, dash_pattern, draw_tile_border, draw_title, format_tick,
    tick_values,
};
use crate::core::{Artist3D, AxisFormat, Canvas3D};
use crate::render::{Anchored3D, LabelFont, PlotId, TileRect, UnitMeshes};
use bevy::prelude::*;
use bevy_asset::RenderAssetUsages;
use bevy_camera::visibility::RenderLayers;
use bevy_mesh::{Indices, PrimitiveTopology};

/// Half extents of the plot box along data x, y and z
const BOX_HALF: Vec3 = Vec3::new(2.5, 2.5, 1.875);

const PANE: Color = Color::srgb(0.95, 0.95, 0.95);
const GRID: Color = Color::srgb(0.82, 0.82, 0.82);

/// World units per point of line width
const WIDTH_PER_PT: f32 = 0.012;

/// Map data axes onto Bevy's: data z is up, data y points into the screen.
pub fn data_axes_to_world(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.z, -v.y)
}

/// Data limits of a 3D canvas and their mapping into the plot box.
#[derive(Clone, Copy, Debug)]
pub struct PlotBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl PlotBox {
    pub fn of(canvas: &Canvas3D) -> Self {
        let (min, max) = canvas.bounds();
        Self {
            min: Vec3::from_array(min),
            max: Vec3::from_array(max),
        }
    }

    /// Data point to its normalized position, each axis in `[-BOX_HALF, BOX_HALF]`.
    pub fn normalize(&self, p: Vec3) -> Vec3 {
        ((p - self.min) / (self.max - self.min) * 2.0 - 1.0) * BOX_HALF
    }

    pub fn to_world(&self, p: Vec3) -> Vec3 {
        data_axes_to_world(self.normalize(p))
    }
}

/// Which side of the x and y axes faces away from a camera at `azimuth`
/// degrees, as -1 or 1 in normalized box units. Panes are drawn there.
fn far_sides(azimuth: f32) -> (f32, f32) {
    let (sa, ca) = azimuth.to_radians().sin_cos();
    (-ca.signum(), -sa.signum())
}

/// Draw a 3D canvas seen from `azimuth` degrees. Geometry goes to the
/// tile's 3D camera; title, legend and labels go to its 2D overlay camera on
/// the same layer.
pub fn draw_canvas_3d(
    commands: &mut Commands,
    root: Entity,
    canvas: &Canvas3D,
    azimuth: f32,
    rect: &TileRect,
    tile: PlotId,
    unit: &UnitMeshes,
    meshes: &mut Assets<Mesh>,
    color_materials: &mut Assets<ColorMaterial>,
    materials: &mut Assets<StandardMaterial>,
    font: &LabelFont,
    layers: RenderLayers,
) {
    let bounds = PlotBox::of(canvas);
    let stick = meshes.add(Cuboid::new(1.0, 1.0, 1.0));

    draw_panes(commands, root, canvas, azimuth, &bounds, &stick, meshes, materials, &layers);

    for artist in &canvas.artists {
        match artist {
            Artist3D::PolyCollection { quads, face } => {
                let corners: Vec<[Vec3; 4]> = quads
                    .iter()
                    .map(|q| q.map(|p| bounds.to_world(p)))
                    .collect();
                let mesh = meshes.add(quads_mesh(&corners));
                let mat = materials.add(flat_material(style_color(face)));
                commands.entity(root).with_children(|parent| {
                    parent.spawn((
                        Mesh3d(mesh),
                        MeshMaterial3d(mat),
                        Transform::IDENTITY,
                        layers.clone(),
                    ));
                });
            }
            Artist3D::Line { points, stroke, .. } => {
                let world: Vec<Vec3> = points.iter().map(|p| bounds.to_world(*p)).collect();
                let width = stroke.size * WIDTH_PER_PT;
                let segments: Vec<[Vec3; 2]> = if stroke.dashed {
                    dash_pattern(&world, 0.12, 0.06)
                } else {
                    world.windows(2).map(|w| [w[0], w[1]]).collect()
                };
                let mat = materials.add(flat_material(style_color(stroke)));
                commands.entity(root).with_children(|parent| {
                    for [a, b] in segments {
                        spawn_stick(parent, a, b, width, &stick, &mat, &layers);
                    }
                });
            }
        }
    }

    draw_axis_labels(commands, root, canvas, azimuth, &bounds, tile, font, &layers);

    draw_tile_border(
        commands,
        root,
        rect,
        unit,
        color_materials,
        layers.clone(),
        Color::srgb(0.85, 0.85, 0.85),
        6.0,
    );
    draw_title(commands, root, &canvas.meta, rect, font, layers.clone());
    if canvas.legend {
        draw_legend(commands, root, canvas, rect, unit, color_materials, font, layers);
    }
}

fn flat_material(color: Color) -> StandardMaterial {
    StandardMaterial {
        base_color: color,
        alpha_mode: if color.alpha() < 1.0 {
            AlphaMode::Blend
        } else {
            AlphaMode::Opaque
        },
        unlit: true,
        cull_mode: None,
        double_sided: true,
        ..default()
    }
}

/// One mesh holding every quad, two triangles each.
fn quads_mesh(quads: &[[Vec3; 4]]) -> Mesh {
    let mut positions: Vec<[f32; 3]> = Vec::with_capacity(quads.len() * 4);
    let mut normals: Vec<[f32; 3]> = Vec::with_capacity(quads.len() * 4);
    let mut indices: Vec<u32> = Vec::with_capacity(quads.len() * 6);
    for quad in quads {
        let base = positions.len() as u32;
        let n = (quad[1] - quad[0])
            .cross(quad[3] - quad[0])
            .normalize_or_zero();
        for v in quad {
            positions.push(v.to_array());
            normals.push(n.to_array());
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    let uvs = vec![[0.0, 0.0]; positions.len()];

    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::RENDER_WORLD,
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}

/// Spawn a segment as a unit cuboid stretched from `a` to `b`.
fn spawn_stick(
    parent: &mut ChildSpawnerCommands,
    a: Vec3,
    b: Vec3,
    width: f32,
    stick: &Handle<Mesh>,
    mat: &Handle<StandardMaterial>,
    layers: &RenderLayers,
) {
    let length = a.distance(b);
    if length == 0.0 {
        return;
    }
    parent.spawn((
        Mesh3d(stick.clone()),
        MeshMaterial3d(mat.clone()),
        Transform {
            translation: (a + b) * 0.5,
            rotation: Quat::from_rotation_arc(Vec3::X, (b - a) / length),
            scale: Vec3::new(length, width, width),
        },
        layers.clone(),
    ));
}

/// Tick positions in data units with their labels, per axis.
fn axis_ticks(canvas: &Canvas3D, bounds: &PlotBox) -> [Vec<(f32, String)>; 3] {
    let x = if canvas.x_ticks.is_empty() {
        numeric_ticks(bounds.min.x, bounds.max.x, AxisFormat::Numeric)
    } else {
        canvas
            .x_ticks
            .iter()
            .filter(|t| (bounds.min.x..=bounds.max.x).contains(&t.position))
            .map(|t| (t.position, t.label.clone()))
            .collect()
    };
    [
        x,
        numeric_ticks(bounds.min.y, bounds.max.y, canvas.y_format),
        numeric_ticks(bounds.min.z, bounds.max.z, AxisFormat::Numeric),
    ]
}

fn numeric_ticks(lo: f32, hi: f32, format: AxisFormat) -> Vec<(f32, String)> {
    tick_values(lo, hi, 5)
        .into_iter()
        .map(|v| (v, format_tick(v, format)))
        .collect()
}

/// Floor and the two far walls, with grid lines at the tick positions.
fn draw_panes(
    commands: &mut Commands,
    root: Entity,
    canvas: &Canvas3D,
    azimuth: f32,
    bounds: &PlotBox,
    stick: &Handle<Mesh>,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    layers: &RenderLayers,
) {
    let (fx, fy) = far_sides(azimuth);
    let h = BOX_HALF;
    let corner = |x: f32, y: f32, z: f32| data_axes_to_world(Vec3::new(x * h.x, y * h.y, z * h.z));

    let panes = [
        [
            corner(-1.0, -1.0, -1.0),
            corner(1.0, -1.0, -1.0),
            corner(1.0, 1.0, -1.0),
            corner(-1.0, 1.0, -1.0),
        ],
        [
            corner(fx, -1.0, -1.0),
            corner(fx, 1.0, -1.0),
            corner(fx, 1.0, 1.0),
            corner(fx, -1.0, 1.0),
        ],
        [
            corner(-1.0, fy, -1.0),
            corner(1.0, fy, -1.0),
            corner(1.0, fy, 1.0),
            corner(-1.0, fy, 1.0),
        ],
    ];
    let pane_mesh = meshes.add(quads_mesh(&panes));
    let pane_mat = materials.add(flat_material(PANE));
    let grid_mat = materials.add(flat_material(GRID));
    let edge_mat = materials.add(flat_material(FRAME));

    let [x_ticks, y_ticks, z_ticks] = axis_ticks(canvas, bounds);
    let n = |axis: usize, v: f32| bounds.normalize(Vec3::splat(v))[axis] / h[axis];
    let width = 0.8 * WIDTH_PER_PT;
    // grid lines sit slightly in front of the panes
    let lift = 0.002;

    commands.entity(root).with_children(|parent| {
        parent.spawn((
            Mesh3d(pane_mesh),
            MeshMaterial3d(pane_mat),
            Transform::IDENTITY,
            layers.clone(),
        ));

        let floor = -1.0 + lift;
        let (wx, wy) = (fx * (1.0 - lift), fy * (1.0 - lift));
        let mut grid = Vec::new();
        for (x, _) in &x_ticks {
            let x = n(0, *x);
            grid.push((corner(x, -1.0, floor), corner(x, 1.0, floor)));
            grid.push((corner(x, wy, -1.0), corner(x, wy, 1.0)));
        }
        for (y, _) in &y_ticks {
            let y = n(1, *y);
            grid.push((corner(-1.0, y, floor), corner(1.0, y, floor)));
            grid.push((corner(wx, y, -1.0), corner(wx, y, 1.0)));
        }
        for (z, _) in &z_ticks {
            let z = n(2, *z);
            grid.push((corner(wx, -1.0, z), corner(wx, 1.0, z)));
            grid.push((corner(-1.0, wy, z), corner(1.0, wy, z)));
        }
        for (a, b) in grid {
            spawn_stick(parent, a, b, width, stick, &grid_mat, layers);
        }

        // axis lines along the near floor edges and the far vertical edge
        let edges = [
            (corner(-1.0, -fy, -1.0), corner(1.0, -fy, -1.0)),
            (corner(-fx, -1.0, -1.0), corner(-fx, 1.0, -1.0)),
            (corner(-fx, fy, -1.0), corner(-fx, fy, 1.0)),
        ];
        for (a, b) in edges {
            spawn_stick(parent, a, b, WIDTH_PER_PT, stick, &edge_mat, layers);
        }
    });
}

/// Tick labels and axis labels, positioned each frame by projection.
fn draw_axis_labels(
    commands: &mut Commands,
    root: Entity,
    canvas: &Canvas3D,
    azimuth: f32,
    bounds: &PlotBox,
    tile: PlotId,
    font: &LabelFont,
    layers: &RenderLayers,
) {
    let (fx, fy) = far_sides(azimuth);
    let h = BOX_HALF;
    let at = |x: f32, y: f32, z: f32| data_axes_to_world(Vec3::new(x * h.x, y * h.y, z * h.z));
    let n = |axis: usize, v: f32| bounds.normalize(Vec3::splat(v))[axis] / h[axis];
    let [x_ticks, y_ticks, z_ticks] = axis_ticks(canvas, bounds);

    let mut labels: Vec<(String, Vec3, f32)> = Vec::new();
    for (x, label) in x_ticks {
        labels.push((label, at(n(0, x), -fy * 1.18, -1.0), TICK_SIZE));
    }
    for (y, label) in y_ticks {
        labels.push((label, at(-fx * 1.22, n(1, y), -1.0), TICK_SIZE));
    }
    for (z, label) in z_ticks {
        labels.push((label, at(-fx * 1.12, fy, n(2, z)), TICK_SIZE));
    }
    let axis_titles = [
        (&canvas.x_label, at(0.0, -fy * 1.45, -1.0)),
        (&canvas.y_label, at(-fx * 1.55, 0.0, -1.0)),
        (&canvas.z_label, at(-fx * 1.35, fy, 0.0)),
    ];
    for (label, world) in axis_titles {
        if let Some(label) = label {
            labels.push((label.clone(), world, LABEL_SIZE));
        }
    }

    commands.entity(root).with_children(|parent| {
        for (text, world, size) in labels {
            parent.spawn((
                Text2d::new(text),
                font.text(size),
                TextColor(INK),
                Transform::from_xyz(0.0, 0.0, 5.0),
                Anchored3D {
                    tile,
                    world,
                    nudge: Vec2::ZERO,
                },
                layers.clone(),
            ));
        }
    });
}

/// Approximate rendered width of a label; wide glyphs count double.
fn text_width(text: &str, size: f32) -> f32 {
    text.chars()
        .map(|c| if c.is_ascii() { 0.55 } else { 1.0 })
        .sum::<f32>()
        * size
}

/// Legend box in the upper right of the content rect.
fn draw_legend(
    commands: &mut Commands,
    root: Entity,
    canvas: &Canvas3D,
    rect: &TileRect,
    unit: &UnitMeshes,
    materials: &mut Assets<ColorMaterial>,
    font: &LabelFont,
    layers: RenderLayers,
) {
    let entries = canvas.legend_entries();
    if entries.is_empty() {
        return;
    }
    let row = 18.0;
    let swatch = 22.0;
    let pad = 8.0;
    let widest = entries
        .iter()
        .map(|(label, _)| text_width(label, TICK_SIZE))
        .fold(0.0, f32::max);
    let size = Vec2::new(
        pad * 3.0 + swatch + widest,
        pad * 2.0 + row * entries.len() as f32,
    );
    let top_left = Vec2::new(rect.content.max.x - size.x - 6.0, rect.content.max.y - 6.0);

    let back = materials.add(ColorMaterial::from(Color::srgba(1.0, 1.0, 1.0, 0.8)));
    let frame = materials.add(ColorMaterial::from(Color::srgb(0.8, 0.8, 0.8)));
    let swatches: Vec<Handle<ColorMaterial>> = entries
        .iter()
        .map(|(_, color)| materials.add(ColorMaterial::from(Color::from(*color))))
        .collect();

    commands.entity(root).with_children(|parent| {
        let center = top_left + Vec2::new(size.x, -size.y) * 0.5;
        parent.spawn((
            Mesh2d(unit.quad.clone()),
            MeshMaterial2d(frame),
            Transform {
                translation: center.extend(6.0),
                scale: (size + 2.0).extend(1.0),
                ..default()
            },
            layers.clone(),
        ));
        parent.spawn((
            Mesh2d(unit.quad.clone()),
            MeshMaterial2d(back),
            Transform {
                translation: center.extend(6.1),
                scale: size.extend(1.0),
                ..default()
            },
            layers.clone(),
        ));

        for (i, ((label, _), mat)) in entries.iter().zip(swatches).enumerate() {
            let y = top_left.y - pad - row * (i as f32 + 0.5);
            let x = top_left.x + pad;
            parent.spawn((
                Mesh2d(unit.quad.clone()),
                MeshMaterial2d(mat),
                Transform {
                    translation: Vec3::new(x + swatch * 0.5, y, 6.2),
                    scale: Vec3::new(swatch, 2.5, 1.0),
                    ..default()
                },
                layers.clone(),
            ));
            let text_x = x + swatch + pad + text_width(label, TICK_SIZE) * 0.5;
            parent.spawn((
                Text2d::new(label.to_string()),
                font.text(TICK_SIZE),
                TextColor(INK),
                Transform::from_xyz(text_x, y, 6.3),
                layers.clone(),
            ));
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Style;

    fn canvas() -> Canvas3D {
        let mut c = Canvas3D::new();
        c.set_limits([0.0, 4.0], [10.0, 20.0], [0.0, 2.0]).unwrap();
        c
    }

    #[test]
    fn limits_fill_the_box_with_z_up() {
        let b = PlotBox::of(&canvas());
        assert_eq!(b.to_world(Vec3::new(0.0, 10.0, 0.0)), Vec3::new(-2.5, -1.875, 2.5));
        assert_eq!(b.to_world(Vec3::new(4.0, 20.0, 2.0)), Vec3::new(2.5, 1.875, -2.5));
        assert_eq!(b.to_world(Vec3::new(2.0, 15.0, 1.0)), Vec3::ZERO);
    }

    #[test]
    fn panes_face_away_from_the_camera() {
        // azimuth -40 looks from +x, -y
        assert_eq!(far_sides(-40.0), (-1.0, 1.0));
        assert_eq!(far_sides(135.0), (1.0, -1.0));
    }

    #[test]
    fn category_ticks_outside_limits_are_dropped() {
        let mut c = canvas();
        c.set_x_ticks(vec![
            crate::core::Tick { position: 1.0, label: "A".into() },
            crate::core::Tick { position: 5.0, label: "B".into() },
        ]);
        let [x, _, z] = axis_ticks(&c, &PlotBox::of(&c));
        assert_eq!(x, vec![(1.0, "A".to_string())]);
        assert_eq!(z.first().map(|t| t.0), Some(0.0));
    }

    #[test]
    fn quad_mesh_has_two_triangles_per_quad() {
        let q = [Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y];
        let mesh = quads_mesh(&[q, q]);
        assert_eq!(mesh.count_vertices(), 8);
        assert_eq!(mesh.indices().map(|i| i.len()), Some(12));
    }

    #[test]
    fn translucent_faces_blend() {
        let face = Style::default().opacity(0.7);
        assert!(matches!(flat_material(style_color(&face)).alpha_mode, AlphaMode::Blend));
        assert!(matches!(flat_material(Color::WHITE).alpha_mode, AlphaMode::Opaque));
    }
}
