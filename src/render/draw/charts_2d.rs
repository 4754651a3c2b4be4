//! 2D figure rendering: circles, filled polygons, polylines and markers.

#![allow(clippy::too_many_arguments)]

use super::common::{
    PX_PER_PT, dash_pattern, data_to_world, draw_axes_2d, draw_tile_border, draw_title,
    spawn_segment_2d,
};
use crate::core::{Artist2D, Canvas2D, Marker, Style};
use crate::render::{LabelFont, TileRect, TileView, UnitMeshes};
use bevy::prelude::*;
use bevy_asset::RenderAssetUsages;
use bevy_camera::visibility::RenderLayers;
use bevy_mesh::{Indices, PrimitiveTopology};
use lyon_tessellation::math::point;
use lyon_tessellation::path::Path;
use lyon_tessellation::{BuffersBuilder, FillOptions, FillTessellator, FillVertex, VertexBuffers};
use tracing::warn;

/// Depth step between consecutive artists, keeping draw order under blending
const ARTIST_DZ: f32 = 0.001;

/// Draw a 2D canvas: frame, artists in insertion order, then labels.
pub fn draw_canvas_2d(
    commands: &mut Commands,
    root: Entity,
    canvas: &Canvas2D,
    rect: &TileRect,
    view: &TileView,
    unit: &UnitMeshes,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<ColorMaterial>,
    font: &LabelFont,
    layers: RenderLayers,
) {
    let background = materials.add(ColorMaterial::from(Color::from(canvas.meta.background)));
    commands.entity(root).with_children(|parent| {
        parent.spawn((
            Mesh2d(unit.quad.clone()),
            MeshMaterial2d(background),
            Transform {
                translation: rect.world_center.extend(-1.0),
                scale: rect.world_size.extend(1.0),
                ..default()
            },
            layers.clone(),
        ));
    });
    draw_tile_border(
        commands,
        root,
        rect,
        unit,
        materials,
        layers.clone(),
        Color::srgb(0.85, 0.85, 0.85),
        6.0,
    );

    for (k, artist) in canvas.artists.iter().enumerate() {
        let z = 0.1 + k as f32 * ARTIST_DZ;
        match artist {
            Artist2D::Circle {
                center,
                radius,
                fill,
            } => {
                let mat = materials.add(ColorMaterial::from(style_color(fill)));
                let world = data_to_world(*center, rect, view);
                commands.entity(root).with_children(|parent| {
                    parent.spawn((
                        Mesh2d(unit.circle.clone()),
                        MeshMaterial2d(mat),
                        Transform {
                            translation: world.extend(z),
                            scale: (view.scale * 2.0 * *radius).extend(1.0),
                            ..default()
                        },
                        layers.clone(),
                    ));
                });
            }
            Artist2D::Polygon { vertices, fill } => {
                let Some((positions, indices)) = tessellate_polygon(vertices) else {
                    continue;
                };
                let positions: Vec<[f32; 3]> = positions
                    .into_iter()
                    .map(|p| data_to_world(p, rect, view).extend(0.0).to_array())
                    .collect();
                let mesh = meshes.add(flat_mesh(positions, indices));
                let mat = materials.add(ColorMaterial::from(style_color(fill)));
                commands.entity(root).with_children(|parent| {
                    parent.spawn((
                        Mesh2d(mesh),
                        MeshMaterial2d(mat),
                        Transform::from_translation(Vec3::Z * z),
                        layers.clone(),
                    ));
                });
            }
            Artist2D::Line { points, stroke } => {
                let mat = materials.add(ColorMaterial::from(style_color(stroke)));
                draw_polyline(commands, root, points, stroke, z, rect, view, unit, &mat, &layers);
            }
            Artist2D::Marker(marker) => {
                draw_marker(
                    commands, root, marker, z, rect, view, unit, meshes, materials, &layers,
                );
            }
        }
    }

    draw_axes_2d(
        commands,
        root,
        canvas.x_label.as_deref(),
        canvas.y_label.as_deref(),
        rect,
        view,
        unit,
        materials,
        font,
        layers.clone(),
    );
    draw_title(commands, root, &canvas.meta, rect, font, layers);
}

/// Bevy color of a style, opacity folded into alpha.
pub fn style_color(style: &Style) -> Color {
    style.color.with_a(style.color.a * style.opacity).into()
}

fn draw_polyline(
    commands: &mut Commands,
    root: Entity,
    points: &[Vec2],
    stroke: &Style,
    z: f32,
    rect: &TileRect,
    view: &TileView,
    unit: &UnitMeshes,
    mat: &Handle<ColorMaterial>,
    layers: &RenderLayers,
) {
    let width = stroke.size * PX_PER_PT;
    let world: Vec<Vec3> = points
        .iter()
        .map(|p| data_to_world(*p, rect, view).extend(0.0))
        .collect();
    let segments: Vec<[Vec3; 2]> = if stroke.dashed {
        dash_pattern(&world, width * 3.7, width * 1.6)
    } else {
        world.windows(2).map(|w| [w[0], w[1]]).collect()
    };

    let half = rect.world_size * 0.5;
    let (lo, hi) = (rect.world_center - half, rect.world_center + half);
    commands.entity(root).with_children(|parent| {
        for [a, b] in segments {
            let (a, b) = (a.truncate(), b.truncate());
            // segments entirely outside the tile are skipped
            if (a.x < lo.x && b.x < lo.x)
                || (a.x > hi.x && b.x > hi.x)
                || (a.y < lo.y && b.y < lo.y)
                || (a.y > hi.y && b.y > hi.y)
            {
                continue;
            }
            spawn_segment_2d(parent, a, b, width, z, unit, mat, layers);
        }
    });
}

fn draw_marker(
    commands: &mut Commands,
    root: Entity,
    marker: &Marker,
    z: f32,
    rect: &TileRect,
    view: &TileView,
    unit: &UnitMeshes,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<ColorMaterial>,
    layers: &RenderLayers,
) {
    let center = data_to_world(marker.at, rect, view);
    if !rect.content.inflate(marker.diameter()).contains(center) {
        return;
    }
    let diameter = marker.diameter() * PX_PER_PT;
    let edge = marker.edge_width * PX_PER_PT;
    // the edge stroke is centred on the marker outline
    let inner = (diameter - edge).max(0.0) * 0.5;
    let outer = (diameter + edge) * 0.5;

    let face = materials.add(ColorMaterial::from(Color::from(
        marker.face.with_a(marker.opacity),
    )));
    commands.entity(root).with_children(|parent| {
        parent.spawn((
            Mesh2d(unit.circle.clone()),
            MeshMaterial2d(face),
            Transform {
                translation: center.extend(z),
                scale: Vec3::new(inner * 2.0, inner * 2.0, 1.0),
                ..default()
            },
            layers.clone(),
        ));
    });

    if edge > 0.0 {
        let ring = meshes.add(Annulus::new(inner, outer));
        let edge_mat = materials.add(ColorMaterial::from(Color::from(
            marker.edge.with_a(marker.opacity),
        )));
        commands.entity(root).with_children(|parent| {
            parent.spawn((
                Mesh2d(ring),
                MeshMaterial2d(edge_mat),
                Transform::from_translation(center.extend(z + ARTIST_DZ * 0.5)),
                layers.clone(),
            ));
        });
    }
}

/// Triangulate a closed outline with the non-zero fill rule.
///
/// Returns the vertex positions and triangle indices, or `None` when the
/// outline is degenerate or the tessellator rejects it.
pub fn tessellate_polygon(outline: &[Vec2]) -> Option<(Vec<Vec2>, Vec<u32>)> {
    let doubled_area: f32 = outline
        .iter()
        .zip(outline.iter().cycle().skip(1))
        .map(|(a, b)| a.perp_dot(*b))
        .sum();
    if outline.len() < 3 || doubled_area.abs() <= f32::EPSILON {
        return None;
    }
    let mut builder = Path::builder();
    builder.begin(point(outline[0].x, outline[0].y));
    for p in &outline[1..] {
        builder.line_to(point(p.x, p.y));
    }
    builder.end(true);
    let path = builder.build();

    let mut buffers: VertexBuffers<Vec2, u32> = VertexBuffers::new();
    let result = FillTessellator::new().tessellate_path(
        &path,
        &FillOptions::non_zero(),
        &mut BuffersBuilder::new(&mut buffers, |v: FillVertex| {
            let p = v.position();
            Vec2::new(p.x, p.y)
        }),
    );
    if let Err(e) = result {
        warn!(error = ?e, vertices = outline.len(), "polygon tessellation failed");
        return None;
    }
    if buffers.indices.is_empty() {
        return None;
    }
    Some((buffers.vertices, buffers.indices))
}

fn flat_mesh(positions: Vec<[f32; 3]>, indices: Vec<u32>) -> Mesh {
    let vertex_count = positions.len();
    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::RENDER_WORLD,
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, vec![[0.0, 0.0, 1.0]; vertex_count]);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, vec![[0.0, 0.0]; vertex_count]);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(positions: &[Vec2], indices: &[u32]) -> f32 {
        indices
            .chunks_exact(3)
            .map(|t| {
                let (a, b, c) = (
                    positions[t[0] as usize],
                    positions[t[1] as usize],
                    positions[t[2] as usize],
                );
                (b - a).perp_dot(c - a).abs() * 0.5
            })
            .sum()
    }

    #[test]
    fn fill_under_line_covers_its_area() {
        // line (0,1) (1,3) (2,1) closed back along the x axis
        let outline = crate::geometry::fill_polygon(&[
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 3.0),
            Vec2::new(2.0, 1.0),
        ]);
        let (positions, indices) = tessellate_polygon(&outline).unwrap();
        assert_eq!(indices.len() % 3, 0);
        assert!((area(&positions, &indices) - 4.0).abs() < 1e-3);
    }

    #[test]
    fn concave_outline() {
        let outline = [
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(4.0, 4.0),
            Vec2::new(2.0, 1.0),
            Vec2::new(0.0, 4.0),
        ];
        let (positions, indices) = tessellate_polygon(&outline).unwrap();
        assert!((area(&positions, &indices) - 10.0).abs() < 1e-3);
    }

    #[test]
    fn degenerate_outlines_yield_nothing() {
        assert!(tessellate_polygon(&[Vec2::ZERO, Vec2::X]).is_none());
        let flat = [Vec2::ZERO, Vec2::X, Vec2::new(2.0, 0.0)];
        assert!(tessellate_polygon(&flat).is_none());
    }

    #[test]
    fn opacity_multiplies_alpha() {
        let style = Style::default()
            .color(crate::core::Color::rgb(1.0, 0.0, 0.0))
            .opacity(0.3);
        assert_eq!(style_color(&style), Color::srgba(1.0, 0.0, 0.0, 0.3));
    }
}
