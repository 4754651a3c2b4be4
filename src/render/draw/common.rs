//! Drawing utilities shared by 2D and 3D figures.

#![allow(clippy::too_many_arguments)]

use crate::core::{AxisFormat, FigureMeta};
use crate::geometry::date_label;
use crate::render::{LabelFont, TileRect, TileView, UnitMeshes};
use bevy::prelude::*;
use bevy_camera::visibility::RenderLayers;

/// Logical pixels per typographic point
pub const PX_PER_PT: f32 = 4.0 / 3.0;

pub const INK: Color = Color::srgb(0.15, 0.15, 0.15);
pub const FRAME: Color = Color::srgb(0.2, 0.2, 0.2);

pub const TITLE_SIZE: f32 = 16.0;
pub const LABEL_SIZE: f32 = 13.0;
pub const TICK_SIZE: f32 = 11.0;

/// Draw a border around a tile rect.
pub fn draw_tile_border(
    commands: &mut Commands,
    root: Entity,
    rect: &TileRect,
    unit: &UnitMeshes,
    materials: &mut Assets<ColorMaterial>,
    layers: RenderLayers,
    color: Color,
    z: f32,
) {
    let border_mat = materials.add(ColorMaterial::from(color));
    let thickness = 1.0;

    commands.entity(root).with_children(|parent| {
        for (dx, dy) in [(0.0, 0.5), (0.0, -0.5), (-0.5, 0.0), (0.5, 0.0)] {
            parent.spawn((
                Mesh2d(unit.quad.clone()),
                MeshMaterial2d(border_mat.clone()),
                Transform {
                    translation: Vec3::new(
                        rect.world_center.x + dx * rect.world_size.x,
                        rect.world_center.y + dy * rect.world_size.y,
                        z,
                    ),
                    scale: if dx == 0.0 {
                        Vec3::new(rect.world_size.x, thickness, 1.0)
                    } else {
                        Vec3::new(thickness, rect.world_size.y, 1.0)
                    },
                    ..default()
                },
                layers.clone(),
            ));
        }
    });
}

/// Draw the figure title centred above the content rect.
pub fn draw_title(
    commands: &mut Commands,
    root: Entity,
    meta: &FigureMeta,
    rect: &TileRect,
    font: &LabelFont,
    layers: RenderLayers,
) {
    let Some(title) = &meta.title else {
        return;
    };
    let y = (rect.content.max.y + rect.world_center.y + rect.world_size.y * 0.5) * 0.5;
    commands.entity(root).with_children(|parent| {
        parent.spawn((
            Text2d::new(title.clone()),
            font.text(TITLE_SIZE),
            TextColor(INK),
            Transform::from_translation(Vec3::new(rect.content.center().x, y, 3.0)),
            layers,
        ));
    });
}

/// Convert data coordinates to world coordinates.
pub fn data_to_world(data: Vec2, rect: &TileRect, view: &TileView) -> Vec2 {
    rect.world_center + view.offset + data * view.scale
}

/// Convert world coordinates to data coordinates.
pub fn world_to_data(world: Vec2, rect: &TileRect, view: &TileView) -> Vec2 {
    (world - rect.world_center - view.offset) / view.scale
}

/// View that maps the data box `min..max` onto the content rect.
///
/// A degenerate axis is widened to one unit around its value. With
/// `equal` both axes share the smaller scale, centred in the content rect.
pub fn fit_view(rect: &TileRect, min: [f32; 2], max: [f32; 2], equal: bool) -> TileView {
    let widen = |lo: f32, hi: f32| if hi > lo { (lo, hi) } else { (lo - 0.5, hi + 0.5) };
    let (x0, x1) = widen(min[0], max[0]);
    let (y0, y1) = widen(min[1], max[1]);
    let data_size = Vec2::new(x1 - x0, y1 - y0);
    let data_center = Vec2::new(x0 + x1, y0 + y1) * 0.5;

    let mut scale = rect.content.size() / data_size;
    if equal {
        scale = Vec2::splat(scale.min_element());
    }
    TileView {
        offset: rect.content.center() - rect.world_center - data_center * scale,
        scale,
        fit_scale: scale,
    }
}

/// Calculate a round tick step for the given range.
pub fn nice_step(range: f32, target_ticks: usize) -> f32 {
    if range <= 0.0 || !range.is_finite() {
        return 1.0;
    }
    let rough = range / target_ticks.max(1) as f32;
    let base = 10f32.powf(rough.log10().floor());

    let nice = match rough / base {
        n if n <= 1.5 => 1.0,
        n if n <= 3.0 => 2.0,
        n if n <= 7.0 => 5.0,
        _ => 10.0,
    };
    nice * base
}

/// Multiples of a round step inside `lo..=hi`.
pub fn tick_values(lo: f32, hi: f32, target_ticks: usize) -> Vec<f32> {
    if !(hi > lo) || !lo.is_finite() || !hi.is_finite() {
        return vec![];
    }
    let step = nice_step(hi - lo, target_ticks);
    let first = (lo / step).ceil() as i64;
    let last = (hi / step).floor() as i64;
    (first..=last).map(|i| i as f32 * step).collect()
}

/// Format a tick value for display.
pub fn format_tick(val: f32, format: AxisFormat) -> String {
    if let AxisFormat::Date { origin } = format {
        return date_label(origin + val as f64);
    }
    if val == 0.0 {
        "0".into()
    } else if val.abs() < 0.001 || val.abs() >= 1e5 {
        format!("{val:.1e}")
    } else if val.fract().abs() < 1e-4 {
        format!("{val:.0}")
    } else if val.abs() < 1.0 {
        format!("{val:.2}")
    } else {
        format!("{val:.1}")
    }
}

/// Split a polyline into dashes of length `on` separated by gaps of `off`.
pub fn dash_pattern(points: &[Vec3], on: f32, off: f32) -> Vec<[Vec3; 2]> {
    let mut dashes = Vec::new();
    if on <= 0.0 {
        return dashes;
    }
    let period = on + off;
    // position inside the current period, carried across vertices
    let mut phase = 0.0;
    for w in points.windows(2) {
        let (a, b) = (w[0], w[1]);
        let len = a.distance(b);
        if len == 0.0 {
            continue;
        }
        let dir = (b - a) / len;
        let mut t = 0.0;
        while t < len {
            if phase < on {
                let end = (t + on - phase).min(len);
                dashes.push([a + dir * t, a + dir * end]);
                phase += end - t;
                t = end;
            } else {
                let end = (t + period - phase).min(len);
                phase += end - t;
                t = end;
            }
            if phase >= period {
                phase = 0.0;
            }
        }
    }
    dashes
}

/// Spawn a straight segment as a rotated unit quad.
pub fn spawn_segment_2d(
    parent: &mut ChildSpawnerCommands,
    a: Vec2,
    b: Vec2,
    width: f32,
    z: f32,
    unit: &UnitMeshes,
    mat: &Handle<ColorMaterial>,
    layers: &RenderLayers,
) {
    let length = a.distance(b);
    if length == 0.0 {
        return;
    }
    let angle = (b.y - a.y).atan2(b.x - a.x);
    parent.spawn((
        Mesh2d(unit.quad.clone()),
        MeshMaterial2d(mat.clone()),
        Transform {
            translation: ((a + b) * 0.5).extend(z),
            rotation: Quat::from_rotation_z(angle),
            scale: Vec3::new(length, width, 1.0),
        },
        layers.clone(),
    ));
}

/// Draw the axes frame of a 2D figure with ticks, tick labels and axis labels.
pub fn draw_axes_2d(
    commands: &mut Commands,
    root: Entity,
    x_label: Option<&str>,
    y_label: Option<&str>,
    rect: &TileRect,
    view: &TileView,
    unit: &UnitMeshes,
    materials: &mut Assets<ColorMaterial>,
    font: &LabelFont,
    layers: RenderLayers,
) {
    let frame_mat = materials.add(ColorMaterial::from(FRAME));
    let content = rect.content;
    let tick_length = 5.0;

    let data_min = world_to_data(content.min, rect, view);
    let data_max = world_to_data(content.max, rect, view);
    let x_ticks: Vec<(f32, f32)> = tick_values(data_min.x, data_max.x, 7)
        .into_iter()
        .map(|x| (x, data_to_world(Vec2::new(x, 0.0), rect, view).x))
        .collect();
    let y_ticks: Vec<(f32, f32)> = tick_values(data_min.y, data_max.y, 6)
        .into_iter()
        .map(|y| (y, data_to_world(Vec2::new(0.0, y), rect, view).y))
        .collect();

    commands.entity(root).with_children(|parent| {
        let corners = [
            content.min,
            Vec2::new(content.max.x, content.min.y),
            content.max,
            Vec2::new(content.min.x, content.max.y),
        ];
        for i in 0..4 {
            let (a, b) = (corners[i], corners[(i + 1) % 4]);
            spawn_segment_2d(parent, a, b, 1.0, 5.0, unit, &frame_mat, &layers);
        }

        for (value, x) in &x_ticks {
            let base = Vec2::new(*x, content.min.y);
            spawn_segment_2d(
                parent,
                base,
                base - Vec2::Y * tick_length,
                1.0,
                5.0,
                unit,
                &frame_mat,
                &layers,
            );
            parent.spawn((
                Text2d::new(format_tick(*value, AxisFormat::Numeric)),
                font.text(TICK_SIZE),
                TextColor(INK),
                Transform::from_translation(Vec3::new(*x, content.min.y - 16.0, 5.0)),
                layers.clone(),
            ));
        }

        for (value, y) in &y_ticks {
            let base = Vec2::new(content.min.x, *y);
            spawn_segment_2d(
                parent,
                base,
                base - Vec2::X * tick_length,
                1.0,
                5.0,
                unit,
                &frame_mat,
                &layers,
            );
            parent.spawn((
                Text2d::new(format_tick(*value, AxisFormat::Numeric)),
                font.text(TICK_SIZE),
                TextColor(INK),
                Transform::from_translation(Vec3::new(content.min.x - 24.0, *y, 5.0)),
                layers.clone(),
            ));
        }

        if let Some(label) = x_label {
            parent.spawn((
                Text2d::new(label),
                font.text(LABEL_SIZE),
                TextColor(INK),
                Transform::from_translation(Vec3::new(
                    content.center().x,
                    content.min.y - 38.0,
                    5.0,
                )),
                layers.clone(),
            ));
        }
        if let Some(label) = y_label {
            parent.spawn((
                Text2d::new(label),
                font.text(LABEL_SIZE),
                TextColor(INK),
                Transform {
                    translation: Vec3::new(content.min.x - 56.0, content.center().y, 5.0),
                    rotation: Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
                    ..default()
                },
                layers.clone(),
            ));
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_camera::Viewport;

    fn rect() -> TileRect {
        TileRect {
            world_center: Vec2::ZERO,
            world_size: Vec2::new(400.0, 300.0),
            content: Rect::from_center_size(Vec2::new(10.0, 0.0), Vec2::new(200.0, 100.0)),
            viewport: Viewport::default(),
        }
    }

    #[test]
    fn fit_maps_limits_onto_content() {
        let r = rect();
        let view = fit_view(&r, [0.0, 0.0], [10.0, 5.0], false);
        assert!((data_to_world(Vec2::ZERO, &r, &view) - r.content.min).length() < 1e-4);
        assert!((data_to_world(Vec2::new(10.0, 5.0), &r, &view) - r.content.max).length() < 1e-4);
        assert_eq!(view.scale, Vec2::new(20.0, 20.0));
    }

    #[test]
    fn equal_aspect_uses_smaller_scale() {
        let r = rect();
        let view = fit_view(&r, [0.0, 0.0], [10.0, 10.0], true);
        assert_eq!(view.scale, Vec2::splat(10.0));
        let center = data_to_world(Vec2::new(5.0, 5.0), &r, &view);
        assert!((center - r.content.center()).length() < 1e-4);
    }

    #[test]
    fn degenerate_limits_are_widened() {
        let r = rect();
        let view = fit_view(&r, [3.0, 3.0], [3.0, 3.0], false);
        assert!(view.scale.is_finite());
        let p = world_to_data(r.content.center(), &r, &view);
        assert!((p - Vec2::splat(3.0)).length() < 1e-4);
    }

    #[test]
    fn ticks_are_round_multiples() {
        assert_eq!(tick_values(0.0, 10.0, 5), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(tick_values(-0.3, 0.3, 3), vec![-0.2, 0.0, 0.2]);
        assert!(tick_values(1.0, 1.0, 5).is_empty());
    }

    #[test]
    fn tick_labels() {
        assert_eq!(format_tick(0.0, AxisFormat::Numeric), "0");
        assert_eq!(format_tick(4.0, AxisFormat::Numeric), "4");
        assert_eq!(format_tick(0.25, AxisFormat::Numeric), "0.25");
        assert_eq!(format_tick(2.5, AxisFormat::Numeric), "2.5");
        let dates = AxisFormat::Date { origin: 19358.0 };
        assert_eq!(format_tick(0.0, dates), "2023-01-01");
        assert_eq!(format_tick(31.0, dates), "2023-02-01");
    }

    #[test]
    fn dashes_span_vertices() {
        let line = [Vec3::ZERO, Vec3::new(3.0, 0.0, 0.0), Vec3::new(3.0, 3.0, 0.0)];
        let dashes = dash_pattern(&line, 2.0, 1.0);
        assert_eq!(
            dashes,
            vec![
                [Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)],
                [Vec3::new(3.0, 0.0, 0.0), Vec3::new(3.0, 2.0, 0.0)],
            ]
        );
        assert!(dash_pattern(&line, 0.0, 1.0).is_empty());
    }
}
