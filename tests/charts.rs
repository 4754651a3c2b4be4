use bevy_math::{Vec2, Vec3};
use chrono::NaiveDate;
use figkit::color::{ColorPolicy, Gradient, resolve};
use figkit::core::{Artist2D, Artist3D, AxisFormat, Canvas2D, Marker};
use figkit::geometry::normalize;
use figkit::prelude::*;

fn hex(r: u8, g: u8, b: u8) -> Color {
    Color::rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
}

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

fn markers(canvas: &Canvas2D) -> Vec<&Marker> {
    canvas
        .artists
        .iter()
        .filter_map(|a| match a {
            Artist2D::Marker(m) => Some(m),
            _ => None,
        })
        .collect()
}

#[test]
fn bubble_example_geometry_and_colors() {
    let points = vec![vec![0.0, 0.0], vec![10.0, 0.0], vec![20.0, 0.0]];
    let options = BubbleOptions::new()
        .radius(10.0)
        .colors(ColorSpec::gradient("#000000", "#ffffff"));
    let fig = bubble_plot(&points, &[0.0, 5.0, 10.0], &options).unwrap();
    let canvas = fig.as_2d().unwrap();

    let circles: Vec<(Vec2, f32, Color, f32)> = canvas
        .artists
        .iter()
        .filter_map(|a| match a {
            Artist2D::Circle {
                center,
                radius,
                fill,
            } => Some((*center, *radius, fill.color, fill.opacity)),
            _ => None,
        })
        .collect();
    assert_eq!(circles.len(), 3);
    assert_eq!(circles[1].0, Vec2::new(10.0, 0.0));
    assert!(close(circles[0].1, 0.0) && close(circles[1].1, 5.0) && close(circles[2].1, 10.0));
    assert_eq!(circles[0].2, Color::BLACK);
    // x = 0.5 selects table entry 128 of 256
    assert_eq!(circles[1].2, Color::grey(128.0 / 255.0));
    assert_eq!(circles[2].2, Color::WHITE);
    assert!(circles.iter().all(|c| c.3 == 0.6));

    assert_eq!(canvas.x_lim, Some([-10.0, 30.0]));
    assert_eq!(canvas.y_lim, Some([-10.0, 10.0]));
    assert!(canvas.equal_aspect);
    assert_eq!(fig.meta().window_title.as_deref(), Some("Bubble chart"));
}

#[test]
fn bubble_documented_example() {
    let points = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
    let options = BubbleOptions::new()
        .radius(15.0)
        .alpha(0.5)
        .colors(ColorSpec::gradient("#ff0000", "#0000ff"));
    let fig = bubble_plot(&points, &[0.1, 0.5, 0.9], &options).unwrap();
    let canvas = fig.as_2d().unwrap();

    let circles: Vec<(f32, Color, f32)> = canvas
        .artists
        .iter()
        .filter_map(|a| match a {
            Artist2D::Circle { radius, fill, .. } => Some((*radius, fill.color, fill.opacity)),
            _ => None,
        })
        .collect();
    assert_eq!(circles.len(), 3);
    assert!(close(circles[0].0, 0.0) && close(circles[1].0, 7.5) && close(circles[2].0, 15.0));

    assert_eq!(circles[0].1, Color::rgb(1.0, 0.0, 0.0));
    // the middle point sits at x = 0.5, table entry 128
    let mid = circles[1].1;
    assert!(close(mid.r, 127.0 / 255.0) && mid.g == 0.0 && close(mid.b, 128.0 / 255.0));
    assert_eq!(circles[2].1, Color::rgb(0.0, 0.0, 1.0));
    assert!(circles.iter().all(|c| c.2 == 0.5));

    let [x0, x1] = canvas.x_lim.unwrap();
    let [y0, y1] = canvas.y_lim.unwrap();
    assert!(close(x0, -14.0) && close(x1, 20.0));
    assert!(close(y0, -13.0) && close(y1, 21.0));
}

#[test]
fn bubble_rejects_mismatched_values() {
    let points = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
    let err = bubble_plot(&points, &[1.0, 2.0], &BubbleOptions::default()).unwrap_err();
    assert!(matches!(
        err.current_context(),
        FigError::LengthMismatch {
            arg: "values",
            expected: 3,
            actual: 2
        }
    ));
}

#[test]
fn diverging_example_reads_two_by_two_as_rows_of_coordinates() {
    let centers = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
    let data = vec![
        vec![[5.0, 6.0], [7.0, 8.0]],
        vec![[9.0, 10.0], [11.0, 12.0]],
    ];
    let options = DivergingOptions::new().colors(ColorSpec::gradient("#ff6e7f", "#bfe9ff"));
    let fig = diverging_scatter(&centers, &data, &options).unwrap();
    let canvas = fig.as_2d().unwrap();

    let Some(Artist2D::Line { points, .. }) = canvas.artists.first() else {
        panic!("first artist should be a spoke");
    };
    assert_eq!(points, &vec![Vec2::new(1.0, 3.0), Vec2::new(5.0, 6.0)]);

    let lines = canvas
        .artists
        .iter()
        .filter(|a| matches!(a, Artist2D::Line { .. }))
        .count();
    let m = markers(canvas);
    assert_eq!(lines, 4);
    assert_eq!(m.len(), 6);

    // group 0 takes the gradient start, lightened by 0.15 and capped at 0.8
    let start = hex(0xff, 0x6e, 0x7f);
    assert_eq!(m[0].face, start.lightened(0.15, 0.8));
    assert_eq!(m[0].face.r, 0.8);
    assert_eq!(m[0].edge, Color::WHITE);
    // centre marker of group 1 is the gradient end darkened to 90 %
    assert_eq!(m[5].at, Vec2::new(2.0, 4.0));
    assert_eq!(m[5].face, hex(0xbf, 0xe9, 0xff).scaled(0.9));

    let [x0, x1] = canvas.x_lim.unwrap();
    let [y0, y1] = canvas.y_lim.unwrap();
    assert!(close(x0, 0.0) && close(x1, 12.0));
    assert!(close(y0, 2.1) && close(y1, 12.9));
}

#[test]
fn sentinels_are_left_out_of_limits_and_spokes() {
    let centers = vec![vec![0.0, 10.0], vec![0.0, 10.0]];
    let data = vec![vec![[0.0, 0.0], [1.0, 1.0]], vec![[0.0, 0.0], [20.0, 30.0]]];
    let fig = diverging_scatter(&centers, &data, &DivergingOptions::default()).unwrap();
    let canvas = fig.as_2d().unwrap();

    let spoke_ends: Vec<Vec2> = canvas
        .artists
        .iter()
        .filter_map(|a| match a {
            Artist2D::Line { points, .. } => points.last().copied(),
            _ => None,
        })
        .collect();
    assert_eq!(spoke_ends, vec![Vec2::new(1.0, 1.0), Vec2::new(20.0, 30.0)]);
    let [x0, x1] = canvas.x_lim.unwrap();
    assert!(close(x0, -2.0) && close(x1, 22.0));
}

#[test]
fn filled_2d_gradient_maps_line_starts() {
    let data = vec![
        vec![[10.0, 1.0], [20.0, 5.0], [0.0, 0.0]],
        vec![[30.0, 2.0], [40.0, 4.0], [50.0, 0.5]],
    ];
    let options = Filled2dOptions::new().colors(ColorSpec::gradient("#000000", "#ffffff"));
    let fig = filled_2d_line(&data, &options).unwrap();
    let canvas = fig.as_2d().unwrap();

    // line, fill, line, fill
    assert_eq!(canvas.artists.len(), 4);
    let Artist2D::Line { points, stroke } = &canvas.artists[0] else {
        panic!("expected the first stroke");
    };
    assert_eq!(points.len(), 2);
    assert_eq!(stroke.color, Color::BLACK);
    assert_eq!(stroke.size, 2.0);

    // start x = 30 is half-way along [10, 50]: round(0.5 * 255) = 128
    let Artist2D::Polygon { vertices, fill } = &canvas.artists[3] else {
        panic!("expected the second fill");
    };
    let grey = 128.0 / 255.0;
    assert_eq!(fill.color, Color::grey(grey).lightened(0.3, 1.0));
    assert_eq!(fill.opacity, 0.3);
    assert_eq!(vertices.len(), 6);
    assert_eq!(vertices[3], Vec2::new(50.0, 0.0));

    let [x0, x1] = canvas.x_lim.unwrap();
    let [y0, y1] = canvas.y_lim.unwrap();
    assert!(close(x0, 6.0) && close(x1, 54.0));
    assert!(close(y0, 0.5) && close(y1, 5.45));
}

#[test]
fn filled_3d_example_with_dates() {
    let data = vec![vec![10.0, 40.0], vec![20.0, 50.0], vec![30.0, 60.0]];
    let start = NaiveDate::from_ymd_opt(2023, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap();
    let time = TimeVector::Dates((0..3).map(|i| start + chrono::Duration::days(i)).collect());
    let options = Filled3dOptions::new().categories(["Category A", "Category B"]);
    let fig = filled_3d_line(&data, &time, &options).unwrap();
    let canvas = fig.as_3d().unwrap();

    let ribbons: Vec<(&Vec<[Vec3; 4]>, Color)> = canvas
        .artists
        .iter()
        .filter_map(|a| match a {
            Artist3D::PolyCollection { quads, face } => Some((quads, face.color)),
            _ => None,
        })
        .collect();
    assert_eq!(ribbons.len(), 2);
    assert_eq!(ribbons[0].0.len(), 2);
    assert_eq!(ribbons[0].1, hex(0xd9, 0xff, 0x88));
    assert_eq!(ribbons[1].1, Color::WHITE);
    // first quad of category B sits at x = 2, from day 0 to day 1 after 2023-01-01
    let q = ribbons[1].0[0];
    assert_eq!(q[0], Vec3::new(2.0, 0.0, 40.0));
    assert_eq!(q[2], Vec3::new(2.0, 1.0, 0.0));

    let legend = canvas.legend_entries();
    assert_eq!(legend.len(), 2);
    assert_eq!(legend[1].0, "Category B");
    assert_eq!(legend[1].1, Color::WHITE.scaled(0.7));

    assert_eq!(canvas.y_format, AxisFormat::Date { origin: 19358.0 });
    assert_eq!(canvas.y_label.as_deref(), Some("Time"));
    assert_eq!(canvas.x_lim, Some([0.0, 3.0]));
    assert_eq!(canvas.y_lim, Some([0.0, 2.0]));
    assert!(close(canvas.z_lim.unwrap()[1], 66.0));
    assert_eq!(canvas.x_ticks[0].label, "Category A");
}

#[test]
fn filled_3d_keeps_minute_spaced_dates_apart() {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap();
    let time = TimeVector::Dates(
        (0..3)
            .map(|m| start + chrono::Duration::minutes(m))
            .collect(),
    );
    let data = vec![vec![1.0], vec![2.0], vec![3.0]];
    let fig = filled_3d_line(&data, &time, &Filled3dOptions::default()).unwrap();
    let canvas = fig.as_3d().unwrap();

    let Some(Artist3D::PolyCollection { quads, .. }) = canvas.artists.first() else {
        panic!("expected a ribbon first");
    };
    let minute = 1.0 / 1440.0;
    for (j, q) in quads.iter().enumerate() {
        assert!(q[1].y > q[0].y, "quad {j} has no extent along time");
        assert!((q[1].y - q[0].y - minute).abs() < 1e-7);
    }
    let [t0, t1] = canvas.y_lim.unwrap();
    assert_eq!(t0, 0.0);
    assert!((t1 - 2.0 * minute).abs() < 1e-7);
    assert_eq!(canvas.y_format, AxisFormat::Date { origin: 19358.0 });
}

#[test]
fn malformed_points_produce_no_figure() {
    let ragged = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0]];
    assert!(bubble_plot(&ragged, &[1.0, 2.0], &BubbleOptions::default()).is_err());

    let wrong_width = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0], vec![7.0, 8.0, 9.0]];
    let err = bubble_plot(&wrong_width, &[1.0, 2.0, 3.0], &BubbleOptions::default()).unwrap_err();
    assert!(matches!(err.current_context(), FigError::InvalidShape { .. }));

    let empty: Vec<Vec<f32>> = vec![];
    assert!(diverging_scatter(&empty, &[], &DivergingOptions::default()).is_err());
}

#[test]
fn bad_color_specs_are_rejected() {
    let points = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
    let values = [1.0, 2.0, 3.0];

    let short = BubbleOptions::new().colors(ColorSpec::per_item(["#ff0000", "#00ff00"]));
    let err = bubble_plot(&points, &values, &short).unwrap_err();
    assert!(matches!(err.current_context(), FigError::ColorSpec(_)));

    let bad_hex = BubbleOptions::new().colors(ColorSpec::gradient("#zzzzzz", "#ffffff"));
    let err = bubble_plot(&points, &values, &bad_hex).unwrap_err();
    assert!(matches!(err.current_context(), FigError::ColorEntry { index: 0, .. }));

    let out_of_range = BubbleOptions::new().colors(ColorSpec::per_item([
        [0.0, 0.0, 0.0],
        [2.0, 0.0, 0.0],
        [0.0, 0.0, 0.0],
    ]));
    let err = bubble_plot(&points, &values, &out_of_range).unwrap_err();
    assert!(matches!(err.current_context(), FigError::ColorEntry { index: 1, .. }));
}

struct Midpoint;

impl ColorPolicy for Midpoint {
    fn default_colors(&self, n: usize) -> figkit::Result<Vec<Color>> {
        Ok(Gradient::new(Color::BLACK, Color::WHITE).by_index(n))
    }

    fn gradient(&self, gradient: &Gradient, n: usize) -> Vec<Color> {
        gradient.by_index(n)
    }
}

#[test]
fn resolution_yields_n_unit_colors() {
    let specs = [
        ColorSpec::Default,
        ColorSpec::gradient("#102030", "#f0e0d0"),
        ColorSpec::per_item((0..7).map(|i| [i as f32 / 7.0, 0.5, 1.0])),
    ];
    for spec in &specs {
        let colors = resolve(spec, 7, &Midpoint).unwrap();
        assert_eq!(colors.len(), 7);
        assert!(colors.iter().all(Color::is_unit));
    }
}

#[test]
fn gradient_endpoints_and_constant_normalisation() {
    let g = Gradient::from_hex("#ff6e7f", "#bfe9ff").unwrap();
    assert_eq!(g.at(0.0), hex(0xff, 0x6e, 0x7f));
    assert_eq!(g.at(1.0), hex(0xbf, 0xe9, 0xff));
    assert_eq!(normalize("v", &[3.0, 3.0, 3.0]).unwrap(), vec![0.5; 3]);
}

#[test]
fn figures_round_trip_through_json() {
    let points = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
    let fig = bubble_plot(&points, &[1.0, 2.0, 3.0], &BubbleOptions::default()).unwrap();
    let json = fig.to_json().unwrap();
    let back = Figure::from_json(&json).unwrap();
    assert_eq!(back.as_2d().unwrap().artists, fig.as_2d().unwrap().artists);
    assert_eq!(back.id(), fig.id());

    let board = dash().columns(2).add(fig).build();
    let back = Dashboard::from_json(&board.to_json().unwrap()).unwrap();
    assert_eq!(back.columns, Some(2));
    assert_eq!(back.figures.len(), 1);

    let err = Figure::from_json("{\"TwoD\": 3}").unwrap_err();
    assert!(matches!(err.current_context(), FigError::Serialization(_)));
}
