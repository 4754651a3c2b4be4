use crate::color::{ColorPolicy, ColorSpec, Gradient, hsv_to_rgb, matrix_rows, resolve};
use crate::core::{Canvas2D, Color, Figure, FigureMeta, Style};
use crate::error::{FigError, Result};
use crate::geometry::{GroupTensor, fill_polygon, min_max, padded};
use bevy_math::Vec2;
use error_stack::Report;
use tracing::debug;

const STROKE_WIDTH: f32 = 2.0;
const FILL_ALPHA: f32 = 0.3;
const MAX_HUE: f32 = 0.83;

#[derive(Clone, Debug)]
pub struct Filled2dOptions {
    pub colors: ColorSpec,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
}

impl Default for Filled2dOptions {
    fn default() -> Self {
        Self {
            colors: ColorSpec::Default,
            title: "Filled line chart".into(),
            x_label: "X".into(),
            y_label: "Y".into(),
        }
    }
}

impl Filled2dOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn colors(mut self, colors: ColorSpec) -> Self {
        self.colors = colors;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn labels(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.x_label = x.into();
        self.y_label = y.into();
        self
    }
}

/// A point takes part in a line when its x is non-zero.
#[inline]
fn is_valid(p: &Vec2) -> bool {
    p.x != 0.0
}

/// Colors keyed on where each line starts along x. `None` marks a line
/// with no valid point, which is drawn grey.
struct ByLineStart {
    starts: Vec<Option<f32>>,
}

impl ByLineStart {
    fn new(lines: &GroupTensor) -> Self {
        let (lo, hi) =
            min_max(lines.all_points().filter(is_valid).map(|p| p.x)).unwrap_or((0.0, 1.0));
        let starts = lines
            .groups()
            .map(|line| {
                line.iter().find(|p| is_valid(p)).map(|p| {
                    if hi == lo {
                        0.5
                    } else {
                        ((p.x - lo) / (hi - lo)).clamp(0.0, 1.0)
                    }
                })
            })
            .collect();
        Self { starts }
    }

    fn map(&self, f: impl Fn(f32) -> Color) -> Vec<Color> {
        self.starts
            .iter()
            .map(|s| s.map_or(Color::grey(0.5), &f))
            .collect()
    }
}

impl ColorPolicy for ByLineStart {
    fn default_colors(&self, _n: usize) -> Result<Vec<Color>> {
        Ok(self.map(|t| hsv_to_rgb(t * MAX_HUE, 1.0, 1.0)))
    }

    fn gradient(&self, gradient: &Gradient, _n: usize) -> Vec<Color> {
        let last = (Gradient::LUT_SIZE - 1) as f32;
        self.map(|t| gradient.lut_entry((t * last).round_ties_even() as usize))
    }

    /// At least `n` rows; the first `n` are used.
    fn matrix(&self, rows: &[Vec<f32>], n: usize) -> Result<Vec<Color>> {
        if rows.len() < n {
            return Err(Report::new(FigError::ColorSpec(format!(
                "color matrix needs at least {n} rows, got {}",
                rows.len()
            ))));
        }
        let mut colors = matrix_rows(rows)?;
        colors.truncate(n);
        Ok(colors)
    }
}

/// Axis limits over the non-zero coordinates; `None` when either axis has none.
fn axis_limits(lines: &GroupTensor) -> Option<([f32; 2], [f32; 2])> {
    let (x_min, _) = min_max(lines.all_points().map(|p| p.x).filter(|&x| x != 0.0))?;
    let (y_min, _) = min_max(lines.all_points().map(|p| p.y).filter(|&y| y != 0.0))?;
    let (_, x_max) = min_max(lines.all_points().map(|p| p.x))?;
    let (_, y_max) = min_max(lines.all_points().map(|p| p.y))?;
    let x = padded(x_min, x_max, 0.1);
    let y = [y_min, y_max + 0.1 * (y_max - y_min)];
    Some((x, y))
}

/// Draw each line and fill the area between it and the x axis.
///
/// `data[i]` holds the m points of line i; points with x = 0 are treated as
/// padding and left out of both the stroke and the fill.
pub fn filled_2d_line(data: &[Vec<[f32; 2]>], options: &Filled2dOptions) -> Result<Figure> {
    let lines = GroupTensor::from_groups("data", data)?;
    if lines.is_empty() {
        return Err(Report::new(FigError::shape("data", "an n x m x 2 array with n >= 1")));
    }
    let n = lines.len();
    let colors = resolve(&options.colors, n, &ByLineStart::new(&lines))?;

    let mut canvas = Canvas2D::new()
        .meta(FigureMeta {
            title: Some(options.title.clone()),
            window_title: Some("Filled line chart".into()),
            size: Vec2::new(8.0, 6.0),
            dpi: 200.0,
            background: Color::WHITE,
        })
        .x_label(options.x_label.clone())
        .y_label(options.y_label.clone());

    let mut drawn = 0usize;
    for (line, &color) in lines.groups().zip(&colors) {
        let valid: Vec<Vec2> = line.iter().copied().filter(is_valid).collect();
        // a lone point has neither a stroke nor an area
        if valid.len() < 2 {
            continue;
        }
        canvas.line(
            valid.clone(),
            Style::default().color(color).size(STROKE_WIDTH),
        )?;
        canvas.polygon(
            fill_polygon(&valid),
            Style::default()
                .color(color.lightened(0.3, 1.0))
                .opacity(FILL_ALPHA)
                .size(0.0),
        )?;
        drawn += 1;
    }

    let (x, y) = axis_limits(&lines).unwrap_or(([0.0, 1.0], [0.0, 1.0]));
    canvas.set_x_lim(x[0], x[1])?;
    canvas.set_y_lim(y[0], y[1])?;

    debug!(lines = n, drawn, "filled 2d line built");
    Ok(Figure::TwoD(canvas))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Artist2D;

    fn strokes(fig: &Figure) -> Vec<(&Vec<Vec2>, Style)> {
        fig.as_2d()
            .unwrap()
            .artists
            .iter()
            .filter_map(|a| match a {
                Artist2D::Line { points, stroke } => Some((points, *stroke)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn padding_points_are_dropped() {
        let data = vec![vec![[1.0, 2.0], [2.0, 3.0], [0.0, 0.0]]];
        let fig = filled_2d_line(&data, &Filled2dOptions::default()).unwrap();
        let artists = &fig.as_2d().unwrap().artists;
        assert_eq!(artists.len(), 2);
        let Artist2D::Polygon { vertices, fill } = &artists[1] else {
            panic!("second artist should be the fill");
        };
        assert_eq!(
            vertices,
            &vec![
                Vec2::new(1.0, 2.0),
                Vec2::new(2.0, 3.0),
                Vec2::new(2.0, 0.0),
                Vec2::new(1.0, 0.0),
            ]
        );
        assert_eq!(fill.opacity, FILL_ALPHA);
    }

    #[test]
    fn default_hue_follows_line_start() {
        let data = vec![
            vec![[1.0, 1.0], [2.0, 2.0]],
            vec![[3.0, 1.0], [4.0, 2.0]],
            vec![[0.0, 0.0], [0.0, 0.0]],
        ];
        let fig = filled_2d_line(&data, &Filled2dOptions::default()).unwrap();
        let s = strokes(&fig);
        // the empty third line draws nothing
        assert_eq!(s.len(), 2);
        assert_eq!(s[0].1.color, Color::rgb(1.0, 0.0, 0.0));
        assert_eq!(s[1].1.color, hsv_to_rgb(2.0 / 3.0 * MAX_HUE, 1.0, 1.0));
        assert_eq!(s[0].1.size, STROKE_WIDTH);
    }

    #[test]
    fn empty_line_resolves_to_grey() {
        let data = vec![vec![[1.0, 1.0], [2.0, 2.0]], vec![[0.0, 5.0], [0.0, 0.0]]];
        let lines = GroupTensor::from_groups("data", &data).unwrap();
        let colors = resolve(&ColorSpec::Default, 2, &ByLineStart::new(&lines)).unwrap();
        assert_eq!(colors[1], Color::grey(0.5));
        assert_eq!(colors[0], Color::rgb(1.0, 0.0, 0.0));

        // a single non-zero x gives a degenerate range
        let lone = vec![vec![[2.0, 1.0], [0.0, 0.0]]];
        let lines = GroupTensor::from_groups("data", &lone).unwrap();
        let colors = resolve(&ColorSpec::Default, 1, &ByLineStart::new(&lines)).unwrap();
        assert_eq!(colors[0], hsv_to_rgb(0.5 * MAX_HUE, 1.0, 1.0));
    }

    #[test]
    fn gradient_uses_rounded_table_index() {
        let data = vec![
            vec![[1.0, 1.0], [2.0, 2.0]],
            vec![[2.0, 1.0], [3.0, 2.0]],
            vec![[6.0, 1.0], [5.0, 2.0]],
        ];
        let g = Gradient::new(Color::BLACK, Color::WHITE);
        let opts = Filled2dOptions::new().colors(ColorSpec::gradient("#000000", "#ffffff"));
        let fig = filled_2d_line(&data, &opts).unwrap();
        let s = strokes(&fig);
        assert_eq!(s[0].1.color, g.start);
        // start x = 2 over [1, 6] -> round(0.2 * 255) = 51
        assert_eq!(s[1].1.color, g.lut_entry(51));
        assert_eq!(s[2].1.color, g.end);
    }

    #[test]
    fn limits_use_non_zero_minimum() {
        let data = vec![vec![[1.0, 2.0], [2.0, 3.0], [0.0, 0.0]]];
        let fig = filled_2d_line(&data, &Filled2dOptions::default()).unwrap();
        let canvas = fig.as_2d().unwrap();
        let [x0, x1] = canvas.x_lim.unwrap();
        assert!((x0 - 0.9).abs() < 1e-6 && (x1 - 2.1).abs() < 1e-6);
        let [y0, y1] = canvas.y_lim.unwrap();
        assert!((y0 - 2.0).abs() < 1e-6 && (y1 - 3.1).abs() < 1e-6);
    }

    #[test]
    fn all_padding_uses_unit_limits() {
        let data = vec![vec![[0.0, 0.0], [0.0, 0.0]]];
        let fig = filled_2d_line(&data, &Filled2dOptions::default()).unwrap();
        let canvas = fig.as_2d().unwrap();
        assert!(canvas.artists.is_empty());
        assert_eq!(canvas.x_lim, Some([0.0, 1.0]));
        assert_eq!(canvas.y_lim, Some([0.0, 1.0]));
    }

    #[test]
    fn matrix_uses_leading_rows() {
        let data = vec![vec![[1.0, 1.0], [2.0, 2.0]]];
        let opts = Filled2dOptions::new().colors(ColorSpec::matrix(vec![
            vec![0.0, 0.0, 1.0],
            vec![1.0, 0.0, 0.0],
        ]));
        let fig = filled_2d_line(&data, &opts).unwrap();
        assert_eq!(strokes(&fig)[0].1.color, Color::rgb(0.0, 0.0, 1.0));

        let short = Filled2dOptions::new().colors(ColorSpec::matrix(vec![]));
        assert!(filled_2d_line(&data, &short).is_err());
    }
}
