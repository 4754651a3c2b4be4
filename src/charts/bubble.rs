use super::check_alpha;
use crate::color::{ColorPolicy, ColorSpec, Gradient, resolve};
use crate::core::{Canvas2D, Color, Figure, FigureMeta, Style};
use crate::error::{FigError, Result};
use crate::geometry::{PointSet, min_max, normalize};
use bevy_math::Vec2;
use error_stack::Report;
use tracing::debug;

const DEFAULT_GRADIENT: (&str, &str) = ("#00F260", "#0575E6");

#[derive(Clone, Debug)]
pub struct BubbleOptions {
    pub colors: ColorSpec,
    /// Radius of a bubble whose normalised value is 1
    pub radius: f32,
    pub alpha: f32,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
}

impl Default for BubbleOptions {
    fn default() -> Self {
        Self {
            colors: ColorSpec::Default,
            radius: 10.0,
            alpha: 0.6,
            title: "Bubble chart".into(),
            x_label: "X".into(),
            y_label: "Y".into(),
        }
    }
}

impl BubbleOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn colors(mut self, colors: ColorSpec) -> Self {
        self.colors = colors;
        self
    }

    pub fn radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// Gradients are sampled through a 256-entry table at each point's
/// normalised x position.
struct ByXPosition {
    positions: Vec<f32>,
}

impl ColorPolicy for ByXPosition {
    fn default_colors(&self, n: usize) -> Result<Vec<Color>> {
        let gradient = Gradient::from_hex(DEFAULT_GRADIENT.0, DEFAULT_GRADIENT.1)?;
        Ok(self.gradient(&gradient, n))
    }

    fn gradient(&self, gradient: &Gradient, _n: usize) -> Vec<Color> {
        self.positions
            .iter()
            .map(|&t| gradient.sample_lut(t))
            .collect()
    }
}

/// Radius of each bubble: `base * normalize(values)`.
pub(crate) fn bubble_radii(base: f32, values: &[f32]) -> Result<Vec<f32>> {
    Ok(normalize("values", values)?
        .into_iter()
        .map(|v| base * v)
        .collect())
}

/// Draw one circle per point, its radius scaled by the matching value.
///
/// `points` is a 2 x n or n x 2 matrix and `values` holds n scalars. Axis
/// limits cover every point padded by the largest radius, with equal aspect.
pub fn bubble_plot(points: &[Vec<f32>], values: &[f32], options: &BubbleOptions) -> Result<Figure> {
    let points = PointSet::from_rows("points", points)?;
    let n = points.len();
    if values.len() != n {
        return Err(Report::new(FigError::LengthMismatch {
            arg: "values",
            expected: n,
            actual: values.len(),
        }));
    }
    if !options.radius.is_finite() || options.radius < 0.0 {
        return Err(Report::new(FigError::value(
            "radius",
            format!("must be finite and non-negative, got {}", options.radius),
        )));
    }
    check_alpha("alpha", options.alpha)?;

    let radii = bubble_radii(options.radius, values)?;
    let xs: Vec<f32> = points.xs().collect();
    let policy = ByXPosition {
        positions: normalize("points", &xs)?,
    };
    let colors = resolve(&options.colors, n, &policy)?;

    let mut canvas = Canvas2D::new()
        .meta(FigureMeta {
            title: Some(options.title.clone()),
            window_title: Some("Bubble chart".into()),
            size: Vec2::new(8.0, 6.0),
            dpi: 200.0,
            background: Color::WHITE,
        })
        .x_label(options.x_label.clone())
        .y_label(options.y_label.clone());

    for ((&center, &radius), &color) in points.points().iter().zip(&radii).zip(&colors) {
        let fill = Style::default()
            .color(color)
            .opacity(options.alpha)
            .size(0.0);
        canvas.circle(center, radius, fill)?;
    }

    let max_radius = radii.iter().copied().fold(0.0, f32::max);
    let (x_lo, x_hi) = min_max(points.xs()).unwrap_or((0.0, 1.0));
    let (y_lo, y_hi) = min_max(points.ys()).unwrap_or((0.0, 1.0));
    canvas.set_x_lim(x_lo - max_radius, x_hi + max_radius)?;
    canvas.set_y_lim(y_lo - max_radius, y_hi + max_radius)?;
    canvas.set_equal_aspect(true);

    debug!(n, max_radius, "bubble plot built");
    Ok(Figure::TwoD(canvas))
}
