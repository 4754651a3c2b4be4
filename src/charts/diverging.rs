use crate::color::{ColorPolicy, ColorSpec, Gradient, matrix_rows, parse_hex, resolve};
use crate::core::{Canvas2D, Color, Figure, FigureMeta, Marker, Style};
use crate::error::{FigError, Result};
use crate::geometry::{GroupTensor, PointSet, is_sentinel, min_max, padded};
use bevy_math::Vec2;
use error_stack::Report;
use tracing::debug;

const PALETTE: [&str; 5] = ["#37FF00", "#00FFB3", "#FF5100", "#9000FF", "#D2D900"];
const FALLBACK_GRADIENT: (&str, &str) = ("#00FFB3", "#A64568");

const SPOKE_WIDTH: f32 = 3.0;
const SPOKE_ALPHA: f32 = 0.3;
const POINT_AREA: f32 = 150.0;
const POINT_EDGE_WIDTH: f32 = 2.0;
const POINT_ALPHA: f32 = 0.75;
const CENTER_AREA: f32 = 80.0;
const CENTER_EDGE_WIDTH: f32 = 1.5;

#[derive(Clone, Debug)]
pub struct DivergingOptions {
    pub colors: ColorSpec,
    /// Draw a marker on every group centre
    pub center_visible: bool,
    pub title: Option<String>,
    pub x_label: String,
    pub y_label: String,
}

impl Default for DivergingOptions {
    fn default() -> Self {
        Self {
            colors: ColorSpec::Default,
            center_visible: true,
            title: None,
            x_label: "X".into(),
            y_label: "Y".into(),
        }
    }
}

impl DivergingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn colors(mut self, colors: ColorSpec) -> Self {
        self.colors = colors;
        self
    }

    pub fn center_visible(mut self, visible: bool) -> Self {
        self.center_visible = visible;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

struct ByGroup;

impl ColorPolicy for ByGroup {
    fn default_colors(&self, n: usize) -> Result<Vec<Color>> {
        if n <= PALETTE.len() {
            PALETTE[..n].iter().map(|hex| parse_hex(hex)).collect()
        } else {
            let gradient = Gradient::from_hex(FALLBACK_GRADIENT.0, FALLBACK_GRADIENT.1)?;
            Ok(gradient.by_index(n))
        }
    }

    fn gradient(&self, gradient: &Gradient, n: usize) -> Vec<Color> {
        gradient.by_index(n)
    }

    /// Needs at least `n` rows; `n` of them are picked evenly spaced.
    fn matrix(&self, rows: &[Vec<f32>], n: usize) -> Result<Vec<Color>> {
        if rows.len() < n {
            return Err(Report::new(FigError::ColorSpec(format!(
                "color matrix needs at least {n} rows, got {}",
                rows.len()
            ))));
        }
        let colors = matrix_rows(rows)?;
        Ok(spread_indices(rows.len(), n)
            .into_iter()
            .map(|i| colors[i])
            .collect())
    }
}

/// `round(linspace(0, len - 1, n))`, ties to even.
fn spread_indices(len: usize, n: usize) -> Vec<usize> {
    match n {
        0 => vec![],
        1 => vec![0],
        _ => {
            let last = (len - 1) as f64;
            (0..n)
                .map(|i| (last * i as f64 / (n - 1) as f64).round_ties_even() as usize)
                .collect()
        }
    }
}

/// Draw every group as points joined to their centre by translucent spokes.
///
/// `centers` is a 2 x n or n x 2 matrix; `data[k]` holds the m points of
/// group k, where `[0, 0]` marks an absent point that is skipped.
pub fn diverging_scatter(
    centers: &[Vec<f32>],
    data: &[Vec<[f32; 2]>],
    options: &DivergingOptions,
) -> Result<Figure> {
    let centers = PointSet::from_rows("center_points", centers)?;
    let groups = GroupTensor::from_groups("data", data)?;
    let n = centers.len();
    if groups.len() != n {
        return Err(Report::new(FigError::LengthMismatch {
            arg: "data",
            expected: n,
            actual: groups.len(),
        })
        .attach("data must hold one group per centre"));
    }
    let colors = resolve(&options.colors, n, &ByGroup)?;

    let mut canvas = Canvas2D::new()
        .meta(FigureMeta {
            title: options.title.clone(),
            window_title: Some("Diverging cluster scatter".into()),
            size: Vec2::new(8.0, 6.0),
            dpi: 100.0,
            background: Color::WHITE,
        })
        .x_label(options.x_label.clone())
        .y_label(options.y_label.clone());

    let mut drawn = 0usize;
    for ((&center, group), &color) in centers.points().iter().zip(groups.groups()).zip(&colors) {
        let spoke = Style::default()
            .color(color.lightened(0.3, 0.9))
            .size(SPOKE_WIDTH)
            .opacity(SPOKE_ALPHA);
        let face = color.lightened(0.15, 0.8);
        for &p in group.iter().filter(|p| !is_sentinel(**p)) {
            canvas.line(vec![center, p], spoke)?;
            canvas.marker(Marker {
                at: p,
                area: POINT_AREA,
                face,
                edge: Color::WHITE,
                edge_width: POINT_EDGE_WIDTH,
                opacity: POINT_ALPHA,
            })?;
            drawn += 1;
        }
        if options.center_visible {
            canvas.marker(Marker {
                at: center,
                area: CENTER_AREA,
                face: color.scaled(0.9),
                edge: Color::WHITE,
                edge_width: CENTER_EDGE_WIDTH,
                opacity: 1.0,
            })?;
        }
    }

    let valid: Vec<Vec2> = groups.all_points().filter(|p| !is_sentinel(*p)).collect();
    let extent = |axis: fn(&Vec2) -> f32| {
        min_max(centers.points().iter().chain(&valid).map(axis)).unwrap_or((0.0, 1.0))
    };
    let (x_lo, x_hi) = extent(|p| p.x);
    let (y_lo, y_hi) = extent(|p| p.y);
    let [x0, x1] = padded(x_lo, x_hi, 0.1);
    let [y0, y1] = padded(y_lo, y_hi, 0.1);
    canvas.set_x_lim(x0, x1)?;
    canvas.set_y_lim(y0, y1)?;

    debug!(groups = n, points = drawn, "diverging scatter built");
    Ok(Figure::TwoD(canvas))
}
