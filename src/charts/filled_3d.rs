use crate::color::{ColorPolicy, ColorSpec, Gradient, matrix_rows, resolve};
use crate::core::{AxisFormat, Canvas3D, Color, Figure, FigureMeta, Style, Tick};
use crate::error::{FigError, Result};
use crate::geometry::{SeriesMatrix, TimeVector, min_max, ribbon_quads};
use bevy_math::{Vec2, Vec3};
use error_stack::Report;
use tracing::debug;

const DEFAULT_GRADIENT: (&str, &str) = ("#D9FF88", "#FFFFFF");

const RIBBON_ALPHA: f32 = 0.7;
const TOP_LINE_WIDTH: f32 = 1.5;
const EDGE_WIDTH: f32 = 0.5;

#[derive(Clone, Debug)]
pub struct Filled3dOptions {
    pub colors: ColorSpec,
    /// One name per category; defaults to `Category 1..=n_cat`
    pub categories: Option<Vec<String>>,
    pub title: Option<String>,
    pub x_label: String,
    pub z_label: String,
}

impl Default for Filled3dOptions {
    fn default() -> Self {
        Self {
            colors: ColorSpec::Default,
            categories: None,
            title: None,
            x_label: "Category".into(),
            z_label: "Value".into(),
        }
    }
}

impl Filled3dOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn colors(mut self, colors: ColorSpec) -> Self {
        self.colors = colors;
        self
    }

    pub fn categories<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

struct ByCategory;

impl ColorPolicy for ByCategory {
    fn default_colors(&self, n: usize) -> Result<Vec<Color>> {
        let gradient = Gradient::from_hex(DEFAULT_GRADIENT.0, DEFAULT_GRADIENT.1)?;
        Ok(gradient.linspace(n))
    }

    fn gradient(&self, gradient: &Gradient, n: usize) -> Vec<Color> {
        gradient.linspace(n)
    }

    /// n_cat x 3, or 3 x n_cat read column-wise. Values above 1 are taken
    /// to be 8-bit channels.
    fn matrix(&self, rows: &[Vec<f32>], n: usize) -> Result<Vec<Color>> {
        let colors = if rows.len() == n && rows.iter().all(|r| r.len() == 3) {
            matrix_rows(rows)?
        } else if rows.len() == 3 && rows.iter().all(|r| r.len() == n) {
            (0..n)
                .map(|i| Color::rgb(rows[0][i], rows[1][i], rows[2][i]))
                .collect()
        } else {
            return Err(Report::new(FigError::ColorSpec(format!(
                "color matrix must be {n} x 3 or 3 x {n}, got {} rows",
                rows.len()
            ))));
        };
        let max = colors
            .iter()
            .flat_map(|c| c.to_array())
            .fold(f32::NEG_INFINITY, f32::max);
        if max > 1.0 {
            Ok(colors
                .into_iter()
                .map(|c| Color::from_array(c.to_array().map(|v| v / 255.0)))
                .collect())
        } else {
            Ok(colors)
        }
    }
}

/// Draw one ribbon per category between its series and the z = 0 plane.
///
/// `data` is n_time x n_cat; column i is plotted at x = i + 1 along the time
/// axis given by `time`. Timestamps switch the time axis to date labels and
/// are placed in days after the first timestamp.
pub fn filled_3d_line(
    data: &[Vec<f32>],
    time: &TimeVector,
    options: &Filled3dOptions,
) -> Result<Figure> {
    let series = SeriesMatrix::from_rows("data", data)?;
    let (n_time, n_cat) = (series.n_time(), series.n_cat());
    if time.len() != n_time {
        return Err(Report::new(FigError::LengthMismatch {
            arg: "time",
            expected: n_time,
            actual: time.len(),
        })
        .attach("time needs one entry per data row"));
    }
    let categories = match &options.categories {
        Some(names) if names.len() != n_cat => {
            return Err(Report::new(FigError::LengthMismatch {
                arg: "categories",
                expected: n_cat,
                actual: names.len(),
            }));
        }
        Some(names) => names.clone(),
        None => (1..=n_cat).map(|i| format!("Category {i}")).collect(),
    };
    let colors = resolve(&options.colors, n_cat, &ByCategory)?;
    let times = time.to_axis();
    if times.iter().any(|t| !t.is_finite()) {
        return Err(Report::new(FigError::value("time", "entries must be finite")));
    }

    let time_label = if time.is_dates() { "Time" } else { "Time step" };
    let mut canvas = Canvas3D::new()
        .meta(FigureMeta {
            title: options.title.clone(),
            window_title: Some("3D filled line chart".into()),
            size: Vec2::new(12.0, 6.0),
            dpi: 100.0,
            background: Color::WHITE,
        })
        .x_label(options.x_label.clone())
        .y_label(time_label)
        .z_label(options.z_label.clone())
        .view(30.0, -40.0);

    let (t_first, t_last) = (times[0], times[n_time - 1]);
    for (i, (&color, name)) in colors.iter().zip(&categories).enumerate() {
        let x = (i + 1) as f32;
        let z = series.column(i);

        let quads = ribbon_quads(x, &times, &z);
        if !quads.is_empty() {
            canvas.poly_collection(
                quads,
                Style::default().color(color).opacity(RIBBON_ALPHA).size(0.0),
            )?;
        }

        // a single sample has no extent along the time axis
        if n_time >= 2 {
            let top = times.iter().zip(&z).map(|(&t, &v)| Vec3::new(x, t, v));
            canvas.line(
                top.collect(),
                Style::default().color(color.scaled(0.7)).size(TOP_LINE_WIDTH),
                Some(name.clone()),
            )?;
            let base = times.iter().map(|&t| Vec3::new(x, t, 0.0));
            canvas.line(
                base.collect(),
                Style::default().color(Color::grey(0.5)).size(EDGE_WIDTH).dashed(),
                None,
            )?;
        }

        let edge = Style::default().color(Color::grey(0.7)).size(EDGE_WIDTH);
        for (t, v) in [(t_first, z[0]), (t_last, z[n_time - 1])] {
            canvas.line(vec![Vec3::new(x, t, 0.0), Vec3::new(x, t, v)], edge, None)?;
        }
    }

    canvas.set_x_ticks(
        categories
            .iter()
            .enumerate()
            .map(|(i, name)| Tick {
                position: (i + 1) as f32,
                label: name.clone(),
            })
            .collect(),
    );
    if time.is_dates() {
        canvas.set_y_format(AxisFormat::Date {
            origin: time.origin(),
        });
    }
    let (t_min, t_max) = min_max(times.iter().copied()).unwrap_or((0.0, 1.0));
    let z_max = series.max();
    let z_top = if z_max > 0.0 { z_max * 1.1 } else { 1.0 };
    canvas.set_limits([0.0, (n_cat + 1) as f32], [t_min, t_max], [0.0, z_top])?;
    canvas.set_legend(true);

    debug!(n_time, n_cat, dates = time.is_dates(), "filled 3d line built");
    Ok(Figure::ThreeD(canvas))
}
