use crate::error::{FigError, Result};
use crate::render::components::PlotId;
use bevy_math::{Vec2, Vec3};
use error_stack::{Report, ResultExt};
use serde::{Deserialize, Serialize};

/// Common metadata for every figure
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FigureMeta {
    /// Title displayed at the top of the figure
    pub title: Option<String>,
    /// Title of the hosting window
    pub window_title: Option<String>,
    /// Figure size in inches (width, height)
    pub size: Vec2,
    pub dpi: f32,
    pub background: Color,
}

impl Default for FigureMeta {
    fn default() -> Self {
        Self {
            title: None,
            window_title: None,
            size: Vec2::new(8.0, 6.0),
            dpi: 100.0,
            background: Color::WHITE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }
    pub const fn grey(v: f32) -> Self {
        Self::rgb(v, v, v)
    }
    pub const fn with_a(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);

    pub const fn from_array(c: [f32; 3]) -> Self {
        Self::rgb(c[0], c[1], c[2])
    }

    pub const fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// Per-channel linear interpolation, `t` clamped to [0, 1].
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: f32, b: f32| a * (1.0 - t) + b * t;
        Self::rgb(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }

    /// Adds `delta` to every channel and clips to `[0, max]`.
    pub fn lightened(self, delta: f32, max: f32) -> Self {
        self.map(|c| (c + delta).clamp(0.0, max))
    }

    /// Multiplies every channel by `factor` and clips to `[0, 1]`.
    pub fn scaled(self, factor: f32) -> Self {
        self.map(|c| (c * factor).clamp(0.0, 1.0))
    }

    fn map(self, f: impl Fn(f32) -> f32) -> Self {
        Self {
            r: f(self.r),
            g: f(self.g),
            b: f(self.b),
            a: self.a,
        }
    }

    /// True when every RGB channel lies in [0, 1].
    pub fn is_unit(&self) -> bool {
        [self.r, self.g, self.b]
            .iter()
            .all(|c| c.is_finite() && (0.0..=1.0).contains(c))
    }
}

impl From<Color> for bevy::prelude::Color {
    #[inline]
    fn from(c: Color) -> Self {
        bevy::prelude::Color::srgba(c.r, c.g, c.b, c.a)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub color: Color,
    pub size: f32,    // line width / edge width
    pub opacity: f32, // multiplied into alpha
    pub dashed: bool,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            size: 1.0,
            opacity: 1.0,
            dashed: false,
        }
    }
}

impl Style {
    #[inline]
    pub const fn color(mut self, c: Color) -> Self {
        self.color = c;
        self
    }

    #[inline]
    pub const fn size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    #[inline]
    pub const fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    #[inline]
    pub const fn dashed(mut self) -> Self {
        self.dashed = true;
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.color.is_unit() {
            return Err(Report::new(FigError::Draw(format!(
                "color channels must lie in [0, 1], got {:?}",
                self.color
            ))));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(Report::new(FigError::Draw(format!(
                "opacity must lie in [0, 1], got {}",
                self.opacity
            ))));
        }
        if !self.size.is_finite() || self.size < 0.0 {
            return Err(Report::new(FigError::Draw(format!(
                "size must be finite and non-negative, got {}",
                self.size
            ))));
        }
        Ok(())
    }
}

/// A scatter marker. `area` follows the point-squared convention.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub at: Vec2,
    pub area: f32,
    pub face: Color,
    pub edge: Color,
    pub edge_width: f32,
    pub opacity: f32,
}

impl Marker {
    /// Marker diameter in points
    pub fn diameter(&self) -> f32 {
        self.area.max(0.0).sqrt()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Artist2D {
    Circle { center: Vec2, radius: f32, fill: Style },
    Polygon { vertices: Vec<Vec2>, fill: Style },
    Line { points: Vec<Vec2>, stroke: Style },
    Marker(Marker),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub position: f32,
    pub label: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum AxisFormat {
    #[default]
    Numeric,
    /// Values are fractional days after `origin`, itself in days since
    /// 1970-01-01; labelled `%Y-%m-%d`
    Date { origin: f64 },
}

/// Retained 2D figure: draw calls append artists.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Canvas2D {
    pub id: PlotId,
    pub meta: FigureMeta,
    pub artists: Vec<Artist2D>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub x_lim: Option<[f32; 2]>,
    pub y_lim: Option<[f32; 2]>,
    pub equal_aspect: bool,
}

impl Default for Canvas2D {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas2D {
    pub fn new() -> Self {
        Self {
            id: PlotId::new(),
            meta: FigureMeta::default(),
            artists: vec![],
            x_label: None,
            y_label: None,
            x_lim: None,
            y_lim: None,
            equal_aspect: false,
        }
    }

    pub fn meta(mut self, meta: FigureMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn x_label(mut self, label: impl Into<String>) -> Self {
        self.x_label = Some(label.into());
        self
    }

    pub fn y_label(mut self, label: impl Into<String>) -> Self {
        self.y_label = Some(label.into());
        self
    }

    pub fn set_x_lim(&mut self, lo: f32, hi: f32) -> Result<()> {
        self.x_lim = Some(check_limits("x_lim", lo, hi)?);
        Ok(())
    }

    pub fn set_y_lim(&mut self, lo: f32, hi: f32) -> Result<()> {
        self.y_lim = Some(check_limits("y_lim", lo, hi)?);
        Ok(())
    }

    pub fn set_equal_aspect(&mut self, equal: bool) {
        self.equal_aspect = equal;
    }

    pub fn circle(&mut self, center: Vec2, radius: f32, fill: Style) -> Result<()> {
        check_points(&[center])?;
        if !radius.is_finite() || radius < 0.0 {
            return Err(Report::new(FigError::Draw(format!(
                "circle radius must be finite and non-negative, got {radius}"
            ))));
        }
        fill.validate()?;
        self.artists.push(Artist2D::Circle {
            center,
            radius,
            fill,
        });
        Ok(())
    }

    pub fn polygon(&mut self, vertices: Vec<Vec2>, fill: Style) -> Result<()> {
        if vertices.len() < 3 {
            return Err(Report::new(FigError::Draw(format!(
                "polygon needs at least 3 vertices, got {}",
                vertices.len()
            ))));
        }
        check_points(&vertices)?;
        fill.validate()?;
        self.artists.push(Artist2D::Polygon { vertices, fill });
        Ok(())
    }

    pub fn line(&mut self, points: Vec<Vec2>, stroke: Style) -> Result<()> {
        if points.len() < 2 {
            return Err(Report::new(FigError::Draw(format!(
                "line needs at least 2 points, got {}",
                points.len()
            ))));
        }
        check_points(&points)?;
        stroke.validate()?;
        self.artists.push(Artist2D::Line { points, stroke });
        Ok(())
    }

    pub fn marker(&mut self, marker: Marker) -> Result<()> {
        check_points(&[marker.at])?;
        if !(marker.face.is_unit() && marker.edge.is_unit()) {
            return Err(Report::new(FigError::Draw(
                "marker colors must lie in [0, 1]".into(),
            )));
        }
        if !(0.0..=1.0).contains(&marker.opacity) || !marker.area.is_finite() || marker.area < 0.0
        {
            return Err(Report::new(FigError::Draw(format!(
                "marker area/opacity out of range: area={}, opacity={}",
                marker.area, marker.opacity
            ))));
        }
        self.artists.push(Artist2D::Marker(marker));
        Ok(())
    }

    /// Axis limits, falling back to the artist bounds
    pub fn view_bounds(&self) -> Option<([f32; 2], [f32; 2])> {
        let data = self.bounds();
        let x = self.x_lim.or_else(|| data.map(|(min, max)| [min[0], max[0]]))?;
        let y = self.y_lim.or_else(|| data.map(|(min, max)| [min[1], max[1]]))?;
        Some(([x[0], y[0]], [x[1], y[1]]))
    }

    /// Extent of every artist, circles included with their radius.
    pub fn bounds(&self) -> Option<([f32; 2], [f32; 2])> {
        let mut min = [f32::INFINITY; 2];
        let mut max = [f32::NEG_INFINITY; 2];
        let mut any = false;
        let mut grow = |p: Vec2, pad: f32| {
            min[0] = min[0].min(p.x - pad);
            min[1] = min[1].min(p.y - pad);
            max[0] = max[0].max(p.x + pad);
            max[1] = max[1].max(p.y + pad);
            any = true;
        };
        for artist in &self.artists {
            match artist {
                Artist2D::Circle { center, radius, .. } => grow(*center, *radius),
                Artist2D::Polygon { vertices: pts, .. } | Artist2D::Line { points: pts, .. } => {
                    pts.iter().for_each(|p| grow(*p, 0.0))
                }
                Artist2D::Marker(m) => grow(m.at, 0.0),
            }
        }
        any.then_some((min, max))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct View3D {
    /// Elevation in degrees above the x-y plane
    pub elevation: f32,
    /// Azimuth in degrees around the vertical axis
    pub azimuth: f32,
}

impl Default for View3D {
    fn default() -> Self {
        Self {
            elevation: 30.0,
            azimuth: -60.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Artist3D {
    /// Filled quads sharing one face style
    PolyCollection { quads: Vec<[Vec3; 4]>, face: Style },
    Line {
        points: Vec<Vec3>,
        stroke: Style,
        label: Option<String>,
    },
}

/// Retained 3D figure. `z` is the vertical data axis.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Canvas3D {
    pub id: PlotId,
    pub meta: FigureMeta,
    pub artists: Vec<Artist3D>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub z_label: Option<String>,
    pub x_lim: Option<[f32; 2]>,
    pub y_lim: Option<[f32; 2]>,
    pub z_lim: Option<[f32; 2]>,
    pub x_ticks: Vec<Tick>,
    pub y_format: AxisFormat,
    pub view: View3D,
    pub legend: bool,
}

impl Default for Canvas3D {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas3D {
    pub fn new() -> Self {
        Self {
            id: PlotId::new(),
            meta: FigureMeta::default(),
            artists: vec![],
            x_label: None,
            y_label: None,
            z_label: None,
            x_lim: None,
            y_lim: None,
            z_lim: None,
            x_ticks: vec![],
            y_format: AxisFormat::Numeric,
            view: View3D::default(),
            legend: false,
        }
    }

    pub fn meta(mut self, meta: FigureMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn x_label(mut self, label: impl Into<String>) -> Self {
        self.x_label = Some(label.into());
        self
    }

    pub fn y_label(mut self, label: impl Into<String>) -> Self {
        self.y_label = Some(label.into());
        self
    }

    pub fn z_label(mut self, label: impl Into<String>) -> Self {
        self.z_label = Some(label.into());
        self
    }

    pub fn view(mut self, elevation: f32, azimuth: f32) -> Self {
        self.view = View3D {
            elevation,
            azimuth,
        };
        self
    }

    pub fn set_limits(&mut self, x: [f32; 2], y: [f32; 2], z: [f32; 2]) -> Result<()> {
        self.x_lim = Some(check_limits("x_lim", x[0], x[1])?);
        self.y_lim = Some(check_limits("y_lim", y[0], y[1])?);
        self.z_lim = Some(check_limits("z_lim", z[0], z[1])?);
        Ok(())
    }

    pub fn set_x_ticks(&mut self, ticks: Vec<Tick>) {
        self.x_ticks = ticks;
    }

    pub fn set_y_format(&mut self, format: AxisFormat) {
        self.y_format = format;
    }

    pub fn set_legend(&mut self, show: bool) {
        self.legend = show;
    }

    pub fn poly_collection(&mut self, quads: Vec<[Vec3; 4]>, face: Style) -> Result<()> {
        if quads.iter().flatten().any(|v| !v.is_finite()) {
            return Err(Report::new(FigError::Draw(
                "poly collection vertices must be finite".into(),
            )));
        }
        face.validate()?;
        self.artists.push(Artist3D::PolyCollection { quads, face });
        Ok(())
    }

    pub fn line(
        &mut self,
        points: Vec<Vec3>,
        stroke: Style,
        label: Option<String>,
    ) -> Result<()> {
        if points.len() < 2 {
            return Err(Report::new(FigError::Draw(format!(
                "3D line needs at least 2 points, got {}",
                points.len()
            ))));
        }
        if points.iter().any(|p| !p.is_finite()) {
            return Err(Report::new(FigError::Draw(
                "3D line points must be finite".into(),
            )));
        }
        stroke.validate()?;
        self.artists.push(Artist3D::Line {
            points,
            stroke,
            label,
        });
        Ok(())
    }

    /// (label, color) of every labelled line, in draw order
    pub fn legend_entries(&self) -> Vec<(&str, Color)> {
        self.artists
            .iter()
            .filter_map(|a| match a {
                Artist3D::Line {
                    label: Some(label),
                    stroke,
                    ..
                } => Some((label.as_str(), stroke.color)),
                _ => None,
            })
            .collect()
    }

    /// Axis limits, falling back to the artist bounds
    pub fn bounds(&self) -> ([f32; 3], [f32; 3]) {
        let mut min = [f32::INFINITY; 3];
        let mut max = [f32::NEG_INFINITY; 3];
        for artist in &self.artists {
            let pts: Box<dyn Iterator<Item = &Vec3>> = match artist {
                Artist3D::PolyCollection { quads, .. } => Box::new(quads.iter().flatten()),
                Artist3D::Line { points, .. } => Box::new(points.iter()),
            };
            for p in pts {
                for (axis, v) in p.to_array().into_iter().enumerate() {
                    min[axis] = min[axis].min(v);
                    max[axis] = max[axis].max(v);
                }
            }
        }
        for (axis, lim) in [self.x_lim, self.y_lim, self.z_lim].into_iter().enumerate() {
            if let Some([lo, hi]) = lim {
                min[axis] = lo;
                max[axis] = hi;
            }
            if !(min[axis] < max[axis]) {
                min[axis] = 0.0;
                max[axis] = 1.0;
            }
        }
        (min, max)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Figure {
    TwoD(Canvas2D),
    ThreeD(Canvas3D),
}

impl Figure {
    pub fn id(&self) -> PlotId {
        match self {
            Figure::TwoD(c) => c.id,
            Figure::ThreeD(c) => c.id,
        }
    }

    pub fn meta(&self) -> &FigureMeta {
        match self {
            Figure::TwoD(c) => &c.meta,
            Figure::ThreeD(c) => &c.meta,
        }
    }

    pub fn as_2d(&self) -> Option<&Canvas2D> {
        match self {
            Figure::TwoD(c) => Some(c),
            Figure::ThreeD(_) => None,
        }
    }

    pub fn as_3d(&self) -> Option<&Canvas3D> {
        match self {
            Figure::ThreeD(c) => Some(c),
            Figure::TwoD(_) => None,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| Report::new(FigError::Serialization(e.to_string())))
            .attach("while serializing a figure")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Report::new(FigError::Serialization(e.to_string())))
            .attach("while parsing a figure")
    }

    /// Open the figure in a window (native only)
    #[cfg(not(target_arch = "wasm32"))]
    pub fn show(self) {
        crate::dash::dash().add(self).run_local();
    }
}

impl From<Canvas2D> for Figure {
    fn from(c: Canvas2D) -> Self {
        Figure::TwoD(c)
    }
}

impl From<Canvas3D> for Figure {
    fn from(c: Canvas3D) -> Self {
        Figure::ThreeD(c)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Dashboard {
    pub background: Color,
    pub figures: Vec<Figure>,
    /// Number of columns per row (default: auto based on figure count)
    pub columns: Option<usize>,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self {
            background: Color::WHITE,
            figures: vec![],
            columns: None,
        }
    }
}

impl Dashboard {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| Report::new(FigError::Serialization(e.to_string())))
            .attach("while serializing a dashboard")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Report::new(FigError::Serialization(e.to_string())))
            .attach("while parsing a dashboard")
    }
}

fn check_points(points: &[Vec2]) -> Result<()> {
    match points.iter().position(|p| !p.is_finite()) {
        Some(i) => Err(Report::new(FigError::Draw(format!(
            "point {i} is not finite: {:?}",
            points[i]
        )))),
        None => Ok(()),
    }
}

fn check_limits(arg: &'static str, lo: f32, hi: f32) -> Result<[f32; 2]> {
    if !lo.is_finite() || !hi.is_finite() || lo > hi {
        return Err(Report::new(FigError::value(
            arg,
            format!("expected finite lo <= hi, got [{lo}, {hi}]"),
        )));
    }
    Ok([lo, hi])
}
