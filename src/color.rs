//! Color specifications and their resolution into per-item RGB colors.
//!
//! A [`ColorSpec`] is resolved against an item count `n` by [`resolve`]. The
//! per-item list is handled the same way everywhere; the default palette, the
//! gradient sampling and the raw-matrix rules differ per chart and are
//! supplied through a [`ColorPolicy`].

use crate::core::Color;
use crate::error::{FigError, Result};
use error_stack::{Report, ResultExt};
use serde::{Deserialize, Serialize};

/// One explicitly given color.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ColorEntry {
    /// `#rgb`, `#rrggbb` or `#rrggbbaa` (alpha is ignored)
    Hex(String),
    /// Channels in [0, 1]
    Rgb([f32; 3]),
}

impl ColorEntry {
    /// Parse and range-check the entry. Failures are reported as
    /// [`FigError::ColorEntry`] at `index`.
    pub fn to_color(&self, index: usize) -> Result<Color> {
        match self {
            ColorEntry::Hex(s) => parse_hex(s).change_context(FigError::ColorEntry {
                index,
                reason: format!("unparseable hex color {s:?}"),
            }),
            ColorEntry::Rgb(c) => {
                let color = Color::from_array(*c);
                if color.is_unit() {
                    Ok(color)
                } else {
                    Err(Report::new(FigError::ColorEntry {
                        index,
                        reason: format!("RGB channels must lie in [0, 1], got {c:?}"),
                    }))
                }
            }
        }
    }
}

impl From<&str> for ColorEntry {
    fn from(s: &str) -> Self {
        ColorEntry::Hex(s.to_string())
    }
}

impl From<String> for ColorEntry {
    fn from(s: String) -> Self {
        ColorEntry::Hex(s)
    }
}

impl From<[f32; 3]> for ColorEntry {
    fn from(c: [f32; 3]) -> Self {
        ColorEntry::Rgb(c)
    }
}

impl From<(f32, f32, f32)> for ColorEntry {
    fn from((r, g, b): (f32, f32, f32)) -> Self {
        ColorEntry::Rgb([r, g, b])
    }
}

impl From<Color> for ColorEntry {
    fn from(c: Color) -> Self {
        ColorEntry::Rgb(c.to_array())
    }
}

/// How per-item colors are derived.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum ColorSpec {
    /// The chart's built-in palette
    #[default]
    Default,
    /// Linear interpolation between two endpoint colors
    Gradient(ColorEntry, ColorEntry),
    /// Exactly one color per item
    PerItem(Vec<ColorEntry>),
    /// Raw numeric rows, used as-is
    Matrix(Vec<Vec<f32>>),
}

impl ColorSpec {
    pub fn gradient(start: impl Into<ColorEntry>, end: impl Into<ColorEntry>) -> Self {
        ColorSpec::Gradient(start.into(), end.into())
    }

    pub fn per_item<I, E>(entries: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<ColorEntry>,
    {
        ColorSpec::PerItem(entries.into_iter().map(Into::into).collect())
    }

    pub fn matrix(rows: Vec<Vec<f32>>) -> Self {
        ColorSpec::Matrix(rows)
    }
}

/// Parse a `#`-prefixed hex color.
pub fn parse_hex(s: &str) -> Result<Color> {
    let invalid = |reason: String| Report::new(FigError::ColorSpec(reason));
    let digits = s
        .strip_prefix('#')
        .ok_or_else(|| invalid(format!("hex color must start with '#': {s:?}")))?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid(format!("invalid hex digits in {s:?}")));
    }
    let channel = |hex: &str| -> f32 {
        // Digits are validated above, so parsing cannot fail.
        u8::from_str_radix(hex, 16).unwrap_or(0) as f32 / 255.0
    };
    match digits.len() {
        3 => {
            let expand = |i: usize| digits[i..i + 1].repeat(2);
            Ok(Color::rgb(
                channel(&expand(0)),
                channel(&expand(1)),
                channel(&expand(2)),
            ))
        }
        6 | 8 => Ok(Color::rgb(
            channel(&digits[0..2]),
            channel(&digits[2..4]),
            channel(&digits[4..6]),
        )),
        n => Err(invalid(format!(
            "hex color needs 3, 6 or 8 digits, got {n} in {s:?}"
        ))),
    }
}

/// Standard six-sector HSV to RGB conversion, all components in [0, 1].
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Color {
    if s == 0.0 {
        return Color::grey(v);
    }
    let sector = (h * 6.0).floor();
    let f = h * 6.0 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match (sector as i64).rem_euclid(6) {
        0 => Color::rgb(v, t, p),
        1 => Color::rgb(q, v, p),
        2 => Color::rgb(p, v, t),
        3 => Color::rgb(p, q, v),
        4 => Color::rgb(t, p, v),
        _ => Color::rgb(v, p, q),
    }
}

/// Two-stop linear gradient.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Gradient {
    pub start: Color,
    pub end: Color,
}

impl Gradient {
    /// Entries in a quantised lookup table
    pub const LUT_SIZE: usize = 256;

    pub const fn new(start: Color, end: Color) -> Self {
        Self { start, end }
    }

    /// Gradient between two `#rrggbb` constants
    pub fn from_hex(start: &str, end: &str) -> Result<Self> {
        Self::from_entries(&ColorEntry::from(start), &ColorEntry::from(end))
    }

    pub fn from_entries(start: &ColorEntry, end: &ColorEntry) -> Result<Self> {
        let parse = |index: usize, e: &ColorEntry| e.to_color(index).attach("gradient endpoint");
        Ok(Self::new(parse(0, start)?, parse(1, end)?))
    }

    /// Exact interpolation at `t` in [0, 1].
    pub fn at(&self, t: f32) -> Color {
        self.start.lerp(self.end, t)
    }

    /// Entry `index` of the 256-entry lookup table.
    pub fn lut_entry(&self, index: usize) -> Color {
        let index = index.min(Self::LUT_SIZE - 1);
        self.at(index as f32 / (Self::LUT_SIZE - 1) as f32)
    }

    /// Quantised lookup: `t` selects the table entry `floor(t * 256)`.
    pub fn sample_lut(&self, t: f32) -> Color {
        let scaled = (t.clamp(0.0, 1.0) * Self::LUT_SIZE as f32).floor() as usize;
        self.lut_entry(scaled)
    }

    /// `t_i = i / (n - 1)`; a single item sits in the middle.
    pub fn by_index(&self, n: usize) -> Vec<Color> {
        match n {
            0 => vec![],
            1 => vec![self.at(0.5)],
            _ => (0..n).map(|i| self.at(i as f32 / (n - 1) as f32)).collect(),
        }
    }

    /// `t_i = i / (n - 1)`; a single item takes the start color.
    pub fn linspace(&self, n: usize) -> Vec<Color> {
        match n {
            0 => vec![],
            1 => vec![self.start],
            _ => (0..n).map(|i| self.at(i as f32 / (n - 1) as f32)).collect(),
        }
    }
}

/// Chart-specific parts of color resolution.
pub trait ColorPolicy {
    /// Colors used when the spec is [`ColorSpec::Default`].
    fn default_colors(&self, n: usize) -> Result<Vec<Color>>;

    /// Sample `n` colors from a two-stop gradient.
    fn gradient(&self, gradient: &Gradient, n: usize) -> Vec<Color>;

    /// Interpret a raw matrix. Requires exactly `n` rows of 3 unless overridden.
    fn matrix(&self, rows: &[Vec<f32>], n: usize) -> Result<Vec<Color>> {
        if rows.len() != n {
            return Err(Report::new(FigError::ColorSpec(format!(
                "color matrix must be {n} x 3, got {} rows",
                rows.len()
            ))));
        }
        matrix_rows(rows)
    }
}

/// Resolve `spec` into exactly `n` colors, each inside [0, 1]³.
pub fn resolve<P>(spec: &ColorSpec, n: usize, policy: &P) -> Result<Vec<Color>>
where
    P: ColorPolicy + ?Sized,
{
    let colors = match spec {
        ColorSpec::Default => policy.default_colors(n)?,
        ColorSpec::Gradient(start, end) => {
            policy.gradient(&Gradient::from_entries(start, end)?, n)
        }
        ColorSpec::PerItem(entries) => per_item(entries, n)?,
        ColorSpec::Matrix(rows) => policy.matrix(rows, n)?,
    };
    if colors.len() != n {
        return Err(Report::new(FigError::ColorSpec(format!(
            "resolved {} colors for {n} items",
            colors.len()
        ))));
    }
    if let Some(index) = colors.iter().position(|c| !c.is_unit()) {
        return Err(Report::new(FigError::ColorEntry {
            index,
            reason: format!("channels outside [0, 1]: {:?}", colors[index].to_array()),
        }));
    }
    Ok(colors)
}

fn per_item(entries: &[ColorEntry], n: usize) -> Result<Vec<Color>> {
    if entries.len() != n {
        return Err(Report::new(FigError::ColorSpec(format!(
            "per-item color list must have {n} entries, got {}",
            entries.len()
        ))));
    }
    entries
        .iter()
        .enumerate()
        .map(|(index, e)| e.to_color(index))
        .collect()
}

/// Rows of exactly three channels, converted without range changes.
pub fn matrix_rows(rows: &[Vec<f32>]) -> Result<Vec<Color>> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| match row.as_slice() {
            [r, g, b] => Ok(Color::rgb(*r, *g, *b)),
            _ => Err(Report::new(FigError::ColorSpec(format!(
                "color matrix row {i} must have 3 columns, got {}",
                row.len()
            )))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Uniform;

    impl ColorPolicy for Uniform {
        fn default_colors(&self, n: usize) -> Result<Vec<Color>> {
            Ok(vec![Color::grey(0.5); n])
        }

        fn gradient(&self, gradient: &Gradient, n: usize) -> Vec<Color> {
            gradient.by_index(n)
        }
    }

    fn close(a: Color, b: Color) -> bool {
        (a.r - b.r).abs() < 1e-6 && (a.g - b.g).abs() < 1e-6 && (a.b - b.b).abs() < 1e-6
    }

    #[test]
    fn parses_hex_forms() {
        assert_eq!(parse_hex("#ff0000").unwrap(), Color::rgb(1.0, 0.0, 0.0));
        assert_eq!(parse_hex("#0000FF").unwrap(), Color::rgb(0.0, 0.0, 1.0));
        assert_eq!(parse_hex("#fff").unwrap(), Color::WHITE);
        assert_eq!(parse_hex("#00ff0080").unwrap(), Color::rgb(0.0, 1.0, 0.0));
        assert!(close(
            parse_hex("#00F260").unwrap(),
            Color::rgb(0.0, 242.0 / 255.0, 96.0 / 255.0)
        ));
        assert!(parse_hex("ff0000").is_err());
        assert!(parse_hex("#ff00").is_err());
        let err = parse_hex("#gg0000").unwrap_err();
        assert!(matches!(err.current_context(), FigError::ColorSpec(_)));
    }

    #[test]
    fn entries_report_their_index() {
        assert_eq!(ColorEntry::from("#fff").to_color(3).unwrap(), Color::WHITE);

        let err = ColorEntry::from("#12").to_color(4).unwrap_err();
        assert!(matches!(err.current_context(), FigError::ColorEntry { index: 4, .. }));
        // the parse failure stays in the report beneath the entry context
        assert_eq!(err.frames().filter_map(|f| f.downcast_ref::<FigError>()).count(), 2);

        let err = ColorEntry::from([0.0, 1.5, 0.0]).to_color(2).unwrap_err();
        assert!(matches!(err.current_context(), FigError::ColorEntry { index: 2, .. }));
    }

    #[test]
    fn hsv_primary_hues() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), Color::rgb(1.0, 0.0, 0.0));
        assert!(close(hsv_to_rgb(1.0 / 3.0, 1.0, 1.0), Color::rgb(0.0, 1.0, 0.0)));
        assert!(close(hsv_to_rgb(2.0 / 3.0, 1.0, 1.0), Color::rgb(0.0, 0.0, 1.0)));
        assert_eq!(hsv_to_rgb(0.4, 0.0, 0.25), Color::grey(0.25));
    }

    #[test]
    fn gradient_endpoints_are_exact() {
        let g = Gradient::from_hex("#ff6e7f", "#bfe9ff").unwrap();
        assert_eq!(g.at(0.0), g.start);
        assert_eq!(g.at(1.0), g.end);
        assert_eq!(g.sample_lut(0.0), g.start);
        assert_eq!(g.sample_lut(1.0), g.end);
        assert_eq!(g.lut_entry(255), g.end);
    }

    #[test]
    fn lut_quantises_to_256_entries() {
        let g = Gradient::new(Color::BLACK, Color::WHITE);
        // floor(0.5 * 256) = 128 -> 128 / 255
        assert!(close(g.sample_lut(0.5), Color::grey(128.0 / 255.0)));
        assert_eq!(g.sample_lut(0.001), g.start);
    }

    #[test]
    fn index_and_linspace_differ_only_for_single_item() {
        let g = Gradient::new(Color::BLACK, Color::WHITE);
        assert_eq!(g.by_index(1), vec![Color::grey(0.5)]);
        assert_eq!(g.linspace(1), vec![Color::BLACK]);
        assert_eq!(g.by_index(3), g.linspace(3));
        assert_eq!(g.by_index(3)[1], Color::grey(0.5));
    }

    #[test]
    fn resolve_yields_n_unit_colors_for_every_variant() {
        for n in 1..8 {
            let specs = [
                ColorSpec::Default,
                ColorSpec::gradient("#000000", "#ffffff"),
                ColorSpec::per_item((0..n).map(|i| [i as f32 / n as f32, 0.0, 1.0])),
                ColorSpec::matrix(vec![vec![0.25, 0.5, 0.75]; n]),
            ];
            for spec in &specs {
                let colors = resolve(spec, n, &Uniform).unwrap();
                assert_eq!(colors.len(), n);
                assert!(colors.iter().all(Color::is_unit));
            }
        }
    }

    #[test]
    fn per_item_length_and_entries_are_checked() {
        let err = resolve(&ColorSpec::per_item(["#ff0000"]), 2, &Uniform).unwrap_err();
        assert!(matches!(err.current_context(), FigError::ColorSpec(_)));

        let spec = ColorSpec::PerItem(vec!["#ff0000".into(), "red?".into()]);
        let err = resolve(&spec, 2, &Uniform).unwrap_err();
        assert!(matches!(
            err.current_context(),
            FigError::ColorEntry { index: 1, .. }
        ));

        let spec = ColorSpec::per_item([[0.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);
        assert!(resolve(&spec, 2, &Uniform).is_err());
    }

    #[test]
    fn matrix_shape_is_checked() {
        let wrong_rows = ColorSpec::matrix(vec![vec![0.0, 0.0, 0.0]]);
        assert!(resolve(&wrong_rows, 2, &Uniform).is_err());

        let wrong_cols = ColorSpec::matrix(vec![vec![0.0, 0.0], vec![0.0, 0.0]]);
        assert!(resolve(&wrong_cols, 2, &Uniform).is_err());

        let out_of_range = ColorSpec::matrix(vec![vec![0.0, 0.0, 3.0]]);
        let err = resolve(&out_of_range, 1, &Uniform).unwrap_err();
        assert!(matches!(err.current_context(), FigError::ColorEntry { index: 0, .. }));
    }

    #[test]
    fn bad_gradient_endpoint_is_reported() {
        let err = resolve(&ColorSpec::gradient("#ff0000", "nope"), 3, &Uniform).unwrap_err();
        assert!(matches!(
            err.current_context(),
            FigError::ColorEntry { index: 1, .. }
        ));
    }
}
