//! Input normalisation and per-item geometry shared by the chart helpers.

use crate::error::{FigError, Result};
use bevy_math::{Vec2, Vec3};
use chrono::{DateTime, NaiveDateTime};
use error_stack::Report;
use serde::{Deserialize, Serialize};

const MS_PER_DAY: f64 = 86_400_000.0;

/// Ordered (x, y) pairs in canonical n x 2 form.
#[derive(Clone, Debug, PartialEq)]
pub struct PointSet(Vec<Vec2>);

impl PointSet {
    /// Accepts a 2 x n matrix (xs row, ys row) or an n x 2 matrix.
    ///
    /// A matrix whose first dimension is 2 is always read as 2 x n, so a
    /// 2 x 2 input holds the points `(m[0][0], m[1][0])` and
    /// `(m[0][1], m[1][1])`.
    pub fn from_rows(arg: &'static str, rows: &[Vec<f32>]) -> Result<Self> {
        let expected = "a 2 x n or n x 2 matrix";
        let Some(first) = rows.first() else {
            return Err(Report::new(FigError::shape(arg, expected)).attach("matrix has no rows"));
        };
        if rows.iter().any(|r| r.len() != first.len()) {
            return Err(Report::new(FigError::shape(arg, expected))
                .attach("rows have different lengths (rank is not 2)"));
        }

        let points: Vec<Vec2> = if rows.len() == 2 {
            rows[0]
                .iter()
                .zip(&rows[1])
                .map(|(&x, &y)| Vec2::new(x, y))
                .collect()
        } else if first.len() == 2 {
            rows.iter().map(|r| Vec2::new(r[0], r[1])).collect()
        } else {
            return Err(Report::new(FigError::shape(arg, expected))
                .attach(format!("got {} x {}", rows.len(), first.len())));
        };

        if points.is_empty() {
            return Err(Report::new(FigError::shape(arg, expected)).attach("no points given"));
        }
        check_finite(arg, points.iter().flat_map(|p| [p.x, p.y]))?;
        Ok(Self(points))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn points(&self) -> &[Vec2] {
        &self.0
    }

    pub fn xs(&self) -> impl Iterator<Item = f32> + '_ {
        self.0.iter().map(|p| p.x)
    }

    pub fn ys(&self) -> impl Iterator<Item = f32> + '_ {
        self.0.iter().map(|p| p.y)
    }
}

/// n groups of m points each; `[0, 0]` marks an absent point.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupTensor {
    groups: Vec<Vec<Vec2>>,
    per_group: usize,
}

impl GroupTensor {
    pub fn from_groups(arg: &'static str, groups: &[Vec<[f32; 2]>]) -> Result<Self> {
        let per_group = groups.first().map_or(0, Vec::len);
        if let Some(bad) = groups.iter().position(|g| g.len() != per_group) {
            return Err(Report::new(FigError::shape(arg, "an n x m x 2 array"))
                .attach(format!(
                    "group {bad} has {} points, group 0 has {per_group}",
                    groups[bad].len()
                )));
        }
        check_finite(arg, groups.iter().flatten().flatten().copied())?;
        Ok(Self {
            groups: groups
                .iter()
                .map(|g| g.iter().map(|&[x, y]| Vec2::new(x, y)).collect())
                .collect(),
            per_group,
        })
    }

    /// Number of groups (n)
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Points per group (m)
    pub fn per_group(&self) -> usize {
        self.per_group
    }

    pub fn group(&self, k: usize) -> &[Vec2] {
        &self.groups[k]
    }

    pub fn groups(&self) -> impl Iterator<Item = &[Vec2]> + '_ {
        self.groups.iter().map(Vec::as_slice)
    }

    /// Every point of every group, sentinels included
    pub fn all_points(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.groups.iter().flatten().copied()
    }
}

/// n_time x n_cat matrix; column `i` is the series of category `i`.
#[derive(Clone, Debug, PartialEq)]
pub struct SeriesMatrix {
    rows: Vec<Vec<f32>>,
    n_cat: usize,
}

impl SeriesMatrix {
    pub fn from_rows(arg: &'static str, rows: &[Vec<f32>]) -> Result<Self> {
        let expected = "an n_time x n_cat matrix with at least one row and column";
        let n_cat = rows.first().map_or(0, Vec::len);
        if n_cat == 0 {
            return Err(Report::new(FigError::shape(arg, expected)));
        }
        if let Some(bad) = rows.iter().position(|r| r.len() != n_cat) {
            return Err(Report::new(FigError::shape(arg, expected)).attach(format!(
                "row {bad} has {} columns, row 0 has {n_cat}",
                rows[bad].len()
            )));
        }
        check_finite(arg, rows.iter().flatten().copied())?;
        Ok(Self {
            rows: rows.to_vec(),
            n_cat,
        })
    }

    pub fn n_time(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cat(&self) -> usize {
        self.n_cat
    }

    pub fn column(&self, i: usize) -> Vec<f32> {
        self.rows.iter().map(|r| r[i]).collect()
    }

    pub fn max(&self) -> f32 {
        self.rows
            .iter()
            .flatten()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max)
    }
}

/// Sample positions along the time axis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TimeVector {
    Numeric(Vec<f64>),
    Dates(Vec<NaiveDateTime>),
}

impl TimeVector {
    pub fn len(&self) -> usize {
        match self {
            TimeVector::Numeric(v) => v.len(),
            TimeVector::Dates(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_dates(&self) -> bool {
        matches!(self, TimeVector::Dates(_))
    }

    /// Axis position of offset 0: the first timestamp in days since
    /// 1970-01-01, or 0 for numeric samples.
    pub fn origin(&self) -> f64 {
        match self {
            TimeVector::Numeric(_) => 0.0,
            TimeVector::Dates(v) => v.first().map_or(0.0, |&d| date_to_days(d)),
        }
    }

    /// Numeric axis positions. Timestamps become fractional days after
    /// [`origin`](Self::origin), subtracted in f64 so sub-minute spacing survives.
    pub fn to_axis(&self) -> Vec<f32> {
        match self {
            TimeVector::Numeric(v) => v.iter().map(|&t| t as f32).collect(),
            TimeVector::Dates(v) => {
                let origin = self.origin();
                v.iter().map(|&d| (date_to_days(d) - origin) as f32).collect()
            }
        }
    }
}

impl From<Vec<f64>> for TimeVector {
    fn from(v: Vec<f64>) -> Self {
        TimeVector::Numeric(v)
    }
}

impl From<Vec<NaiveDateTime>> for TimeVector {
    fn from(v: Vec<NaiveDateTime>) -> Self {
        TimeVector::Dates(v)
    }
}

pub fn date_to_days(d: NaiveDateTime) -> f64 {
    d.and_utc().timestamp_millis() as f64 / MS_PER_DAY
}

/// `%Y-%m-%d` label for an axis position in days since 1970-01-01.
pub fn date_label(days: f64) -> String {
    DateTime::from_timestamp_millis((days * MS_PER_DAY).round() as i64)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| format!("{days:.1}"))
}

/// True for the reserved "no point present" value.
#[inline]
pub fn is_sentinel(p: Vec2) -> bool {
    p.x == 0.0 && p.y == 0.0
}

/// Min-max normalisation into [0, 1]; a constant input maps to 0.5.
pub fn normalize(arg: &'static str, values: &[f32]) -> Result<Vec<f32>> {
    if values.is_empty() {
        return Err(Report::new(FigError::value(arg, "cannot normalise an empty vector")));
    }
    check_finite(arg, values.iter().copied())?;
    let (lo, hi) = min_max(values.iter().copied()).unwrap_or((0.0, 0.0));
    if hi == lo {
        return Ok(vec![0.5; values.len()]);
    }
    Ok(values.iter().map(|v| (v - lo) / (hi - lo)).collect())
}

pub fn min_max(values: impl IntoIterator<Item = f32>) -> Option<(f32, f32)> {
    values.into_iter().fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// `[lo - frac * range, hi + frac * range]`
pub fn padded(lo: f32, hi: f32, frac: f32) -> [f32; 2] {
    let pad = frac * (hi - lo);
    [lo - pad, hi + pad]
}

/// Closed outline between a line and the x axis: the points in order, then
/// the same x-coordinates back in reverse at y = 0.
pub fn fill_polygon(line: &[Vec2]) -> Vec<Vec2> {
    line.iter()
        .copied()
        .chain(line.iter().rev().map(|p| Vec2::new(p.x, 0.0)))
        .collect()
}

/// Quads between a series at `x` and the z = 0 plane, one per consecutive
/// pair of time samples: `[top_j, top_j+1, bottom_j+1, bottom_j]`.
pub fn ribbon_quads(x: f32, times: &[f32], values: &[f32]) -> Vec<[Vec3; 4]> {
    let top = |j: usize| Vec3::new(x, times[j], values[j]);
    let bottom = |j: usize| Vec3::new(x, times[j], 0.0);
    (0..times.len().min(values.len()).saturating_sub(1))
        .map(|j| [top(j), top(j + 1), bottom(j + 1), bottom(j)])
        .collect()
}

fn check_finite(arg: &'static str, values: impl IntoIterator<Item = f32>) -> Result<()> {
    match values.into_iter().position(|v| !v.is_finite()) {
        Some(i) => Err(Report::new(FigError::value(
            arg,
            format!("element {i} is not finite"),
        ))),
        None => Ok(()),
    }
}
