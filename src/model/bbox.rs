//! Bounding polygons and the geometric predicates used to compare them.
//!
//! Boxes are quadrilaterals in the upstream detector's page coordinate space.
//! They are not assumed to be axis-aligned: containment and overlap are
//! evaluated on the real polygons with `geo`, after a cheap envelope check.

use std::cmp::Ordering;
use std::fmt;

use geo::{Area, BooleanOps, Contains, LineString, Polygon};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Minimum number of points a bounding box must carry.
pub const MIN_POINTS: usize = 4;

/// A point in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Point {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate (grows downwards for top-left origin sources)
    pub y: f64,
}

impl Point {
    /// Create a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<Point> for (f64, f64) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}

/// Axis-aligned envelope of a bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    /// Minimum x
    pub left: f64,
    /// Minimum y
    pub top: f64,
    /// Maximum x
    pub right: f64,
    /// Maximum y
    pub bottom: f64,
}

impl Envelope {
    /// Check whether the two envelopes share a region of positive area.
    pub fn overlaps(&self, other: &Envelope) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }

    /// Check whether `other` lies inside this envelope (boundary included).
    pub fn encloses(&self, other: &Envelope) -> bool {
        other.left >= self.left
            && other.right <= self.right
            && other.top >= self.top
            && other.bottom <= self.bottom
    }
}

/// A validated bounding polygon of at least four points.
///
/// Construction rejects short, non-finite and degenerate (zero width, height
/// or area) polygons, so every value of this type can take part in
/// containment and overlap tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point>", into = "Vec<Point>")]
pub struct BoundingBox {
    points: Vec<Point>,
}

impl BoundingBox {
    /// Create a bounding box from its points.
    pub fn new(points: Vec<Point>) -> Result<Self> {
        if points.len() < MIN_POINTS {
            return Err(Error::InvalidGeometry(format!(
                "expected at least {} points, got {}",
                MIN_POINTS,
                points.len()
            )));
        }
        if let Some(p) = points.iter().find(|p| !p.is_finite()) {
            return Err(Error::InvalidGeometry(format!(
                "non-finite coordinate ({}, {})",
                p.x, p.y
            )));
        }

        let bbox = Self { points };
        let env = bbox.envelope();
        if env.right - env.left <= 0.0 || env.bottom - env.top <= 0.0 {
            return Err(Error::InvalidGeometry(format!(
                "degenerate box {}x{}",
                env.right - env.left,
                env.bottom - env.top
            )));
        }
        if bbox.area() <= 0.0 {
            return Err(Error::InvalidGeometry("polygon has zero area".into()));
        }

        Ok(bbox)
    }

    /// Build a box from parallel x and y coordinate arrays.
    ///
    /// Coordinates are zipped pairwise; surplus values in the longer array
    /// are ignored.
    pub fn from_coords(xs: &[f64], ys: &[f64]) -> Result<Self> {
        Self::new(
            xs.iter()
                .zip(ys.iter())
                .map(|(&x, &y)| Point::new(x, y))
                .collect(),
        )
    }

    /// Build an axis-aligned box from its edges, clockwise from top-left.
    pub fn from_rect(left: f64, top: f64, right: f64, bottom: f64) -> Result<Self> {
        Self::new(vec![
            Point::new(left, top),
            Point::new(right, top),
            Point::new(right, bottom),
            Point::new(left, bottom),
        ])
    }

    /// The polygon's points in source order.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Smallest y coordinate (visually highest for a top-left origin).
    pub fn top(&self) -> f64 {
        self.points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min)
    }

    /// Largest y coordinate.
    pub fn bottom(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.y)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Smallest x coordinate.
    pub fn left(&self) -> f64 {
        self.points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min)
    }

    /// Largest x coordinate.
    pub fn right(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.x)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// X coordinate of the topmost point (leftmost among equally high points).
    pub fn top_left_x(&self) -> f64 {
        let top = self.top();
        self.points
            .iter()
            .filter(|p| p.y == top)
            .map(|p| p.x)
            .fold(f64::INFINITY, f64::min)
    }

    /// Envelope width.
    pub fn width(&self) -> f64 {
        self.right() - self.left()
    }

    /// Envelope height.
    pub fn height(&self) -> f64 {
        self.bottom() - self.top()
    }

    /// Axis-aligned envelope.
    pub fn envelope(&self) -> Envelope {
        Envelope {
            left: self.left(),
            top: self.top(),
            right: self.right(),
            bottom: self.bottom(),
        }
    }

    /// Polygon area.
    pub fn area(&self) -> f64 {
        self.to_polygon().unsigned_area()
    }

    /// Convert to a closed `geo` polygon.
    pub fn to_polygon(&self) -> Polygon<f64> {
        let ring: Vec<(f64, f64)> = self.points.iter().map(|&p| p.into()).collect();
        Polygon::new(LineString::from(ring), vec![])
    }

    /// Check whether the polygon is exactly its axis-aligned envelope.
    pub fn is_rectangle(&self) -> bool {
        let env = self.envelope();
        let corners = [
            Point::new(env.left, env.top),
            Point::new(env.right, env.top),
            Point::new(env.right, env.bottom),
            Point::new(env.left, env.bottom),
        ];
        self.points.len() == MIN_POINTS && corners.iter().all(|c| self.points.contains(c))
    }

    /// Check whether `inner` lies entirely inside this box, boundary included.
    pub fn contains(&self, inner: &BoundingBox) -> bool {
        if !self.envelope().encloses(&inner.envelope()) {
            return false;
        }
        if self == inner || self.is_rectangle() {
            return true;
        }
        self.to_polygon().contains(&inner.to_polygon())
    }

    /// Check whether the two boxes share a region of positive area.
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        if !self.envelope().overlaps(&other.envelope()) {
            return false;
        }
        if self.is_rectangle() && other.is_rectangle() {
            return true;
        }
        let shared = self.to_polygon().intersection(&other.to_polygon());
        shared.unsigned_area() > 0.0
    }

    /// Reading-order comparison: by top, then by the x of the topmost point.
    pub fn reading_cmp(&self, other: &BoundingBox) -> Ordering {
        self.top()
            .total_cmp(&other.top())
            .then_with(|| self.top_left_x().total_cmp(&other.top_left_x()))
    }
}

impl TryFrom<Vec<Point>> for BoundingBox {
    type Error = Error;

    fn try_from(points: Vec<Point>) -> Result<Self> {
        Self::new(points)
    }
}

impl From<BoundingBox> for Vec<Point> {
    fn from(bbox: BoundingBox) -> Self {
        bbox.points
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pts: Vec<String> = self
            .points
            .iter()
            .map(|p| format!("({}, {})", p.x, p.y))
            .collect();
        write!(f, "[{}]", pts.join(", "))
    }
}

/// Check whether `inner` is fully enclosed by `outer`.
pub fn containment(inner: &BoundingBox, outer: &BoundingBox) -> bool {
    outer.contains(inner)
}

/// Check whether two boxes share any area.
pub fn overlaps(a: &BoundingBox, b: &BoundingBox) -> bool {
    a.overlaps(b)
}

/// Minimum y coordinate of a box.
pub fn top(bbox: &BoundingBox) -> f64 {
    bbox.top()
}

/// Maximum y coordinate of a box.
pub fn bottom(bbox: &BoundingBox) -> f64 {
    bbox.bottom()
}
