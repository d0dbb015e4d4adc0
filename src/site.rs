use std::cmp::Ordering;

use geo_types::{point, Coord, Point};

use crate::math::CoordType;

/// An input point of the triangulation.
///
/// Only `x` and `y` take part in the planar predicates; `z` is carried along
/// and interpolated by the 3D-aware center calculators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Site<T>
where
    T: CoordType,
{
    pub x: T,
    pub y: T,
    pub z: T,
}

impl<T> Site<T>
where
    T: CoordType,
{
    pub fn new(x: T, y: T) -> Self {
        Self { x, y, z: T::zero() }
    }

    pub fn with_z(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }

    /// The planar position of this site.
    #[inline]
    pub fn xy(&self) -> Point<T> {
        point!(x: self.x, y: self.y)
    }

    /// Lexicographic order: by `x`, ties broken by `y`.
    pub fn lex_cmp(&self, other: &Self) -> Ordering {
        self.x
            .partial_cmp(&other.x)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.y.partial_cmp(&other.y).unwrap_or(Ordering::Equal))
    }

    /// Two sites with the same planar position are the same vertex.
    #[inline]
    pub fn same_position(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl<T> From<Point<T>> for Site<T>
where
    T: CoordType,
{
    fn from(p: Point<T>) -> Self {
        Site::new(p.x(), p.y())
    }
}

impl<T> From<Coord<T>> for Site<T>
where
    T: CoordType,
{
    fn from(c: Coord<T>) -> Self {
        Site::new(c.x, c.y)
    }
}

impl<T> From<(T, T)> for Site<T>
where
    T: CoordType,
{
    fn from((x, y): (T, T)) -> Self {
        Site::new(x, y)
    }
}

impl<T> From<(T, T, T)> for Site<T>
where
    T: CoordType,
{
    fn from((x, y, z): (T, T, T)) -> Self {
        Site::with_z(x, y, z)
    }
}

impl<T> From<Site<T>> for Point<T>
where
    T: CoordType,
{
    fn from(s: Site<T>) -> Self {
        s.xy()
    }
}
