pub use delaunay::Triangulation;
pub use dual::{CenterKind, DualConfig, Face, Faces};
pub use error::{Error, Result};
use geo_types::Point;
pub use math::{CoordType, DelaunayMath, Predicates, DEFAULT_EPSILON};
pub use quadedge::{EdgeRef, Mesh, Ring};
pub use site::Site;

mod delaunay;
mod dual;
mod error;
mod math;
mod quadedge;
mod site;

/// Triangulate planar points. `None` when fewer than two distinct points are
/// given.
pub fn triangulate<T>(points: &[Point<T>]) -> Option<Triangulation<T>>
where
    T: CoordType,
{
    let sites: Vec<Site<T>> = points.iter().map(|&p| Site::from(p)).collect();
    Triangulation::new(&sites)
}
