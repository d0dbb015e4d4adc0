//! Dual diagrams of a triangulation: Voronoi cells and their variants.
//!
//! One dual vertex is computed per triangle and cached on the dual edges
//! leaving that triangle, so each triangle is evaluated once no matter how
//! many cells share it. Hull edges get their own vertex "at infinity",
//! `radius` away from the triangle next to them, perpendicular to the edge.

use std::collections::VecDeque;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::delaunay::Triangulation;
use crate::error::{Error, Result};
use crate::math::{CoordType, DelaunayMath, Predicates};
use crate::quadedge::EdgeRef;
use crate::site::Site;

/// How the dual vertex of a triangle is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CenterKind {
    /// Circumcenter: the Voronoi diagram.
    #[default]
    Voronoi,
    Centroid,
    InCenter,
    /// A uniformly distributed point inside the triangle.
    RandomUniform,
    /// A point from random barycentric weights.
    RandomNonUniform,
}

impl CenterKind {
    pub fn center<T, R>(self, a: Site<T>, b: Site<T>, c: Site<T>, rng: &mut R) -> Site<T>
    where
        T: CoordType,
        R: Rng,
    {
        match self {
            CenterKind::Voronoi => Predicates::circumcenter(a, b, c),
            CenterKind::Centroid => Predicates::centroid(a, b, c),
            CenterKind::InCenter => Predicates::incenter(a, b, c),
            CenterKind::RandomUniform => Predicates::random_uniform(a, b, c, rng),
            CenterKind::RandomNonUniform => Predicates::random_non_uniform(a, b, c, rng),
        }
    }
}

impl FromStr for CenterKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "voronoi" | "circumcenter" => Ok(CenterKind::Voronoi),
            "centroid" => Ok(CenterKind::Centroid),
            "incenter" => Ok(CenterKind::InCenter),
            "random-uniform" => Ok(CenterKind::RandomUniform),
            "random-non-uniform" => Ok(CenterKind::RandomNonUniform),
            _ => Err(Error::UnknownCenter { name: s.to_owned() }),
        }
    }
}

/// Settings of one dual extraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DualConfig<T>
where
    T: CoordType,
{
    pub center: CenterKind,
    /// Distance of the vertices at infinity from their anchor.
    pub radius: T,
    /// Seed of the random center calculators.
    pub seed: u64,
}

impl<T> DualConfig<T>
where
    T: CoordType,
{
    pub fn new(center: CenterKind, radius: T) -> Result<Self> {
        if !radius.is_finite() || radius <= T::zero() {
            return Err(Error::InvalidRadius {
                radius: radius.to_f64().unwrap_or(f64::NAN),
            });
        }
        Ok(Self {
            center,
            radius,
            seed: 0,
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl<T> Default for DualConfig<T>
where
    T: CoordType,
{
    fn default() -> Self {
        Self {
            center: CenterKind::Voronoi,
            radius: T::one(),
            seed: 0,
        }
    }
}

/// The dual region of one site.
#[derive(Debug, Clone, PartialEq)]
pub struct Face<T>
where
    T: CoordType,
{
    /// Unique within the triangulation that produced it, increasing.
    pub id: u64,
    /// A primal edge whose origin is `center`. Stale once the mesh changes.
    pub edge: EdgeRef,
    pub center: Site<T>,
    /// Dual vertices around `center`, counter-clockwise.
    pub boundary: Vec<Site<T>>,
    /// The site is on the convex hull.
    pub on_bounds: bool,
    /// `boundary` contains at least one vertex at infinity.
    pub reconstructed: bool,
}

impl<T, D> Triangulation<T, D>
where
    T: CoordType,
{
    /// Start a lazy walk over the dual faces, hull sites first.
    ///
    /// Dual vertices are cached on the mesh and reused by later walks. Run
    /// [`clear_dual`](Self::clear_dual) before walking again with another
    /// center calculator or radius.
    pub fn faces(&mut self, config: &DualConfig<T>) -> Faces<'_, T, D> {
        if self.tags_dirty {
            self.mesh.reset_tags(self.visited_tag);
            self.tags_dirty = false;
        }
        self.dual_cached = true;

        let hull = self.hull();
        let mut faces = Faces {
            target: !self.visited_tag,
            triangulation: self,
            center: config.center,
            radius: config.radius,
            rng: StdRng::seed_from_u64(config.seed),
            hull: hull.clone().into_iter(),
            queue: VecDeque::new(),
            finished: false,
        };
        for e in hull {
            faces.infinity(e.sym());
        }
        faces
    }

    /// Forget every cached dual vertex.
    pub fn clear_dual(&mut self) {
        self.mesh.clear_dual();
        self.dual_cached = false;
    }
}

/// Lazy iterator over the dual faces of a triangulation.
///
/// Dropping it before the end leaves the visited tags half-set; the next
/// walk resets them first.
pub struct Faces<'a, T, D>
where
    T: CoordType,
{
    triangulation: &'a mut Triangulation<T, D>,
    center: CenterKind,
    radius: T,
    rng: StdRng,
    target: bool,
    hull: std::vec::IntoIter<EdgeRef>,
    queue: VecDeque<EdgeRef>,
    finished: bool,
}

impl<'a, T, D> DelaunayMath<T> for Faces<'a, T, D> where T: CoordType {}

impl<'a, T, D> Faces<'a, T, D>
where
    T: CoordType,
{
    fn visited(&self, e: EdgeRef) -> bool {
        self.triangulation.mesh.tag(e) == self.target
    }

    /// Dual vertex of the triangle left of `e`, computed on first use and
    /// shared with the other two edges of the triangle.
    fn face_center(&mut self, e: EdgeRef) -> Site<T> {
        let slot = e.inv_rot();
        let mesh = &mut self.triangulation.mesh;
        if let Some(center) = mesh.origin(slot) {
            return center;
        }

        let (a, b) = (mesh.org(e), mesh.dest(e));
        let c = mesh.dest(mesh.lnext(e));
        let center = self.center.center(a, b, c, &mut self.rng);

        let mut r = slot;
        loop {
            mesh.set_origin(r, Some(center));
            r = mesh.onext(r);
            if r == slot {
                break;
            }
        }
        center
    }

    /// Vertex at infinity beyond hull edge `e`, whose left face is the outer
    /// face.
    fn infinity(&mut self, e: EdgeRef) -> Site<T> {
        let slot = e.inv_rot();
        if let Some(far) = self.triangulation.mesh.origin(slot) {
            return far;
        }

        let inner = e.sym();
        let anchor = if self.triangulation.left_face_is_outer(inner) {
            let mesh = &self.triangulation.mesh;
            Self::midpoint(mesh.org(e), mesh.dest(e))
        } else {
            self.face_center(inner)
        };

        let mesh = &mut self.triangulation.mesh;
        let (org, dest) = (mesh.org(e), mesh.dest(e));
        let (dx, dy) = (dest.x - org.x, dest.y - org.y);
        let len = (dx * dx + dy * dy).sqrt();
        let (mut nx, mut ny) = (-dy / len, dx / len);
        if !mesh.left_of(Site::new(org.x + nx, org.y + ny), e) {
            nx = -nx;
            ny = -ny;
        }

        let far = Site::with_z(
            anchor.x + nx * self.radius,
            anchor.y + ny * self.radius,
            anchor.z,
        );
        mesh.set_origin(slot, Some(far));
        far
    }

    /// Mark the ring around the origin of `start`, collect its dual
    /// boundary and queue the neighbors not yet seen.
    fn visit(&mut self, start: EdgeRef) -> Face<T> {
        let ring: Vec<EdgeRef> = self.triangulation.mesh.ring(start).collect();
        for &e in &ring {
            self.triangulation.mesh.set_tag(e, self.target);
        }

        let mut boundary = Vec::with_capacity(ring.len() + 1);
        let mut reconstructed = false;
        for &e in &ring {
            if self.triangulation.left_face_is_outer(e) {
                reconstructed = true;
                let next = self.triangulation.mesh.onext(e);
                boundary.push(self.infinity(e));
                boundary.push(self.infinity(next.sym()));
            } else {
                boundary.push(self.face_center(e));
            }
            if !self.visited(e.sym()) {
                self.queue.push_back(e.sym());
            }
        }

        let id = self.triangulation.next_face_id;
        self.triangulation.next_face_id += 1;

        Face {
            id,
            edge: start,
            center: self.triangulation.mesh.org(start),
            boundary,
            on_bounds: reconstructed,
            reconstructed,
        }
    }
}

impl<'a, T, D> Iterator for Faces<'a, T, D>
where
    T: CoordType,
{
    type Item = Face<T>;

    fn next(&mut self) -> Option<Face<T>> {
        if self.finished {
            return None;
        }
        while let Some(e) = self.hull.next() {
            if !self.visited(e) {
                return Some(self.visit(e));
            }
        }
        while let Some(e) = self.queue.pop_front() {
            if !self.visited(e) {
                return Some(self.visit(e));
            }
        }

        self.finished = true;
        self.triangulation.visited_tag = self.target;
        debug!(
            next_id = self.triangulation.next_face_id,
            "dual traversal complete"
        );
        None
    }
}

impl<'a, T, D> Drop for Faces<'a, T, D>
where
    T: CoordType,
{
    fn drop(&mut self) {
        if !self.finished {
            self.triangulation.tags_dirty = true;
        }
    }
}
