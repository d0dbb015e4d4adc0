//! Quad-edge mesh after Guibas and Stolfi.
//!
//! Edges live in an arena, four per bundle, stored contiguously:
//!
//! ```text
//!   4q + 0   e           (primal, org -> dest)
//!   4q + 1   e.rot       (dual, right face -> left face)
//!   4q + 2   e.sym       (primal, dest -> org)
//!   4q + 3   e.inv_rot   (dual, left face -> right face)
//! ```
//!
//! `rot`, `sym` and `inv_rot` are index arithmetic; only `onext` is stored.
//! Every other navigation operator is a composition of those three.

use crate::math::{CoordType, DelaunayMath};
use crate::site::Site;

/// Handle of one directed edge in a [`Mesh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeRef(usize);

impl EdgeRef {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }

    #[inline]
    pub fn rot(self) -> Self {
        EdgeRef((self.0 & !3) | ((self.0 + 1) & 3))
    }

    #[inline]
    pub fn sym(self) -> Self {
        EdgeRef(self.0 ^ 2)
    }

    /// `rot` applied three times, i.e. `rot.sym`.
    #[inline]
    pub fn inv_rot(self) -> Self {
        EdgeRef((self.0 & !3) | ((self.0 + 3) & 3))
    }

    /// Whether this edge belongs to the primal graph (even offset in the bundle).
    #[inline]
    pub fn is_primal(self) -> bool {
        self.0 & 1 == 0
    }

    #[inline]
    fn bundle(self) -> usize {
        self.0 >> 2
    }
}

#[derive(Debug, Clone)]
struct Record<T, D>
where
    T: CoordType,
{
    origin: Option<Site<T>>,
    onext: EdgeRef,
    tag: bool,
    data: D,
}

/// Arena of quad-edge bundles.
///
/// `D` is an arbitrary per-edge payload for the caller, default-initialized
/// whenever a bundle is created.
///
/// None of the editing operators check geometry. Calling them in an order
/// the predicates do not justify silently corrupts the mesh.
#[derive(Debug, Clone)]
pub struct Mesh<T, D = ()>
where
    T: CoordType,
{
    records: Vec<Record<T, D>>,
    live: Vec<bool>,
    free: Vec<usize>,
}

impl<T, D> DelaunayMath<T> for Mesh<T, D> where T: CoordType {}

impl<T, D> Default for Mesh<T, D>
where
    T: CoordType,
    D: Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, D> Mesh<T, D>
where
    T: CoordType,
    D: Default,
{
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Reserve room for `edges` bundles.
    pub fn with_capacity(edges: usize) -> Self {
        Self {
            records: Vec::with_capacity(edges * 4),
            live: Vec::with_capacity(edges),
            free: Vec::new(),
        }
    }

    /// Drop every edge.
    pub fn clear(&mut self) {
        self.records.clear();
        self.live.clear();
        self.free.clear();
    }

    /// Number of live bundles.
    pub fn edge_count(&self) -> usize {
        self.live.len() - self.free.len()
    }

    /// Allocate a new bundle and return its primal edge `org -> dest`.
    ///
    /// The primal edge and its symmetric are isolated self-loops around their
    /// origins; the two dual edges form the ring of the single face.
    pub fn make_edge(&mut self, org: Site<T>, dest: Site<T>) -> EdgeRef {
        let q = match self.free.pop() {
            Some(q) => q,
            None => {
                let q = self.live.len();
                self.live.push(false);
                for i in 0..4 {
                    self.records.push(Record {
                        origin: None,
                        onext: EdgeRef(4 * q + i),
                        tag: false,
                        data: D::default(),
                    });
                }
                q
            }
        };
        self.live[q] = true;

        let base = 4 * q;
        let rings = [base, base + 3, base + 2, base + 1];
        for (i, onext) in rings.iter().enumerate() {
            let record = &mut self.records[base + i];
            record.onext = EdgeRef(*onext);
            record.origin = None;
            record.tag = false;
            record.data = D::default();
        }
        self.records[base].origin = Some(org);
        self.records[base + 2].origin = Some(dest);

        EdgeRef(base)
    }

    /// Exchange the `onext` rings of `a` and `b` and, symmetrically, of their
    /// dual rings. Applying it twice restores the original topology.
    pub fn splice(&mut self, a: EdgeRef, b: EdgeRef) {
        let alpha = self.onext(a).rot();
        let beta = self.onext(b).rot();

        let t1 = self.onext(b);
        let t2 = self.onext(a);
        let t3 = self.onext(beta);
        let t4 = self.onext(alpha);

        self.records[a.0].onext = t1;
        self.records[b.0].onext = t2;
        self.records[alpha.0].onext = t3;
        self.records[beta.0].onext = t4;
    }

    /// Add an edge from `a.dest` to `b.org`, closing the left face of `a`.
    pub fn connect(&mut self, a: EdgeRef, b: EdgeRef) -> EdgeRef {
        let e = self.make_edge(self.dest(a), self.org(b));
        let a_next = self.lnext(a);
        self.splice(e, a_next);
        self.splice(e.sym(), b);
        e
    }

    /// Detach `e` from both of its origin rings and release its bundle.
    pub fn delete(&mut self, e: EdgeRef) {
        let e_prev = self.oprev(e);
        self.splice(e, e_prev);
        let sym_prev = self.oprev(e.sym());
        self.splice(e.sym(), sym_prev);

        let q = e.bundle();
        self.live[q] = false;
        for i in 0..4 {
            self.records[4 * q + i].origin = None;
        }
        self.free.push(q);
    }

    /// Turn `e` counter-clockwise inside the quadrilateral formed by its two
    /// adjacent triangles (Lawson flip).
    pub fn swap(&mut self, e: EdgeRef) {
        let a = self.oprev(e);
        let b = self.oprev(e.sym());

        self.splice(e, a);
        self.splice(e.sym(), b);
        let a_next = self.lnext(a);
        self.splice(e, a_next);
        let b_next = self.lnext(b);
        self.splice(e.sym(), b_next);

        let org = self.dest(a);
        let dest = self.dest(b);
        self.records[e.0].origin = Some(org);
        self.records[e.sym().0].origin = Some(dest);
        self.records[e.rot().0].origin = None;
        self.records[e.inv_rot().0].origin = None;
    }

    /// Split `e` at `site`: `e` becomes `org -> site` and the returned edge
    /// runs `site -> old dest`, taking over `e.sym`'s place in the ring of the
    /// old destination.
    pub fn split_edge(&mut self, e: EdgeRef, site: Site<T>) -> EdgeRef {
        let dest = self.dest(e);
        let tail = e.sym();
        let tail_prev = self.oprev(tail);
        let next = self.make_edge(site, dest);

        if tail_prev != tail {
            self.splice(tail, tail_prev);
            self.splice(next.sym(), tail_prev);
        }
        self.records[tail.0].origin = Some(site);
        self.splice(tail, next);

        next
    }
}

impl<T, D> Mesh<T, D>
where
    T: CoordType,
{
    pub fn is_live(&self, e: EdgeRef) -> bool {
        self.live.get(e.bundle()).copied().unwrap_or(false)
    }

    #[inline]
    pub fn onext(&self, e: EdgeRef) -> EdgeRef {
        self.records[e.0].onext
    }

    #[inline]
    pub fn oprev(&self, e: EdgeRef) -> EdgeRef {
        self.onext(e.rot()).rot()
    }

    #[inline]
    pub fn lnext(&self, e: EdgeRef) -> EdgeRef {
        self.onext(e.inv_rot()).rot()
    }

    #[inline]
    pub fn lprev(&self, e: EdgeRef) -> EdgeRef {
        self.onext(e).sym()
    }

    #[inline]
    pub fn rnext(&self, e: EdgeRef) -> EdgeRef {
        self.onext(e.rot()).inv_rot()
    }

    #[inline]
    pub fn rprev(&self, e: EdgeRef) -> EdgeRef {
        self.onext(e.sym())
    }

    #[inline]
    pub fn dnext(&self, e: EdgeRef) -> EdgeRef {
        self.onext(e.sym()).sym()
    }

    #[inline]
    pub fn dprev(&self, e: EdgeRef) -> EdgeRef {
        self.onext(e.inv_rot()).inv_rot()
    }

    /// Position attached to the origin of `e`, if any. Dual edges have none
    /// until a dual vertex is computed for them.
    #[inline]
    pub fn origin(&self, e: EdgeRef) -> Option<Site<T>> {
        self.records[e.0].origin
    }

    /// Origin of a primal edge.
    #[inline]
    pub fn org(&self, e: EdgeRef) -> Site<T> {
        self.records[e.0]
            .origin
            .expect("primal edges always carry their origin")
    }

    /// Destination of a primal edge.
    #[inline]
    pub fn dest(&self, e: EdgeRef) -> Site<T> {
        self.org(e.sym())
    }

    pub fn set_origin(&mut self, e: EdgeRef, site: Option<Site<T>>) {
        self.records[e.0].origin = site;
    }

    #[inline]
    pub fn tag(&self, e: EdgeRef) -> bool {
        self.records[e.0].tag
    }

    #[inline]
    pub fn set_tag(&mut self, e: EdgeRef, tag: bool) {
        self.records[e.0].tag = tag;
    }

    /// Set every tag to `tag`.
    pub fn reset_tags(&mut self, tag: bool) {
        for record in self.records.iter_mut() {
            record.tag = tag;
        }
    }

    /// Forget every dual vertex position.
    pub fn clear_dual(&mut self) {
        for record in self.records.iter_mut().skip(1).step_by(2) {
            record.origin = None;
        }
    }

    pub fn data(&self, e: EdgeRef) -> &D {
        &self.records[e.0].data
    }

    pub fn data_mut(&mut self, e: EdgeRef) -> &mut D {
        &mut self.records[e.0].data
    }

    /// `p` is strictly right of `e`.
    #[inline]
    pub fn right_of(&self, p: Site<T>, e: EdgeRef) -> bool {
        Self::right_of_segment(p, self.org(e), self.dest(e))
    }

    /// `p` is strictly left of `e`.
    #[inline]
    pub fn left_of(&self, p: Site<T>, e: EdgeRef) -> bool {
        Self::left_of_segment(p, self.org(e), self.dest(e))
    }

    /// One primal edge per live bundle.
    pub fn edges(&self) -> impl Iterator<Item = EdgeRef> + '_ {
        self.live
            .iter()
            .enumerate()
            .filter(|(_, live)| **live)
            .map(|(q, _)| EdgeRef(4 * q))
    }

    /// Both directions of every live primal edge.
    pub fn half_edges(&self) -> impl Iterator<Item = EdgeRef> + '_ {
        self.edges().flat_map(|e| [e, e.sym()])
    }

    /// The `onext` ring around the origin of `e`, starting at `e`.
    pub fn ring(&self, e: EdgeRef) -> Ring<'_, T, D> {
        Ring {
            mesh: self,
            start: e,
            next: Some(e),
        }
    }
}

/// Iterator over the edges sharing an origin, counter-clockwise.
pub struct Ring<'a, T, D>
where
    T: CoordType,
{
    mesh: &'a Mesh<T, D>,
    start: EdgeRef,
    next: Option<EdgeRef>,
}

impl<'a, T, D> Iterator for Ring<'a, T, D>
where
    T: CoordType,
{
    type Item = EdgeRef;

    fn next(&mut self) -> Option<EdgeRef> {
        let e = self.next?;
        let after = self.mesh.onext(e);
        self.next = if after == self.start {
            None
        } else {
            Some(after)
        };
        Some(e)
    }
}
