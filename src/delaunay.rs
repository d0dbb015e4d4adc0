/*!
Planar [Delaunay triangulation](https://en.wikipedia.org/wiki/Delaunay_triangulation)
on a quad-edge mesh, built by Guibas–Stolfi divide and conquer and kept
Delaunay under single-site insertion by Lawson flips.

# Example

```rust
use quadedge_delaunay::{Site, Triangulation};

let sites = vec![
    Site::new(0., 0.),
    Site::new(1., 0.),
    Site::new(1., 1.),
    Site::new(0., 1.),
];

let mut triangulation: Triangulation<f64> = Triangulation::new(&sites).unwrap();
assert_eq!(triangulation.triangle_count(), 2);

assert!(triangulation.insert_site(Site::new(0.5, 0.5), None, true));
assert_eq!(triangulation.triangle_count(), 4);
```
*/

use tracing::{debug, trace, warn};

use crate::math::{CoordType, DelaunayMath};
use crate::quadedge::{EdgeRef, Mesh};
use crate::site::Site;

/// A Delaunay triangulation and the sites it was built from.
///
/// The two hull handles are the traversal entry points: `left` is the
/// counter-clockwise hull edge out of the leftmost site (interior on its
/// left), `right` the clockwise hull edge out of the rightmost site (outer
/// face on its left).
///
/// The visited tag of the mesh is interpreted relative to `visited_tag`, so a
/// completed traversal does not need a clearing pass. The scheme is not
/// reentrant: a single traversal may be in flight at a time, which
/// [`Triangulation::faces`](crate::Triangulation::faces) enforces by
/// borrowing the triangulation mutably.
#[derive(Debug, Clone)]
pub struct Triangulation<T, D = ()>
where
    T: CoordType,
{
    pub(crate) sites: Vec<Site<T>>,
    pub(crate) mesh: Mesh<T, D>,
    pub(crate) left: EdgeRef,
    pub(crate) right: EdgeRef,
    pub(crate) degenerate: bool,
    pub(crate) visited_tag: bool,
    pub(crate) tags_dirty: bool,
    pub(crate) dual_cached: bool,
    pub(crate) next_face_id: u64,
}

impl<T, D> DelaunayMath<T> for Triangulation<T, D> where T: CoordType {}

impl<T, D> Triangulation<T, D>
where
    T: CoordType,
    D: Default,
{
    /// Triangulate `sites` after sorting them lexicographically.
    ///
    /// Returns `None` when fewer than two distinct finite sites remain.
    pub fn new(sites: &[Site<T>]) -> Option<Self> {
        Self::construct(sites, false)
    }

    /// Triangulate `sites` that the caller guarantees are already sorted
    /// lexicographically.
    pub fn from_sorted(sites: &[Site<T>]) -> Option<Self> {
        Self::construct(sites, true)
    }

    fn construct(sites: &[Site<T>], presorted: bool) -> Option<Self> {
        let mut sorted: Vec<Site<T>> = Vec::with_capacity(sites.len());
        for site in sites {
            if site.is_finite() {
                sorted.push(*site);
            } else {
                warn!(?site, "skipping non-finite site");
            }
        }
        if !presorted {
            Self::sort_sites(&mut sorted);
        }
        sorted.dedup_by(|a, b| a.same_position(b));

        if sorted.len() < 2 {
            debug!(count = sorted.len(), "not enough distinct sites to triangulate");
            return None;
        }

        let mut mesh = Mesh::with_capacity(3 * sorted.len());
        let (left, right) = Self::divide(&mut mesh, &sorted);

        let mut triangulation = Self {
            sites: sorted,
            mesh,
            left,
            right,
            degenerate: false,
            visited_tag: false,
            tags_dirty: false,
            dual_cached: false,
            next_face_id: 0,
        };
        let degenerate = triangulation.triangles().next().is_none();
        triangulation.degenerate = degenerate;

        debug!(
            sites = triangulation.sites.len(),
            edges = triangulation.mesh.edge_count(),
            degenerate = triangulation.degenerate,
            "triangulation built"
        );

        Some(triangulation)
    }

    /// Rebuild the mesh from the stored sites, discarding inserted topology
    /// and cached dual data. The result depends only on the site set.
    pub fn rebuild(&mut self) {
        self.mesh.clear();
        let (left, right) = Self::divide(&mut self.mesh, &self.sites);
        self.left = left;
        self.right = right;
        let degenerate = self.triangles().next().is_none();
        self.degenerate = degenerate;
        self.visited_tag = false;
        self.tags_dirty = false;
        self.dual_cached = false;
    }

    /// Recursive step: returns the counter-clockwise hull edge out of the
    /// leftmost site and the clockwise hull edge out of the rightmost site.
    fn divide(mesh: &mut Mesh<T, D>, s: &[Site<T>]) -> (EdgeRef, EdgeRef) {
        match s.len() {
            2 => {
                let a = mesh.make_edge(s[0], s[1]);
                (a, a.sym())
            }
            3 => {
                let a = mesh.make_edge(s[0], s[1]);
                let b = mesh.make_edge(s[1], s[2]);
                mesh.splice(a.sym(), b);

                if Self::ccw(s[0], s[1], s[2]) {
                    mesh.connect(b, a);
                    (a, b.sym())
                } else if Self::ccw(s[0], s[2], s[1]) {
                    let c = mesh.connect(b, a);
                    (c.sym(), c)
                } else {
                    // colinear: leave the open chain
                    (a, b.sym())
                }
            }
            n => {
                let (ldo, ldi) = Self::divide(mesh, &s[..n / 2]);
                let (rdi, rdo) = Self::divide(mesh, &s[n / 2..]);
                Self::merge(mesh, ldo, ldi, rdi, rdo)
            }
        }
    }

    fn merge(
        mesh: &mut Mesh<T, D>,
        mut ldo: EdgeRef,
        mut ldi: EdgeRef,
        mut rdi: EdgeRef,
        mut rdo: EdgeRef,
    ) -> (EdgeRef, EdgeRef) {
        // lower common tangent
        loop {
            if mesh.left_of(mesh.org(rdi), ldi) {
                ldi = mesh.lnext(ldi);
            } else if mesh.right_of(mesh.org(ldi), rdi) {
                rdi = mesh.rprev(rdi);
            } else {
                break;
            }
        }

        let mut basel = mesh.connect(rdi.sym(), ldi);
        if mesh.org(ldi) == mesh.org(ldo) {
            ldo = basel.sym();
        }
        if mesh.org(rdi) == mesh.org(rdo) {
            rdo = basel;
        }

        loop {
            // drop every left edge whose far end falls inside the new circle
            let mut lcand = mesh.onext(basel.sym());
            if Self::valid(mesh, lcand, basel) {
                while Self::in_circle(
                    mesh.dest(basel),
                    mesh.org(basel),
                    mesh.dest(lcand),
                    mesh.dest(mesh.onext(lcand)),
                ) {
                    let t = mesh.onext(lcand);
                    mesh.delete(lcand);
                    lcand = t;
                }
            }

            let mut rcand = mesh.oprev(basel);
            if Self::valid(mesh, rcand, basel) {
                while Self::in_circle(
                    mesh.dest(basel),
                    mesh.org(basel),
                    mesh.dest(rcand),
                    mesh.dest(mesh.oprev(rcand)),
                ) {
                    let t = mesh.oprev(rcand);
                    mesh.delete(rcand);
                    rcand = t;
                }
            }

            let left_valid = Self::valid(mesh, lcand, basel);
            let right_valid = Self::valid(mesh, rcand, basel);
            if !left_valid && !right_valid {
                // basel is the upper common tangent
                break;
            }

            basel = if !left_valid
                || (right_valid
                    && Self::in_circle(
                        mesh.dest(lcand),
                        mesh.org(lcand),
                        mesh.org(rcand),
                        mesh.dest(rcand),
                    )) {
                mesh.connect(rcand, basel.sym())
            } else {
                mesh.connect(basel.sym(), lcand.sym())
            };
        }

        trace!(edges = mesh.edge_count(), "merged halves");
        (ldo, rdo)
    }

    /// `e` can close a triangle above `basel`.
    #[inline]
    fn valid(mesh: &Mesh<T, D>, e: EdgeRef, basel: EdgeRef) -> bool {
        mesh.right_of(mesh.dest(e), basel)
    }

    /// Insert one site and restore the Delaunay property around it.
    ///
    /// Returns `false` without touching the mesh when `pos` coincides with an
    /// existing site, or lies outside the hull (checked up front when `safe`
    /// is set). A site within [`DEFAULT_EPSILON`](crate::DEFAULT_EPSILON) of
    /// an edge is moved onto that edge before it is stored. Without `safe`, `pos` must be inside the hull: the walk from
    /// `start` may not terminate otherwise.
    pub fn insert_site(&mut self, pos: Site<T>, start: Option<EdgeRef>, safe: bool) -> bool {
        if !pos.is_finite() {
            debug!(?pos, "rejecting non-finite site");
            return false;
        }
        if safe && !self.inside_convex_hull(pos) {
            debug!(?pos, "rejecting site outside the convex hull");
            return false;
        }

        let eps = Self::epsilon();
        let mut e = self.locate(pos, start, safe);
        if Self::near_equals(pos, self.mesh.org(e), eps)
            || Self::near_equals(pos, self.mesh.dest(e), eps)
        {
            debug!(?pos, "rejecting duplicate site");
            return false;
        }

        if self.on_edge(pos, e) {
            // within tolerance of the edge: put the site exactly on it
            let pos = Self::project_on_segment(pos, self.mesh.org(e), self.mesh.dest(e));
            if self.left_face_is_outer(e) {
                e = e.sym();
            }
            if self.left_face_is_outer(e) {
                // both sides open: a colinear chain
                self.split_edge(e, pos);
            } else if self.left_face_is_outer(e.sym()) {
                self.split_hull_edge(e, pos);
            } else {
                let t = self.mesh.oprev(e);
                self.mesh.delete(e);
                self.fan(t, pos);
            }
            self.add_site(pos);
        } else if self.left_face_is_outer(e) {
            debug!(?pos, "rejecting site located on the outer face");
            return false;
        } else {
            self.fan(e, pos);
            self.add_site(pos);
        }
        true
    }

    /// Insert every site with `safe` set; returns how many were accepted.
    pub fn insert_sites<I>(&mut self, sites: I) -> usize
    where
        I: IntoIterator<Item = Site<T>>,
    {
        sites
            .into_iter()
            .filter(|&site| self.insert_site(site, None, true))
            .count()
    }

    /// Connect `pos`, lying in the left face of `e`, to every corner of that
    /// face, then repair.
    fn fan(&mut self, mut e: EdgeRef, pos: Site<T>) {
        let mesh = &mut self.mesh;
        let mut base = mesh.make_edge(mesh.org(e), pos);
        mesh.splice(base, e);
        let start_spoke = base;
        loop {
            base = mesh.connect(e, base.sym());
            e = mesh.oprev(base);
            if mesh.lnext(e) == start_spoke {
                break;
            }
        }

        self.repair(e, start_spoke, pos);
    }

    /// Split hull edge `e` (interior on the left) at `pos` and join `pos` to
    /// the opposite corner of the interior triangle.
    fn split_hull_edge(&mut self, e: EdgeRef, pos: Site<T>) {
        let apex_edge = self.mesh.lprev(e);
        let tail = self.split_edge(e, pos);
        self.mesh.connect(e, apex_edge);

        self.repair(apex_edge, tail.sym(), pos);
    }

    /// Split `e` at `pos`, keeping the hull handles on the extreme sites.
    fn split_edge(&mut self, e: EdgeRef, pos: Site<T>) -> EdgeRef {
        let moved = e.sym();
        let tail = self.mesh.split_edge(e, pos);
        // `moved` now starts at `pos`; its old origin continues along `tail.sym`
        if self.left == moved {
            self.left = tail.sym();
        }
        if self.right == moved {
            self.right = tail.sym();
        }
        tail
    }

    /// Walk the edges facing `pos` and flip every one whose opposite corner
    /// lies inside the circle through `pos`, until the walk returns to
    /// `start_spoke`.
    fn repair(&mut self, mut e: EdgeRef, start_spoke: EdgeRef, pos: Site<T>) {
        let mesh = &mut self.mesh;
        let mut flips = 0usize;
        loop {
            let t = mesh.oprev(e);
            if mesh.right_of(mesh.dest(t), e)
                && Self::in_circle(mesh.org(e), mesh.dest(t), mesh.dest(e), pos)
            {
                mesh.swap(e);
                flips += 1;
                e = mesh.oprev(e);
            } else if mesh.onext(e) == start_spoke {
                break;
            } else {
                e = mesh.lprev(mesh.onext(e));
            }
        }
        trace!(flips, "repaired around inserted site");
    }

    fn add_site(&mut self, pos: Site<T>) {
        let at = self
            .sites
            .binary_search_by(|s| s.lex_cmp(&pos))
            .unwrap_or_else(|i| i);
        self.sites.insert(at, pos);
        let degenerate = self.degenerate && self.triangles().next().is_none();
        self.degenerate = degenerate;

        // new edges carry a stale tag and every flip invalidates dual vertices
        self.tags_dirty = true;
        if self.dual_cached {
            self.mesh.clear_dual();
            self.dual_cached = false;
        }
    }
}

impl<T, D> Triangulation<T, D>
where
    T: CoordType,
{
    pub fn sites(&self) -> &[Site<T>] {
        &self.sites
    }

    pub fn mesh(&self) -> &Mesh<T, D> {
        &self.mesh
    }

    /// Mutable access to the per-edge payloads.
    pub fn data_mut(&mut self, e: EdgeRef) -> &mut D {
        self.mesh.data_mut(e)
    }

    /// Counter-clockwise hull edge out of the leftmost site.
    pub fn left_edge(&self) -> EdgeRef {
        self.left
    }

    /// Clockwise hull edge out of the rightmost site.
    pub fn right_edge(&self) -> EdgeRef {
        self.right
    }

    /// No triangle exists: every site lies on one line.
    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    /// Hull edges in counter-clockwise order, each with the interior on its
    /// left. A colinear chain is walked out and back.
    pub fn hull(&self) -> Vec<EdgeRef> {
        let mut hull = Vec::new();
        let mut e = self.left;
        loop {
            hull.push(e);
            e = self.mesh.rprev(e);
            if e == self.left {
                break;
            }
        }
        hull
    }

    /// Hull sites in counter-clockwise order.
    pub fn hull_sites(&self) -> Vec<Site<T>> {
        self.hull().into_iter().map(|e| self.mesh.org(e)).collect()
    }

    /// Every undirected primal edge as a pair of sites.
    pub fn edges(&self) -> impl Iterator<Item = (Site<T>, Site<T>)> + '_ {
        self.mesh
            .edges()
            .map(move |e| (self.mesh.org(e), self.mesh.dest(e)))
    }

    /// Lazily yields each triangle once, counter-clockwise.
    pub fn triangles(&self) -> impl Iterator<Item = [Site<T>; 3]> + '_ {
        let mesh = &self.mesh;
        mesh.half_edges().filter_map(move |e| {
            let next = mesh.lnext(e);
            let prev = mesh.lnext(next);
            if mesh.lnext(prev) != e || e > next || e > prev {
                return None;
            }
            let (a, b, c) = (mesh.org(e), mesh.org(next), mesh.org(prev));
            if Self::ccw(a, b, c) {
                Some([a, b, c])
            } else {
                None
            }
        })
    }

    /// The triangles as one flat sequence, three sites per triangle.
    pub fn triangle_sites(&self) -> impl Iterator<Item = Site<T>> + '_ {
        self.triangles().flatten()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles().count()
    }

    /// Brute-force check that no site lies inside any triangle's circumcircle.
    pub fn is_delaunay(&self) -> bool {
        self.triangles().all(|[a, b, c]| {
            self.sites.iter().all(|&p| {
                p.same_position(&a)
                    || p.same_position(&b)
                    || p.same_position(&c)
                    || !Self::in_circle(a, b, c, p)
            })
        })
    }

    /// The left face of `e` is the unbounded face (or `e` borders no
    /// triangle at all).
    pub(crate) fn left_face_is_outer(&self, e: EdgeRef) -> bool {
        let next = self.mesh.lnext(e);
        let prev = self.mesh.lnext(next);
        self.mesh.lnext(prev) != e
            || !Self::ccw(self.mesh.org(e), self.mesh.dest(e), self.mesh.dest(next))
    }

    fn on_edge(&self, pos: Site<T>, e: EdgeRef) -> bool {
        Self::on_segment(pos, self.mesh.org(e), self.mesh.dest(e), Self::epsilon())
    }

    /// `pos` is inside or on the convex hull.
    pub fn inside_convex_hull(&self, pos: Site<T>) -> bool {
        if self.degenerate {
            let eps = Self::epsilon();
            return self
                .mesh
                .edges()
                .any(|e| Self::on_segment(pos, self.mesh.org(e), self.mesh.dest(e), eps));
        }
        self.hull().into_iter().all(|e| !self.mesh.right_of(pos, e))
    }

    /// The hull edge nearest to `pos` among those that see it on their outer
    /// side, or `None` when `pos` is inside the hull.
    pub fn closest_bounding_edge(&self, pos: Site<T>) -> Option<EdgeRef> {
        let mut best: Option<(EdgeRef, T)> = None;
        for e in self.hull() {
            if !self.mesh.right_of(pos, e) {
                continue;
            }
            let d = Self::segment_dist2(pos, self.mesh.org(e), self.mesh.dest(e));
            if best.map_or(true, |(_, min)| d < min) {
                best = Some((e, d));
            }
        }
        best.map(|(e, _)| e)
    }

    /// Walk from `start` (default: the right hull edge) towards `pos`.
    ///
    /// On return, `pos` is an endpoint of the edge, lies on it, or lies in its
    /// left face. With `safe` set, a point outside the hull returns the
    /// nearest hull edge instead; without it, such a point may never be
    /// reached.
    pub fn locate(&self, pos: Site<T>, start: Option<EdgeRef>, safe: bool) -> EdgeRef {
        if safe {
            if let Some(edge) = self.closest_bounding_edge(pos) {
                return edge;
            }
        }
        if self.degenerate {
            return self.locate_on_chain(pos);
        }

        let mesh = &self.mesh;
        let eps = Self::epsilon();
        let mut e = start
            .filter(|e| e.is_primal() && mesh.is_live(*e))
            .unwrap_or(self.right);
        loop {
            if Self::near_equals(pos, mesh.org(e), eps) || Self::near_equals(pos, mesh.dest(e), eps)
            {
                return e;
            } else if mesh.right_of(pos, e) {
                e = e.sym();
            } else if mesh.left_of(pos, mesh.onext(e)) {
                e = mesh.onext(e);
            } else if mesh.left_of(pos, mesh.dprev(e)) {
                e = mesh.dprev(e);
            } else {
                break;
            }
        }

        if !self.on_edge(pos, e) {
            let prev = mesh.lprev(e);
            let next = mesh.lnext(e);
            if self.on_edge(pos, prev) {
                return prev;
            } else if self.on_edge(pos, next) {
                return next;
            }
        }
        e
    }

    fn locate_on_chain(&self, pos: Site<T>) -> EdgeRef {
        let eps = Self::epsilon();
        let mesh = &self.mesh;
        mesh.edges()
            .find(|&e| {
                Self::near_equals(pos, mesh.org(e), eps)
                    || Self::near_equals(pos, mesh.dest(e), eps)
            })
            .or_else(|| mesh.edges().find(|&e| self.on_edge(pos, e)))
            .unwrap_or(self.left)
    }
}
