use approx::AbsDiffEq;
use geo_types::CoordFloat;
use num_traits::cast;
use rand::Rng;

use crate::site::Site;

/// Default tolerance of the degeneracy tests.
pub const DEFAULT_EPSILON: f64 = 1e-7;

pub trait CoordType: CoordFloat + AbsDiffEq<Epsilon = Self> + Into<f64> {}

/// Geometric predicates and center calculators.
///
/// Orientation and in-circle signs are exact, through the adaptive
/// predicates of `robust`. The center formulas are expressed relative to one
/// of the triangle's vertices to keep the rounding error bounded by the
/// triangle's size, not its position.
pub trait DelaunayMath<T>
where
    T: CoordType,
{
    #[inline]
    fn epsilon() -> T {
        lit(DEFAULT_EPSILON)
    }

    /// Twice the signed area of `(a, b, c)`; positive when counter-clockwise.
    /// The sign is exact; the magnitude is rounded to `T`.
    #[inline]
    fn orient(a: Site<T>, b: Site<T>, c: Site<T>) -> T {
        lit(robust::orient2d(exact(a), exact(b), exact(c)))
    }

    #[inline]
    fn ccw(a: Site<T>, b: Site<T>, c: Site<T>) -> bool {
        robust::orient2d(exact(a), exact(b), exact(c)) > 0.0
    }

    /// `p` is strictly right of the directed segment `org -> dest`.
    #[inline]
    fn right_of_segment(p: Site<T>, org: Site<T>, dest: Site<T>) -> bool {
        Self::ccw(p, dest, org)
    }

    /// `p` is strictly left of the directed segment `org -> dest`.
    #[inline]
    fn left_of_segment(p: Site<T>, org: Site<T>, dest: Site<T>) -> bool {
        Self::ccw(p, org, dest)
    }

    /// `p` lies strictly inside the circumcircle of `(a, b, c)`.
    /// Points on the circle are outside.
    #[inline]
    fn in_circle(a: Site<T>, b: Site<T>, c: Site<T>, p: Site<T>) -> bool {
        robust::incircle(exact(a), exact(b), exact(c), exact(p)) > 0.0
    }

    /// Planar circumcenter, solved relative to `a`. Colinear input falls
    /// back to the centroid.
    fn circumcenter(a: Site<T>, b: Site<T>, c: Site<T>) -> Site<T> {
        let area2 = Self::orient(a, b, c);
        if area2.is_zero() {
            return Self::centroid(a, b, c);
        }

        let ab = b.xy() - a.xy();
        let ac = c.xy() - a.xy();
        let (ab2, ac2) = (ab.dot(ab), ac.dot(ac));
        let scale = lit::<T>(0.5) / area2;
        let three: T = lit(3.0);

        Site::with_z(
            a.x + (ac.y() * ab2 - ab.y() * ac2) * scale,
            a.y + (ab.x() * ac2 - ac.x() * ab2) * scale,
            (a.z + b.z + c.z) / three,
        )
    }

    /// Circumcenter of the triangle in space, using `z`.
    fn circumcenter_3d(a: Site<T>, b: Site<T>, c: Site<T>) -> Site<T> {
        let ab = [b.x - a.x, b.y - a.y, b.z - a.z];
        let ac = [c.x - a.x, c.y - a.y, c.z - a.z];
        let n = cross(ab, ac);
        let nn = dot(n, n);
        if nn.is_zero() {
            return Self::centroid(a, b, c);
        }

        let u = cross(n, ab);
        let v = cross(ac, n);
        let ab2 = dot(ab, ab);
        let ac2 = dot(ac, ac);
        let denom = (T::one() + T::one()) * nn;

        Site::with_z(
            a.x + (ac2 * u[0] + ab2 * v[0]) / denom,
            a.y + (ac2 * u[1] + ab2 * v[1]) / denom,
            a.z + (ac2 * u[2] + ab2 * v[2]) / denom,
        )
    }

    fn centroid(a: Site<T>, b: Site<T>, c: Site<T>) -> Site<T> {
        let three: T = lit(3.0);
        Site::with_z(
            a.x + (b.x - a.x + c.x - a.x) / three,
            a.y + (b.y - a.y + c.y - a.y) / three,
            a.z + (b.z - a.z + c.z - a.z) / three,
        )
    }

    /// Center of the inscribed circle: vertices weighted by the length of the
    /// opposite side.
    fn incenter(a: Site<T>, b: Site<T>, c: Site<T>) -> Site<T> {
        let la = Self::dist2(b, c).sqrt();
        let lb = Self::dist2(c, a).sqrt();
        let lc = Self::dist2(a, b).sqrt();
        let sum = la + lb + lc;
        if sum.is_zero() {
            return a;
        }

        Self::weighted(a, b, c, lb / sum, lc / sum)
    }

    /// Uniformly distributed random point inside the triangle.
    fn random_uniform<R: Rng>(a: Site<T>, b: Site<T>, c: Site<T>, rng: &mut R) -> Site<T> {
        let mut r1: f64 = rng.gen();
        let mut r2: f64 = rng.gen();
        // fold the far half of the parallelogram back into the triangle
        if r1 + r2 > 1.0 {
            r1 = 1.0 - r1;
            r2 = 1.0 - r2;
        }

        Self::weighted(a, b, c, lit(r1), lit(r2))
    }

    /// Random point from independently drawn barycentric weights; biased
    /// towards the centroid.
    fn random_non_uniform<R: Rng>(a: Site<T>, b: Site<T>, c: Site<T>, rng: &mut R) -> Site<T> {
        let w: [f64; 3] = [rng.gen(), rng.gen(), rng.gen()];
        let sum = w[0] + w[1] + w[2];
        if sum <= 0.0 {
            return Self::centroid(a, b, c);
        }

        Self::weighted(
            a,
            b,
            c,
            lit(w[1] / sum),
            lit(w[2] / sum),
        )
    }

    /// `a + wb * (b - a) + wc * (c - a)`, on all three coordinates.
    #[inline]
    fn weighted(a: Site<T>, b: Site<T>, c: Site<T>, wb: T, wc: T) -> Site<T> {
        Site::with_z(
            a.x + wb * (b.x - a.x) + wc * (c.x - a.x),
            a.y + wb * (b.y - a.y) + wc * (c.y - a.y),
            a.z + wb * (b.z - a.z) + wc * (c.z - a.z),
        )
    }

    #[inline]
    fn midpoint(a: Site<T>, b: Site<T>) -> Site<T> {
        let two = T::one() + T::one();
        Site::with_z(
            a.x + (b.x - a.x) / two,
            a.y + (b.y - a.y) / two,
            a.z + (b.z - a.z) / two,
        )
    }

    /// `c` is within `eps` of the line through `a` and `b`.
    #[inline]
    fn almost_colinear(a: Site<T>, b: Site<T>, c: Site<T>, eps: T) -> bool {
        let area2 = Self::orient(a, b, c);
        area2 * area2 <= eps * eps * Self::dist2(a, b)
    }

    #[inline]
    fn near_equals(a: Site<T>, b: Site<T>, eps: T) -> bool {
        a.x.abs_diff_eq(&b.x, eps) && a.y.abs_diff_eq(&b.y, eps)
    }

    #[inline(always)]
    fn dist2(p0: Site<T>, p: Site<T>) -> T {
        let d = p0.xy() - p.xy();
        d.dot(d)
    }

    /// The point of the closed segment `a..b` nearest to `p`, keeping `p.z`.
    fn project_on_segment(p: Site<T>, a: Site<T>, b: Site<T>) -> Site<T> {
        let ab = b.xy() - a.xy();
        let len2 = ab.dot(ab);
        if len2.is_zero() {
            return Site::with_z(a.x, a.y, p.z);
        }
        let t = ((p.xy() - a.xy()).dot(ab) / len2)
            .max(T::zero())
            .min(T::one());
        Site::with_z(a.x + ab.x() * t, a.y + ab.y() * t, p.z)
    }

    /// Squared distance from `p` to the closed segment `a..b`.
    #[inline]
    fn segment_dist2(p: Site<T>, a: Site<T>, b: Site<T>) -> T {
        Self::dist2(p, Self::project_on_segment(p, a, b))
    }

    /// `p` is within distance `eps` of the segment `a..b`.
    #[inline]
    fn on_segment(p: Site<T>, a: Site<T>, b: Site<T>, eps: T) -> bool {
        Self::segment_dist2(p, a, b) <= eps * eps
    }

    #[inline]
    fn sort_sites(sites: &mut [Site<T>]) {
        sites.sort_unstable_by(|a, b| a.lex_cmp(b));
    }
}

#[inline]
fn exact<T: CoordType>(s: Site<T>) -> robust::Coord<f64> {
    robust::Coord {
        x: s.x.into(),
        y: s.y.into(),
    }
}

/// `v` in the coordinate type; NaN if it does not fit.
#[inline]
fn lit<T: CoordType>(v: f64) -> T {
    cast(v).unwrap_or_else(T::nan)
}

#[inline]
fn cross<T: CoordType>(a: [T; 3], b: [T; 3]) -> [T; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
fn dot<T: CoordType>(a: [T; 3], b: [T; 3]) -> T {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Stateless handle for calling the predicates directly.
///
/// ```
/// use quadedge_delaunay::{DelaunayMath, Predicates, Site};
///
/// let a = Site::new(0.0, 0.0);
/// let b = Site::new(1.0, 0.0);
/// let c = Site::new(0.0, 1.0);
/// assert!(Predicates::ccw(a, b, c));
/// assert!(Predicates::in_circle(a, b, c, Site::new(0.5, 0.5 - 1e-3)));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Predicates;

impl<T> DelaunayMath<T> for Predicates where T: CoordType {}

impl CoordType for f64 {}
impl CoordType for f32 {}
