use std::fs::File;

use quadedge_delaunay::{
    CoordType, DelaunayMath, Predicates, Site, Triangulation, DEFAULT_EPSILON,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

pub fn site<T>(x: f64, y: f64) -> Site<T>
where
    T: CoordType,
{
    Site::new(T::from(x).unwrap(), T::from(y).unwrap())
}

pub fn build<T>(sites: &[Site<T>]) -> Triangulation<T>
where
    T: CoordType,
{
    Triangulation::new(sites).expect("at least two distinct sites")
}

fn to_f64<T>(s: &Site<T>) -> (f64, f64)
where
    T: CoordType,
{
    (s.x.to_f64().unwrap(), s.y.to_f64().unwrap())
}

/// Structural checks valid for any triangulation: triangles cover the hull
/// exactly, are counter-clockwise and obey Euler's formula.
pub fn validate<T>(triangulation: &Triangulation<T>)
where
    T: CoordType,
{
    let hull = triangulation.hull_sites();
    let hull_area = {
        let mut hull_areas = Vec::new();
        let mut j = hull.len() - 1;
        for i in 0..hull.len() {
            let (x0, y0) = to_f64(&hull[j]);
            let (x, y) = to_f64(&hull[i]);
            hull_areas.push((x - x0) * (y + y0));
            j = i;
        }
        -sum(&hull_areas) / 2.0
    };

    let mut triangle_areas = Vec::new();
    for [a, b, c] in triangulation.triangles() {
        assert!(Predicates::ccw(a, b, c), "Triangle is not counter-clockwise");
        let (ax, ay) = to_f64(&a);
        let (bx, by) = to_f64(&b);
        let (cx, cy) = to_f64(&c);
        triangle_areas.push(((bx - ax) * (cy - ay) - (by - ay) * (cx - ax)) / 2.0);
    }
    let triangles_area = sum(&triangle_areas);

    let err = ((hull_area - triangles_area) / hull_area).abs();
    if err > 1e-9 {
        panic!("Triangulation is broken: {} error", err);
    }

    let n = triangulation.sites().len();
    assert_eq!(
        triangulation.triangle_count(),
        2 * n - 2 - hull.len(),
        "Triangle count does not match Euler's formula"
    );
}

pub fn load_fixture<T>(path: &str) -> Vec<Site<T>>
where
    T: CoordType,
{
    let file = File::open(path).unwrap();
    let u: Vec<(f64, f64)> = serde_json::from_reader(file).unwrap();
    u.iter().map(|p| site(p.0, p.1)).collect()
}

pub fn random_sites<T>(count: usize, seed: u64) -> Vec<Site<T>>
where
    T: CoordType,
{
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| site(rng.gen::<f64>(), rng.gen::<f64>()))
        .collect()
}

pub fn square<T>() -> Vec<Site<T>>
where
    T: CoordType,
{
    vec![site(0., 0.), site(1., 0.), site(1., 1.), site(0., 1.)]
}

pub fn basic<T>()
where
    T: CoordType,
{
    let sites = load_fixture::<T>("tests/fixtures/basic.json");
    let triangulation = build(&sites);
    assert_eq!(triangulation.sites().len(), sites.len());
    validate(&triangulation);
}

pub fn single_triangle<T>()
where
    T: CoordType,
{
    let triangulation = build::<T>(&[site(0., 0.), site(1., 0.), site(0., 1.)]);

    assert_eq!(triangulation.triangle_count(), 1);
    assert_eq!(triangulation.hull_sites().len(), 3);
    assert_eq!(triangulation.triangle_sites().count(), 3);
    assert!(triangulation.inside_convex_hull(site(0.1, 0.1)));
    assert!(!triangulation.inside_convex_hull(site(2., 2.)));
    validate(&triangulation);
}

pub fn square_has_one_diagonal<T>()
where
    T: CoordType,
{
    let triangulation = build::<T>(&square());

    assert_eq!(triangulation.triangle_count(), 2);
    assert_eq!(triangulation.edges().count(), 5);

    let is_edge = |p: Site<T>, q: Site<T>| {
        triangulation
            .edges()
            .any(|(a, b)| (a == p && b == q) || (a == q && b == p))
    };
    let main = is_edge(site(0., 0.), site(1., 1.));
    let anti = is_edge(site(1., 0.), site(0., 1.));
    assert!(main != anti, "Expected exactly one diagonal");
    validate(&triangulation);
}

pub fn square_insert_center<T>()
where
    T: CoordType,
{
    let mut triangulation = build::<T>(&square());
    let center = site(0.5, 0.5);

    assert!(triangulation.insert_site(center, None, true));
    assert_eq!(triangulation.triangle_count(), 4);
    assert!(triangulation
        .triangles()
        .all(|t| t.iter().any(|s| s.same_position(&center))));
    validate(&triangulation);
}

pub fn insert_on_hull_edge<T>()
where
    T: CoordType,
{
    let mut triangulation = build::<T>(&square());

    assert!(triangulation.insert_site(site(0.5, 0.), None, true));
    assert_eq!(triangulation.triangle_count(), 3);
    assert_eq!(triangulation.hull_sites().len(), 5);
    assert!(triangulation.is_delaunay());
    validate(&triangulation);
}

pub fn insert_near_hull_edge<T>()
where
    T: CoordType,
{
    let mut triangulation = build::<T>(&square());

    assert!(triangulation.insert_site(site(0.5, 1e-8), None, true));
    assert_eq!(triangulation.triangle_count(), 3);
    assert_eq!(triangulation.hull_sites().len(), 5);
    assert!(triangulation.sites().contains(&site(0.5, 0.)));
    assert!(triangulation.is_delaunay());
    validate(&triangulation);
}

pub fn hull_handles_follow_insertion<T>()
where
    T: CoordType,
{
    let mut triangulation = build::<T>(&square());

    for p in [site(1., 0.5), site(0., 0.5), site(0.5, 1.), site(0.5, 0.)] {
        assert!(triangulation.insert_site(p, None, true));
        let mesh = triangulation.mesh();
        let sites = triangulation.sites();
        assert_eq!(mesh.org(triangulation.left_edge()), sites[0]);
        assert_eq!(mesh.org(triangulation.right_edge()), sites[sites.len() - 1]);
    }
    assert_eq!(triangulation.hull_sites().len(), 8);
    validate(&triangulation);
}

pub fn chain_handles_follow_insertion<T>()
where
    T: CoordType,
{
    let orders = [
        [site::<T>(1.5, 0.), site(0.5, 0.)],
        [site(0.5, 0.), site(1.5, 0.)],
    ];
    for order in orders {
        let mut triangulation = build::<T>(&[site(0., 0.), site(2., 0.)]);
        for p in order {
            assert!(triangulation.insert_site(p, None, true));
        }
        let mesh = triangulation.mesh();
        let (left, right) = (triangulation.left_edge(), triangulation.right_edge());
        assert_eq!(mesh.org(left), site(0., 0.));
        assert_eq!(mesh.dest(left), site(0.5, 0.));
        assert_eq!(mesh.org(right), site(2., 0.));
        assert_eq!(mesh.dest(right), site(1.5, 0.));

        let mut triangulation = build::<T>(&[site(0., 0.), site(1., 0.), site(2., 0.)]);
        for p in order {
            assert!(triangulation.insert_site(p, None, true));
        }
        let mesh = triangulation.mesh();
        assert_eq!(mesh.org(triangulation.left_edge()), site(0., 0.));
        assert_eq!(mesh.org(triangulation.right_edge()), site(2., 0.));
        assert_eq!(triangulation.hull().len(), 8);
        assert!(triangulation.is_degenerate());
    }
}

pub fn bad_input<T>()
where
    T: CoordType,
{
    let mut sites: Vec<Site<T>> = vec![];
    assert!(Triangulation::<T>::new(&sites).is_none(), "0 sites");

    sites.push(site(0., 0.));
    assert!(Triangulation::<T>::new(&sites).is_none(), "1 site");

    sites.push(site(0., 0.));
    assert!(
        Triangulation::<T>::new(&sites).is_none(),
        "2 coincident sites"
    );

    sites.pop();
    sites.push(site(1., 0.));
    let triangulation = build(&sites);
    assert_eq!(triangulation.triangle_count(), 0, "2 sites");
    assert_eq!(triangulation.edges().count(), 1, "2 sites");
    assert!(triangulation.is_degenerate());

    sites.push(site(2., 0.));
    let triangulation = build(&sites);
    assert_eq!(triangulation.triangle_count(), 0, "3 colinear sites");
    assert_eq!(triangulation.edges().count(), 2, "3 colinear sites");

    sites.push(site(1., 1.));
    let triangulation = build(&sites);
    assert_eq!(triangulation.triangle_count(), 2);
    validate(&triangulation);
}

pub fn unordered_collinear_points_input<T>()
where
    T: CoordType,
{
    let sites: Vec<Site<T>> = [10, 2, 4, 4, 1, 0, 3, 6, 8, 5, 7, 9]
        .iter()
        .map(|&y| site(0., y as f64))
        .collect();
    let duplicated = 1;

    let triangulation = build(&sites);

    assert_eq!(triangulation.triangle_count(), 0);
    assert_eq!(triangulation.sites().len(), sites.len() - duplicated);
    assert_eq!(triangulation.edges().count(), sites.len() - duplicated - 1);
    assert!(triangulation
        .sites()
        .iter()
        .enumerate()
        .all(|(i, s)| s.y == T::from(i).unwrap()));

    assert!(triangulation.inside_convex_hull(site(0., 4.5)));
    assert!(!triangulation.inside_convex_hull(site(1., 4.5)));
    assert!(!triangulation.inside_convex_hull(site(0., 11.)));
}

pub fn insert_on_chain<T>()
where
    T: CoordType,
{
    let mut triangulation = build::<T>(&[site(0., 0.), site(1., 0.), site(2., 0.)]);

    assert!(triangulation.insert_site(site(0.5, 0.), None, true));
    assert!(!triangulation.insert_site(site(0.5, 1.), None, true));
    assert!(!triangulation.insert_site(site(3., 0.), None, true));
    assert_eq!(triangulation.edges().count(), 3);
    assert_eq!(triangulation.sites().len(), 4);
    assert!(triangulation.is_degenerate());
}

pub fn duplicate_insert<T>()
where
    T: CoordType,
{
    let sites = load_fixture::<T>("tests/fixtures/basic.json");
    let mut triangulation = build(&sites);
    let before = triangulation.triangle_count();

    for &s in sites.iter().take(10) {
        assert!(!triangulation.insert_site(s, None, true));
        assert!(!triangulation.insert_site(s, None, false));
    }
    let nudged = Site::new(sites[3].x + T::from(1e-9).unwrap(), sites[3].y);
    assert!(!triangulation.insert_site(nudged, None, true));

    assert_eq!(triangulation.triangle_count(), before);
    assert_eq!(triangulation.sites().len(), sites.len());
}

pub fn outside_insert<T>()
where
    T: CoordType,
{
    let mut triangulation = build::<T>(&square());

    assert!(!triangulation.insert_site(site(5., 5.), None, true));
    assert!(!triangulation.insert_site(site(-0.5, 0.5), None, true));
    assert_eq!(triangulation.triangle_count(), 2);
}

pub fn round_trip_locate<T>()
where
    T: CoordType,
{
    let triangulation = build(&load_fixture::<T>("tests/fixtures/basic.json"));
    let mesh = triangulation.mesh();

    for &v in triangulation.sites() {
        for safe in [false, true] {
            let e = triangulation.locate(v, None, safe);
            assert!(
                mesh.org(e) == v || mesh.dest(e) == v,
                "locate({:?}) returned an edge not touching it",
                v
            );
        }
    }
}

pub fn locate_on_edge_returns_that_edge<T>()
where
    T: CoordType,
{
    let triangulation = build::<T>(&square());
    let mesh = triangulation.mesh();
    let eps = T::from(DEFAULT_EPSILON).unwrap();

    for safe in [false, true] {
        for p in [
            site(0.5, 0.5),
            site(0.5, 0.),
            site(1., 0.5),
            site(0., 0.5),
            site(0.5, 1.),
        ] {
            let e = triangulation.locate(p, None, safe);
            assert!(
                Predicates::on_segment(p, mesh.org(e), mesh.dest(e), eps),
                "locate({:?}) returned {:?} -> {:?}",
                p,
                mesh.org(e),
                mesh.dest(e)
            );
        }
    }
}

pub fn locate_outside_returns_hull_edge<T>()
where
    T: CoordType,
{
    let triangulation = build::<T>(&square());
    let e = triangulation.locate(site(0.5, -3.), None, true);
    let mesh = triangulation.mesh();

    assert_eq!(triangulation.closest_bounding_edge(site(0.5, -3.)), Some(e));
    assert!(mesh.org(e).y == T::zero() && mesh.dest(e).y == T::zero());
    assert!(triangulation.closest_bounding_edge(site(0.5, 0.5)).is_none());
}

pub fn hull_agrees_with_orientation<T>()
where
    T: CoordType,
{
    let triangulation = build(&load_fixture::<T>("tests/fixtures/basic.json"));
    let hull = triangulation.hull_sites();

    for i in -2..=12 {
        for j in -2..=12 {
            let p = site::<T>(i as f64 * 10. + 0.5, j as f64 * 10. + 0.5);
            let explicit = (0..hull.len())
                .all(|k| Predicates::orient(hull[k], hull[(k + 1) % hull.len()], p) >= T::zero());
            assert_eq!(triangulation.inside_convex_hull(p), explicit, "{:?}", p);
        }
    }
}

pub fn incremental_insertion<T>()
where
    T: CoordType,
{
    let sites = load_fixture::<T>("tests/fixtures/basic.json");
    let (first, rest) = sites.split_at(sites.len() / 2);
    let mut triangulation = build(first);

    let inserted = triangulation.insert_sites(rest.iter().copied());
    assert!(inserted > 0);
    assert_eq!(triangulation.sites().len(), first.len() + inserted);
    validate(&triangulation);
}

// Kahan and Babuska summation, Neumaier variant; accumulates less FP error
fn sum(x: &[f64]) -> f64 {
    let mut sum = x[0];
    let mut err = 0.0;
    for &k in &x[1..] {
        let m = sum + k;
        err += if sum.abs() >= k.abs() {
            sum - m + k
        } else {
            k - m + sum
        };
        sum = m;
    }
    sum + err
}
